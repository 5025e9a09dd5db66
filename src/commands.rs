//! Command selection and dispatch.

use crate::console::Console;
use crate::error::DbError;
use crate::record::{format_timestamp, UserRecord};
use crate::users::Users;

pub const DEFAULT_CREATE_NAME: &str = "Default Created Name";
pub const DEFAULT_CREATE_EMAIL: &str = "default.created@example.com";
pub const DEFAULT_UPDATE_NAME: &str = "Jane Doe (Updated by Java Admin)";
pub const FULL_CYCLE_UPDATE_NAME: &str = "Jane Doe (Full Cycle Update)";

pub const OPERATIONS: [&str; 5] = ["read", "create", "update", "delete", "all"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Read,
    Create { name: String, email: String },
    Update { new_name: String },
    Delete,
    /// read, update, read, delete in that order
    All,
}

/// What the positional arguments asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Run {
        command: Command,
        /// No operation was given and `read` was picked
        forced: bool,
    },
    Invalid(String),
}

impl Command {
    /// Parse `[operation, arg1, arg2]`. Missing extra arguments take their
    /// defaults; surplus ones are ignored.
    pub fn parse(args: &[String]) -> Invocation {
        let Some(first) = args.first() else {
            return Invocation::Run {
                command: Command::Read,
                forced: true,
            };
        };

        let arg = |i: usize, default: &str| {
            args.get(i)
                .cloned()
                .unwrap_or_else(|| default.to_string())
        };

        let operation = first.to_lowercase();
        let command = match operation.as_str() {
            "read" => Command::Read,
            "create" => Command::Create {
                name: arg(1, DEFAULT_CREATE_NAME),
                email: arg(2, DEFAULT_CREATE_EMAIL),
            },
            "update" => Command::Update {
                new_name: arg(1, DEFAULT_UPDATE_NAME),
            },
            "delete" => Command::Delete,
            "all" => Command::All,
            _ => return Invocation::Invalid(operation),
        };

        Invocation::Run {
            command,
            forced: false,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Read => "read",
            Command::Create { .. } => "create",
            Command::Update { .. } => "update",
            Command::Delete => "delete",
            Command::All => "all",
        }
    }

    /// Single operations this command runs, in order.
    pub fn steps(&self) -> Vec<Step> {
        match self {
            Command::Read => vec![Step::Read],
            Command::Create { name, email } => vec![Step::Create {
                name: name.clone(),
                email: email.clone(),
            }],
            Command::Update { new_name } => vec![Step::Update {
                new_name: new_name.clone(),
            }],
            Command::Delete => vec![Step::Delete],
            Command::All => vec![
                Step::Read,
                Step::Update {
                    new_name: FULL_CYCLE_UPDATE_NAME.to_string(),
                },
                Step::Read,
                Step::Delete,
            ],
        }
    }
}

/// One store operation of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Read,
    Create { name: String, email: String },
    Update { new_name: String },
    Delete,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Read => "read",
            Step::Create { .. } => "create",
            Step::Update { .. } => "update",
            Step::Delete => "delete",
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// Initialization or at least one operation reported an error
    Failed,
    InvalidOperation,
}

impl Outcome {
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Success => 0,
            Outcome::Failed => 1,
            Outcome::InvalidOperation => 2,
        }
    }
}

/// Select the operation named by `args` and run it against `uid`.
///
/// The banner naming the operation and user is printed first, even when
/// the operation turns out to be unknown.
pub async fn dispatch(users: &Users<'_>, uid: &str, args: &[String], console: &mut Console) -> Outcome {
    console.line("");
    let command = match Command::parse(args) {
        Invocation::Run { command, forced: true } => {
            console.line(&format!(
                "--- FORCING Default Operation: {} on User: {} ---",
                command.name().to_uppercase(),
                uid
            ));
            console.line("To use other operations, run: rtdb-users <operation> [args]");
            command
        }
        Invocation::Run { command, forced: false } => {
            announce(console, command.name(), uid);
            command
        }
        Invocation::Invalid(operation) => {
            announce(console, &operation, uid);
            console.failure(&format!("Invalid operation specified: {}", operation));
            console.error_line(&format!("Available operations: {}", OPERATIONS.join(", ")));
            return Outcome::InvalidOperation;
        }
    };

    let mut failed = false;
    for step in command.steps() {
        if !run_step(users, uid, &step, console).await {
            failed = true;
        }
    }

    if failed {
        Outcome::Failed
    } else {
        Outcome::Success
    }
}

fn announce(console: &mut Console, operation: &str, uid: &str) {
    console.line(&format!(
        "--- Executing Operation: {} on User: {} ---",
        operation.to_uppercase(),
        uid
    ));
}

/// Run one operation and report it. Returns false if it failed.
async fn run_step(users: &Users<'_>, uid: &str, step: &Step, console: &mut Console) -> bool {
    match step {
        Step::Read => match users.read(uid).await {
            Ok(Some(record)) => {
                print_record(uid, &record, console);
                true
            }
            Ok(None) => {
                console.not_found(&format!("User not found: {}", uid));
                true
            }
            Err(e) => report(console, &format!("READ failed: {}", e.user_message()), &e),
        },
        Step::Create { name, email } => {
            console.line(&format!(
                "Creating/Overwriting User with Name: {}, Email: {}",
                name, email
            ));
            match users.create(uid, name, email).await {
                Ok(()) => {
                    console.success(&format!("User record saved/updated: {}", uid));
                    true
                }
                Err(e) => report(
                    console,
                    &format!("CREATE/UPDATE failed for {}: {}", uid, e.user_message()),
                    &e,
                ),
            }
        }
        Step::Update { new_name } => match users.update(uid, new_name).await {
            Ok(()) => {
                console.success(&format!("User {} updated (New Name: {})", uid, new_name));
                true
            }
            Err(e) => report(
                console,
                &format!("UPDATE failed for {}: {}", uid, e.user_message()),
                &e,
            ),
        },
        Step::Delete => match users.delete(uid).await {
            Ok(()) => {
                console.success(&format!("User {} deleted successfully.", uid));
                true
            }
            Err(e) => report(
                console,
                &format!("DELETE failed for {}: {}", uid, e.user_message()),
                &e,
            ),
        },
    }
}

fn report(console: &mut Console, text: &str, err: &DbError) -> bool {
    tracing::debug!(error = ?err, "Operation failed");
    console.failure(text);
    false
}

fn print_record(uid: &str, record: &UserRecord, console: &mut Console) {
    console.line("");
    console.line(&format!("--- User Data for {} ---", uid));
    console.line(&format!("Name: {}", record.name.as_deref().unwrap_or("null")));
    console.line(&format!("Email: {}", record.email.as_deref().unwrap_or("null")));
    if let Some(ts) = record.created_at {
        console.line(&format!("Created: {}", format_timestamp(ts)));
    }
    if let Some(ts) = record.last_updated {
        console.line(&format!("Last Updated: {}", format_timestamp(ts)));
    }
    console.line("--------------------------------");
}
