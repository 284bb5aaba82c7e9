//! Slash command parser for the interactive shell
//!
//! Commands are prefixed with `/`. The command word is case-insensitive;
//! arguments (usernames, image paths) are kept as typed.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when parsing slash commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Commands understood by the interactive shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Sign in as this user; the password is prompted for
    Login(String),

    /// Create an account, optionally with a daily calorie goal
    Signup { username: String, goal: Option<u32> },

    /// Switch the auth form between sign-in and sign-up
    ToggleIntent,

    /// Classify the meal in this image
    Scan(PathBuf),

    /// Discard the scan result
    Reset,

    /// Generate a weekly plan, at the given target or the current one
    Plan(Option<u32>),

    /// Change the target used by the balanced indicator
    SetTarget(u32),

    /// Forget the saved session
    Logout,

    /// Show the signed-in user
    WhoAmI,

    /// Show the session, the service and controller state
    ShowStatus,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a command
    None,
}

fn parse_calories(command: &str, arg: &str) -> Result<u32, CommandError> {
    match arg.parse::<u32>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(CommandError::UnsupportedArgument {
            command: command.to_string(),
            arg: arg.to_string(),
        }),
    }
}

fn missing(command: &str, usage: &str) -> CommandError {
    CommandError::MissingArgument {
        command: command.to_string(),
        usage: usage.to_string(),
    }
}

/// Parse one line of input into a [`SpecialCommand`].
///
/// Input that does not start with `/` is not a command, except `exit` and
/// `quit`.
///
/// # Examples
///
/// ```
/// use smartmeal::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/plan 1800").unwrap(), SpecialCommand::Plan(Some(1800)));
/// assert_eq!(parse_special_command("/LOGIN alice").unwrap(), SpecialCommand::Login("alice".to_string()));
/// assert_eq!(parse_special_command("hello").unwrap(), SpecialCommand::None);
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if lower == "exit" || lower == "quit" {
        return Ok(SpecialCommand::Exit);
    }
    if !trimmed.starts_with('/') {
        return Ok(SpecialCommand::None);
    }

    let (word, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((word, rest)) => (word.to_lowercase(), rest.trim()),
        None => (lower.clone(), ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    match word.as_str() {
        "/login" => match args.as_slice() {
            [] => Err(missing("/login", "/login <username>")),
            [username] => Ok(SpecialCommand::Login(username.to_string())),
            [_, extra, ..] => Err(CommandError::UnsupportedArgument {
                command: "/login".to_string(),
                arg: extra.to_string(),
            }),
        },
        "/signup" => match args.as_slice() {
            [] => Err(missing("/signup", "/signup <username> [goal]")),
            [username] => Ok(SpecialCommand::Signup {
                username: username.to_string(),
                goal: None,
            }),
            [username, goal] => Ok(SpecialCommand::Signup {
                username: username.to_string(),
                goal: Some(parse_calories("/signup", goal)?),
            }),
            [_, _, extra, ..] => Err(CommandError::UnsupportedArgument {
                command: "/signup".to_string(),
                arg: extra.to_string(),
            }),
        },
        "/toggle" => Ok(SpecialCommand::ToggleIntent),
        "/scan" => {
            if rest.is_empty() {
                Err(missing("/scan", "/scan <image>"))
            } else {
                Ok(SpecialCommand::Scan(PathBuf::from(rest)))
            }
        }
        "/reset" => Ok(SpecialCommand::Reset),
        "/plan" => match args.as_slice() {
            [] => Ok(SpecialCommand::Plan(None)),
            [calories] => Ok(SpecialCommand::Plan(Some(parse_calories("/plan", calories)?))),
            [_, extra, ..] => Err(CommandError::UnsupportedArgument {
                command: "/plan".to_string(),
                arg: extra.to_string(),
            }),
        },
        "/target" => match args.as_slice() {
            [] => Err(missing("/target", "/target <calories>")),
            [calories] => Ok(SpecialCommand::SetTarget(parse_calories("/target", calories)?)),
            [_, extra, ..] => Err(CommandError::UnsupportedArgument {
                command: "/target".to_string(),
                arg: extra.to_string(),
            }),
        },
        "/logout" => Ok(SpecialCommand::Logout),
        "/whoami" => Ok(SpecialCommand::WhoAmI),
        "/status" => Ok(SpecialCommand::ShowStatus),
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/exit" | "/quit" => Ok(SpecialCommand::Exit),
        _ => Err(CommandError::UnknownCommand(trimmed.to_string())),
    }
}

/// Print the command reference.
pub fn print_help() {
    println!(
        r#"
SmartMeal Shell Commands
========================

ACCOUNT:
  /login <username>          - Sign in (password is prompted)
  /signup <username> [goal]  - Create an account with a daily calorie goal
  /toggle                    - Switch the form between sign in and sign up
  /logout                    - Forget the saved session
  /whoami                    - Show the signed-in user

SCAN:
  /scan <image>              - Classify the meal in an image file
  /reset                     - Discard the result and scan again

PLAN:
  /plan [calories]           - Generate a weekly plan (default: current target)
  /target <calories>         - Change the target used for the balanced mark

OTHER:
  /status                    - Show session, service and scan state
  /help                      - Show this help message
  exit | quit                - Leave the shell
"#
    );
}
