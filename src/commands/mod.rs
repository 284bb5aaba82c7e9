/*!
Command handlers for the CLI

Each one-shot subcommand and the interactive shell go through the same
helpers, which drive a [`Shell`] and print what its controllers produced:

- `shell`   : interactive loop with slash commands
- `account` : login, signup, logout, whoami
- `scan`    : classify one meal photo
- `plan`    : generate and print a weekly plan
- `status`  : session and service health
*/

use colored::Colorize;

use crate::auth::AuthEvent;
use crate::capture::{CaptureOutcome, CaptureState, ImageFileFeed};
use crate::error::{user_message, Result, SmartMealError};
use crate::planner::PlanOutcome;
use crate::render;
use crate::service::AuthIntent;
use crate::shell::Shell;
use std::path::Path;

// Slash command parser for the interactive shell
pub mod special_commands;

/// Put the auth form into `intent` without clearing a message needlessly.
fn ensure_intent(shell: &Shell, intent: AuthIntent) {
    if shell.auth().intent() != intent {
        shell.auth().toggle_intent();
    }
}

/// Sign in and report the result.
///
/// # Errors
///
/// Returns [`SmartMealError::Command`] carrying the form's message when the
/// sign-in fails.
pub async fn sign_in(shell: &Shell, username: &str, password: &str) -> Result<()> {
    ensure_intent(shell, AuthIntent::SignIn);
    shell.auth().set_identity(username);
    shell.auth().set_secret(password);

    match shell.auth().submit().await {
        AuthEvent::SignedIn(identity) => {
            println!("{}", format!("Hello, {}", identity).green());
            Ok(())
        }
        AuthEvent::Failed(message) => Err(SmartMealError::Command(message).into()),
        AuthEvent::AccountCreated | AuthEvent::Ignored => Ok(()),
    }
}

/// Create an account; the caller signs in afterwards.
///
/// # Errors
///
/// Returns [`SmartMealError::Command`] carrying the service's message when
/// registration fails.
pub async fn sign_up(
    shell: &Shell,
    username: &str,
    password: &str,
    goal: Option<u32>,
) -> Result<()> {
    ensure_intent(shell, AuthIntent::SignUp);
    shell.auth().set_identity(username);
    shell.auth().set_secret(password);
    if let Some(goal) = goal {
        shell.auth().set_goal(goal);
    }

    match shell.auth().submit().await {
        AuthEvent::AccountCreated => {
            if let Some(message) = shell.auth().message() {
                println!("{}", message.green());
            }
            Ok(())
        }
        AuthEvent::Failed(message) => Err(SmartMealError::Command(message).into()),
        AuthEvent::SignedIn(_) | AuthEvent::Ignored => Ok(()),
    }
}

/// Classify the meal in `image` and print the result card.
///
/// A missing or unreadable image is not an error: nothing is sent. Service
/// failures are only returned when the capture error policy is `surface`.
pub async fn scan_image(shell: &Shell, image: &Path) -> Result<()> {
    let feed = ImageFileFeed::new(image);
    match shell.capture().capture(&feed).await {
        CaptureOutcome::Classified(result) => {
            println!("{}", render::capture_card(&result));
            if let Some(frame) = shell.capture().frame() {
                println!("{}", render::scanned_at(frame.taken_at));
            }
            Ok(())
        }
        CaptureOutcome::NoFrame => {
            println!(
                "{}",
                format!("No frame available from {}", image.display()).yellow()
            );
            Ok(())
        }
        CaptureOutcome::Ignored => {
            println!("A result is already shown. Use /reset to scan another meal.");
            Ok(())
        }
        CaptureOutcome::Failed(message) => match shell.capture().last_error() {
            Some(_) => Err(SmartMealError::Command(message).into()),
            None => Ok(()),
        },
    }
}

/// Generate a plan at `calories` (or the current target) and print it.
///
/// Service failures are only returned when the plan error policy is
/// `surface`; a plan already shown stays available either way.
pub async fn generate_plan(shell: &Shell, calories: Option<u32>) -> Result<()> {
    let planner = shell.planner();
    let target = calories.unwrap_or_else(|| planner.target());
    match planner.generate(target).await {
        PlanOutcome::Generated(_) => {
            print_plan(shell);
            Ok(())
        }
        PlanOutcome::Ignored => {
            println!("A plan is already being generated.");
            Ok(())
        }
        PlanOutcome::Failed(message) => match planner.last_error() {
            Some(_) => Err(SmartMealError::Command(message).into()),
            None => Ok(()),
        },
    }
}

fn print_plan(shell: &Shell) {
    if let Some(plan) = shell.planner().plan() {
        println!("{}", render::plan_view(&plan, shell.planner().target()));
    }
}

/// Print the signed-in identity, or the sign-in hint.
pub fn whoami(shell: &Shell) -> Result<()> {
    println!("{}", shell.greeting()?);
    Ok(())
}

/// Forget the saved session.
pub fn logout(shell: &Shell) -> Result<()> {
    shell.sign_out()?;
    println!("Signed out.");
    Ok(())
}

/// Print session, service and controller state.
pub async fn print_status(shell: &Shell) -> Result<()> {
    let user = shell
        .identity()?
        .unwrap_or_else(|| "(not signed in)".to_string());
    let service = match shell.service_status().await {
        Ok(status) if status.message.is_empty() => status.status.green().to_string(),
        Ok(status) => format!("{} ({})", status.status.green(), status.message),
        Err(e) => {
            tracing::warn!("Status check failed: {:#}", e);
            format!("{} ({})", "unreachable".red(), user_message(&e))
        }
    };
    let scan = match shell.capture().state() {
        CaptureState::Idle => "ready",
        CaptureState::Capturing | CaptureState::Submitted { .. } => "scanning",
        CaptureState::Result { .. } => "result shown",
    };
    let plan_days = shell.planner().plan().map(|p| p.len()).unwrap_or(0);

    println!("\nSmartMeal Status");
    println!("================");
    println!("User:          {}", user);
    println!("Service:       {}", service);
    println!("Auth form:     {}", shell.auth().intent());
    println!("Scan:          {}", scan);
    println!("Plan target:   {} kcal/day", shell.planner().target());
    println!("Plan days:     {}", plan_days);
    println!();
    Ok(())
}

// Interactive shell
pub mod shell {
    //! Interactive shell.
    //!
    //! Reads slash commands with `rustyline` and dispatches them to the
    //! shared helpers. Errors are printed and the loop continues.

    use super::*;
    use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
    use crate::config::Config;
    use rustyline::completion::Completer;
    use rustyline::config::Configurer;
    use rustyline::error::ReadlineError;
    use rustyline::highlight::Highlighter;
    use rustyline::hint::Hinter;
    use rustyline::history::DefaultHistory;
    use rustyline::validate::Validator;
    use rustyline::{ColorMode, Editor, Helper};
    use std::borrow::Cow;

    type ShellEditor = Editor<PasswordMask, DefaultHistory>;

    /// Editor helper that blanks the input line while `masking` is set.
    #[derive(Debug, Default)]
    pub(crate) struct PasswordMask {
        pub(crate) masking: bool,
    }

    impl Highlighter for PasswordMask {
        fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
            if self.masking {
                Cow::Owned(" ".repeat(line.chars().count()))
            } else {
                Cow::Borrowed(line)
            }
        }

        fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
            self.masking
        }
    }

    impl Completer for PasswordMask {
        type Candidate = String;
    }

    impl Hinter for PasswordMask {
        type Hint = String;
    }

    impl Validator for PasswordMask {}

    impl Helper for PasswordMask {}

    /// Read a password without showing what is typed. History entries are
    /// only added explicitly, so the password never reaches the history.
    fn read_password(rl: &mut ShellEditor) -> Result<String> {
        set_masking(rl, true);
        let cursor = rl.set_cursor_visibility(false);
        let password = rl.readline("Password: ");
        drop(cursor);
        set_masking(rl, false);
        Ok(password?.trim_end().to_string())
    }

    fn set_masking(rl: &mut ShellEditor, masking: bool) {
        if let Some(helper) = rl.helper_mut() {
            helper.masking = masking;
        }
        // Highlighting, and so masking, only runs when colors are on.
        rl.set_color_mode(if masking {
            ColorMode::Forced
        } else {
            ColorMode::Enabled
        });
    }

    /// Start the interactive shell
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if the shell cannot be built or the terminal cannot be
    /// read.
    pub async fn run_shell(config: Config) -> Result<()> {
        tracing::info!("Starting interactive shell");
        let shell = Shell::from_config(&config)?;
        let mut rl = ShellEditor::new()?;
        rl.set_helper(Some(PasswordMask::default()));

        print_welcome_banner(&shell)?;

        loop {
            let prompt = match shell.identity()? {
                Some(identity) => format!("{}@smartmeal> ", identity),
                None => "smartmeal> ".to_string(),
            };
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    rl.add_history_entry(trimmed)?;

                    let command = match parse_special_command(trimmed) {
                        Ok(command) => command,
                        Err(e) => {
                            eprintln!("{}", e.to_string().red());
                            continue;
                        }
                    };
                    if command == SpecialCommand::Exit {
                        break;
                    }
                    if let Err(e) = dispatch(&shell, &mut rl, command).await {
                        eprintln!("{}", format!("Error: {}", command_message(&e)).red());
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    async fn dispatch(shell: &Shell, rl: &mut ShellEditor, command: SpecialCommand) -> Result<()> {
        match command {
            SpecialCommand::Login(username) => {
                let password = read_password(rl)?;
                sign_in(shell, &username, &password).await
            }
            SpecialCommand::Signup { username, goal } => {
                let password = read_password(rl)?;
                sign_up(shell, &username, &password, goal).await
            }
            SpecialCommand::ToggleIntent => {
                let intent = shell.auth().toggle_intent();
                println!("Form is now: {}", intent);
                Ok(())
            }
            SpecialCommand::Scan(image) => scan_image(shell, &image).await,
            SpecialCommand::Reset => {
                if shell.capture().reset() {
                    println!("Ready to scan.");
                } else {
                    println!("Nothing to reset.");
                }
                Ok(())
            }
            SpecialCommand::Plan(calories) => generate_plan(shell, calories).await,
            SpecialCommand::SetTarget(calories) => {
                shell.planner().set_target(calories);
                println!("Target set to {} kcal/day", calories);
                print_plan(shell);
                Ok(())
            }
            SpecialCommand::Logout => logout(shell),
            SpecialCommand::WhoAmI => whoami(shell),
            SpecialCommand::ShowStatus => print_status(shell).await,
            SpecialCommand::Help => {
                print_help();
                Ok(())
            }
            SpecialCommand::None => {
                println!("Type '/help' for available commands");
                Ok(())
            }
            SpecialCommand::Exit => Ok(()),
        }
    }

    fn command_message(err: &anyhow::Error) -> String {
        match err.downcast_ref::<SmartMealError>() {
            Some(SmartMealError::Command(message)) => message.clone(),
            _ => err.to_string(),
        }
    }

    fn print_welcome_banner(shell: &Shell) -> Result<()> {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                 SmartMeal - Scan. Plan. Eat.                 ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("{}", shell.greeting()?);
        println!("Type '/help' for available commands, 'exit' to quit\n");
        Ok(())
    }
}

// One-shot account commands
pub mod account {
    //! Login, signup, logout and whoami as one-shot subcommands.

    use super::*;
    use crate::config::Config;

    /// Sign in and persist the session.
    pub async fn login(config: Config, username: String, password: String) -> Result<()> {
        let shell = Shell::from_config(&config)?;
        sign_in(&shell, &username, &password).await
    }

    /// Register a new account.
    pub async fn signup(
        config: Config,
        username: String,
        password: String,
        goal: Option<u32>,
    ) -> Result<()> {
        let shell = Shell::from_config(&config)?;
        sign_up(&shell, &username, &password, goal).await
    }

    /// Clear the saved session.
    pub fn logout(config: Config) -> Result<()> {
        let shell = Shell::from_config(&config)?;
        super::logout(&shell)
    }

    /// Print who is signed in.
    pub fn whoami(config: Config) -> Result<()> {
        let shell = Shell::from_config(&config)?;
        super::whoami(&shell)
    }
}

// One-shot scan
pub mod scan {
    use super::*;
    use crate::config::Config;
    use std::path::PathBuf;

    /// Classify one image and print its card.
    pub async fn run_scan(config: Config, image: PathBuf) -> Result<()> {
        let shell = Shell::from_config(&config)?;
        scan_image(&shell, &image).await
    }
}

// One-shot plan
pub mod plan {
    use super::*;
    use crate::config::Config;

    /// Generate and print a weekly plan.
    pub async fn run_plan(config: Config, calories: Option<u32>) -> Result<()> {
        let shell = Shell::from_config(&config)?;
        generate_plan(&shell, calories).await
    }
}

// One-shot status
pub mod status {
    use super::*;
    use crate::config::Config;

    /// Print session and service status.
    pub async fn run_status(config: Config) -> Result<()> {
        let shell = Shell::from_config(&config)?;
        print_status(&shell).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ErrorPolicy, UiConfig};
    use crate::service::fake::{FakeCall, FakeMealService};
    use crate::service::AuthOutcome;
    use crate::session::{Session, SessionStore};
    use crate::test_utils::week_plan;
    use std::sync::Arc;

    fn shell_with(ui: UiConfig) -> (Arc<FakeMealService>, Shell) {
        let fake = Arc::new(FakeMealService::new());
        let shell = Shell::new(fake.clone(), Arc::new(SessionStore::in_memory()), &ui);
        (fake, shell)
    }

    #[tokio::test]
    async fn test_sign_in_from_sign_up_form_switches_intent() {
        let (fake, shell) = shell_with(UiConfig::default());
        shell.auth().toggle_intent();
        fake.push_auth(Ok(AuthOutcome::Session(Session::new("alice", "tok-abc"))));

        sign_in(&shell, "alice", "pw123").await.unwrap();

        assert_eq!(shell.identity().unwrap().as_deref(), Some("alice"));
        assert!(matches!(
            fake.calls()[0],
            FakeCall::Authenticate {
                intent: AuthIntent::SignIn,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_sign_in_failure_is_command_error() {
        let (fake, shell) = shell_with(UiConfig::default());
        fake.push_auth(Err("Incorrect username or password".to_string()));

        let err = sign_in(&shell, "alice", "bad").await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<SmartMealError>(),
            Some(SmartMealError::Command(m)) if m.as_str() == "Incorrect username or password"
        ));
    }

    #[tokio::test]
    async fn test_sign_up_passes_goal() {
        let (fake, shell) = shell_with(UiConfig::default());
        fake.push_auth(Ok(AuthOutcome::Confirmation {
            identity: "bob".to_string(),
        }));

        sign_up(&shell, "bob", "pw", Some(1800)).await.unwrap();

        assert_eq!(
            fake.calls(),
            vec![FakeCall::Authenticate {
                identity: "bob".to_string(),
                intent: AuthIntent::SignUp,
                goal_metric: Some(1800),
            }]
        );
        assert_eq!(shell.identity().unwrap(), None);
        assert_eq!(shell.auth().intent(), AuthIntent::SignIn);
    }

    #[tokio::test]
    async fn test_scan_missing_image_sends_nothing() {
        let (fake, shell) = shell_with(UiConfig::default());
        scan_image(&shell, Path::new("/nonexistent/meal.jpg"))
            .await
            .unwrap();
        assert!(fake.calls().is_empty());
        assert_eq!(shell.capture().state(), CaptureState::Idle);
    }

    #[tokio::test]
    async fn test_plan_failure_respects_policy() {
        let (fake, shell) = shell_with(UiConfig::default());
        fake.push_plan(Err("Not enough data".to_string()));
        assert!(generate_plan(&shell, Some(2000)).await.is_ok());

        let (fake, shell) = shell_with(UiConfig {
            plan_errors: ErrorPolicy::Surface,
            ..UiConfig::default()
        });
        fake.push_plan(Err("Not enough data".to_string()));
        assert!(generate_plan(&shell, Some(2000)).await.is_err());
    }

    #[tokio::test]
    async fn test_plan_uses_current_target_by_default() {
        let (fake, shell) = shell_with(UiConfig::default());
        shell.planner().set_target(1750);
        fake.push_plan(Ok(week_plan(&[1750.0; 7])));

        generate_plan(&shell, None).await.unwrap();

        assert_eq!(
            fake.calls(),
            vec![FakeCall::GeneratePlan {
                target_calories: 1750
            }]
        );
        assert_eq!(shell.planner().plan().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_status_survives_service_failure() {
        let (_fake, shell) = shell_with(UiConfig::default());
        assert!(print_status(&shell).await.is_ok());
    }

    #[test]
    fn test_logout_clears_session() {
        let (_fake, shell) = shell_with(UiConfig::default());
        shell.session().save("alice", "tok").unwrap();
        logout(&shell).unwrap();
        assert_eq!(shell.identity().unwrap(), None);
    }

    #[test]
    fn test_password_mask_blanks_input_only_while_masking() {
        use rustyline::highlight::Highlighter;

        let mut mask = shell::PasswordMask::default();
        assert_eq!(mask.highlight("pw123", 5), "pw123");
        assert!(!mask.highlight_char("pw123", 5, false));

        mask.masking = true;
        let shown = mask.highlight("pässwörd", 8);
        assert_eq!(shown, "        ");
        assert!(!shown.contains('p'));
        assert!(mask.highlight_char("pässwörd", 8, false));
    }
}
