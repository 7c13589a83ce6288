//! taskdeck - command-line front end for the task API
//!
//! clap derive for args, anyhow for error propagation.
//! Each invocation signs in first (the session cookie lives only as long as the process).

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use taskdeck_core::app::auth_forms::notices;
use taskdeck_core::app::{
    BoardView, ChangePasswordForm, NewTask, ResetPasswordForm, SignupForm, TaskBoard,
};
use taskdeck_core::domain::{
    CardBadge, Category, ClientError, DeleteAffordance, Filters, Notice, TaskId,
};
use taskdeck_core::ports::{Confirm, ConfirmPrompt, Notifier};
use taskdeck_core::{App, AppBuilder, ClientConfig};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "taskdeck")]
#[command(about = "Browse and manage tasks on a taskdeck server", long_about = None)]
struct Cli {
    /// Account email
    #[arg(long, env = "TASKDECK_EMAIL", global = true)]
    email: Option<String>,

    /// Account password
    #[arg(long, env = "TASKDECK_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    /// API origin (overrides TASKDECK_BASE_URL)
    #[arg(long, value_name = "URL", global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check the credentials and print the session
    Login,

    /// List tasks page by page
    List {
        /// 1-based page number
        #[arg(long, default_value_t = 1)]
        page: u64,
    },

    /// Search task titles and descriptions
    Search {
        query: String,
        #[arg(long, default_value_t = 1)]
        page: u64,
    },

    /// Filter tasks by status, priority and due date
    Filter {
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
        #[arg(long, value_enum)]
        category: Option<CategoryArg>,
        /// YYYY-MM-DD
        #[arg(long)]
        due: Option<NaiveDate>,
        #[arg(long, default_value_t = 1)]
        page: u64,
    },

    /// Admin: list (or search) tasks whose owners asked for deletion
    DeleteRequests {
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u64,
    },

    /// Create a task
    Create {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// YYYY-MM-DD, today or later
        #[arg(long)]
        due: Option<NaiveDate>,
        #[arg(long, value_enum, default_value_t = CategoryArg::Low)]
        category: CategoryArg,
    },

    /// Mark a task on the given page as complete
    Complete {
        id: i64,
        #[arg(long, default_value_t = 1)]
        page: u64,
    },

    /// Delete a task (admin) or ask an admin to delete it
    Delete {
        id: i64,
        #[arg(long, default_value_t = 1)]
        page: u64,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Show the signed-in user's profile
    Profile,

    /// Create an account (no sign-in needed)
    Signup {
        #[arg(long)]
        username: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        /// Bangladeshi mobile number
        #[arg(long)]
        contact: String,
        #[arg(long, default_value = "")]
        gender: String,
    },

    /// Ask for a password reset link (no sign-in needed)
    ForgetPassword,

    /// Set a new password with the token from the reset link
    ResetPassword {
        #[arg(long)]
        token: String,
        #[arg(long)]
        new_password: String,
    },

    /// Change the password of the signed-in user
    ChangePassword {
        #[arg(long)]
        new_password: String,
    },
}

impl Commands {
    fn needs_session(&self) -> bool {
        !matches!(
            self,
            Commands::Signup { .. } | Commands::ForgetPassword | Commands::ResetPassword { .. }
        )
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum StatusArg {
    Complete,
    Pending,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default)]
enum CategoryArg {
    #[default]
    Low,
    Medium,
    High,
}

impl From<CategoryArg> for Category {
    fn from(c: CategoryArg) -> Self {
        match c {
            CategoryArg::Low => Category::Low,
            CategoryArg::Medium => Category::Medium,
            CategoryArg::High => Category::High,
        }
    }
}

/// y/N prompt on the terminal
struct TerminalConfirm {
    assume_yes: bool,
}

#[async_trait]
impl Confirm for TerminalConfirm {
    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool {
        if self.assume_yes {
            return true;
        }
        let question = format!("{} {} [{}? y/N] ", prompt.title, prompt.text, prompt.confirm_label);
        tokio::task::spawn_blocking(move || {
            print!("{question}");
            let _ = std::io::stdout().flush();
            let mut answer = String::new();
            std::io::stdin().read_line(&mut answer).is_ok()
                && matches!(answer.trim(), "y" | "Y" | "yes")
        })
        .await
        .unwrap_or(false)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file from current directory or parent directories
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env().context("invalid configuration")?;
    if let Some(url) = &cli.base_url {
        config = config.with_base_url(url.as_str());
    }
    let limit = config.page_limit;

    let assume_yes = matches!(cli.command, Commands::Delete { yes: true, .. });
    let app = AppBuilder::new()
        .http(config)?
        .confirm(Arc::new(TerminalConfirm { assume_yes }))
        .build()?;

    if cli.command.needs_session() {
        sign_in(&app, &cli).await?;
    }

    match cli.command {
        Commands::Login => {
            app.notifier().notify(notices::login_succeeded());
            if let Some(session) = app.session().current() {
                println!("signed in as {} (admin: {})", session.subject, session.is_admin);
            }
        }
        Commands::List { page } => {
            let mut board = app.home_board();
            board.page(skip_for(page, limit), limit).await?;
            print_board(&board.view().await);
        }
        Commands::Search { query, page } => {
            let mut board = app.home_board();
            board.search(&query).await?;
            turn_to(&mut board, page, limit).await?;
            print_board(&board.view().await);
        }
        Commands::Filter {
            status,
            category,
            due,
            page,
        } => {
            let mut board = app.home_board();
            board
                .filter(Filters {
                    status: status.map(|s| matches!(s, StatusArg::Complete)),
                    category: category.map(Category::from),
                    due_date: due,
                })
                .await?;
            turn_to(&mut board, page, limit).await?;
            print_board(&board.view().await);
        }
        Commands::DeleteRequests { search, page } => {
            let mut board = app.delete_requests_board();
            match search {
                Some(query) => {
                    board.search(&query).await?;
                    turn_to(&mut board, page, limit).await?;
                }
                None => {
                    board.page(skip_for(page, limit), limit).await?;
                }
            }
            print_board(&board.view().await);
        }
        Commands::Create {
            title,
            description,
            due,
            category,
        } => {
            let task = app
                .create_task_form()
                .submit(&NewTask {
                    title,
                    description,
                    due_date: due,
                    category: category.into(),
                })
                .await?;
            app.notifier()
                .notify(taskdeck_core::app::create_task::created(&task));
            println!("{}", task.id);
        }
        Commands::Complete { id, page } => {
            let mut board = loaded_board(&app, page, limit).await?;
            board.complete(TaskId::new(id)).await?;
            print_board(&board.view().await);
        }
        Commands::Delete { id, page, .. } => {
            let mut board = loaded_board(&app, page, limit).await?;
            let outcome = board.delete(TaskId::new(id)).await?;
            info!(?outcome, "delete finished");
            print_board(&board.view().await);
        }
        Commands::Profile => {
            let mut editor = app.profile_editor();
            let profile = editor.load().await?;
            println!("{}", profile.display_name());
            if let Some(email) = &profile.email {
                println!("  email:   {email}");
            }
            if let Some(contact) = &profile.contact_number {
                println!("  contact: {contact}");
            }
        }
        Commands::Signup {
            username,
            first_name,
            last_name,
            contact,
            gender,
        } => {
            let (email, password) = credentials(&cli.email, &cli.password)?;
            let form = SignupForm {
                username,
                email: email.to_string(),
                password: password.to_string(),
                first_name,
                last_name,
                contact_number: contact,
                gender,
            };
            report(
                &app,
                app.auth_forms().signup(&form).await,
                "Sign Up Failed",
                notices::signup_succeeded(),
            )?;
        }
        Commands::ForgetPassword => {
            let Some(email) = &cli.email else {
                bail!("--email (or TASKDECK_EMAIL) is required");
            };
            report(
                &app,
                app.auth_forms().forget_password(email).await,
                "Request Failed",
                notices::reset_link_sent(),
            )?;
        }
        Commands::ResetPassword {
            token,
            new_password,
        } => {
            let Some(email) = &cli.email else {
                bail!("--email (or TASKDECK_EMAIL) is required");
            };
            let form = ResetPasswordForm {
                email: email.clone(),
                token,
                confirm_password: new_password.clone(),
                password: new_password,
            };
            report(
                &app,
                app.auth_forms().reset_password(&form).await,
                "Reset Failed",
                notices::password_reset(),
            )?;
        }
        Commands::ChangePassword { new_password } => {
            let (_, old_password) = credentials(&cli.email, &cli.password)?;
            let form = ChangePasswordForm {
                old_password: old_password.to_string(),
                confirm_password: new_password.clone(),
                new_password,
            };
            report(
                &app,
                app.auth_forms().change_password(&form).await,
                "Change Password Failed",
                notices::password_changed(),
            )?;
        }
    }
    Ok(())
}

/// フォームの結果を通知して、失敗ならエラーで終わる
fn report(
    app: &App,
    result: Result<(), ClientError>,
    failure_title: &str,
    success: Notice,
) -> Result<()> {
    match result {
        Ok(()) => {
            app.notifier().notify(success);
            Ok(())
        }
        Err(err) => {
            app.notifier().notify(notices::failed(failure_title, &err));
            Err(err.into())
        }
    }
}

fn credentials<'a>(
    email: &'a Option<String>,
    password: &'a Option<String>,
) -> Result<(&'a str, &'a str)> {
    match (email, password) {
        (Some(email), Some(password)) => Ok((email.as_str(), password.as_str())),
        _ => bail!("--email and --password (or TASKDECK_EMAIL / TASKDECK_PASSWORD) are required"),
    }
}

async fn sign_in(app: &App, cli: &Cli) -> Result<()> {
    let (email, password) = credentials(&cli.email, &cli.password)?;
    app.auth_forms()
        .login(email, password)
        .await
        .context("login failed")?;
    Ok(())
}

async fn loaded_board(app: &App, page: u64, limit: u64) -> Result<TaskBoard> {
    let mut board = app.home_board();
    board.page(skip_for(page, limit), limit).await?;
    Ok(board)
}

/// search / filter の直後は 1 ページ目を取得済み
async fn turn_to(board: &mut TaskBoard, page: u64, limit: u64) -> Result<()> {
    if page > 1 {
        board.page(skip_for(page, limit), limit).await?;
    }
    Ok(())
}

fn skip_for(page: u64, limit: u64) -> u64 {
    page.saturating_sub(1).saturating_mul(limit)
}

fn print_board(view: &BoardView) {
    if view.is_empty() {
        println!("No tasks found.");
        return;
    }
    for card in &view.cards {
        let badge = match card.badge {
            CardBadge::Complete => "complete",
            CardBadge::Overdue => "overdue",
            CardBadge::Pending => "pending",
        };
        let due = card
            .due_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        let delete = match card.delete {
            DeleteAffordance::HardDelete => "delete",
            DeleteAffordance::RequestDelete => "request-delete",
            DeleteAffordance::Hidden => "",
        };
        println!(
            "{:>6}  {:<8}  {:<6}  {:<10}  {:<20}  {}  {}",
            card.id.get(),
            badge,
            card.category.as_str(),
            due,
            card.owner_name,
            card.title,
            delete
        );
    }
    if view.page.visible {
        println!("{}", view.page);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_for_pages() {
        assert_eq!(skip_for(0, 8), 0);
        assert_eq!(skip_for(1, 8), 0);
        assert_eq!(skip_for(3, 8), 16);
        assert_eq!(skip_for(u64::MAX, 8), u64::MAX);
    }

    #[test]
    fn auth_commands_run_without_sign_in() {
        let cli = Cli::parse_from(["taskdeck", "--email", "a@b.co", "forget-password"]);
        assert!(!cli.command.needs_session());

        let cli = Cli::parse_from(["taskdeck", "change-password", "--new-password", "N3w!pass"]);
        assert!(cli.command.needs_session());
    }
}
