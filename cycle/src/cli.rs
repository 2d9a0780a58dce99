use crate::app::App;
use crate::utils::dates::parse_day_arg;
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use cycle_api::endpoints::PeriodId;
use cycle_api::Transport;
use serde::Serialize;
use std::io::{self, BufRead, Write};

#[derive(Parser)]
#[command(name = "cycle")]
#[command(about = "Period tracking with cycle statistics and predictions", long_about = None)]
pub struct Cli {
    /// Echo log events to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in with a username or email
    Login {
        login: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Create an account (log in afterwards)
    Register {
        username: String,
        email: String,
        #[arg(long)]
        password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show the logged-in user
    Whoami,

    ChangePassword {
        #[arg(long)]
        current: Option<String>,
        #[arg(long)]
        new: Option<String>,
    },

    /// Delete the account and all of its periods
    DeleteAccount {
        /// Required; there is no undo
        #[arg(long)]
        yes: bool,
    },

    /// Manage period records
    Periods {
        #[command(subcommand)]
        command: PeriodCommands,
    },

    /// Statistics and predictions computed locally from the full history
    Report {
        /// Compute for another day (default: today)
        #[arg(long, value_parser = parse_day_arg, allow_hyphen_values = true)]
        on: Option<NaiveDate>,
    },

    /// The same figures as computed by the server
    ServerReport,
}

#[derive(Subcommand)]
pub enum PeriodCommands {
    /// List records, newest first
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        per_page: u32,
        /// Fetch every page, oldest first
        #[arg(long, conflicts_with_all = ["page", "per_page"])]
        all: bool,
    },

    /// Record the start of a period
    Start {
        /// today, yesterday, -N or YYYY-MM-DD
        #[arg(value_parser = parse_day_arg, allow_hyphen_values = true)]
        date: Option<NaiveDate>,
    },

    /// Record the end of the open period
    End {
        #[arg(value_parser = parse_day_arg, allow_hyphen_values = true)]
        date: Option<NaiveDate>,
    },

    Delete {
        id: PeriodId,
    },
}

pub async fn run<T: Transport>(command: Commands, app: &App<T>) -> Result<()> {
    match command {
        Commands::Login { login, password } => {
            let password = password_or_prompt(password, "Password")?;
            app.auth.login(&login, &password).await?;
            println!("Logged in as {}", login);
        }
        Commands::Register {
            username,
            email,
            password,
        } => {
            let password = password_or_prompt(password, "Password")?;
            let confirm = prompt("Confirm password")?;
            let user = app
                .auth
                .register(&username, &email, &password, &confirm)
                .await?;
            print_json(&user)?;
        }
        Commands::Logout => {
            app.auth.logout();
            println!("Logged out");
        }
        Commands::Whoami => {
            let user = require_session(app).await?;
            print_json(&user)?;
        }
        Commands::ChangePassword { current, new } => {
            require_session(app).await?;
            let current = password_or_prompt(current, "Current password")?;
            let new = password_or_prompt(new, "New password")?;
            app.auth.change_password(&current, &new).await?;
            println!("Password changed");
        }
        Commands::DeleteAccount { yes } => {
            if !yes {
                bail!("Refusing to delete the account without --yes");
            }
            require_session(app).await?;
            app.auth.delete_account().await?;
            println!("Account deleted");
        }
        Commands::Periods { command } => {
            require_session(app).await?;
            run_periods(command, app).await?;
        }
        Commands::Report { on } => {
            require_session(app).await?;
            let day = on.unwrap_or_else(|| app.tracker.today());
            print_json(&app.tracker.report_for(day).await?)?;
        }
        Commands::ServerReport => {
            require_session(app).await?;
            print_json(&app.reports.all().await?)?;
        }
    }

    Ok(())
}

async fn run_periods<T: Transport>(command: PeriodCommands, app: &App<T>) -> Result<()> {
    let today = app.tracker.today();
    match command {
        PeriodCommands::List {
            page,
            per_page,
            all,
        } => {
            let periods = if all {
                app.tracker.history().await?
            } else {
                app.tracker.periods().list(page, per_page).await?
            };
            print_json(&periods)?;
        }
        PeriodCommands::Start { date } => {
            print_json(&app.tracker.start_period(date.unwrap_or(today)).await?)?;
        }
        PeriodCommands::End { date } => {
            print_json(&app.tracker.end_period(date.unwrap_or(today)).await?)?;
        }
        PeriodCommands::Delete { id } => {
            print_json(&app.tracker.delete_period(id).await?)?;
        }
    }
    Ok(())
}

/// Restores the stored session, failing when there is none.
async fn require_session<T: Transport>(
    app: &App<T>,
) -> Result<cycle_api::endpoints::users::User> {
    match app.auth.initialize().await? {
        Some(user) => Ok(user),
        None => bail!("Not logged in; run `cycle login <username>` first"),
    }
}

fn password_or_prompt(value: Option<String>, label: &str) -> Result<String> {
    match value {
        Some(value) => Ok(value),
        None => prompt(label),
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
