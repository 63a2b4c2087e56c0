pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "opsdesk",
    about = "Opsdesk operator CLI",
    long_about = "Operate the agency dashboard backend: demo data seeding, readiness checks, config inspection, and mock session management.",
    after_help = "Examples:\n  opsdesk seed\n  opsdesk doctor --json\n  opsdesk login dana agency-demo\n  opsdesk whoami"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Load the deterministic demo dataset and verify its contract")]
    Seed,
    #[command(about = "Run end-to-end readiness checks with per-check timing details")]
    Smoke,
    #[command(about = "Inspect effective configuration values with secret redaction")]
    Config,
    #[command(about = "Validate config, session storage, and fixture integrity")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Sign in against the mock directory with the shared demo password")]
    Login {
        username: String,
        password: String,
    },
    #[command(about = "Show the currently signed-in user")]
    Whoami,
    #[command(about = "Clear the persisted session")]
    Logout,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Seed => commands::seed::run(),
        Command::Smoke => commands::smoke::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Login { username, password } => commands::session::login(&username, &password),
        Command::Whoami => commands::session::whoami(),
        Command::Logout => commands::session::logout(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
