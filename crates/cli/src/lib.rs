pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "cartwheel",
    about = "Cartwheel operator CLI",
    long_about = "Apply migrations, load the demo catalog, and inspect effective configuration.",
    after_help = "Examples:\n  cartwheel migrate\n  cartwheel seed\n  cartwheel seed --clean\n  cartwheel config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load and verify the demo catalog fixture")]
    Seed {
        #[arg(long, help = "Remove seeded items that no cart or order references instead")]
        clean: bool,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed { clean: false } => commands::seed::run(),
        Command::Seed { clean: true } => commands::seed::clean(),
        Command::Config => commands::config::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
