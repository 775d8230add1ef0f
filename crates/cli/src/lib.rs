pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "storeagent",
    about = "Storeagent operator CLI",
    long_about = "Apply migrations, seed the demo catalog, inspect configuration, and run one-off agent queries.",
    after_help = "Examples:\n  storeagent migrate\n  storeagent seed\n  storeagent query \"Покажи товары в категории Электроника\"\n  storeagent config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the demo product catalog when the store is empty")]
    Seed,
    #[command(about = "Answer one natural-language query through the product tool server")]
    Query {
        #[arg(required = true, num_args = 1.., help = "Query text; multiple words are joined")]
        text: Vec<String>,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Query { text } => commands::query::run(&text.join(" ")),
        Command::Config => commands::config::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
