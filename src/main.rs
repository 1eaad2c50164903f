use civictrack::cli::commands;
use civictrack::cli::{Cli, Commands};
use civictrack::config;
use civictrack::{logging, CivicError};
use clap::Parser;
use std::io::{self, IsTerminal};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    let overrides = config::CliOverrides {
        db: cli.db.clone(),
        lock_timeout: cli.lock_timeout,
    };

    let result = match cli.command {
        Commands::Init { force } => commands::init::execute(force, cli.json),
        Commands::Ingest(args) => commands::ingest::execute(args, cli.json, &overrides),
        Commands::Transition(args) => commands::transition::execute(args, cli.json, &overrides),
        Commands::Show { id } => commands::show::execute(&id, cli.json, &overrides),
        Commands::List(args) => commands::list::execute(&args, cli.json, &overrides),
        Commands::Backlog => commands::backlog::execute(cli.json, &overrides),
        Commands::Log { id } => commands::log::execute(&id, cli.json, &overrides),
        Commands::Stats { zone } => commands::stats::execute(&zone, cli.json, &overrides),
        Commands::Zone { command } => commands::zone::execute(&command, cli.json, &overrides),
        Commands::Sweep(args) => commands::sweep::execute(&args, cli.json, &overrides),
        Commands::Watch => commands::watch::execute(&overrides),
    };

    if let Err(e) = result {
        handle_error(&e, cli.json);
    }
}

/// Print the error (JSON when requested or stdout is piped) and exit
/// with its mapped code.
fn handle_error(err: &CivicError, json_mode: bool) -> ! {
    let use_json = json_mode || !io::stdout().is_terminal();

    if use_json {
        let payload = serde_json::json!({
            "error": err.to_string(),
            "suggestion": err.suggestion(),
            "recoverable": err.is_user_recoverable(),
        });
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string())
        );
    } else {
        eprintln!("Error: {err}");
        if let Some(suggestion) = err.suggestion() {
            eprintln!("Hint: {suggestion}");
        }
    }

    std::process::exit(err.exit_code());
}
