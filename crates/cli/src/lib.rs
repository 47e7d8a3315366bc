pub mod commands;
pub mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "movemate",
    about = "Movemate booking operator CLI",
    long_about = "Inspect configuration, manage booking drafts, submit booking steps, and manage bids.",
    after_help = "Examples:\n  movemate config\n  movemate drafts sync --user-id u-42\n  movemate submit --step 1 --values request.json\n  movemate bids accept --job J1 --bid 7 --yes"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Inspect effective configuration values with source attribution and redaction")]
    Config,
    #[command(about = "Apply pending local storage migrations")]
    Migrate,
    #[command(about = "List, sync, and clear booking drafts")]
    Drafts {
        #[command(subcommand)]
        command: DraftsCommand,
    },
    #[command(about = "Validate and submit one booking step from a JSON values file")]
    Submit {
        #[arg(long, help = "Step number, 1 to 4")]
        step: u8,
        #[arg(long, help = "Path to a JSON file holding the request values")]
        values: PathBuf,
        #[arg(long, help = "Existing request id returned by step 1")]
        request_id: Option<String>,
        #[arg(long, help = "Submit through the edit endpoints")]
        edit: bool,
    },
    #[command(about = "List, accept, and delete bids on a job")]
    Bids {
        #[command(subcommand)]
        command: BidsCommand,
    },
}

#[derive(Debug, Subcommand)]
enum DraftsCommand {
    #[command(about = "List local and API drafts")]
    List,
    #[command(about = "Replace API drafts with the user's drafts from the server")]
    Sync {
        #[arg(long, help = "User whose drafts to fetch; defaults to api.user_id")]
        user_id: Option<String>,
    },
    #[command(about = "Delete every local draft; API drafts are untouched")]
    ClearLocal,
}

#[derive(Debug, Subcommand)]
enum BidsCommand {
    #[command(about = "List the bids on a job")]
    List {
        #[arg(long)]
        job: String,
    },
    #[command(about = "Accept a pending bid and assign its provider")]
    Accept {
        #[arg(long)]
        job: String,
        #[arg(long)]
        bid: String,
        #[arg(long, help = "Confirm this irreversible action")]
        yes: bool,
    },
    #[command(about = "Delete a pending bid")]
    Delete {
        #[arg(long)]
        job: String,
        #[arg(long)]
        bid: String,
        #[arg(long, help = "Confirm this irreversible action")]
        yes: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    logging::init_from_env();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Migrate => commands::migrate::run(),
        Command::Drafts { command: DraftsCommand::List } => commands::drafts::list(),
        Command::Drafts { command: DraftsCommand::Sync { user_id } } => commands::drafts::sync(user_id),
        Command::Drafts { command: DraftsCommand::ClearLocal } => commands::drafts::clear_local(),
        Command::Submit { step, values, request_id, edit } => {
            commands::submit::run(commands::submit::SubmitArgs { step, values, request_id, edit })
        }
        Command::Bids { command: BidsCommand::List { job } } => commands::bids::list(&job),
        Command::Bids { command: BidsCommand::Accept { job, bid, yes } } => {
            commands::bids::accept(&job, &bid, yes)
        }
        Command::Bids { command: BidsCommand::Delete { job, bid, yes } } => {
            commands::bids::delete(&job, &bid, yes)
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
