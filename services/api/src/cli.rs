use clap::{Args, Parser, Subcommand};

use crate::error::AppError;
use crate::server;

#[derive(Parser, Debug)]
#[command(
    name = "Profile Relay",
    about = "Run the profile enrichment service or process identifiers from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Process identifiers once and print the batch result as JSON
    Process(ProcessArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
pub(crate) struct ProcessArgs {
    /// Identifier to process; repeat the flag for several
    #[arg(long = "node-id", required = true)]
    pub(crate) node_ids: Vec<String>,
    /// Username hint applied when exactly one identifier is given
    #[arg(long)]
    pub(crate) username: Option<String>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Process(args) => server::run_process(args).await,
    }
}
