use crate::commands::{run_evaluate, run_frameworks, EvaluateArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use esgine::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "ESGine",
    about = "Score ESG reports against regulatory rule sets from the command line or over HTTP",
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
    /// Evaluate one or more report files and render the results
    Evaluate(EvaluateArgs),
    /// List the configured frameworks and their rule files
    Frameworks,
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

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Evaluate(args) => run_evaluate(args).await,
        Command::Frameworks => run_frameworks(),
    }
}
