use crate::demo::{print_stages, run_demo, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use hiring_pipeline::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Hiring Pipeline",
    about = "Serve and demonstrate the applicant hiring pipeline from the command line",
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
    /// Print the canonical hiring stage sequence
    Stages,
    /// Walk a sample applicant through the pipeline and print its status history
    Demo(DemoArgs),
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
        Command::Stages => {
            print_stages();
            Ok(())
        }
        Command::Demo(args) => run_demo(args),
    }
}
