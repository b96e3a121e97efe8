//! Lambda Cloud instance manager CLI.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lambda::{CancelToken, LambdaClient};
use tracing_subscriber::EnvFilter;

use lambda_cli::commands::{
    LaunchCommand, ListCommand, SshConfigCommand, TerminateCommand, TypesCommand,
};
use lambda_cli::menu;

/// Lambda Cloud instance manager.
#[derive(Parser)]
#[command(
    name = "lambda",
    version,
    about = "Acquire and manage Lambda Cloud GPU instances",
    long_about = "Acquire and manage Lambda Cloud GPU instances.\n\n\
                  Capacity for popular GPU types comes and goes by the minute;\n\
                  `launch --wait` keeps polling until a region opens up. Run\n\
                  without a subcommand for the interactive menu."
)]
#[command(propagate_version = true)]
struct Cli {
    /// Lambda Cloud API key.
    #[arg(long, env = "LAMBDA_API_KEY", global = true, hide_env_values = true)]
    api_key: Option<String>,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch an instance, waiting for capacity if asked.
    ///
    /// With --wait, polls the catalog until a region has capacity, the
    /// retry budget runs out, or Ctrl-C is pressed.
    Launch(LaunchCommand),

    /// List running instances.
    List(ListCommand),

    /// List instance types and where they have capacity.
    Types(TypesCommand),

    /// Terminate instances.
    Terminate(TerminateCommand),

    /// Manage ~/.ssh/config entries for instances.
    SshConfig(SshConfigCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("info,lambda=debug,lambda_cli=debug")
    } else {
        EnvFilter::new("warn,lambda=info,lambda_cli=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let api_key = cli
        .api_key
        .context("API key not provided; use --api-key or set LAMBDA_API_KEY")?;
    let client = LambdaClient::new(api_key).context("initializing API client")?;

    // Ctrl-C requests cooperative cancellation; prompts in raw mode handle
    // it themselves, so this fires during fetches and retry waits.
    let cancel = CancelToken::new();
    let watcher = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            watcher.cancel();
        }
    });

    match cli.command {
        Some(Commands::Launch(cmd)) => cmd.run(&client, &cancel).await,
        Some(Commands::List(cmd)) => cmd.run(&client).await,
        Some(Commands::Types(cmd)) => cmd.run(&client).await,
        Some(Commands::Terminate(cmd)) => cmd.run(&client).await,
        Some(Commands::SshConfig(cmd)) => cmd.run(&client).await,
        None => menu::run(&client, &cancel).await,
    }
}
