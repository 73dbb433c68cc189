use clap::Parser;

use fleetscrape::cli::{check, probe, run, CheckCommand, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    match &cli.command {
        Commands::Run(args) => run::execute(args).await?,
        Commands::Probe(args) => probe::execute(args).await?,
        Commands::Check(CheckCommand::Config(arg)) => check::execute_config(&arg.config)?,
        Commands::Check(CheckCommand::Connection(arg)) => {
            check::execute_connection(&arg.config).await?;
        }
    }

    Ok(())
}
