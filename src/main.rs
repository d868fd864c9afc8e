use clap::Parser;
use jose_session::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let output = cli.command.log_output();

    match cli.command {
        Command::Serve(args) => cli::serve::run(args, output).await,
        Command::Keygen(args) => cli::keygen::run(args, output).await,
        Command::Mint(args) => cli::mint::run(args, output).await,
    }
}
