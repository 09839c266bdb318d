//! Hyeto CLI - Command line tool for design-storm hyetographs.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "hyeto-cli",
    version,
    about = "Design-storm hyetographs from SCS and Huff rainfall distributions"
)]
struct Cli {
    #[command(subcommand)]
    command: hyeto_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("hyeto-cli {}", env!("CARGO_PKG_VERSION"));
    hyeto_cmd::run(cli.command).await
}
