//! Command implementations for the hyetograph CLI.
//!
//! Provides subcommands for listing distributions, computing design-storm
//! hyetographs and reading precipitation-frequency tables.

use clap::Subcommand;

pub mod calculate;
pub mod distributions;
pub mod export;
pub mod frequency;

#[derive(Subcommand)]
pub enum Command {
    /// List distribution families, sub-types, durations and time steps
    Distributions,

    /// Compute a design-storm hyetograph
    Calculate(calculate::CalculateArgs),

    /// Parse a precipitation-frequency table from a file or the frequency service
    Frequency(frequency::FrequencyArgs),
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Distributions => distributions::run_distributions(),
        Command::Calculate(args) => calculate::run_calculate(&args),
        Command::Frequency(args) => frequency::run_frequency(&args).await,
    }
}
