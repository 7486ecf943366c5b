mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use logitkit_sampling::Strategy;

#[derive(Parser)]
#[command(name = "logitkit")]
#[command(author, version, about = "Filter logits and pick the next token", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a sampling pipeline over a score vector
    Sample {
        /// Scores, one per token (reads a JSON array from stdin if omitted)
        #[arg(allow_negative_numbers = true)]
        logits: Vec<f64>,

        /// Strategy as kind=value, in order (e.g. -s temperature=0.7 -s top_k=40 -s weighted)
        #[arg(short, long = "strategy", conflicts_with = "preset")]
        strategies: Vec<Strategy>,

        /// Use a named preset from the config file
        #[arg(short, long)]
        preset: Option<String>,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List configured presets
    Presets,

    /// View or set configuration
    Config {
        /// Config key (e.g., "sampling.temperature", "presets.creative.min_p")
        key: Option<String>,

        /// Value to set (if omitted, shows current value)
        value: Option<String>,
    },
}

fn main() -> Result<()> {
    // Keep stdout clean for piping; RUST_LOG raises verbosity
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::Level::WARN.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sample {
            logits,
            strategies,
            preset,
            seed,
            json,
        } => {
            commands::sample::execute(logits, strategies, preset.as_deref(), seed, json)?;
        }
        Commands::Presets => {
            commands::presets::execute()?;
        }
        Commands::Config { key, value } => {
            commands::config::execute(key.as_deref(), value.as_deref())?;
        }
    }

    Ok(())
}
