//! Tickloop demo driver
//!
//! Runs small scenarios against event-loop threads and pools so their
//! behavior can be watched from a terminal. `RUST_LOG=tickloop=debug` shows
//! the lifecycle transitions.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tickloop-demo")]
#[command(about = "Demo scenarios for tickloop event loops", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON file with a LoopConfig (threads, tick, thread_name)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// One delayed message plus two intervals, one of which chains an immediate task
    Intervals {
        /// Base period in milliseconds
        #[arg(short, long, default_value_t = 1000)]
        period_ms: u64,
        /// How long to let the loop run, in milliseconds
        #[arg(short, long, default_value_t = 5000)]
        duration_ms: u64,
    },

    /// Tasks that schedule delayed follow-ups of themselves, on a thread then a pool
    Reenqueue {
        /// Number of seed tasks
        #[arg(short, long, default_value_t = 100)]
        tasks: u32,
        /// Delay of each follow-up, in milliseconds
        #[arg(long, default_value_t = 300)]
        delay_ms: u64,
        /// How long to let each host run, in milliseconds
        #[arg(short, long, default_value_t = 1000)]
        duration_ms: u64,
    },

    /// Move-only task objects processed by a single handler
    Objects {
        /// Number of immediate objects
        #[arg(short = 'n', long, default_value_t = 100)]
        count: u32,
        /// How long to let the pool run, in milliseconds
        #[arg(short, long, default_value_t = 1000)]
        duration_ms: u64,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref())?;
    tracing::debug!(?config, "loaded configuration");

    match cli.command {
        Commands::Intervals {
            period_ms,
            duration_ms,
        } => commands::intervals::execute(config, period_ms, duration_ms),

        Commands::Reenqueue {
            tasks,
            delay_ms,
            duration_ms,
        } => commands::reenqueue::execute(config, tasks, delay_ms, duration_ms),

        Commands::Objects { count, duration_ms } => {
            commands::objects::execute(config, count, duration_ms)
        }
    }
}
