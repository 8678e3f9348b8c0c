use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "accidents-sql")]
#[command(version, about = "Convert US accident CSV extracts into batched SQL INSERT scripts")]
pub struct Cli {
    /// Configuration file (JSON); defaults to the user config or the current directory layout
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the pipeline steps in one process
    Run {
        /// Only run these steps and what they need (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        include: Option<Vec<String>>,

        /// Skip these steps and everything that needs them (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        exclude: Option<Vec<String>>,

        /// Show the terminal UI
        #[arg(long)]
        tui: bool,

        /// Download the airport database first if it is not cached
        #[arg(long)]
        fetch_airports: bool,
    },

    /// Run a single step, reading earlier ids from their output files
    Generate {
        /// Step name (see list-steps)
        step: String,
    },

    /// Run every step as a separate process
    Suite,

    /// Load the generated INSERT scripts into a new SQLite database
    Load {
        /// Output SQLite database path
        output_db: PathBuf,

        /// Directory holding the scripts instead of the configured paths
        #[arg(short, long)]
        input_dir: Option<PathBuf>,
    },

    /// Download the OurAirports database used to name airports
    FetchAirports {
        /// Cache directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Force re-download even if cached
        #[arg(short, long)]
        force: bool,
    },

    /// List pipeline steps in execution order
    ListSteps,

    /// List all table names
    ListTables,

    /// Print the effective configuration as JSON
    Config,
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
