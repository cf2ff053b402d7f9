use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod shutdown;

use commands::hex_utils::parse_hex_address;

#[derive(Parser)]
#[command(name = "exile")]
#[command(about = "Inspect a game UI tree from a memory image")]
struct Args {
    /// Memory image (JSON)
    #[arg(short, long, default_value = "image.json", env = "EXILE_IMAGE")]
    image: PathBuf,

    /// Reader configuration (TOML)
    #[arg(short, long, default_value = "exile.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the element tree below the UI root
    Tree {
        /// Include hidden elements
        #[arg(short, long)]
        all: bool,
        /// Maximum depth to print
        #[arg(short, long, default_value_t = 8)]
        depth: usize,
    },
    /// Navigate from the UI root by child indices, e.g. `1,0,4`
    Path {
        #[arg(value_delimiter = ',', required = true)]
        indices: Vec<usize>,
    },
    /// Print all label text in the tree
    Strings,
    /// Print the life component at an address
    Life {
        #[arg(value_parser = parse_hex_address)]
        address: u64,
    },
    /// Reload the image periodically and print visible labels
    Watch {
        /// Refresh interval in milliseconds
        #[arg(short, long, default_value_t = 500)]
        interval: u64,
    },
    /// Write a small demonstration image
    Sample {
        #[arg(default_value = "image.json")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("exile=info".parse()?))
        .init();

    let args = Args::parse();
    let config = config::load_or_default(&args.config);

    match args.command {
        Command::Tree { all, depth } => commands::tree::run(&args.image, &config, all, depth),
        Command::Path { indices } => commands::path::run(&args.image, &config, &indices),
        Command::Strings => commands::strings::run(&args.image, &config),
        Command::Life { address } => commands::life::run(&args.image, &config, address),
        Command::Watch { interval } => commands::watch::run(&args.image, &config, interval),
        Command::Sample { output } => commands::sample::run(&output),
    }
}
