//! posio CLI
//!
//! Positional reads and writes against a file, from outside the program
//! that owns it.
//!
//! # Commands
//!
//! - `read` - Read bytes at an offset without moving the file cursor
//! - `write` - Write bytes at an offset, zero-filling any gap
//! - `inspect` - Display size, strategy and cursor of a file handle

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Positional file I/O tools.
#[derive(Parser)]
#[command(name = "posio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(global = true, short, long, default_value = "text")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read bytes at an offset
    Read {
        /// File to read
        file: PathBuf,

        /// Byte offset (distance back from the end with --from-end)
        #[arg(short, long, default_value = "0")]
        offset: u64,

        /// Number of bytes to read (default: to the end)
        #[arg(short, long)]
        length: Option<u64>,

        /// Count the offset back from the end of the file
        #[arg(long)]
        from_end: bool,

        /// Use the locked seek/restore strategy
        #[arg(short, long)]
        emulated: bool,

        /// Print a hex dump instead of raw bytes
        #[arg(short = 'x', long)]
        hex: bool,
    },

    /// Write bytes at an offset
    Write {
        /// File to write
        file: PathBuf,

        /// Byte offset
        #[arg(short, long, default_value = "0")]
        offset: u64,

        /// Text to write
        #[arg(short, long, conflicts_with = "hex", required_unless_present = "hex")]
        data: Option<String>,

        /// Hex-encoded bytes to write
        #[arg(short = 'x', long)]
        hex: Option<String>,

        /// Create the file if it does not exist
        #[arg(short, long)]
        create: bool,

        /// Use the locked seek/restore strategy
        #[arg(short, long)]
        emulated: bool,
    },

    /// Display file size, strategy and cursor position
    Inspect {
        /// File to inspect
        file: PathBuf,

        /// Use the locked seek/restore strategy
        #[arg(short, long)]
        emulated: bool,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Read {
            file,
            offset,
            length,
            from_end,
            emulated,
            hex,
        } => {
            let request = commands::read::ReadRequest {
                offset,
                length,
                from_end,
                hex,
            };
            commands::read::run(&file, &request, emulated, &cli.format)?;
        }
        Commands::Write {
            file,
            offset,
            data,
            hex,
            create,
            emulated,
        } => {
            let bytes = commands::write::payload(data.as_deref(), hex.as_deref())?;
            commands::write::run(&file, offset, &bytes, create, emulated, &cli.format)?;
        }
        Commands::Inspect { file, emulated } => {
            commands::inspect::run(&file, emulated, &cli.format)?;
        }
        Commands::Version => {
            println!("posio CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("posio v{}", posio::VERSION);
        }
    }

    Ok(())
}
