//! VmoStore CLI
//!
//! Command-line tools for inspecting and maintaining a file-backed store.
//!
//! # Commands
//!
//! - `keys` - List backend keys
//! - `inspect` - Print the entries stored under a namespace
//! - `gc` - Remove keys of other store generations
//! - `clear` - Clear backend classes

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vmostore_core::{BackendClass, CipherMode, CleanupMode};

/// VmoStore command-line tools.
#[derive(Parser)]
#[command(name = "vmostore")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the backend file
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Arguments selecting a namespace key.
#[derive(clap::Args)]
struct NamespaceArgs {
    /// Namespace segment
    #[arg(short, long)]
    namespace: Option<String>,

    /// Prefix segment
    #[arg(long)]
    prefix: Option<String>,

    /// Version segment
    #[arg(long, default_value = "0")]
    store_version: i64,
}

#[derive(Subcommand)]
enum Commands {
    /// List backend keys
    Keys {
        /// Restrict to one class (durable, session)
        #[arg(short, long)]
        class: Option<BackendClass>,
    },

    /// Print every entry stored under a namespace
    Inspect {
        #[command(flatten)]
        namespace: NamespaceArgs,

        /// Secret the blobs were sealed with
        #[arg(short, long)]
        key: Option<String>,

        /// Transform the blobs were sealed with (xor, aes)
        #[arg(long, default_value = "xor")]
        cipher: CipherMode,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Remove keys of other store generations
    Gc {
        #[command(flatten)]
        namespace: NamespaceArgs,

        /// Cleanup mode (all, self)
        #[arg(short, long)]
        mode: CleanupMode,
    },

    /// Clear backend classes
    Clear {
        /// Restrict to one class (durable, session)
        #[arg(short, long)]
        class: Option<BackendClass>,
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
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Keys { class } => {
            let path = cli.path.ok_or("Backend path required for keys")?;
            commands::keys::run(&path, class)?;
        }
        Commands::Inspect {
            namespace,
            key,
            cipher,
            format,
        } => {
            let path = cli.path.ok_or("Backend path required for inspect")?;
            let namespace = namespace.resolve();
            commands::inspect::run(&path, &namespace, key, cipher, &format)?;
        }
        Commands::Gc { namespace, mode } => {
            let path = cli.path.ok_or("Backend path required for gc")?;
            commands::gc::run(&path, &namespace.resolve(), mode)?;
        }
        Commands::Clear { class } => {
            let path = cli.path.ok_or("Backend path required for clear")?;
            commands::clear::run(&path, class)?;
        }
        Commands::Version => {
            println!("VmoStore CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("VmoStore Core v{}", vmostore_core::VERSION);
        }
    }

    Ok(())
}

impl NamespaceArgs {
    fn resolve(&self) -> vmostore_core::Namespace {
        vmostore_core::Namespace::new(
            self.prefix.as_deref(),
            self.namespace.as_deref(),
            self.store_version,
        )
    }
}
