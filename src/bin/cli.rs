//! dotkv CLI
//!
//! Command-line interface for inspecting and editing a store file.

use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use dotkv::{FileFormat, FileStore, ReloadPolicy, StorageBase, StoreConfig, Value};
use tracing_subscriber::{fmt, EnvFilter};

/// dotkv CLI
#[derive(Parser, Debug)]
#[command(name = "dotkv")]
#[command(about = "Read and edit dotkv configuration files")]
#[command(version)]
struct Args {
    /// Store file
    #[arg(short, long)]
    file: String,

    /// On-disk format
    #[arg(long, value_enum, default_value = "lightning")]
    format: Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Lightning,
    Binary,
}

impl From<Format> for FileFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Lightning => FileFormat::Lightning,
            Format::Binary => FileFormat::Binary,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// Dotted key, e.g. server.port
        key: String,
    },

    /// Set a key-value pair (type inferred: bool, int, float, string)
    Set {
        /// Dotted key
        key: String,

        /// The value to set
        value: String,
    },

    /// Remove a key
    Remove {
        /// Dotted key
        key: String,
    },

    /// List keys
    Keys {
        /// Only list keys under this section
        prefix: Option<String>,

        /// Only list the immediate layer
        #[arg(short, long)]
        shallow: bool,
    },
}

fn main() -> ExitCode {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> dotkv::Result<()> {
    let config = StoreConfig::builder()
        .format(args.format.into())
        .reload_policy(ReloadPolicy::Manual)
        .build();

    let store = FileStore::open(&args.file, config)?;
    tracing::debug!("Opened {} (dotkv v{})", args.file, dotkv::VERSION);

    match args.command {
        Commands::Get { key } => match store.get(&key)? {
            Some(value) => println!("{}", value),
            None => println!("(nil)"),
        },
        Commands::Set { key, value } => {
            store.set(&key, Value::infer(&value))?;
            println!("OK");
        }
        Commands::Remove { key } => {
            store.remove(&key)?;
            println!("OK");
        }
        Commands::Keys { prefix, shallow } => {
            let keys = match (prefix.as_deref(), shallow) {
                (None, false) => store.key_set()?,
                (None, true) => store.single_layer_key_set()?,
                (Some(prefix), false) => store.key_set_under(prefix)?,
                (Some(prefix), true) => store.single_layer_key_set_under(prefix)?,
            };
            for key in keys {
                println!("{}", key);
            }
        }
    }

    Ok(())
}
