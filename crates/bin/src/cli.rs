//! CLI argument definitions for the jsondepot binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::output::OutputFormat;

/// Storage backend type
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Backend {
    /// SQLite database (default, production-ready)
    Sqlite,
    /// PostgreSQL database (for shared deployments)
    Postgres,
    /// In-memory with JSON persistence (for development and ephemeral deployments)
    Inmemory,
}

/// jsondepot schema-less JSON document store
#[derive(Parser, Debug)]
#[command(name = "jsondepot")]
#[command(about = "jsondepot: a schema-less JSON document store with path-addressed updates")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server
    Serve(ServeArgs),
    /// Check health of a running jsondepot server
    Health(HealthArgs),
    /// Show backend and document counts
    Info(InfoArgs),
    /// Inspect stored documents
    #[command(subcommand)]
    Doc(DocCommands),
}

/// Storage configuration shared by every command that opens a backend
#[derive(clap::Args, Debug, Clone)]
pub struct BackendConfig {
    /// Storage backend to use
    #[arg(short, long, default_value = "sqlite", env = "JSONDEPOT_BACKEND")]
    pub backend: Backend,

    /// Data directory for storage files.
    /// For SQLite: stores jsondepot.db
    /// For InMemory: stores jsondepot.json
    #[arg(short = 'D', long, env = "JSONDEPOT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// PostgreSQL connection URL (required when backend=postgres)
    #[arg(long, env = "JSONDEPOT_POSTGRES_URL")]
    pub postgres_url: Option<String>,
}

/// Arguments for the serve command
#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value_t = 3000, env = "JSONDEPOT_PORT")]
    pub port: u16,

    /// Bind address
    #[arg(long, default_value = "0.0.0.0", env = "JSONDEPOT_HOST")]
    pub host: String,

    /// How many times a write is retried after losing a concurrent update race
    #[arg(long, default_value_t = 8, env = "JSONDEPOT_MAX_WRITE_RETRIES")]
    pub max_write_retries: u32,

    #[command(flatten)]
    pub backend_config: BackendConfig,
}

/// Arguments for the health command
#[derive(clap::Args, Debug)]
pub struct HealthArgs {
    /// Base URL of the server to check
    #[arg(long, default_value = "http://127.0.0.1:3000", env = "JSONDEPOT_URL")]
    pub url: String,

    /// Timeout in seconds
    #[arg(short, long, default_value_t = 5)]
    pub timeout: u64,
}

/// Arguments for the info command
#[derive(clap::Args, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub backend_config: BackendConfig,

    /// Output format
    #[arg(long, default_value = "human")]
    pub format: OutputFormat,
}

#[derive(Subcommand, Debug)]
pub enum DocCommands {
    /// List stored documents, oldest first
    List(DocListArgs),
    /// Print a document, or the value at a path inside it
    Get(DocGetArgs),
}

/// Arguments for `doc list`
#[derive(clap::Args, Debug)]
pub struct DocListArgs {
    #[command(flatten)]
    pub backend_config: BackendConfig,

    /// Output format
    #[arg(long, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for `doc get`
#[derive(clap::Args, Debug)]
pub struct DocGetArgs {
    /// Document id
    pub id: String,

    /// Slash-separated path inside the document
    pub path: Option<String>,

    #[command(flatten)]
    pub backend_config: BackendConfig,

    /// Output format
    #[arg(long, default_value = "human")]
    pub format: OutputFormat,
}
