use clap::Parser;
use tracing_subscriber::EnvFilter;

mod backend;
mod cli;
mod commands {
    pub mod doc;
    pub mod health;
    pub mod info;
    pub mod serve;
}
mod output;

use cli::{Cli, Commands, DocCommands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("jsondepot=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Serve(args) => commands::serve::run(&args).await,
        Commands::Health(args) => commands::health::run(&args).await,
        Commands::Info(args) => commands::info::run(&args).await,
        Commands::Doc(DocCommands::List(args)) => commands::doc::list(&args).await,
        Commands::Doc(DocCommands::Get(args)) => commands::doc::get(&args).await,
    }
}
