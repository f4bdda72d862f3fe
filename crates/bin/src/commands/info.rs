//! Info command - shows the configured backend and how many documents it holds.

use crate::backend::{backend_label, create_backend};
use crate::cli::InfoArgs;
use crate::output::OutputFormat;

/// Run the info command
pub async fn run(args: &InfoArgs) -> Result<(), Box<dyn std::error::Error>> {
    let backend = create_backend(&args.backend_config).await?;
    let documents = backend.count().await?;
    let backend_str = backend_label(&args.backend_config);

    match args.format {
        OutputFormat::Human => {
            println!("Version:     {}", env!("CARGO_PKG_VERSION"));
            println!("Backend:     {backend_str}");
            println!("Documents:   {documents}");
        }
        OutputFormat::Json => {
            let value = serde_json::json!({
                "version": env!("CARGO_PKG_VERSION"),
                "backend": backend_str,
                "documents": documents,
            });
            println!("{}", serde_json::to_string(&value)?);
        }
    }

    Ok(())
}
