//! Document inspection commands.

use jsondepot::{Store, path::PathBuf, value::Value};

use crate::backend::create_backend;
use crate::cli::{DocGetArgs, DocListArgs};
use crate::output::{OutputFormat, print_table};

/// Run the `doc list` command
pub async fn list(args: &DocListArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::new(create_backend(&args.backend_config).await?);
    let ids = store.backend().list_ids().await?;

    let mut documents = Vec::with_capacity(ids.len());
    for id in &ids {
        documents.push(store.get(id).await?);
    }

    match args.format {
        OutputFormat::Human => {
            if documents.is_empty() {
                println!("No documents found.");
                return Ok(());
            }

            let rows: Vec<Vec<String>> = documents
                .iter()
                .map(|doc| {
                    vec![
                        doc.id.to_string(),
                        doc.data.kind().to_string(),
                        doc.version.to_string(),
                        doc.updated_at.to_rfc3339(),
                    ]
                })
                .collect();
            print_table(&["ID", "KIND", "VERSION", "UPDATED"], &rows);
        }
        OutputFormat::Json => {
            let entries: Vec<_> = documents
                .iter()
                .map(|doc| {
                    serde_json::json!({
                        "id": doc.id.to_string(),
                        "kind": doc.data.kind().as_str(),
                        "version": doc.version,
                        "highestCreatedId": doc.watermark,
                        "createdAt": doc.created_at,
                        "updatedAt": doc.updated_at,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string(&entries)?);
        }
    }

    Ok(())
}

/// Run the `doc get` command
pub async fn get(args: &DocGetArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::new(create_backend(&args.backend_config).await?);
    let id = Store::parse_id(&args.id)?;
    let path = PathBuf::normalize(args.path.as_deref().unwrap_or_default());
    let value: Value = store.resolve(&id, &path).await?;

    match args.format {
        OutputFormat::Human => println!("{}", serde_json::to_string_pretty(&value)?),
        OutputFormat::Json => println!("{}", serde_json::to_string(&value)?),
    }

    Ok(())
}
