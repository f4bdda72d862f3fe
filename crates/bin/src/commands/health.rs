//! Health check command - probes a running jsondepot server.

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::cli::HealthArgs;

#[derive(Deserialize)]
struct HealthReport {
    status: String,
    #[serde(default)]
    backend: Option<String>,
}

/// Resolves the health endpoint for a server base URL. A URL that already
/// points at `/health` is used as is.
fn health_url(base: &str) -> Result<Url, url::ParseError> {
    let base = base.trim_end_matches('/');
    if base.ends_with("/health") {
        Url::parse(base)
    } else {
        Url::parse(&format!("{base}/"))?.join("health")
    }
}

/// Run the health check command
///
/// Succeeds only when the server answers with `"status": "healthy"`; any
/// other outcome is returned as an error so the process exits non-zero.
pub async fn run(args: &HealthArgs) -> Result<(), Box<dyn std::error::Error>> {
    let url = health_url(&args.url)?;
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.timeout))
        .build()?;

    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| format!("unhealthy: failed to connect to {url}: {e}"))?;
    if !response.status().is_success() {
        return Err(format!("unhealthy: server returned HTTP status {}", response.status()).into());
    }

    let report: HealthReport = response.json().await?;
    if report.status != "healthy" {
        return Err(format!("unhealthy: server reported status {}", report.status).into());
    }

    match report.backend {
        Some(backend) => println!("healthy (backend: {backend})"),
        None => println!("healthy"),
    }
    Ok(())
}
