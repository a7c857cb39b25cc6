use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{Client, StatusCode};
use tracing::{info, warn};

// Fixed delay between downloads to avoid overloading the source server.
const PACING: Duration = Duration::from_secs(1);

/// Download each PDF into `dest`, one at a time. Failures are logged and
/// skipped; the paths actually written are returned in input order.
pub async fn download_all(client: &Client, urls: &[String], dest: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dest)
        .with_context(|| format!("Failed to create {}", dest.display()))?;

    let pb = ProgressBar::new(urls.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let mut files = Vec::new();
    for (i, url) in urls.iter().enumerate() {
        if let Some(path) = download_one(client, url, dest).await {
            files.push(path);
        }
        pb.inc(1);
        if i + 1 < urls.len() {
            tokio::time::sleep(PACING).await;
        }
    }
    pb.finish_and_clear();

    info!("Downloaded {} of {} PDFs", files.len(), urls.len());
    Ok(files)
}

async fn download_one(client: &Client, url: &str, dest: &Path) -> Option<PathBuf> {
    let name = url.rsplit('/').next().filter(|s| !s.is_empty())?;
    let path = dest.join(name);

    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            warn!("Failed to download {}: {}", url, e);
            return None;
        }
    };
    match response.status() {
        StatusCode::NOT_FOUND | StatusCode::INTERNAL_SERVER_ERROR => {
            warn!("Skipping {} ({})", url, response.status());
            return None;
        }
        status if !status.is_success() => {
            warn!("Skipping {} ({})", url, status);
            return None;
        }
        _ => {}
    }

    let bytes = match response.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Failed to read body of {}: {}", url, e);
            return None;
        }
    };
    if let Err(e) = fs::write(&path, &bytes) {
        warn!("Failed to write {}: {}", path.display(), e);
        return None;
    }
    Some(path)
}
