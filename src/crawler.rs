use std::collections::BTreeSet;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{info, warn};
use url::Url;

pub const BASE_URL: &str = "https://app.invima.gov.co/alertas/dispositivos-medicos-invima";

// The site rejects default client user agents.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

static URL_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"^https://app\.invima\.gov\.co/alertas/ckfinder/userfiles/files/ALERTAS%20SANITARIAS/.+\.pdf").unwrap(),
        Regex::new(r"^https://app\.invima\.gov\.co/alertas/ckfinder/userfiles/files/INFORMES%20DE%20SEGURIDAD/.+\.pdf").unwrap(),
    ]
});

pub fn build_client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to build HTTP client")
}

/// Crawl the listing pages and return the deduplicated PDF URLs in
/// lexicographic order. A listing page that fails to load stops the
/// pagination; whatever was collected so far is returned.
pub async fn discover_pdf_urls(
    client: &Client,
    base_url: &str,
    year: &str,
    max_pages: usize,
) -> Result<Vec<String>> {
    let mut found = BTreeSet::new();
    let mut page_url = Url::parse(base_url).context("Invalid base URL")?;

    for page in 1..=max_pages {
        info!("Fetching listing page {}: {}", page, page_url);
        let html = match fetch_page(client, &page_url).await {
            Ok(html) => html,
            Err(e) => {
                warn!("Listing page {} failed: {}", page_url, e);
                break;
            }
        };
        let (links, next) = collect_links(&html, &page_url, year);
        found.extend(links);
        match next {
            Some(next) => page_url = next,
            None => break,
        }
    }

    info!("Found {} candidate PDF URLs", found.len());
    Ok(found.into_iter().collect())
}

async fn fetch_page(client: &Client, url: &Url) -> Result<String> {
    let body = client
        .get(url.clone())
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    Ok(body)
}

/// Scan anchors for relevant PDF links and the "Siguiente" pagination link.
/// Links are kept when they end in `.pdf` and mention the target year, or
/// when they match one of the known document-folder patterns.
fn collect_links(html: &str, page_url: &Url, year: &str) -> (Vec<String>, Option<Url>) {
    let doc = Html::parse_document(html);
    let anchors = Selector::parse("a[href]").unwrap();

    let mut links = Vec::new();
    let mut next = None;
    for anchor in doc.select(&anchors) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Ok(absolute) = page_url.join(href) else {
            continue;
        };
        let url = absolute.to_string();

        if url.to_lowercase().ends_with(".pdf") && url.contains(year) {
            links.push(url);
        } else if URL_PATTERNS.iter().any(|re| re.is_match(&url)) {
            links.push(url);
        }

        if next.is_none() {
            let text = anchor.text().collect::<String>();
            if text.to_lowercase().contains("siguiente") {
                next = Some(absolute);
            }
        }
    }
    (links, next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_url() -> Url {
        Url::parse(BASE_URL).unwrap()
    }

    #[test]
    fn keeps_pdf_links_for_target_year() {
        let html = r#"<a href="/alertas/files/alerta%20001-2025.pdf">Alerta</a>
                      <a href="/alertas/files/alerta%20050-2024.pdf">Vieja</a>
                      <a href="/alertas/otra-pagina">No PDF</a>"#;
        let (links, _) = collect_links(html, &page_url(), "2025");
        assert_eq!(links.len(), 1);
        assert!(links[0].ends_with("alerta%20001-2025.pdf"));
    }

    #[test]
    fn keeps_known_folder_patterns_regardless_of_year() {
        let html = r#"<a href="https://app.invima.gov.co/alertas/ckfinder/userfiles/files/INFORMES%20DE%20SEGURIDAD/informe%20002-2024.pdf">Informe</a>"#;
        let (links, _) = collect_links(html, &page_url(), "2025");
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn finds_next_page_link() {
        let html = r#"<a href="?page=2">Siguiente</a>"#;
        let (_, next) = collect_links(html, &page_url(), "2025");
        assert!(next.unwrap().to_string().ends_with("?page=2"));
    }

    #[test]
    fn no_next_page() {
        let html = r#"<a href="/inicio">Inicio</a>"#;
        let (_, next) = collect_links(html, &page_url(), "2025");
        assert!(next.is_none());
    }
}
