//! Article page fetching and title resolution

use std::time::Duration;

use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, info};
use url::Url;

use crate::error::ExtractError;

/// Request timeout for article pages
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches article pages and resolves their display title
#[derive(Debug, Clone)]
pub struct ArticleFetcher {
    client: Client,
}

impl ArticleFetcher {
    /// Create a new article fetcher
    pub fn new() -> Result<Self, ExtractError> {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            // Browser user agent as a precaution against news sites which
            // reject requests from unknown agents
            .user_agent(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/102.0.5005.115 Safari/537.36",
            )
            .build()
            .map_err(|e| ExtractError::RequestFailed(e.to_string()))?;

        Ok(Self { client })
    }

    /// Fetch a page and resolve its title
    ///
    /// Returns `Ok(None)` when the page was fetched but carries neither an
    /// Open-Graph title nor a non-empty `<title>` element. Network errors,
    /// timeouts and non-success statuses are returned as `ExtractError`.
    pub async fn fetch_title(&self, url: &str) -> Result<Option<String>, ExtractError> {
        let parsed = Url::parse(url).map_err(|_| ExtractError::InvalidUrl(url.to_string()))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ExtractError::InvalidUrl(url.to_string()));
        }

        info!("Attempting to fetch page {} for news title", url);

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| ExtractError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ExtractError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ExtractError::Body(e.to_string()))?;

        let title = parse_title(&body);
        if title.is_none() {
            debug!("Page {} contains no Open-Graph title or title tag", url);
        }

        Ok(title)
    }
}

/// Resolve a document title: Open-Graph title first, `<title>` text second
fn parse_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    if let Some(title) = og_title(&document) {
        return Some(title);
    }

    document_title(&document)
}

fn og_title(document: &Html) -> Option<String> {
    let selector = Selector::parse(r#"meta[property="og:title"], meta[name="og:title"]"#).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
}

fn document_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|title| title.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_title_prefers_open_graph() {
        let html = r#"<html><head>
            <meta property="og:title" content="Example Headline">
            <title>Example Site - Example Headline</title>
        </head><body></body></html>"#;
        assert_eq!(parse_title(html), Some("Example Headline".to_string()));
    }

    #[test]
    fn test_parse_title_og_name_attribute() {
        let html = r#"<html><head>
            <meta name="og:title" content="Named Headline">
        </head></html>"#;
        assert_eq!(parse_title(html), Some("Named Headline".to_string()));
    }

    #[test]
    fn test_parse_title_falls_back_to_title_tag() {
        let html = "<html><head><title>Plain Title</title></head></html>";
        assert_eq!(parse_title(html), Some("Plain Title".to_string()));
    }

    #[test]
    fn test_parse_title_trims_whitespace() {
        let html = "<html><head><title>\n   Spaced Out  \n</title></head></html>";
        assert_eq!(parse_title(html), Some("Spaced Out".to_string()));
    }

    #[test]
    fn test_parse_title_empty_title_is_none() {
        let html = "<html><head><title>   </title></head></html>";
        assert_eq!(parse_title(html), None);
    }

    #[test]
    fn test_parse_title_missing_is_none() {
        let html = "<html><head></head><body><p>no titles here</p></body></html>";
        assert_eq!(parse_title(html), None);
    }

    #[test]
    fn test_parse_title_empty_og_falls_back() {
        let html = r#"<html><head>
            <meta property="og:title" content="">
            <title>Fallback Title</title>
        </head></html>"#;
        assert_eq!(parse_title(html), Some("Fallback Title".to_string()));
    }
}
