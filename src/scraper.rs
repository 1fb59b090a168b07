//! Web crawling for note input.
//!
//! Uses reqwest for fetching and scraper for HTML parsing. The extracted text
//! is appended to whatever the user has already typed.

use reqwest::Client;
use scraper::{ElementRef, Html, Node, Selector};
use std::time::Duration;
use thiserror::Error;

/// User-Agent string identifying this crawler
pub(crate) const USER_AGENT: &str = concat!(
    "summanote/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/cladam/summanote)"
);

/// Default timeout for HTTP requests
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Elements whose text is never part of the page content
const SKIPPED_ELEMENTS: [&str; 5] = ["script", "style", "nav", "footer", "header"];

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("failed to fetch URL: {0}")]
    FetchError(#[from] reqwest::Error),
    #[error("no content found at URL")]
    NoContent,
}

/// Extracted content from a webpage
#[derive(Debug, Clone)]
pub struct WebContent {
    /// The original URL
    pub url: String,
    /// Page title
    pub title: Option<String>,
    /// Main text content, whitespace collapsed
    pub text: String,
}

/// Create a configured HTTP client
pub(crate) fn create_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
}

/// Fetch and extract content from a URL
pub async fn fetch_content(url: &str) -> Result<WebContent, ScraperError> {
    let client = create_client()?;

    let response = client.get(url).send().await?.error_for_status()?;
    let html = response.text().await?;

    let content = parse_page(url, &html)?;
    tracing::info!(url, chars = content.text.len(), "crawled page");
    Ok(content)
}

/// Extract title and text from an HTML page
pub fn parse_page(url: &str, html: &str) -> Result<WebContent, ScraperError> {
    let document = Html::parse_document(html);

    let title = extract_title(&document);
    let text = extract_text(&document);

    if text.is_empty() {
        return Err(ScraperError::NoContent);
    }

    Ok(WebContent {
        url: url.to_string(),
        title,
        text,
    })
}

/// Append crawled text to existing input, separated by a blank line
pub fn append_text(input: &str, crawled: &str) -> String {
    let input = input.trim_end();
    if input.is_empty() {
        crawled.to_string()
    } else {
        format!("{}\n\n{}", input, crawled)
    }
}

/// Extract the page title from <title> or <h1>
pub(crate) fn extract_title(document: &Html) -> Option<String> {
    ["title", "h1"]
        .into_iter()
        .filter_map(|s| Selector::parse(s).ok())
        .find_map(|selector| {
            let element = document.select(&selector).next()?;
            let title = collapse_whitespace(&element.text().collect::<String>());
            (!title.is_empty()).then_some(title)
        })
}

/// Extract readable text from the body, skipping scripts, styles and page chrome
pub(crate) fn extract_text(document: &Html) -> String {
    let root = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next())
        .unwrap_or_else(|| document.root_element());

    let mut raw = String::new();
    collect_text(root, &mut raw);
    collapse_whitespace(&raw)
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    if SKIPPED_ELEMENTS.contains(&element.value().name()) {
        return;
    }
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                out.push_str(text);
                out.push(' ');
            }
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, out);
                }
            }
            _ => {}
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
