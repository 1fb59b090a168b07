//! Video, image and web search providers.
//!
//! Each provider scrapes a public results page. Parsing is kept separate from
//! fetching so it can be tested against saved pages.

use crate::media::SearchResult;
use crate::scraper::{create_client, extract_text, extract_title};
use reqwest::Url;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

const VIDEO_SEARCH_URL: &str = "https://www.youtube.com/results";
const IMAGE_SEARCH_URL: &str = "https://www.google.com/search";
const WEB_SEARCH_URL: &str = "https://www.google.com/search";

/// Characters of page text kept as a web result's snippet
const SNIPPET_CHARS: usize = 50;

const INITIAL_DATA_START: &str = "var ytInitialData = ";
const INITIAL_DATA_END: &str = ";</script>";

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("invalid search URL: {0}")]
    InvalidUrl(String),
    #[error("could not find result data in the search page")]
    MissingResultData,
    #[error("failed to parse search results: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// A web page found by [`search_web`], described by its own metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebResult {
    pub url: String,
    /// Contents of `<title>`, or the first `<h1>`
    pub page_title: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    /// Start of the page text
    pub snippet: String,
}

impl WebResult {
    /// Best available title: Open Graph, then the page title, then the URL.
    pub fn display_title(&self) -> &str {
        self.og_title
            .as_deref()
            .or(self.page_title.as_deref())
            .unwrap_or(&self.url)
    }
}

/// Search videos, returning at most `max_results` in page order
pub async fn search_videos(query: &str, max_results: usize) -> Result<Vec<SearchResult>, SearchError> {
    let client = create_client()?;
    let url = Url::parse_with_params(VIDEO_SEARCH_URL, &[("search_query", query)])
        .map_err(|e| SearchError::InvalidUrl(e.to_string()))?;
    let html = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let results = parse_video_results(&html, max_results)?;
    tracing::info!(query, results = results.len(), "video search");
    Ok(results)
}

/// Search images, returning at most `max_results` in page order
pub async fn search_images(query: &str, max_results: usize) -> Result<Vec<SearchResult>, SearchError> {
    let client = create_client()?;
    let url = Url::parse_with_params(IMAGE_SEARCH_URL, &[("q", query), ("tbm", "isch")])
        .map_err(|e| SearchError::InvalidUrl(e.to_string()))?;
    let html = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let results = parse_image_results(&html, query, max_results);
    tracing::info!(query, results = results.len(), "image search");
    Ok(results)
}

/// Search the web and describe each hit by the metadata of its page.
///
/// Pages that fail to load or carry no Open Graph title or description are
/// skipped, so fewer than `max_results` results may come back.
pub async fn search_web(query: &str, max_results: usize) -> Result<Vec<WebResult>, SearchError> {
    let client = create_client()?;
    let url = Url::parse_with_params(WEB_SEARCH_URL, &[("q", query)])
        .map_err(|e| SearchError::InvalidUrl(e.to_string()))?;
    let html = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let mut results = Vec::new();
    for link in parse_web_links(&html, max_results) {
        let page = match client.get(&link).send().await.and_then(|r| r.error_for_status()) {
            Ok(response) => response.text().await,
            Err(e) => Err(e),
        };
        match page {
            Ok(page) => match parse_web_metadata(&link, &page) {
                Some(result) => results.push(result),
                None => tracing::debug!(url = %link, "skipping page without metadata"),
            },
            Err(e) => tracing::warn!(url = %link, error = %e, "skipping unreachable page"),
        }
    }

    tracing::info!(query, results = results.len(), "web search");
    Ok(results)
}

/// Parse video results out of the `ytInitialData` blob embedded in a results page
pub fn parse_video_results(html: &str, max_results: usize) -> Result<Vec<SearchResult>, SearchError> {
    let start = html
        .find(INITIAL_DATA_START)
        .ok_or(SearchError::MissingResultData)?
        + INITIAL_DATA_START.len();
    let end = html[start..]
        .find(INITIAL_DATA_END)
        .ok_or(SearchError::MissingResultData)?;
    let data: Value = serde_json::from_str(&html[start..start + end])?;

    let sections = data
        .pointer("/contents/twoColumnSearchResultsRenderer/primaryContents/sectionListRenderer/contents")
        .and_then(Value::as_array)
        .ok_or(SearchError::MissingResultData)?;

    let results = sections
        .iter()
        .filter_map(|section| section.pointer("/itemSectionRenderer/contents"))
        .filter_map(Value::as_array)
        .flatten()
        .filter_map(|item| item.get("videoRenderer"))
        .filter_map(|renderer| {
            let video = parse_video_renderer(renderer);
            if video.is_none() {
                tracing::warn!("skipping video result without id or title");
            }
            video
        })
        .take(max_results)
        .collect();

    Ok(results)
}

fn parse_video_renderer(renderer: &Value) -> Option<SearchResult> {
    let id = renderer.get("videoId")?.as_str()?.to_string();
    let title = join_runs(renderer.pointer("/title/runs")?);
    let description = renderer
        .pointer("/detailedMetadataSnippets/0/snippetText/runs")
        .map(join_runs)
        .unwrap_or_default();
    let duration_label = renderer
        .pointer("/lengthText/simpleText")
        .and_then(Value::as_str)
        .unwrap_or("LIVE")
        .to_string();

    Some(SearchResult::Video {
        id,
        title,
        description,
        duration_label,
    })
}

fn join_runs(runs: &Value) -> String {
    runs.as_array()
        .map(|runs| {
            runs.iter()
                .filter_map(|run| run.get("text").and_then(Value::as_str))
                .collect::<String>()
        })
        .unwrap_or_default()
}

/// Parse image results from an image search page.
///
/// Each result takes the query as its alt text, since the page carries no
/// usable captions.
pub fn parse_image_results(html: &str, query: &str, max_results: usize) -> Vec<SearchResult> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("img") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|img| {
            let element = img.value();
            ["data-iurl", "data-src", "src"]
                .into_iter()
                .find_map(|attr| element.attr(attr))
        })
        .filter(|url| url.starts_with("http"))
        .take(max_results)
        .map(|url| SearchResult::Image {
            url: url.to_string(),
            alt_title: Some(query.to_string()),
        })
        .collect()
}

/// Outbound result links on a web search page, in page order, without
/// duplicates or links back to the search engine itself.
pub fn parse_web_links(html: &str, max_results: usize) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut links: Vec<String> = Vec::new();
    for anchor in document.select(&selector) {
        if links.len() == max_results {
            break;
        }
        let Some(target) = anchor.value().attr("href").and_then(result_target) else {
            continue;
        };
        if !links.contains(&target) {
            links.push(target);
        }
    }
    links
}

/// The page a result anchor points to. Redirect links (`/url?q=...`) are
/// unwrapped.
fn result_target(href: &str) -> Option<String> {
    let url = if href.starts_with("/url?") {
        let redirect = Url::parse(WEB_SEARCH_URL).ok()?.join(href).ok()?;
        let (_, target) = redirect.query_pairs().find(|(key, _)| key == "q")?;
        Url::parse(&target).ok()?
    } else {
        Url::parse(href).ok()?
    };

    let external = matches!(url.scheme(), "http" | "https")
        && url.host_str().is_some_and(|host| !host.contains("google."));
    external.then(|| url.to_string())
}

/// Describe a fetched page by its `<title>`, Open Graph tags and the start of
/// its text. Returns `None` when the page has neither `og:title` nor
/// `og:description`.
pub fn parse_web_metadata(url: &str, html: &str) -> Option<WebResult> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("meta").ok()?;

    let mut og_title = None;
    let mut og_description = None;
    for meta in document.select(&selector) {
        let element = meta.value();
        let (Some(name), Some(content)) = (
            element.attr("property").or(element.attr("name")),
            element.attr("content"),
        ) else {
            continue;
        };
        match name {
            "og:title" => og_title = Some(content.trim().to_string()),
            "og:description" => og_description = Some(content.trim().to_string()),
            _ => {}
        }
    }

    if og_title.is_none() && og_description.is_none() {
        return None;
    }

    Some(WebResult {
        url: url.to_string(),
        page_title: extract_title(&document),
        og_title,
        og_description,
        snippet: extract_text(&document).chars().take(SNIPPET_CHARS).collect(),
    })
}
