//! Media enrichment: merge a chosen search result into a document body.

use crate::document::{DocumentError, SummaryDocument};
use crate::markdown;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Alt text used when an image result carries no title.
pub const DEFAULT_IMAGE_ALT: &str = "image";

/// Label in front of a video's one-line summary.
pub const VIDEO_SUMMARY_LABEL: &str = "Video summary";

/// A search result the user can attach to a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchResult {
    Video {
        id: String,
        title: String,
        #[serde(default)]
        description: String,
        /// Display duration such as `12:34`, or `LIVE`
        #[serde(default)]
        duration_label: String,
    },
    Image {
        url: String,
        #[serde(default)]
        alt_title: Option<String>,
    },
}

/// One-line video summaries fetched during a session, keyed by video id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoSummaries {
    by_id: HashMap<String, String>,
}

impl VideoSummaries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, video_id: &str) -> Option<&str> {
        self.by_id.get(video_id).map(String::as_str)
    }

    /// Callers check this before asking the summarizer again.
    pub fn contains(&self, video_id: &str) -> bool {
        self.by_id.contains_key(video_id)
    }

    pub fn insert(&mut self, video_id: impl Into<String>, summary: impl Into<String>) {
        self.by_id.insert(video_id.into(), summary.into());
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

pub fn thumbnail_url(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{}/mqdefault.jpg", video_id)
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Flatten to one line so a label cannot open a new section.
fn single_line(text: &str) -> String {
    text.split(['\n', '\r'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text safe to place between `[` and `]`.
fn link_label(text: &str) -> String {
    let mut label = String::new();
    for c in single_line(text).chars() {
        if matches!(c, '[' | ']' | '\\') {
            label.push('\\');
        }
        label.push(c);
    }
    label
}

/// Target safe to place between `(` and `)`.
fn link_target(url: &str) -> String {
    single_line(url)
        .replace(' ', "%20")
        .replace('(', "%28")
        .replace(')', "%29")
}

/// Markdown for a video: a linked thumbnail, then the summary as a quote
/// when one is known.
pub fn video_block(video_id: &str, title: &str, summary: Option<&str>) -> String {
    let mut block = format!(
        "[![{}]({})]({})\n\n",
        link_label(title),
        link_target(&thumbnail_url(video_id)),
        link_target(&watch_url(video_id))
    );
    if let Some(summary) = summary.map(single_line).filter(|s| !s.is_empty()) {
        block.push_str(&format!("> **{}:** {}\n\n", VIDEO_SUMMARY_LABEL, summary));
    }
    block
}

pub fn image_block(url: &str, alt: Option<&str>) -> String {
    let alt = alt
        .map(link_label)
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| DEFAULT_IMAGE_ALT.to_string());
    format!("![{}]({})", alt, link_target(url))
}

/// Markdown block for a search result.
pub fn media_block(result: &SearchResult, summaries: &VideoSummaries) -> String {
    match result {
        SearchResult::Video { id, title, .. } => video_block(id, title, summaries.get(id)),
        SearchResult::Image { url, alt_title } => image_block(url, alt_title.as_deref()),
    }
}

/// Append a media block to the end of the body and re-split.
///
/// The block lands inside the last section. With no sections the block is
/// preamble and is dropped; use [`append_media_section`] instead.
pub fn append_media(
    doc: &mut SummaryDocument,
    result: &SearchResult,
    summaries: &VideoSummaries,
) -> Result<(), DocumentError> {
    let block = media_block(result, summaries);
    append_block(doc, &block)
}

/// Append a media block as its own section under `# {heading}`.
pub fn append_media_section(
    doc: &mut SummaryDocument,
    heading: &str,
    result: &SearchResult,
    summaries: &VideoSummaries,
) -> Result<(), DocumentError> {
    let block = format!("# {}\n{}", heading.trim(), media_block(result, summaries));
    append_block(doc, &block)
}

fn append_block(doc: &mut SummaryDocument, block: &str) -> Result<(), DocumentError> {
    doc.ensure_editable()?;

    let combined = format!("{}\n{}", doc.body(), block);
    let (preamble, sections) = markdown::split_with_preamble(&combined);
    if !preamble.is_empty() {
        tracing::warn!("document has no sections; media block was not attached");
    }

    tracing::debug!(
        before = doc.sections().len(),
        after = sections.len(),
        "appended media block"
    );
    doc.set_sections_unchecked(sections);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intro_doc() -> SummaryDocument {
        SummaryDocument::new("t", vec!["k".into()], &["# Intro\ntext".to_string()], "i")
    }

    fn video() -> SearchResult {
        SearchResult::Video {
            id: "abc123".into(),
            title: "Talk".into(),
            description: "a talk".into(),
            duration_label: "10:00".into(),
        }
    }

    #[test]
    fn image_is_appended_inside_last_section() {
        let mut doc = intro_doc();
        let image = SearchResult::Image {
            url: "http://x/img.png".into(),
            alt_title: Some("cat".into()),
        };
        append_media(&mut doc, &image, &VideoSummaries::new()).unwrap();

        assert_eq!(doc.sections().len(), 1);
        assert_eq!(doc.sections()[0], "# Intro\ntext\n![cat](http://x/img.png)");
        assert!(doc.body().contains("![cat](http://x/img.png)"));
        assert_eq!(doc.title(), "t");
        assert_eq!(doc.keywords(), ["k"]);
        assert_eq!(doc.insights(), "i");
    }

    #[test]
    fn image_without_title_uses_placeholder() {
        assert_eq!(image_block("http://x/a.png", None), "![image](http://x/a.png)");
        assert_eq!(image_block("http://x/a.png", Some("  ")), "![image](http://x/a.png)");
    }

    #[test]
    fn video_block_includes_cached_summary() {
        let mut summaries = VideoSummaries::new();
        summaries.insert("abc123", "A short talk about Rust.");
        let mut doc = intro_doc();
        append_media(&mut doc, &video(), &summaries).unwrap();

        let body = doc.body();
        assert!(body.contains(
            "[![Talk](https://img.youtube.com/vi/abc123/mqdefault.jpg)](https://www.youtube.com/watch?v=abc123)"
        ));
        assert!(body.ends_with("> **Video summary:** A short talk about Rust."));
        assert_eq!(doc.sections().len(), 1);
    }

    #[test]
    fn video_block_without_summary_has_no_quote() {
        let block = video_block("id", "T", None);
        assert!(!block.contains('>'));
        assert!(block.ends_with("\n\n"));
    }

    #[test]
    fn labels_cannot_break_the_link_or_the_section() {
        let block = image_block("http://x/a (1).png", Some("cats ] [dogs]\n# Injected"));
        assert_eq!(block, r"![cats \] \[dogs\] # Injected](http://x/a%20%281%29.png)");

        let mut summaries = VideoSummaries::new();
        summaries.insert("abc123", "first line\n# Not a header");
        let mut doc = intro_doc();
        let video = SearchResult::Video {
            id: "abc123".into(),
            title: "Part [1]\r\n# Fake".into(),
            description: String::new(),
            duration_label: String::new(),
        };
        append_media(&mut doc, &video, &summaries).unwrap();

        assert_eq!(doc.sections().len(), 1);
        assert!(doc.sections()[0].contains(r"[![Part \[1\] # Fake]("));
        assert!(doc.sections()[0].ends_with("> **Video summary:** first line # Not a header"));
    }

    #[test]
    fn media_section_becomes_its_own_section() {
        let mut doc = intro_doc();
        append_media_section(&mut doc, "Watch", &video(), &VideoSummaries::new()).unwrap();
        assert_eq!(doc.sections().len(), 2);
        assert!(doc.sections()[1].starts_with("# Watch\n[![Talk]"));
    }

    #[test]
    fn empty_document_drops_plain_media_block() {
        let mut doc = SummaryDocument::new("t", vec![], &[], "");
        append_media(&mut doc, &video(), &VideoSummaries::new()).unwrap();
        assert!(doc.sections().is_empty());
    }

    #[test]
    fn read_only_document_cannot_be_enriched() {
        let fragment = crate::share::encode(&intro_doc());
        let mut shared = crate::share::decode(&fragment).unwrap();
        assert_eq!(
            append_media(&mut shared, &video(), &VideoSummaries::new()),
            Err(DocumentError::ReadOnlyDocument)
        );
    }

    #[test]
    fn search_result_is_tagged_by_kind() {
        let json = r#"{"kind":"image","url":"http://x/i.png"}"#;
        let parsed: SearchResult = serde_json::from_str(json).unwrap();
        assert_eq!(
            parsed,
            SearchResult::Image {
                url: "http://x/i.png".into(),
                alt_title: None
            }
        );
    }
}
