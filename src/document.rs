//! SummaryDocument - the structured digest a user edits, enriches and shares.

use crate::markdown;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("malformed summarizer payload: {0}")]
    MalformedPayload(String),
    #[error("keyword index {index} out of range (document has {len} keywords)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("document is read-only (opened from a share link)")]
    ReadOnlyDocument,
}

/// Shape the summarizer is asked to produce.
///
/// Only used to describe the expected output to the LLM; incoming payloads
/// are validated by [`SummaryDocument::from_payload`].
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SummaryPayload {
    /// One-line title for the content
    pub title: String,
    /// Core keywords, most important first
    pub keywords: Vec<String>,
    /// Summary sections, each a markdown block starting with a `# ` header
    pub summary: Vec<String>,
    /// Notable points or insights worth highlighting, as markdown
    pub insights: String,
}

/// Whether a document can be edited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Editable,
    /// Reconstructed from a share link; every mutator is refused.
    ReadOnly,
}

/// Structured summary document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryDocument {
    title: String,
    keywords: Vec<String>,
    sections: Vec<String>,
    insights: String,
    #[serde(default)]
    mode: Mode,
}

impl SummaryDocument {
    /// Create an editable document. `sections` is normalized through the
    /// section codec so the round-trip law holds from the start.
    pub fn new(
        title: impl Into<String>,
        keywords: Vec<String>,
        sections: &[String],
        insights: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            keywords,
            sections: normalize_sections(sections),
            insights: insights.into(),
            mode: Mode::Editable,
        }
    }

    /// Build a document from a raw summarizer payload.
    ///
    /// `summary` and `keywords` must be arrays of strings. A missing or null
    /// `title`/`insights` is read as an empty string.
    pub fn from_payload(payload: &Value) -> Result<Self, DocumentError> {
        let object = payload
            .as_object()
            .ok_or_else(|| malformed("payload is not a JSON object"))?;

        let keywords = string_array(object.get("keywords"), "keywords")?;
        let summary = string_array(object.get("summary"), "summary")?;
        let title = optional_string(object.get("title"), "title")?;
        let insights = optional_string(object.get("insights"), "insights")?;

        Ok(Self::new(title, keywords, &summary, insights))
    }

    /// Parse raw summarizer output text, tolerating a surrounding code fence.
    pub fn from_json_str(raw: &str) -> Result<Self, DocumentError> {
        let cleaned = strip_code_fence(raw);
        let payload: Value = serde_json::from_str(cleaned)
            .map_err(|e| DocumentError::MalformedPayload(format!("{}: {}", e, cleaned)))?;
        Self::from_payload(&payload)
    }

    /// A document opened from a share link. Sections are normalized like
    /// [`SummaryDocument::new`] does.
    pub(crate) fn read_only(
        title: String,
        keywords: Vec<String>,
        sections: Vec<String>,
        insights: String,
    ) -> Self {
        Self {
            title,
            keywords,
            sections: normalize_sections(&sections),
            insights,
            mode: Mode::ReadOnly,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn sections(&self) -> &[String] {
        &self.sections
    }

    pub fn insights(&self) -> &str {
        &self.insights
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_read_only(&self) -> bool {
        self.mode == Mode::ReadOnly
    }

    /// A document is complete once it has a non-empty title.
    pub fn is_complete(&self) -> bool {
        !self.title.trim().is_empty()
    }

    /// The joined markdown body, as shown in the body editor.
    pub fn body(&self) -> String {
        markdown::join(&self.sections)
    }

    /// Replace the title verbatim. Empty titles are accepted.
    pub fn set_title(&mut self, new_title: impl Into<String>) -> Result<(), DocumentError> {
        self.ensure_editable()?;
        self.title = new_title.into();
        Ok(())
    }

    pub fn set_keyword(&mut self, index: usize, value: impl Into<String>) -> Result<(), DocumentError> {
        self.ensure_editable()?;
        let len = self.keywords.len();
        let slot = self
            .keywords
            .get_mut(index)
            .ok_or(DocumentError::IndexOutOfRange { index, len })?;
        *slot = value.into();
        Ok(())
    }

    /// Append an empty keyword for the caller to fill with [`Self::set_keyword`].
    /// Returns the new keyword's index.
    pub fn add_keyword(&mut self) -> Result<usize, DocumentError> {
        self.ensure_editable()?;
        self.keywords.push(String::new());
        Ok(self.keywords.len() - 1)
    }

    /// Remove a keyword, returning it. Remaining keywords keep their order.
    pub fn remove_keyword(&mut self, index: usize) -> Result<String, DocumentError> {
        self.ensure_editable()?;
        let len = self.keywords.len();
        if index >= len {
            return Err(DocumentError::IndexOutOfRange { index, len });
        }
        Ok(self.keywords.remove(index))
    }

    /// Re-split edited markdown and replace the whole section list.
    pub fn replace_sections(&mut self, raw_markdown: &str) -> Result<(), DocumentError> {
        self.ensure_editable()?;
        self.sections = split_reporting_loss(raw_markdown);
        Ok(())
    }

    /// Replace insights verbatim; insights are never split into sections.
    pub fn set_insights(&mut self, raw_markdown: impl Into<String>) -> Result<(), DocumentError> {
        self.ensure_editable()?;
        self.insights = raw_markdown.into();
        Ok(())
    }

    /// Render the whole document as one markdown text for copying elsewhere.
    pub fn to_markdown(&self) -> String {
        let tags = self
            .keywords
            .iter()
            .filter(|k| !k.trim().is_empty())
            .map(|k| format!("#{}", k.trim()))
            .collect::<Vec<_>>()
            .join(" ");

        format!(
            "# {}\n\n## Keywords\n{}\n\n## Summary\n{}\n\n## Notes\n{}",
            self.title,
            tags,
            self.body(),
            self.insights
        )
    }

    /// Fails with [`DocumentError::ReadOnlyDocument`] on a shared document.
    pub fn ensure_editable(&self) -> Result<(), DocumentError> {
        match self.mode {
            Mode::Editable => Ok(()),
            Mode::ReadOnly => Err(DocumentError::ReadOnlyDocument),
        }
    }

    /// Swap in a new section list produced by the section codec.
    pub(crate) fn set_sections_unchecked(&mut self, sections: Vec<String>) {
        self.sections = sections;
    }
}

fn normalize_sections(sections: &[String]) -> Vec<String> {
    split_reporting_loss(&markdown::join(sections))
}

fn split_reporting_loss(text: &str) -> Vec<String> {
    let (preamble, sections) = markdown::split_with_preamble(text);
    if !preamble.is_empty() {
        tracing::warn!(
            dropped_chars = preamble.chars().count(),
            "discarded text before the first top-level header"
        );
    }
    sections
}

fn malformed(reason: impl Into<String>) -> DocumentError {
    DocumentError::MalformedPayload(reason.into())
}

fn string_array(value: Option<&Value>, field: &str) -> Result<Vec<String>, DocumentError> {
    let items = value
        .and_then(Value::as_array)
        .ok_or_else(|| malformed(format!("`{}` must be an array of strings", field)))?;

    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| malformed(format!("`{}` contains a non-string item", field)))
        })
        .collect()
}

fn optional_string(value: Option<&Value>, field: &str) -> Result<String, DocumentError> {
    match value {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(malformed(format!("`{}` must be a string", field))),
    }
}

/// Strip markdown code block wrappers from a JSON response
pub(crate) fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();

    // Remove ```json ... ``` or ``` ... ```
    if let Some(rest) = trimmed.strip_prefix("```") {
        let without_prefix = rest.strip_prefix("json").unwrap_or(rest);
        if let Some(end_idx) = without_prefix.rfind("```") {
            return without_prefix[..end_idx].trim();
        }
    }

    trimmed
}
