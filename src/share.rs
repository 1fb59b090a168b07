//! Share links: encode a whole document into a URL fragment and back.
//!
//! The fragment is the percent-encoded JSON of a [`ShareEnvelope`]. A
//! decoded document is always read-only since a link has no way back to the
//! session that produced it.

use crate::document::SummaryDocument;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Characters left as-is, matching JavaScript's `encodeURIComponent`.
const FRAGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShareError {
    #[error("malformed share link: {0}")]
    MalformedShareFragment(String),
}

/// Flat projection of a document carried in a share link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareEnvelope {
    pub title: String,
    pub keywords: Vec<String>,
    pub sections: Vec<String>,
    pub insights: String,
}

/// What a link may actually contain: any field can be missing or null.
#[derive(Deserialize)]
struct PartialEnvelope {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    keywords: Option<Vec<String>>,
    #[serde(default)]
    sections: Option<Vec<String>>,
    /// Links made by the earlier web version call the sections `summary`.
    /// When both keys are present, `sections` wins.
    #[serde(default)]
    summary: Option<Vec<String>>,
    #[serde(default)]
    insights: Option<String>,
}

impl TryFrom<PartialEnvelope> for ShareEnvelope {
    type Error = ShareError;

    fn try_from(partial: PartialEnvelope) -> Result<Self, ShareError> {
        let sections = partial.sections.or(partial.summary).ok_or_else(|| {
            ShareError::MalformedShareFragment("missing `sections`".to_string())
        })?;

        Ok(Self {
            title: partial.title.unwrap_or_default(),
            keywords: partial.keywords.unwrap_or_default(),
            sections,
            insights: partial.insights.unwrap_or_default(),
        })
    }
}

impl From<&SummaryDocument> for ShareEnvelope {
    fn from(doc: &SummaryDocument) -> Self {
        Self {
            title: doc.title().to_string(),
            keywords: doc.keywords().to_vec(),
            sections: doc.sections().to_vec(),
            insights: doc.insights().to_string(),
        }
    }
}

impl From<ShareEnvelope> for SummaryDocument {
    /// Sections are re-split on the way in, so a hand-made link yields the
    /// same sections the editor would.
    fn from(envelope: ShareEnvelope) -> Self {
        SummaryDocument::read_only(
            envelope.title,
            envelope.keywords,
            envelope.sections,
            envelope.insights,
        )
    }
}

/// Encode a document as a URL-fragment-safe string (without the leading `#`).
pub fn encode(doc: &SummaryDocument) -> String {
    let envelope = ShareEnvelope::from(doc);
    // Serializing a struct of strings cannot fail.
    let json = serde_json::to_string(&envelope).unwrap_or_default();
    utf8_percent_encode(&json, FRAGMENT).to_string()
}

/// Decode a fragment produced by [`encode`] into a read-only document.
pub fn decode(fragment: &str) -> Result<SummaryDocument, ShareError> {
    let json = percent_decode_str(fragment)
        .decode_utf8()
        .map_err(|e| ShareError::MalformedShareFragment(format!("invalid UTF-8: {}", e)))?;

    let value: Value = serde_json::from_str(&json)
        .map_err(|e| ShareError::MalformedShareFragment(e.to_string()))?;
    if !value.is_object() {
        return Err(ShareError::MalformedShareFragment(
            "expected a JSON object".to_string(),
        ));
    }
    let partial: PartialEnvelope = serde_json::from_value(value)
        .map_err(|e| ShareError::MalformedShareFragment(e.to_string()))?;
    let envelope = ShareEnvelope::try_from(partial)?;

    tracing::debug!(
        sections = envelope.sections.len(),
        keywords = envelope.keywords.len(),
        "decoded share link"
    );
    Ok(envelope.into())
}

/// Full share URL: `{base_url}/share#{fragment}`.
pub fn share_url(base_url: &str, doc: &SummaryDocument) -> String {
    format!("{}/share#{}", base_url.trim_end_matches('/'), encode(doc))
}

/// The fragment part of a share URL. Input without `#` is taken to be a
/// bare fragment already.
pub fn fragment_of(input: &str) -> &str {
    let input = input.trim();
    match input.split_once('#') {
        Some((_, fragment)) => fragment,
        None => input,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentError;
    use crate::markdown::testing::well_formed_sections;
    use crate::markdown::{join, split};

    fn doc() -> SummaryDocument {
        SummaryDocument::new(
            "Café & \"quotes\" #1",
            vec!["키워드".into(), "".into(), "dup".into(), "dup".into()],
            &["# Intro\ntext with 100% & more".to_string(), "# Two\n## Sub\n> quote".to_string()],
            "insight\nwith newline",
        )
    }

    #[test]
    fn round_trip_reproduces_fields_and_is_read_only() {
        let original = doc();
        let mut shared = decode(&encode(&original)).unwrap();
        assert_eq!(shared.title(), original.title());
        assert_eq!(shared.keywords(), original.keywords());
        assert_eq!(shared.sections(), original.sections());
        assert_eq!(shared.insights(), original.insights());
        assert!(shared.is_read_only());
        assert_eq!(shared.set_title("x"), Err(DocumentError::ReadOnlyDocument));
        assert_eq!(shared.add_keyword(), Err(DocumentError::ReadOnlyDocument));
    }

    #[test]
    fn encoded_fragment_is_url_safe() {
        let fragment = encode(&doc());
        assert!(fragment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_.!~*'()%".contains(c)));
        assert!(fragment.starts_with("%7B%22title%22"));
    }

    #[test]
    fn broken_json_is_malformed() {
        assert!(matches!(
            decode("%7Bnotjson"),
            Err(ShareError::MalformedShareFragment(_))
        ));
    }

    #[test]
    fn invalid_utf8_is_malformed() {
        assert!(matches!(decode("%FF%FE"), Err(ShareError::MalformedShareFragment(_))));
    }

    #[test]
    fn sections_are_required() {
        assert!(decode("%7B%22title%22%3A%22t%22%7D").is_err());
        assert!(decode("%5B%5D").is_err());
        // sections with a non-string item
        assert!(decode("%7B%22sections%22%3A%5B1%5D%7D").is_err());
    }

    #[test]
    fn missing_fields_default() {
        let shared = decode("%7B%22sections%22%3A%5B%22%23%20A%22%5D%7D").unwrap();
        assert_eq!(shared.title(), "");
        assert!(shared.keywords().is_empty());
        assert_eq!(shared.sections(), ["# A"]);
        assert_eq!(shared.insights(), "");
    }

    #[test]
    fn accepts_legacy_summary_key() {
        let legacy = r##"{"title":"t","keywords":["k"],"summary":["# A"],"insights":"i"}"##;
        let fragment = utf8_percent_encode(legacy, FRAGMENT).to_string();
        assert_eq!(decode(&fragment).unwrap().sections(), ["# A"]);
    }

    #[test]
    fn null_fields_default_like_missing_ones() {
        let json = r##"{"title":null,"keywords":null,"sections":["# A"],"insights":null}"##;
        let shared = decode(&utf8_percent_encode(json, FRAGMENT).to_string()).unwrap();
        assert_eq!(shared.title(), "");
        assert!(shared.keywords().is_empty());
        assert_eq!(shared.sections(), ["# A"]);
        assert_eq!(shared.insights(), "");

        let null_sections = r##"{"title":"t","sections":null}"##;
        assert!(decode(&utf8_percent_encode(null_sections, FRAGMENT).to_string()).is_err());
    }

    #[test]
    fn hand_made_sections_are_resplit() {
        let json = r##"{"sections":["loose preamble","# A\n# B"]}"##;
        let shared = decode(&utf8_percent_encode(json, FRAGMENT).to_string()).unwrap();
        assert_eq!(shared.sections(), ["# A", "# B"]);
        assert_eq!(split(&join(shared.sections())), shared.sections());
    }

    #[test]
    fn sections_key_wins_over_legacy_summary() {
        let both = r##"{"sections":["# New"],"summary":["# Old"]}"##;
        let shared = decode(&utf8_percent_encode(both, FRAGMENT).to_string()).unwrap();
        assert_eq!(shared.sections(), ["# New"]);
    }

    #[test]
    fn share_url_and_fragment_extraction() {
        let d = doc();
        let url = share_url("http://localhost:3000/", &d);
        assert!(url.starts_with("http://localhost:3000/share#%7B"));
        assert_eq!(fragment_of(&url), encode(&d));
        assert_eq!(fragment_of("abc"), "abc");
        assert_eq!(decode(fragment_of(&url)).unwrap().title(), d.title());
    }

    quickcheck::quickcheck! {
        fn decode_inverts_encode(
            title: String,
            keywords: Vec<String>,
            raw_sections: Vec<(String, String)>,
            insights: String
        ) -> bool {
            let sections = well_formed_sections(raw_sections);
            let doc = SummaryDocument::new(title, keywords, &sections, insights);
            match decode(&encode(&doc)) {
                Ok(shared) => {
                    shared.is_read_only()
                        && shared.title() == doc.title()
                        && shared.keywords() == doc.keywords()
                        && shared.sections() == sections.as_slice()
                        && shared.insights() == doc.insights()
                }
                Err(_) => false,
            }
        }
    }
}
