//! # Summanote
//!
//! Turn free text into a structured summary note, edit it, enrich it with
//! media and share it as a self-contained link.
//!
//! ## Features
//!
//! - **Structured documents**: `SummaryDocument` holds a title, keywords, markdown sections and insights
//! - **Section codec**: the body round-trips between a section list and one markdown text
//! - **Media enrichment**: video and image search results are merged into the body
//! - **Web search and transcripts**: related pages to read, captions to summarise a video
//! - **Share links**: a whole document fits in a URL fragment and opens read-only

pub mod agent;
pub mod config;
pub mod document;
pub mod markdown;
pub mod media;
pub mod render;
pub mod scraper;
pub mod search;
pub mod session;
pub mod share;
pub mod transcript;

pub use config::Config;
pub use document::{DocumentError, Mode, SummaryDocument};
pub use media::{SearchResult, VideoSummaries};
pub use session::Session;
pub use share::ShareError;
