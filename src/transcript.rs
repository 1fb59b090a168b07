//! Video transcripts, the input for a video's one-line summary.
//!
//! The watch page embeds a `ytInitialPlayerResponse` JSON blob listing the
//! caption tracks. The chosen track is fetched as timed-text XML. Like the
//! search providers, parsing is kept apart from fetching.

use crate::media::watch_url;
use crate::scraper::create_client;
use scraper::{Html, Selector};
use serde_json::Value;
use thiserror::Error;

const PLAYER_RESPONSE_START: &str = "var ytInitialPlayerResponse = ";

#[derive(Error, Debug)]
pub enum TranscriptError {
    #[error("transcript request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("could not find player data in the watch page")]
    MissingPlayerData,
    #[error("failed to parse player data: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("video {0} has no captions")]
    NoCaptions(String),
}

/// One caption track offered for a video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionTrack {
    pub base_url: String,
    pub language_code: String,
}

/// One timed line of a transcript, times in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    pub start: f64,
    pub duration: f64,
    pub text: String,
}

/// Fetch a video's transcript, preferring the given languages in order.
///
/// A video without captions in any preferred language falls back to its
/// first track.
pub async fn fetch_transcript(
    video_id: &str,
    languages: &[String],
) -> Result<Vec<Cue>, TranscriptError> {
    let client = create_client()?;
    let page = client
        .get(watch_url(video_id))
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let tracks = parse_caption_tracks(&page)?;
    let track = choose_track(&tracks, languages)
        .ok_or_else(|| TranscriptError::NoCaptions(video_id.to_string()))?;
    tracing::debug!(video_id, language = %track.language_code, "fetching captions");

    let xml = client
        .get(&track.base_url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let cues = parse_timed_text(&xml);
    tracing::info!(video_id, cues = cues.len(), "fetched transcript");
    Ok(cues)
}

/// Caption tracks listed in a watch page, in page order. A page whose
/// player data has no captions yields an empty list.
pub fn parse_caption_tracks(html: &str) -> Result<Vec<CaptionTrack>, TranscriptError> {
    let start = html
        .find(PLAYER_RESPONSE_START)
        .ok_or(TranscriptError::MissingPlayerData)?
        + PLAYER_RESPONSE_START.len();

    // The blob is followed by more script, so read exactly one JSON value.
    let player: Value = serde_json::Deserializer::from_str(&html[start..])
        .into_iter::<Value>()
        .next()
        .ok_or(TranscriptError::MissingPlayerData)??;

    let tracks = player
        .pointer("/captions/playerCaptionsTracklistRenderer/captionTracks")
        .and_then(Value::as_array)
        .map(|tracks| {
            tracks
                .iter()
                .filter_map(|track| {
                    Some(CaptionTrack {
                        base_url: track.get("baseUrl")?.as_str()?.to_string(),
                        language_code: track.get("languageCode")?.as_str()?.to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(tracks)
}

/// The first track in a preferred language, else the first track.
pub fn choose_track<'a>(tracks: &'a [CaptionTrack], languages: &[String]) -> Option<&'a CaptionTrack> {
    languages
        .iter()
        .find_map(|language| tracks.iter().find(|t| &t.language_code == language))
        .or_else(|| tracks.first())
}

/// Cues of a timed-text document (`<text start=".." dur="..">..</text>`).
/// Entities are decoded and cues without text are dropped.
pub fn parse_timed_text(xml: &str) -> Vec<Cue> {
    let document = Html::parse_fragment(xml);
    let Ok(selector) = Selector::parse("text") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| {
            let seconds = |attr| {
                element
                    .value()
                    .attr(attr)
                    .and_then(|v: &str| v.parse::<f64>().ok())
                    .unwrap_or(0.0)
            };
            let text = element
                .text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            (!text.is_empty()).then(|| Cue {
                start: seconds("start"),
                duration: seconds("dur"),
                text,
            })
        })
        .collect()
}

/// Transcript as text for the summarizer, one `start:duration:text` line per
/// cue with times rounded to hundredths.
pub fn transcript_text(cues: &[Cue]) -> String {
    cues.iter()
        .map(|cue| {
            format!(
                "{}:{}:{}\n",
                round_hundredths(cue.start),
                round_hundredths(cue.duration),
                cue.text
            )
        })
        .collect()
}

fn round_hundredths(seconds: f64) -> f64 {
    (seconds * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn watch_page(player: &str) -> String {
        format!(
            "<html><script>var ytInitialPlayerResponse = {};var meta = document.createElement('meta');</script></html>",
            player
        )
    }

    fn langs(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn caption_tracks_are_read_from_player_data() {
        let page = watch_page(
            r#"{"captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[
                {"baseUrl":"https://www.youtube.com/api/timedtext?v=abc&lang=en","languageCode":"en"},
                {"languageCode":"broken"},
                {"baseUrl":"https://www.youtube.com/api/timedtext?v=abc&lang=ko","languageCode":"ko"}
            ]}},"videoDetails":{"videoId":"abc"}}"#,
        );

        let tracks = parse_caption_tracks(&page).unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[1].language_code, "ko");
        assert!(tracks[0].base_url.ends_with("lang=en"));
    }

    #[test]
    fn video_without_captions_has_no_tracks() {
        let page = watch_page(r#"{"videoDetails":{"videoId":"abc"}}"#);
        assert!(parse_caption_tracks(&page).unwrap().is_empty());
        assert!(matches!(
            parse_caption_tracks("<html></html>"),
            Err(TranscriptError::MissingPlayerData)
        ));
    }

    #[test]
    fn preferred_language_wins_then_first_track() {
        let tracks = vec![
            CaptionTrack { base_url: "u-en".into(), language_code: "en".into() },
            CaptionTrack { base_url: "u-ko".into(), language_code: "ko".into() },
        ];
        assert_eq!(choose_track(&tracks, &langs(&["de", "ko"])).unwrap().base_url, "u-ko");
        assert_eq!(choose_track(&tracks, &langs(&["de"])).unwrap().base_url, "u-en");
        assert!(choose_track(&[], &langs(&["en"])).is_none());
    }

    #[test]
    fn timed_text_becomes_cues_and_lines() {
        let xml = r#"<?xml version="1.0" encoding="utf-8" ?><transcript>
            <text start="0" dur="2.5">Hello &amp; welcome</text>
            <text start="2.5" dur="1.234">to the
            borrow checker</text>
            <text start="4" dur="1"></text>
        </transcript>"#;

        let cues = parse_timed_text(xml);
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].text, "Hello & welcome");
        assert_eq!(cues[1].text, "to the borrow checker");
        assert_eq!(
            transcript_text(&cues),
            "0:2.5:Hello & welcome\n2.5:1.23:to the borrow checker\n"
        );
    }
}
