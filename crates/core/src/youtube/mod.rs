//! Everything that talks to YouTube: metadata lookups and caption fetching.

mod captions;
mod metadata;

pub use captions::{
    CaptionError, CaptionSource, RawSegment, YtDlpCaptions, available_languages, build_transcript,
    parse_json3,
};
pub use metadata::{MetadataClient, parse_duration};

use serde::Serialize;

use crate::types::TranscriptData;

const CHAPTER_KEYWORDS: &[&str] = &[
    "chapter",
    "section",
    "part",
    "introduction",
    "conclusion",
    "overview",
];

/// A transcript segment picked out by chapter detection or search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentHit {
    pub timestamp: String,
    pub text: String,
    pub start_time: f64,
}

/// Segments that look like chapter markers
pub fn transcript_chapters(transcript: &TranscriptData) -> Vec<SegmentHit> {
    transcript
        .segments
        .iter()
        .filter(|seg| {
            let lower = seg.text.to_lowercase();
            CHAPTER_KEYWORDS.iter().any(|k| lower.contains(k))
        })
        .map(|seg| SegmentHit {
            timestamp: seg.timestamp.clone(),
            text: seg.text.clone(),
            start_time: seg.start_time,
        })
        .collect()
}

/// Case-insensitive substring search over segments
pub fn search_transcript(transcript: &TranscriptData, query: &str) -> Vec<SegmentHit> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }
    transcript
        .segments
        .iter()
        .filter(|seg| seg.text.to_lowercase().contains(&query))
        .map(|seg| SegmentHit {
            timestamp: seg.timestamp.clone(),
            text: seg.text.clone(),
            start_time: seg.start_time,
        })
        .collect()
}
