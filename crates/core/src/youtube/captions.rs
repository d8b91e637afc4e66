use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tokio::{fs, process::Command};

use crate::{
    error::Result,
    format::format_timestamp,
    types::{Segment, TranscriptData},
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptionError {
    #[error("This video doesn't have captions/subtitles available")]
    NoCaptions,

    #[error("This video is private or restricted")]
    Restricted,

    #[error("Transcript not available for this video")]
    Unavailable,

    #[error("Error extracting transcript: {0}")]
    Other(String),
}

impl CaptionError {
    /// Map caption tool output onto a user-facing category
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("no subtitles") || lower.contains("no transcripts") {
            CaptionError::NoCaptions
        } else if lower.contains("private") || lower.contains("sign in") {
            CaptionError::Restricted
        } else if lower.contains("not available") || lower.contains("unavailable") {
            CaptionError::Unavailable
        } else {
            CaptionError::Other(message.trim().to_string())
        }
    }
}

/// Source of timed captions for a video
pub trait CaptionSource {
    async fn fetch(&self, video_id: &str) -> Result<TranscriptData>;
}

/// One caption cue before timestamp formatting
#[derive(Debug, Clone, PartialEq)]
pub struct RawSegment {
    pub start: f64,
    pub duration: f64,
    pub text: String,
}

impl RawSegment {
    pub fn new(start: f64, duration: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            duration,
            text: text.into(),
        }
    }
}

/// Assemble transcript data from raw cues
pub fn build_transcript(raw: Vec<RawSegment>, language_codes: Vec<String>) -> TranscriptData {
    let segments: Vec<Segment> = raw
        .into_iter()
        .map(|cue| Segment {
            timestamp: format_timestamp(cue.start),
            start_time: cue.start,
            duration: cue.duration,
            text: cue.text.trim().to_string(),
        })
        .collect();

    let text = segments
        .iter()
        .map(|s| s.text.as_str())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let total_duration = segments
        .last()
        .map(|s| s.start_time + s.duration)
        .unwrap_or(0.0);

    TranscriptData {
        text,
        total_segments: segments.len(),
        segments,
        language_codes,
        total_duration,
    }
}

#[derive(Debug, Deserialize)]
struct Json3 {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Json3Event {
    #[serde(default)]
    t_start_ms: u64,
    #[serde(default)]
    d_duration_ms: u64,
    #[serde(default)]
    segs: Vec<Json3Seg>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

/// Parse YouTube's json3 caption format into cues; empty cues are dropped
pub fn parse_json3(content: &str) -> Result<Vec<RawSegment>> {
    let doc: Json3 = serde_json::from_str(content)?;
    Ok(doc
        .events
        .into_iter()
        .filter_map(|event| {
            let text: String = event.segs.iter().map(|s| s.utf8.as_str()).collect();
            let text = text.replace('\n', " ");
            let text = text.trim();
            (!text.is_empty()).then(|| {
                RawSegment::new(
                    event.t_start_ms as f64 / 1000.0,
                    event.d_duration_ms as f64 / 1000.0,
                    text,
                )
            })
        })
        .collect())
}

/// The subset of yt-dlp's `.info.json` that lists caption tracks
#[derive(Debug, Default, Deserialize)]
struct VideoInfoJson {
    #[serde(default)]
    subtitles: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    automatic_captions: BTreeMap<String, serde_json::Value>,
}

/// Every caption language yt-dlp reports for a video: uploaded tracks
/// first, then automatic ones. Chat replays are not captions.
pub fn available_languages(info_json: &str) -> Result<Vec<String>> {
    let info: VideoInfoJson = serde_json::from_str(info_json)?;
    let mut langs: Vec<String> = Vec::new();
    for lang in info.subtitles.keys().chain(info.automatic_captions.keys()) {
        if lang == "live_chat" || langs.contains(lang) {
            continue;
        }
        langs.push(lang.clone());
    }
    Ok(langs)
}

/// Fetches captions by shelling out to yt-dlp
#[derive(Debug, Clone)]
pub struct YtDlpCaptions {
    binary: String,
    sub_langs: String,
    work_dir: PathBuf,
}

impl Default for YtDlpCaptions {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

impl YtDlpCaptions {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            sub_langs: "en.*,en".to_string(),
            work_dir: std::env::temp_dir(),
        }
    }

    /// yt-dlp `--sub-langs` selector
    pub fn with_sub_langs(mut self, sub_langs: impl Into<String>) -> Self {
        self.sub_langs = sub_langs.into();
        self
    }

    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    async fn download(&self, video_id: &str, out_dir: &Path) -> Result<()> {
        let url = format!("https://www.youtube.com/watch?v={video_id}");
        let output_template = out_dir.join("%(id)s.%(ext)s");

        let output = Command::new(&self.binary)
            .arg(&url)
            .arg("--skip-download")
            .arg("--write-subs")
            .arg("--write-auto-subs")
            .arg("--write-info-json")
            .arg("--sub-format")
            .arg("json3")
            .arg("--sub-langs")
            .arg(&self.sub_langs)
            .arg("--no-warnings")
            .arg("-o")
            .arg(&output_template)
            .output()
            .await
            .map_err(|e| CaptionError::Other(format!("could not run {}: {e}", self.binary)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(video_id, stderr = %stderr.trim(), "yt-dlp failed");
            return Err(CaptionError::classify(&stderr).into());
        }

        Ok(())
    }
}

impl CaptionSource for YtDlpCaptions {
    async fn fetch(&self, video_id: &str) -> Result<TranscriptData> {
        let out_dir = self
            .work_dir
            .join(format!("tldw-{}-{}", video_id, std::process::id()));
        fs::create_dir_all(&out_dir).await?;

        let result = async {
            self.download(video_id, &out_dir).await?;
            read_caption_files(&out_dir).await
        }
        .await;

        if let Err(e) = fs::remove_dir_all(&out_dir).await {
            tracing::warn!(dir = %out_dir.display(), error = %e, "failed to remove caption dir");
        }

        let (raw, language_codes) = result?;
        tracing::info!(video_id, segments = raw.len(), "captions fetched");
        Ok(build_transcript(raw, language_codes))
    }
}

/// Read the first non-empty `<id>.<lang>.json3` file. Languages come from
/// the `.info.json` yt-dlp wrote next to it, else from the caption files.
async fn read_caption_files(dir: &Path) -> Result<(Vec<RawSegment>, Vec<String>)> {
    let mut files = Vec::new();
    let mut info_file = None;
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json3") {
            files.push(path);
        } else if path.to_string_lossy().ends_with(".info.json") {
            info_file = Some(path);
        }
    }
    files.sort();

    let mut language_codes = match &info_file {
        Some(path) => match available_languages(&fs::read_to_string(path).await?) {
            Ok(langs) => langs,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable info json");
                Vec::new()
            }
        },
        None => Vec::new(),
    };
    if language_codes.is_empty() {
        language_codes = files.iter().filter_map(|p| caption_language(p)).collect();
        language_codes.dedup();
    }
    if language_codes.is_empty() {
        language_codes = vec!["en".to_string()];
    }

    for path in &files {
        let content = fs::read_to_string(path).await?;
        let cues = parse_json3(&content)?;
        if !cues.is_empty() {
            return Ok((cues, language_codes));
        }
    }
    Err(CaptionError::NoCaptions.into())
}

/// `abc.en-US.json3` -> `en-US`
fn caption_language(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let (_, lang) = stem.rsplit_once('.')?;
    Some(lang.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_caption_errors() {
        assert_eq!(
            CaptionError::classify("ERROR: There are no subtitles for the requested languages"),
            CaptionError::NoCaptions
        );
        assert_eq!(
            CaptionError::classify("ERROR: Private video. Sign in if you've been granted access"),
            CaptionError::Restricted
        );
        assert_eq!(
            CaptionError::classify("ERROR: Video unavailable"),
            CaptionError::Unavailable
        );
        assert_eq!(
            CaptionError::classify("  boom  "),
            CaptionError::Other("boom".to_string())
        );
    }

    #[test]
    fn test_build_transcript_totals() {
        let data = build_transcript(
            vec![
                RawSegment::new(0.0, 2.5, "  hello "),
                RawSegment::new(3661.0, 4.0, "world"),
            ],
            vec!["en".to_string()],
        );
        assert_eq!(data.text, "hello world");
        assert_eq!(data.total_segments, 2);
        assert_eq!(data.total_duration, 3665.0);
        assert_eq!(data.segments[0].text, "hello");
        assert_eq!(data.segments[1].timestamp, "01:01:01");
    }

    #[test]
    fn test_build_transcript_empty() {
        let data = build_transcript(Vec::new(), vec!["en".to_string()]);
        assert_eq!(data.text, "");
        assert_eq!(data.total_segments, 0);
        assert_eq!(data.total_duration, 0.0);
    }

    #[test]
    fn test_parse_json3() {
        let content = r#"{
            "wireMagic": "pb3",
            "events": [
                {"tStartMs": 0, "dDurationMs": 1500, "segs": [{"utf8": "Hello"}, {"utf8": " there"}]},
                {"tStartMs": 1500, "dDurationMs": 200, "aAppend": 1, "segs": [{"utf8": "\n"}]},
                {"tStartMs": 2000, "dDurationMs": 3000},
                {"tStartMs": 65000, "dDurationMs": 2000, "segs": [{"utf8": "general\nKenobi"}]}
            ]
        }"#;
        let cues = parse_json3(content).unwrap();
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0], RawSegment::new(0.0, 1.5, "Hello there"));
        assert_eq!(cues[1].start, 65.0);
        assert_eq!(cues[1].text, "general Kenobi");
    }

    #[test]
    fn test_caption_language() {
        assert_eq!(
            caption_language(Path::new("/tmp/x/abc12345678.en-US.json3")).as_deref(),
            Some("en-US")
        );
        assert_eq!(caption_language(Path::new("plain.json3")), None);
    }

    #[tokio::test]
    async fn test_read_caption_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("abc12345678.en.json3"),
            r#"{"events":[{"tStartMs":0,"dDurationMs":1000,"segs":[{"utf8":"hi"}]}]}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("abc12345678.de.json3"), r#"{"events":[]}"#).unwrap();

        let (cues, langs) = read_caption_files(dir.path()).await.unwrap();
        assert_eq!(langs, vec!["de".to_string(), "en".to_string()]);
        // the German file sorts first but has no cues
        assert_eq!(cues, vec![RawSegment::new(0.0, 1.0, "hi")]);
    }

    #[test]
    fn test_available_languages_from_info_json() {
        let info = include_str!("../../tests/fixtures/rust-talk.info.json");
        let langs = available_languages(info).unwrap();
        assert_eq!(langs, vec!["de", "en", "fr", "ja"]);
        assert!(available_languages("{}").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_caption_files_prefers_info_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("abc12345678.en.json3"),
            r#"{"events":[{"tStartMs":0,"dDurationMs":1000,"segs":[{"utf8":"hi"}]}]}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("abc12345678.info.json"),
            include_str!("../../tests/fixtures/rust-talk.info.json"),
        )
        .unwrap();

        let (cues, langs) = read_caption_files(dir.path()).await.unwrap();
        assert_eq!(cues.len(), 1);
        assert_eq!(langs, vec!["de", "en", "fr", "ja"]);
    }

    #[tokio::test]
    async fn test_read_caption_files_none() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_caption_files(dir.path()).await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::TldwError::Captions(CaptionError::NoCaptions)
        ));
    }
}
