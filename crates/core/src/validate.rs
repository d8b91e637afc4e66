//! Input validation and sanitizing helpers.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Url;

use crate::types::TranscriptData;

pub const YOUTUBE_DOMAINS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "youtu.be",
    "music.youtube.com",
];

pub const MAX_URL_LENGTH: usize = 2048;
pub const MAX_FILENAME_LENGTH: usize = 100;
pub const MAX_CONTENT_BYTES: usize = 1_000_000;
const FALLBACK_FILENAME: &str = "unknown_file";

static VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("valid regex"));
static VIDEO_ID_FALLBACK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:v=|/)([A-Za-z0-9_-]{11})").expect("valid regex"));
static SUSPICIOUS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"<script[^>]*>", r"javascript:", r"data:text/html", r"vbscript:"]
        .iter()
        .map(|p| Regex::new(p).expect("valid regex"))
        .collect()
});

fn parse_url(input: &str) -> Option<Url> {
    let input = input.trim();
    if input.is_empty() || input.len() > MAX_URL_LENGTH {
        return None;
    }
    let url = Url::parse(input)
        .or_else(|_| Url::parse(&format!("https://{input}")))
        .ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

fn is_youtube_host(host: &str) -> bool {
    let host = host.to_lowercase();
    YOUTUBE_DOMAINS
        .iter()
        .any(|domain| host == *domain || host.ends_with(&format!(".{domain}")))
        || host.contains("youtube")
        || host.contains("youtu.be")
}

/// Check that the URL points at a YouTube host.
pub fn validate_youtube_url(url: &str) -> bool {
    parse_url(url)
        .and_then(|u| u.host_str().map(is_youtube_host))
        .unwrap_or(false)
}

pub fn validate_video_id(video_id: &str) -> bool {
    VIDEO_ID.is_match(video_id)
}

/// Extract the 11-character video id from any common YouTube URL shape.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();

    if validate_video_id(input) {
        return Some(input.to_string());
    }

    if let Some(url) = parse_url(input) {
        let host = url.host_str().unwrap_or_default().to_lowercase();

        if host == "youtu.be" || host.ends_with(".youtu.be") {
            if let Some(id) = url.path_segments().and_then(|mut s| s.next()) {
                if validate_video_id(id) {
                    return Some(id.to_string());
                }
            }
        }

        if is_youtube_host(&host) {
            if let Some((_, id)) = url.query_pairs().find(|(k, _)| k == "v") {
                if validate_video_id(&id) {
                    return Some(id.into_owned());
                }
            }

            let segments: Vec<&str> = url.path_segments().map(|s| s.collect()).unwrap_or_default();
            if let [kind, id, ..] = segments.as_slice() {
                if matches!(*kind, "embed" | "shorts" | "live" | "v") && validate_video_id(id) {
                    return Some(id.to_string());
                }
            }
        }
    }

    VIDEO_ID_FALLBACK
        .captures(input)
        .map(|caps| caps[1].to_string())
}

/// Make a string safe to use as a file name.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = replaced.trim_matches(|c| c == ' ' || c == '.');
    let truncated: String = trimmed.chars().take(MAX_FILENAME_LENGTH).collect();
    // truncation can expose a trailing space or dot again
    let truncated = truncated.trim_end_matches([' ', '.']);

    if truncated.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        truncated.to_string()
    }
}

pub fn validate_text_input(text: &str, min_length: usize, max_length: usize) -> bool {
    let len = text.trim().chars().count();
    len >= min_length.max(1) && len <= max_length
}

/// Reject oversized input and obvious script injection.
pub fn is_safe_content(text: &str) -> bool {
    if text.is_empty() || text.len() > MAX_CONTENT_BYTES {
        return false;
    }
    let lower = text.to_lowercase();
    !SUSPICIOUS.iter().any(|re| re.is_match(&lower))
}

pub fn validate_transcript(transcript: &TranscriptData) -> bool {
    !transcript.text.trim().is_empty()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    CreatedAt,
    Title,
    Channel,
    Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Listing parameters after clamping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParams {
    pub limit: usize,
    pub query: String,
    pub sort: SortKey,
    pub order: SortOrder,
}

impl QueryParams {
    pub const DEFAULT_LIMIT: usize = 10;
    pub const MAX_LIMIT: usize = 100;
    pub const MAX_QUERY_CHARS: usize = 200;

    pub fn sanitized(
        limit: Option<&str>,
        query: Option<&str>,
        sort: Option<&str>,
        order: Option<&str>,
    ) -> Self {
        let limit = match limit.map(|l| l.trim().parse::<i64>()) {
            Some(Ok(n)) => n.clamp(1, Self::MAX_LIMIT as i64) as usize,
            _ => Self::DEFAULT_LIMIT,
        };
        let query = query
            .unwrap_or_default()
            .trim()
            .chars()
            .take(Self::MAX_QUERY_CHARS)
            .collect();
        let sort = match sort.unwrap_or_default() {
            "title" => SortKey::Title,
            "channel" => SortKey::Channel,
            "duration" => SortKey::Duration,
            _ => SortKey::CreatedAt,
        };
        let order = match order.unwrap_or_default() {
            "asc" => SortOrder::Asc,
            _ => SortOrder::Desc,
        };
        Self {
            limit,
            query,
            sort,
            order,
        }
    }
}

impl Default for QueryParams {
    fn default() -> Self {
        Self::sanitized(None, None, None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_youtube_domains() {
        for url in [
            "https://www.youtube.com/watch?v=abc12345678",
            "https://youtube.com/watch?v=abc12345678",
            "https://youtu.be/abc12345678",
            "https://m.youtube.com/watch?v=abc12345678",
            "https://music.youtube.com/watch?v=abc12345678",
            "  www.youtube.com/watch?v=abc12345678  ",
        ] {
            assert!(validate_youtube_url(url), "{url} should be accepted");
        }
    }

    #[test]
    fn test_rejects_other_hosts() {
        for url in [
            "https://vimeo.com/123456",
            "https://example.com/watch?v=abc12345678",
            "ftp://youtube.com/watch?v=abc12345678",
            "",
            "not a url at all",
        ] {
            assert!(!validate_youtube_url(url), "{url} should be rejected");
        }
    }

    #[test]
    fn test_rejects_overlong_url() {
        let url = format!("https://youtube.com/watch?v={}", "a".repeat(MAX_URL_LENGTH));
        assert!(!validate_youtube_url(&url));
    }

    #[test]
    fn test_extract_video_id_same_for_all_forms() {
        let expected = Some("abc12345678".to_string());
        assert_eq!(extract_video_id("https://youtu.be/abc12345678"), expected);
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=abc12345678"),
            expected
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=abc12345678&t=10s"),
            expected
        );
        assert_eq!(extract_video_id("https://youtu.be/abc12345678?t=42"), expected);
        assert_eq!(
            extract_video_id("https://m.youtube.com/watch?feature=share&v=abc12345678"),
            expected
        );
    }

    #[test]
    fn test_extract_video_id_path_forms() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/shorts/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(extract_video_id("dQw4w9WgXcQ"), Some("dQw4w9WgXcQ".to_string()));
        assert_eq!(extract_video_id("https://www.youtube.com/"), None);
        assert_eq!(extract_video_id(""), None);
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("a<b>c:d\"e/f\\g|h?i*j"), "a_b_c_d_e_f_g_h_i_j");
        assert_eq!(sanitize_filename("  ..report.. "), "report");
        assert_eq!(sanitize_filename(""), "unknown_file");
        assert_eq!(sanitize_filename(" ... "), "unknown_file");

        let long = "x".repeat(250);
        assert_eq!(sanitize_filename(&long).chars().count(), MAX_FILENAME_LENGTH);

        let multibyte = "é".repeat(150);
        assert_eq!(sanitize_filename(&multibyte).chars().count(), MAX_FILENAME_LENGTH);
    }

    #[test]
    fn test_text_input_bounds() {
        assert!(validate_text_input("hello", 1, 10));
        assert!(!validate_text_input("   ", 1, 10));
        assert!(!validate_text_input("hello world!", 1, 5));
    }

    #[test]
    fn test_safe_content() {
        assert!(is_safe_content("What does the speaker say about Rust?"));
        assert!(!is_safe_content("<SCRIPT src=x>"));
        assert!(!is_safe_content("click javascript:alert(1)"));
        assert!(!is_safe_content(""));
    }

    #[test]
    fn test_query_params_clamped() {
        let params = QueryParams::sanitized(Some("1000"), Some("  rust  "), Some("bogus"), Some("up"));
        assert_eq!(params.limit, QueryParams::MAX_LIMIT);
        assert_eq!(params.query, "rust");
        assert_eq!(params.sort, SortKey::CreatedAt);
        assert_eq!(params.order, SortOrder::Desc);

        let params = QueryParams::sanitized(Some("-3"), None, Some("title"), Some("asc"));
        assert_eq!(params.limit, 1);
        assert_eq!(params.sort, SortKey::Title);
        assert_eq!(params.order, SortOrder::Asc);

        assert_eq!(QueryParams::sanitized(Some("many"), None, None, None).limit, 10);
    }
}
