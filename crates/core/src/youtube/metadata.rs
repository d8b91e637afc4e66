use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::{
    error::{Result, TldwError},
    types::VideoInfo,
};

const VIDEOS_ENDPOINT: &str = "https://www.googleapis.com/youtube/v3/videos";

static ISO_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?$").expect("valid regex")
});

/// `PT1H2M3S` -> `1:02:03`, `PT4M13S` -> `4:13`, anything else -> `Unknown`
pub fn parse_duration(iso: &str) -> String {
    let Some(caps) = ISO_DURATION.captures(iso.trim()) else {
        return "Unknown".to_string();
    };
    let part = |i: usize| -> u64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };
    let (hours, minutes, seconds) = (part(1), part(2), part(3));
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

impl VideoInfo {
    /// Minimal info used when no metadata source is available
    pub fn placeholder(video_id: &str, url: &str) -> Self {
        Self {
            video_id: video_id.to_string(),
            url: url.to_string(),
            title: format!("Video {video_id}"),
            channel: "Unknown Channel".to_string(),
            duration: "Unknown".to_string(),
            views: 0,
            description: "Description not available".to_string(),
            thumbnail: format!("https://img.youtube.com/vi/{video_id}/maxresdefault.jpg"),
            published_date: None,
            likes: None,
            comments: None,
            tags: Vec::new(),
            category_id: None,
            language: None,
        }
    }
}

/// YouTube Data API v3 client for video details
#[derive(Debug, Clone)]
pub struct MetadataClient {
    http: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
}

impl MetadataClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            endpoint: VIDEOS_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Video info for the id; lookup failures keep the placeholder
    pub async fn video_info(&self, video_id: &str, url: &str) -> VideoInfo {
        let mut info = VideoInfo::placeholder(video_id, url);
        let Some(api_key) = &self.api_key else {
            tracing::debug!(video_id, "no YouTube API key, using placeholder metadata");
            return info;
        };

        match self.fetch_details(video_id, api_key).await {
            Ok(Some(item)) => apply_api_item(&mut info, &item),
            Ok(None) => tracing::warn!(video_id, "YouTube API returned no items"),
            Err(e) => tracing::warn!(video_id, error = %e, "could not fetch detailed video info"),
        }
        info
    }

    async fn fetch_details(&self, video_id: &str, api_key: &str) -> Result<Option<Value>> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("part", "snippet,statistics,contentDetails"),
                ("id", video_id),
                ("key", api_key),
            ])
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await?;
        if !status.is_success() {
            return Err(TldwError::MetadataFailed {
                video_id: video_id.to_string(),
                reason: body["error"]["message"]
                    .as_str()
                    .unwrap_or(status.as_str())
                    .to_string(),
            });
        }

        Ok(body["items"].as_array().and_then(|items| items.first()).cloned())
    }
}

/// Counters arrive as decimal strings
fn count(value: &Value) -> Option<u64> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

fn apply_api_item(info: &mut VideoInfo, item: &Value) {
    let snippet = &item["snippet"];
    let statistics = &item["statistics"];

    if let Some(title) = snippet["title"].as_str() {
        info.title = title.to_string();
    }
    if let Some(description) = snippet["description"].as_str() {
        info.description = description.to_string();
    }
    if let Some(channel) = snippet["channelTitle"].as_str() {
        info.channel = channel.to_string();
    }
    info.published_date = snippet["publishedAt"].as_str().map(str::to_string);
    info.views = count(&statistics["viewCount"]).unwrap_or(0);
    info.likes = Some(count(&statistics["likeCount"]).unwrap_or(0));
    info.comments = Some(count(&statistics["commentCount"]).unwrap_or(0));
    if let Some(duration) = item["contentDetails"]["duration"].as_str() {
        info.duration = parse_duration(duration);
    }
    info.tags = snippet["tags"]
        .as_array()
        .map(|tags| {
            tags.iter()
                .filter_map(|t| t.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    info.category_id = snippet["categoryId"].as_str().map(str::to_string);
    info.language = Some(
        snippet["defaultLanguage"]
            .as_str()
            .unwrap_or("en")
            .to_string(),
    );
}
