use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::settings::AnalysisSettings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub video_id: String,
    pub url: String,
    pub title: String,
    pub channel: String,
    /// Display form, e.g. `1:02:03` or `Unknown`.
    pub duration: String,
    pub views: u64,
    pub description: String,
    pub thumbnail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub timestamp: String,
    pub start_time: f64,
    pub duration: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptData {
    pub text: String,
    pub segments: Vec<Segment>,
    pub language_codes: Vec<String>,
    pub total_segments: usize,
    pub total_duration: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
    pub overall_score: f64,
}

impl Sentiment {
    /// Used when the sentiment call itself fails.
    pub fn undetermined() -> Self {
        Self {
            positive: 0.33,
            neutral: 0.33,
            negative: 0.33,
            overall_score: 0.0,
        }
    }
}

impl Default for Sentiment {
    fn default() -> Self {
        Self {
            positive: 0.0,
            neutral: 0.0,
            negative: 0.0,
            overall_score: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub timestamp: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudyNotes {
    pub main_concepts: Vec<String>,
    pub definitions: Vec<String>,
    pub examples: Vec<String>,
    pub formulas: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessInsights {
    pub key_strategies: Vec<String>,
    pub market_insights: Vec<String>,
    pub opportunities: Vec<String>,
    pub challenges: Vec<String>,
}

/// Output of one analysis run. Facets that were switched off stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub main_summary: String,
    pub key_takeaways: Vec<String>,
    pub important_quotes: Vec<String>,
    pub action_items: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topics: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment_analysis: Option<Sentiment>,
    pub timeline: Vec<TimelineEntry>,
    pub questions_and_answers: Vec<QaPair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_notes: Option<StudyNotes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_insights: Option<BusinessInsights>,
}

impl AnalysisResult {
    pub fn sentiment_score(&self) -> f64 {
        self.sentiment_analysis
            .map(|s| s.overall_score)
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub url: String,
    pub video_info: VideoInfo,
    pub transcript: TranscriptData,
    pub analysis: AnalysisResult,
    pub settings: AnalysisSettings,
    pub created_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
}

impl SessionRecord {
    /// A record that has not been saved yet; the store assigns id and timestamps.
    pub fn new(
        url: impl Into<String>,
        video_info: VideoInfo,
        transcript: TranscriptData,
        analysis: AnalysisResult,
        settings: AnalysisSettings,
    ) -> Self {
        let now = Utc::now();
        Self {
            session_id: String::new(),
            url: url.into(),
            video_info,
            transcript,
            analysis,
            settings,
            created_at: now,
            last_accessed: now,
        }
    }
}
