//! Follow-up chat over an analyzed video.

use std::collections::HashSet;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    ai::{Analyzer, TextModel},
    error::Result,
    types::{SessionRecord, VideoInfo},
};

pub const MAX_SUGGESTIONS: usize = 6;
const SUGGESTION_LOOKBACK: usize = 6;
const REGENERATE_SUFFIX: &str = " (Please provide a different perspective or more details)";

const DEFAULT_SUGGESTIONS: [&str; 6] = [
    "What is the main topic of this video?",
    "What are the key takeaways?",
    "Can you summarize the important points?",
    "What actionable advice is given?",
    "Are there any important examples mentioned?",
    "What questions does this video answer?",
];

const CONTEXT_SUGGESTIONS: [&str; 4] = [
    "What actionable steps can I take from this video?",
    "Are there any important quotes or key phrases?",
    "What questions does this video answer?",
    "How does this relate to current trends?",
];

const FOLLOW_UP_SUGGESTIONS: [&str; 4] = [
    "What are the potential challenges mentioned?",
    "How does this apply to beginners?",
    "What tools or resources are recommended?",
    "Are there any contradictions or debates discussed?",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Like,
    Dislike,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Local>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
}

impl ChatMessage {
    fn user(content: &str) -> Self {
        Self {
            role: Role::User,
            content: content.to_string(),
            timestamp: Local::now(),
            rating: None,
        }
    }

    fn assistant(content: String) -> Self {
        Self {
            role: Role::Assistant,
            content,
            timestamp: Local::now(),
            rating: None,
        }
    }
}

/// What the chat knows about the video it is attached to
#[derive(Debug, Clone)]
pub struct ChatContext {
    pub video_info: VideoInfo,
    pub transcript: String,
    pub has_takeaways: bool,
    pub topics: Vec<String>,
    pub has_timeline: bool,
}

impl From<&SessionRecord> for ChatContext {
    fn from(record: &SessionRecord) -> Self {
        Self {
            video_info: record.video_info.clone(),
            transcript: record.transcript.text.clone(),
            has_takeaways: !record.analysis.key_takeaways.is_empty(),
            topics: record.analysis.topics.clone().unwrap_or_default(),
            has_timeline: !record.analysis.timeline.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatSummary {
    pub total_messages: usize,
    pub questions: Vec<String>,
    pub key_topics: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Engagement {
    High,
    Medium,
    Low,
}

impl Engagement {
    fn for_message_count(total: usize) -> Self {
        if total > 10 {
            Engagement::High
        } else if total > 5 {
            Engagement::Medium
        } else {
            Engagement::Low
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatInsights {
    pub total_messages: usize,
    pub user_questions: usize,
    pub ai_responses: usize,
    pub average_question_length: f64,
    pub topics_explored: usize,
    pub engagement_level: Engagement,
}

/// In-memory conversation about one video. History is append-only apart
/// from `clear` and in-place regeneration of an answer.
#[derive(Debug, Clone)]
pub struct ChatSession {
    context: Option<ChatContext>,
    history: Vec<ChatMessage>,
    suggestions: Vec<String>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ChatSession {
    pub fn new(context: Option<ChatContext>) -> Self {
        let mut session = Self {
            context,
            history: Vec::new(),
            suggestions: Vec::new(),
        };
        session.suggestions = session.initial_suggestions();
        session
    }

    pub fn for_record(record: &SessionRecord) -> Self {
        Self::new(Some(ChatContext::from(record)))
    }

    pub fn context(&self) -> Option<&ChatContext> {
        self.context.as_ref()
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    /// Suggestions derived from the analysis, or generic ones without context
    pub fn initial_suggestions(&self) -> Vec<String> {
        let Some(context) = &self.context else {
            return DEFAULT_SUGGESTIONS.iter().map(|s| s.to_string()).collect();
        };

        let mut suggestions = Vec::new();
        if !context.video_info.title.trim().is_empty() {
            suggestions.push("What is the main message of this video?".to_string());
        }
        if context.has_takeaways {
            suggestions.push("What are the most important points to remember?".to_string());
        }
        if let Some(topic) = context.topics.first() {
            suggestions.push(format!("Can you explain more about {topic}?"));
        }
        if context.has_timeline {
            suggestions.push("What happens at the beginning vs the end?".to_string());
        }
        suggestions.extend(CONTEXT_SUGGESTIONS.iter().map(|s| s.to_string()));
        suggestions.truncate(MAX_SUGGESTIONS);
        suggestions
    }

    pub fn refresh_suggestions(&mut self) {
        self.suggestions = self.initial_suggestions();
    }

    /// Follow-ups keyed on what the user asked recently, mixed with general
    /// questions; anything already on offer is skipped.
    pub fn update_suggestions(&mut self) {
        let start = self.history.len().saturating_sub(SUGGESTION_LOOKBACK);
        let mut candidates: Vec<&str> = self.history[start..]
            .iter()
            .filter(|m| m.role == Role::User)
            .filter_map(|m| follow_up_for(&m.content.to_lowercase()))
            .collect();
        candidates.extend(FOLLOW_UP_SUGGESTIONS);

        let mut updated: Vec<String> = Vec::new();
        for candidate in candidates {
            if updated.len() >= MAX_SUGGESTIONS {
                break;
            }
            if !self.suggestions.iter().any(|s| s == candidate)
                && !updated.iter().any(|s| s == candidate)
            {
                updated.push(candidate.to_string());
            }
        }
        for current in &self.suggestions {
            if updated.len() >= MAX_SUGGESTIONS {
                break;
            }
            if !updated.contains(current) {
                updated.push(current.clone());
            }
        }
        self.suggestions = updated;
    }

    /// Ask a question. Blank input is ignored and yields `None`. When the
    /// model fails the question stays in history and the error is returned.
    pub async fn ask<M: TextModel>(
        &mut self,
        analyzer: &Analyzer<M>,
        question: &str,
    ) -> Result<Option<&ChatMessage>> {
        if question.trim().is_empty() {
            return Ok(None);
        }

        let exchanges = exchanges(&self.history);
        self.history.push(ChatMessage::user(question));

        let answer = analyzer
            .chat(self.transcript(), &exchanges, question)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "chat answer failed"))?;

        self.history.push(ChatMessage::assistant(answer));
        self.update_suggestions();
        Ok(self.history.last())
    }

    /// Rate an assistant message. Returns false when the index does not
    /// point at one.
    pub fn rate(&mut self, index: usize, rating: Rating) -> bool {
        match self.history.get_mut(index) {
            Some(message) if message.role == Role::Assistant => {
                message.rating = Some(rating);
                true
            }
            _ => false,
        }
    }

    /// Re-ask the question that produced the answer at `index`, replacing the
    /// answer in place. Returns false when `index` is not an answer to a
    /// user question.
    pub async fn regenerate<M: TextModel>(
        &mut self,
        analyzer: &Analyzer<M>,
        index: usize,
    ) -> Result<bool> {
        if index == 0 || index >= self.history.len() {
            return Ok(false);
        }
        let question = &self.history[index - 1];
        if question.role != Role::User || self.history[index].role != Role::Assistant {
            return Ok(false);
        }

        let prompt = format!("{}{}", question.content, REGENERATE_SUFFIX);
        let exchanges = exchanges(&self.history[..index - 1]);
        let answer = analyzer.chat(self.transcript(), &exchanges, &prompt).await?;

        let message = &mut self.history[index];
        message.content = answer;
        message.timestamp = Local::now();
        message.rating = None;
        Ok(true)
    }

    pub fn clear(&mut self) {
        self.history.clear();
        self.refresh_suggestions();
    }

    pub fn summary(&self) -> Option<ChatSummary> {
        if self.history.is_empty() {
            return None;
        }
        let questions: Vec<String> = self.user_messages().map(|m| m.content.clone()).collect();
        let mut seen = HashSet::new();
        let key_topics = questions
            .iter()
            .map(|q| leading_words(q, 3))
            .filter(|topic| !topic.is_empty() && seen.insert(topic.clone()))
            .collect();

        Some(ChatSummary {
            total_messages: self.history.len(),
            questions,
            key_topics,
        })
    }

    /// Chat history as pretty JSON, or `None` when nothing was said yet
    pub fn export_json(&self) -> Result<Option<String>> {
        if self.history.is_empty() {
            return Ok(None);
        }
        let video_info = match &self.context {
            Some(context) => serde_json::to_value(&context.video_info)?,
            None => json!({}),
        };
        let data = json!({
            "export_info": {
                "type": "chat_history",
                "generated_at": Local::now().to_rfc3339(),
                "total_messages": self.history.len(),
            },
            "video_info": video_info,
            "chat_history": self.history,
        });
        Ok(Some(serde_json::to_string_pretty(&data)?))
    }

    pub fn insights(&self) -> Option<ChatInsights> {
        if self.history.is_empty() {
            return None;
        }
        let questions: Vec<&ChatMessage> = self.user_messages().collect();
        let average_question_length = if questions.is_empty() {
            0.0
        } else {
            let words: usize = questions
                .iter()
                .map(|m| m.content.split_whitespace().count())
                .sum();
            words as f64 / questions.len() as f64
        };
        let topics_explored = questions
            .iter()
            .map(|m| leading_words(&m.content.to_lowercase(), 3))
            .collect::<HashSet<_>>()
            .len();

        Some(ChatInsights {
            total_messages: self.history.len(),
            user_questions: questions.len(),
            ai_responses: self
                .history
                .iter()
                .filter(|m| m.role == Role::Assistant)
                .count(),
            average_question_length,
            topics_explored,
            engagement_level: Engagement::for_message_count(self.history.len()),
        })
    }

    fn transcript(&self) -> &str {
        self.context
            .as_ref()
            .map(|c| c.transcript.as_str())
            .unwrap_or_default()
    }

    fn user_messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.history.iter().filter(|m| m.role == Role::User)
    }
}

/// `chat_history_<YYYYmmdd_HHMMSS>.json`
pub fn export_file_name(at: DateTime<Local>) -> String {
    format!("chat_history_{}.json", at.format("%Y%m%d_%H%M%S"))
}

fn follow_up_for(question: &str) -> Option<&'static str> {
    if question.contains("takeaway") || question.contains("key point") {
        Some("Can you elaborate on any of these points?")
    } else if question.contains("example") {
        Some("Are there other examples mentioned?")
    } else if question.contains("action") || question.contains("implement") {
        Some("What are the first steps to get started?")
    } else if question.contains("quote") {
        Some("What's the context behind these quotes?")
    } else {
        None
    }
}

/// Completed (question, answer) pairs in order
fn exchanges(history: &[ChatMessage]) -> Vec<(String, String)> {
    history
        .windows(2)
        .filter(|pair| pair[0].role == Role::User && pair[1].role == Role::Assistant)
        .map(|pair| (pair[0].content.clone(), pair[1].content.clone()))
        .collect()
}

fn leading_words(text: &str, n: usize) -> String {
    text.split_whitespace().take(n).collect::<Vec<_>>().join(" ")
}
