use super::{TextModel, parse};
use crate::{
    config::AnalysisConfig,
    error::Result,
    prompts,
    settings::{AnalysisSettings, SummaryStyle},
    types::{AnalysisResult, Sentiment, VideoInfo},
};

pub const SUMMARY_FAILED: &str = "Summary generation failed.";

/// Analysis facets in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facet {
    Summary,
    Takeaways,
    Quotes,
    ActionItems,
    Topics,
    Sentiment,
    Timeline,
    QuestionsAndAnswers,
    StudyNotes,
    BusinessInsights,
}

impl Facet {
    pub fn label(&self) -> &'static str {
        match self {
            Facet::Summary => "summary",
            Facet::Takeaways => "key takeaways",
            Facet::Quotes => "important quotes",
            Facet::ActionItems => "action items",
            Facet::Topics => "topics",
            Facet::Sentiment => "sentiment",
            Facet::Timeline => "timeline",
            Facet::QuestionsAndAnswers => "questions & answers",
            Facet::StudyNotes => "study notes",
            Facet::BusinessInsights => "business insights",
        }
    }
}

pub struct AnalysisRequest<'a> {
    pub transcript: &'a str,
    pub video_info: &'a VideoInfo,
    pub settings: &'a AnalysisSettings,
}

/// Runs each analysis facet against a text model
pub struct Analyzer<M> {
    model: M,
    limits: AnalysisConfig,
}

impl<M: TextModel> Analyzer<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            limits: AnalysisConfig::default(),
        }
    }

    pub fn with_limits(mut self, limits: AnalysisConfig) -> Self {
        self.limits = limits;
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub async fn analyze(&self, request: &AnalysisRequest<'_>) -> AnalysisResult {
        self.analyze_with(request, |_| {}).await
    }

    /// Like `analyze`, calling `on_facet` before each facet starts
    pub async fn analyze_with(
        &self,
        request: &AnalysisRequest<'_>,
        mut on_facet: impl FnMut(Facet),
    ) -> AnalysisResult {
        let transcript = truncate_chars(request.transcript, self.limits.max_transcript_chars);
        if transcript.len() < request.transcript.len() {
            tracing::info!(
                original = request.transcript.len(),
                kept = transcript.len(),
                "transcript truncated before analysis"
            );
        }
        let settings = request.settings;
        let style = settings.summary_type;
        let mut result = AnalysisResult::default();

        on_facet(Facet::Summary);
        let summary_prompt = prompts::summary(style, settings.language, request.video_info);
        result.main_summary = self
            .facet(Facet::Summary, &summary_prompt, transcript)
            .await
            .map(|text| text.trim().to_string())
            .unwrap_or_else(|| SUMMARY_FAILED.to_string());

        on_facet(Facet::Takeaways);
        result.key_takeaways = self
            .facet(Facet::Takeaways, &prompts::takeaways(style), transcript)
            .await
            .map(|text| parse::parse_bullets(&text, self.limits.max_takeaways))
            .unwrap_or_default();

        on_facet(Facet::Quotes);
        result.important_quotes = self
            .facet(Facet::Quotes, prompts::QUOTES, transcript)
            .await
            .map(|text| parse::parse_quotes(&text, self.limits.max_quotes))
            .unwrap_or_default();

        on_facet(Facet::ActionItems);
        result.action_items = self
            .facet(Facet::ActionItems, prompts::ACTION_ITEMS, transcript)
            .await
            .map(|text| parse::parse_bullets(&text, self.limits.max_action_items))
            .unwrap_or_default();

        if settings.include_topics {
            on_facet(Facet::Topics);
            result.topics = Some(
                self.facet(Facet::Topics, prompts::TOPICS, transcript)
                    .await
                    .map(|text| parse::parse_topics(&text, self.limits.max_topics))
                    .unwrap_or_default(),
            );
        }

        if settings.include_sentiment {
            on_facet(Facet::Sentiment);
            result.sentiment_analysis = Some(
                self.facet(Facet::Sentiment, prompts::SENTIMENT, transcript)
                    .await
                    .map(|text| parse::parse_sentiment(&text))
                    .unwrap_or_else(Sentiment::undetermined),
            );
        }

        on_facet(Facet::Timeline);
        result.timeline = self
            .facet(Facet::Timeline, prompts::TIMELINE, transcript)
            .await
            .map(|text| parse::parse_timeline(&text, self.limits.max_timeline))
            .unwrap_or_default();

        on_facet(Facet::QuestionsAndAnswers);
        result.questions_and_answers = self
            .facet(Facet::QuestionsAndAnswers, prompts::QA, transcript)
            .await
            .map(|text| parse::parse_qa(&text, self.limits.max_qa))
            .unwrap_or_default();

        if style == SummaryStyle::Academic {
            on_facet(Facet::StudyNotes);
            result.study_notes = Some(
                self.facet(Facet::StudyNotes, prompts::STUDY_NOTES, transcript)
                    .await
                    .map(|text| parse::parse_study_notes(&text))
                    .unwrap_or_default(),
            );
        }

        if style == SummaryStyle::Business {
            on_facet(Facet::BusinessInsights);
            result.business_insights = Some(
                self.facet(Facet::BusinessInsights, prompts::BUSINESS_INSIGHTS, transcript)
                    .await
                    .map(|text| parse::parse_business_insights(&text))
                    .unwrap_or_default(),
            );
        }

        result
    }

    /// One model call; failures are logged and reported as `None`
    async fn facet(&self, facet: Facet, prompt: &str, transcript: &str) -> Option<String> {
        let prompt = prompts::with_transcript(prompt, transcript);
        match self.model.generate(&prompt).await {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!(facet = facet.label(), error = %e, "analysis facet failed");
                None
            }
        }
    }

    /// Answer a follow-up question about the transcript
    pub async fn chat(
        &self,
        transcript: &str,
        history: &[(String, String)],
        question: &str,
    ) -> Result<String> {
        let transcript = truncate_chars(transcript, self.limits.max_transcript_chars);
        let prompt = prompts::chat(transcript, history, question);
        let answer = self.model.generate(&prompt).await?;
        Ok(answer.trim().to_string())
    }
}

/// Cut `text` to at most `max` chars without splitting a char
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::error::TldwError;
    use crate::ai::ModelError;

    /// Replies by matching a marker in the prompt; unknown prompts fail
    struct ScriptedModel {
        replies: Vec<(&'static str, &'static str)>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<(&'static str, &'static str)>) -> Self {
            Self {
                replies,
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    impl TextModel for ScriptedModel {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .iter()
                .find(|(marker, _)| prompt.contains(marker))
                .map(|(_, reply)| reply.to_string())
                .ok_or_else(|| TldwError::Model(ModelError::Other("no script".to_string())))
        }
    }

    fn video() -> VideoInfo {
        VideoInfo::placeholder("abc12345678", "https://youtu.be/abc12345678")
    }

    #[tokio::test]
    async fn test_analyze_all_facets() {
        let model = ScriptedModel::new(vec![
            ("Generate the summary", "  A great talk about Rust.  "),
            ("extract the most important takeaways", "- Learn ownership\n- Use cargo"),
            ("impactful, memorable", "\"Fearless concurrency is real.\""),
            ("actionable items", "1. Install rustup\n2. Read the book"),
            ("main topics, themes", "Ownership\nCargo"),
            ("sentiment and emotional tone", "Positive: 70%\nNeutral: 20%\nNegative: 10%\nOverall sentiment score: 0.7"),
            ("timeline of key events", "00:00: Intro\n03:00: Ownership"),
            ("question-answer pairs", "Q: Why Rust?\nA: Safety."),
        ]);
        let analyzer = Analyzer::new(model);
        let settings = AnalysisSettings::default();
        let video = video();
        let request = AnalysisRequest {
            transcript: "rust transcript",
            video_info: &video,
            settings: &settings,
        };

        let mut seen = Vec::new();
        let result = analyzer.analyze_with(&request, |facet| seen.push(facet)).await;

        assert_eq!(result.main_summary, "A great talk about Rust.");
        assert_eq!(result.key_takeaways, vec!["Learn ownership", "Use cargo"]);
        assert_eq!(result.important_quotes, vec!["Fearless concurrency is real."]);
        assert_eq!(result.action_items, vec!["Install rustup", "Read the book"]);
        assert_eq!(
            result.topics,
            Some(vec!["Ownership".to_string(), "Cargo".to_string()])
        );
        assert!((result.sentiment_score() - 0.7).abs() < 1e-9);
        assert_eq!(result.timeline.len(), 2);
        assert_eq!(result.questions_and_answers[0].answer, "Safety.");
        assert!(result.study_notes.is_none());
        assert!(result.business_insights.is_none());
        assert_eq!(seen.len(), 8);

        let prompts = analyzer.model().prompts.lock().unwrap();
        assert!(prompts.iter().all(|p| p.ends_with("\n\nTranscript:\nrust transcript")));
    }

    #[tokio::test]
    async fn test_failed_facets_degrade() {
        let analyzer = Analyzer::new(ScriptedModel::new(Vec::new()));
        let settings = AnalysisSettings::default();
        let video = video();
        let request = AnalysisRequest {
            transcript: "text",
            video_info: &video,
            settings: &settings,
        };

        let result = analyzer.analyze(&request).await;
        assert_eq!(result.main_summary, SUMMARY_FAILED);
        assert!(result.key_takeaways.is_empty());
        assert_eq!(result.topics, Some(Vec::new()));
        assert_eq!(result.sentiment_analysis, Some(Sentiment::undetermined()));
        assert_eq!(result.sentiment_score(), 0.0);
    }

    #[tokio::test]
    async fn test_optional_facets_follow_settings() {
        let analyzer = Analyzer::new(ScriptedModel::new(vec![(
            "study notes",
            "MAIN CONCEPTS:\n- Borrowing",
        )]));
        let settings = AnalysisSettings {
            summary_type: SummaryStyle::Academic,
            include_topics: false,
            include_sentiment: false,
            ..AnalysisSettings::default()
        };
        let video = video();
        let request = AnalysisRequest {
            transcript: "text",
            video_info: &video,
            settings: &settings,
        };

        let result = analyzer.analyze(&request).await;
        assert!(result.topics.is_none());
        assert!(result.sentiment_analysis.is_none());
        assert_eq!(
            result.study_notes.map(|n| n.main_concepts),
            Some(vec!["Borrowing".to_string()])
        );
        assert!(result.business_insights.is_none());
    }

    #[tokio::test]
    async fn test_transcript_is_truncated() {
        let analyzer = Analyzer::new(ScriptedModel::new(Vec::new())).with_limits(AnalysisConfig {
            max_transcript_chars: 3,
            ..AnalysisConfig::default()
        });
        let settings = AnalysisSettings::default();
        let video = video();
        let request = AnalysisRequest {
            transcript: "ééééé",
            video_info: &video,
            settings: &settings,
        };
        analyzer.analyze(&request).await;

        let prompts = analyzer.model().prompts.lock().unwrap();
        assert!(prompts[0].ends_with("Transcript:\nééé"));
    }

    #[tokio::test]
    async fn test_timeline_and_qa_follow_limits() {
        let model = ScriptedModel::new(vec![
            ("timeline of key events", "00:00: Intro\n03:00: Ownership\n07:30: Lifetimes"),
            ("question-answer pairs", "Q: Why Rust?\nA: Safety.\nQ: Why cargo?\nA: Builds."),
        ]);
        let analyzer = Analyzer::new(model).with_limits(AnalysisConfig {
            max_timeline: 2,
            max_qa: 1,
            ..AnalysisConfig::default()
        });
        let settings = AnalysisSettings::default();
        let video = video();
        let request = AnalysisRequest {
            transcript: "rust transcript",
            video_info: &video,
            settings: &settings,
        };

        let result = analyzer.analyze(&request).await;
        assert_eq!(result.timeline.len(), 2);
        assert_eq!(result.questions_and_answers.len(), 1);
        assert_eq!(result.questions_and_answers[0].question, "Why Rust?");
    }

    #[tokio::test]
    async fn test_chat_propagates_model_errors() {
        let analyzer = Analyzer::new(ScriptedModel::new(vec![("User Question", " Because. ")]));
        let answer = analyzer.chat("t", &[], "why?").await.unwrap();
        assert_eq!(answer, "Because.");

        let failing = Analyzer::new(ScriptedModel::new(Vec::new()));
        assert!(failing.chat("t", &[], "why?").await.is_err());
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 2), "he");
        assert_eq!(truncate_chars("日本語", 2), "日本");
    }
}
