//! Integration tests for the caption → analysis → session → export flow
//!
//! Captions come from `tests/fixtures/`; the text model is scripted so no
//! network access is needed.

use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use tempfile::TempDir;
use tldw_core::{
    AnalysisSettings, AnalyzeRequest, Analyzer, ChatSession, ExportFormat, Exporter,
    MetadataClient, PipelineDeps, SessionRecord, SessionStore, SummaryStyle, TextModel,
    TldwError, TranscriptData, UserPreferences, VideoInfo, analyze_video,
    error::Result,
    pipeline::NoProgress,
    session::PREFERENCES_FILE,
    youtube::{CaptionSource, build_transcript, parse_json3, search_transcript, transcript_chapters},
};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn fixture_transcript() -> TranscriptData {
    let content = fs::read_to_string(fixture_path("rust-talk.en.json3")).unwrap();
    let cues = parse_json3(&content).expect("fixture should parse");
    build_transcript(cues, vec!["en".to_string()])
}

/// Replies keyed by a phrase that only appears in one facet prompt
struct ScriptedModel {
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    fn new() -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
        }
    }
}

const SCRIPT: &[(&str, &str)] = &[
    ("Generate the summary", "The talk introduces ownership and lifetimes."),
    (
        "extract the most important takeaways",
        "• Ownership prevents data races\n• Lifetimes are checked at compile time",
    ),
    ("impactful, memorable", "1. \"Ownership is the heart of Rust\""),
    ("actionable items", "- Read chapter four\n- Write a small borrow checker demo"),
    ("main topics, themes", "Ownership\nLifetimes\n# ignored heading"),
    (
        "sentiment and emotional tone",
        "Positive: 60%\nNeutral: 30%\nNegative: 10%\nOverall sentiment score: 0.5",
    ),
    ("timeline of key events", "00:00: Introduction\n00:09: Lifetimes"),
    ("question-answer pairs", "Q: What is ownership?\nA: A set of rules for memory."),
    ("academic learning", "MAIN CONCEPTS:\n- Ownership\nDEFINITIONS:\n- Borrow: a reference"),
    ("answer questions about the following video", "It is about ownership."),
];

impl TextModel for ScriptedModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        SCRIPT
            .iter()
            .find(|(marker, _)| prompt.contains(marker))
            .map(|(_, reply)| reply.to_string())
            .ok_or_else(|| tldw_core::ModelError::Other("unscripted prompt".to_string()).into())
    }
}

struct FixtureCaptions;

impl CaptionSource for FixtureCaptions {
    async fn fetch(&self, _video_id: &str) -> Result<TranscriptData> {
        Ok(fixture_transcript())
    }
}

async fn analyzed_record(store: &SessionStore, style: SummaryStyle) -> SessionRecord {
    let metadata = MetadataClient::new(None);
    let analyzer = Analyzer::new(ScriptedModel::new());
    let deps = PipelineDeps {
        metadata: &metadata,
        captions: &FixtureCaptions,
        analyzer: &analyzer,
        store: Some(store),
    };
    let request = AnalyzeRequest {
        url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=10s".to_string(),
        settings: AnalysisSettings {
            summary_type: style,
            ..Default::default()
        },
        save: true,
    };
    analyze_video(&request, &deps, &mut NoProgress)
        .await
        .expect("pipeline should succeed")
}

// ============================================
// Captions
// ============================================

#[test]
fn test_fixture_captions_parse() {
    let transcript = fixture_transcript();

    assert_eq!(transcript.total_segments, 4);
    assert_eq!(transcript.segments[0].text, "welcome to this introduction");
    assert_eq!(transcript.segments[1].text, "today we talk about ownership");
    assert_eq!(transcript.segments[3].timestamp, "01:00:05");
    assert!((transcript.total_duration - 3607.5).abs() < 1e-9);
    assert!(transcript.text.starts_with("welcome to this introduction today"));
}

#[test]
fn test_fixture_chapters_and_search() {
    let transcript = fixture_transcript();

    let chapters = transcript_chapters(&transcript);
    assert_eq!(chapters.len(), 2);
    assert_eq!(chapters[0].timestamp, "00:00");

    let hits = search_transcript(&transcript, "OWNERSHIP");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].timestamp, "00:04");
}

// ============================================
// Pipeline + session store
// ============================================

#[tokio::test]
async fn test_pipeline_persists_full_analysis() {
    tldw_core::logging::init_test();
    let dir = TempDir::new().unwrap();
    let store = SessionStore::open(dir.path()).unwrap();

    let record = analyzed_record(&store, SummaryStyle::Academic).await;
    let analysis = &record.analysis;

    assert_eq!(record.session_id.len(), 16);
    assert_eq!(record.video_info.video_id, "dQw4w9WgXcQ");
    assert_eq!(
        analysis.main_summary,
        "The talk introduces ownership and lifetimes."
    );
    assert_eq!(analysis.key_takeaways.len(), 2);
    assert_eq!(
        analysis.important_quotes,
        vec!["Ownership is the heart of Rust"]
    );
    assert_eq!(
        analysis.topics.as_deref(),
        Some(&["Ownership".to_string(), "Lifetimes".to_string()][..])
    );
    let sentiment = analysis.sentiment_analysis.unwrap();
    assert!((sentiment.positive - 0.6).abs() < 1e-9);
    assert!((sentiment.overall_score - 0.5).abs() < 1e-9);
    assert_eq!(analysis.timeline[1].timestamp, "00:09");
    assert_eq!(analysis.questions_and_answers.len(), 1);
    assert_eq!(
        analysis.study_notes.as_ref().unwrap().main_concepts,
        vec!["Ownership"]
    );
    assert!(analysis.business_insights.is_none());

    let loaded = store.load(&record.session_id).unwrap().unwrap();
    assert_eq!(loaded, record);
}

#[tokio::test]
async fn test_open_session_keeps_id_and_bumps_access() {
    let dir = TempDir::new().unwrap();
    let store = SessionStore::open(dir.path()).unwrap();
    let record = analyzed_record(&store, SummaryStyle::Brief).await;

    let opened = store.open_session(&record.session_id).unwrap().unwrap();
    assert_eq!(opened.session_id, record.session_id);
    assert!(opened.last_accessed >= record.last_accessed);
    assert_eq!(opened.created_at, record.created_at);

    let found = store.find_by_url(&record.url).unwrap().unwrap();
    assert_eq!(found.session_id, record.session_id);
}

#[tokio::test]
async fn test_listing_stats_and_history() {
    let dir = TempDir::new().unwrap();
    let store = SessionStore::open(dir.path()).unwrap();
    store.save_preferences(&UserPreferences::default()).unwrap();

    let first = analyzed_record(&store, SummaryStyle::Brief).await;
    let second = analyzed_record(&store, SummaryStyle::Brief).await;
    assert_ne!(first.session_id, second.session_id);

    let recent = store.recent(None).unwrap();
    assert_eq!(recent.len(), 2);
    assert!(recent.iter().all(|s| s.title == "Video dQw4w9WgXcQ"));

    let stats = store.stats().unwrap();
    assert_eq!(stats.total_sessions, 2);
    assert_eq!(stats.favorite_summary_type, Some(SummaryStyle::Brief));
    assert_eq!(stats.channels_analyzed[0].name, "Unknown Channel");
    assert_eq!(stats.channels_analyzed[0].count, 2);
    assert_eq!(stats.summary_type_distribution.get("Brief"), Some(&2));

    let history = store.history_export().unwrap();
    let json = serde_json::to_value(&history).unwrap();
    assert_eq!(json["export_info"]["type"], "session_history");
    assert_eq!(json["export_info"]["total_sessions"], 2);

    assert_eq!(store.search("dqw4", 10).unwrap().len(), 2);
    assert!(store.search("nothing like this", 10).unwrap().is_empty());
}

#[tokio::test]
async fn test_cleanup_removes_only_stale_sessions() {
    let dir = TempDir::new().unwrap();
    let store = SessionStore::open(dir.path()).unwrap();
    store.save_preferences(&UserPreferences::default()).unwrap();

    let stale = analyzed_record(&store, SummaryStyle::Brief).await;
    let fresh = analyzed_record(&store, SummaryStyle::Brief).await;

    let old = SystemTime::now() - Duration::from_secs(40 * 24 * 60 * 60);
    let stale_path = dir.path().join(format!("{}.json", stale.session_id));
    File::options()
        .write(true)
        .open(&stale_path)
        .unwrap()
        .set_modified(old)
        .unwrap();
    File::options()
        .write(true)
        .open(dir.path().join(PREFERENCES_FILE))
        .unwrap()
        .set_modified(old)
        .unwrap();

    assert_eq!(store.cleanup_older_than(30).unwrap(), 1);
    assert!(store.load(&stale.session_id).unwrap().is_none());
    assert!(store.load(&fresh.session_id).unwrap().is_some());
    assert!(dir.path().join(PREFERENCES_FILE).exists());
}

#[tokio::test]
async fn test_cleanup_with_huge_day_count_keeps_everything() {
    let dir = TempDir::new().unwrap();
    let store = SessionStore::open(dir.path()).unwrap();
    assert_eq!(store.cleanup_older_than(u64::MAX / 1000).unwrap(), 0);

    let record = analyzed_record(&store, SummaryStyle::Brief).await;
    assert_eq!(store.cleanup_older_than(u64::MAX).unwrap(), 0);
    assert!(store.load(&record.session_id).unwrap().is_some());
}

#[tokio::test]
async fn test_delete_session() {
    let dir = TempDir::new().unwrap();
    let store = SessionStore::open(dir.path()).unwrap();
    let record = analyzed_record(&store, SummaryStyle::Brief).await;

    assert!(store.delete(&record.session_id).unwrap());
    assert!(!store.delete(&record.session_id).unwrap());
    let err = store.require(&record.session_id).unwrap_err();
    assert!(matches!(err, TldwError::SessionNotFound { .. }));
}

#[test]
fn test_preferences_survive_corruption() {
    let dir = TempDir::new().unwrap();
    let store = SessionStore::open(dir.path()).unwrap();

    let mut prefs = UserPreferences::default();
    assert!(prefs.set("summary_type", "Business"));
    assert!(prefs.set("max_session_history", "9000"));
    store.save_preferences(&prefs).unwrap();

    let loaded = store.load_preferences();
    assert_eq!(loaded.default_summary_type, SummaryStyle::Business);
    assert_eq!(loaded.max_session_history, 500);

    fs::write(dir.path().join(PREFERENCES_FILE), "{ not json").unwrap();
    assert_eq!(store.load_preferences(), UserPreferences::default());
}

#[test]
fn test_preferences_one_bad_field_keeps_the_rest() {
    let dir = TempDir::new().unwrap();
    let store = SessionStore::open(dir.path()).unwrap();
    fs::write(
        dir.path().join(PREFERENCES_FILE),
        r#"{"default_summary_type":"Business","max_session_history":-1}"#,
    )
    .unwrap();

    let loaded = store.load_preferences();
    assert_eq!(loaded.default_summary_type, SummaryStyle::Business);
    assert_eq!(loaded.max_session_history, 50);
}

// ============================================
// Export + chat over a stored session
// ============================================

#[tokio::test]
async fn test_export_stored_session() {
    let dir = TempDir::new().unwrap();
    let store = SessionStore::open(dir.path()).unwrap();
    let record = analyzed_record(&store, SummaryStyle::Academic).await;
    let exporter = Exporter::text_only();

    let report = exporter
        .export_full_report(
            &record.analysis,
            &record.transcript,
            &record.video_info,
            ExportFormat::Text,
        )
        .unwrap();
    let text = String::from_utf8(report.bytes).unwrap();
    assert!(text.contains("COMPREHENSIVE VIDEO ANALYSIS REPORT"));
    assert!(text.contains("Ownership, Lifetimes"));
    assert!(text.contains("00:00: Introduction"));
    assert!(text.contains("STUDY NOTES"));
    assert!(text.contains("Total Segments: 4"));

    let json = exporter
        .export_summary(&record.analysis, ExportFormat::Json)
        .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&json.bytes).unwrap();
    assert_eq!(value["sentiment_analysis"]["positive"], 0.6);
}

#[tokio::test]
async fn test_chat_over_stored_session() {
    let dir = TempDir::new().unwrap();
    let store = SessionStore::open(dir.path()).unwrap();
    let record = analyzed_record(&store, SummaryStyle::Brief).await;

    let analyzer = Analyzer::new(ScriptedModel::new());
    let mut chat = ChatSession::for_record(&record);
    let answer = chat
        .ask(&analyzer, "What is the key takeaway?")
        .await
        .unwrap()
        .map(|m| m.content.clone());

    assert_eq!(answer.as_deref(), Some("It is about ownership."));
    assert_eq!(
        chat.suggestions()[0],
        "Can you elaborate on any of these points?"
    );
    let prompts = analyzer.model().prompts.lock().unwrap();
    assert!(prompts[0].contains("welcome to this introduction"));
}

#[test]
fn test_placeholder_video_info_shape() {
    let info = VideoInfo::placeholder("dQw4w9WgXcQ", "https://youtu.be/dQw4w9WgXcQ");
    assert_eq!(
        info.thumbnail,
        "https://img.youtube.com/vi/dQw4w9WgXcQ/maxresdefault.jpg"
    );
    assert_eq!(info.duration, "Unknown");
}
