pub mod ai;
pub mod chat;
pub mod config;
pub mod error;
pub mod export;
pub mod format;
pub mod logging;
pub mod pipeline;
pub mod prompts;
pub mod provider;
pub mod session;
pub mod settings;
pub mod types;
pub mod validate;
pub mod youtube;

pub use ai::{AnalysisRequest, Analyzer, ChatCompletionsModel, Facet, ModelError, TextModel};
pub use chat::{ChatMessage, ChatSession, Rating, Role};
pub use config::Config;
pub use error::{Result, TldwError};
pub use export::{ExportArtifact, ExportKind, Exporter};
pub use format::{format_session_readable, format_timestamp, format_transcript_with_timestamps};
pub use pipeline::{AnalyzeRequest, PipelineDeps, Progress, Step, analyze_video};
pub use provider::{Provider, ProviderConfig};
pub use session::{SessionStore, SessionSummary};
pub use settings::{AnalysisSettings, ExportFormat, OutputLanguage, SummaryStyle, UserPreferences};
pub use types::{AnalysisResult, SessionRecord, TranscriptData, VideoInfo};
pub use youtube::{CaptionError, CaptionSource, MetadataClient, YtDlpCaptions};
