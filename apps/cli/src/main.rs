use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use tldw_core::{
    AnalysisSettings, AnalyzeRequest, Analyzer, ChatCompletionsModel, Config, ExportFormat,
    ExportKind, Exporter, MetadataClient, OutputLanguage, PipelineDeps, Provider, SessionStore,
    SummaryStyle, UserPreferences, YtDlpCaptions, analyze_video,
    export::{ExportArtifact, file_name},
    format::format_session_readable,
    logging,
    session::{RecentHistory, apply_query},
    types::SessionRecord,
    validate::{QueryParams, extract_video_id, validate_youtube_url},
};

use crate::ui::{
    SpinnerProgress, check, create_spinner, format_duration, header, print_session_list,
    print_stats, print_video_info, rule,
};

mod repl;
mod ui;

/// CLI wrapper for Provider enum (needed for clap ValueEnum)
#[derive(Clone, Copy, ValueEnum)]
enum CliProvider {
    Gemini,
    Openai,
    Grok,
}

impl From<CliProvider> for Provider {
    fn from(cli: CliProvider) -> Self {
        match cli {
            CliProvider::Gemini => Provider::Gemini,
            CliProvider::Openai => Provider::Openai,
            CliProvider::Grok => Provider::Grok,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CliExportKind {
    Summary,
    Report,
    Transcript,
}

impl From<CliExportKind> for ExportKind {
    fn from(cli: CliExportKind) -> Self {
        match cli {
            CliExportKind::Summary => ExportKind::Summary,
            CliExportKind::Report => ExportKind::FullReport,
            CliExportKind::Transcript => ExportKind::Transcript,
        }
    }
}

fn parse_style(input: &str) -> Result<SummaryStyle, String> {
    SummaryStyle::parse_label(input).ok_or_else(|| {
        let known: Vec<&str> = SummaryStyle::ALL.iter().map(|s| s.label()).collect();
        format!("unknown style, expected one of: {}", known.join(", "))
    })
}

fn parse_language(input: &str) -> Result<OutputLanguage, String> {
    OutputLanguage::parse_label(input).ok_or_else(|| {
        let known: Vec<&str> = OutputLanguage::ALL.iter().map(|l| l.label()).collect();
        format!("unknown language, expected one of: {}", known.join(", "))
    })
}

fn parse_format(input: &str) -> Result<ExportFormat, String> {
    Ok(ExportFormat::normalize(input))
}

#[derive(Parser)]
#[command(name = "tldw")]
#[command(about = "Analyze YouTube videos from their transcripts: summaries, insights, chat and export")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze one or more videos
    Analyze {
        /// Video URL(s)
        #[arg(required = true)]
        urls: Vec<String>,

        /// Summary style (Comprehensive, Brief, Bullet Points, Academic, Business, Creative)
        #[arg(short, long, value_parser = parse_style)]
        style: Option<SummaryStyle>,

        /// Output language (e.g. "English", "es", "ja")
        #[arg(short, long, value_parser = parse_language)]
        lang: Option<OutputLanguage>,

        #[arg(long)]
        no_timestamps: bool,

        #[arg(long)]
        no_sentiment: bool,

        #[arg(long)]
        no_topics: bool,

        /// Export format (pdf, word, text, json)
        #[arg(short, long, value_parser = parse_format)]
        format: Option<ExportFormat>,

        /// Also write an export file after analysis
        #[arg(short, long)]
        export: Option<CliExportKind>,

        /// Directory for export files
        #[arg(short, long, default_value = ".")]
        out: PathBuf,

        /// AI provider for analysis
        #[arg(short, long)]
        provider: Option<CliProvider>,

        /// Do not save the session
        #[arg(long)]
        no_save: bool,
    },

    /// Show video details without analyzing
    Info { url: String },

    /// Ask follow-up questions about a saved session
    Chat {
        session_id: String,

        #[arg(short, long)]
        provider: Option<CliProvider>,
    },

    /// Manage saved sessions
    Sessions {
        #[command(subcommand)]
        command: SessionsCommand,
    },

    /// Export a saved session
    Export {
        session_id: String,

        kind: CliExportKind,

        /// Defaults to the session's export format
        #[arg(short, long, value_parser = parse_format)]
        format: Option<ExportFormat>,

        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },

    /// Show or change preferences
    Prefs {
        #[command(subcommand)]
        command: PrefsCommand,
    },

    /// Check a URL and print its video id
    Validate { url: String },
}

#[derive(Subcommand)]
enum SessionsCommand {
    /// List recent sessions
    List {
        #[arg(short, long)]
        limit: Option<usize>,

        /// Only sessions whose title or channel contains this
        #[arg(short, long)]
        query: Option<String>,

        /// created, title, channel or duration
        #[arg(short, long)]
        sort: Option<String>,

        /// asc or desc
        #[arg(short, long)]
        order: Option<String>,
    },
    /// Print a saved session
    Show { session_id: String },
    Delete { session_id: String },
    /// Search sessions by title or channel
    Search {
        query: String,

        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Remove sessions older than the configured timeout
    Cleanup {
        #[arg(short, long)]
        days: Option<u64>,
    },
    Stats,
    /// Write the session history as JSON
    History {
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum PrefsCommand {
    Show,
    /// Set a preference, e.g. `prefs set default_summary_type Brief`
    Set { key: String, value: String },
}

fn build_analyzer(
    config: &Config,
    provider: Option<CliProvider>,
) -> Result<Analyzer<ChatCompletionsModel>> {
    let mut model_config = config.model.clone();
    if let Some(provider) = provider.map(Provider::from) {
        if provider != model_config.provider {
            // keys and model names belong to the configured provider
            model_config.provider = provider;
            model_config.api_key = provider.env_api_key();
            model_config.model = None;
        }
    }
    let model = ChatCompletionsModel::from_config(&model_config)?;
    tracing::info!(
        provider = model.provider().name(),
        model = model.model_name(),
        "model ready"
    );
    Ok(Analyzer::new(model).with_limits(config.analysis.clone()))
}

async fn write_artifact(
    artifact: &ExportArtifact,
    kind: ExportKind,
    video_id: &str,
    requested: ExportFormat,
    out: &Path,
) -> Result<PathBuf> {
    tokio::fs::create_dir_all(out)
        .await
        .with_context(|| format!("failed to create {}", out.display()))?;
    let path = out.join(file_name(kind, video_id, artifact.format, chrono::Local::now()));
    tokio::fs::write(&path, &artifact.bytes)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;

    if artifact.format != requested {
        println!(
            "{} {} support is not compiled in, wrote plain text instead",
            style("!").yellow().bold(),
            requested
        );
    }
    println!(
        "{} Exported {}: {}",
        check(),
        artifact.mime_type(),
        style(path.display()).cyan()
    );
    Ok(path)
}

async fn export_record(
    record: &SessionRecord,
    kind: ExportKind,
    format: ExportFormat,
    out: &Path,
) -> Result<PathBuf> {
    let exporter = Exporter::new();
    let artifact = match kind {
        ExportKind::Summary => exporter.export_summary(&record.analysis, format)?,
        ExportKind::FullReport => exporter.export_full_report(
            &record.analysis,
            &record.transcript,
            &record.video_info,
            format,
        )?,
        ExportKind::Transcript => {
            exporter.export_transcript(&record.transcript, record.settings.include_timestamps)
        }
    };
    let requested = if kind == ExportKind::Transcript {
        ExportFormat::Text
    } else {
        format
    };
    write_artifact(&artifact, kind, &record.video_info.video_id, requested, out).await
}

struct AnalyzeOptions {
    style: Option<SummaryStyle>,
    lang: Option<OutputLanguage>,
    no_timestamps: bool,
    no_sentiment: bool,
    no_topics: bool,
    format: Option<ExportFormat>,
}

impl AnalyzeOptions {
    fn settings(&self, preferences: &UserPreferences) -> AnalysisSettings {
        let defaults = preferences.analysis_settings();
        AnalysisSettings {
            summary_type: self.style.unwrap_or(defaults.summary_type),
            language: self.lang.unwrap_or(defaults.language),
            include_timestamps: defaults.include_timestamps && !self.no_timestamps,
            include_sentiment: defaults.include_sentiment && !self.no_sentiment,
            include_topics: defaults.include_topics && !self.no_topics,
            export_format: self.format.unwrap_or(defaults.export_format),
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn cmd_analyze(
    config: &Config,
    store: &SessionStore,
    urls: Vec<String>,
    options: AnalyzeOptions,
    export: Option<CliExportKind>,
    out: PathBuf,
    provider: Option<CliProvider>,
    no_save: bool,
) -> Result<()> {
    let preferences = store.load_preferences();
    let settings = options.settings(&preferences);
    let analyzer = build_analyzer(config, provider)?;
    let metadata = MetadataClient::new(config.youtube.api_key.clone());
    let captions = YtDlpCaptions::new(&config.youtube.ytdlp);
    let deps = PipelineDeps {
        metadata: &metadata,
        captions: &captions,
        analyzer: &analyzer,
        store: Some(store),
    };

    header("Video Analyzer");
    println!(
        "{} {} · {} · {}",
        check(),
        analyzer.model().provider().name(),
        style(settings.summary_type).yellow(),
        settings.language
    );

    let mut history = RecentHistory::new(preferences.max_session_history);
    let mut failures = 0;

    for url in urls {
        rule();
        let total_start = Instant::now();
        let request = AnalyzeRequest {
            url,
            settings: settings.clone(),
            save: preferences.auto_save_sessions && !no_save,
        };

        let mut progress = SpinnerProgress::default();
        let record = match analyze_video(&request, &deps, &mut progress).await {
            Ok(record) => record,
            Err(e) => {
                drop(progress);
                eprintln!("{} {}: {}", style("Error:").red().bold(), request.url, e);
                failures += 1;
                continue;
            }
        };

        println!(
            "\n{} {}\n",
            style("Total time:").dim(),
            style(format_duration(total_start.elapsed())).cyan().bold()
        );
        if !record.session_id.is_empty() {
            println!(
                "{} {}\n",
                style("Session:").dim(),
                style(&record.session_id).cyan()
            );
        }
        rule();
        println!("{}", format_session_readable(&record));

        history.push(&record);
        if let Some(kind) = export {
            if let Err(e) =
                export_record(&record, kind.into(), settings.export_format, &out).await
            {
                eprintln!("{} {:#}", style("Export failed:").red().bold(), e);
                failures += 1;
            }
        }
    }

    if history.len() > 1 {
        rule();
        println!("{}", style("This run").bold());
        for item in history.items() {
            println!(
                "  {}  {}",
                style(if item.session_id.is_empty() {
                    "(not saved)"
                } else {
                    item.session_id.as_str()
                })
                .cyan(),
                item.title
            );
        }
    }

    if failures > 0 {
        bail!("{failures} video(s) could not be analyzed or exported");
    }
    Ok(())
}

async fn cmd_info(config: &Config, url: &str) -> Result<()> {
    if !validate_youtube_url(url) {
        bail!("Invalid YouTube URL: {url}");
    }
    let video_id =
        extract_video_id(url).with_context(|| format!("could not find a video id in {url}"))?;
    let metadata = MetadataClient::new(config.youtube.api_key.clone());
    if !metadata.has_api_key() {
        println!(
            "{}",
            style("No YouTube API key configured, showing basic details only").dim()
        );
    }
    let spinner = create_spinner("Fetching video info...");
    let info = metadata.video_info(&video_id, url).await;
    spinner.finish_and_clear();
    print_video_info(&info);
    Ok(())
}

async fn cmd_sessions(config: &Config, store: &SessionStore, command: SessionsCommand) -> Result<()> {
    match command {
        SessionsCommand::List {
            limit,
            query,
            sort,
            order,
        } => {
            let limit = limit
                .unwrap_or(store.load_preferences().max_session_history)
                .to_string();
            let params = QueryParams::sanitized(
                Some(&limit),
                query.as_deref(),
                sort.as_deref(),
                order.as_deref(),
            );
            print_session_list(&apply_query(store.recent(None)?, &params));
        }
        SessionsCommand::Show { session_id } => {
            let record = store.require(&session_id)?;
            println!("{}", format_session_readable(&record));
        }
        SessionsCommand::Delete { session_id } => {
            if store.delete(&session_id)? {
                println!("{} Deleted {}", check(), style(&session_id).cyan());
            } else {
                bail!("Session not found: {session_id}");
            }
        }
        SessionsCommand::Search { query, limit } => {
            print_session_list(&store.search(&query, limit)?);
        }
        SessionsCommand::Cleanup { days } => {
            let days = days.unwrap_or(config.session.timeout_days);
            let removed = store.cleanup_older_than(days)?;
            println!(
                "{} Removed {} session(s) older than {} days",
                check(),
                removed,
                days
            );
        }
        SessionsCommand::Stats => print_stats(&store.stats()?),
        SessionsCommand::History { out } => {
            let json = serde_json::to_string_pretty(&store.history_export()?)?;
            match out {
                Some(path) => {
                    tokio::fs::write(&path, json)
                        .await
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("{} Exported: {}", check(), style(path.display()).cyan());
                }
                None => println!("{json}"),
            }
        }
    }
    Ok(())
}

fn cmd_prefs(store: &SessionStore, command: PrefsCommand) -> Result<()> {
    let mut preferences = store.load_preferences();
    match command {
        PrefsCommand::Show => {
            println!("{}", serde_json::to_string_pretty(&preferences)?);
        }
        PrefsCommand::Set { key, value } => {
            if !preferences.set(&key, &value) {
                bail!("Unknown preference: {key}");
            }
            store.save_preferences(&preferences)?;
            println!("{} Saved {} preferences", check(), style(&key).cyan());
        }
    }
    Ok(())
}

fn cmd_validate(url: &str) -> Result<()> {
    if !validate_youtube_url(url) {
        bail!("Invalid YouTube URL: {url}");
    }
    match extract_video_id(url) {
        Some(id) => {
            println!("{} Valid YouTube URL, video id {}", check(), style(id).cyan());
            Ok(())
        }
        None => bail!("YouTube URL without a video id: {url}"),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let _log_guard = logging::init(&config.logging)?;
    let store = SessionStore::open(config.sessions_dir())
        .with_context(|| format!("failed to open {}", config.sessions_dir().display()))?;

    match cli.command {
        Command::Analyze {
            urls,
            style,
            lang,
            no_timestamps,
            no_sentiment,
            no_topics,
            format,
            export,
            out,
            provider,
            no_save,
        } => {
            let options = AnalyzeOptions {
                style,
                lang,
                no_timestamps,
                no_sentiment,
                no_topics,
                format,
            };
            cmd_analyze(&config, &store, urls, options, export, out, provider, no_save).await
        }
        Command::Info { url } => cmd_info(&config, &url).await,
        Command::Chat {
            session_id,
            provider,
        } => {
            let record = store.require(&session_id)?;
            let analyzer = build_analyzer(&config, provider)?;
            header("Chat");
            repl::run(&record, &analyzer).await
        }
        Command::Sessions { command } => cmd_sessions(&config, &store, command).await,
        Command::Export {
            session_id,
            kind,
            format,
            out,
        } => {
            let record = store.require(&session_id)?;
            let format = format.unwrap_or(record.settings.export_format);
            export_record(&record, kind.into(), format, &out).await?;
            Ok(())
        }
        Command::Prefs { command } => cmd_prefs(&store, command),
        Command::Validate { url } => cmd_validate(&url),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}
