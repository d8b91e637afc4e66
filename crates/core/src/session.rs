//! Saved analysis sessions: one pretty-printed JSON file per session.

use std::{
    collections::{BTreeMap, VecDeque},
    fs,
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{
    error::{Result, TldwError},
    settings::{SummaryStyle, UserPreferences},
    types::SessionRecord,
    validate::{QueryParams, SortKey, SortOrder},
};

pub const PREFERENCES_FILE: &str = "user_preferences.json";
const SESSION_ID_LEN: usize = 16;
const TOP_CHANNELS: usize = 5;

/// Listing entry read from a session file without loading the transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub title: String,
    pub channel: String,
    pub duration: String,
    pub created_at: Option<DateTime<Utc>>,
    pub last_accessed: Option<DateTime<Utc>>,
    pub summary_type: SummaryStyle,
    pub url: String,
}

/// Just the fields a listing needs; everything else in the file is ignored
#[derive(Deserialize)]
struct SummaryFields {
    #[serde(default)]
    session_id: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    video_info: VideoFields,
    #[serde(default)]
    settings: SettingsFields,
    created_at: Option<DateTime<Utc>>,
    last_accessed: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(default)]
struct VideoFields {
    title: String,
    channel: String,
    duration: String,
}

impl Default for VideoFields {
    fn default() -> Self {
        Self {
            title: "Unknown Video".to_string(),
            channel: "Unknown Channel".to_string(),
            duration: "Unknown".to_string(),
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct SettingsFields {
    summary_type: SummaryStyle,
}

impl From<SummaryFields> for SessionSummary {
    fn from(fields: SummaryFields) -> Self {
        Self {
            session_id: fields.session_id,
            title: fields.video_info.title,
            channel: fields.video_info.channel,
            duration: fields.video_info.duration,
            created_at: fields.created_at,
            last_accessed: fields.last_accessed,
            summary_type: fields.settings.summary_type,
            url: fields.url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStats {
    pub total_sessions: usize,
    pub total_videos_analyzed: usize,
    pub favorite_summary_type: Option<SummaryStyle>,
    pub most_active_day: Option<NaiveDate>,
    pub channels_analyzed: Vec<ChannelCount>,
    pub summary_type_distribution: BTreeMap<String, usize>,
    pub activity_by_date: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryExportInfo {
    #[serde(rename = "type")]
    pub kind: String,
    pub generated_at: DateTime<Utc>,
    pub total_sessions: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryExport {
    pub export_info: HistoryExportInfo,
    pub sessions: Vec<SessionSummary>,
}

/// Counts in first-seen order so ties resolve to the most recent entry
fn tally<T: PartialEq>(items: impl IntoIterator<Item = T>) -> Vec<(T, usize)> {
    let mut counts: Vec<(T, usize)> = Vec::new();
    for item in items {
        match counts.iter_mut().find(|(seen, _)| *seen == item) {
            Some((_, n)) => *n += 1,
            None => counts.push((item, 1)),
        }
    }
    counts
}

fn most_common<T: Clone>(counts: &[(T, usize)]) -> Option<T> {
    let max = counts.iter().map(|(_, n)| *n).max()?;
    counts
        .iter()
        .find(|(_, n)| *n == max)
        .map(|(item, _)| item.clone())
}

/// First 16 hex chars of SHA-256 over url + timestamp
pub fn generate_session_id(url: &str, at: DateTime<Utc>) -> String {
    let digest = Sha256::digest(format!("{}{}", url, at.to_rfc3339()).as_bytes());
    let mut id = hex::encode(digest);
    id.truncate(SESSION_ID_LEN);
    id
}

/// Session ids become file names, so only plain ids are accepted
fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    /// Open a store rooted at `dir`, creating it if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn session_path(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{session_id}.json"))
    }

    /// Write through a temp file so a crash never leaves half a session
    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = self.dir.join(format!(".{file_name}.tmp"));
        fs::write(&tmp, serde_json::to_string_pretty(value)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Persist a new session; assigns its id and timestamps
    pub fn save(&self, record: &mut SessionRecord) -> Result<String> {
        let now = Utc::now();
        let session_id = generate_session_id(&record.url, now);

        record.session_id = session_id.clone();
        record.created_at = now;
        record.last_accessed = now;

        self.write_json(&self.session_path(&session_id), record)?;
        tracing::info!(session_id = %session_id, url = %record.url, "session saved");
        Ok(session_id)
    }

    /// Read a session without touching it
    pub fn load(&self, session_id: &str) -> Result<Option<SessionRecord>> {
        if !is_valid_session_id(session_id) {
            return Ok(None);
        }
        let path = self.session_path(session_id);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Load a session and record the access; the id stays the same
    pub fn open_session(&self, session_id: &str) -> Result<Option<SessionRecord>> {
        let Some(mut record) = self.load(session_id)? else {
            return Ok(None);
        };
        record.last_accessed = Utc::now();
        self.write_json(&self.session_path(session_id), &record)?;
        Ok(Some(record))
    }

    /// Like `open_session` but a missing session is an error
    pub fn require(&self, session_id: &str) -> Result<SessionRecord> {
        self.open_session(session_id)?
            .ok_or_else(|| TldwError::SessionNotFound {
                session_id: session_id.to_string(),
            })
    }

    /// Session files, newest modification first
    fn session_files(&self) -> Result<Vec<(PathBuf, SystemTime)>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            let is_session = path.extension().is_some_and(|ext| ext == "json")
                && path.file_name().is_some_and(|name| name != PREFERENCES_FILE);
            if !is_session {
                continue;
            }
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            files.push((path, modified));
        }
        files.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(files)
    }

    fn read_summary(path: &Path) -> Result<SessionSummary> {
        let content = fs::read_to_string(path)?;
        let fields: SummaryFields = serde_json::from_str(&content)?;
        Ok(fields.into())
    }

    /// Most recently modified sessions; unreadable files are skipped
    pub fn recent(&self, limit: Option<usize>) -> Result<Vec<SessionSummary>> {
        let mut sessions = Vec::new();
        for (path, _) in self.session_files()? {
            if limit.is_some_and(|limit| sessions.len() >= limit) {
                break;
            }
            match Self::read_summary(&path) {
                Ok(summary) => sessions.push(summary),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable session file");
                }
            }
        }
        Ok(sessions)
    }

    pub fn delete(&self, session_id: &str) -> Result<bool> {
        if !is_valid_session_id(session_id) {
            return Ok(false);
        }
        let path = self.session_path(session_id);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)?;
        tracing::info!(session_id, "session deleted");
        Ok(true)
    }

    /// Remove sessions not modified for `days` days; returns how many went
    pub fn cleanup_older_than(&self, days: u64) -> Result<usize> {
        let cutoff = SystemTime::now()
            .checked_sub(Duration::from_secs(days.saturating_mul(24 * 60 * 60)))
            .unwrap_or(SystemTime::UNIX_EPOCH);

        let mut deleted = 0;
        for (path, modified) in self.session_files()? {
            if modified >= cutoff {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => deleted += 1,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "could not remove old session");
                }
            }
        }
        tracing::info!(deleted, days, "old sessions cleaned up");
        Ok(deleted)
    }

    /// Case-insensitive match on title, then channel
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<SessionSummary>> {
        let query = query.trim().to_lowercase();
        Ok(self
            .recent(None)?
            .into_iter()
            .filter(|s| {
                s.title.to_lowercase().contains(&query) || s.channel.to_lowercase().contains(&query)
            })
            .take(limit)
            .collect())
    }

    /// Most recent session for exactly this URL
    pub fn find_by_url(&self, url: &str) -> Result<Option<SessionRecord>> {
        let found = self.recent(None)?.into_iter().find(|s| s.url == url);
        match found {
            Some(summary) => self.open_session(&summary.session_id),
            None => Ok(None),
        }
    }

    pub fn stats(&self) -> Result<SessionStats> {
        let sessions = self.recent(None)?;

        let styles = tally(sessions.iter().map(|s| s.summary_type));
        let mut channels = tally(sessions.iter().map(|s| s.channel.clone()));
        let dates = tally(
            sessions
                .iter()
                .filter_map(|s| s.created_at.map(|at| at.date_naive())),
        );

        let favorite_summary_type = most_common(&styles);
        let most_active_day = most_common(&dates);
        channels.sort_by(|a, b| b.1.cmp(&a.1));

        Ok(SessionStats {
            total_sessions: sessions.len(),
            total_videos_analyzed: sessions.len(),
            favorite_summary_type,
            most_active_day,
            channels_analyzed: channels
                .into_iter()
                .take(TOP_CHANNELS)
                .map(|(name, count)| ChannelCount { name, count })
                .collect(),
            summary_type_distribution: styles
                .into_iter()
                .map(|(style, n)| (style.label().to_string(), n))
                .collect(),
            activity_by_date: dates
                .into_iter()
                .map(|(date, n)| (date.to_string(), n))
                .collect(),
        })
    }

    pub fn history_export(&self) -> Result<HistoryExport> {
        let sessions = self.recent(None)?;
        Ok(HistoryExport {
            export_info: HistoryExportInfo {
                kind: "session_history".to_string(),
                generated_at: Utc::now(),
                total_sessions: sessions.len(),
            },
            sessions,
        })
    }

    pub fn save_preferences(&self, preferences: &UserPreferences) -> Result<()> {
        self.write_json(&self.dir.join(PREFERENCES_FILE), preferences)
    }

    /// Stored preferences, or defaults when missing or unreadable
    pub fn load_preferences(&self) -> UserPreferences {
        let path = self.dir.join(PREFERENCES_FILE);
        if !path.exists() {
            return UserPreferences::default();
        }
        let loaded = fs::read_to_string(&path)
            .map_err(TldwError::from)
            .and_then(|content| serde_json::from_str::<serde_json::Value>(&content).map_err(Into::into));
        match loaded {
            Ok(raw) => UserPreferences::from_json(&raw),
            Err(e) => {
                tracing::warn!(error = %e, "could not load preferences, using defaults");
                UserPreferences::default()
            }
        }
    }
}

/// Filter, order and cap a listing as `params` asks. Sessions whose
/// duration is unknown sort before every timed one.
pub fn apply_query(mut sessions: Vec<SessionSummary>, params: &QueryParams) -> Vec<SessionSummary> {
    let query = params.query.to_lowercase();
    if !query.is_empty() {
        sessions.retain(|s| {
            s.title.to_lowercase().contains(&query) || s.channel.to_lowercase().contains(&query)
        });
    }

    match params.sort {
        SortKey::CreatedAt => sessions.sort_by_key(|s| s.created_at),
        SortKey::Title => sessions.sort_by_key(|s| s.title.to_lowercase()),
        SortKey::Channel => sessions.sort_by_key(|s| s.channel.to_lowercase()),
        SortKey::Duration => sessions.sort_by_key(|s| duration_secs(&s.duration)),
    }
    if params.order == SortOrder::Desc {
        sessions.reverse();
    }
    sessions.truncate(params.limit);
    sessions
}

/// `H:MM:SS` or `M:SS`
fn duration_secs(duration: &str) -> Option<u64> {
    duration
        .split(':')
        .try_fold(0u64, |total, part| Some(total * 60 + part.trim().parse::<u64>().ok()?))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryItem {
    pub session_id: String,
    pub title: String,
    pub timestamp: DateTime<Utc>,
    pub summary_type: SummaryStyle,
}

/// Most-recent-first list of sessions touched in this process
#[derive(Debug, Clone)]
pub struct RecentHistory {
    items: VecDeque<HistoryItem>,
    capacity: usize,
}

impl RecentHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, record: &SessionRecord) {
        self.items.push_front(HistoryItem {
            session_id: record.session_id.clone(),
            title: record.video_info.title.clone(),
            timestamp: record.created_at,
            summary_type: record.settings.summary_type,
        });
        self.items.truncate(self.capacity);
    }

    pub fn items(&self) -> impl Iterator<Item = &HistoryItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_shape() {
        let at = Utc::now();
        let id = generate_session_id("https://youtu.be/abc12345678", at);
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id, generate_session_id("https://youtu.be/abc12345678", at));
        assert_ne!(id, generate_session_id("https://youtu.be/xyz12345678", at));
    }

    #[test]
    fn test_rejects_path_like_ids() {
        assert!(is_valid_session_id("0123abcd"));
        assert!(!is_valid_session_id("../secrets"));
        assert!(!is_valid_session_id(""));
    }

    #[test]
    fn test_tally_ties_go_to_first_seen() {
        let counts = tally(["b", "a", "a", "b", "c"]);
        assert_eq!(counts, vec![("b", 2), ("a", 2), ("c", 1)]);
        assert_eq!(most_common(&counts), Some("b"));
        assert_eq!(most_common::<&str>(&[]), None);
    }

    #[test]
    fn test_summary_fields_default_when_missing() {
        let fields: SummaryFields = serde_json::from_str(r#"{"session_id": "x"}"#).unwrap();
        let summary = SessionSummary::from(fields);
        assert_eq!(summary.title, "Unknown Video");
        assert_eq!(summary.channel, "Unknown Channel");
        assert_eq!(summary.summary_type, SummaryStyle::Comprehensive);
        assert!(summary.created_at.is_none());
    }

    fn summary(title: &str, channel: &str, duration: &str, day: u32) -> SessionSummary {
        SessionSummary {
            session_id: format!("{day:016x}"),
            title: title.to_string(),
            channel: channel.to_string(),
            duration: duration.to_string(),
            created_at: Some(
                DateTime::parse_from_rfc3339(&format!("2024-05-{day:02}T10:00:00Z"))
                    .unwrap()
                    .with_timezone(&Utc),
            ),
            last_accessed: None,
            summary_type: SummaryStyle::Brief,
            url: String::new(),
        }
    }

    #[test]
    fn test_apply_query_filters_sorts_and_caps() {
        let sessions = vec![
            summary("Rust ownership", "Rust Talks", "1:02:03", 1),
            summary("Async in depth", "Tokio", "45:10", 3),
            summary("Borrow checker", "Rust Talks", "Unknown", 2),
        ];

        let params = QueryParams::sanitized(None, Some("rust"), Some("duration"), Some("asc"));
        let titles: Vec<String> = apply_query(sessions.clone(), &params)
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, vec!["Borrow checker", "Rust ownership"]);

        let params = QueryParams::sanitized(Some("2"), None, None, None);
        let titles: Vec<String> = apply_query(sessions, &params)
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, vec!["Async in depth", "Borrow checker"]);
    }

    #[test]
    fn test_duration_secs() {
        assert_eq!(duration_secs("1:02:03"), Some(3723));
        assert_eq!(duration_secs("45:10"), Some(2710));
        assert_eq!(duration_secs("Unknown"), None);
    }
}
