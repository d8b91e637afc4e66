//! Analysis settings and user preferences.
//!
//! Every enumerated setting deserializes leniently: an unknown label falls
//! back to the documented default instead of failing the whole record.

use serde::{Deserialize, Serialize};
use serde_json::Value;

macro_rules! labeled_enum {
    (
        $(#[$meta:meta])*
        $name:ident, default = $default:ident, {
            $($variant:ident => $label:literal $(| $alias:literal)*),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $(
                #[doc = $label]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            /// Strict lookup: exact label, case-insensitive label or kebab-case alias.
            pub fn parse_label(input: &str) -> Option<Self> {
                let wanted = input.trim();
                let kebab = wanted.to_lowercase().replace([' ', '_'], "-");
                $(
                    if wanted.eq_ignore_ascii_case($label)
                        || kebab == $label.to_lowercase().replace(' ', "-")
                        $(|| kebab == $alias)*
                    {
                        return Some($name::$variant);
                    }
                )+
                None
            }

            /// Lenient lookup: unknown input clamps to the default.
            pub fn from_label(input: &str) -> Self {
                Self::parse_label(input).unwrap_or_default()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::from_label(&value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.label().to_string()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }
    };
}

labeled_enum!(
    /// Summary style requested from the model.
    SummaryStyle, default = Comprehensive, {
        Comprehensive => "Comprehensive",
        Brief => "Brief",
        BulletPoints => "Bullet Points" | "bullets",
        Academic => "Academic",
        Business => "Business",
        Creative => "Creative",
    }
);

labeled_enum!(
    /// Language the model writes its output in.
    OutputLanguage, default = English, {
        English => "English" | "en",
        Spanish => "Spanish" | "es",
        French => "French" | "fr",
        German => "German" | "de",
        Chinese => "Chinese" | "zh",
        Japanese => "Japanese" | "ja",
        Portuguese => "Portuguese" | "pt",
        Italian => "Italian" | "it",
        Russian => "Russian" | "ru",
        Arabic => "Arabic" | "ar",
    }
);

labeled_enum!(
    ExportFormat, default = Pdf, {
        Pdf => "PDF",
        Word => "Word Document" | "word" | "docx",
        Text => "Text File" | "text" | "txt",
        Json => "JSON",
    }
);

labeled_enum!(
    Theme, default = Light, {
        Light => "light",
        Dark => "dark",
    }
);

impl ExportFormat {
    /// Fuzzy normalization used for free-form input: anything unrecognised is
    /// treated as plain text rather than the PDF default.
    pub fn normalize(input: &str) -> Self {
        if let Some(format) = Self::parse_label(input) {
            return format;
        }
        let lower = input.trim().to_lowercase();
        if lower.contains("pdf") {
            ExportFormat::Pdf
        } else if lower.contains("word") || lower.contains("doc") {
            ExportFormat::Word
        } else if lower.contains("json") {
            ExportFormat::Json
        } else {
            ExportFormat::Text
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Word => "docx",
            ExportFormat::Text => "txt",
            ExportFormat::Json => "json",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Word => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            ExportFormat::Json => "application/json",
            ExportFormat::Text => "text/plain",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub summary_type: SummaryStyle,
    pub language: OutputLanguage,
    pub include_timestamps: bool,
    pub include_sentiment: bool,
    pub include_topics: bool,
    pub export_format: ExportFormat,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            summary_type: SummaryStyle::default(),
            language: OutputLanguage::default(),
            include_timestamps: true,
            include_sentiment: true,
            include_topics: true,
            export_format: ExportFormat::default(),
        }
    }
}

impl AnalysisSettings {
    /// Validate an arbitrary settings object, clamping every unknown or
    /// mistyped field to its default.
    pub fn validated(raw: &Value) -> Self {
        let defaults = Self::default();
        let label = |key: &str| raw.get(key).and_then(Value::as_str);

        Self {
            summary_type: label("summary_type")
                .map(SummaryStyle::from_label)
                .unwrap_or(defaults.summary_type),
            language: label("language")
                .map(OutputLanguage::from_label)
                .unwrap_or(defaults.language),
            include_timestamps: lenient_bool(raw.get("include_timestamps"))
                .unwrap_or(defaults.include_timestamps),
            include_sentiment: lenient_bool(raw.get("include_sentiment"))
                .unwrap_or(defaults.include_sentiment),
            include_topics: lenient_bool(raw.get("include_topics"))
                .unwrap_or(defaults.include_topics),
            export_format: label("export_format")
                .map(ExportFormat::from_label)
                .unwrap_or(defaults.export_format),
        }
    }
}

/// Non-negative integers, possibly written as strings.
fn lenient_count(value: Option<&Value>) -> Option<usize> {
    match value? {
        Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Booleans may arrive as real bools, numbers or strings.
fn lenient_bool(value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => Some(n.as_f64().is_some_and(|f| f != 0.0)),
        Value::String(s) => {
            let s = s.trim().to_lowercase();
            Some(!matches!(s.as_str(), "" | "0" | "false" | "no" | "off"))
        }
        _ => None,
    }
}

pub const MIN_SESSION_HISTORY: usize = 1;
pub const MAX_SESSION_HISTORY: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPreferences {
    pub default_summary_type: SummaryStyle,
    pub default_language: OutputLanguage,
    pub include_timestamps: bool,
    pub include_sentiment: bool,
    pub include_topics: bool,
    pub export_format: ExportFormat,
    pub auto_save_sessions: bool,
    pub max_session_history: usize,
    pub theme: Theme,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            default_summary_type: SummaryStyle::default(),
            default_language: OutputLanguage::default(),
            include_timestamps: true,
            include_sentiment: true,
            include_topics: true,
            export_format: ExportFormat::default(),
            auto_save_sessions: true,
            max_session_history: 50,
            theme: Theme::default(),
        }
    }
}

impl UserPreferences {
    /// Read preferences from an arbitrary JSON object. Each mistyped or
    /// unknown field falls back to its default on its own.
    pub fn from_json(raw: &Value) -> Self {
        let defaults = Self::default();
        let settings = AnalysisSettings::validated(&serde_json::json!({
            "summary_type": raw.get("default_summary_type"),
            "language": raw.get("default_language"),
            "include_timestamps": raw.get("include_timestamps"),
            "include_sentiment": raw.get("include_sentiment"),
            "include_topics": raw.get("include_topics"),
            "export_format": raw.get("export_format"),
        }));

        Self {
            default_summary_type: settings.summary_type,
            default_language: settings.language,
            include_timestamps: settings.include_timestamps,
            include_sentiment: settings.include_sentiment,
            include_topics: settings.include_topics,
            export_format: settings.export_format,
            auto_save_sessions: lenient_bool(raw.get("auto_save_sessions"))
                .unwrap_or(defaults.auto_save_sessions),
            max_session_history: lenient_count(raw.get("max_session_history"))
                .unwrap_or(defaults.max_session_history),
            theme: raw
                .get("theme")
                .and_then(Value::as_str)
                .map(Theme::from_label)
                .unwrap_or(defaults.theme),
        }
        .validated()
    }

    pub fn validated(mut self) -> Self {
        self.max_session_history = self
            .max_session_history
            .clamp(MIN_SESSION_HISTORY, MAX_SESSION_HISTORY);
        self
    }

    /// Settings for a new analysis seeded from these preferences.
    pub fn analysis_settings(&self) -> AnalysisSettings {
        AnalysisSettings {
            summary_type: self.default_summary_type,
            language: self.default_language,
            include_timestamps: self.include_timestamps,
            include_sentiment: self.include_sentiment,
            include_topics: self.include_topics,
            export_format: self.export_format,
        }
    }

    /// Apply a single `key=value` update. Returns false for unknown keys.
    pub fn set(&mut self, key: &str, value: &str) -> bool {
        let flag = || lenient_bool(Some(&Value::String(value.to_string()))).unwrap_or(true);
        match key {
            "default_summary_type" | "summary_type" => {
                self.default_summary_type = SummaryStyle::from_label(value)
            }
            "default_language" | "language" => {
                self.default_language = OutputLanguage::from_label(value)
            }
            "include_timestamps" => self.include_timestamps = flag(),
            "include_sentiment" => self.include_sentiment = flag(),
            "include_topics" => self.include_topics = flag(),
            "export_format" => self.export_format = ExportFormat::normalize(value),
            "auto_save_sessions" => self.auto_save_sessions = flag(),
            "max_session_history" => {
                self.max_session_history = value.trim().parse().unwrap_or(50);
                *self = std::mem::take(self).validated();
            }
            "theme" => self.theme = Theme::from_label(value),
            _ => return false,
        }
        true
    }
}
