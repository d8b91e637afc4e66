use std::path::PathBuf;
use thiserror::Error;

use crate::{ai::ModelError, youtube::CaptionError};

#[derive(Error, Debug)]
pub enum TldwError {
    #[error("Invalid YouTube URL: {url}")]
    InvalidUrl { url: String },

    #[error("Could not extract a video id from {url}")]
    MissingVideoId { url: String },

    #[error("{0}")]
    Captions(#[from] CaptionError),

    #[error("{0}")]
    Model(#[from] ModelError),

    #[error("Metadata request failed for {video_id}: {reason}")]
    MetadataFailed { video_id: String, reason: String },

    #[error("Session not found: {session_id}")]
    SessionNotFound { session_id: String },

    #[error("Export failed ({format}): {reason}")]
    ExportFailed { format: String, reason: String },

    #[error("Config error in {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Missing API key: {env_var} environment variable is not set")]
    MissingApiKey { env_var: String },
}

pub type Result<T> = std::result::Result<T, TldwError>;
