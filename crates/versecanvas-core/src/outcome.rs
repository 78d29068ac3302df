use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// The final outcome of a single passage request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RequestOutcome {
    /// Passage found and prompt built, no image requested
    Found {
        reference: String,
        passage: String,
        prompt: String,
    },
    /// Image written by the generator
    Generated {
        reference: String,
        passage: String,
        prompt: String,
        image_path: PathBuf,
        width: u32,
        height: u32,
        duration_secs: f64,
    },
    /// No verse matched the query
    NotFound { reference: String },
    /// Generator failed after the prompt was built
    Failed {
        reference: String,
        prompt: String,
        error: String,
        duration_secs: f64,
    },
}

impl RequestOutcome {
    pub fn found(reference: String, passage: String, prompt: String) -> Self {
        Self::Found {
            reference,
            passage,
            prompt,
        }
    }

    pub fn generated(
        reference: String,
        passage: String,
        prompt: String,
        image_path: PathBuf,
        width: u32,
        height: u32,
        duration: Duration,
    ) -> Self {
        Self::Generated {
            reference,
            passage,
            prompt,
            image_path,
            width,
            height,
            duration_secs: duration.as_secs_f64(),
        }
    }

    pub fn not_found(reference: String) -> Self {
        Self::NotFound { reference }
    }

    pub fn failed(reference: String, prompt: String, error: String, duration: Duration) -> Self {
        Self::Failed {
            reference,
            prompt,
            error,
            duration_secs: duration.as_secs_f64(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Found { .. } | Self::Generated { .. } => 0,
            Self::NotFound { .. } => 1,
            Self::Failed { .. } => 2,
        }
    }
}
