use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::{GeneratedImage, OutputCallback};

/// Errors that can occur while running an external image generator
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Failed to spawn generator process: {0}")]
    SpawnFailed(#[from] std::io::Error),

    #[error("Generator configuration error: {0}")]
    ConfigError(String),

    #[error("Generator execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Generator exited successfully but wrote no image at {}", .0.display())]
    MissingOutput(PathBuf),
}

/// Configuration shared by every generator run
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Working directory for the generator process
    pub working_dir: PathBuf,
    /// Model weights or model identifier (backend specific)
    pub model: Option<String>,
    /// Sampling steps
    pub steps: u32,
    /// Fixed seed (None = backend default)
    pub seed: Option<i64>,
}

pub const DEFAULT_STEPS: u32 = 20;

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            working_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            model: None,
            steps: DEFAULT_STEPS,
            seed: None,
        }
    }
}

impl GeneratorConfig {
    pub fn new(working_dir: PathBuf) -> Self {
        Self {
            working_dir,
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_steps(mut self, steps: u32) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// One text-to-image request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    /// Where the generator must write the image
    pub output_path: PathBuf,
}

impl GenerationRequest {
    pub fn new(prompt: String, width: u32, height: u32, output_path: PathBuf) -> Self {
        Self {
            prompt,
            width,
            height,
            output_path,
        }
    }
}

/// Supported generator backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeneratorKind {
    StableDiffusionCpp,
    Command,
}

impl std::fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeneratorKind::StableDiffusionCpp => write!(f, "sd-cpp"),
            GeneratorKind::Command => write!(f, "command"),
        }
    }
}

impl std::str::FromStr for GeneratorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sd-cpp" | "sdcpp" | "stable-diffusion-cpp" | "sd" => {
                Ok(GeneratorKind::StableDiffusionCpp)
            }
            "command" | "cmd" | "custom" => Ok(GeneratorKind::Command),
            _ => Err(format!("Unknown generator kind: {}", s)),
        }
    }
}

/// The abstraction over external text-to-image programs
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Human-readable name of the generator
    fn name(&self) -> &str;

    fn kind(&self) -> GeneratorKind;

    /// Path to the generator binary
    fn binary_path(&self) -> &Path;

    /// Check if the generator binary can be launched
    async fn is_available(&self) -> bool;

    /// Render one image, blocking until the process exits
    async fn generate(
        &self,
        request: &GenerationRequest,
        config: &GeneratorConfig,
    ) -> Result<GeneratedImage, GeneratorError> {
        self.generate_with_callback(request, config, None).await
    }

    /// Render one image and stream process output lines to `on_output`
    async fn generate_with_callback(
        &self,
        request: &GenerationRequest,
        config: &GeneratorConfig,
        on_output: Option<OutputCallback>,
    ) -> Result<GeneratedImage, GeneratorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip_names() {
        assert_eq!(
            "sd-cpp".parse::<GeneratorKind>(),
            Ok(GeneratorKind::StableDiffusionCpp)
        );
        assert_eq!("Command".parse::<GeneratorKind>(), Ok(GeneratorKind::Command));
        assert!("diffusers".parse::<GeneratorKind>().is_err());
        assert_eq!(GeneratorKind::StableDiffusionCpp.to_string(), "sd-cpp");
    }

    #[test]
    fn test_config_builders() {
        let config = GeneratorConfig::new(PathBuf::from("/tmp"))
            .with_model("sd-v1-5.safetensors".to_string())
            .with_steps(30)
            .with_seed(42);
        assert_eq!(config.model.as_deref(), Some("sd-v1-5.safetensors"));
        assert_eq!(config.steps, 30);
        assert_eq!(config.seed, Some(42));
    }
}
