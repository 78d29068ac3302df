use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

use crate::{
    GeneratedImage, GenerationRequest, GeneratorConfig, GeneratorError, GeneratorKind,
    ImageGenerator, OutputCallback, ProcessSpawner,
};

/// stable-diffusion.cpp (`sd`) command line backend
pub struct StableDiffusionCpp {
    binary_path: PathBuf,
}

impl StableDiffusionCpp {
    pub fn new() -> Self {
        Self {
            binary_path: PathBuf::from("sd"),
        }
    }

    pub fn with_binary_path(path: PathBuf) -> Self {
        Self { binary_path: path }
    }

    /// Arguments for one txt2img run
    pub fn build_args(
        request: &GenerationRequest,
        config: &GeneratorConfig,
    ) -> Result<Vec<String>, GeneratorError> {
        let model = config.model.as_ref().ok_or_else(|| {
            GeneratorError::ConfigError(
                "stable-diffusion.cpp needs a model file (set generator.model)".to_string(),
            )
        })?;

        let mut args = vec![
            "-m".to_string(),
            model.clone(),
            "-p".to_string(),
            request.prompt.clone(),
            "-W".to_string(),
            request.width.to_string(),
            "-H".to_string(),
            request.height.to_string(),
            "--steps".to_string(),
            config.steps.to_string(),
        ];

        if let Some(seed) = config.seed {
            args.push("--seed".to_string());
            args.push(seed.to_string());
        }

        args.push("-o".to_string());
        args.push(request.output_path.display().to_string());

        Ok(args)
    }
}

impl Default for StableDiffusionCpp {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageGenerator for StableDiffusionCpp {
    fn name(&self) -> &str {
        "stable-diffusion.cpp"
    }

    fn kind(&self) -> GeneratorKind {
        GeneratorKind::StableDiffusionCpp
    }

    fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    async fn is_available(&self) -> bool {
        Command::new(&self.binary_path)
            .arg("--help")
            .output()
            .await
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    async fn generate_with_callback(
        &self,
        request: &GenerationRequest,
        config: &GeneratorConfig,
        on_output: Option<OutputCallback>,
    ) -> Result<GeneratedImage, GeneratorError> {
        debug!(
            generator = self.name(),
            prompt_len = request.prompt.len(),
            width = request.width,
            height = request.height,
            "Generating image"
        );

        let args = Self::build_args(request, config)?;
        let output =
            ProcessSpawner::spawn_with_callback(&self.binary_path, &args, config, on_output)
                .await?;
        GeneratedImage::from_process(request, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerationRequest {
        GenerationRequest::new(
            "A child, style: sketch".to_string(),
            768,
            768,
            PathBuf::from("out/john-3-16.png"),
        )
    }

    #[test]
    fn test_build_args() {
        let config = GeneratorConfig::new(PathBuf::from("."))
            .with_model("models/sd-v1-5.safetensors".to_string())
            .with_steps(25);
        let args = StableDiffusionCpp::build_args(&request(), &config).unwrap();
        assert_eq!(
            args,
            vec![
                "-m",
                "models/sd-v1-5.safetensors",
                "-p",
                "A child, style: sketch",
                "-W",
                "768",
                "-H",
                "768",
                "--steps",
                "25",
                "-o",
                "out/john-3-16.png",
            ]
        );
    }

    #[test]
    fn test_build_args_with_seed() {
        let config = GeneratorConfig::new(PathBuf::from("."))
            .with_model("m.gguf".to_string())
            .with_seed(7);
        let args = StableDiffusionCpp::build_args(&request(), &config).unwrap();
        let seed_pos = args.iter().position(|a| a == "--seed").unwrap();
        assert_eq!(args[seed_pos + 1], "7");
    }

    #[test]
    fn test_build_args_requires_model() {
        let config = GeneratorConfig::new(PathBuf::from("."));
        let err = StableDiffusionCpp::build_args(&request(), &config).unwrap_err();
        assert!(matches!(err, GeneratorError::ConfigError(_)));
    }
}
