use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{
    GeneratedImage, GenerationRequest, GeneratorConfig, GeneratorError, GeneratorKind,
    ImageGenerator, OutputCallback, ProcessSpawner,
};

/// Any program driven by an argument template.
///
/// Each template argument may contain `{prompt}`, `{width}`, `{height}`,
/// `{output}`, `{steps}`, `{seed}` and `{model}`. Substitution happens per
/// argument, so a prompt containing spaces stays a single argument.
pub struct CommandGenerator {
    binary_path: PathBuf,
    args_template: Vec<String>,
}

impl CommandGenerator {
    pub fn new(binary_path: PathBuf, args_template: Vec<String>) -> Self {
        Self {
            binary_path,
            args_template,
        }
    }

    pub fn render_args(&self, request: &GenerationRequest, config: &GeneratorConfig) -> Vec<String> {
        let output = request.output_path.display().to_string();
        let seed = config.seed.map(|s| s.to_string()).unwrap_or_default();
        let model = config.model.clone().unwrap_or_default();

        self.args_template
            .iter()
            .map(|arg| {
                arg.replace("{width}", &request.width.to_string())
                    .replace("{height}", &request.height.to_string())
                    .replace("{output}", &output)
                    .replace("{steps}", &config.steps.to_string())
                    .replace("{seed}", &seed)
                    .replace("{model}", &model)
                    // Last, so placeholders inside the prompt text are left alone
                    .replace("{prompt}", &request.prompt)
            })
            .collect()
    }
}

/// Locate `binary` the way the OS would launch it: paths with a directory
/// part are checked directly, bare names are searched on `PATH`.
pub fn find_binary(binary: &Path) -> Option<PathBuf> {
    if binary.components().count() > 1 {
        return binary.is_file().then(|| binary.to_path_buf());
    }

    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(binary))
        .find(|candidate| candidate.is_file())
}

#[async_trait]
impl ImageGenerator for CommandGenerator {
    fn name(&self) -> &str {
        "custom command"
    }

    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Command
    }

    fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    async fn is_available(&self) -> bool {
        // Never executed here: an arbitrary program may ignore `--help` and render.
        find_binary(&self.binary_path).is_some()
    }

    async fn generate_with_callback(
        &self,
        request: &GenerationRequest,
        config: &GeneratorConfig,
        on_output: Option<OutputCallback>,
    ) -> Result<GeneratedImage, GeneratorError> {
        if !self.args_template.iter().any(|a| a.contains("{prompt}")) {
            return Err(GeneratorError::ConfigError(
                "command generator args must contain {prompt}".to_string(),
            ));
        }

        debug!(
            generator = self.name(),
            binary = %self.binary_path.display(),
            prompt_len = request.prompt.len(),
            "Generating image"
        );

        let args = self.render_args(request, config);
        let output =
            ProcessSpawner::spawn_with_callback(&self.binary_path, &args, config, on_output)
                .await?;
        GeneratedImage::from_process(request, output)
    }
}
