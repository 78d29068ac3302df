mod command;
mod output;
mod sdcpp;
mod spawner;
mod traits;

use std::path::PathBuf;

pub use command::{find_binary, CommandGenerator};
pub use output::{GeneratedImage, OutputCallback, OutputStream, ProcessOutput};
pub use sdcpp::StableDiffusionCpp;
pub use spawner::ProcessSpawner;
pub use traits::{
    GenerationRequest, GeneratorConfig, GeneratorError, GeneratorKind, ImageGenerator,
    DEFAULT_STEPS,
};

/// Create a generator by kind.
///
/// `binary` overrides the default program; the command backend requires it.
pub fn create_generator(
    kind: GeneratorKind,
    binary: Option<PathBuf>,
    args_template: Vec<String>,
) -> Result<Box<dyn ImageGenerator>, GeneratorError> {
    match kind {
        GeneratorKind::StableDiffusionCpp => Ok(Box::new(match binary {
            Some(path) => StableDiffusionCpp::with_binary_path(path),
            None => StableDiffusionCpp::new(),
        })),
        GeneratorKind::Command => {
            let binary = binary.ok_or_else(|| {
                GeneratorError::ConfigError("command generator needs a binary".to_string())
            })?;
            Ok(Box::new(CommandGenerator::new(binary, args_template)))
        }
    }
}
