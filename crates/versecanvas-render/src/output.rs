use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::{GenerationRequest, GeneratorError};

/// Which stream a process output line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Receives each output line of a running generator
pub type OutputCallback = Arc<dyn Fn(OutputStream, &str) + Send + Sync>;

/// Output captured from a finished process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    #[serde(with = "duration_secs")]
    pub duration: Duration,
}

impl ProcessOutput {
    pub fn new(stdout: String, stderr: String, exit_code: i32, duration: Duration) -> Self {
        Self {
            stdout,
            stderr,
            exit_code,
            duration,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Last non-empty stderr line, falling back to stdout
    pub fn last_message(&self) -> Option<&str> {
        self.stderr
            .lines()
            .rev()
            .chain(self.stdout.lines().rev())
            .map(str::trim)
            .find(|line| !line.is_empty())
    }
}

/// An image written by a generator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub output: ProcessOutput,
}

impl GeneratedImage {
    /// Check a finished process against its request.
    ///
    /// A non-zero exit is an execution failure; a zero exit without the
    /// requested file is `MissingOutput`.
    pub fn from_process(
        request: &GenerationRequest,
        output: ProcessOutput,
    ) -> Result<Self, GeneratorError> {
        if !output.success() {
            let detail = output.last_message().unwrap_or("no output");
            return Err(GeneratorError::ExecutionFailed(format!(
                "exit code {}: {}",
                output.exit_code, detail
            )));
        }

        if !request.output_path.is_file() {
            return Err(GeneratorError::MissingOutput(request.output_path.clone()));
        }

        Ok(Self {
            path: request.output_path.clone(),
            width: request.width,
            height: request.height,
            output,
        })
    }

    pub fn duration(&self) -> Duration {
        self.output.duration
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Ok(Duration::from_secs_f64(secs))
    }
}
