use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, trace};

use crate::{GeneratorConfig, GeneratorError, OutputCallback, OutputStream, ProcessOutput};

/// Utility for spawning generator processes
pub struct ProcessSpawner;

impl ProcessSpawner {
    /// Spawn a process, capture its output and forward each line to `on_output`
    pub async fn spawn_with_callback(
        binary: &Path,
        args: &[String],
        config: &GeneratorConfig,
        on_output: Option<OutputCallback>,
    ) -> Result<ProcessOutput, GeneratorError> {
        let start = Instant::now();

        debug!(
            binary = %binary.display(),
            args = ?args,
            working_dir = %config.working_dir.display(),
            "Spawning generator process"
        );

        let mut cmd = Command::new(binary);
        cmd.args(args)
            .current_dir(&config.working_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null());

        let mut child = cmd.spawn()?;

        let stdout_handle = child
            .stdout
            .take()
            .ok_or_else(|| GeneratorError::ExecutionFailed("stdout not captured".to_string()))?;
        let stderr_handle = child
            .stderr
            .take()
            .ok_or_else(|| GeneratorError::ExecutionFailed("stderr not captured".to_string()))?;

        let mut stdout_reader = BufReader::new(stdout_handle).lines();
        let mut stderr_reader = BufReader::new(stderr_handle).lines();

        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut stderr_open = true;

        let emit = |stream: OutputStream, line: &str| {
            if let Some(ref callback) = on_output {
                callback(stream, line);
            }
        };

        loop {
            tokio::select! {
                biased;

                result = stdout_reader.next_line() => {
                    match result {
                        Ok(Some(line)) => {
                            trace!(line = %line, "stdout");
                            emit(OutputStream::Stdout, &line);
                            append_line(&mut stdout, &line);
                        }
                        Ok(None) => {
                            // stdout closed, drain stderr
                            while stderr_open {
                                match stderr_reader.next_line().await {
                                    Ok(Some(line)) => {
                                        trace!(line = %line, "stderr");
                                        emit(OutputStream::Stderr, &line);
                                        append_line(&mut stderr, &line);
                                    }
                                    _ => stderr_open = false,
                                }
                            }
                            break;
                        }
                        Err(e) => {
                            return Err(GeneratorError::ExecutionFailed(format!(
                                "Failed to read stdout: {}",
                                e
                            )));
                        }
                    }
                }
                result = stderr_reader.next_line(), if stderr_open => {
                    match result {
                        Ok(Some(line)) => {
                            trace!(line = %line, "stderr");
                            emit(OutputStream::Stderr, &line);
                            append_line(&mut stderr, &line);
                        }
                        Ok(None) => {
                            stderr_open = false;
                        }
                        Err(e) => {
                            return Err(GeneratorError::ExecutionFailed(format!(
                                "Failed to read stderr: {}",
                                e
                            )));
                        }
                    }
                }
            }
        }

        let status = child.wait().await?;
        let duration = start.elapsed();

        debug!(
            exit_code = status.code().unwrap_or(-1),
            duration_ms = duration.as_millis(),
            "Generator process completed"
        );

        Ok(ProcessOutput::new(
            stdout,
            stderr,
            status.code().unwrap_or(-1),
            duration,
        ))
    }
}

fn append_line(buffer: &mut String, line: &str) {
    if !buffer.is_empty() {
        buffer.push('\n');
    }
    buffer.push_str(line);
}
