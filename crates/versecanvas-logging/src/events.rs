use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;

/// Type of output stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamType {
    Stdout,
    Stderr,
}

/// Structured log events for one passage request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    DatasetLoaded {
        path: PathBuf,
        verses: usize,
    },
    PassageSelected {
        reference: String,
        verses: usize,
        chars: usize,
    },
    PassageNotFound {
        reference: String,
    },
    PromptBuilt {
        reference: String,
        prompt: String,
        style: String,
        truncated: bool,
    },
    GenerationStarted {
        generator: String,
        width: u32,
        height: u32,
        output: PathBuf,
    },
    /// Streaming output line from the generator process
    GeneratorOutput {
        stream: StreamType,
        line: String,
    },
    GenerationCompleted {
        output: PathBuf,
        duration_secs: f64,
    },
    ErrorEncountered {
        error: String,
    },
}

impl LogEvent {
    /// Serialize with a timestamp field added
    pub fn with_timestamp(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                "timestamp".to_string(),
                serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        value
    }

    /// Single-line rendering used by the compact format. `None` means skip.
    pub fn compact_line(&self) -> Option<String> {
        let line = match self {
            LogEvent::DatasetLoaded { verses, .. } => format!("dataset:loaded {}", verses),
            LogEvent::PassageSelected {
                reference, verses, ..
            } => format!("passage:found {} ({}v)", reference, verses),
            LogEvent::PassageNotFound { reference } => format!("passage:missing {}", reference),
            LogEvent::PromptBuilt { truncated, .. } => {
                format!("prompt:built{}", if *truncated { " truncated" } else { "" })
            }
            LogEvent::GenerationStarted {
                generator,
                width,
                height,
                ..
            } => format!("generate:start {} {}x{}", generator, width, height),
            LogEvent::GeneratorOutput { .. } => return None,
            LogEvent::GenerationCompleted {
                output,
                duration_secs,
            } => format!(
                "generate:done {} {:.1}s",
                output.display(),
                duration_secs
            ),
            LogEvent::ErrorEncountered { error } => format!("error:{}", error),
        };
        Some(line)
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors
    #[default]
    Pretty,
    /// JSON lines format for machine consumption
    Json,
    /// Compact single-line format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// Console logger for versecanvas events. Everything goes to stderr so that
/// stdout stays clean for `--json` output.
pub struct Logger {
    format: LogFormat,
}

impl Logger {
    pub fn new(format: LogFormat) -> Self {
        Self { format }
    }

    pub fn log(&self, event: &LogEvent) {
        match self.format {
            LogFormat::Json => self.log_json(event),
            LogFormat::Pretty => self.log_pretty(event),
            LogFormat::Compact => self.log_compact(event),
        }
    }

    fn log_json(&self, event: &LogEvent) {
        let _ = writeln!(std::io::stderr(), "{}", event.with_timestamp());
    }

    fn log_pretty(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        match event {
            LogEvent::DatasetLoaded { path, verses } => {
                let _ = writeln!(
                    stderr,
                    "{} {} {}",
                    "📖".dimmed(),
                    format!("{} verses", verses).bright_blue(),
                    format!("from {}", path.display()).dimmed()
                );
            }
            LogEvent::PassageSelected {
                reference,
                verses,
                chars,
            } => {
                let _ = writeln!(
                    stderr,
                    "  {} {} {}",
                    "▶".bright_cyan(),
                    reference.bright_cyan().bold(),
                    format!(
                        "({} {}, {} chars)",
                        verses,
                        if *verses == 1 { "verse" } else { "verses" },
                        chars
                    )
                    .dimmed()
                );
            }
            LogEvent::PassageNotFound { reference } => {
                let _ = writeln!(
                    stderr,
                    "  {} Passage not found: {}",
                    "✗".bright_yellow(),
                    reference.bright_yellow()
                );
            }
            LogEvent::PromptBuilt {
                style, truncated, ..
            } => {
                let note = if *truncated {
                    " (passage truncated)".yellow().to_string()
                } else {
                    String::new()
                };
                let _ = writeln!(
                    stderr,
                    "    {} Prompt ready, style: {}{}",
                    "✓".bright_green(),
                    style,
                    note
                );
            }
            LogEvent::GenerationStarted {
                generator,
                width,
                height,
                ..
            } => {
                let _ = writeln!(
                    stderr,
                    "  {} {} {}",
                    "▶".bright_magenta(),
                    "GENERATE".bright_magenta().bold(),
                    format!("{} @ {}x{}", generator, width, height).dimmed()
                );
            }
            LogEvent::GeneratorOutput { line, stream } => {
                let prefix = "    │".dimmed();
                let styled_line = match stream {
                    StreamType::Stdout => line.normal(),
                    StreamType::Stderr => line.dimmed(),
                };
                let _ = writeln!(stderr, "{} {}", prefix, styled_line);
            }
            LogEvent::GenerationCompleted {
                output,
                duration_secs,
            } => {
                let _ = writeln!(
                    stderr,
                    "    {} Saved {} ({:.1}s)",
                    "✓".bright_green(),
                    output.display(),
                    duration_secs
                );
            }
            LogEvent::ErrorEncountered { error } => {
                let _ = writeln!(stderr, "{} {}", "✗".bright_red(), error.bright_red());
            }
        }
    }

    fn log_compact(&self, event: &LogEvent) {
        if let Some(line) = event.compact_line() {
            let timestamp = chrono::Utc::now().format("%H:%M:%S");
            let _ = writeln!(std::io::stderr(), "[{}] {}", timestamp, line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_tag_and_timestamp() {
        let event = LogEvent::PassageNotFound {
            reference: "Tobit 1:1".to_string(),
        };
        let value = event.with_timestamp();
        assert_eq!(value["event"], "passage_not_found");
        assert_eq!(value["reference"], "Tobit 1:1");
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_compact_lines() {
        let event = LogEvent::PassageSelected {
            reference: "Psalms 23:1-6".to_string(),
            verses: 6,
            chars: 512,
        };
        assert_eq!(
            event.compact_line().as_deref(),
            Some("passage:found Psalms 23:1-6 (6v)")
        );

        let event = LogEvent::GeneratorOutput {
            stream: StreamType::Stdout,
            line: "step 1/20".to_string(),
        };
        assert_eq!(event.compact_line(), None);
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
