//! One passage request: select, build the prompt, optionally render.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;

use versecanvas_core::{
    Book, PassageError, PassageQuery, Prompt, PromptBuilder, RequestOutcome, Resolution, Style,
    VerseStore,
};
use versecanvas_logging::{LogEvent, Logger, StreamType};
use versecanvas_render::{
    GenerationRequest, GeneratorConfig, ImageGenerator, OutputCallback, OutputStream,
};

/// Build a query, mapping user input to the canonical book name when it
/// resolves. Unknown names pass through and simply match nothing.
pub fn build_query(book: &str, chapter: u32, start: u32, end: Option<u32>) -> PassageQuery {
    let book = Book::resolve(book)
        .map(|b| b.name.to_string())
        .unwrap_or_else(|| book.trim().to_string());
    PassageQuery::new(book, chapter, start, end.unwrap_or(start))
}

/// Select the passage and build its prompt.
pub fn prepare(
    store: &VerseStore,
    query: &PassageQuery,
    style: Style,
    logger: &Logger,
) -> Result<Prompt, PassageError> {
    let passage = match store.select(query) {
        Ok(passage) => passage,
        Err(err) => {
            logger.log(&LogEvent::PassageNotFound {
                reference: query.reference(),
            });
            return Err(err);
        }
    };

    let prompt = PromptBuilder::new(style).build(&passage);
    logger.log(&LogEvent::PassageSelected {
        reference: passage.reference(),
        verses: passage.verse_count(),
        chars: prompt.passage.chars().count(),
    });
    logger.log(&LogEvent::PromptBuilt {
        reference: passage.reference(),
        prompt: prompt.text.clone(),
        style: style.to_string(),
        truncated: prompt.truncated,
    });

    Ok(prompt)
}

/// Prompt only, no image.
pub fn describe(
    store: &VerseStore,
    query: &PassageQuery,
    style: Style,
    logger: &Logger,
) -> RequestOutcome {
    match prepare(store, query, style, logger) {
        Ok(prompt) => RequestOutcome::found(query.reference(), prompt.passage, prompt.text),
        Err(PassageError::EmptyPassage(q)) => RequestOutcome::not_found(q.reference()),
    }
}

/// Default image file name for a passage, e.g. `genesis-1-1-3_20260120T100000Z.png`.
pub fn default_output_path(output_dir: &Path, query: &PassageQuery) -> PathBuf {
    let slug: String = query
        .reference()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    let timestamp = Utc::now().format("%Y%m%dT%H%M%SZ");
    output_dir.join(format!("{}_{}.png", slug, timestamp))
}

/// Everything needed to turn a prompt into an image file.
pub struct RenderJob<'a> {
    pub generator: &'a dyn ImageGenerator,
    pub config: &'a GeneratorConfig,
    pub resolution: Resolution,
    pub output_path: PathBuf,
}

/// Select, build and render. Blocks until the generator exits.
pub async fn generate(
    store: &VerseStore,
    query: &PassageQuery,
    style: Style,
    job: RenderJob<'_>,
    logger: &Arc<Logger>,
) -> Result<RequestOutcome> {
    let prompt = match prepare(store, query, style, logger) {
        Ok(prompt) => prompt,
        Err(PassageError::EmptyPassage(q)) => return Ok(RequestOutcome::not_found(q.reference())),
    };

    if let Some(parent) = job.output_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let request = GenerationRequest::new(
        prompt.text.clone(),
        job.resolution.width(),
        job.resolution.height(),
        job.output_path,
    );

    logger.log(&LogEvent::GenerationStarted {
        generator: job.generator.name().to_string(),
        width: request.width,
        height: request.height,
        output: request.output_path.clone(),
    });

    let stream_logger = Arc::clone(logger);
    let on_output: OutputCallback = Arc::new(move |stream: OutputStream, line: &str| {
        stream_logger.log(&LogEvent::GeneratorOutput {
            stream: match stream {
                OutputStream::Stdout => StreamType::Stdout,
                OutputStream::Stderr => StreamType::Stderr,
            },
            line: line.to_string(),
        });
    });

    let start = Instant::now();
    let outcome = match job
        .generator
        .generate_with_callback(&request, job.config, Some(on_output))
        .await
    {
        Ok(image) => {
            let duration = image.duration();
            logger.log(&LogEvent::GenerationCompleted {
                output: image.path.clone(),
                duration_secs: duration.as_secs_f64(),
            });
            RequestOutcome::generated(
                query.reference(),
                prompt.passage,
                prompt.text,
                image.path,
                image.width,
                image.height,
                duration,
            )
        }
        Err(err) => {
            logger.log(&LogEvent::ErrorEncountered {
                error: err.to_string(),
            });
            RequestOutcome::failed(query.reference(), prompt.text, err.to_string(), start.elapsed())
        }
    };

    Ok(outcome)
}
