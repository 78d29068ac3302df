mod config;
mod interactive;
mod pipeline;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;

use versecanvas_core::{cache, RequestOutcome, Resolution, Style, VerseStore};
use versecanvas_logging::{init_tracing, LogEvent, LogFormat, Logger};
use versecanvas_render::{create_generator, GeneratorConfig, GeneratorKind, ImageGenerator};

use config::{Overrides, ProjectConfig, Settings};
use pipeline::RenderJob;

/// Highest chapter number the inputs accept (Psalms has 150)
const MAX_CHAPTER: u32 = 150;
/// Highest verse number the inputs accept (Psalm 119 has 176)
const MAX_VERSE: u32 = 176;

#[derive(Parser, Debug)]
#[command(
    name = "versecanvas",
    about = "Turn a Bible passage into a text-to-image prompt and render it",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verse dataset CSV with columns b, c, v, t (default: ./t_bbe.csv)
    #[arg(long, global = true)]
    dataset: Option<PathBuf>,

    /// Config file (default: ./versecanvas.toml, then the global config)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Working directory (default: current directory)
    #[arg(short = 'd', long, global = true)]
    working_dir: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty", global = true)]
    log_format: LogFormatChoice,

    /// Diagnostic log level (RUST_LOG takes precedence)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the books of the catalogue with their chapter counts
    Books {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a passage and the prompt built from it
    Passage {
        #[command(flatten)]
        passage: PassageArgs,

        /// Visual style appended to the prompt
        #[arg(short, long)]
        style: Option<Style>,

        /// Output the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Build the prompt and render an image with the configured generator
    Generate {
        #[command(flatten)]
        passage: PassageArgs,

        #[command(flatten)]
        render: RenderArgs,

        /// Image file to write (default: <output-dir>/<reference>_<timestamp>.png)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show what would happen without running the generator
        #[arg(long)]
        dry_run: bool,

        /// Open the image with the system viewer when done
        #[arg(long)]
        open: bool,

        /// Output the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Pick passages from a terminal form and render them one by one
    Interactive {
        #[command(flatten)]
        render: RenderArgs,

        /// Open each image with the system viewer when done
        #[arg(long)]
        open: bool,
    },
}

#[derive(Args, Debug)]
struct PassageArgs {
    /// Book name, e.g. "Genesis" or "1 Corinthians" (case-insensitive)
    book: String,

    /// Chapter number
    #[arg(value_parser = clap::value_parser!(u32).range(1..=MAX_CHAPTER as i64))]
    chapter: u32,

    /// First verse of the range
    #[arg(value_parser = clap::value_parser!(u32).range(1..=MAX_VERSE as i64))]
    start: u32,

    /// Last verse of the range, inclusive (default: START)
    #[arg(value_parser = clap::value_parser!(u32).range(1..=MAX_VERSE as i64))]
    end: Option<u32>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Visual style appended to the prompt
    #[arg(short, long)]
    style: Option<Style>,

    /// Image size: 512x512 or 768x768
    #[arg(short, long)]
    resolution: Option<Resolution>,

    /// Generator backend: sd-cpp or command
    #[arg(short, long)]
    generator: Option<GeneratorKind>,

    /// Generator binary (default: `sd` for sd-cpp)
    #[arg(long)]
    generator_bin: Option<PathBuf>,

    /// Model file or identifier passed to the generator
    #[arg(short, long)]
    model: Option<String>,

    /// Sampling steps
    #[arg(long)]
    steps: Option<u32>,

    /// Fixed seed
    #[arg(long)]
    seed: Option<i64>,

    /// Directory for generated images (default: ./images)
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

impl RenderArgs {
    fn overrides(&self, dataset: Option<PathBuf>) -> Overrides {
        Overrides {
            dataset,
            output_dir: self.output_dir.clone(),
            style: self.style,
            resolution: self.resolution,
            generator: self.generator,
            generator_bin: self.generator_bin.clone(),
            model: self.model.clone(),
            steps: self.steps,
            seed: self.seed,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_format: LogFormat = cli.log_format.into();
    init_tracing(&cli.log_level, log_format);
    let logger = Arc::new(Logger::new(log_format));

    let working_dir = config::resolve_working_dir(cli.working_dir.clone())?;

    let project_config = match cli.config {
        Some(ref path) => Some(
            ProjectConfig::load(path)?
                .with_context(|| format!("Config file not found: {}", path.display()))?,
        ),
        None => ProjectConfig::discover(&working_dir).context("Failed to load configuration")?,
    };

    let exit_code = match cli.command {
        Commands::Books { json } => {
            let overrides = Overrides {
                dataset: cli.dataset,
                ..Default::default()
            };
            let settings = Settings::resolve(project_config.as_ref(), &overrides, &working_dir)?;
            let store = load_store(&settings.dataset, &logger)?;
            print_books(&store, json)?;
            0
        }
        Commands::Passage {
            passage,
            style,
            json,
        } => {
            let overrides = Overrides {
                dataset: cli.dataset,
                style,
                ..Default::default()
            };
            let settings = Settings::resolve(project_config.as_ref(), &overrides, &working_dir)?;
            let store = load_store(&settings.dataset, &logger)?;

            let query =
                pipeline::build_query(&passage.book, passage.chapter, passage.start, passage.end);
            let outcome = pipeline::describe(&store, &query, settings.style, &logger);
            emit_outcome(&outcome, json)?;
            outcome.exit_code()
        }
        Commands::Generate {
            passage,
            render,
            output,
            dry_run,
            open,
            json,
        } => {
            let settings = Settings::resolve(
                project_config.as_ref(),
                &render.overrides(cli.dataset),
                &working_dir,
            )?;
            let store = load_store(&settings.dataset, &logger)?;
            let query =
                pipeline::build_query(&passage.book, passage.chapter, passage.start, passage.end);
            let output_path = match output {
                Some(path) if path.is_absolute() => path,
                Some(path) => working_dir.join(path),
                None => pipeline::default_output_path(&settings.output_dir, &query),
            };

            if dry_run {
                let outcome = pipeline::describe(&store, &query, settings.style, &logger);
                print_dry_run(&outcome, &settings, &output_path);
                return exit(outcome.exit_code());
            }

            let generator = build_generator(&settings).await?;
            let generator_config = generator_config(&settings, &working_dir);
            let job = RenderJob {
                generator: generator.as_ref(),
                config: &generator_config,
                resolution: settings.resolution,
                output_path,
            };
            let outcome = pipeline::generate(&store, &query, settings.style, job, &logger).await?;
            emit_outcome(&outcome, json)?;
            if open {
                open_outcome_image(&outcome);
            }
            outcome.exit_code()
        }
        Commands::Interactive { render, open } => {
            let settings = Settings::resolve(
                project_config.as_ref(),
                &render.overrides(cli.dataset),
                &working_dir,
            )?;
            let store = load_store(&settings.dataset, &logger)?;
            let generator = build_generator(&settings).await?;
            let generator_config = generator_config(&settings, &working_dir);
            interactive::handle_interactive(
                &store,
                &settings,
                generator.as_ref(),
                &generator_config,
                &logger,
                open,
            )
            .await?
        }
    };

    exit(exit_code)
}

fn exit(code: i32) -> Result<()> {
    std::process::exit(code)
}

fn load_store(path: &Path, logger: &Logger) -> Result<Arc<VerseStore>> {
    let store = cache::shared_store(path).context("Failed to load verse dataset")?;
    logger.log(&LogEvent::DatasetLoaded {
        path: store.source().to_path_buf(),
        verses: store.len(),
    });
    Ok(store)
}

async fn build_generator(settings: &Settings) -> Result<Box<dyn ImageGenerator>> {
    let generator = create_generator(
        settings.generator,
        settings.generator_bin.clone(),
        settings.generator_args.clone(),
    )?;

    if !generator.is_available().await {
        anyhow::bail!(
            "Generator '{}' is not available at '{}'. Make sure it's installed and in PATH.",
            generator.name(),
            generator.binary_path().display()
        );
    }

    Ok(generator)
}

fn generator_config(settings: &Settings, working_dir: &Path) -> GeneratorConfig {
    let mut config = GeneratorConfig::new(working_dir.to_path_buf()).with_steps(settings.steps);
    if let Some(ref model) = settings.model {
        config = config.with_model(model.clone());
    }
    if let Some(seed) = settings.seed {
        config = config.with_seed(seed);
    }
    config
}

fn print_books(store: &VerseStore, json: bool) -> Result<()> {
    let books = store.books();
    if json {
        println!("{}", serde_json::to_string_pretty(&books)?);
        return Ok(());
    }

    for summary in books {
        let line = format!(
            "{:>2}  {:<16} {:>3} chapters  {:>5} verses",
            summary.book.id, summary.book.name, summary.chapters, summary.verses
        );
        if summary.verses == 0 {
            println!("{}", line.dimmed());
        } else {
            println!("{}", line);
        }
    }
    Ok(())
}

fn emit_outcome(outcome: &RequestOutcome, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    } else {
        print_outcome(outcome);
    }
    Ok(())
}

fn print_outcome(outcome: &RequestOutcome) {
    match outcome {
        RequestOutcome::Found {
            reference,
            passage,
            prompt,
        } => {
            println!("{}", reference.bold());
            println!();
            println!("{} {}", "Input Passage:".bold(), passage);
            println!();
            println!("{} {}", "Prompt:".bold(), prompt);
        }
        RequestOutcome::Generated {
            reference,
            passage,
            image_path,
            width,
            height,
            duration_secs,
            ..
        } => {
            println!("{} {}", "Input Passage:".bold(), passage);
            eprintln!();
            eprintln!("=== GENERATED ===");
            eprintln!("Passage: {}", reference);
            eprintln!("Image: {} ({}x{})", image_path.display(), width, height);
            eprintln!("Duration: {:.1}s", duration_secs);
        }
        RequestOutcome::NotFound { .. } => {
            println!("Passage not found.");
        }
        RequestOutcome::Failed {
            reference,
            error,
            duration_secs,
            ..
        } => {
            eprintln!();
            eprintln!("=== FAILED ===");
            eprintln!("Passage: {}", reference);
            eprintln!("Error: {}", error);
            eprintln!("Duration: {:.1}s", duration_secs);
        }
    }
}

fn print_dry_run(outcome: &RequestOutcome, settings: &Settings, output_path: &Path) {
    println!("=== Dry Run ===");
    match outcome {
        RequestOutcome::Found { prompt, .. } => {
            println!("Prompt: {}", prompt);
            println!("Generator: {}", settings.generator);
            println!("Resolution: {}", settings.resolution);
            println!("Steps: {}", settings.steps);
            println!("Output: {}", output_path.display());
        }
        other => print_outcome(other),
    }
}

fn open_outcome_image(outcome: &RequestOutcome) {
    if let RequestOutcome::Generated { image_path, .. } = outcome {
        if let Err(e) = open::that(image_path) {
            eprintln!(
                "Failed to open image: {} (open {} manually)",
                e,
                image_path.display()
            );
        }
    }
}
