//! Terminal form for picking a passage and generating its image.
//!
//! Mirrors a web form: book, chapter, verse range, style and resolution,
//! then one generation per submission until the user stops.

use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use dialoguer::{Confirm, FuzzySelect, Input, Select};

use versecanvas_core::{Book, PassageQuery, Resolution, Style, VerseStore};
use versecanvas_logging::Logger;
use versecanvas_render::{GeneratorConfig, ImageGenerator};

use crate::config::Settings;
use crate::pipeline::{self, RenderJob};
use crate::{MAX_CHAPTER, MAX_VERSE};

/// One submitted form
#[derive(Debug, Clone)]
struct FormInput {
    query: PassageQuery,
    style: Style,
    resolution: Resolution,
}

pub async fn handle_interactive(
    store: &VerseStore,
    settings: &Settings,
    generator: &dyn ImageGenerator,
    generator_config: &GeneratorConfig,
    logger: &Arc<Logger>,
    open_image: bool,
) -> Result<i32> {
    eprintln!("{}", "Bible passage text-to-image generator".bold());
    eprintln!();

    loop {
        let input = ask(store, settings)?;

        let job = RenderJob {
            generator,
            config: generator_config,
            resolution: input.resolution,
            output_path: pipeline::default_output_path(&settings.output_dir, &input.query),
        };
        let outcome = pipeline::generate(store, &input.query, input.style, job, logger).await?;

        crate::print_outcome(&outcome);
        if open_image {
            crate::open_outcome_image(&outcome);
        }

        eprintln!();
        let again = Confirm::new()
            .with_prompt("Generate another passage?")
            .default(true)
            .interact()?;
        if !again {
            return Ok(outcome.exit_code());
        }
    }
}

fn ask(store: &VerseStore, settings: &Settings) -> Result<FormInput> {
    let names: Vec<&str> = Book::all().iter().map(|b| b.name).collect();
    let book_index = FuzzySelect::new()
        .with_prompt("Select book")
        .items(&names)
        .default(0)
        .interact()?;
    let book = names[book_index];

    let known_chapters = store.chapter_count(book);
    let chapter_prompt = if known_chapters > 0 {
        format!("Chapter (1-{})", known_chapters)
    } else {
        "Chapter".to_string()
    };
    let chapter = ask_number(&chapter_prompt, MAX_CHAPTER, 1)?;

    let known_verses = store.verse_count(book, chapter);
    let start_prompt = if known_verses > 0 {
        format!("Start verse (1-{})", known_verses)
    } else {
        "Start verse".to_string()
    };
    let start = ask_number(&start_prompt, MAX_VERSE, 1)?;
    // An end before the start is accepted and reports "not found".
    let end = ask_number("End verse", MAX_VERSE, start)?;

    let style_labels: Vec<&str> = Style::ALL.iter().map(Style::label).collect();
    let style_default = Style::ALL
        .iter()
        .position(|s| *s == settings.style)
        .unwrap_or(0);
    let style_index = Select::new()
        .with_prompt("Select style")
        .items(&style_labels)
        .default(style_default)
        .interact()?;

    let resolution_labels: Vec<String> = Resolution::ALL.iter().map(|r| r.to_string()).collect();
    let resolution_default = Resolution::ALL
        .iter()
        .position(|r| *r == settings.resolution)
        .unwrap_or(0);
    let resolution_index = Select::new()
        .with_prompt("Image resolution")
        .items(&resolution_labels)
        .default(resolution_default)
        .interact()?;

    Ok(FormInput {
        query: PassageQuery::new(book, chapter, start, end),
        style: Style::ALL[style_index],
        resolution: Resolution::ALL[resolution_index],
    })
}

/// Prompt for a number in `1..=max`.
fn ask_number(prompt: &str, max: u32, default: u32) -> Result<u32> {
    let value = Input::<u32>::new()
        .with_prompt(prompt)
        .default(default)
        .validate_with(move |value: &u32| -> Result<(), String> {
            if (1..=max).contains(value) {
                Ok(())
            } else {
                Err(format!("Enter a number between 1 and {}", max))
            }
        })
        .interact_text()?;
    Ok(value)
}
