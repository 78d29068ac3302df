use serde::{Deserialize, Serialize};

use crate::Passage;

/// Subject description placed in front of every passage.
pub const DESCRIPTIVE_PREFIX: &str = "A child with dark hair, olive skin, and green eyes.";

/// Maximum number of passage characters carried into a prompt.
pub const MAX_PASSAGE_CHARS: usize = 300;

/// Visual style appended to the prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Style {
    #[default]
    Realistic,
    OilPainting,
    DigitalArt,
    Sketch,
    FantasyArt,
}

impl Style {
    pub const ALL: [Style; 5] = [
        Style::Realistic,
        Style::OilPainting,
        Style::DigitalArt,
        Style::Sketch,
        Style::FantasyArt,
    ];

    /// Label used inside the prompt text.
    pub fn label(&self) -> &'static str {
        match self {
            Style::Realistic => "realistic",
            Style::OilPainting => "oil painting",
            Style::DigitalArt => "digital art",
            Style::Sketch => "sketch",
            Style::FantasyArt => "fantasy art",
        }
    }
}

impl std::fmt::Display for Style {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Style {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', '_'], " ");
        Style::ALL
            .into_iter()
            .find(|style| style.label() == normalized)
            .ok_or_else(|| format!("Unknown style: {}", s))
    }
}

/// Output size accepted by the image generator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    #[default]
    #[serde(rename = "512x512")]
    Square512,
    #[serde(rename = "768x768")]
    Square768,
}

impl Resolution {
    pub const ALL: [Resolution; 2] = [Resolution::Square512, Resolution::Square768];

    pub fn width(&self) -> u32 {
        match self {
            Resolution::Square512 => 512,
            Resolution::Square768 => 768,
        }
    }

    pub fn height(&self) -> u32 {
        self.width()
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width(), self.height())
    }
}

impl std::str::FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("Expected WIDTHxHEIGHT, got: {}", s))?;
        let width: u32 = w
            .trim()
            .parse()
            .map_err(|_| format!("Invalid width: {}", w))?;
        let height: u32 = h
            .trim()
            .parse()
            .map_err(|_| format!("Invalid height: {}", h))?;

        Resolution::ALL
            .into_iter()
            .find(|r| r.width() == width && r.height() == height)
            .ok_or_else(|| {
                format!(
                    "Unsupported resolution {}x{} (supported: 512x512, 768x768)",
                    width, height
                )
            })
    }
}

/// A prompt ready to hand to an image generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompt {
    /// Full prompt text.
    pub text: String,
    /// The untruncated passage, for display.
    pub passage: String,
    pub style: Style,
    pub truncated: bool,
}

impl std::fmt::Display for Prompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

#[derive(Debug, Clone)]
pub struct PromptBuilder {
    style: Style,
    max_chars: usize,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(Style::default())
    }
}

impl PromptBuilder {
    pub fn new(style: Style) -> Self {
        Self {
            style,
            max_chars: MAX_PASSAGE_CHARS,
        }
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    pub fn build(&self, passage: &Passage) -> Prompt {
        self.build_from_text(passage.text())
    }

    /// Build from an already joined passage.
    pub fn build_from_text(&self, passage: String) -> Prompt {
        let cut = truncate_chars(&passage, self.max_chars);
        let truncated = cut.len() < passage.len();
        let text = format!("{} {}, style: {}", DESCRIPTIVE_PREFIX, cut, self.style);
        Prompt {
            text,
            truncated,
            style: self.style,
            passage,
        }
    }
}

/// Cut after `max_chars` characters. May split a word.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
