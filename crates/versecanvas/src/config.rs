//! Configuration file support for versecanvas.
//!
//! Loads `versecanvas.toml` from the working directory, falling back to
//! `<config dir>/versecanvas/config.toml`. Command line flags override the
//! file, and the file overrides built-in defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use versecanvas_core::{Resolution, Style};
use versecanvas_render::{GeneratorKind, DEFAULT_STEPS};

/// The project config file name
pub const CONFIG_FILE_NAME: &str = "versecanvas.toml";
/// Directory under the platform config dir holding the global config
pub const GLOBAL_CONFIG_DIR: &str = "versecanvas";
pub const GLOBAL_CONFIG_FILE: &str = "config.toml";

pub const DEFAULT_DATASET: &str = "t_bbe.csv";
pub const DEFAULT_OUTPUT_DIR: &str = "images";

/// Configuration loaded from a TOML file
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Verse dataset CSV
    pub dataset: Option<PathBuf>,
    /// Where generated images are written
    pub output_dir: Option<PathBuf>,
    /// Default style label, e.g. "oil painting"
    pub style: Option<String>,
    /// Default resolution, "512x512" or "768x768"
    pub resolution: Option<String>,
    #[serde(default)]
    pub generator: GeneratorSection,
    /// Directory relative paths are resolved against. Set on load.
    #[serde(skip)]
    base_dir: PathBuf,
}

/// The `[generator]` table
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct GeneratorSection {
    /// "sd-cpp" or "command"
    pub kind: Option<String>,
    pub binary: Option<PathBuf>,
    pub model: Option<String>,
    pub steps: Option<u32>,
    pub seed: Option<i64>,
    /// Argument template for the command backend
    #[serde(default)]
    pub args: Vec<String>,
}

impl ProjectConfig {
    /// Load configuration from an explicit file.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if file exists and parses successfully
    /// - `Ok(None)` if file does not exist
    /// - `Err(...)` if file exists but fails to parse (hard error)
    pub fn load(config_path: &Path) -> Result<Option<Self>> {
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let mut config: ProjectConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        config.base_dir = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Ok(Some(config))
    }

    /// Find the project config in `working_dir`, then the global one.
    pub fn discover(working_dir: &Path) -> Result<Option<Self>> {
        if let Some(config) = Self::load(&working_dir.join(CONFIG_FILE_NAME))? {
            return Ok(Some(config));
        }

        match Self::global_path() {
            Some(path) => Self::load(&path),
            None => Ok(None),
        }
    }

    pub fn global_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(GLOBAL_CONFIG_DIR).join(GLOBAL_CONFIG_FILE))
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn dataset(&self) -> Option<PathBuf> {
        self.dataset.as_deref().map(|p| self.resolve_path(p))
    }

    pub fn output_dir(&self) -> Option<PathBuf> {
        self.output_dir.as_deref().map(|p| self.resolve_path(p))
    }

    pub fn style(&self) -> Result<Option<Style>> {
        self.style
            .as_deref()
            .map(|s| s.parse::<Style>().map_err(anyhow::Error::msg))
            .transpose()
            .context("Invalid `style` in config")
    }

    pub fn resolution(&self) -> Result<Option<Resolution>> {
        self.resolution
            .as_deref()
            .map(|s| s.parse::<Resolution>().map_err(anyhow::Error::msg))
            .transpose()
            .context("Invalid `resolution` in config")
    }

    pub fn generator_kind(&self) -> Result<Option<GeneratorKind>> {
        self.generator
            .kind
            .as_deref()
            .map(|s| s.parse::<GeneratorKind>().map_err(anyhow::Error::msg))
            .transpose()
            .context("Invalid `generator.kind` in config")
    }

    /// Like other paths, except bare names which are looked up on PATH.
    fn resolve_name_or_path(&self, value: &Path) -> PathBuf {
        if value.components().count() > 1 {
            self.resolve_path(value)
        } else {
            value.to_path_buf()
        }
    }

    pub fn generator_binary(&self) -> Option<PathBuf> {
        self.generator
            .binary
            .as_deref()
            .map(|binary| self.resolve_name_or_path(binary))
    }

    /// Model files given as paths resolve next to the config; plain
    /// identifiers such as "sd15" are passed through.
    pub fn generator_model(&self) -> Option<String> {
        self.generator.model.as_deref().map(|model| {
            self.resolve_name_or_path(Path::new(model))
                .to_string_lossy()
                .into_owned()
        })
    }
}

/// Values given on the command line. `None` means "not given".
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub dataset: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub style: Option<Style>,
    pub resolution: Option<Resolution>,
    pub generator: Option<GeneratorKind>,
    pub generator_bin: Option<PathBuf>,
    pub model: Option<String>,
    pub steps: Option<u32>,
    pub seed: Option<i64>,
}

/// Effective settings after merging flags, config file and defaults
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub dataset: PathBuf,
    pub output_dir: PathBuf,
    pub style: Style,
    pub resolution: Resolution,
    pub generator: GeneratorKind,
    pub generator_bin: Option<PathBuf>,
    pub generator_args: Vec<String>,
    pub model: Option<String>,
    pub steps: u32,
    pub seed: Option<i64>,
}

impl Settings {
    /// Priority: command line > config file > default
    pub fn resolve(
        config: Option<&ProjectConfig>,
        overrides: &Overrides,
        working_dir: &Path,
    ) -> Result<Self> {
        let empty = ProjectConfig::default();
        let config = config.unwrap_or(&empty);

        let dataset = overrides
            .dataset
            .clone()
            .or_else(|| config.dataset())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATASET));

        let output_dir = overrides
            .output_dir
            .clone()
            .or_else(|| config.output_dir())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

        Ok(Self {
            dataset: absolutize(working_dir, dataset),
            output_dir: absolutize(working_dir, output_dir),
            style: match overrides.style {
                Some(style) => style,
                None => config.style()?.unwrap_or_default(),
            },
            resolution: match overrides.resolution {
                Some(resolution) => resolution,
                None => config.resolution()?.unwrap_or_default(),
            },
            generator: match overrides.generator {
                Some(kind) => kind,
                None => config
                    .generator_kind()?
                    .unwrap_or(GeneratorKind::StableDiffusionCpp),
            },
            generator_bin: overrides
                .generator_bin
                .clone()
                .or_else(|| config.generator_binary()),
            generator_args: config.generator.args.clone(),
            model: overrides
                .model
                .clone()
                .or_else(|| config.generator_model()),
            steps: overrides
                .steps
                .or(config.generator.steps)
                .unwrap_or(DEFAULT_STEPS),
            seed: overrides.seed.or(config.generator.seed),
        })
    }
}

/// The directory everything else resolves against. Always absolute, since
/// generator processes are started inside it.
pub fn resolve_working_dir(dir: Option<PathBuf>) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    Ok(match dir {
        Some(dir) => absolutize(&cwd, dir),
        None => cwd,
    })
}

fn absolutize(working_dir: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        working_dir.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join(CONFIG_FILE_NAME);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_missing_config_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(ProjectConfig::load(&dir.path().join(CONFIG_FILE_NAME))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_unknown_key_is_error() {
        let dir = TempDir::new().unwrap();
        let path = write_config(dir.path(), "dataset = \"a.csv\"\ncolour = \"red\"\n");
        assert!(ProjectConfig::load(&path).is_err());
    }

    #[test]
    fn test_defaults_without_config() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::resolve(None, &Overrides::default(), dir.path()).unwrap();
        assert_eq!(settings.dataset, dir.path().join(DEFAULT_DATASET));
        assert_eq!(settings.output_dir, dir.path().join(DEFAULT_OUTPUT_DIR));
        assert_eq!(settings.style, Style::Realistic);
        assert_eq!(settings.resolution, Resolution::Square512);
        assert_eq!(settings.generator, GeneratorKind::StableDiffusionCpp);
        assert_eq!(settings.steps, DEFAULT_STEPS);
        assert_eq!(settings.seed, None);
    }

    #[test]
    fn test_config_values_and_relative_paths() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            dir.path(),
            r#"
dataset = "data/t_kjv.csv"
style = "oil painting"
resolution = "768x768"

[generator]
kind = "command"
binary = "scripts/render.sh"
model = "sd15"
steps = 30
args = ["{prompt}", "{output}"]
"#,
        );
        let config = ProjectConfig::load(&path).unwrap().unwrap();
        let elsewhere = TempDir::new().unwrap();
        let settings =
            Settings::resolve(Some(&config), &Overrides::default(), elsewhere.path()).unwrap();

        assert_eq!(settings.dataset, dir.path().join("data/t_kjv.csv"));
        assert_eq!(settings.output_dir, elsewhere.path().join(DEFAULT_OUTPUT_DIR));
        assert_eq!(settings.style, Style::OilPainting);
        assert_eq!(settings.resolution, Resolution::Square768);
        assert_eq!(settings.generator, GeneratorKind::Command);
        assert_eq!(
            settings.generator_bin,
            Some(dir.path().join("scripts/render.sh"))
        );
        assert_eq!(settings.generator_args, vec!["{prompt}", "{output}"]);
        assert_eq!(settings.model.as_deref(), Some("sd15"));
        assert_eq!(settings.steps, 30);
    }

    #[test]
    fn test_bare_binary_name_stays_on_path() {
        let dir = TempDir::new().unwrap();
        let path = write_config(dir.path(), "[generator]\nbinary = \"sd\"\n");
        let config = ProjectConfig::load(&path).unwrap().unwrap();
        assert_eq!(config.generator_binary(), Some(PathBuf::from("sd")));
    }

    #[test]
    fn test_overrides_win() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            dir.path(),
            "style = \"sketch\"\n[generator]\nsteps = 30\nseed = 1\n",
        );
        let config = ProjectConfig::load(&path).unwrap().unwrap();
        let overrides = Overrides {
            style: Some(Style::FantasyArt),
            steps: Some(8),
            ..Default::default()
        };
        let settings = Settings::resolve(Some(&config), &overrides, dir.path()).unwrap();
        assert_eq!(settings.style, Style::FantasyArt);
        assert_eq!(settings.steps, 8);
        assert_eq!(settings.seed, Some(1));
    }

    #[test]
    fn test_model_path_resolves_next_to_config() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            dir.path(),
            "[generator]\nmodel = \"models/sd-v1-5.safetensors\"\n",
        );
        let config = ProjectConfig::load(&path).unwrap().unwrap();
        let elsewhere = TempDir::new().unwrap();
        let settings =
            Settings::resolve(Some(&config), &Overrides::default(), elsewhere.path()).unwrap();

        let expected = dir.path().join("models/sd-v1-5.safetensors");
        assert_eq!(settings.model.as_deref(), expected.to_str());
    }

    #[test]
    fn test_invalid_config_value_ignored_when_flag_given() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            dir.path(),
            "style = \"watercolor\"\nresolution = \"1024x1024\"\n[generator]\nkind = \"dalle\"\n",
        );
        let config = ProjectConfig::load(&path).unwrap().unwrap();
        let overrides = Overrides {
            style: Some(Style::Sketch),
            resolution: Some(Resolution::Square768),
            generator: Some(GeneratorKind::Command),
            ..Default::default()
        };

        let settings = Settings::resolve(Some(&config), &overrides, dir.path()).unwrap();
        assert_eq!(settings.style, Style::Sketch);
        assert_eq!(settings.resolution, Resolution::Square768);
        assert_eq!(settings.generator, GeneratorKind::Command);
    }

    #[test]
    fn test_relative_working_dir_is_made_absolute() {
        let cwd = std::env::current_dir().unwrap();

        let dir = resolve_working_dir(Some(PathBuf::from("sub"))).unwrap();
        assert!(dir.is_absolute());
        assert_eq!(dir, cwd.join("sub"));

        let settings = Settings::resolve(None, &Overrides::default(), &dir).unwrap();
        assert_eq!(settings.output_dir, cwd.join("sub").join(DEFAULT_OUTPUT_DIR));

        assert_eq!(resolve_working_dir(None).unwrap(), cwd);
    }

    #[test]
    fn test_invalid_style_in_config() {
        let dir = TempDir::new().unwrap();
        let path = write_config(dir.path(), "style = \"watercolor\"\n");
        let config = ProjectConfig::load(&path).unwrap().unwrap();
        assert!(Settings::resolve(Some(&config), &Overrides::default(), dir.path()).is_err());
    }
}
