//! Project files.
//!
//! A project file is a TOML document naming the target languages, where
//! overlays go, which fonts each language uses and, optionally, the
//! translated text for each language. Relative paths inside it are resolved
//! against the directory containing the file.
//!
//! ```toml
//! languages = ["spanish", "thai"]
//! output_dir = "out"
//! container = "mp4"
//! transcript = "clip.srt"
//!
//! [title]
//! text = "Three tips for better sleep"
//! region = { x1 = 0, y1 = 80, x2 = 1080, y2 = 380 }
//! background = "#3c3c3c"
//!
//! [subtitle]
//! region = { x = 0.05, y = 0.72, width = 0.9, height = 0.16 }
//!
//! [fonts.default]
//! title = ["fonts/NotoSans-Bold.ttf"]
//! subtitle = ["fonts/NotoSans-Regular.ttf"]
//!
//! [fonts.languages.thai]
//! title = ["fonts/NotoSansThai-Bold.ttf"]
//! subtitle = ["fonts/NotoSansThai-Regular.ttf"]
//!
//! [layout.subtitle]
//! max_size = 56
//!
//! [translations.spanish]
//! title = "Tres consejos para dormir mejor"
//! subtitles_file = "clip.spanish.txt"
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use image::Rgb;
use serde::{Deserialize, Serialize};

use crate::config::{EncoderOptions, RenderOptions};
use crate::error::LingoframeError;
use crate::fit::FitConstraints;
use crate::font::{FontCandidates, FontTable};
use crate::region::{
    DEFAULT_SUBTITLE_BACKGROUND, DEFAULT_TITLE_BACKGROUND, Region, RegionSpec, parse_hex_color,
};

/// Root of a project file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Target language keys, rendered in this order.
    pub languages: Vec<String>,
    /// Source video. The CLI's positional argument takes precedence.
    #[serde(default)]
    pub source: Option<PathBuf>,
    /// SRT transcript of the source. Defaults to the source's `.srt` sidecar.
    #[serde(default)]
    pub transcript: Option<PathBuf>,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Output container extension.
    #[serde(default = "default_container")]
    pub container: String,
    #[serde(default)]
    pub title: TitleSection,
    #[serde(default)]
    pub subtitle: SubtitleSection,
    #[serde(default)]
    pub fonts: FontTable,
    #[serde(default)]
    pub layout: LayoutSection,
    #[serde(default)]
    pub encoder: EncoderOptions,
    /// Pre-translated text per language. Languages without an entry go
    /// through the configured translator.
    #[serde(default)]
    pub translations: BTreeMap<String, LanguageTranslation>,
    /// Directory relative paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TitleSection {
    /// Title in the source language.
    pub text: Option<String>,
    pub region: Option<RegionSpec>,
    /// `#RRGGBB`.
    pub background: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubtitleSection {
    pub region: Option<RegionSpec>,
    /// `#RRGGBB`.
    pub background: Option<String>,
}

/// Partial overrides of a [`FitConstraints`] preset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutOverrides {
    pub margin_x: Option<u32>,
    pub margin_y: Option<u32>,
    pub line_spacing: Option<u32>,
    pub max_size: Option<u32>,
    pub min_size: Option<u32>,
    pub step: Option<u32>,
}

impl LayoutOverrides {
    /// Apply the set fields on top of `base`.
    pub fn apply(&self, base: FitConstraints) -> FitConstraints {
        let margin_x = self.margin_x.unwrap_or(base.margin_x);
        let margin_y = self.margin_y.unwrap_or(base.margin_y);
        let line_spacing = self.line_spacing.unwrap_or(base.line_spacing);
        let max_size = self.max_size.unwrap_or(base.max_size);
        let min_size = self.min_size.unwrap_or(base.min_size);
        let step = self.step.unwrap_or(base.step);
        base.with_margins(margin_x, margin_y)
            .with_line_spacing(line_spacing)
            .with_size_range(max_size, min_size)
            .with_step(step)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutSection {
    #[serde(default)]
    pub title: LayoutOverrides,
    #[serde(default)]
    pub subtitle: LayoutOverrides,
}

/// Ready-made translation for one language.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LanguageTranslation {
    pub title: Option<String>,
    /// Translated transcript, one line per source segment.
    pub subtitles: Option<String>,
    /// File holding the translated transcript. Ignored when `subtitles` is set.
    pub subtitles_file: Option<PathBuf>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_container() -> String {
    "mp4".to_string()
}

impl ProjectConfig {
    /// Parse and validate a project from TOML text. Relative paths resolve
    /// against the current directory.
    ///
    /// # Errors
    ///
    /// [`LingoframeError::Configuration`] for malformed TOML or invalid
    /// values.
    pub fn from_toml_str(input: &str) -> Result<Self, LingoframeError> {
        let mut project: ProjectConfig = toml::from_str(input)?;
        project.normalize();
        project.validate()?;
        Ok(project)
    }

    /// Read a project file.
    ///
    /// # Errors
    ///
    /// I/O errors reading the file, plus everything [`from_toml_str`](Self::from_toml_str) rejects.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LingoframeError> {
        let path = path.as_ref();
        log::debug!("Loading project {}", path.display());
        let input = std::fs::read_to_string(path)?;
        let mut project = Self::from_toml_str(&input).map_err(|error| match error {
            LingoframeError::Configuration(reason) => {
                LingoframeError::Configuration(format!("{}: {reason}", path.display()))
            }
            other => other,
        })?;
        project.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(project)
    }

    fn normalize(&mut self) {
        for language in &mut self.languages {
            *language = language.trim().to_lowercase();
        }
        self.translations = std::mem::take(&mut self.translations)
            .into_iter()
            .map(|(language, translation)| (language.trim().to_lowercase(), translation))
            .collect();
        self.fonts.languages = std::mem::take(&mut self.fonts.languages)
            .into_iter()
            .map(|(language, candidates)| (language.trim().to_lowercase(), candidates))
            .collect();
        self.container = self.container.trim().trim_start_matches('.').to_string();
    }

    /// Check the project for values that cannot render.
    ///
    /// # Errors
    ///
    /// [`LingoframeError::Configuration`] describing the first problem.
    pub fn validate(&self) -> Result<(), LingoframeError> {
        if self.languages.is_empty() {
            return Err(LingoframeError::Configuration(
                "at least one language must be selected".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for language in &self.languages {
            if language.is_empty() {
                return Err(LingoframeError::Configuration(
                    "language keys must not be empty".to_string(),
                ));
            }
            if !seen.insert(language.as_str()) {
                return Err(LingoframeError::Configuration(format!(
                    "language '{language}' is listed twice"
                )));
            }
        }

        if self.container.is_empty() {
            return Err(LingoframeError::Configuration(
                "container extension must not be empty".to_string(),
            ));
        }

        self.title_background()?;
        self.subtitle_background()?;

        for language in self.translations.keys() {
            if !seen.contains(language.as_str()) {
                log::warn!("Translation for '{language}' is not in the language list and will be ignored");
            }
        }

        Ok(())
    }

    /// Resolve `path` against the project directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve_path(&self.output_dir)
    }

    /// Font table with every candidate path resolved.
    pub fn font_table(&self) -> FontTable {
        let resolve = |candidates: &FontCandidates| FontCandidates {
            title: candidates.title.iter().map(|p| self.resolve_path(p)).collect(),
            subtitle: candidates.subtitle.iter().map(|p| self.resolve_path(p)).collect(),
        };
        FontTable {
            default: resolve(&self.fonts.default),
            languages: self
                .fonts
                .languages
                .iter()
                .map(|(language, candidates)| (language.clone(), resolve(candidates)))
                .collect(),
        }
    }

    pub fn title_background(&self) -> Result<Rgb<u8>, LingoframeError> {
        self.title
            .background
            .as_deref()
            .map_or(Ok(DEFAULT_TITLE_BACKGROUND), parse_hex_color)
    }

    pub fn subtitle_background(&self) -> Result<Rgb<u8>, LingoframeError> {
        self.subtitle
            .background
            .as_deref()
            .map_or(Ok(DEFAULT_SUBTITLE_BACKGROUND), parse_hex_color)
    }

    /// Title region in pixels for a `width`×`height` source.
    pub fn title_region(&self, width: u32, height: u32) -> Option<Region> {
        self.title.region.map(|spec| spec.resolve(width, height))
    }

    /// Subtitle region in pixels, disabled when not configured.
    pub fn subtitle_region(&self, width: u32, height: u32) -> Region {
        self.subtitle
            .region
            .map_or(Region::new(0, 0, 0, 0), |spec| spec.resolve(width, height))
    }

    /// Apply the encoder and layout sections on top of `base`.
    pub fn render_options(&self, base: RenderOptions) -> RenderOptions {
        let title = self.layout.title.apply(base.title_constraints().clone());
        let subtitle = self.layout.subtitle.apply(base.subtitle_constraints().clone());
        base.with_encoder(self.encoder.clone())
            .with_title_constraints(title)
            .with_subtitle_constraints(subtitle)
    }

    /// Translated subtitle text configured for `language`, if any.
    ///
    /// # Errors
    ///
    /// I/O errors reading `subtitles_file`.
    pub fn translated_subtitles(&self, language: &str) -> Result<Option<String>, LingoframeError> {
        let Some(translation) = self.translations.get(language) else {
            return Ok(None);
        };
        if let Some(text) = &translation.subtitles {
            return Ok(Some(text.clone()));
        }
        match &translation.subtitles_file {
            Some(path) => Ok(Some(std::fs::read_to_string(self.resolve_path(path))?)),
            None => Ok(None),
        }
    }
}
