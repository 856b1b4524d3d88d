//! Per-language font resources.
//!
//! [`FontTable`] maps a language key and an overlay style to an ordered list
//! of candidate font files. Loading walks the language's candidates first and
//! then the `default` chain, returning the first file that parses. Scripts
//! such as Thai or Japanese need fonts with matching coverage, so each
//! language usually lists its preferred face first and a broad fallback
//! after it.
//!
//! The table is read-only after construction and can be shared across
//! threads behind an [`Arc`](std::sync::Arc).
//!
//! # Example
//!
//! ```no_run
//! use lingoframe::{FontStyle, FontTable};
//!
//! let mut table = FontTable::with_default(vec!["fonts/NotoSans-Regular.ttf".into()]);
//! table.insert_language(
//!     "japanese",
//!     FontStyle::Subtitle,
//!     vec!["fonts/NotoSansJP-Regular.ttf".into()],
//! );
//! let face = table.load("japanese", FontStyle::Subtitle)?;
//! # Ok::<(), lingoframe::LingoframeError>(())
//! ```

use std::collections::HashMap;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};

use fontdue::{Font, FontSettings};
use serde::{Deserialize, Serialize};

use crate::error::LingoframeError;
use crate::fit::TextMeasure;
use crate::overlay::{GlyphBitmap, GlyphSource};

/// Which overlay a font is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    Title,
    Subtitle,
}

/// Candidate font paths for one language.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FontCandidates {
    /// Tried in order for titles.
    #[serde(default)]
    pub title: Vec<PathBuf>,
    /// Tried in order for subtitles.
    #[serde(default)]
    pub subtitle: Vec<PathBuf>,
}

impl FontCandidates {
    fn for_style(&self, style: FontStyle) -> &[PathBuf] {
        match style {
            FontStyle::Title => &self.title,
            FontStyle::Subtitle => &self.subtitle,
        }
    }

    fn for_style_mut(&mut self, style: FontStyle) -> &mut Vec<PathBuf> {
        match style {
            FontStyle::Title => &mut self.title,
            FontStyle::Subtitle => &mut self.subtitle,
        }
    }
}

/// Language key → font candidates, with a `default` fallback.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FontTable {
    /// Used when a language has no entry, and after a language's own
    /// candidates have all failed.
    #[serde(default)]
    pub default: FontCandidates,
    /// Per-language entries, keyed by lowercase language key.
    #[serde(default)]
    pub languages: HashMap<String, FontCandidates>,
}

impl FontTable {
    /// A table whose default chain is `paths` for both styles.
    pub fn with_default(paths: Vec<PathBuf>) -> Self {
        Self {
            default: FontCandidates {
                title: paths.clone(),
                subtitle: paths,
            },
            languages: HashMap::new(),
        }
    }

    /// Set the candidates for one language and style.
    pub fn insert_language(&mut self, language: &str, style: FontStyle, paths: Vec<PathBuf>) {
        *self
            .languages
            .entry(language.to_lowercase())
            .or_default()
            .for_style_mut(style) = paths;
    }

    /// Full candidate chain for a language: its own entries, then the default.
    pub fn candidates(&self, language: &str, style: FontStyle) -> Vec<&Path> {
        let own = self
            .languages
            .get(&language.to_lowercase())
            .map(|entry| entry.for_style(style))
            .unwrap_or_default();
        own.iter()
            .chain(self.default.for_style(style))
            .map(PathBuf::as_path)
            .collect()
    }

    /// Load the first candidate that parses.
    ///
    /// # Errors
    ///
    /// Returns [`LingoframeError::FontLoad`] listing every failed candidate
    /// when none can be loaded.
    pub fn load(&self, language: &str, style: FontStyle) -> Result<FontFace, LingoframeError> {
        let candidates = self.candidates(language, style);
        let mut failures = Vec::new();

        for path in &candidates {
            match FontFace::from_file(path) {
                Ok(face) => {
                    log::debug!("Using font {} for {language} ({style:?})", path.display());
                    return Ok(face);
                }
                Err(error) => {
                    log::warn!("Font candidate {} failed: {error}", path.display());
                    failures.push(format!("{}: {error}", path.display()));
                }
            }
        }

        Err(LingoframeError::FontLoad {
            language: language.to_string(),
            reason: if failures.is_empty() {
                "no font candidates configured".to_string()
            } else {
                failures.join("; ")
            },
        })
    }
}

/// A parsed font face.
pub struct FontFace {
    font: Font,
    source: Option<PathBuf>,
}

impl Debug for FontFace {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("FontFace")
            .field("source", &self.source)
            .field("glyphs", &self.font.glyph_count())
            .finish()
    }
}

impl FontFace {
    /// Parse a font from memory.
    ///
    /// # Errors
    ///
    /// [`LingoframeError::Configuration`] if the data is not a usable font.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, LingoframeError> {
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|error| LingoframeError::Configuration(format!("invalid font data: {error}")))?;
        Ok(Self { font, source: None })
    }

    /// Read and parse a font file.
    ///
    /// # Errors
    ///
    /// I/O errors, or [`LingoframeError::Configuration`] for unparsable data.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LingoframeError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let mut face = Self::from_bytes(bytes)?;
        face.source = Some(path.to_path_buf());
        Ok(face)
    }

    /// Path the face was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Whether the face has a glyph for `ch`.
    pub fn has_glyph(&self, ch: char) -> bool {
        self.font.lookup_glyph_index(ch) != 0
    }
}

impl TextMeasure for FontFace {
    fn text_width(&self, text: &str, size: f32) -> f32 {
        text.chars()
            .map(|ch| self.font.metrics(ch, size).advance_width)
            .sum()
    }

    fn line_height(&self, size: f32) -> f32 {
        self.font
            .horizontal_line_metrics(size)
            .map(|metrics| metrics.ascent - metrics.descent)
            .unwrap_or(size * 1.2)
    }
}

impl GlyphSource for FontFace {
    fn ascent(&self, size: f32) -> f32 {
        self.font
            .horizontal_line_metrics(size)
            .map(|metrics| metrics.ascent)
            .unwrap_or(size * 0.8)
    }

    fn rasterize(&self, ch: char, size: f32) -> GlyphBitmap {
        let (metrics, coverage) = self.font.rasterize(ch, size);
        GlyphBitmap {
            width: metrics.width,
            height: metrics.height,
            xmin: metrics.xmin,
            ymin: metrics.ymin,
            advance: metrics.advance_width,
            coverage,
        }
    }
}
