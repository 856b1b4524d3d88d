//! Render job definition.
//!
//! A [`RenderJob`] describes one output video: one source, one target
//! language, its translated title and re-timed subtitle segments, and where
//! to draw them. Jobs are built once per (video, language) and are read-only
//! afterwards.
//!
//! # Example
//!
//! ```
//! use lingoframe::{Region, RenderJob, TimedSegment};
//!
//! let job = RenderJob::builder("clip.mp4", "out/clip_es.mp4", "spanish")
//!     .title("Hola mundo", Region::new(0, 0, 1080, 300))
//!     .subtitles(
//!         vec![TimedSegment::new(0.0, 2.0, "Bienvenidos")?],
//!         Region::new(40, 1500, 1040, 1800),
//!     )
//!     .build();
//! assert_eq!(job.language, "spanish");
//! # Ok::<(), lingoframe::LingoframeError>(())
//! ```

use std::path::PathBuf;

use image::Rgb;

use crate::region::{DEFAULT_SUBTITLE_BACKGROUND, DEFAULT_TITLE_BACKGROUND, Region};
use crate::segment::{TimedSegment, active_text};

/// Everything needed to render one localized output video.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderJob {
    pub source_video_path: PathBuf,
    pub output_video_path: PathBuf,
    /// Language key, also used to pick fonts.
    pub language: String,
    /// Title drawn on every frame. `None` draws no title box at all.
    pub title_text: Option<String>,
    pub title_region: Option<Region>,
    /// Subtitle timing, already remapped onto the translated lines.
    pub subtitle_segments: Vec<TimedSegment>,
    /// Disabled by default, in which case no subtitles are drawn.
    pub subtitle_region: Region,
    pub title_background: Rgb<u8>,
    pub subtitle_background: Rgb<u8>,
}

impl RenderJob {
    /// Start building a job with no title and no subtitles.
    pub fn builder(
        source: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        language: impl Into<String>,
    ) -> RenderJobBuilder {
        RenderJobBuilder {
            job: RenderJob {
                source_video_path: source.into(),
                output_video_path: output.into(),
                language: language.into(),
                title_text: None,
                title_region: None,
                subtitle_segments: Vec::new(),
                subtitle_region: Region::new(0, 0, 0, 0),
                title_background: DEFAULT_TITLE_BACKGROUND,
                subtitle_background: DEFAULT_SUBTITLE_BACKGROUND,
            },
        }
    }

    /// Subtitle text active at `t` seconds.
    pub fn subtitle_at(&self, t: f64) -> &str {
        active_text(&self.subtitle_segments, t)
    }

    /// Whether a title box will be drawn.
    pub fn has_title(&self) -> bool {
        self.title_text.is_some() && self.title_region.is_some_and(|region| region.is_enabled())
    }

    /// Whether subtitles can be drawn at all.
    pub fn has_subtitles(&self) -> bool {
        self.subtitle_region.is_enabled() && !self.subtitle_segments.is_empty()
    }
}

/// Builder for [`RenderJob`].
#[derive(Debug, Clone)]
pub struct RenderJobBuilder {
    job: RenderJob,
}

impl RenderJobBuilder {
    #[must_use]
    pub fn title(mut self, text: impl Into<String>, region: Region) -> Self {
        self.job.title_text = Some(text.into());
        self.job.title_region = Some(region);
        self
    }

    #[must_use]
    pub fn subtitles(mut self, segments: Vec<TimedSegment>, region: Region) -> Self {
        self.job.subtitle_segments = segments;
        self.job.subtitle_region = region;
        self
    }

    #[must_use]
    pub fn title_background(mut self, color: Rgb<u8>) -> Self {
        self.job.title_background = color;
        self
    }

    #[must_use]
    pub fn subtitle_background(mut self, color: Rgb<u8>) -> Self {
        self.job.subtitle_background = color;
        self
    }

    pub fn build(self) -> RenderJob {
        self.job
    }
}

/// File name for a localized output: the title's alphanumeric characters,
/// spaces turned into `_`, followed by `.{extension}`. Falls back to the
/// language key when the title has nothing usable.
///
/// ```
/// use lingoframe::output_file_name;
///
/// assert_eq!(output_file_name(Some("¡Hola, mundo!"), "spanish", "mp4"), "Hola_mundo.mp4");
/// assert_eq!(output_file_name(Some("???"), "spanish", "mp4"), "spanish.mp4");
/// assert_eq!(output_file_name(None, "thai", "mkv"), "thai.mkv");
/// ```
pub fn output_file_name(title: Option<&str>, language: &str, extension: &str) -> String {
    let sanitized = title.map(sanitize_title).unwrap_or_default();
    let stem = if sanitized.is_empty() {
        sanitize_title(language)
    } else {
        sanitized
    };
    let stem = if stem.is_empty() { "output".to_string() } else { stem };
    format!("{stem}.{}", extension.trim_start_matches('.'))
}

fn sanitize_title(title: &str) -> String {
    title
        .split_whitespace()
        .map(|word| word.chars().filter(|ch| ch.is_alphanumeric()).collect::<String>())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}
