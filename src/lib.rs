//! # lingoframe
//!
//! Burn translated titles and subtitles into short-form video, once per
//! target language.
//!
//! A transcript of the source video (timed segments) is translated into
//! each target language, the translated lines are re-timed onto the
//! original segments, and every frame of the video is re-rendered with a
//! title box and the subtitle active at that frame's presentation time.
//! Fonts are chosen per language so scripts such as Thai, Korean or Arabic
//! render with a face that covers them. Decoding and encoding go through
//! FFmpeg via the [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next)
//! crate; text is rasterized with [`fontdue`](https://crates.io/crates/fontdue).
//!
//! ## Quick Start
//!
//! ### Re-time a translation
//!
//! ```
//! use lingoframe::{TimedSegment, remap};
//!
//! let original = vec![
//!     TimedSegment::new(0.0, 1.5, "Hello everyone")?,
//!     TimedSegment::new(1.5, 3.0, "Welcome back")?,
//! ];
//! let spanish = remap(&original, "Hola a todos\nBienvenidos de nuevo");
//! assert_eq!(spanish[1].text, "Bienvenidos de nuevo");
//! assert_eq!(spanish[1].start, 1.5);
//! # Ok::<(), lingoframe::LingoframeError>(())
//! ```
//!
//! ### Render one language
//!
//! ```no_run
//! use lingoframe::{FontTable, Region, RenderJob, RenderOptions, TimedSegment, render_job};
//!
//! let fonts = FontTable::with_default(vec!["fonts/NotoSans-Bold.ttf".into()]);
//! let job = RenderJob::builder("clip.mp4", "out/clip_es.mp4", "spanish")
//!     .title("Tres consejos para dormir mejor", Region::new(0, 80, 1080, 380))
//!     .subtitles(
//!         vec![TimedSegment::new(0.0, 2.0, "Hola a todos")?],
//!         Region::new(40, 1400, 1040, 1700),
//!     )
//!     .build();
//!
//! let report = render_job(&job, &fonts, &RenderOptions::new())?;
//! println!("{} frames written", report.frames);
//! # Ok::<(), lingoframe::LingoframeError>(())
//! ```
//!
//! ### Render every language of a project
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use lingoframe::{
//!     BatchRenderer, FrameSource, ProjectConfig, SrtTranscriber, Transcriber, VideoReader,
//!     prepare_jobs,
//! };
//!
//! let project = ProjectConfig::load("project.toml")?;
//! let source = std::path::Path::new("clip.mp4");
//! let metadata = VideoReader::open(source)?.metadata().clone();
//! let segments = SrtTranscriber::sidecar().transcribe(source)?;
//!
//! let prepared = prepare_jobs(&project, source, &metadata, &segments, None)?;
//! let renderer = BatchRenderer::new(
//!     Arc::new(project.font_table()),
//!     project.render_options(Default::default()),
//! );
//! print!("{}", renderer.render_all(&prepared.jobs));
//! # Ok::<(), lingoframe::LingoframeError>(())
//! ```
//!
//! ## Features
//!
//! - **Timing**: first-match active-text lookup and structural re-timing of
//!   translated lines, with fixed slots when no timing exists
//! - **Layout**: largest-fitting font size by linear search, two-line title
//!   split and greedy subtitle wrapping
//! - **Rendering**: background boxes, outlined text, per-layout caching
//! - **Per-language fonts**: ordered candidate chains with a default
//!   fallback
//! - **Batch isolation**: one language failing never stops the others
//! - **Progress & cancellation**: cooperative callbacks and
//!   `CancellationToken`
//! - **Project files**: TOML description of languages, regions, fonts and
//!   translations
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `rayon` | Parallel jobs (`render_all_parallel`) and translation fan-out |
//! | `full` | Enables all of the above |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod batch;
pub mod config;
mod conversion;
pub mod error;
pub mod ffmpeg;
pub mod fit;
pub mod font;
pub mod job;
pub mod localize;
pub mod metadata;
pub mod overlay;
pub mod pipeline;
pub mod progress;
pub mod project;
pub mod region;
pub mod remap;
pub mod segment;
pub mod sink;
pub mod source;
pub mod srt;

pub use batch::{BatchRenderer, BatchReport, FfmpegJobRunner, JobOutcome, JobRunner};
pub use config::{EncoderOptions, RenderOptions, VideoCodec};
pub use error::LingoframeError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use fit::{FitConstraints, FitMode, FitResult, TextFitter, TextMeasure};
pub use font::{FontCandidates, FontFace, FontStyle, FontTable};
pub use job::{RenderJob, RenderJobBuilder, output_file_name};
pub use localize::{
    PreparedJobs, SrtTranscriber, StaticTranslator, Transcriber, Translator, prepare_jobs,
    transcript_text, translate_all,
};
pub use metadata::VideoMetadata;
pub use overlay::{FrameOverlayRenderer, GlyphBitmap, GlyphSource, OverlayStyle, TextOverlay};
pub use pipeline::{
    OverlayFonts, PipelineState, RenderReport, VideoOverlayPipeline, preview_frame, render_job,
    render_with,
};
pub use progress::{CancellationToken, OperationType, ProgressCallback, ProgressInfo};
pub use project::ProjectConfig;
pub use region::{
    DEFAULT_SUBTITLE_BACKGROUND, DEFAULT_TITLE_BACKGROUND, Region, RegionSpec, RelativeRegion,
    parse_hex_color,
};
pub use remap::{clean_translation, remap};
pub use segment::{SegmentTrack, TimedSegment, active_text};
pub use sink::{FrameSink, VideoWriter};
pub use source::{FrameSource, VideoReader};
