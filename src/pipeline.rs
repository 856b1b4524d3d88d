//! The per-job render loop.
//!
//! [`VideoOverlayPipeline`] pulls frames from a [`FrameSource`], draws the
//! job's title and the subtitle active at each frame's presentation time,
//! and pushes the result into a [`FrameSink`]. The loop is strictly
//! sequential; jobs run in parallel with each other, never frames.
//!
//! ```text
//! Opened ──run──▶ Streaming { frame_index } ──exhausted──▶ Closed
//!                        │
//!                        └──any error / cancel──▶ Failed
//! ```
//!
//! [`render_job`] wires the FFmpeg reader and writer, fonts and options
//! together for a complete job.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use image::RgbImage;

use crate::config::RenderOptions;
use crate::error::LingoframeError;
use crate::font::{FontFace, FontStyle, FontTable};
use crate::job::RenderJob;
use crate::overlay::{FrameOverlayRenderer, GlyphSource, TextOverlay};
use crate::progress::{OperationType, ProgressTracker};
use crate::sink::{FrameSink, VideoWriter};
use crate::source::{FrameSource, VideoReader};

/// Lifecycle of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Source and sink are open; no frame processed yet.
    Opened,
    /// `frame_index` frames have been written.
    Streaming { frame_index: u64 },
    /// Every frame was written and the sink was finalized.
    Closed,
    /// The run stopped on an error or cancellation.
    Failed,
}

/// Summary of a finished render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderReport {
    pub language: String,
    pub output: PathBuf,
    /// Frames written.
    pub frames: u64,
    pub frames_per_second: f64,
    /// Wall-clock time spent rendering.
    pub elapsed: Duration,
}

impl RenderReport {
    /// Length of the produced video.
    pub fn video_duration(&self) -> Duration {
        if self.frames_per_second > 0.0 {
            Duration::from_secs_f64(self.frames as f64 / self.frames_per_second)
        } else {
            Duration::ZERO
        }
    }
}

/// Fonts resolved for one job. A slot is empty when its overlay is not drawn.
#[derive(Default)]
pub struct OverlayFonts<'a> {
    pub title: Option<&'a dyn GlyphSource>,
    pub subtitle: Option<&'a dyn GlyphSource>,
}

/// Frame loop over a source and a sink.
pub struct VideoOverlayPipeline<S, W> {
    source: S,
    sink: W,
    renderer: FrameOverlayRenderer,
    state: PipelineState,
}

impl<S: FrameSource, W: FrameSink> VideoOverlayPipeline<S, W> {
    pub fn new(source: S, sink: W, renderer: FrameOverlayRenderer) -> Self {
        Self {
            source,
            sink,
            renderer,
            state: PipelineState::Opened,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Give back the source and sink, e.g. to inspect an in-memory sink.
    pub fn into_parts(self) -> (S, W) {
        (self.source, self.sink)
    }

    /// Render every frame of the source for `job`.
    ///
    /// Returns the number of frames written. A pipeline runs once; calling
    /// `run` again after it left [`PipelineState::Opened`] is an error.
    ///
    /// # Errors
    ///
    /// Decode, encode and size-mismatch errors from the source and sink, or
    /// [`LingoframeError::Cancelled`] if the options' token fires. The
    /// state is [`PipelineState::Failed`] afterwards.
    pub fn run(
        &mut self,
        job: &RenderJob,
        fonts: &OverlayFonts<'_>,
        options: &RenderOptions,
    ) -> Result<u64, LingoframeError> {
        if self.state != PipelineState::Opened {
            return Err(LingoframeError::Configuration(format!(
                "pipeline for '{}' cannot run from state {:?}",
                job.language, self.state
            )));
        }

        match self.stream(job, fonts, options) {
            Ok(frames) => {
                self.state = PipelineState::Closed;
                Ok(frames)
            }
            Err(error) => {
                self.state = PipelineState::Failed;
                Err(error)
            }
        }
    }

    fn stream(
        &mut self,
        job: &RenderJob,
        fonts: &OverlayFonts<'_>,
        options: &RenderOptions,
    ) -> Result<u64, LingoframeError> {
        let metadata = self.source.metadata().clone();
        let mut tracker = ProgressTracker::new(
            options.progress.clone(),
            OperationType::Rendering,
            Some(metadata.frame_count),
            options.batch_size,
        )
        .for_language(&job.language);

        let mut frame_index: u64 = 0;
        self.state = PipelineState::Streaming { frame_index };

        loop {
            if options.is_cancelled() {
                log::debug!("Render of '{}' cancelled at frame {frame_index}", job.language);
                return Err(LingoframeError::Cancelled);
            }

            let Some(mut frame) = self.source.next_frame()? else {
                break;
            };

            let t = metadata.frame_time(frame_index);

            let (title, subtitle) = frame_overlays(job, fonts, t);
            self.renderer
                .render(&mut frame, t, title.as_ref(), subtitle.as_ref());
            self.sink.write_frame(&frame)?;

            frame_index += 1;
            self.state = PipelineState::Streaming { frame_index };
            tracker.advance(Some(frame_index - 1), Some(Duration::from_secs_f64(t)));
        }

        self.sink.finish()?;
        tracker.finish();
        Ok(frame_index)
    }
}

/// Title and subtitle overlays of `job` for the frame at `t`.
fn frame_overlays<'a>(
    job: &'a RenderJob,
    fonts: &OverlayFonts<'a>,
    t: f64,
) -> (Option<TextOverlay<'a>>, Option<TextOverlay<'a>>) {
    let title = match (job.title_text.as_deref(), job.title_region, fonts.title) {
        (Some(text), Some(region), Some(font)) => Some(TextOverlay {
            text,
            region,
            font,
            background: job.title_background,
        }),
        _ => None,
    };
    let subtitle = fonts.subtitle.map(|font| TextOverlay {
        text: job.subtitle_at(t),
        region: job.subtitle_region,
        font,
        background: job.subtitle_background,
    });
    (title, subtitle)
}

/// Load the fonts a job needs. Overlays that will not be drawn get no font,
/// so a job without a title never fails on a missing title font.
pub fn load_job_fonts(
    job: &RenderJob,
    fonts: &FontTable,
) -> Result<(Option<FontFace>, Option<FontFace>), LingoframeError> {
    let title = if job.has_title() {
        Some(fonts.load(&job.language, FontStyle::Title)?)
    } else {
        None
    };
    let subtitle = if job.has_subtitles() {
        Some(fonts.load(&job.language, FontStyle::Subtitle)?)
    } else {
        None
    };
    Ok((title, subtitle))
}

/// Run `job` over an arbitrary source and sink.
pub fn render_with<S: FrameSource, W: FrameSink>(
    job: &RenderJob,
    source: S,
    sink: W,
    fonts: &OverlayFonts<'_>,
    options: &RenderOptions,
) -> Result<RenderReport, LingoframeError> {
    let start = Instant::now();
    let frames_per_second = source.metadata().frames_per_second;
    let renderer = FrameOverlayRenderer::new(
        options.style,
        options.title_constraints.clone(),
        options.subtitle_constraints.clone(),
    );

    let mut pipeline = VideoOverlayPipeline::new(source, sink, renderer);
    let frames = pipeline.run(job, fonts, options)?;

    Ok(RenderReport {
        language: job.language.clone(),
        output: job.output_video_path.clone(),
        frames,
        frames_per_second,
        elapsed: start.elapsed(),
    })
}

/// Render one job from its source file to its output file.
///
/// Fonts are loaded first, then the source is opened and the output is
/// created with the source's size and frame rate.
///
/// # Errors
///
/// [`LingoframeError::FontLoad`] when a needed font chain has no loadable
/// candidate, [`LingoframeError::SourceOpen`] /
/// [`LingoframeError::OutputOpen`] when either file cannot be opened, and
/// any error from the frame loop.
pub fn render_job(
    job: &RenderJob,
    fonts: &FontTable,
    options: &RenderOptions,
) -> Result<RenderReport, LingoframeError> {
    log::info!(
        "Rendering '{}': {} -> {}",
        job.language,
        job.source_video_path.display(),
        job.output_video_path.display()
    );

    let (title_font, subtitle_font) = load_job_fonts(job, fonts)?;
    let overlay_fonts = OverlayFonts {
        title: title_font.as_ref().map(|font| font as &dyn GlyphSource),
        subtitle: subtitle_font.as_ref().map(|font| font as &dyn GlyphSource),
    };

    let source = VideoReader::open(&job.source_video_path)?;
    let metadata = source.metadata().clone();

    if let Some(parent) = job.output_video_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|error| LingoframeError::OutputOpen {
                path: job.output_video_path.clone(),
                reason: error.to_string(),
            })?;
        }
    }

    let sink = VideoWriter::create(
        &job.output_video_path,
        metadata.width,
        metadata.height,
        metadata.frames_per_second,
        &options.encoder,
    )?;

    let report = render_with(job, source, sink, &overlay_fonts, options)?;
    log::info!(
        "Rendered '{}': {} frames in {:.2?}",
        report.language,
        report.frames,
        report.elapsed
    );
    Ok(report)
}

/// Render the overlays of `job` onto the frame shown at `t` seconds.
///
/// Decodes from the start of the source up to `t`; when the source is
/// shorter the last frame is used.
///
/// # Errors
///
/// Font, open and decode errors as for [`render_job`];
/// [`LingoframeError::VideoDecodeError`] when the source has no frames.
pub fn preview_frame(
    job: &RenderJob,
    fonts: &FontTable,
    options: &RenderOptions,
    t: f64,
) -> Result<RgbImage, LingoframeError> {
    let (title_font, subtitle_font) = load_job_fonts(job, fonts)?;
    let overlay_fonts = OverlayFonts {
        title: title_font.as_ref().map(|font| font as &dyn GlyphSource),
        subtitle: subtitle_font.as_ref().map(|font| font as &dyn GlyphSource),
    };
    let mut source = VideoReader::open(&job.source_video_path)?;
    preview_from(job, &mut source, &overlay_fonts, options, t)
}

/// [`preview_frame`] over an arbitrary source.
pub fn preview_from<S: FrameSource>(
    job: &RenderJob,
    source: &mut S,
    fonts: &OverlayFonts<'_>,
    options: &RenderOptions,
    t: f64,
) -> Result<RgbImage, LingoframeError> {
    let metadata = source.metadata().clone();
    let mut selected: Option<(RgbImage, f64)> = None;
    let mut frame_index: u64 = 0;

    while let Some(frame) = source.next_frame()? {
        let frame_time = metadata.frame_time(frame_index);
        if frame_time > t && selected.is_some() {
            break;
        }
        selected = Some((frame, frame_time));
        frame_index += 1;
    }

    let (mut frame, frame_time) = selected.ok_or_else(|| {
        LingoframeError::VideoDecodeError("source produced no frames".to_string())
    })?;

    let (title, subtitle) = frame_overlays(job, fonts, frame_time);
    let mut renderer = FrameOverlayRenderer::new(
        options.style,
        options.title_constraints.clone(),
        options.subtitle_constraints.clone(),
    );
    renderer.render(&mut frame, frame_time, title.as_ref(), subtitle.as_ref());
    Ok(frame)
}
