mod common;

use std::sync::{Arc, Mutex};

use common::{BLACK, BLUE, BlockFont, MemorySink, MemorySource, WHITE, pixels_not};
use image::Rgb;
use lingoframe::pipeline::preview_from;
use lingoframe::{
    CancellationToken, FitConstraints, FrameOverlayRenderer, FrameSink, LingoframeError,
    OperationType, OverlayFonts, PipelineState, ProgressCallback, ProgressInfo, Region,
    RenderJob, RenderOptions, TimedSegment, VideoOverlayPipeline, render_with,
};

const TITLE_BG: Rgb<u8> = Rgb([60, 60, 60]);
const TITLE_REGION: Region = Region { x1: 0, y1: 0, x2: 160, y2: 40 };
const SUBTITLE_REGION: Region = Region { x1: 0, y1: 60, x2: 160, y2: 90 };

fn job() -> RenderJob {
    RenderJob::builder("clip.mp4", "out/clip_es.mp4", "spanish")
        .title("Hola mundo", TITLE_REGION)
        .subtitles(
            vec![
                TimedSegment::new(0.0, 0.5, "uno").unwrap(),
                TimedSegment::new(1.0, 1.5, "dos").unwrap(),
            ],
            SUBTITLE_REGION,
        )
        .subtitle_background(BLUE)
        .build()
}

fn fonts() -> OverlayFonts<'static> {
    OverlayFonts {
        title: Some(&BlockFont),
        subtitle: Some(&BlockFont),
    }
}

fn options() -> RenderOptions {
    RenderOptions::new()
        .with_title_constraints(FitConstraints::title().with_size_range(48, 4))
        .with_subtitle_constraints(FitConstraints::subtitle().with_margins(4, 4).with_size_range(32, 4))
}

/// 10 fps, 20 frames: frame `i` is shown at `i / 10` seconds.
fn source() -> MemorySource {
    MemorySource::solid(160, 100, 10.0, 20, BLACK)
}

fn subtitle_visible(frame: &image::RgbImage) -> bool {
    pixels_not(frame, 0, 60, 160, 90, BLACK) > 0
}

#[derive(Default)]
struct RecordingProgress {
    events: Mutex<Vec<ProgressInfo>>,
}

impl ProgressCallback for RecordingProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.events.lock().unwrap().push(info.clone());
    }
}

// ── Frame loop ─────────────────────────────────────────────────────

#[test]
fn every_frame_is_written_and_sink_finished() {
    let mut sink = MemorySink::default();
    let report = render_with(&job(), source(), &mut sink, &fonts(), &options()).unwrap();

    assert_eq!(report.frames, 20);
    assert_eq!(report.language, "spanish");
    assert_eq!(report.video_duration().as_secs_f64(), 2.0);
    assert_eq!(sink.frames.len(), 20);
    assert!(sink.finished);
}

#[test]
fn title_is_drawn_on_every_frame() {
    let mut sink = MemorySink::default();
    render_with(&job(), source(), &mut sink, &fonts(), &options()).unwrap();

    for frame in &sink.frames {
        assert_eq!(*frame.get_pixel(0, 0), TITLE_BG);
        assert!(frame.pixels().any(|pixel| *pixel == WHITE));
    }
}

#[test]
fn subtitles_follow_segment_windows() {
    let mut sink = MemorySink::default();
    render_with(&job(), source(), &mut sink, &fonts(), &options()).unwrap();

    let visible: Vec<usize> = sink
        .frames
        .iter()
        .enumerate()
        .filter(|(_, frame)| subtitle_visible(frame))
        .map(|(index, _)| index)
        .collect();
    // [0.0, 0.5] covers frames 0..=5, [1.0, 1.5] covers 10..=15.
    assert_eq!(visible, vec![0, 1, 2, 3, 4, 5, 10, 11, 12, 13, 14, 15]);
    // Frames between cues show the source untouched below the title.
    assert_eq!(pixels_not(&sink.frames[7], 0, 40, 160, 100, BLACK), 0);
}

#[test]
fn job_without_overlays_copies_frames() {
    let plain = RenderJob::builder("clip.mp4", "out.mp4", "thai").build();
    let mut sink = MemorySink::default();
    render_with(&plain, source(), &mut sink, &OverlayFonts::default(), &options()).unwrap();

    assert_eq!(sink.frames.len(), 20);
    assert!(sink.frames.iter().all(|frame| pixels_not(frame, 0, 0, 160, 100, BLACK) == 0));
}

// ── States ─────────────────────────────────────────────────────────

#[test]
fn pipeline_moves_from_opened_to_closed() {
    let mut pipeline = VideoOverlayPipeline::new(
        source(),
        MemorySink::default(),
        FrameOverlayRenderer::default(),
    );
    assert_eq!(pipeline.state(), PipelineState::Opened);

    let frames = pipeline.run(&job(), &fonts(), &options()).unwrap();
    assert_eq!(frames, 20);
    assert_eq!(pipeline.state(), PipelineState::Closed);

    // A pipeline runs once.
    let again = pipeline.run(&job(), &fonts(), &options());
    assert!(matches!(again, Err(LingoframeError::Configuration(_))));
    assert_eq!(pipeline.state(), PipelineState::Closed);
}

#[test]
fn decode_error_fails_pipeline_without_finishing_sink() {
    let mut pipeline = VideoOverlayPipeline::new(
        source().failing_after(7),
        MemorySink::default(),
        FrameOverlayRenderer::default(),
    );

    let result = pipeline.run(&job(), &fonts(), &options());
    assert!(matches!(result, Err(LingoframeError::VideoDecodeError(_))));
    assert_eq!(pipeline.state(), PipelineState::Failed);

    let (_, sink) = pipeline.into_parts();
    assert_eq!(sink.frames.len(), 7);
    assert!(!sink.finished);
}

#[test]
fn cancelled_token_stops_before_first_frame() {
    let token = CancellationToken::new();
    token.cancel();
    let options = options().with_cancellation(token);

    let mut pipeline =
        VideoOverlayPipeline::new(source(), MemorySink::default(), FrameOverlayRenderer::default());
    let result = pipeline.run(&job(), &fonts(), &options);

    assert!(matches!(result, Err(LingoframeError::Cancelled)));
    assert_eq!(pipeline.state(), PipelineState::Failed);
    assert!(pipeline.into_parts().1.frames.is_empty());
}

/// Sink that cancels the shared token once it has seen `after` frames.
struct CancellingSink {
    inner: MemorySink,
    token: CancellationToken,
    after: usize,
}

impl FrameSink for CancellingSink {
    fn write_frame(&mut self, frame: &image::RgbImage) -> Result<(), LingoframeError> {
        self.inner.write_frame(frame)?;
        if self.inner.frames.len() == self.after {
            self.token.cancel();
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), LingoframeError> {
        self.inner.finish()
    }
}

#[test]
fn cancellation_mid_render_stops_between_frames() {
    let token = CancellationToken::new();
    let mut sink = CancellingSink {
        inner: MemorySink::default(),
        token: token.clone(),
        after: 5,
    };
    let options = options().with_cancellation(token);

    let result = render_with(&job(), source(), &mut sink, &fonts(), &options);

    assert!(matches!(result, Err(LingoframeError::Cancelled)));
    assert_eq!(sink.inner.frames.len(), 5);
    assert!(!sink.inner.finished);
}

// ── Progress ───────────────────────────────────────────────────────

#[test]
fn progress_fires_every_batch_and_at_the_end() {
    let progress = Arc::new(RecordingProgress::default());
    let options = options().with_progress(progress.clone()).with_batch_size(8);

    render_with(&job(), source(), MemorySink::default(), &fonts(), &options).unwrap();

    let events = progress.events.lock().unwrap();
    let counts: Vec<u64> = events.iter().map(|info| info.current).collect();
    assert_eq!(counts, vec![8, 16, 20]);
    assert!(events.iter().all(|info| info.operation == OperationType::Rendering));
    assert!(events.iter().all(|info| info.language.as_deref() == Some("spanish")));
    assert_eq!(events[0].current_frame, Some(7));
    assert_eq!(events.last().unwrap().percentage, Some(100.0));
}

// ── Preview ────────────────────────────────────────────────────────

#[test]
fn preview_renders_frame_at_requested_time() {
    let mut during_cue = source();
    let frame = preview_from(&job(), &mut during_cue, &fonts(), &options(), 1.2).unwrap();
    assert!(subtitle_visible(&frame));

    let mut between_cues = source();
    let frame = preview_from(&job(), &mut between_cues, &fonts(), &options(), 0.8).unwrap();
    assert!(!subtitle_visible(&frame));
    assert_eq!(*frame.get_pixel(0, 0), TITLE_BG);
}

#[test]
fn preview_past_the_end_uses_last_frame() {
    let mut short = MemorySource::solid(160, 100, 10.0, 3, BLACK);
    let frame = preview_from(&job(), &mut short, &fonts(), &options(), 60.0).unwrap();
    // Last frame is at 0.2s, inside the first cue.
    assert!(subtitle_visible(&frame));
}

#[test]
fn preview_of_empty_source_fails() {
    let mut empty = MemorySource::solid(160, 100, 10.0, 0, BLACK);
    let result = preview_from(&job(), &mut empty, &fonts(), &options(), 0.0);
    assert!(matches!(result, Err(LingoframeError::VideoDecodeError(_))));
}
