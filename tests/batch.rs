mod common;

use std::path::Path;
use std::sync::Arc;

use common::{BLACK, BlockFont, MemorySource, RawFileSink, pixels_not};
use lingoframe::{
    BatchRenderer, CancellationToken, FitConstraints, FontTable, JobRunner, LingoframeError,
    OverlayFonts, Region, RenderJob, RenderOptions, RenderReport, TimedSegment, render_with,
};
use image::RgbImage;
use tempfile::tempdir;

fn job(language: &str, output: &Path) -> RenderJob {
    RenderJob::builder("clip.mp4", output, language)
        .title(format!("Title {language}"), Region::new(0, 0, 64, 24))
        .subtitles(
            vec![
                TimedSegment::new(0.0, 0.4, "one").unwrap(),
                TimedSegment::new(0.4, 0.8, "second").unwrap(),
                TimedSegment::new(0.8, 1.2, "the third").unwrap(),
            ],
            Region::new(0, 30, 64, 48),
        )
        .build()
}

/// Renders from memory; the `broken` language fails on its fifth frame.
fn memory_runner(
    job: &RenderJob,
    _fonts: &FontTable,
    options: &RenderOptions,
) -> Result<RenderReport, LingoframeError> {
    let mut source = MemorySource::solid(64, 48, 10.0, 12, BLACK);
    if job.language == "broken" {
        source = source.failing_after(4);
    }
    let sink = RawFileSink::create(&job.output_video_path)?;
    let fonts = OverlayFonts {
        title: Some(&BlockFont),
        subtitle: Some(&BlockFont),
    };
    render_with(job, source, sink, &fonts, options)
}

fn options() -> RenderOptions {
    RenderOptions::new().with_subtitle_constraints(
        FitConstraints::subtitle()
            .with_margins(2, 2)
            .with_size_range(12, 4),
    )
}

fn renderer() -> BatchRenderer<impl JobRunner> {
    BatchRenderer::new(Arc::new(FontTable::default()), options()).with_runner(memory_runner)
}

/// Frame `index` of a raw 64x48 RGB file.
fn raw_frame(bytes: &[u8], index: usize) -> RgbImage {
    let size = 64 * 48 * 3;
    RgbImage::from_raw(64, 48, bytes[index * size..(index + 1) * size].to_vec()).unwrap()
}

// ── Failure isolation ──────────────────────────────────────────────

#[test]
fn failing_language_does_not_stop_the_others() {
    let dir = tempdir().unwrap();
    let jobs = vec![
        job("broken", &dir.path().join("broken.raw")),
        job("spanish", &dir.path().join("spanish.raw")),
    ];

    let report = renderer().render_all(&jobs);

    assert!(!report.is_success());
    assert_eq!(report.failure_count(), 1);
    let (language, error) = report.failed().next().unwrap();
    assert_eq!(language, "broken");
    assert!(matches!(error, LingoframeError::VideoDecodeError(_)));

    let spanish: Vec<_> = report.succeeded().collect();
    assert_eq!(spanish.len(), 1);
    assert_eq!(spanish[0].frames, 12);

    // Only the completed render reaches its final path.
    let produced = std::fs::read(dir.path().join("spanish.raw")).unwrap();
    assert_eq!(produced.len(), 64 * 48 * 3 * 12);
    assert!(!dir.path().join("broken.raw").exists());

    // Every frame carries a subtitle, and the text follows the cues.
    for index in 0..12 {
        let frame = raw_frame(&produced, index);
        assert!(pixels_not(&frame, 0, 30, 64, 48, BLACK) > 0, "frame {index}");
    }
    let (first, middle, last) = (
        raw_frame(&produced, 0),
        raw_frame(&produced, 5),
        raw_frame(&produced, 11),
    );
    assert_eq!(
        raw_frame(&produced, 4).as_raw(),
        first.as_raw(),
        "t = 0.4 still shows the first cue"
    );
    assert_ne!(first.as_raw(), middle.as_raw());
    assert_ne!(middle.as_raw(), last.as_raw());
}

#[test]
fn outcomes_keep_job_order() {
    let dir = tempdir().unwrap();
    let languages = ["thai", "broken", "korean", "arabic"];
    let jobs: Vec<_> = languages
        .iter()
        .map(|language| job(language, &dir.path().join(format!("{language}.raw"))))
        .collect();

    let report = renderer().render_all(&jobs);

    let order: Vec<&str> = report.outcomes.iter().map(|o| o.language.as_str()).collect();
    assert_eq!(order, languages);
    let ok: Vec<bool> = report.outcomes.iter().map(|o| o.is_success()).collect();
    assert_eq!(ok, vec![true, false, true, true]);
}

#[test]
fn default_runner_reports_missing_fonts_per_job() {
    let dir = tempdir().unwrap();
    let jobs = vec![job("spanish", &dir.path().join("a.mp4"))];

    let report = BatchRenderer::new(Arc::new(FontTable::default()), RenderOptions::new())
        .render_all(&jobs);

    assert_eq!(report.failure_count(), 1);
    assert!(matches!(
        report.outcomes[0].result,
        Err(LingoframeError::FontLoad { .. })
    ));
}

// ── Cancellation ───────────────────────────────────────────────────

#[test]
fn cancelled_batch_skips_remaining_jobs() {
    let dir = tempdir().unwrap();
    let token = CancellationToken::new();
    token.cancel();
    let jobs = vec![
        job("spanish", &dir.path().join("spanish.raw")),
        job("thai", &dir.path().join("thai.raw")),
    ];

    let report = BatchRenderer::new(
        Arc::new(FontTable::default()),
        RenderOptions::new().with_cancellation(token),
    )
    .with_runner(memory_runner)
    .render_all(&jobs);

    assert_eq!(report.failure_count(), 2);
    assert!(report
        .failed()
        .all(|(_, error)| matches!(error, LingoframeError::Cancelled)));
    assert!(!dir.path().join("spanish.raw").exists());
}

// ── Report ─────────────────────────────────────────────────────────

#[test]
fn report_display_lists_each_language() {
    let dir = tempdir().unwrap();
    let spanish = dir.path().join("spanish.raw");
    let jobs = vec![job("spanish", &spanish), job("broken", &dir.path().join("b.raw"))];

    let text = renderer().render_all(&jobs).to_string();

    assert!(text.contains(&format!("[OK] spanish: {} (12 frames)", spanish.display())));
    assert!(text.contains("[FAILED] broken: Failed to decode video frame"));
}

#[test]
fn empty_batch() {
    let report = renderer().render_all(&[]);
    assert!(report.is_success());
    assert_eq!(report.to_string(), "No jobs.\n");
}

#[cfg(feature = "rayon")]
#[test]
fn parallel_batch_matches_sequential() {
    let dir = tempdir().unwrap();
    let jobs: Vec<_> = ["spanish", "broken", "thai"]
        .iter()
        .map(|language| job(language, &dir.path().join(format!("{language}.raw"))))
        .collect();

    let report = renderer().render_all_parallel(&jobs);

    let ok: Vec<bool> = report.outcomes.iter().map(|o| o.is_success()).collect();
    assert_eq!(ok, vec![true, false, true]);
}
