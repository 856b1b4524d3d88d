use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use lingoframe::{
    LingoframeError, OperationType, ProgressCallback, ProgressInfo, ProjectConfig, Region,
    SrtTranscriber, StaticTranslator, TimedSegment, Transcriber, Translator, VideoMetadata,
    output_file_name, prepare_jobs, transcript_text, translate_all,
};
use tempfile::tempdir;

const PROJECT: &str = r#"
languages = ["spanish", "french", "thai"]
output_dir = "out"

[title]
text = "Sleep better"
region = { x1 = 0, y1 = 0, x2 = 1080, y2 = 300 }

[subtitle]
region = { x1 = 40, y1 = 1500, x2 = 1040, y2 = 1800 }
background = "#000000"

[translations.thai]
title = "นอนหลับให้ดีขึ้น"
subtitles = "สวัสดี"
"#;

fn segments() -> Vec<TimedSegment> {
    vec![
        TimedSegment::new(0.0, 1.0, " Hello ").unwrap(),
        TimedSegment::new(1.0, 2.5, "Goodnight").unwrap(),
    ]
}

fn metadata() -> VideoMetadata {
    VideoMetadata::new(1080, 1920, 30.0)
}

fn translator() -> StaticTranslator {
    StaticTranslator::new()
        .with("spanish", "Sleep better", "Here is the translation:\n\"Duerme mejor\"")
        .with("spanish", "Hello\nGoodnight", "Hola\nBuenas noches")
        .with("french", "Sleep better", "Dormez mieux")
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

// ── Transcription ──────────────────────────────────────────────────

#[test]
fn sidecar_transcript_is_read() {
    let dir = tempdir().unwrap();
    let video = dir.path().join("clip.mp4");
    fs::write(
        dir.path().join("clip.srt"),
        "1\n00:00:00,000 --> 00:00:01,000\nHello\n",
    )
    .unwrap();

    let segments = SrtTranscriber::sidecar().transcribe(&video).unwrap();
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].text, "Hello");
}

#[test]
fn explicit_transcript_path_wins() {
    let transcriber = SrtTranscriber::from_file("/data/clip.es.srt");
    assert_eq!(
        transcriber.transcript_path(Path::new("/videos/clip.mp4")),
        Path::new("/data/clip.es.srt")
    );
}

#[test]
fn missing_transcript_is_configuration_error() {
    let result = SrtTranscriber::sidecar().transcribe(Path::new("/nonexistent/clip.mp4"));
    assert!(matches!(result, Err(LingoframeError::Configuration(_))));
}

// ── Translation ────────────────────────────────────────────────────

#[test]
fn transcript_text_is_one_line_per_segment() {
    assert_eq!(transcript_text(&segments()), "Hello\nGoodnight");
    assert_eq!(transcript_text(&[]), "");

    let multi_line = vec![
        TimedSegment::new(0.0, 2.0, "Today we talk\r\nabout  sleep").unwrap(),
        TimedSegment::new(2.0, 4.0, "Goodnight").unwrap(),
    ];
    assert_eq!(transcript_text(&multi_line), "Today we talk about sleep\nGoodnight");
}

#[test]
fn static_translator_is_case_insensitive_on_language() {
    let translator = translator();
    assert_eq!(
        translator.translate("Sleep better", "FRENCH").unwrap(),
        "Dormez mieux"
    );
    assert!(matches!(
        translator.translate("Unknown", "french"),
        Err(LingoframeError::Translation { .. })
    ));
}

#[test]
fn fan_out_keeps_order_and_isolates_failures() {
    let languages = vec!["spanish".to_string(), "german".to_string(), "french".to_string()];
    let progress = Arc::new(RecordingProgress::default());

    let results = translate_all(&translator(), "Sleep better", &languages, Some(progress.clone()));

    let order: Vec<&str> = results.iter().map(|(language, _)| language.as_str()).collect();
    assert_eq!(order, ["spanish", "german", "french"]);
    assert_eq!(results[0].1.as_deref().unwrap(), "Duerme mejor");
    assert!(results[1].1.is_err());
    assert_eq!(results[2].1.as_deref().unwrap(), "Dormez mieux");

    let events = progress.events.lock().unwrap();
    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|info| info.operation == OperationType::Translation));
    assert_eq!(events.iter().map(|info| info.current).max(), Some(3));
}

// ── Job preparation ────────────────────────────────────────────────

#[test]
fn jobs_are_built_for_every_translatable_language() {
    let project = ProjectConfig::from_toml_str(PROJECT).unwrap();
    let translator = translator();

    let prepared = prepare_jobs(
        &project,
        Path::new("clip.mp4"),
        &metadata(),
        &segments(),
        Some(&translator),
    )
    .unwrap();

    // French has a title but no transcript translation.
    assert_eq!(prepared.failures.len(), 1);
    assert_eq!(prepared.failures[0].0, "french");

    let languages: Vec<&str> = prepared.jobs.iter().map(|job| job.language.as_str()).collect();
    assert_eq!(languages, ["spanish", "thai"]);

    let spanish = &prepared.jobs[0];
    assert_eq!(spanish.title_text.as_deref(), Some("Duerme mejor"));
    assert_eq!(spanish.output_video_path, Path::new("out").join("Duerme_mejor.mp4"));
    assert_eq!(spanish.subtitle_at(0.5), "Hola");
    assert_eq!(spanish.subtitle_at(2.0), "Buenas noches");
    assert_eq!(spanish.subtitle_region, Region::new(40, 1500, 1040, 1800));
    assert_eq!(spanish.subtitle_background, image::Rgb([0, 0, 0]));

    // Pre-translated text is used as-is, re-timed onto the transcript.
    let thai = &prepared.jobs[1];
    assert_eq!(thai.title_text.as_deref(), Some("นอนหลับให้ดีขึ้น"));
    assert_eq!(thai.subtitle_segments.len(), 1);
    assert_eq!(thai.subtitle_segments[0].end, 1.0);
}

#[test]
fn without_translator_only_configured_languages_render() {
    let project = ProjectConfig::from_toml_str(PROJECT).unwrap();

    let prepared =
        prepare_jobs(&project, Path::new("clip.mp4"), &metadata(), &segments(), None).unwrap();

    assert_eq!(prepared.jobs.len(), 1);
    assert_eq!(prepared.jobs[0].language, "thai");
    let failed: Vec<&str> = prepared.failures.iter().map(|(l, _)| l.as_str()).collect();
    assert_eq!(failed, ["spanish", "french"]);
}

#[test]
fn empty_transcript_uses_fallback_slots() {
    let project = ProjectConfig::from_toml_str(
        r#"
languages = ["spanish"]
[subtitle]
region = { x1 = 0, y1 = 0, x2 = 100, y2 = 50 }
[translations.spanish]
subtitles = "uno\ndos"
"#,
    )
    .unwrap();

    let prepared = prepare_jobs(&project, Path::new("clip.mp4"), &metadata(), &[], None).unwrap();

    let job = &prepared.jobs[0];
    assert_eq!(job.subtitle_segments.len(), 2);
    assert_eq!(job.subtitle_at(3.0), "dos");
    assert!(!job.has_title());
    assert_eq!(job.output_video_path, Path::new("output").join("spanish.mp4"));
}

#[test]
fn colliding_titles_get_language_suffix() {
    let project = ProjectConfig::from_toml_str(
        r#"
languages = ["spanish", "catalan"]
[title]
text = "Hola"
region = { x1 = 0, y1 = 0, x2 = 100, y2 = 50 }
[translations.spanish]
title = "Hola"
[translations.catalan]
title = "Hola"
"#,
    )
    .unwrap();

    let prepared = prepare_jobs(&project, Path::new("clip.mp4"), &metadata(), &[], None).unwrap();

    let names: Vec<_> = prepared
        .jobs
        .iter()
        .map(|job| job.output_video_path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["Hola.mp4", "Hola_catalan.mp4"]);
}

/// Replies with the text it was given.
struct EchoTranslator;

impl Translator for EchoTranslator {
    fn translate(&self, text: &str, _language: &str) -> Result<String, LingoframeError> {
        Ok(text.to_string())
    }
}

#[test]
fn multi_line_cues_stay_on_their_own_segment() {
    let project = ProjectConfig::from_toml_str(
        r#"
languages = ["spanish"]
[subtitle]
region = { x1 = 0, y1 = 0, x2 = 100, y2 = 50 }
"#,
    )
    .unwrap();
    let segments = vec![
        TimedSegment::new(0.0, 2.0, "Hello\neveryone").unwrap(),
        TimedSegment::new(2.0, 4.0, "Goodnight").unwrap(),
    ];

    let prepared = prepare_jobs(
        &project,
        Path::new("clip.mp4"),
        &metadata(),
        &segments,
        Some(&EchoTranslator),
    )
    .unwrap();

    let job = &prepared.jobs[0];
    assert_eq!(job.subtitle_segments.len(), 2);
    assert_eq!(job.subtitle_at(1.0), "Hello everyone");
    assert_eq!(job.subtitle_at(3.0), "Goodnight");
    assert_eq!(job.subtitle_segments[1].start, 2.0);
}

// ── Output naming ──────────────────────────────────────────────────

#[test]
fn output_names_keep_letters_from_any_script() {
    assert_eq!(output_file_name(Some("안녕 하세요!"), "korean", ".mkv"), "안녕_하세요.mkv");
    assert_eq!(
        output_file_name(Some("  Sleep,  better  "), "english", "mp4"),
        "Sleep_better.mp4"
    );
}

#[test]
fn output_names_fall_back_to_language() {
    assert_eq!(output_file_name(Some(""), "thai", "mp4"), "thai.mp4");
    assert_eq!(output_file_name(Some("!!! ..."), "thai", "mp4"), "thai.mp4");
    assert_eq!(output_file_name(None, "", "mp4"), "output.mp4");
}
