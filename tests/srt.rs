use std::fs;

use lingoframe::LingoframeError;
use lingoframe::srt::{parse_srt, read_srt, to_srt};
use tempfile::tempdir;

const SAMPLE: &str = "\u{feff}1\r\n00:00:00,000 --> 00:00:01,500\r\nHello everyone\r\n\r\n2\r\n00:00:01,500 --> 00:00:04,250\r\nToday we talk\r\nabout sleep\r\n\r\n";

#[test]
fn parses_crlf_with_bom_and_multiline_cues() {
    let segments = parse_srt(SAMPLE).unwrap();

    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].text, "Hello everyone");
    assert_eq!(segments[1].start, 1.5);
    assert_eq!(segments[1].end, 4.25);
    assert_eq!(segments[1].text, "Today we talk\nabout sleep");
}

#[test]
fn accepts_missing_index_and_dot_separator() {
    let srt = "00:01:00.100 --> 00:01:02.000 X1:10 X2:20\nsin número\n";
    let segments = parse_srt(srt).unwrap();
    assert_eq!(segments.len(), 1);
    assert!((segments[0].start - 60.1).abs() < 1e-9);
    assert_eq!(segments[0].end, 62.0);
}

#[test]
fn malformed_timing_reports_line() {
    let srt = "1\n00:00:00,000 --> 00:00:01,000\nok\n\n2\n00:00:99,000 -> nope\nbad\n";
    match parse_srt(srt) {
        Err(LingoframeError::TranscriptParse { line, .. }) => assert_eq!(line, 6),
        other => panic!("expected TranscriptParse, got {other:?}"),
    }
}

#[test]
fn inverted_cue_is_skipped() {
    let srt = "1\n00:00:05,000 --> 00:00:01,000\nbackwards\n\n2\n00:00:06,000 --> 00:00:07,000\nfine\n";
    let segments = parse_srt(srt).unwrap();
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].text, "fine");
}

#[test]
fn written_srt_reads_back() {
    let segments = parse_srt(SAMPLE).unwrap();
    let text = to_srt(&segments);
    assert!(text.starts_with("1\n00:00:00,000 --> 00:00:01,500\nHello everyone\n\n2\n"));

    let dir = tempdir().unwrap();
    let path = dir.path().join("clip.srt");
    fs::write(&path, text).unwrap();
    assert_eq!(read_srt(&path).unwrap(), segments);
}

#[test]
fn missing_file_is_io_error() {
    let result = read_srt("does/not/exist.srt");
    assert!(matches!(result, Err(LingoframeError::IoError(_))));
}
