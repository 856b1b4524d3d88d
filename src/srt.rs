//! SubRip (`.srt`) transcript reading and writing.
//!
//! Transcription engines hand back SRT; this module turns it into
//! [`TimedSegment`] values and back. Cues whose timing violates
//! `0 <= start < end` are skipped with a warning rather than failing the
//! whole transcript.

use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

use crate::error::LingoframeError;
use crate::segment::TimedSegment;

/// Parse SRT text into segments, in file order.
///
/// Accepts `\r\n` line endings, a leading byte-order mark, missing cue
/// numbers, and `.` as well as `,` before the milliseconds.
///
/// # Errors
///
/// Returns [`LingoframeError::TranscriptParse`] when a cue's timing line is
/// malformed.
///
/// # Example
///
/// ```
/// let srt = "1\n00:00:00,000 --> 00:00:02,500\n안녕하세요\n\n";
/// let segments = lingoframe::srt::parse_srt(srt)?;
/// assert_eq!(segments[0].end, 2.5);
/// # Ok::<(), lingoframe::LingoframeError>(())
/// ```
pub fn parse_srt(input: &str) -> Result<Vec<TimedSegment>, LingoframeError> {
    let input = input.trim_start_matches('\u{feff}');
    let lines: Vec<&str> = input.lines().map(|line| line.trim_end_matches('\r')).collect();

    let mut segments = Vec::new();
    let mut index = 0;

    while index < lines.len() {
        if lines[index].trim().is_empty() {
            index += 1;
            continue;
        }

        // Optional numeric cue identifier.
        if !lines[index].contains("-->") {
            index += 1;
            if index >= lines.len() {
                break;
            }
        }

        let timing_line = lines[index];
        let line_number = index + 1;
        let (start, end) = parse_timing_line(timing_line).ok_or_else(|| {
            LingoframeError::TranscriptParse {
                line: line_number,
                reason: format!("expected 'HH:MM:SS,mmm --> HH:MM:SS,mmm', found '{timing_line}'"),
            }
        })?;
        index += 1;

        let mut text_lines = Vec::new();
        while index < lines.len() && !lines[index].trim().is_empty() {
            text_lines.push(lines[index].trim());
            index += 1;
        }

        match TimedSegment::new(start, end, text_lines.join("\n")) {
            Ok(segment) => segments.push(segment),
            Err(error) => log::warn!("Skipping cue at line {line_number}: {error}"),
        }
    }

    log::debug!("Parsed {} transcript segments", segments.len());
    Ok(segments)
}

/// Read and parse an SRT file.
///
/// # Errors
///
/// I/O errors and the errors of [`parse_srt`].
pub fn read_srt<P: AsRef<Path>>(path: P) -> Result<Vec<TimedSegment>, LingoframeError> {
    let content = std::fs::read_to_string(path.as_ref())?;
    parse_srt(&content)
}

/// Serialize segments as SRT, numbering cues from 1.
pub fn to_srt(segments: &[TimedSegment]) -> String {
    let mut output = String::new();
    for (i, segment) in segments.iter().enumerate() {
        let _ = writeln!(output, "{}", i + 1);
        let _ = writeln!(
            output,
            "{} --> {}",
            format_srt_timestamp(segment.start),
            format_srt_timestamp(segment.end),
        );
        let _ = writeln!(output, "{}", segment.text);
        let _ = writeln!(output);
    }
    output
}

fn parse_timing_line(line: &str) -> Option<(f64, f64)> {
    let (left, right) = line.split_once("-->")?;
    let start = parse_srt_timestamp(left.trim())?;
    // Some writers append position hints after the end timestamp.
    let end = parse_srt_timestamp(right.trim().split_whitespace().next()?)?;
    Some((start, end))
}

/// Parse `HH:MM:SS,mmm` (or `HH:MM:SS.mmm`) into seconds.
fn parse_srt_timestamp(value: &str) -> Option<f64> {
    let normalized = value.replace(',', ".");
    let mut parts = normalized.split(':');
    let hours: u64 = parts.next()?.trim().parse().ok()?;
    let minutes: u64 = parts.next()?.trim().parse().ok()?;
    let seconds: f64 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() || minutes >= 60 || !(0.0..60.0).contains(&seconds) {
        return None;
    }
    Some(hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds)
}

/// Format seconds as an SRT timestamp (HH:MM:SS,mmm).
fn format_srt_timestamp(seconds: f64) -> String {
    let duration = Duration::from_millis((seconds.max(0.0) * 1000.0).round() as u64);
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    let millis = duration.subsec_millis();
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}
