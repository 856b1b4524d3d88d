//! Re-timing translated text onto the original cue grid.
//!
//! Translation services return prose, not per-cue text. [`remap`] aligns the
//! translation structurally: the `i`-th non-blank translated line inherits
//! the timing of the `i`-th original segment. There is no lexical alignment;
//! a translation with fewer lines than the transcript leaves the trailing
//! cues without text (and they are dropped), extra lines are ignored.
//!
//! When no timing scaffold exists at all, lines are laid out on fixed
//! [`FALLBACK_SLOT_SECONDS`] slots from zero, and only the first
//! [`FALLBACK_MAX_LINES`] lines are kept.

use crate::segment::TimedSegment;

/// Slot length for synthetic timing, in seconds.
pub const FALLBACK_SLOT_SECONDS: f64 = 2.5;

/// Maximum number of lines laid out with synthetic timing.
pub const FALLBACK_MAX_LINES: usize = 10;

/// Opening phrases of explanatory replies that are not part of the translation.
const PREAMBLES: &[&str] = &[
    "here is",
    "here's",
    "the translation",
    "the korean text",
    "translated to",
    "translation:",
];

/// Align `translated` onto the timing of `original`.
///
/// # Example
///
/// ```
/// use lingoframe::{remap, TimedSegment};
///
/// let original = vec![
///     TimedSegment::new(0.0, 2.0, "x")?,
///     TimedSegment::new(2.0, 4.0, "y")?,
/// ];
/// let remapped = remap(&original, "hola\nadios");
/// assert_eq!(remapped[1].text, "adios");
/// assert_eq!((remapped[1].start, remapped[1].end), (2.0, 4.0));
/// # Ok::<(), lingoframe::LingoframeError>(())
/// ```
pub fn remap(original: &[TimedSegment], translated: &str) -> Vec<TimedSegment> {
    let lines = translated_lines(translated);

    if original.is_empty() {
        log::warn!(
            "No timing scaffold; laying out {} of {} lines on {FALLBACK_SLOT_SECONDS}s slots",
            lines.len().min(FALLBACK_MAX_LINES),
            lines.len(),
        );
        return lines
            .into_iter()
            .take(FALLBACK_MAX_LINES)
            .enumerate()
            .map(|(i, line)| {
                let start = i as f64 * FALLBACK_SLOT_SECONDS;
                TimedSegment {
                    start,
                    end: start + FALLBACK_SLOT_SECONDS,
                    text: line.to_string(),
                }
            })
            .collect();
    }

    log::debug!(
        "Remapping {} translated lines onto {} segments",
        lines.len(),
        original.len()
    );

    original
        .iter()
        .enumerate()
        .filter_map(|(i, segment)| {
            let line = lines.get(i).copied().unwrap_or("");
            (!line.is_empty()).then(|| TimedSegment {
                start: segment.start,
                end: segment.end,
                text: line.to_string(),
            })
        })
        .collect()
}

/// Split on newlines, trim, and drop blank lines.
fn translated_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Strip explanatory prose that translation models sometimes wrap around
/// their answer.
///
/// Only replies that *open* with a known preamble are touched: the preamble
/// lines are removed and a line fully wrapped in double quotes is unquoted.
/// Anything else is returned trimmed but otherwise unchanged, so multi-line
/// translations keep their line structure for [`remap`].
///
/// ```
/// use lingoframe::clean_translation;
///
/// let reply = "Here is the translation:\n\"Hello everyone\"";
/// assert_eq!(clean_translation(reply), "Hello everyone");
/// assert_eq!(clean_translation("Bonjour\nà tous"), "Bonjour\nà tous");
/// ```
pub fn clean_translation(raw: &str) -> String {
    let trimmed = raw.trim();
    if !is_preamble(trimmed) {
        return trimmed.to_string();
    }

    trimmed
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_preamble(line))
        .map(unquote)
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_preamble(line: &str) -> bool {
    let lower = line.to_lowercase();
    PREAMBLES.iter().any(|preamble| lower.starts_with(preamble))
}

fn unquote(line: &str) -> &str {
    line.strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(line)
}
