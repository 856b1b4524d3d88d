//! Timed text segments and the active-text lookup.
//!
//! A [`TimedSegment`] is a `[start, end]` span in seconds carrying one cue of
//! text. [`active_text`] resolves which cue is on screen at a given time.
//! Segments are not required to be sorted or disjoint: the lookup scans in
//! input order and the first segment whose closed interval contains `t` wins.
//!
//! # Example
//!
//! ```
//! use lingoframe::{SegmentTrack, TimedSegment};
//!
//! let track = SegmentTrack::new(vec![
//!     TimedSegment::new(0.0, 2.0, "hello")?,
//!     TimedSegment::new(2.0, 4.0, "world")?,
//! ]);
//!
//! assert_eq!(track.active_text(1.0), "hello");
//! // Shared boundary: the earlier segment wins.
//! assert_eq!(track.active_text(2.0), "hello");
//! assert_eq!(track.active_text(9.0), "");
//! # Ok::<(), lingoframe::LingoframeError>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::error::LingoframeError;

/// One cue of text displayed between `start` and `end` (seconds, inclusive).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedSegment {
    /// When the cue appears, in seconds.
    pub start: f64,
    /// When the cue disappears, in seconds.
    pub end: f64,
    /// The cue text. May contain newlines.
    pub text: String,
}

impl TimedSegment {
    /// Create a segment, checking `0 <= start < end`.
    ///
    /// # Errors
    ///
    /// Returns [`LingoframeError::InvalidSegment`] if the bounds are
    /// negative, inverted, empty or not finite.
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Result<Self, LingoframeError> {
        if !(start.is_finite() && end.is_finite()) || start < 0.0 || start >= end {
            return Err(LingoframeError::InvalidSegment { start, end });
        }
        Ok(Self {
            start,
            end,
            text: text.into(),
        })
    }

    /// Whether `t` lies inside `[start, end]`.
    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t <= self.end
    }

    /// Length of the segment in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Return the text of the first segment containing `t`, or `""` if none does.
///
/// An empty result means "no overlay text at this time", not an error.
pub fn active_text(segments: &[TimedSegment], t: f64) -> &str {
    segments
        .iter()
        .find(|segment| segment.contains(t))
        .map(|segment| segment.text.as_str())
        .unwrap_or("")
}

/// An owned, ordered sequence of segments with lookup helpers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentTrack {
    segments: Vec<TimedSegment>,
}

impl SegmentTrack {
    /// Wrap an ordered list of segments. Order is preserved as given.
    pub fn new(segments: Vec<TimedSegment>) -> Self {
        Self { segments }
    }

    /// See [`active_text`].
    pub fn active_text(&self, t: f64) -> &str {
        active_text(&self.segments, t)
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` if the track holds no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Iterate segments in input order.
    pub fn iter(&self) -> impl Iterator<Item = &TimedSegment> {
        self.segments.iter()
    }

    /// Latest end time across all segments (0 for an empty track).
    pub fn duration(&self) -> f64 {
        self.segments
            .iter()
            .map(|segment| segment.end)
            .fold(0.0, f64::max)
    }

    /// Borrow the underlying segments.
    pub fn as_slice(&self) -> &[TimedSegment] {
        &self.segments
    }

    /// Consume the track and return its segments.
    pub fn into_inner(self) -> Vec<TimedSegment> {
        self.segments
    }
}

impl From<Vec<TimedSegment>> for SegmentTrack {
    fn from(segments: Vec<TimedSegment>) -> Self {
        Self::new(segments)
    }
}
