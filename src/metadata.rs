//! Video stream metadata.
//!
//! [`VideoMetadata`] is read once when a source is opened and tells the
//! pipeline how to open the matching output stream and how to convert a
//! frame index into a presentation time.

use std::time::Duration;

/// Metadata for the video stream of a source.
///
/// # Example
///
/// ```
/// use lingoframe::VideoMetadata;
///
/// let metadata = VideoMetadata::new(1080, 1920, 30.0);
/// assert_eq!(metadata.frame_time(45), 1.5);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second (may be approximate for variable-frame-rate content).
    pub frames_per_second: f64,
    /// Estimated total number of frames, 0 when unknown.
    pub frame_count: u64,
    /// Codec name (e.g. `"h264"`), empty when unknown.
    pub codec: String,
}

impl VideoMetadata {
    /// Metadata with only the parameters the pipeline needs.
    pub fn new(width: u32, height: u32, frames_per_second: f64) -> Self {
        Self {
            width,
            height,
            frames_per_second,
            frame_count: 0,
            codec: String::new(),
        }
    }

    /// Presentation time in seconds of frame `index` (`index / fps`).
    ///
    /// Returns 0 when the frame rate is unknown.
    pub fn frame_time(&self, index: u64) -> f64 {
        if self.frames_per_second > 0.0 {
            index as f64 / self.frames_per_second
        } else {
            0.0
        }
    }

    /// Estimated duration from the frame count and rate.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frame_time(self.frame_count).max(0.0))
    }
}
