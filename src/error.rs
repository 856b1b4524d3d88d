//! Error types for the `lingoframe` crate.
//!
//! This module defines [`LingoframeError`], the unified error type returned by
//! all fallible operations in the crate. Degraded-but-valid conditions such as
//! a disabled overlay region or text that does not fit even at the minimum
//! font size are *not* errors; they are handled inside the renderer and the
//! fitter and never surface here.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `lingoframe` operations.
///
/// Every public method that can fail returns `Result<T, LingoframeError>`.
/// Within a batch, an error is scoped to the render job that produced it.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LingoframeError {
    /// The source video could not be opened for reading.
    #[error("Failed to open source video at {path}: {reason}")]
    SourceOpen {
        /// Path of the source video.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The output video could not be created.
    #[error("Failed to open output video at {path}: {reason}")]
    OutputOpen {
        /// Path of the output video.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The source file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// A video frame could not be encoded or written.
    #[error("Video encoding error: {0}")]
    VideoEncodeError(String),

    /// A frame handed to a sink does not match the stream dimensions.
    #[error("Frame is {actual_width}x{actual_height} but the stream is {expected_width}x{expected_height}")]
    FrameSizeMismatch {
        /// Width the sink was opened with.
        expected_width: u32,
        /// Height the sink was opened with.
        expected_height: u32,
        /// Width of the rejected frame.
        actual_width: u32,
        /// Height of the rejected frame.
        actual_height: u32,
    },

    /// A timed segment violates `0 <= start < end`.
    #[error("Invalid segment: start ({start}) must be >= 0 and less than end ({end})")]
    InvalidSegment {
        /// Start time in seconds.
        start: f64,
        /// End time in seconds.
        end: f64,
    },

    /// A transcript file could not be parsed.
    #[error("Transcript parse error at line {line}: {reason}")]
    TranscriptParse {
        /// One-based line number where parsing failed.
        line: usize,
        /// What was wrong.
        reason: String,
    },

    /// No font candidate could be loaded for a language, including the
    /// default fallback chain.
    #[error("No usable font for language '{language}': {reason}")]
    FontLoad {
        /// Language key that was requested.
        language: String,
        /// Collected reasons from every candidate that was tried.
        reason: String,
    },

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The translation collaborator failed for one language.
    #[error("Translation to '{language}' failed: {reason}")]
    Translation {
        /// Target language key.
        language: String,
        /// Reason reported by the translator.
        reason: String,
    },

    /// The operation was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}

impl From<FfmpegError> for LingoframeError {
    fn from(error: FfmpegError) -> Self {
        LingoframeError::FfmpegError(error.to_string())
    }
}

impl From<toml::de::Error> for LingoframeError {
    fn from(error: toml::de::Error) -> Self {
        LingoframeError::Configuration(error.to_string())
    }
}
