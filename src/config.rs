//! Render configuration.
//!
//! [`RenderOptions`] is a builder that threads progress callbacks,
//! cancellation tokens, encoder settings and layout constraints through
//! [`render_job`](crate::render_job) and the batch renderer without
//! polluting every function signature.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use lingoframe::{
//!     CancellationToken, EncoderOptions, ProgressCallback, ProgressInfo, RenderOptions,
//!     VideoCodec,
//! };
//!
//! struct LogProgress;
//! impl ProgressCallback for LogProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{:?}: {} done", info.operation, info.current);
//!     }
//! }
//!
//! let token = CancellationToken::new();
//! let options = RenderOptions::new()
//!     .with_progress(Arc::new(LogProgress))
//!     .with_cancellation(token.clone())
//!     .with_batch_size(30)
//!     .with_encoder(EncoderOptions::default().codec(VideoCodec::H265).crf(28));
//! assert_eq!(options.batch_size(), 30);
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::fit::FitConstraints;
use crate::overlay::OverlayStyle;
use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};

/// Supported output video codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoCodec {
    /// H.264 / AVC.
    #[default]
    H264,
    /// H.265 / HEVC.
    H265,
    /// MPEG-4 Part 2 (for AVI compatibility).
    Mpeg4,
}

/// Options for the output encoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderOptions {
    /// Codec to use. Default is H.264.
    pub codec: VideoCodec,
    /// Constant Rate Factor for quality (0-51, lower is better). Default: 23.
    /// Ignored by MPEG-4.
    pub crf: Option<u32>,
    /// Bitrate in bits per second. If set, overrides CRF.
    pub bitrate: Option<usize>,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            codec: VideoCodec::H264,
            crf: Some(23),
            bitrate: None,
        }
    }
}

impl EncoderOptions {
    /// Set the codec.
    pub fn codec(mut self, codec: VideoCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Set the CRF quality value, clamped to 0-51.
    pub fn crf(mut self, crf: u32) -> Self {
        self.crf = Some(crf.min(51));
        self
    }

    /// Set the target bitrate in bits per second.
    pub fn bitrate(mut self, bitrate: usize) -> Self {
        self.bitrate = Some(bitrate);
        self
    }
}

/// Configuration for render operations.
///
/// All fields have sensible defaults: a default-constructed value renders
/// with no progress reporting, no cancellation, H.264 at CRF 23, white
/// text with a black outline and the stock title/subtitle layouts.
#[derive(Clone)]
pub struct RenderOptions {
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
    /// How often to fire the progress callback (every N frames).
    pub(crate) batch_size: u64,
    pub(crate) encoder: EncoderOptions,
    pub(crate) style: OverlayStyle,
    pub(crate) title_constraints: FitConstraints,
    pub(crate) subtitle_constraints: FitConstraints,
}

impl Debug for RenderOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("RenderOptions")
            .field("has_progress", &true)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .field("encoder", &self.encoder)
            .field("style", &self.style)
            .finish()
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
            encoder: EncoderOptions::default(),
            style: OverlayStyle::default(),
            title_constraints: FitConstraints::title(),
            subtitle_constraints: FitConstraints::subtitle(),
        }
    }

    /// Attach a progress callback, invoked every
    /// [`batch_size`](RenderOptions::with_batch_size) frames.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    ///
    /// When the token is cancelled, the frame loop stops before the next
    /// frame and returns [`LingoframeError::Cancelled`](crate::LingoframeError::Cancelled).
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Set how often the progress callback fires. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    #[must_use]
    pub fn with_encoder(mut self, encoder: EncoderOptions) -> Self {
        self.encoder = encoder;
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: OverlayStyle) -> Self {
        self.style = style;
        self
    }

    /// Override the title layout (defaults to [`FitConstraints::title`]).
    #[must_use]
    pub fn with_title_constraints(mut self, constraints: FitConstraints) -> Self {
        self.title_constraints = constraints;
        self
    }

    /// Override the subtitle layout (defaults to [`FitConstraints::subtitle`]).
    #[must_use]
    pub fn with_subtitle_constraints(mut self, constraints: FitConstraints) -> Self {
        self.subtitle_constraints = constraints;
        self
    }

    pub fn batch_size(&self) -> u64 {
        self.batch_size
    }

    pub fn encoder(&self) -> &EncoderOptions {
        &self.encoder
    }

    pub fn style(&self) -> &OverlayStyle {
        &self.style
    }

    pub fn title_constraints(&self) -> &FitConstraints {
        &self.title_constraints
    }

    pub fn subtitle_constraints(&self) -> &FitConstraints {
        &self.subtitle_constraints
    }

    /// Returns `true` if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}
