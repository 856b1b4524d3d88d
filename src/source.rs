//! Sequential frame sources.
//!
//! [`FrameSource`] is the pull side of the pipeline: metadata up front, then
//! frames one at a time in presentation order until exhaustion.
//! [`VideoReader`] implements it on top of FFmpeg, decoding only the best
//! video stream and converting each frame to RGB24. There is no seeking; a
//! reader makes exactly one pass over the file.
//!
//! # Example
//!
//! ```no_run
//! use lingoframe::{FrameSource, VideoReader};
//!
//! let mut reader = VideoReader::open("input.mp4")?;
//! println!("{:?}", reader.metadata());
//! while let Some(frame) = reader.next_frame()? {
//!     assert_eq!(frame.width(), reader.metadata().width);
//! }
//! # Ok::<(), lingoframe::LingoframeError>(())
//! ```

use std::path::{Path, PathBuf};

use ffmpeg_next::{
    Error as FfmpegError, Packet,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::RgbImage;

use crate::conversion::frame_to_rgb_image;
use crate::error::LingoframeError;
use crate::metadata::VideoMetadata;

/// A producer of decoded frames in presentation order.
pub trait FrameSource {
    /// Stream parameters, available before the first frame.
    fn metadata(&self) -> &VideoMetadata;

    /// Next frame, or `None` once the source is exhausted.
    ///
    /// # Errors
    ///
    /// Decode failures are returned as errors and end the pass.
    fn next_frame(&mut self) -> Result<Option<RgbImage>, LingoframeError>;
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn metadata(&self) -> &VideoMetadata {
        (**self).metadata()
    }

    fn next_frame(&mut self) -> Result<Option<RgbImage>, LingoframeError> {
        (**self).next_frame()
    }
}

/// FFmpeg-backed [`FrameSource`] reading one file sequentially.
pub struct VideoReader {
    input_context: Input,
    decoder: VideoDecoder,
    scaler: ScalingContext,
    video_stream_index: usize,
    metadata: VideoMetadata,
    decoded_frame: VideoFrame,
    scaled_frame: VideoFrame,
    eof_sent: bool,
    done: bool,
    file_path: PathBuf,
}

impl VideoReader {
    /// Open a video file and prepare its best video stream for decoding.
    ///
    /// # Errors
    ///
    /// [`LingoframeError::SourceOpen`] if the file cannot be opened or
    /// decoded, [`LingoframeError::NoVideoStream`] if it has no video.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LingoframeError> {
        let path = path.as_ref();
        let file_path = path.to_path_buf();
        let source_error = |reason: String| LingoframeError::SourceOpen {
            path: file_path.clone(),
            reason,
        };

        log::debug!("Opening source video: {}", path.display());

        crate::ffmpeg::ensure_initialized()
            .map_err(|error| source_error(format!("FFmpeg initialisation failed: {error}")))?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| source_error(error.to_string()))?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or(LingoframeError::NoVideoStream)?;
        let video_stream_index = stream.index();
        let codec = stream.parameters().id().name().to_string();

        let decoder_context = CodecContext::from_parameters(stream.parameters())
            .map_err(|error| source_error(format!("Failed to read codec parameters: {error}")))?;
        let decoder = decoder_context
            .decoder()
            .video()
            .map_err(|error| source_error(format!("Failed to create video decoder: {error}")))?;

        let width = decoder.width();
        let height = decoder.height();

        let frame_rate = stream.avg_frame_rate();
        let frames_per_second = if frame_rate.denominator() != 0 && frame_rate.numerator() != 0 {
            frame_rate.numerator() as f64 / frame_rate.denominator() as f64
        } else {
            let rate = stream.rate();
            if rate.denominator() != 0 {
                rate.numerator() as f64 / rate.denominator() as f64
            } else {
                0.0
            }
        };
        if frames_per_second <= 0.0 {
            return Err(source_error("video stream reports no frame rate".to_string()));
        }

        let frame_count = if stream.frames() > 0 {
            stream.frames() as u64
        } else if input_context.duration() > 0 {
            let seconds = input_context.duration() as f64 / 1_000_000.0;
            (seconds * frames_per_second) as u64
        } else {
            0
        };

        let scaler = ScalingContext::get(
            decoder.format(),
            width,
            height,
            Pixel::RGB24,
            width,
            height,
            ScalingFlags::BILINEAR,
        )
        .map_err(|error| source_error(format!("Failed to create scaler: {error}")))?;

        let metadata = VideoMetadata {
            width,
            height,
            frames_per_second,
            frame_count,
            codec,
        };
        log::debug!("Source metadata: {metadata:?}");

        Ok(Self {
            input_context,
            decoder,
            scaler,
            video_stream_index,
            metadata,
            decoded_frame: VideoFrame::empty(),
            scaled_frame: VideoFrame::empty(),
            eof_sent: false,
            done: false,
            file_path,
        })
    }

    /// Path the reader was opened from.
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn convert_current_frame(&mut self) -> Result<RgbImage, LingoframeError> {
        self.scaler
            .run(&self.decoded_frame, &mut self.scaled_frame)
            .map_err(|error| LingoframeError::VideoDecodeError(format!("scaling failed: {error}")))?;
        frame_to_rgb_image(&self.scaled_frame, self.metadata.width, self.metadata.height)
    }
}

impl FrameSource for VideoReader {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn next_frame(&mut self) -> Result<Option<RgbImage>, LingoframeError> {
        if self.done {
            return Ok(None);
        }

        loop {
            // Drain frames the decoder has already produced.
            if self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
                return match self.convert_current_frame() {
                    Ok(image) => Ok(Some(image)),
                    Err(error) => {
                        self.done = true;
                        Err(error)
                    }
                };
            }

            if self.eof_sent {
                self.done = true;
                return Ok(None);
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input_context) {
                Ok(()) => {
                    if packet.stream() == self.video_stream_index {
                        if let Err(error) = self.decoder.send_packet(&packet) {
                            self.done = true;
                            return Err(LingoframeError::VideoDecodeError(error.to_string()));
                        }
                    }
                }
                Err(FfmpegError::Eof) => {
                    self.decoder.send_eof()?;
                    self.eof_sent = true;
                }
                Err(error) => {
                    self.done = true;
                    return Err(LingoframeError::VideoDecodeError(format!(
                        "packet read failed: {error}"
                    )));
                }
            }
        }
    }
}
