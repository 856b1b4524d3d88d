//! Sequential frame sinks.
//!
//! [`FrameSink`] is the push side of the pipeline. [`VideoWriter`] encodes
//! RGB frames into a video-only container through FFmpeg, one frame at a
//! time, so a render never holds more than one frame in memory. The
//! container format is inferred from the output extension.
//!
//! Frames are encoded into a sibling `<name>.partial.<ext>` file, which is
//! renamed onto the output path by [`FrameSink::finish`]. A writer dropped
//! before `finish` (failed or cancelled render) removes its partial file,
//! so the output path only ever holds complete videos.

use std::path::{Path, PathBuf};

use ffmpeg_next::codec::Id;
use ffmpeg_next::codec::context::Context as CodecContext;
use ffmpeg_next::encoder::video::Encoder as VideoEncoder;
use ffmpeg_next::format::context::Output;
use ffmpeg_next::format::{Flags as FormatFlags, Pixel};
use ffmpeg_next::frame::Video as VideoFrame;
use ffmpeg_next::software::scaling::{Context as ScalingContext, Flags as ScalingFlags};
use ffmpeg_next::{Dictionary, Packet, Rational};
use image::RgbImage;

use crate::config::{EncoderOptions, VideoCodec};
use crate::conversion::rgb_image_to_frame;
use crate::error::LingoframeError;

/// A consumer of rendered frames.
pub trait FrameSink {
    /// Append one frame.
    ///
    /// # Errors
    ///
    /// Encoding or I/O failures, or a frame whose size differs from the
    /// stream the sink was opened for.
    fn write_frame(&mut self, frame: &RgbImage) -> Result<(), LingoframeError>;

    /// Flush buffered output and finalize the container.
    ///
    /// Called once, after the last frame. Writing after `finish` is an error.
    fn finish(&mut self) -> Result<(), LingoframeError>;
}

impl<W: FrameSink + ?Sized> FrameSink for &mut W {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<(), LingoframeError> {
        (**self).write_frame(frame)
    }

    fn finish(&mut self) -> Result<(), LingoframeError> {
        (**self).finish()
    }
}

impl VideoCodec {
    fn to_codec_id(self) -> Id {
        match self {
            VideoCodec::H264 => Id::H264,
            VideoCodec::H265 => Id::HEVC,
            VideoCodec::Mpeg4 => Id::MPEG4,
        }
    }

    fn supports_crf(self) -> bool {
        matches!(self, VideoCodec::H264 | VideoCodec::H265)
    }
}

/// Temporary encoder output, deleted on drop unless committed.
struct PartialFile {
    path: PathBuf,
    committed: bool,
}

impl PartialFile {
    fn beside(target: &Path) -> Self {
        let stem = target
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = match target.extension() {
            Some(extension) => format!("{stem}.partial.{}", extension.to_string_lossy()),
            None => format!("{stem}.partial"),
        };
        Self {
            path: target.with_file_name(name),
            committed: false,
        }
    }

    fn commit(&mut self, target: &Path) -> Result<(), LingoframeError> {
        std::fs::rename(&self.path, target)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if !self.committed && self.path.exists() {
            if let Err(error) = std::fs::remove_file(&self.path) {
                log::warn!(
                    "Cannot remove unfinished output {}: {error}",
                    self.path.display()
                );
            } else {
                log::debug!("Removed unfinished output {}", self.path.display());
            }
        }
    }
}

/// FFmpeg-backed [`FrameSink`] writing a single video stream.
///
/// Field order matters: the container closes before the partial file is
/// cleaned up.
pub struct VideoWriter {
    output: Option<Output>,
    encoder: VideoEncoder,
    scaler: ScalingContext,
    stream_index: usize,
    encoder_time_base: Rational,
    stream_time_base: Rational,
    width: u32,
    height: u32,
    frame_index: i64,
    finished: bool,
    path: PathBuf,
    partial: PartialFile,
}

impl VideoWriter {
    /// Create the output file and open an encoder for `width`x`height`
    /// frames at `frames_per_second`.
    ///
    /// # Errors
    ///
    /// [`LingoframeError::OutputOpen`] if the container, stream or encoder
    /// cannot be set up.
    pub fn create<P: AsRef<Path>>(
        path: P,
        width: u32,
        height: u32,
        frames_per_second: f64,
        options: &EncoderOptions,
    ) -> Result<Self, LingoframeError> {
        let path = path.as_ref();
        let output_error = |reason: String| LingoframeError::OutputOpen {
            path: path.to_path_buf(),
            reason,
        };

        log::debug!(
            "Creating output video {} ({width}x{height} @ {frames_per_second:.3} fps, codec={:?})",
            path.display(),
            options.codec,
        );

        if width == 0 || height == 0 || frames_per_second <= 0.0 {
            return Err(output_error(format!(
                "invalid stream parameters {width}x{height} @ {frames_per_second} fps"
            )));
        }

        crate::ffmpeg::ensure_initialized()
            .map_err(|error| output_error(format!("FFmpeg initialisation failed: {error}")))?;

        let partial = PartialFile::beside(path);
        let mut output = ffmpeg_next::format::output(&partial.path)
            .map_err(|error| output_error(format!("cannot open output: {error}")))?;

        // Read before adding the stream to avoid holding two borrows of `output`.
        let needs_global_header = output.format().flags().contains(FormatFlags::GLOBAL_HEADER);

        let codec_id = options.codec.to_codec_id();
        let encoder_codec = ffmpeg_next::encoder::find(codec_id)
            .ok_or_else(|| output_error(format!("codec {codec_id:?} not available")))?;

        let mut stream = output
            .add_stream(encoder_codec)
            .map_err(|error| output_error(format!("cannot add stream: {error}")))?;
        let stream_index = stream.index();

        let mut encoder = CodecContext::from_parameters(stream.parameters())
            .map_err(|error| output_error(format!("cannot create codec context: {error}")))?
            .encoder()
            .video()
            .map_err(|error| output_error(format!("cannot create video encoder: {error}")))?;

        let frame_rate = Rational::from(frames_per_second);
        let encoder_time_base = frame_rate.invert();

        encoder.set_width(width);
        encoder.set_height(height);
        encoder.set_format(Pixel::YUV420P);
        encoder.set_time_base(encoder_time_base);
        encoder.set_frame_rate(Some(frame_rate));

        if let Some(bitrate) = options.bitrate {
            encoder.set_bit_rate(bitrate);
        }

        if needs_global_header {
            unsafe {
                (*encoder.as_mut_ptr()).flags |=
                    ffmpeg_sys_next::AV_CODEC_FLAG_GLOBAL_HEADER as i32;
            }
        }

        let mut encoder_options = Dictionary::new();
        if options.bitrate.is_none() && options.codec.supports_crf() {
            if let Some(crf) = options.crf {
                encoder_options.set("crf", &crf.to_string());
            }
        }

        let opened_encoder = encoder
            .open_as_with(encoder_codec, encoder_options)
            .map_err(|error| output_error(format!("cannot open encoder: {error}")))?;

        stream.set_parameters(&opened_encoder);
        stream.set_time_base(encoder_time_base);

        output
            .write_header()
            .map_err(|error| output_error(format!("cannot write header: {error}")))?;

        // The muxer may pick its own stream time base while writing the header.
        let stream_time_base = output
            .stream(stream_index)
            .map(|stream| stream.time_base())
            .unwrap_or(encoder_time_base);

        let scaler = ScalingContext::get(
            Pixel::RGB24,
            width,
            height,
            Pixel::YUV420P,
            width,
            height,
            ScalingFlags::BILINEAR,
        )
        .map_err(|error| output_error(format!("cannot create scaler: {error}")))?;

        Ok(Self {
            output: Some(output),
            encoder: opened_encoder,
            scaler,
            stream_index,
            encoder_time_base,
            stream_time_base,
            width,
            height,
            frame_index: 0,
            finished: false,
            path: path.to_path_buf(),
            partial,
        })
    }

    /// Final output path. The file appears there once [`FrameSink::finish`]
    /// succeeds.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of frames accepted so far.
    pub fn frames_written(&self) -> u64 {
        self.frame_index as u64
    }

    fn drain_packets(&mut self) -> Result<(), LingoframeError> {
        let Some(output) = self.output.as_mut() else {
            return Err(LingoframeError::VideoEncodeError(
                "output already closed".to_string(),
            ));
        };
        let mut packet = Packet::empty();
        while self.encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(self.stream_index);
            packet.rescale_ts(self.encoder_time_base, self.stream_time_base);
            packet.write_interleaved(output).map_err(|error| {
                LingoframeError::VideoEncodeError(format!("write packet failed: {error}"))
            })?;
        }
        Ok(())
    }
}

impl FrameSink for VideoWriter {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<(), LingoframeError> {
        if self.finished {
            return Err(LingoframeError::VideoEncodeError(
                "write after finish".to_string(),
            ));
        }
        if frame.dimensions() != (self.width, self.height) {
            return Err(LingoframeError::FrameSizeMismatch {
                expected_width: self.width,
                expected_height: self.height,
                actual_width: frame.width(),
                actual_height: frame.height(),
            });
        }

        let source_frame = rgb_image_to_frame(frame);
        let mut encoded_frame = VideoFrame::empty();
        self.scaler
            .run(&source_frame, &mut encoded_frame)
            .map_err(|error| LingoframeError::VideoEncodeError(format!("scaling failed: {error}")))?;

        encoded_frame.set_pts(Some(self.frame_index));
        self.frame_index += 1;

        self.encoder.send_frame(&encoded_frame).map_err(|error| {
            LingoframeError::VideoEncodeError(format!("send_frame failed: {error}"))
        })?;
        self.drain_packets()
    }

    fn finish(&mut self) -> Result<(), LingoframeError> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;

        self.encoder.send_eof().map_err(|error| {
            LingoframeError::VideoEncodeError(format!("send_eof failed: {error}"))
        })?;
        self.drain_packets()?;

        let mut output = self.output.take().ok_or_else(|| {
            LingoframeError::VideoEncodeError("output already closed".to_string())
        })?;
        output.write_trailer().map_err(|error| {
            LingoframeError::VideoEncodeError(format!("cannot write trailer: {error}"))
        })?;
        // Close the container before moving it into place.
        drop(output);
        self.partial.commit(&self.path)?;

        log::debug!(
            "Finished {} after {} frames",
            self.path.display(),
            self.frame_index
        );
        Ok(())
    }
}
