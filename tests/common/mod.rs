//! Shared test doubles: a synthetic block font and in-memory frame I/O.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use lingoframe::{
    FrameSink, FrameSource, GlyphBitmap, GlyphSource, LingoframeError, TextMeasure,
    VideoMetadata,
};

/// Monospace font whose glyphs are solid blocks.
///
/// Every character advances `0.5 * size`; a line is `size` tall; visible
/// glyphs are `0.4 * size` wide and `0.7 * size` tall, sitting on the
/// baseline.
pub struct BlockFont;

impl TextMeasure for BlockFont {
    fn text_width(&self, text: &str, size: f32) -> f32 {
        text.chars().count() as f32 * size * 0.5
    }

    fn line_height(&self, size: f32) -> f32 {
        size
    }
}

impl GlyphSource for BlockFont {
    fn ascent(&self, size: f32) -> f32 {
        size * 0.8
    }

    fn rasterize(&self, ch: char, size: f32) -> GlyphBitmap {
        let advance = size * 0.5;
        if ch.is_whitespace() {
            return GlyphBitmap {
                advance,
                ..GlyphBitmap::default()
            };
        }
        let width = (size * 0.4).round().max(1.0) as usize;
        let height = (size * 0.7).round().max(1.0) as usize;
        GlyphBitmap {
            width,
            height,
            xmin: 0,
            ymin: 0,
            advance,
            coverage: vec![255; width * height],
        }
    }
}

/// Solid-color frames held in memory, optionally failing partway through.
pub struct MemorySource {
    metadata: VideoMetadata,
    frames: VecDeque<RgbImage>,
    fail_after: Option<usize>,
    produced: usize,
}

impl MemorySource {
    pub fn solid(width: u32, height: u32, fps: f64, count: usize, color: Rgb<u8>) -> Self {
        let mut metadata = VideoMetadata::new(width, height, fps);
        metadata.frame_count = count as u64;
        Self {
            metadata,
            frames: (0..count)
                .map(|_| RgbImage::from_pixel(width, height, color))
                .collect(),
            fail_after: None,
            produced: 0,
        }
    }

    /// Return a decode error instead of frame number `frames`.
    pub fn failing_after(mut self, frames: usize) -> Self {
        self.fail_after = Some(frames);
        self
    }
}

impl FrameSource for MemorySource {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn next_frame(&mut self) -> Result<Option<RgbImage>, LingoframeError> {
        if self.fail_after == Some(self.produced) {
            return Err(LingoframeError::VideoDecodeError(
                "corrupt packet".to_string(),
            ));
        }
        let frame = self.frames.pop_front();
        if frame.is_some() {
            self.produced += 1;
        }
        Ok(frame)
    }
}

/// Collects written frames.
#[derive(Default)]
pub struct MemorySink {
    pub frames: Vec<RgbImage>,
    pub finished: bool,
}

impl FrameSink for MemorySink {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<(), LingoframeError> {
        if self.finished {
            return Err(LingoframeError::VideoEncodeError(
                "write after finish".to_string(),
            ));
        }
        self.frames.push(frame.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), LingoframeError> {
        self.finished = true;
        Ok(())
    }
}

/// Writes raw RGB frames to `<path>.partial` and renames it to `path` on
/// finish, so only completed renders show up at the final path.
pub struct RawFileSink {
    path: PathBuf,
    partial: PathBuf,
    file: File,
}

impl RawFileSink {
    pub fn create(path: &Path) -> Result<Self, LingoframeError> {
        let partial = path.with_extension("partial");
        let file = File::create(&partial).map_err(|error| LingoframeError::OutputOpen {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            partial,
            file,
        })
    }
}

impl FrameSink for RawFileSink {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<(), LingoframeError> {
        self.file.write_all(frame.as_raw())?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), LingoframeError> {
        self.file.flush()?;
        fs::rename(&self.partial, &self.path)?;
        Ok(())
    }
}

/// Number of pixels in `region` of `frame` that differ from `color`.
pub fn pixels_not(frame: &RgbImage, x1: u32, y1: u32, x2: u32, y2: u32, color: Rgb<u8>) -> usize {
    let mut count = 0;
    for y in y1..y2.min(frame.height()) {
        for x in x1..x2.min(frame.width()) {
            if *frame.get_pixel(x, y) != color {
                count += 1;
            }
        }
    }
    count
}

pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const BLUE: Rgb<u8> = Rgb([10, 40, 200]);
