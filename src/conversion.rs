//! Pixel-data copying between FFmpeg frames and `image` buffers.
//!
//! FFmpeg rows may be padded past `width * bytes_per_pixel` (the *stride*);
//! `image` buffers are tightly packed. These helpers copy row by row when the
//! layouts differ.

use ffmpeg_next::{format::Pixel, frame::Video as VideoFrame};
use image::RgbImage;

use crate::error::LingoframeError;

/// Copy an RGB24 FFmpeg frame into a tightly-packed [`RgbImage`].
pub(crate) fn frame_to_rgb_image(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
) -> Result<RgbImage, LingoframeError> {
    let stride = video_frame.stride(0);
    let row_len = (width as usize) * 3;
    let data = video_frame.data(0);

    let buffer = if stride == row_len {
        data[..row_len * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(row_len * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + row_len]);
        }
        buffer
    };

    RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        LingoframeError::VideoDecodeError(
            "Failed to construct RGB image from decoded frame data".to_string(),
        )
    })
}

/// Copy an [`RgbImage`] into a new RGB24 FFmpeg frame, honouring its stride.
pub(crate) fn rgb_image_to_frame(image: &RgbImage) -> VideoFrame {
    let (width, height) = image.dimensions();
    let mut frame = VideoFrame::new(Pixel::RGB24, width, height);
    let stride = frame.stride(0);
    let row_len = (width as usize) * 3;
    let data = frame.data_mut(0);
    let bytes = image.as_raw();

    for y in 0..height as usize {
        let src_start = y * row_len;
        let dst_start = y * stride;
        data[dst_start..dst_start + row_len].copy_from_slice(&bytes[src_start..src_start + row_len]);
    }

    frame
}
