//! Drawing title and subtitle overlays onto frames.
//!
//! [`FrameOverlayRenderer`] paints, for one frame:
//!
//! - the **title**, on every frame: background box plus fitted text centered
//!   horizontally per line and vertically as a block;
//! - the **subtitle**, only when there is active text: background box plus
//!   fitted text left-aligned at the box margin and stacked top-down. With
//!   no active text nothing is drawn and the frame shows through.
//!
//! Regions that fail `x2 > x1 && y2 > y1` are skipped silently.
//!
//! Text is drawn in two passes for legibility on any background: an outline
//! pass (the glyph coverage offset over every `(dx, dy)` in a square ring of
//! radius [`OverlayStyle::outline_radius`], in the outline color) and a fill
//! pass on top. The outline pass is computed once per layout as a dilated
//! coverage mask, which is the union of all ring offsets.

use image::{GrayImage, Luma, Rgb, RgbImage};

use crate::fit::{FitConstraints, FitResult, TextFitter, TextMeasure};
use crate::region::Region;

/// A rasterized glyph.
///
/// `xmin` is the horizontal offset from the pen position to the left of the
/// bitmap; `ymin` is the offset from the baseline to the bottom of the
/// bitmap, positive upward.
#[derive(Debug, Clone, Default)]
pub struct GlyphBitmap {
    pub width: usize,
    pub height: usize,
    pub xmin: i32,
    pub ymin: i32,
    pub advance: f32,
    /// Row-major coverage, `width * height` bytes.
    pub coverage: Vec<u8>,
}

/// A font that can both measure and rasterize.
pub trait GlyphSource: TextMeasure {
    /// Distance from the top of a line to its baseline at `size`.
    fn ascent(&self, size: f32) -> f32;

    /// Rasterize one character at `size` pixels.
    fn rasterize(&self, ch: char, size: f32) -> GlyphBitmap;
}

/// Text colors shared by both overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayStyle {
    /// Fill color of the glyphs.
    pub text_color: Rgb<u8>,
    /// Color of the ring drawn around each glyph.
    pub outline_color: Rgb<u8>,
    /// Ring radius of the outline pass, in pixels. 0 disables the outline.
    pub outline_radius: u32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            text_color: Rgb([255, 255, 255]),
            outline_color: Rgb([0, 0, 0]),
            outline_radius: 2,
        }
    }
}

/// One overlay to draw on a frame.
#[derive(Clone, Copy)]
pub struct TextOverlay<'a> {
    /// Text to draw. For subtitles this is the text active at the frame time.
    pub text: &'a str,
    pub region: Region,
    pub font: &'a dyn GlyphSource,
    pub background: Rgb<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Alignment {
    Centered,
    TopLeft,
}

/// Composited coverage for a laid-out text block, anchored at `(x, y)`.
struct TextBlock {
    x: i32,
    y: i32,
    fill: GrayImage,
    outline: Option<GrayImage>,
}

struct CachedBlock {
    text: String,
    region: Region,
    block: Option<TextBlock>,
}

/// Paints overlays onto frames.
///
/// The renderer remembers the last layout of each overlay kind, keyed by
/// text and region: a title never changes during a video and a subtitle cue
/// spans many frames, so fitting and rasterizing happen once per change.
/// Use one renderer per render job, because the layout cache does not track
/// font changes.
pub struct FrameOverlayRenderer {
    style: OverlayStyle,
    title_fitter: TextFitter,
    subtitle_fitter: TextFitter,
    title_cache: Option<CachedBlock>,
    subtitle_cache: Option<CachedBlock>,
}

impl Default for FrameOverlayRenderer {
    fn default() -> Self {
        Self::new(
            OverlayStyle::default(),
            FitConstraints::title(),
            FitConstraints::subtitle(),
        )
    }
}

impl FrameOverlayRenderer {
    pub fn new(style: OverlayStyle, title: FitConstraints, subtitle: FitConstraints) -> Self {
        Self {
            style,
            title_fitter: TextFitter::new(title),
            subtitle_fitter: TextFitter::new(subtitle),
            title_cache: None,
            subtitle_cache: None,
        }
    }

    pub fn style(&self) -> &OverlayStyle {
        &self.style
    }

    /// Draw the overlays for the frame at time `t` (seconds).
    ///
    /// The title does not depend on `t`. The subtitle's `text` must already
    /// be the text active at `t`; when it is empty the subtitle is skipped.
    pub fn render(
        &mut self,
        frame: &mut RgbImage,
        t: f64,
        title: Option<&TextOverlay<'_>>,
        subtitle: Option<&TextOverlay<'_>>,
    ) {
        let style = self.style;

        if let Some(title) = title.filter(|overlay| overlay.region.is_enabled()) {
            fill_region(frame, title.region, title.background);
            if let Some(block) = cached_block(
                &mut self.title_cache,
                &self.title_fitter,
                title,
                Alignment::Centered,
                style.outline_radius,
            ) {
                draw_block(frame, block, &style);
            }
        }

        if let Some(subtitle) = subtitle
            .filter(|overlay| overlay.region.is_enabled() && !overlay.text.trim().is_empty())
        {
            log::trace!("t={t:.3}s subtitle: {}", subtitle.text);
            fill_region(frame, subtitle.region, subtitle.background);
            if let Some(block) = cached_block(
                &mut self.subtitle_cache,
                &self.subtitle_fitter,
                subtitle,
                Alignment::TopLeft,
                style.outline_radius,
            ) {
                draw_block(frame, block, &style);
            }
        }
    }
}

fn cached_block<'c>(
    cache: &'c mut Option<CachedBlock>,
    fitter: &TextFitter,
    overlay: &TextOverlay<'_>,
    alignment: Alignment,
    radius: u32,
) -> Option<&'c TextBlock> {
    let stale = cache
        .as_ref()
        .is_none_or(|cached| cached.text != overlay.text || cached.region != overlay.region);

    if stale {
        let fit = fitter.fit(
            overlay.text,
            overlay.font,
            overlay.region.width(),
            overlay.region.height(),
        );
        let block = compose_block(
            &fit,
            overlay.font,
            overlay.region,
            fitter.constraints(),
            alignment,
            radius,
        );
        *cache = Some(CachedBlock {
            text: overlay.text.to_string(),
            region: overlay.region,
            block,
        });
    }

    cache.as_ref().and_then(|cached| cached.block.as_ref())
}

/// Lay out and rasterize the fitted lines into a coverage mask.
fn compose_block(
    fit: &FitResult,
    font: &dyn GlyphSource,
    region: Region,
    constraints: &FitConstraints,
    alignment: Alignment,
    radius: u32,
) -> Option<TextBlock> {
    if fit.is_empty() {
        return None;
    }

    let size = fit.font_size as f32;
    let widths: Vec<i32> = fit
        .lines
        .iter()
        .map(|line| font.text_width(line, size).ceil() as i32)
        .collect();
    let block_height = fit.block_height(constraints.line_spacing) as i32;

    let line_x = |width: i32| match alignment {
        Alignment::Centered => centered_start(region.x1, region.width(), width),
        Alignment::TopLeft => region.x1.saturating_add(constraints.margin_x as i32),
    };
    let top = match alignment {
        Alignment::Centered => centered_start(region.y1, region.height(), block_height),
        Alignment::TopLeft => region.y1.saturating_add(constraints.margin_y as i32),
    };

    // Glyphs may reach past their advance box; pad the mask so the outline
    // and overhanging strokes are kept.
    let pad = radius as i32 + (size * 0.25).ceil() as i32;
    let left = widths
        .iter()
        .map(|&w| line_x(w))
        .min()
        .unwrap_or(region.x1)
        .saturating_sub(pad);
    let right = widths
        .iter()
        .map(|&w| line_x(w).saturating_add(w))
        .max()
        .unwrap_or(region.x1)
        .saturating_add(pad);
    let origin_y = top.saturating_sub(pad);
    let mask_width = (i64::from(right) - i64::from(left)).max(1) as u32;
    let mask_height = (block_height + 2 * pad).max(1) as u32;

    let mut fill = GrayImage::new(mask_width, mask_height);
    let ascent = font.ascent(size);
    let mut line_top = top;

    for ((line, &width), &line_height) in fit.lines.iter().zip(&widths).zip(&fit.line_heights) {
        let baseline = line_top as f32 + ascent;
        let mut pen = line_x(width) as f32;
        for ch in line.chars() {
            let glyph = font.rasterize(ch, size);
            let glyph_x = pen.round() as i32 + glyph.xmin - left;
            let glyph_y = (baseline.round() as i32 - glyph.ymin - glyph.height as i32) - origin_y;
            stamp_glyph(&mut fill, &glyph, glyph_x, glyph_y);
            pen += glyph.advance;
        }
        line_top += line_height as i32 + constraints.line_spacing as i32;
    }

    let outline = (radius > 0).then(|| dilate(&fill, radius));

    Some(TextBlock {
        x: left,
        y: origin_y,
        fill,
        outline,
    })
}

/// Offset that centers `size` pixels inside `extent` pixels from `start`.
fn centered_start(start: i32, extent: u32, size: i32) -> i32 {
    let offset = (i64::from(extent) - i64::from(size)) / 2;
    (i64::from(start) + offset).clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

fn stamp_glyph(mask: &mut GrayImage, glyph: &GlyphBitmap, x: i32, y: i32) {
    let (mask_width, mask_height) = (mask.width() as i32, mask.height() as i32);
    for row in 0..glyph.height {
        let my = y + row as i32;
        if my < 0 || my >= mask_height {
            continue;
        }
        for col in 0..glyph.width {
            let mx = x + col as i32;
            if mx < 0 || mx >= mask_width {
                continue;
            }
            let value = glyph.coverage[row * glyph.width + col];
            let pixel = mask.get_pixel_mut(mx as u32, my as u32);
            pixel.0[0] = pixel.0[0].max(value);
        }
    }
}

/// Union of `mask` shifted by every offset in the `radius` ring.
fn dilate(mask: &GrayImage, radius: u32) -> GrayImage {
    let (width, height) = mask.dimensions();
    let r = radius as i32;
    let mut out = GrayImage::new(width, height);

    for (x, y, pixel) in mask.enumerate_pixels() {
        let value = pixel.0[0];
        if value == 0 {
            continue;
        }
        for dy in -r..=r {
            for dx in -r..=r {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let (tx, ty) = (x as i32 + dx, y as i32 + dy);
                if tx < 0 || ty < 0 || tx >= width as i32 || ty >= height as i32 {
                    continue;
                }
                let target = out.get_pixel_mut(tx as u32, ty as u32);
                target.0[0] = target.0[0].max(value);
            }
        }
    }

    out
}

fn draw_block(frame: &mut RgbImage, block: &TextBlock, style: &OverlayStyle) {
    if let Some(outline) = &block.outline {
        blend_mask(frame, outline, block.x, block.y, style.outline_color);
    }
    blend_mask(frame, &block.fill, block.x, block.y, style.text_color);
}

fn blend_mask(frame: &mut RgbImage, mask: &GrayImage, x: i32, y: i32, color: Rgb<u8>) {
    let (frame_width, frame_height) = (frame.width() as i32, frame.height() as i32);
    for (mx, my, &Luma([alpha])) in mask.enumerate_pixels() {
        if alpha == 0 {
            continue;
        }
        let (fx, fy) = (x.saturating_add(mx as i32), y.saturating_add(my as i32));
        if fx < 0 || fy < 0 || fx >= frame_width || fy >= frame_height {
            continue;
        }
        let pixel = frame.get_pixel_mut(fx as u32, fy as u32);
        for channel in 0..3 {
            let src = color.0[channel] as u32;
            let dst = pixel.0[channel] as u32;
            let a = alpha as u32;
            pixel.0[channel] = ((src * a + dst * (255 - a) + 127) / 255) as u8;
        }
    }
}

/// Fill `region` with `color`, clipped to the frame.
fn fill_region(frame: &mut RgbImage, region: Region, color: Rgb<u8>) {
    let Some(clipped) = region.clip_to(frame.width(), frame.height()) else {
        return;
    };
    for y in clipped.y1..clipped.y2 {
        for x in clipped.x1..clipped.x2 {
            frame.put_pixel(x as u32, y as u32, color);
        }
    }
}
