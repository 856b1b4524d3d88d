//! Overlay regions and colors.
//!
//! A [`Region`] is an axis-aligned pixel box `(x1, y1)`–`(x2, y2)`. A region
//! whose corners are not strictly ordered is *disabled*: the renderer skips
//! it silently. Regions picked in a browser preview arrive as fractions of
//! the frame size ([`RelativeRegion`]); [`RegionSpec`] accepts either form in
//! configuration files and resolves it once the source dimensions are known.

use std::str::FromStr;

use image::Rgb;
use serde::{Deserialize, Serialize};

use crate::error::LingoframeError;

/// Pixel rectangle where an overlay may be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    /// Left edge (inclusive).
    pub x1: i32,
    /// Top edge (inclusive).
    pub y1: i32,
    /// Right edge (exclusive).
    pub x2: i32,
    /// Bottom edge (exclusive).
    pub y2: i32,
}

impl Region {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// `true` iff `x2 > x1` and `y2 > y1`.
    pub fn is_enabled(&self) -> bool {
        self.x2 > self.x1 && self.y2 > self.y1
    }

    /// Width in pixels, 0 for a disabled region.
    pub fn width(&self) -> u32 {
        (i64::from(self.x2) - i64::from(self.x1)).clamp(0, i64::from(u32::MAX)) as u32
    }

    /// Height in pixels, 0 for a disabled region.
    pub fn height(&self) -> u32 {
        (i64::from(self.y2) - i64::from(self.y1)).clamp(0, i64::from(u32::MAX)) as u32
    }

    /// Intersect with a `width`×`height` frame.
    ///
    /// Returns `None` when nothing of the region is visible.
    pub fn clip_to(&self, width: u32, height: u32) -> Option<Region> {
        let clipped = Region {
            x1: self.x1.max(0),
            y1: self.y1.max(0),
            x2: self.x2.min(width as i32),
            y2: self.y2.min(height as i32),
        };
        clipped.is_enabled().then_some(clipped)
    }
}

/// Region expressed as fractions of the frame size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelativeRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl RelativeRegion {
    /// Convert to pixels for a `frame_width`×`frame_height` frame, truncating.
    pub fn to_pixels(&self, frame_width: u32, frame_height: u32) -> Region {
        let w = frame_width as f64;
        let h = frame_height as f64;
        Region {
            x1: (self.x * w) as i32,
            y1: (self.y * h) as i32,
            x2: ((self.x + self.width) * w) as i32,
            y2: ((self.y + self.height) * h) as i32,
        }
    }
}

/// A region in either pixel or fractional form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegionSpec {
    /// Absolute pixel coordinates.
    Pixels(Region),
    /// Fractions of the frame size.
    Relative(RelativeRegion),
}

impl RegionSpec {
    /// Resolve to pixel coordinates for the given frame size.
    pub fn resolve(&self, frame_width: u32, frame_height: u32) -> Region {
        match self {
            RegionSpec::Pixels(region) => *region,
            RegionSpec::Relative(relative) => relative.to_pixels(frame_width, frame_height),
        }
    }
}

impl From<Region> for RegionSpec {
    fn from(region: Region) -> Self {
        RegionSpec::Pixels(region)
    }
}

impl FromStr for Region {
    type Err = LingoframeError;

    /// Parse `x1,y1,x2,y2`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parts: Vec<i32> = value
            .split(',')
            .map(|part| part.trim().parse::<i32>())
            .collect::<Result<_, _>>()
            .map_err(|error| {
                LingoframeError::Configuration(format!("invalid region '{value}': {error}"))
            })?;
        match parts.as_slice() {
            [x1, y1, x2, y2] => Ok(Region::new(*x1, *y1, *x2, *y2)),
            _ => Err(LingoframeError::Configuration(format!(
                "invalid region '{value}': expected x1,y1,x2,y2"
            ))),
        }
    }
}

/// Default title background, dark gray.
pub const DEFAULT_TITLE_BACKGROUND: Rgb<u8> = Rgb([60, 60, 60]);

/// Default subtitle background, gray.
pub const DEFAULT_SUBTITLE_BACKGROUND: Rgb<u8> = Rgb([80, 80, 80]);

/// Parse `#RRGGBB` or `RRGGBB` into a color.
///
/// ```
/// use image::Rgb;
///
/// assert_eq!(lingoframe::parse_hex_color("#dcdcdc")?, Rgb([220, 220, 220]));
/// # Ok::<(), lingoframe::LingoframeError>(())
/// ```
pub fn parse_hex_color(value: &str) -> Result<Rgb<u8>, LingoframeError> {
    let hex = value.trim().trim_start_matches('#');
    let invalid = || LingoframeError::Configuration(format!("invalid color '{value}'"));
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(invalid());
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16).map_err(|_| invalid())
    };
    Ok(Rgb([channel(0..2)?, channel(2..4)?, channel(4..6)?]))
}
