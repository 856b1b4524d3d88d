//! Font-size and line-break fitting.
//!
//! [`TextFitter`] picks the largest font size at which a piece of text,
//! broken into lines, fits inside a box. Two line-breaking policies exist:
//!
//! - [`FitMode::FixedLineCount`] splits the words into a fixed number of
//!   contiguous groups by word count (titles use two lines, split at the
//!   midpoint word). The split does not look at glyph widths.
//! - [`FitMode::AutoWrap`] wraps greedily at the candidate size, never
//!   breaking inside a word.
//!
//! Sizes are tried from [`FitConstraints::max_size`] downward in steps of
//! [`FitConstraints::step`]. The search is deliberately linear: text
//! measurement is not guaranteed to be monotonic in the font size, so a
//! bisection could skip a fitting size. When nothing fits, the minimum size
//! is used and the text may overflow its box.
//!
//! Measurement goes through the [`TextMeasure`] trait so layouts can be
//! computed against any glyph source, including synthetic ones in tests.

/// Measures rendered text.
pub trait TextMeasure {
    /// Horizontal advance of `text` rendered on one line at `size` pixels.
    fn text_width(&self, text: &str, size: f32) -> f32;

    /// Height of one line of text at `size` pixels (ascent to descent).
    fn line_height(&self, size: f32) -> f32;
}

impl<T: TextMeasure + ?Sized> TextMeasure for &T {
    fn text_width(&self, text: &str, size: f32) -> f32 {
        (**self).text_width(text, size)
    }

    fn line_height(&self, size: f32) -> f32 {
        (**self).line_height(size)
    }
}

/// Line-breaking policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitMode {
    /// Split into this many lines by word count.
    FixedLineCount(usize),
    /// Greedy word wrap against the usable width.
    AutoWrap,
}

/// Constraints for a fit.
#[derive(Debug, Clone, PartialEq)]
pub struct FitConstraints {
    /// How the text is broken into lines.
    pub mode: FitMode,
    /// Horizontal padding on each side of the box.
    pub margin_x: u32,
    /// Vertical padding above and below the text block.
    pub margin_y: u32,
    /// Gap between stacked lines.
    pub line_spacing: u32,
    /// First size tried.
    pub max_size: u32,
    /// Floor size, used when nothing larger fits.
    pub min_size: u32,
    /// Decrement between candidate sizes.
    pub step: u32,
}

impl FitConstraints {
    /// Two-line title layout.
    pub fn title() -> Self {
        Self {
            mode: FitMode::FixedLineCount(2),
            margin_x: 20,
            margin_y: 10,
            line_spacing: 8,
            max_size: 96,
            min_size: 20,
            step: 2,
        }
    }

    /// Wrapped subtitle layout.
    pub fn subtitle() -> Self {
        Self {
            mode: FitMode::AutoWrap,
            margin_x: 15,
            margin_y: 15,
            line_spacing: 8,
            max_size: 64,
            min_size: 16,
            step: 2,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: FitMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_margins(mut self, margin_x: u32, margin_y: u32) -> Self {
        self.margin_x = margin_x;
        self.margin_y = margin_y;
        self
    }

    #[must_use]
    pub fn with_line_spacing(mut self, spacing: u32) -> Self {
        self.line_spacing = spacing;
        self
    }

    /// Set the size range. `min` is clamped to at least 1 and `max` to at
    /// least `min`.
    #[must_use]
    pub fn with_size_range(mut self, max: u32, min: u32) -> Self {
        self.min_size = min.max(1);
        self.max_size = max.max(self.min_size);
        self
    }

    /// Set the size decrement, clamped to at least 1.
    #[must_use]
    pub fn with_step(mut self, step: u32) -> Self {
        self.step = step.max(1);
        self
    }

    /// Usable `(width, height)` inside a `width`×`height` box.
    pub fn usable_area(&self, width: u32, height: u32) -> (u32, u32) {
        (
            width.saturating_sub(self.margin_x.saturating_mul(2)),
            height.saturating_sub(self.margin_y.saturating_mul(2)),
        )
    }
}

/// Result of a fit: chosen size plus the broken lines.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FitResult {
    /// Chosen size in pixels.
    pub font_size: u32,
    /// Text of each line, top to bottom.
    pub lines: Vec<String>,
    /// Measured height of each line, parallel to `lines`.
    pub line_heights: Vec<u32>,
}

impl FitResult {
    /// A result with no lines.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Height of the stacked block including `spacing` between lines.
    pub fn block_height(&self, spacing: u32) -> u32 {
        let gaps = self.lines.len().saturating_sub(1) as u32;
        self.line_heights.iter().sum::<u32>() + spacing * gaps
    }
}

/// Chooses a font size and line breaks for a box.
#[derive(Debug, Clone)]
pub struct TextFitter {
    constraints: FitConstraints,
}

impl TextFitter {
    pub fn new(constraints: FitConstraints) -> Self {
        Self { constraints }
    }

    pub fn constraints(&self) -> &FitConstraints {
        &self.constraints
    }

    /// Fit `text` into a `width`×`height` box.
    ///
    /// Empty or whitespace-only text yields [`FitResult::empty`].
    pub fn fit<M: TextMeasure + ?Sized>(
        &self,
        text: &str,
        measure: &M,
        width: u32,
        height: u32,
    ) -> FitResult {
        if text.trim().is_empty() {
            return FitResult::empty();
        }

        let constraints = &self.constraints;
        let (usable_width, usable_height) = constraints.usable_area(width, height);
        let step = constraints.step.max(1);
        let min_size = constraints.min_size.max(1);

        // Fixed-count splitting does not depend on the size.
        let fixed_lines = match constraints.mode {
            FitMode::FixedLineCount(count) => Some(split_by_word_count(text, count)),
            FitMode::AutoWrap => None,
        };

        let mut size = constraints.max_size.max(min_size);
        loop {
            let lines = match &fixed_lines {
                Some(lines) => lines.clone(),
                None => wrap_words(text, measure, size as f32, usable_width as f32),
            };
            let candidate = measure_lines(lines, measure, size);

            let fits_width = candidate
                .lines
                .iter()
                .all(|line| measure.text_width(line, size as f32) <= usable_width as f32);
            let fits_height = candidate.block_height(constraints.line_spacing) <= usable_height;

            if fits_width && fits_height {
                return candidate;
            }

            if size <= min_size {
                log::warn!(
                    "Text does not fit {usable_width}x{usable_height} even at {min_size}px; using the floor size"
                );
                return candidate;
            }

            size = size.saturating_sub(step).max(min_size);
        }
    }
}

fn measure_lines<M: TextMeasure + ?Sized>(lines: Vec<String>, measure: &M, size: u32) -> FitResult {
    let line_height = measure.line_height(size as f32).ceil().max(0.0) as u32;
    FitResult {
        font_size: size,
        line_heights: vec![line_height; lines.len()],
        lines,
    }
}

/// Split `text` into `count` contiguous groups of words.
///
/// One word stays on one line; fewer words than `count` give one word per
/// line. Otherwise group `k` ends at word index `(k + 1) * len / count`, so
/// two lines split at `len / 2`.
///
/// ```
/// use lingoframe::fit::split_by_word_count;
///
/// assert_eq!(
///     split_by_word_count("word1 word2 word3 word4", 2),
///     vec!["word1 word2", "word3 word4"],
/// );
/// assert_eq!(split_by_word_count("a b c", 2), vec!["a", "b c"]);
/// ```
pub fn split_by_word_count(text: &str, count: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let count = count.max(1);

    if words.len() <= count {
        return words.into_iter().map(str::to_string).collect();
    }

    (0..count)
        .map(|k| {
            let from = k * words.len() / count;
            let to = (k + 1) * words.len() / count;
            words[from..to].join(" ")
        })
        .filter(|line| !line.is_empty())
        .collect()
}

/// Greedy word wrap at `size` against `max_width`.
///
/// Newlines in `text` are hard breaks. A word wider than `max_width` is
/// placed alone on its own line.
pub fn wrap_words<M: TextMeasure + ?Sized>(
    text: &str,
    measure: &M,
    size: f32,
    max_width: f32,
) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }
            let candidate = format!("{current} {word}");
            if measure.text_width(&candidate, size) <= max_width {
                current = candidate;
            } else {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines
}
