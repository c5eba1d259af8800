//! Rendered-line estimation: how many printed rows one logical line of code occupies.
//!
//! Widths are in centimetres of a monospaced listing. The model is an approximation:
//! every character falls into a width bucket, the widths are summed, and the sum is divided by
//! the usable text width. A leftover narrower than the remainder threshold is absorbed into the
//! previous row, anything wider costs one more row.

use crate::config::{CharWidths, LayoutConfig};

/// Maps a character to the width it occupies on the printed page, in centimetres.
pub trait WidthClassifier {
    fn width_of(&self, ch: char) -> f64;
}

impl WidthClassifier for CharWidths {
    fn width_of(&self, ch: char) -> f64 {
        if ch <= self.narrow_max {
            self.narrow_cm
        } else {
            self.wide_cm
        }
    }
}

/// Any `Fn(char) -> f64` can stand in for a width table.
impl<F> WidthClassifier for F
where
    F: Fn(char) -> f64,
{
    fn width_of(&self, ch: char) -> f64 {
        self(ch)
    }
}

/// Total printed width of `line`, in centimetres.
pub fn line_width<W: WidthClassifier>(line: &str, widths: &W) -> f64 {
    line.chars().map(|ch| widths.width_of(ch)).sum()
}

/// Number of printed rows `line` occupies when wrapped at `usable_width_cm`. Never less than 1.
pub fn estimate_with<W: WidthClassifier>(
    line: &str,
    usable_width_cm: f64,
    remainder_threshold_cm: f64,
    widths: &W,
) -> usize {
    let width = line_width(line, widths);
    if width <= 0.0 {
        return 1;
    }
    let full_rows = (width / usable_width_cm).floor() as usize;
    let remainder = width % usable_width_cm;
    let partial_row = usize::from(remainder > remainder_threshold_cm);
    (full_rows + partial_row).max(1)
}

/// [`estimate_with`] using the default two-bucket width table and threshold.
pub fn estimate(line: &str, usable_width_cm: f64) -> usize {
    let defaults = LayoutConfig::default();
    estimate_with(
        line,
        usable_width_cm,
        defaults.remainder_threshold_cm,
        &defaults.char_widths,
    )
}

/// A configured estimator: the usable width, threshold and width classifier bundled together
/// so the pagination engine can cost lines without carrying the whole layout around.
#[derive(Debug, Clone)]
pub struct LineEstimator<W = CharWidths> {
    usable_width_cm: f64,
    remainder_threshold_cm: f64,
    widths: W,
}

impl LineEstimator<CharWidths> {
    pub fn from_layout(layout: &LayoutConfig) -> Self {
        Self {
            usable_width_cm: layout.usable_width_cm,
            remainder_threshold_cm: layout.remainder_threshold_cm,
            widths: layout.char_widths.clone(),
        }
    }
}

impl<W: WidthClassifier> LineEstimator<W> {
    pub fn new(usable_width_cm: f64, remainder_threshold_cm: f64, widths: W) -> Self {
        Self {
            usable_width_cm,
            remainder_threshold_cm,
            widths,
        }
    }

    pub fn cost(&self, line: &str) -> usize {
        estimate_with(
            line,
            self.usable_width_cm,
            self.remainder_threshold_cm,
            &self.widths,
        )
    }

    pub fn usable_width_cm(&self) -> f64 {
        self.usable_width_cm
    }

    pub fn widths(&self) -> &W {
        &self.widths
    }
}
