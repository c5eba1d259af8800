use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

/// Default number of pages an auto-mode listing may occupy before it is split.
pub const DEFAULT_PAGE_CAP: usize = 60;

/// Default number of printed lines per page (A4, 10pt, single spacing).
pub const DEFAULT_LINES_PER_PAGE: usize = 57;

/// Default usable text width: 21cm paper minus 3cm left and 2.5cm right margins.
pub const DEFAULT_USABLE_WIDTH_CM: f64 = 15.5;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("usable width must be a positive number of centimetres, got {0}")]
    UsableWidth(f64),
    #[error("lines per page must be at least 1")]
    LinesPerPage,
    #[error("page cap must be at least 1")]
    PageCap,
    #[error("character widths must be non-negative, got narrow={narrow} wide={wide}")]
    CharWidths { narrow: f64, wide: f64 },
    #[error("remainder threshold must be non-negative, got {0}")]
    RemainderThreshold(f64),
    #[error("invalid page target {0:?}: expected a page count or \"auto\"")]
    PageTarget(String),
}

/// Two-bucket character width table used by the default width classifier.
///
/// Characters up to and including `narrow_max` cost `narrow_cm`, everything above costs `wide_cm`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharWidths {
    pub narrow_cm: f64,
    pub wide_cm: f64,
    pub narrow_max: char,
}

impl Default for CharWidths {
    fn default() -> Self {
        Self {
            narrow_cm: 0.18,
            wide_cm: 0.35,
            narrow_max: '\u{7f}',
        }
    }
}

/// Budget parameters consumed by the estimator and the pagination engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub usable_width_cm: f64,
    pub lines_per_page: usize,
    pub page_cap: usize,
    pub char_widths: CharWidths,
    /// A partial row narrower than this is absorbed instead of costing a full line.
    pub remainder_threshold_cm: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            usable_width_cm: DEFAULT_USABLE_WIDTH_CM,
            lines_per_page: DEFAULT_LINES_PER_PAGE,
            page_cap: DEFAULT_PAGE_CAP,
            char_widths: CharWidths::default(),
            remainder_threshold_cm: 0.1,
        }
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.usable_width_cm.is_finite() && self.usable_width_cm > 0.0) {
            return Err(ConfigError::UsableWidth(self.usable_width_cm));
        }
        if self.lines_per_page == 0 {
            return Err(ConfigError::LinesPerPage);
        }
        if self.page_cap == 0 {
            return Err(ConfigError::PageCap);
        }
        let widths = &self.char_widths;
        if !(widths.narrow_cm >= 0.0 && widths.wide_cm >= 0.0) {
            return Err(ConfigError::CharWidths {
                narrow: widths.narrow_cm,
                wide: widths.wide_cm,
            });
        }
        if !(self.remainder_threshold_cm >= 0.0) {
            return Err(ConfigError::RemainderThreshold(self.remainder_threshold_cm));
        }
        Ok(())
    }

    /// Page budget, in rendered lines, for a fixed page count.
    pub fn budget_for_pages(&self, pages: usize) -> usize {
        pages.saturating_mul(self.lines_per_page)
    }

    /// Number of pages a total rendered cost occupies (rounded up).
    pub fn pages_for_cost(&self, total_cost: usize) -> usize {
        total_cost.div_ceil(self.lines_per_page)
    }

    pub fn trace_loaded(&self) {
        info!(
            usable_width_cm = self.usable_width_cm,
            lines_per_page = self.lines_per_page,
            page_cap = self.page_cap,
            "Loaded layout config"
        );
        debug!(?self, "Layout config loaded (full debug)");
    }
}

/// Physical page geometry for the PDF renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSetup {
    pub page_width_cm: f32,
    pub page_height_cm: f32,
    pub margin_top_cm: f32,
    pub margin_bottom_cm: f32,
    pub margin_left_cm: f32,
    pub margin_right_cm: f32,
    /// Size of the header, footer and split-marker text.
    pub label_font_size_pt: f32,
    /// TrueType font for the listing. Without one the built-in Courier is used,
    /// which cannot show characters outside Latin-1.
    pub font_path: Option<PathBuf>,
}

impl Default for PageSetup {
    fn default() -> Self {
        Self {
            page_width_cm: 21.0,
            page_height_cm: 29.7,
            margin_top_cm: 2.5,
            margin_bottom_cm: 2.5,
            margin_left_cm: 3.0,
            margin_right_cm: 2.5,
            label_font_size_pt: 10.0,
            font_path: None,
        }
    }
}

/// Text templates printed around the listing.
///
/// Placeholders: `{name}`, `{version}`, `{page}`, `{pages}`, `{front}`, `{back}`, `{omitted}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
    pub header: String,
    pub page_label: String,
    pub footer: String,
    pub split_marker: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            header: "{name} {version}".to_string(),
            page_label: "Page {page} of {pages}".to_string(),
            footer: "Page {page}".to_string(),
            split_marker: "(First {front} pages of source code above, last {back} pages below; {omitted} pages omitted in between)".to_string(),
        }
    }
}

/// How many pages the listing should fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PageTargetRepr", into = "PageTargetRepr")]
pub enum PageTarget {
    /// Truncate the corpus to this many pages.
    Fixed(usize),
    /// Keep everything up to the page cap, otherwise keep the front and back halves.
    Auto,
}

impl Default for PageTarget {
    fn default() -> Self {
        PageTarget::Fixed(DEFAULT_PAGE_CAP)
    }
}

impl FromStr for PageTarget {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("auto") {
            return Ok(PageTarget::Auto);
        }
        trimmed
            .parse::<usize>()
            .map(PageTarget::Fixed)
            .map_err(|_| ConfigError::PageTarget(s.to_string()))
    }
}

impl fmt::Display for PageTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageTarget::Fixed(pages) => write!(f, "{pages}"),
            PageTarget::Auto => write!(f, "auto"),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum PageTargetRepr {
    Count(usize),
    Word(String),
}

impl TryFrom<PageTargetRepr> for PageTarget {
    type Error = ConfigError;

    fn try_from(repr: PageTargetRepr) -> Result<Self, Self::Error> {
        match repr {
            PageTargetRepr::Count(pages) => Ok(PageTarget::Fixed(pages)),
            PageTargetRepr::Word(word) => word.parse(),
        }
    }
}

impl From<PageTarget> for PageTargetRepr {
    fn from(target: PageTarget) -> Self {
        match target {
            PageTarget::Fixed(pages) => PageTargetRepr::Count(pages),
            PageTarget::Auto => PageTargetRepr::Word("auto".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_target_parses_counts_and_auto() {
        assert_eq!("42".parse::<PageTarget>(), Ok(PageTarget::Fixed(42)));
        assert_eq!("AUTO".parse::<PageTarget>(), Ok(PageTarget::Auto));
        assert!(matches!(
            "sixty".parse::<PageTarget>(),
            Err(ConfigError::PageTarget(_))
        ));
    }

    #[test]
    fn default_layout_is_valid() {
        let layout = LayoutConfig::default();
        assert_eq!(layout.validate(), Ok(()));
        assert_eq!(layout.budget_for_pages(60), 60 * 57);
        assert_eq!(layout.pages_for_cost(57), 1);
        assert_eq!(layout.pages_for_cost(58), 2);
    }

    #[test]
    fn rejects_zero_lines_per_page() {
        let layout = LayoutConfig {
            lines_per_page: 0,
            ..LayoutConfig::default()
        };
        assert_eq!(layout.validate(), Err(ConfigError::LinesPerPage));
    }
}
