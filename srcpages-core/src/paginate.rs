//! Pagination engine: fits an ordered sequence of source units into a page budget.
//!
//! Two modes:
//! - **fixed**: emit units in order until the rendered-line budget is spent, truncating
//!   mid-unit if necessary ([`paginate_fixed`]).
//! - **auto**: render everything; if the result is longer than the page cap, keep the front
//!   half and the back half of the cap and report how many pages were left out
//!   ([`paginate_auto`]).
//!
//! Every unit is framed by a delimiter header, a blank separator and a trailing blank line.
//! The budget is checked before each line is appended, so a fixed-mode listing can end at most
//! one line past the budget (the trailing blank of the last complete unit).

use tracing::debug;

use crate::config::{LayoutConfig, PageTarget};
use crate::contract::SourceUnit;
use crate::estimate::{LineEstimator, WidthClassifier};

/// Rows that must fit after a unit header before the header is emitted: its blank separator
/// and at least one more line.
const HEADER_RESERVE: usize = 2;

/// The delimiter line that introduces each unit.
pub fn unit_header(label: &str) -> String {
    format!("/* ========== {label} ========== */")
}

/// A single ordered line stream and its total rendered cost.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pagination {
    pub lines: Vec<String>,
    pub total_cost: usize,
}

/// Final pagination result handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Paginated {
    /// The listing is printed as is.
    Whole { lines: Vec<String>, total_cost: usize },
    /// Only the front and back of the corpus are printed; the middle is replaced by a marker.
    Split {
        front: Vec<String>,
        back: Vec<String>,
        /// Pages of the full listing that were left out.
        omitted_pages: usize,
        /// Pages the full listing would have occupied.
        total_pages: usize,
        /// Rendered cost of the full listing.
        total_cost: usize,
    },
}

impl Paginated {
    pub fn is_split(&self) -> bool {
        matches!(self, Paginated::Split { .. })
    }

    /// Number of logical lines that will be printed.
    pub fn line_count(&self) -> usize {
        match self {
            Paginated::Whole { lines, .. } => lines.len(),
            Paginated::Split { front, back, .. } => front.len() + back.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.line_count() == 0
    }
}

impl From<Pagination> for Paginated {
    fn from(pagination: Pagination) -> Self {
        Paginated::Whole {
            lines: pagination.lines,
            total_cost: pagination.total_cost,
        }
    }
}

/// Emit units in order until `budget` rendered lines are spent.
///
/// A unit whose header (plus its separator and one line) no longer fits is omitted together
/// with every later unit. A content line that would exceed the budget ends the listing.
pub fn paginate_fixed<W: WidthClassifier>(
    units: &[SourceUnit],
    budget: usize,
    estimator: &LineEstimator<W>,
) -> Pagination {
    render_units(units, Some(budget), estimator)
}

/// Render the whole corpus and split it around the page cap if it is too long.
///
/// `lines_per_page` is expected to be non-zero ([`LayoutConfig::validate`] enforces this);
/// zero is treated as one.
pub fn paginate_auto<W: WidthClassifier>(
    units: &[SourceUnit],
    page_cap: usize,
    lines_per_page: usize,
    estimator: &LineEstimator<W>,
) -> Paginated {
    let lines_per_page = lines_per_page.max(1);
    let full = render_units(units, None, estimator);
    let total_pages = full.total_cost.div_ceil(lines_per_page);

    if total_pages <= page_cap {
        debug!(total_pages, page_cap, "Listing fits within the page cap");
        return full.into();
    }

    let front_pages = page_cap / 2;
    let back_pages = page_cap - front_pages;
    let front_budget = front_pages * lines_per_page;
    let back_budget = back_pages * lines_per_page;

    let costs: Vec<usize> = full.lines.iter().map(|line| estimator.cost(line)).collect();
    let front_len = fitting_prefix_len(costs.iter().copied(), front_budget);
    let back_len = fitting_prefix_len(costs.iter().rev().copied(), back_budget);
    let back_start = full.lines.len() - back_len;

    if back_start < front_len {
        debug!(
            front_len,
            back_start, "Front and back segments overlap, keeping the whole listing"
        );
        return full.into();
    }

    let total_cost = full.total_cost;
    let mut front = full.lines;
    let back = front.split_off(back_start);
    front.truncate(front_len);

    debug!(
        total_pages,
        page_cap,
        front_lines = front.len(),
        back_lines = back.len(),
        "Listing split into front and back segments"
    );
    Paginated::Split {
        front,
        back,
        omitted_pages: total_pages - page_cap,
        total_pages,
        total_cost,
    }
}

/// Rendered cost of every unit with its framing, as if printed without a budget.
pub fn listing_cost<W: WidthClassifier>(
    units: &[SourceUnit],
    estimator: &LineEstimator<W>,
) -> usize {
    render_units(units, None, estimator).total_cost
}

/// Dispatch on the page target using the budgets from `layout`.
pub fn paginate<W: WidthClassifier>(
    units: &[SourceUnit],
    target: PageTarget,
    layout: &LayoutConfig,
    estimator: &LineEstimator<W>,
) -> Paginated {
    match target {
        PageTarget::Fixed(pages) => {
            paginate_fixed(units, layout.budget_for_pages(pages), estimator).into()
        }
        PageTarget::Auto => {
            paginate_auto(units, layout.page_cap, layout.lines_per_page, estimator)
        }
    }
}

fn render_units<W: WidthClassifier>(
    units: &[SourceUnit],
    budget: Option<usize>,
    estimator: &LineEstimator<W>,
) -> Pagination {
    let fits = |total: usize, cost: usize| budget.map_or(true, |budget| total + cost <= budget);
    let blank_cost = estimator.cost("");
    let mut lines = Vec::new();
    let mut total = 0;

    'units: for unit in units {
        if unit.lines.is_empty() {
            debug!(label = %unit.label, "Skipping unit without content");
            continue;
        }

        let header = unit_header(&unit.label);
        let header_cost = estimator.cost(&header);
        if !fits(total, header_cost + HEADER_RESERVE) {
            debug!(label = %unit.label, total, "Budget exhausted before unit header");
            break;
        }
        lines.push(header);
        lines.push(String::new());
        total += header_cost + blank_cost;

        for (index, line) in unit.lines.iter().enumerate() {
            let cost = estimator.cost(line);
            if !fits(total, cost) {
                debug!(
                    label = %unit.label,
                    kept = index,
                    of = unit.lines.len(),
                    total,
                    "Budget exhausted inside unit"
                );
                break 'units;
            }
            lines.push(line.clone());
            total += cost;
        }

        lines.push(String::new());
        total += blank_cost;

        if budget.is_some_and(|budget| total >= budget) {
            break;
        }
    }

    Pagination {
        lines,
        total_cost: total,
    }
}

/// Length of the longest run at the start of `costs` whose sum stays within `budget`.
fn fitting_prefix_len(costs: impl Iterator<Item = usize>, budget: usize) -> usize {
    let mut used = 0;
    costs
        .take_while(|cost| {
            used += cost;
            used <= budget
        })
        .count()
}
