//! PDF output for a paginated listing.
//!
//! The listing is laid out on a fixed grid of `lines_per_page` rows per page. Long lines are
//! wrapped with the same width classifier the estimator uses, so a whole listing prints on
//! about as many pages as were estimated for it. A split listing also carries the marker rows
//! between its segments. When the front segment fills its pages exactly, the back segment
//! starts one page later and the document runs to `page_cap + 1` pages.

use std::path::Path;

use printpdf::{
    BuiltinFont, FontId, Mm, Op, ParsedFont, PdfDocument, PdfPage, PdfSaveOptions, Point, Pt,
    TextItem,
};
use tracing::{debug, info};

use crate::config::{Labels, LayoutConfig, PageSetup};
use crate::contract::{DocumentMeta, DocumentRenderer, RenderError, RenderSummary};
use crate::estimate::WidthClassifier;
use crate::paginate::Paginated;

const PT_PER_CM: f32 = 72.0 / 2.54;
/// Advance width of a monospaced glyph relative to its point size.
const MONO_ADVANCE_EM: f32 = 0.6;

/// One grid row of the printed body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    Code(String),
    Marker(String),
}

#[derive(Debug, Clone, Default)]
pub struct PdfRenderer {
    layout: LayoutConfig,
    page: PageSetup,
    labels: Labels,
}

impl PdfRenderer {
    pub fn new(layout: LayoutConfig, page: PageSetup, labels: Labels) -> Self {
        Self {
            layout,
            page,
            labels,
        }
    }

    fn listing_font_size(&self) -> Pt {
        let narrow_cm = self.layout.char_widths.narrow_cm as f32;
        Pt(narrow_cm * PT_PER_CM / MONO_ADVANCE_EM)
    }

    fn row_height_cm(&self) -> f32 {
        let body = self.page.page_height_cm - self.page.margin_top_cm - self.page.margin_bottom_cm;
        body / self.layout.lines_per_page.max(1) as f32
    }

    fn load_font(&self, doc: &mut PdfDocument) -> Result<Fonts, RenderError> {
        let Some(path) = &self.page.font_path else {
            return Ok(Fonts::Builtin);
        };
        let bytes = std::fs::read(path).map_err(|e| RenderError::Font {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        let mut warnings = Vec::new();
        let parsed = ParsedFont::from_bytes(&bytes, 0, &mut warnings).ok_or_else(|| {
            RenderError::Font {
                path: path.clone(),
                reason: "not a usable TrueType or OpenType font".to_string(),
            }
        })?;
        debug!(path = %path.display(), "Loaded listing font");
        Ok(Fonts::External(doc.add_font(&parsed)))
    }

    fn page_ops(
        &self,
        fonts: &Fonts,
        meta: &DocumentMeta,
        rows: &[Row],
        page_number: usize,
        page_count: usize,
    ) -> Vec<Op> {
        let page = &self.page;
        let label_size = Pt(page.label_font_size_pt);
        let code_size = self.listing_font_size();
        let row_height = self.row_height_cm();
        let mut ops = Vec::new();

        let header_y = page.page_height_cm - page.margin_top_cm / 2.0;
        let header = fill_template(
            &self.labels.header,
            &[("name", meta.name.clone()), ("version", meta.version.clone())],
        );
        fonts.write(&mut ops, false, label_size, page.margin_left_cm, header_y, &header);

        let page_label = fill_template(
            &self.labels.page_label,
            &[
                ("page", page_number.to_string()),
                ("pages", page_count.to_string()),
            ],
        );
        let label_x =
            page.page_width_cm - page.margin_right_cm - text_width_cm(&page_label, label_size);
        fonts.write(&mut ops, false, label_size, label_x, header_y, &page_label);

        for (index, row) in rows.iter().enumerate() {
            // Baseline sits near the bottom of the row's slot.
            let y = page.page_height_cm - page.margin_top_cm - row_height * (index as f32 + 0.8);
            match row {
                Row::Code(text) if text.is_empty() => {}
                Row::Code(text) => {
                    fonts.write(&mut ops, false, code_size, page.margin_left_cm, y, text);
                }
                Row::Marker(text) => {
                    let x = page.margin_left_cm
                        + ((usable_width_cm(page) - text_width_cm(text, label_size)) / 2.0)
                            .max(0.0);
                    fonts.write(&mut ops, true, label_size, x, y, text);
                }
            }
        }

        let footer = fill_template(
            &self.labels.footer,
            &[
                ("page", page_number.to_string()),
                ("pages", page_count.to_string()),
            ],
        );
        let footer_x = (page.page_width_cm - text_width_cm(&footer, label_size)) / 2.0;
        fonts.write(
            &mut ops,
            false,
            label_size,
            footer_x,
            page.margin_bottom_cm / 2.0,
            &footer,
        );
        ops
    }
}

impl DocumentRenderer for PdfRenderer {
    fn render(
        &self,
        meta: &DocumentMeta,
        body: &Paginated,
        output: &Path,
    ) -> Result<RenderSummary, RenderError> {
        if body.is_empty() {
            return Err(RenderError::EmptyDocument);
        }

        let rows = layout_rows(body, &self.layout, &self.page, &self.labels);
        let per_page = self.layout.lines_per_page.max(1);
        let page_count = rows.len().div_ceil(per_page);

        let mut doc = PdfDocument::new(&format!("{} {}", meta.name, meta.version));
        let fonts = self.load_font(&mut doc)?;

        let pages: Vec<PdfPage> = rows
            .chunks(per_page)
            .enumerate()
            .map(|(index, chunk)| {
                let ops = self.page_ops(&fonts, meta, chunk, index + 1, page_count);
                PdfPage::new(
                    Mm(self.page.page_width_cm * 10.0),
                    Mm(self.page.page_height_cm * 10.0),
                    ops,
                )
            })
            .collect();

        let mut warnings = Vec::new();
        let bytes = doc
            .with_pages(pages)
            .save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            debug!(count = warnings.len(), "PDF writer reported warnings");
        }

        std::fs::write(output, bytes).map_err(|source| RenderError::Io {
            path: output.to_path_buf(),
            source,
        })?;

        let summary = RenderSummary {
            pages: page_count,
            rows: rows.len(),
        };
        info!(
            output = %output.display(),
            pages = summary.pages,
            rows = summary.rows,
            "Wrote PDF"
        );
        Ok(summary)
    }
}

enum Fonts {
    Builtin,
    External(FontId),
}

impl Fonts {
    fn write(&self, ops: &mut Vec<Op>, bold: bool, size: Pt, x_cm: f32, y_cm: f32, text: &str) {
        ops.push(Op::StartTextSection);
        ops.push(Op::SetTextCursor {
            pos: Point::new(Mm(x_cm * 10.0), Mm(y_cm * 10.0)),
        });
        let items = vec![TextItem::Text(text.to_string())];
        match self {
            Fonts::Builtin => {
                let font = if bold {
                    BuiltinFont::CourierBold
                } else {
                    BuiltinFont::Courier
                };
                ops.push(Op::SetFontSizeBuiltinFont { size, font });
                ops.push(Op::WriteTextBuiltinFont { items, font });
            }
            Fonts::External(font) => {
                ops.push(Op::SetFontSize {
                    size,
                    font: font.clone(),
                });
                ops.push(Op::WriteText {
                    items,
                    font: font.clone(),
                });
            }
        }
        ops.push(Op::EndTextSection);
    }
}

/// Turn the paginated listing into grid rows, wrapping long lines and inserting the split marker.
pub fn layout_rows(
    body: &Paginated,
    layout: &LayoutConfig,
    page: &PageSetup,
    labels: &Labels,
) -> Vec<Row> {
    let wrap = |lines: &[String], rows: &mut Vec<Row>| {
        for line in lines {
            rows.extend(
                wrap_line(
                    line,
                    layout.usable_width_cm,
                    layout.remainder_threshold_cm,
                    &layout.char_widths,
                )
                .into_iter()
                .map(Row::Code),
            );
        }
    };

    let mut rows = Vec::new();
    match body {
        Paginated::Whole { lines, .. } => wrap(lines, &mut rows),
        Paginated::Split {
            front,
            back,
            omitted_pages,
            total_pages,
            ..
        } => {
            let kept = total_pages - omitted_pages;
            let front_pages = kept / 2;
            let marker = fill_template(
                &labels.split_marker,
                &[
                    ("front", front_pages.to_string()),
                    ("back", (kept - front_pages).to_string()),
                    ("omitted", omitted_pages.to_string()),
                ],
            );
            wrap(front, &mut rows);
            rows.push(Row::Code(String::new()));
            rows.extend(wrap_marker(&marker, page).into_iter().map(Row::Marker));
            rows.push(Row::Code(String::new()));
            wrap(back, &mut rows);
        }
    }
    rows
}

/// Break `line` into printed rows no wider than the usable width (plus the remainder threshold).
///
/// Tabs are printed as a single space. An empty line yields one empty row.
pub fn wrap_line<W: WidthClassifier>(
    line: &str,
    usable_width_cm: f64,
    remainder_threshold_cm: f64,
    widths: &W,
) -> Vec<String> {
    let limit = usable_width_cm + remainder_threshold_cm;
    let mut rows = Vec::new();
    let mut current = String::new();
    let mut used = 0.0;
    for ch in line.chars() {
        let ch = if ch == '\t' { ' ' } else { ch };
        let width = widths.width_of(ch);
        if !current.is_empty() && used + width > limit {
            rows.push(std::mem::take(&mut current));
            used = 0.0;
        }
        current.push(ch);
        used += width;
    }
    rows.push(current);
    rows
}

/// Break the split marker into rows that fit between the margins at the label font size.
///
/// Rows break at spaces. A word longer than a whole row is cut.
pub fn wrap_marker(text: &str, page: &PageSetup) -> Vec<String> {
    let char_cm = text_width_cm("x", Pt(page.label_font_size_pt));
    let max_chars = if char_cm > 0.0 {
        ((usable_width_cm(page) / char_cm).floor() as usize).max(1)
    } else {
        usize::MAX
    };

    let mut rows = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    for word in text.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();
        for piece in chars.chunks(max_chars) {
            if current_len > 0 && current_len + 1 + piece.len() <= max_chars {
                current.push(' ');
                current_len += 1;
            } else if current_len > 0 {
                rows.push(std::mem::take(&mut current));
                current_len = 0;
            }
            current.extend(piece);
            current_len += piece.len();
        }
    }
    if current_len > 0 || rows.is_empty() {
        rows.push(current);
    }
    rows
}

/// Replace `{key}` placeholders in `template`. Unknown placeholders are left as they are.
pub fn fill_template(template: &str, values: &[(&str, String)]) -> String {
    values.iter().fold(template.to_string(), |text, (key, value)| {
        text.replace(&format!("{{{key}}}"), value)
    })
}

fn usable_width_cm(page: &PageSetup) -> f32 {
    page.page_width_cm - page.margin_left_cm - page.margin_right_cm
}

fn text_width_cm(text: &str, size: Pt) -> f32 {
    text.chars().count() as f32 * size.0 * MONO_ADVANCE_EM / PT_PER_CM
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CharWidths;

    #[test]
    fn short_lines_are_not_wrapped() {
        let rows = wrap_line("let x = 1;", 15.5, 0.1, &CharWidths::default());
        assert_eq!(rows, vec!["let x = 1;"]);
    }

    #[test]
    fn long_lines_wrap_at_the_usable_width() {
        let line = "x".repeat(200);
        let rows = wrap_line(&line, 15.5, 0.1, &CharWidths::default());
        // 15.6cm / 0.18cm per char fits 86 characters per row.
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].len(), 86);
        assert_eq!(rows.concat(), line);
    }

    #[test]
    fn empty_line_is_one_empty_row() {
        assert_eq!(
            wrap_line("", 15.5, 0.1, &CharWidths::default()),
            vec![String::new()]
        );
    }

    #[test]
    fn templates_fill_known_placeholders() {
        let text = fill_template(
            "Page {page} of {pages} {unknown}",
            &[("page", "3".to_string()), ("pages", "9".to_string())],
        );
        assert_eq!(text, "Page 3 of 9 {unknown}");
    }

    #[test]
    fn split_listing_gets_a_marker_between_segments() {
        let body = Paginated::Split {
            front: vec!["a".to_string()],
            back: vec!["z".to_string()],
            omitted_pages: 30,
            total_pages: 90,
            total_cost: 90 * 57,
        };
        let rows = layout_rows(
            &body,
            &LayoutConfig::default(),
            &PageSetup::default(),
            &Labels::default(),
        );
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0], Row::Code("a".to_string()));
        assert_eq!(rows[1], Row::Code(String::new()));
        assert_eq!(
            rows[2],
            Row::Marker(
                "(First 30 pages of source code above, last 30 pages below; 30 pages".to_string()
            )
        );
        assert_eq!(rows[3], Row::Marker("omitted in between)".to_string()));
        assert_eq!(rows[4], Row::Code(String::new()));
        assert_eq!(rows[5], Row::Code("z".to_string()));
    }

    #[test]
    fn marker_rows_fit_between_the_margins() {
        let page = PageSetup::default();
        let body = Paginated::Split {
            front: vec!["a".to_string()],
            back: vec!["z".to_string()],
            omitted_pages: 1200,
            total_pages: 1260,
            total_cost: 1260 * 57,
        };
        let rows = layout_rows(&body, &LayoutConfig::default(), &page, &Labels::default());
        let markers: Vec<&String> = rows
            .iter()
            .filter_map(|row| match row {
                Row::Marker(text) => Some(text),
                Row::Code(_) => None,
            })
            .collect();

        assert!(markers.len() > 1);
        for marker in &markers {
            let width = text_width_cm(marker, Pt(page.label_font_size_pt));
            assert!(
                width <= usable_width_cm(&page),
                "marker row {marker:?} is {width}cm wide"
            );
        }
        let joined = markers
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        assert!(joined.contains("1200 pages omitted"), "got: {joined}");
    }

    #[test]
    fn long_marker_words_are_cut_to_the_row_width() {
        let page = PageSetup {
            label_font_size_pt: 40.0,
            ..PageSetup::default()
        };
        // 40pt Courier fits 18 characters in 15.5cm.
        let rows = wrap_marker(&"m".repeat(40), &page);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].len(), 18);
        assert_eq!(rows.concat(), "m".repeat(40));
    }
}
