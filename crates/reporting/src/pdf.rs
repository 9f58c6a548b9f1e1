//! PDF export of an analysis: title, optional data scope, overall summary,
//! numbered recommendations and footer, on US-Letter pages.
//!
//! Layout is computed in points by [`lay_out`] and rendered separately so
//! pagination and wrapping can be tested without parsing PDF output.

use crate::summary::Analysis;
use media_core::config::ReportConfig;
use media_core::error::{MediaError, MediaResult};
use media_core::types::DateBounds;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument};
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

pub const PAGE_WIDTH_PT: f64 = 612.0;
pub const PAGE_HEIGHT_PT: f64 = 792.0;
pub const MARGIN_PT: f64 = 72.0;
const PT_PER_MM: f64 = 72.0 / 25.4;

pub const NO_RECOMMENDATIONS_LINE: &str = "No specific recommendations were provided.";

// ─── Content ────────────────────────────────────────────────────────────────

/// What the analysis covered, printed under the title.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportScope {
    pub records_analyzed: usize,
    pub date_bounds: Option<DateBounds>,
    pub filters: String,
    pub source: String,
}

#[derive(Debug, Clone)]
pub struct ReportContent {
    pub title: String,
    pub summary: String,
    pub recommendations: Vec<String>,
    pub scope: Option<ReportScope>,
    pub footer_lines: Vec<String>,
}

impl ReportContent {
    pub fn from_analysis(
        analysis: &Analysis,
        config: &ReportConfig,
        scope: Option<ReportScope>,
    ) -> Self {
        Self {
            title: config.title.clone(),
            summary: analysis.summary.clone(),
            recommendations: analysis.recommendations.clone(),
            scope,
            footer_lines: config.footer_lines.clone(),
        }
    }
}

// ─── Layout ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, Copy)]
struct ParagraphStyle {
    font: FontStyle,
    size: f64,
    leading: f64,
    align: Align,
    space_before: f64,
    space_after: f64,
}

const TITLE: ParagraphStyle = ParagraphStyle {
    font: FontStyle::Bold,
    size: 24.0,
    leading: 28.0,
    align: Align::Center,
    space_before: 0.0,
    space_after: 20.0,
};

const NORMAL: ParagraphStyle = ParagraphStyle {
    font: FontStyle::Regular,
    size: 10.0,
    leading: 12.0,
    align: Align::Left,
    space_before: 0.0,
    space_after: 0.0,
};

const HEADING: ParagraphStyle = ParagraphStyle {
    font: FontStyle::Bold,
    size: 16.0,
    leading: 18.0,
    align: Align::Left,
    space_before: 20.0,
    space_after: 10.0,
};

const BODY: ParagraphStyle = ParagraphStyle {
    font: FontStyle::Regular,
    size: 12.0,
    leading: 14.0,
    align: Align::Left,
    space_before: 0.0,
    space_after: 5.0,
};

/// A single line of text positioned on a page. `y` is the baseline,
/// measured up from the bottom edge.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub font: FontStyle,
    pub size: f64,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Default)]
pub struct PageLayout {
    pub lines: Vec<PlacedLine>,
}

enum Flowable {
    Paragraph(String, ParagraphStyle),
    Spacer(f64),
}

struct Frame {
    pages: Vec<PageLayout>,
    cursor: f64,
}

impl Frame {
    fn new() -> Self {
        Self {
            pages: vec![PageLayout::default()],
            cursor: PAGE_HEIGHT_PT - MARGIN_PT,
        }
    }

    fn new_page(&mut self) {
        self.pages.push(PageLayout::default());
        self.cursor = PAGE_HEIGHT_PT - MARGIN_PT;
    }

    fn at_page_top(&self) -> bool {
        (self.cursor - (PAGE_HEIGHT_PT - MARGIN_PT)).abs() < f64::EPSILON
    }

    fn place(&mut self, flowable: &Flowable) {
        match flowable {
            Flowable::Spacer(height) => {
                self.cursor -= height;
                if self.cursor < MARGIN_PT {
                    self.new_page();
                }
            }
            Flowable::Paragraph(text, style) => {
                if !self.at_page_top() {
                    self.cursor -= style.space_before;
                }
                let width = PAGE_WIDTH_PT - 2.0 * MARGIN_PT;
                for line in wrap_text(text, style.font, style.size, width) {
                    if self.cursor - style.leading < MARGIN_PT {
                        self.new_page();
                    }
                    self.cursor -= style.leading;
                    let x = match style.align {
                        Align::Left => MARGIN_PT,
                        Align::Center => {
                            (PAGE_WIDTH_PT - text_width(&line, style.font, style.size)) / 2.0
                        }
                    };
                    let y = self.cursor + (style.leading - style.size);
                    if let Some(page) = self.pages.last_mut() {
                        page.lines.push(PlacedLine {
                            text: line,
                            font: style.font,
                            size: style.size,
                            x,
                            y,
                        });
                    }
                }
                self.cursor -= style.space_after;
            }
        }
    }
}

fn flowables(content: &ReportContent) -> Vec<Flowable> {
    let mut out = vec![
        Flowable::Paragraph(content.title.clone(), TITLE),
        Flowable::Paragraph("---".to_string(), NORMAL),
        Flowable::Spacer(12.0),
    ];

    if let Some(scope) = &content.scope {
        out.push(Flowable::Paragraph("Data Scope:".to_string(), HEADING));
        out.push(Flowable::Paragraph(
            format!("Records analyzed: {}", scope.records_analyzed),
            BODY,
        ));
        if let Some(bounds) = &scope.date_bounds {
            out.push(Flowable::Paragraph(format!("Date range: {bounds}"), BODY));
        }
        out.push(Flowable::Paragraph(format!("Filters: {}", scope.filters), BODY));
        out.push(Flowable::Paragraph(
            format!("Analysis source: {}", scope.source),
            BODY,
        ));
    }

    out.push(Flowable::Paragraph("Overall Summary:".to_string(), HEADING));
    out.push(Flowable::Paragraph(content.summary.clone(), BODY));
    out.push(Flowable::Spacer(24.0));

    out.push(Flowable::Paragraph(
        "Campaign Recommendations:".to_string(),
        HEADING,
    ));
    if content.recommendations.is_empty() {
        out.push(Flowable::Paragraph(NO_RECOMMENDATIONS_LINE.to_string(), BODY));
    } else {
        for (i, rec) in content.recommendations.iter().enumerate() {
            out.push(Flowable::Paragraph(format!("{}. {}", i + 1, rec), BODY));
        }
    }
    out.push(Flowable::Spacer(24.0));

    for line in &content.footer_lines {
        out.push(Flowable::Paragraph(line.clone(), BODY));
    }
    out
}

/// Position every line of the report, flowing onto new pages as needed.
pub fn lay_out(content: &ReportContent) -> Vec<PageLayout> {
    let mut frame = Frame::new();
    for flowable in flowables(content) {
        frame.place(&flowable);
    }
    frame.pages.retain(|p| !p.lines.is_empty());
    frame.pages
}

// ─── Text metrics ───────────────────────────────────────────────────────────

// Advance widths (1/1000 em) for printable ASCII 0x20..=0x7E.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

fn char_width(c: char, font: FontStyle) -> u16 {
    let table = match font {
        FontStyle::Regular => &HELVETICA_WIDTHS,
        FontStyle::Bold => &HELVETICA_BOLD_WIDTHS,
    };
    let code = c as u32;
    if (0x20..=0x7E).contains(&code) {
        table[(code - 0x20) as usize]
    } else {
        556
    }
}

/// Rendered width of `text` in points.
pub fn text_width(text: &str, font: FontStyle, size: f64) -> f64 {
    text.chars().map(|c| char_width(c, font) as f64).sum::<f64>() * size / 1000.0
}

/// Greedy word wrap to `max_width` points. Words wider than a line are
/// broken between characters.
pub fn wrap_text(text: &str, font: FontStyle, size: f64, max_width: f64) -> Vec<String> {
    let text = sanitize(text);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if text_width(&candidate, font, size) <= max_width {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if text_width(word, font, size) <= max_width {
            current = word.to_string();
        } else {
            for c in word.chars() {
                let mut next = current.clone();
                next.push(c);
                if !current.is_empty() && text_width(&next, font, size) > max_width {
                    lines.push(std::mem::take(&mut current));
                    current.push(c);
                } else {
                    current = next;
                }
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Map text onto what the built-in fonts can show: typographic punctuation
/// becomes its ASCII form, anything else outside printable ASCII becomes `?`.
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201C}' | '\u{201D}' => out.push('"'),
            '\u{2013}' | '\u{2014}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            '\u{00A0}' | '\t' | '\n' | '\r' => out.push(' '),
            c if (' '..='~').contains(&c) => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

// ─── Rendering ──────────────────────────────────────────────────────────────

fn pt_to_mm(pt: f64) -> Mm {
    Mm((pt / PT_PER_MM) as f32)
}

fn report_error(e: impl std::fmt::Display) -> MediaError {
    MediaError::Report(e.to_string())
}

/// Render the report to PDF bytes.
pub fn render_pdf(content: &ReportContent) -> MediaResult<Vec<u8>> {
    let pages = lay_out(content);
    let width = pt_to_mm(PAGE_WIDTH_PT);
    let height = pt_to_mm(PAGE_HEIGHT_PT);

    let (doc, first_page, first_layer) =
        PdfDocument::new(sanitize(&content.title), width, height, "Layer 1".to_string());
    let regular: IndirectFontRef = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(report_error)?;
    let bold: IndirectFontRef = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(report_error)?;

    for (i, page) in pages.iter().enumerate() {
        let layer = if i == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_idx, layer_idx) = doc.add_page(width, height, "Layer 1");
            doc.get_page(page_idx).get_layer(layer_idx)
        };
        for line in &page.lines {
            let font = match line.font {
                FontStyle::Regular => &regular,
                FontStyle::Bold => &bold,
            };
            layer.use_text(
                line.text.clone(),
                line.size as f32,
                pt_to_mm(line.x),
                pt_to_mm(line.y),
                font,
            );
        }
    }

    let bytes = doc.save_to_bytes().map_err(report_error)?;
    debug!(pages = pages.len(), bytes = bytes.len(), "PDF report rendered");
    Ok(bytes)
}
