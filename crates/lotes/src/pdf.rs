//! A4 PDF rendering of a batch report.
//!
//! Uses the PDF built-in Helvetica, so text is folded to ASCII before drawing.

use anyhow::{anyhow, Result};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Rgb,
};

use lotes_core::report::{Bracket, LoteReport, Sex};

const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN_X: f32 = 8.0;
const MARGIN_Y: f32 = 12.0;
const ROW_H: f32 = 5.5;
const TITLE_H: f32 = 12.0;

const SERIE_W: f32 = 22.0;
const LACRE_W: f32 = 16.0;
const OWNER_W: f32 = 64.0;

const TITLE_SIZE: f32 = 18.0;
const HEADER_SIZE: f32 = 8.0;
const BODY_SIZE: f32 = 7.5;

/// Approximate Helvetica advance per character, as a fraction of the size.
const CHAR_WIDTH: f32 = 0.5;
const PT_TO_MM: f32 = 0.3528;

/// Replaces accented letters with their ASCII base; other non-ASCII
/// characters become `?`.
pub fn fold_ascii(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' | 'ª' => 'a',
            'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'A',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'É' | 'È' | 'Ê' | 'Ë' => 'E',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' | 'º' => 'o',
            'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
            'ç' => 'c',
            'Ç' => 'C',
            'ñ' => 'n',
            'Ñ' => 'N',
            '–' | '—' | '−' => '-',
            c if c.is_ascii() => c,
            _ => '?',
        })
        .collect()
}

fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * CHAR_WIDTH * PT_TO_MM
}

/// Shortens `text` with `...` so it fits in `width` millimetres.
pub fn truncate_to_width(text: &str, width: f32, size: f32) -> String {
    if text_width(text, size) <= width {
        return text.to_string();
    }
    let per_char = size * CHAR_WIDTH * PT_TO_MM;
    let keep = ((width / per_char) as usize).saturating_sub(3);
    let mut short: String = text.chars().take(keep).collect();
    short.truncate(short.trim_end().len());
    short.push_str("...");
    short
}

/// Splits `total` rows into pages holding `first` rows, then `rest` rows.
///
/// Always yields at least one page.
pub fn paginate(total: usize, first: usize, rest: usize) -> Vec<(usize, usize)> {
    let mut pages = vec![(0, total.min(first))];
    let mut start = total.min(first);
    while start < total {
        let end = (start + rest.max(1)).min(total);
        pages.push((start, end));
        start = end;
    }
    pages
}

struct Canvas {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl Canvas {
    fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "tabela");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| anyhow!("failed to load Helvetica: {e:?}"))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| anyhow!("failed to load Helvetica-Bold: {e:?}"))?;
        let layer = doc.get_page(page).get_layer(layer);

        let canvas = Self {
            doc,
            layer,
            regular,
            bold,
        };
        canvas.pen();
        Ok(canvas)
    }

    fn pen(&self) {
        self.layer.set_outline_thickness(0.25);
        self.layer
            .set_outline_color(Color::Rgb(Rgb::new(0.80, 0.84, 0.88, None)));
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "tabela");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.pen();
    }

    /// Draws text with its baseline at `y` (measured from the top).
    fn text(&self, text: &str, size: f32, x: f32, y: f32, bold: bool) {
        let font = if bold { &self.bold } else { &self.regular };
        self.layer
            .use_text(fold_ascii(text), size, Mm(x), Mm(PAGE_H - y), font);
    }

    fn centered(&self, text: &str, size: f32, x: f32, width: f32, y: f32, bold: bool) {
        let offset = ((width - text_width(text, size)) / 2.0).max(0.5);
        self.text(text, size, x + offset, y, bold);
    }

    fn line(&self, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(x1), Mm(PAGE_H - y1)), false),
                (Point::new(Mm(x2), Mm(PAGE_H - y2)), false),
            ],
            is_closed: false,
        });
    }

    /// Draws one table row of `cells` starting at `top`; returns the next top.
    fn row(&self, widths: &[f32], cells: &[(String, bool)], size: f32, top: f32) -> f32 {
        let bottom = top + ROW_H;
        let baseline = bottom - 1.7;
        let mut x = MARGIN_X;
        for (width, (text, bold)) in widths.iter().zip(cells) {
            self.centered(text, size, x, *width, baseline, *bold);
            self.line(x, top, x, bottom);
            x += width;
        }
        self.line(x, top, x, bottom);
        self.line(MARGIN_X, top, x, top);
        self.line(MARGIN_X, bottom, x, bottom);
        bottom
    }

    fn save(self) -> Result<Vec<u8>> {
        self.doc
            .save_to_bytes()
            .map_err(|e| anyhow!("failed to write PDF: {e:?}"))
    }
}

fn sub_width(fixed: f32, columns: usize) -> f32 {
    (PAGE_W - 2.0 * MARGIN_X - fixed) / columns as f32
}

/// Bracket labels each spanning an M and an F column, merged into one cell.
fn spanned_header(brackets: impl Iterator<Item = String>) -> Vec<(String, bool)> {
    brackets.map(|label| (label, true)).collect()
}

fn sex_header(pairs: usize) -> Vec<(String, bool)> {
    (0..pairs)
        .flat_map(|_| [("M".to_string(), true), ("F".to_string(), true)])
        .collect()
}

fn draw_main_header(canvas: &Canvas, top: f32) -> f32 {
    let sub = sub_width(SERIE_W + LACRE_W + OWNER_W, Bracket::ALL.len() * 2);

    let mut widths = vec![SERIE_W, LACRE_W, OWNER_W];
    widths.extend(std::iter::repeat(sub * 2.0).take(Bracket::ALL.len()));
    let mut cells = vec![(String::new(), true); 3];
    cells.extend(spanned_header(Bracket::ALL.iter().map(|b| b.ascii_label())));
    let top = canvas.row(&widths, &cells, HEADER_SIZE, top);

    let widths = main_widths();
    let mut cells = vec![
        ("Serie".to_string(), true),
        ("Lacre".to_string(), true),
        ("Proprietario".to_string(), true),
    ];
    cells.extend(sex_header(Bracket::ALL.len()));
    canvas.row(&widths, &cells, HEADER_SIZE, top)
}

fn main_widths() -> Vec<f32> {
    let sub = sub_width(SERIE_W + LACRE_W + OWNER_W, Bracket::ALL.len() * 2);
    let mut widths = vec![SERIE_W, LACRE_W, OWNER_W];
    widths.extend(std::iter::repeat(sub).take(Bracket::ALL.len() * 2));
    widths
}

fn draw_gta_table(canvas: &Canvas, report: &LoteReport, top: f32) -> f32 {
    let pairs = Bracket::ALL.len() + 1;
    let sub = sub_width(0.0, pairs * 2);

    let title_top = top + 4.0;
    canvas.text("GTA de Saida", 11.0, MARGIN_X, title_top, true);
    let top = title_top + 2.0;

    let widths: Vec<f32> = std::iter::repeat(sub * 2.0).take(pairs).collect();
    let labels = Bracket::ALL
        .iter()
        .map(|b| b.ascii_label())
        .chain(std::iter::once("Total".to_string()));
    let top = canvas.row(&widths, &spanned_header(labels), HEADER_SIZE, top);

    let widths: Vec<f32> = std::iter::repeat(sub).take(pairs * 2).collect();
    let top = canvas.row(&widths, &sex_header(pairs), HEADER_SIZE, top);

    let mut cells: Vec<(String, bool)> = report
        .total_cells()
        .into_iter()
        .map(|n| (n.to_string(), false))
        .collect();
    cells.push((report.grand_total(Sex::M).to_string(), true));
    cells.push((report.grand_total(Sex::F).to_string(), true));
    canvas.row(&widths, &cells, HEADER_SIZE, top)
}

/// Renders a batch report as an A4 PDF.
///
/// The table header repeats on every page; the totals table follows the
/// last row.
pub fn render_report_pdf(numero: i64, report: &LoteReport) -> Result<Vec<u8>> {
    let title = format!("Lote #{numero}");
    let mut canvas = Canvas::new(&title)?;
    let widths = main_widths();

    let usable = PAGE_H - 2.0 * MARGIN_Y;
    let header = 2.0 * ROW_H;
    let first = ((usable - TITLE_H - header) / ROW_H) as usize;
    let rest = ((usable - header) / ROW_H) as usize;

    let rows: Vec<Vec<(String, bool)>> = if report.is_empty() {
        vec![vec![("-".to_string(), false); widths.len()]]
    } else {
        report
            .rows
            .iter()
            .map(|row| {
                let mut cells = vec![
                    (row.serie.clone(), false),
                    (row.lacre.clone(), false),
                    (truncate_to_width(&row.proprietario, OWNER_W - 2.0, BODY_SIZE), false),
                ];
                cells.extend(row.cells().into_iter().map(|n| (n.to_string(), false)));
                cells
            })
            .collect()
    };

    let mut top = MARGIN_Y;
    for (page, (start, end)) in paginate(rows.len(), first, rest).into_iter().enumerate() {
        if page == 0 {
            canvas.centered(&title, TITLE_SIZE, MARGIN_X, PAGE_W - 2.0 * MARGIN_X, top + 7.0, true);
            top += TITLE_H;
        } else {
            canvas.new_page();
            top = MARGIN_Y;
        }
        top = draw_main_header(&canvas, top);
        for cells in &rows[start..end] {
            top = canvas.row(&widths, cells, BODY_SIZE, top);
        }
    }

    let footer_height = 6.0 + 6.0 + 3.0 * ROW_H;
    if top + footer_height > PAGE_H - MARGIN_Y {
        canvas.new_page();
        top = MARGIN_Y;
    }
    canvas.text(
        &format!("Total de linhas (lacre): {}", report.row_count()),
        9.0,
        MARGIN_X,
        top + 5.0,
        false,
    );
    draw_gta_table(&canvas, report, top + 6.0);

    canvas.save()
}

#[cfg(test)]
mod tests {
    use lotes_core::animal::{AnimalRecord, COL_LACRE, COL_PROPRIETARIO, COL_SERIE};
    use lotes_core::report::build_report;

    use super::*;

    #[test]
    fn test_fold_ascii() {
        assert_eq!(fold_ascii("Proprietário Origem"), "Proprietario Origem");
        assert_eq!(fold_ascii("N.º Série"), "N.o Serie");
        assert_eq!(fold_ascii("13–18"), "13-18");
        assert_eq!(fold_ascii("日"), "?");
    }

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("Ana", 20.0, 8.0), "Ana");

        let long = "Agropecuaria Sao Joao das Colinas Verdes Limitada e Associados";
        let short = truncate_to_width(long, 30.0, 8.0);
        assert!(short.ends_with("..."));
        assert!(text_width(&short, 8.0) <= 30.0);
    }

    #[test]
    fn test_paginate() {
        assert_eq!(paginate(0, 45, 47), vec![(0, 0)]);
        assert_eq!(paginate(45, 45, 47), vec![(0, 45)]);
        assert_eq!(paginate(100, 45, 47), vec![(0, 45), (45, 92), (92, 100)]);
    }

    #[test]
    fn test_render_empty_report() {
        let bytes = render_report_pdf(3, &LoteReport::default()).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn test_render_multi_page_report() {
        let columns: Vec<String> = [COL_SERIE, COL_LACRE, COL_PROPRIETARIO, "M 0 - 8"]
            .iter()
            .map(|c| c.to_string())
            .collect();
        let records: Vec<AnimalRecord> = (1..=120)
            .map(|i| {
                AnimalRecord::new(i)
                    .with(COL_SERIE, i)
                    .with(COL_LACRE, 1000 + i)
                    .with(COL_PROPRIETARIO, "Fazenda Três Irmãos")
                    .with("M 0 - 8", 2)
            })
            .collect();
        let report = build_report(&columns, &records);

        let bytes = render_report_pdf(8, &report).unwrap();

        assert!(bytes.starts_with(b"%PDF-"));
        assert!(bytes.len() > 1000);
    }
}
