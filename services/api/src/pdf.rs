//! services/api/src/pdf.rs
//!
//! Renders report content into PDF bytes with `printpdf`. The content itself
//! (filenames, labels, row text) comes fully built from `firesafe_core`;
//! this module only handles layout: the optional cover page, the header
//! block with the company logo, the paginated item table, and the per-page
//! footer stamped after the body is laid out.

use chrono::{DateTime, Utc};
use firesafe_core::report::{
    format_timestamp, InspectionReport, RenewalNotice, ALT_ROW_FILL, BRAND_RED,
};
use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerIndex, PdfLayerReference, PdfPageIndex, Point, Rect, Rgb,
};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 15.0;
const BODY_LINE: f32 = 6.0;
const FOOTER_Y: f32 = 10.0;
const LOGO_WIDTH: f32 = 30.0;

/// The header block is two columns: logo at the left margin, metadata
/// starting at this x offset.
const HEADER_TEXT_X: f32 = 60.0;

/// Column layout of the item table: x offsets within the content area and
/// the character budget per cell.
const TABLE_COLUMNS: [(f32, usize); 4] = [(0.0, 28), (55.0, 22), (105.0, 14), (135.0, 26)];

#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("PDF rendering failed: {0}")]
    Render(String),
}

impl From<printpdf::Error> for PdfError {
    fn from(e: printpdf::Error) -> Self {
        PdfError::Render(e.to_string())
    }
}

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(Rgb::new(
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        None,
    ))
}

fn black() -> Color {
    Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None))
}

fn white() -> Color {
    Color::Rgb(Rgb::new(1.0, 1.0, 1.0, None))
}

fn gray() -> Color {
    Color::Rgb(Rgb::new(0.4, 0.4, 0.4, None))
}

fn clip(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}

/// Rough width of a Helvetica string in millimetres, good enough for
/// centering headings.
fn approx_width(text: &str, size_pt: f32) -> f32 {
    text.chars().count() as f32 * size_pt * 0.5 * 0.3528
}

//=========================================================================================
// Page Writer
//=========================================================================================

/// Tracks the current page and a cursor measured from the top edge, opening
/// new pages as the body overflows. Footers are stamped last, once the page
/// count is known.
struct PageWriter {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    bold: IndirectFontRef,
    pages: Vec<(PdfPageIndex, PdfLayerIndex)>,
    layer: PdfLayerReference,
    cursor: f32,
}

impl PageWriter {
    fn new(title: &str) -> Result<Self, PdfError> {
        let (doc, page, layer_index) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let font = doc.add_builtin_font(BuiltinFont::Helvetica)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;
        let layer = doc.get_page(page).get_layer(layer_index);
        Ok(Self {
            doc,
            font,
            bold,
            pages: vec![(page, layer_index)],
            layer,
            cursor: MARGIN,
        })
    }

    fn new_page(&mut self) {
        let (page, layer_index) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer_index);
        self.pages.push((page, layer_index));
        self.cursor = MARGIN;
    }

    /// Opens a new page if fewer than `needed` millimetres remain above the
    /// footer area.
    fn ensure_space(&mut self, needed: f32) {
        if self.cursor + needed > PAGE_HEIGHT - MARGIN - FOOTER_Y {
            self.new_page();
        }
    }

    fn text_at(&self, text: &str, size: f32, x: f32, bold: bool, color: Color) {
        let font = if bold { &self.bold } else { &self.font };
        self.layer.set_fill_color(color);
        self.layer
            .use_text(text, size, Mm(x), Mm(PAGE_HEIGHT - self.cursor), font);
    }

    fn line(&mut self, text: &str, size: f32, x: f32, bold: bool, color: Color) {
        self.text_at(text, size, x, bold, color);
        self.cursor += BODY_LINE;
    }

    fn centered(&mut self, text: &str, size: f32, bold: bool, color: Color) {
        let x = ((PAGE_WIDTH - approx_width(text, size)) / 2.0).max(MARGIN);
        self.line(text, size, x, bold, color);
    }

    /// Filled rectangle whose top edge sits at the current cursor.
    fn fill_band(&self, height: f32, color: Color) {
        let top = PAGE_HEIGHT - self.cursor;
        let rect = Rect::new(
            Mm(MARGIN),
            Mm(top - height),
            Mm(PAGE_WIDTH - MARGIN),
            Mm(top),
        )
        .with_mode(PaintMode::Fill);
        self.layer.set_fill_color(color);
        self.layer.add_rect(rect);
    }

    /// Places the logo near the top of the current page at `x`, scaled to
    /// roughly [`LOGO_WIDTH`] millimetres. A logo that fails to decode is
    /// skipped; the report still renders.
    fn place_logo(&self, bytes: &[u8], x: f32) {
        match printpdf::image_crate::load_from_memory(bytes) {
            Ok(decoded) => {
                let image = Image::from_dynamic_image(&decoded);
                let width_px = image.image.width.0.max(1) as f32;
                let width_mm = width_px / 300.0 * 25.4;
                let scale = LOGO_WIDTH / width_mm;
                image.add_to_layer(
                    self.layer.clone(),
                    ImageTransform {
                        translate_x: Some(Mm(x)),
                        translate_y: Some(Mm(PAGE_HEIGHT - MARGIN - LOGO_WIDTH)),
                        scale_x: Some(scale),
                        scale_y: Some(scale),
                        dpi: Some(300.0),
                        ..Default::default()
                    },
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "skipping undecodable logo");
            }
        }
    }

    /// Horizontal rule across the content area at the current cursor.
    fn rule(&mut self) {
        let y = PAGE_HEIGHT - self.cursor;
        let line = Line {
            points: vec![
                (Point::new(Mm(MARGIN), Mm(y)), false),
                (Point::new(Mm(PAGE_WIDTH - MARGIN), Mm(y)), false),
            ],
            is_closed: false,
        };
        self.layer.set_outline_color(gray());
        self.layer.set_outline_thickness(0.5);
        self.layer.add_line(line);
        self.cursor += 4.0;
    }

    /// Stamps `Page i of N` and the generation timestamp on every page, then
    /// serializes the document.
    fn finish(self, generated_at: DateTime<Utc>) -> Result<Vec<u8>, PdfError> {
        let total = self.pages.len();
        let stamp = format_timestamp(generated_at);
        for (i, (page, layer_index)) in self.pages.iter().enumerate() {
            let layer = self.doc.get_page(*page).get_layer(*layer_index);
            layer.set_fill_color(gray());
            let page_label = format!("Page {} of {}", i + 1, total);
            let center_x = (PAGE_WIDTH - approx_width(&page_label, 8.0)) / 2.0;
            layer.use_text(page_label, 8.0, Mm(center_x), Mm(FOOTER_Y), &self.font);
            let right = format!("Generated {}", stamp);
            let x = PAGE_WIDTH - MARGIN - approx_width(&right, 8.0);
            layer.use_text(right, 8.0, Mm(x), Mm(FOOTER_Y), &self.font);
        }
        Ok(self.doc.save_to_bytes()?)
    }
}

//=========================================================================================
// Renderers
//=========================================================================================

/// Renders an inspection report to PDF bytes.
pub fn render_inspection_report(
    report: &InspectionReport,
    logo: Option<&[u8]>,
    generated_at: DateTime<Utc>,
) -> Result<Vec<u8>, PdfError> {
    let mut writer = PageWriter::new(&report.filename)?;

    if let Some(cover) = &report.cover {
        if let Some(bytes) = logo {
            writer.place_logo(bytes, (PAGE_WIDTH - LOGO_WIDTH) / 2.0);
        }
        writer.cursor = 60.0;
        writer.centered(&cover.title, 24.0, true, rgb(BRAND_RED));
        writer.cursor += 4.0;
        writer.centered(&cover.subtitle, 12.0, false, gray());
        writer.cursor += 14.0;
        for (label, value) in &cover.details {
            writer.text_at(label, 11.0, 60.0, true, black());
            writer.line(value, 11.0, 95.0, false, black());
        }
        if !cover.notes.is_empty() {
            writer.cursor += 8.0;
            writer.line("Notes:", 11.0, 60.0, true, black());
            for note_line in &cover.notes {
                writer.line(note_line, 10.0, 60.0, false, black());
            }
        }
        // The detail table always starts on a fresh page.
        writer.new_page();
    }

    // Header block: logo in the left column, metadata in the right.
    if let Some(bytes) = logo {
        writer.place_logo(bytes, MARGIN);
    }

    writer.cursor = MARGIN + 10.0;
    for (i, header_line) in report.header.lines.iter().enumerate() {
        writer.line(
            header_line,
            if i == 0 { 12.0 } else { 10.0 },
            HEADER_TEXT_X,
            i == 0,
            black(),
        );
    }
    writer.cursor = writer.cursor.max(MARGIN + LOGO_WIDTH + 4.0);
    writer.rule();
    writer.cursor += 2.0;

    draw_table_header(&mut writer, &report.columns);
    for (i, row) in report.rows.iter().enumerate() {
        writer.ensure_space(BODY_LINE + 2.0);
        if writer.cursor == MARGIN {
            // Continuation page: repeat the column header.
            writer.cursor += 4.0;
            draw_table_header(&mut writer, &report.columns);
        }
        if i % 2 == 1 {
            writer.fill_band(BODY_LINE, rgb(ALT_ROW_FILL));
        }
        writer.cursor += 4.5;
        let cells = [&row.location, &row.equipment, &row.status, &row.notes];
        for ((offset, max_chars), cell) in TABLE_COLUMNS.iter().zip(cells) {
            writer.text_at(&clip(cell, *max_chars), 9.0, MARGIN + offset, false, black());
        }
        writer.cursor += BODY_LINE - 4.5;
    }

    writer.finish(generated_at)
}

fn draw_table_header(writer: &mut PageWriter, columns: &[String; 4]) {
    writer.fill_band(7.0, rgb(BRAND_RED));
    writer.cursor += 5.0;
    for ((offset, _), title) in TABLE_COLUMNS.iter().zip(columns) {
        writer.text_at(title, 10.0, MARGIN + offset, true, white());
    }
    writer.cursor += 3.0;
}

/// Renders a contract renewal notice to PDF bytes.
pub fn render_renewal_notice(
    notice: &RenewalNotice,
    logo: Option<&[u8]>,
    generated_at: DateTime<Utc>,
) -> Result<Vec<u8>, PdfError> {
    let mut writer = PageWriter::new(&notice.filename)?;

    if let Some(bytes) = logo {
        writer.place_logo(bytes, PAGE_WIDTH - MARGIN - LOGO_WIDTH);
    }

    writer.cursor = 40.0;
    writer.centered(&notice.title, 20.0, true, rgb(BRAND_RED));
    writer.cursor += 6.0;
    writer.centered(&notice.heading, 14.0, true, black());
    writer.centered(&notice.month_label, 11.0, false, gray());
    writer.cursor += 10.0;

    for (label, value) in &notice.details {
        writer.ensure_space(BODY_LINE);
        writer.text_at(label, 11.0, MARGIN, true, black());
        writer.line(value, 11.0, MARGIN + 45.0, false, black());
    }

    if !notice.notes.is_empty() {
        writer.cursor += 8.0;
        writer.line("Notes:", 11.0, MARGIN, true, black());
        for note_line in &notice.notes {
            writer.ensure_space(BODY_LINE);
            writer.line(note_line, 10.0, MARGIN, false, black());
        }
    }

    writer.finish(generated_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use firesafe_core::report::{CoverPage, HeaderBlock, TableRow};

    fn sample_report(cover: bool, rows: usize) -> InspectionReport {
        InspectionReport {
            filename: "inspection-2026-03-15-acme.pdf".to_string(),
            cover: cover.then(|| CoverPage {
                title: "Jac's Fire Protection".to_string(),
                subtitle: "Professional Fire Safety Management".to_string(),
                details: vec![("Client:".to_string(), "Acme".to_string())],
                notes: vec!["All clear".to_string()],
            }),
            header: HeaderBlock {
                lines: vec![
                    "Client Information:".to_string(),
                    "Name: Acme".to_string(),
                ],
            },
            columns: [
                "Location".to_string(),
                "Equipment Type".to_string(),
                "Status".to_string(),
                "Notes".to_string(),
            ],
            rows: (0..rows)
                .map(|i| TableRow {
                    location: format!("1 Room {}", i),
                    equipment: "5ABC".to_string(),
                    status: "PASS".to_string(),
                    notes: String::new(),
                })
                .collect(),
        }
    }

    #[test]
    fn renders_pdf_bytes() {
        let bytes =
            render_inspection_report(&sample_report(false, 3), None, Utc::now()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn cover_page_adds_a_page() {
        let now = Utc::now();
        let without = render_inspection_report(&sample_report(false, 3), None, now).unwrap();
        let with = render_inspection_report(&sample_report(true, 3), None, now).unwrap();
        assert!(with.len() > without.len());
    }

    #[test]
    fn long_tables_paginate() {
        let bytes =
            render_inspection_report(&sample_report(false, 120), None, Utc::now()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    fn tiny_png() -> Vec<u8> {
        use printpdf::image_crate::{DynamicImage, ImageOutputFormat, RgbImage};
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(2, 2))
            .write_to(&mut std::io::Cursor::new(&mut buf), ImageOutputFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn logo_is_embedded_on_cover_and_header_pages() {
        let now = Utc::now();
        let logo = tiny_png();
        let without = render_inspection_report(&sample_report(true, 2), None, now).unwrap();
        let with =
            render_inspection_report(&sample_report(true, 2), Some(&logo), now).unwrap();
        assert!(with.starts_with(b"%PDF"));
        assert!(with.len() > without.len());
    }

    #[test]
    fn undecodable_logo_is_tolerated() {
        let bytes = render_inspection_report(
            &sample_report(false, 1),
            Some(b"not an image"),
            Utc::now(),
        )
        .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn renders_renewal_notice() {
        let notice = RenewalNotice {
            filename: "renewal-2026-09-acme.pdf".to_string(),
            title: "Jac's Fire Protection".to_string(),
            heading: "Contract Renewal Notice".to_string(),
            month_label: "September 2026".to_string(),
            details: vec![("Client:".to_string(), "Acme".to_string())],
            notes: vec![],
        };
        let bytes = render_renewal_notice(&notice, None, Utc::now()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
