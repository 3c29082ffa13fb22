//! Landscape A4 table layout for a compiled [`ReportDocument`].

use crate::error::{ReportError, ReportResult};
use crate::report::{ReportDocument, Section};
use log::debug;
use printpdf::*;
use std::io::BufWriter;

const PAGE_WIDTH: f32 = 297.0;
const PAGE_HEIGHT: f32 = 210.0;
const MARGIN: f32 = 14.0;
const ROW_HEIGHT: f32 = 6.0;
const CELL_FONT_SIZE: f32 = 9.0;
// Average Helvetica glyph width at 9pt, in mm.
const CHAR_WIDTH: f32 = 1.7;

struct PageCursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
    pages: usize,
}

impl<'a> PageCursor<'a> {
    fn new(doc: &'a PdfDocumentReference, page: PdfPageIndex, layer: PdfLayerIndex) -> Self {
        Self {
            doc,
            layer: doc.get_page(page).get_layer(layer),
            y: PAGE_HEIGHT - MARGIN,
            pages: 1,
        }
    }
    
    /// Starts a new page when `height` no longer fits. Returns true if it did.
    fn reserve(&mut self, height: f32) -> bool {
        if self.y - height >= MARGIN {
            return false;
        }
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - MARGIN;
        self.pages += 1;
        true
    }
    
    fn text(&self, text: &str, size: f32, x: f32, font: &IndirectFontRef) {
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
    }
}

fn fit_cell(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut fitted: String = text.chars().take(keep).collect();
    fitted.push_str("...");
    fitted
}

fn draw_row(cursor: &PageCursor, cells: &[String], column_width: f32, font: &IndirectFontRef) {
    let max_chars = ((column_width - 2.0) / CHAR_WIDTH).max(4.0) as usize;
    for (i, cell) in cells.iter().enumerate() {
        let x = MARGIN + i as f32 * column_width;
        cursor.text(&fit_cell(cell, max_chars), CELL_FONT_SIZE, x, font);
    }
}

fn draw_section(cursor: &mut PageCursor, section: &Section, font: &IndirectFontRef, bold: &IndirectFontRef) {
    let columns = section.header.len().max(1);
    let column_width = (PAGE_WIDTH - 2.0 * MARGIN) / columns as f32;
    
    // title, header and at least one row stay together
    cursor.reserve(10.0 + 2.0 * ROW_HEIGHT);
    cursor.text(&section.title, 14.0, MARGIN, bold);
    cursor.y -= 10.0;
    
    draw_row(cursor, &section.header, column_width, bold);
    cursor.y -= ROW_HEIGHT;
    
    for row in &section.rows {
        if cursor.reserve(ROW_HEIGHT) {
            draw_row(cursor, &section.header, column_width, bold);
            cursor.y -= ROW_HEIGHT;
        }
        draw_row(cursor, row, column_width, font);
        cursor.y -= ROW_HEIGHT;
    }
    
    cursor.y -= 8.0;
}

pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub pages: usize,
}

pub fn render_pdf(document: &ReportDocument) -> ReportResult<RenderedPdf> {
    let (doc, page1, layer1) =
        PdfDocument::new(&document.title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ReportError::Pdf(format!("font error: {e}")))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ReportError::Pdf(format!("font error: {e}")))?;
    
    let pages = {
        let mut cursor = PageCursor::new(&doc, page1, layer1);
        
        cursor.text(&document.title, 20.0, MARGIN, &bold);
        cursor.y -= 8.0;
        let generated = format!("Generated on: {}", document.generated_at.format("%Y-%m-%d %H:%M:%S"));
        cursor.text(&generated, 11.0, MARGIN, &font);
        cursor.y -= 14.0;
        
        for section in &document.sections {
            draw_section(&mut cursor, section, &font, &bold);
        }
        cursor.pages
    };
    debug!("Laid out {} sections on {} pages", document.sections.len(), pages);
    
    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| ReportError::Pdf(format!("save error: {e}")))?;
    let bytes = buf
        .into_inner()
        .map_err(|e| ReportError::Pdf(format!("buffer error: {e}")))?;
    Ok(RenderedPdf { bytes, pages })
}
