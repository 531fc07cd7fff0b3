#![allow(dead_code)]

pub mod fixtures;
pub mod pdf_assertions;

use lopdf::Document as LopdfDocument;
use pdf_assertions::{EmbeddedFont, TextRun};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Wrapper around a generated PDF with helper methods
pub struct GeneratedPdf {
    pub bytes: Vec<u8>,
    pub doc: LopdfDocument,
}

impl GeneratedPdf {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, Box<dyn std::error::Error>> {
        let doc = LopdfDocument::load_mem(&bytes)?;
        Ok(Self { bytes, doc })
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// MediaBox width and height of the first page, in points.
    pub fn page_size(&self) -> (f32, f32) {
        pdf_assertions::page_size(&self.doc)
    }

    /// Operators of the first page's content stream, in order.
    pub fn operators(&self) -> Vec<String> {
        pdf_assertions::page_operations(&self.doc)
            .into_iter()
            .map(|op| op.operator)
            .collect()
    }

    /// Every text show operation, decoded through the fonts' ToUnicode maps.
    pub fn text_runs(&self) -> Vec<TextRun> {
        pdf_assertions::text_runs(&self.doc)
    }

    pub fn texts(&self) -> Vec<String> {
        self.text_runs().into_iter().map(|run| run.text).collect()
    }

    pub fn font_names(&self) -> Vec<String> {
        pdf_assertions::extract_font_names(&self.doc)
    }

    pub fn embedded_fonts(&self) -> Vec<EmbeddedFont> {
        pdf_assertions::embedded_fonts(&self.doc)
    }

    /// Save PDF to a file for manual debugging
    pub fn save_for_debug(&self, name: &str) -> std::io::Result<()> {
        std::fs::write(format!("test_output_{}.pdf", name), &self.bytes)
    }
}
