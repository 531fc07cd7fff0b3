//! Content stream generation for the single certificate page.

use crate::compositor::PlacedField;
use hamcert_types::{MM_TO_PT, Rgb};
use lopdf::content::{Content, Operation};
use lopdf::{Object, StringFormat};

/// Builds the page's operator list: background first, then fields in order.
pub(crate) struct PageContext {
    page_width: f32,
    page_height: f32,
    content: Content,
    state: PageRenderState,
}

#[derive(Default)]
struct PageRenderState {
    font_name: String,
    font_size: f32,
    fill_color: Option<Rgb>,
}

impl PageContext {
    /// `page_width` and `page_height` are in points.
    pub(crate) fn new(page_width: f32, page_height: f32) -> Self {
        Self {
            page_width,
            page_height,
            content: Content { operations: vec![] },
            state: PageRenderState::default(),
        }
    }

    pub(crate) fn finish(self) -> Content {
        self.content
    }

    fn push(&mut self, operator: &str, operands: Vec<Object>) {
        self.content.operations.push(Operation::new(operator, operands));
    }

    /// Paints the image XObject `name` stretched over the whole page.
    pub(crate) fn draw_background(&mut self, name: &str) {
        self.push("q", vec![]);
        self.push(
            "cm",
            vec![
                self.page_width.into(),
                0.into(),
                0.into(),
                self.page_height.into(),
                0.into(),
                0.into(),
            ],
        );
        self.push("Do", vec![Object::Name(name.as_bytes().to_vec())]);
        self.push("Q", vec![]);
    }

    fn set_font(&mut self, font_name: &str, size: f32) {
        if self.state.font_name != font_name || self.state.font_size != size {
            self.push("Tf", vec![Object::Name(font_name.as_bytes().to_vec()), size.into()]);
            self.state.font_name = font_name.to_string();
            self.state.font_size = size;
        }
    }

    fn set_fill_color(&mut self, color: Rgb) {
        if self.state.fill_color != Some(color) {
            let [r, g, b] = color.to_unit();
            self.push("rg", vec![r.into(), g.into(), b.into()]);
            self.state.fill_color = Some(color);
        }
    }

    /// Draws one laid-out field using the font resource `font_name`.
    pub(crate) fn draw_field(&mut self, font_name: &str, field: &PlacedField) {
        if field.glyphs.is_empty() {
            return;
        }

        let x = field.bounds.x * MM_TO_PT;
        let y = self.page_height - field.baseline_mm * MM_TO_PT;

        self.push("BT", vec![]);
        self.set_font(font_name, field.font_size);
        self.set_fill_color(field.color);
        self.push("Td", vec![x.into(), y.into()]);
        let runs = glyph_runs(field);
        self.push("TJ", vec![Object::Array(runs)]);
        self.push("ET", vec![]);
    }
}

/// Splits shaped glyphs into hex-encoded runs separated by kerning offsets.
fn glyph_runs(field: &PlacedField) -> Vec<Object> {
    let units_per_em = field.font.metrics().units_per_em as f32;
    let mut runs = Vec::new();
    let mut current: Vec<u8> = Vec::new();

    for glyph in &field.glyphs {
        current.extend_from_slice(&glyph.glyph_id.to_be_bytes());
        let adjust = glyph.advance - glyph.nominal_advance;
        if adjust != 0 {
            runs.push(Object::String(std::mem::take(&mut current), StringFormat::Hexadecimal));
            // TJ offsets are in thousandths of text space and move left when positive.
            let offset = -(adjust as f32) * 1000.0 / units_per_em;
            runs.push(offset.into());
        }
    }
    if !current.is_empty() {
        runs.push(Object::String(current, StringFormat::Hexadecimal));
    }
    runs
}
