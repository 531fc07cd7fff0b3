use crate::background::{decode_background, load_background_bytes};
use crate::document::DocumentAssembler;
use crate::error::RenderError;
use crate::fonts::{FontHandle, FontResolver, ShapedGlyph};
use hamcert_traits::AssetProvider;
use hamcert_types::{
    FieldValues, MM_TO_PT, PageGeometry, Rect, Rgb, Role, TemplateDescriptor, TextAlign,
    TextPosition,
};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

const DEFAULT_PDF_VERSION: &str = "1.7";

/// A descriptor plus the display strings for one recipient.
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    pub descriptor: &'a TemplateDescriptor,
    pub values: &'a FieldValues,
}

impl<'a> RenderRequest<'a> {
    pub fn new(descriptor: &'a TemplateDescriptor, values: &'a FieldValues) -> Self {
        Self { descriptor, values }
    }
}

/// A finished single-page document.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub page: PageGeometry,
}

impl RenderedDocument {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// A field after font resolution and shaping, positioned on the page.
#[derive(Debug, Clone)]
pub struct PlacedField {
    pub role: Role,
    pub text: String,
    pub font: Arc<FontHandle>,
    pub font_size: f32,
    pub color: Rgb,
    pub align: TextAlign,
    pub anchor: TextPosition,
    /// Text box in millimetres, top-left origin.
    pub bounds: Rect,
    /// Baseline distance from the top of the page, in millimetres.
    pub baseline_mm: f32,
    pub glyphs: Vec<ShapedGlyph>,
}

/// The laid-out page, fields in draw order.
#[derive(Debug, Clone)]
pub struct PagePlan {
    pub page: PageGeometry,
    pub fields: Vec<PlacedField>,
}

impl PagePlan {
    pub fn field(&self, role: &Role) -> Option<&PlacedField> {
        self.fields.iter().find(|f| &f.role == role)
    }
}

/// Renders template descriptors into PDF documents.
///
/// A `Compositor` holds only immutable configuration and can be shared across
/// threads; every call builds its own font cache and document.
#[derive(Debug, Clone)]
pub struct Compositor {
    assets: Arc<dyn AssetProvider>,
    page: PageGeometry,
    pdf_version: String,
}

impl Compositor {
    pub fn new(assets: Arc<dyn AssetProvider>, page: PageGeometry) -> Self {
        Self { assets, page, pdf_version: DEFAULT_PDF_VERSION.to_string() }
    }

    pub fn with_page(mut self, page: PageGeometry) -> Self {
        self.page = page;
        self
    }

    pub fn with_pdf_version(mut self, version: impl Into<String>) -> Self {
        self.pdf_version = version.into();
        self
    }

    pub fn page(&self) -> PageGeometry {
        self.page
    }

    pub fn assets(&self) -> &Arc<dyn AssetProvider> {
        &self.assets
    }

    /// Resolves fonts and positions every populated field without producing a document.
    pub fn layout(
        &self,
        descriptor: &TemplateDescriptor,
        values: &FieldValues,
    ) -> Result<PagePlan, RenderError> {
        let mut fonts = FontResolver::new(self.assets.as_ref());
        self.layout_with(&mut fonts, descriptor, values)
    }

    fn layout_with(
        &self,
        fonts: &mut FontResolver<'_>,
        descriptor: &TemplateDescriptor,
        values: &FieldValues,
    ) -> Result<PagePlan, RenderError> {
        // Every requested role needs a style before anything is loaded.
        if let Some(role) = values.roles().find(|role| descriptor.field(role).is_none()) {
            return Err(RenderError::MissingFieldStyle {
                role: role.clone(),
                template: descriptor.name.clone(),
            });
        }

        let mut fields = Vec::with_capacity(values.len());
        for (role, style) in &descriptor.fields {
            let Some(text) = values.get(role) else {
                log::debug!("No value for '{}' in template '{}'; skipping", role, descriptor.name);
                continue;
            };
            if text.trim().is_empty() {
                log::debug!("Value for '{}' is blank; nothing to draw", role);
                continue;
            }
            if !(style.font_size.is_finite() && style.font_size > 0.0) {
                return Err(RenderError::InvalidFieldStyle {
                    role: role.clone(),
                    reason: format!("font size {} must be a positive number", style.font_size),
                });
            }

            let font = fonts.resolve(&style.font_family, &style.font_dir)?;
            let shaped = font.shape(text)?;

            let scale = font.scale(style.font_size);
            let width_mm = shaped.advance as f32 * scale / MM_TO_PT;
            let height_mm = font.line_height_pt(style.font_size) / MM_TO_PT;
            let x = match style.align {
                TextAlign::Left => style.position.x,
                TextAlign::Center => style.position.x - width_mm / 2.0,
                TextAlign::Right => style.position.x - width_mm,
            };
            let top = style.position.y;

            fields.push(PlacedField {
                role: role.clone(),
                text: text.to_string(),
                font_size: style.font_size,
                color: style.color,
                align: style.align,
                anchor: style.position,
                bounds: Rect::new(x, top, width_mm, height_mm),
                baseline_mm: top + font.ascent_pt(style.font_size) / MM_TO_PT,
                glyphs: shaped.glyphs,
                font,
            });
        }

        Ok(PagePlan { page: self.page, fields })
    }

    /// Composes the whole document in memory.
    pub fn compose(&self, request: RenderRequest<'_>) -> Result<RenderedDocument, RenderError> {
        let RenderRequest { descriptor, values } = request;

        let mut fonts = FontResolver::new(self.assets.as_ref());
        let plan = self.layout_with(&mut fonts, descriptor, values)?;

        let raw = load_background_bytes(&descriptor.background, self.assets.as_ref())?;
        let background = decode_background(&raw, descriptor.background.format)?;

        let bytes = DocumentAssembler::new(&self.pdf_version).assemble(&plan, &background)?;
        log::info!(
            "Rendered template '{}': {} field(s), {} font(s), {} bytes",
            descriptor.name,
            plan.fields.len(),
            fonts.loaded(),
            bytes.len()
        );
        Ok(RenderedDocument { bytes, page: self.page })
    }

    /// Renders into `sink`. Nothing is written unless composition succeeds.
    pub fn render<W: Write>(
        &self,
        descriptor: &TemplateDescriptor,
        values: &FieldValues,
        sink: &mut W,
    ) -> Result<(), RenderError> {
        self.render_labeled(descriptor, values, sink, "stream")
    }

    /// Like [`render`](Self::render), naming the sink `label` in write errors.
    pub fn render_labeled<W: Write>(
        &self,
        descriptor: &TemplateDescriptor,
        values: &FieldValues,
        sink: &mut W,
        label: &str,
    ) -> Result<(), RenderError> {
        let document = self.compose(RenderRequest::new(descriptor, values))?;
        write_all(sink, &document.bytes, label)
    }

    pub fn render_to_vec(
        &self,
        descriptor: &TemplateDescriptor,
        values: &FieldValues,
    ) -> Result<Vec<u8>, RenderError> {
        let mut buffer = Vec::new();
        self.render_labeled(descriptor, values, &mut buffer, "memory")?;
        Ok(buffer)
    }

    /// Writes the document to `path`. The file is only created once the
    /// document is complete, and is removed again if writing fails.
    pub fn render_to_file<P: AsRef<Path>>(
        &self,
        descriptor: &TemplateDescriptor,
        values: &FieldValues,
        path: P,
    ) -> Result<(), RenderError> {
        let path = path.as_ref();
        let label = format!("file:{}", path.display());
        let document = self.compose(RenderRequest::new(descriptor, values))?;

        let mut file = File::create(path)
            .map_err(|source| RenderError::OutputWrite { sink: label.clone(), source })?;
        let written = write_all(&mut file, &document.bytes, &label).and_then(|_| {
            file.sync_all()
                .map_err(|source| RenderError::OutputWrite { sink: label.clone(), source })
        });
        drop(file);

        if written.is_err() {
            if let Err(e) = fs::remove_file(path) {
                log::warn!("Could not remove incomplete output {}: {}", path.display(), e);
            }
        }
        written
    }
}

fn write_all<W: Write>(sink: &mut W, bytes: &[u8], label: &str) -> Result<(), RenderError> {
    sink.write_all(bytes)
        .and_then(|_| sink.flush())
        .map_err(|source| RenderError::OutputWrite { sink: label.to_string(), source })
}
