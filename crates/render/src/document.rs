//! PDF object graph assembly.
//!
//! One page, one background image XObject, and one embedded Type0 font per
//! distinct resolved font. Object numbering follows insertion order, which is
//! fixed by the page plan, so identical inputs serialize to identical bytes.

use crate::background::{DecodedBackground, deflate};
use crate::compositor::PagePlan;
use crate::error::RenderError;
use crate::fonts::{FontHandle, FontKey, FontOutlines};
use crate::page::PageContext;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

const BACKGROUND_NAME: &str = "Im1";

/// Glyphs a document uses from one font, with the text each glyph starts.
struct FontUsage {
    resource_name: String,
    font: Arc<FontHandle>,
    glyphs: BTreeMap<u16, String>,
}

pub(crate) struct DocumentAssembler {
    document: Document,
    pages_id: ObjectId,
}

impl DocumentAssembler {
    pub(crate) fn new(pdf_version: &str) -> Self {
        let mut document = Document::with_version(pdf_version);
        let pages_id = document.new_object_id();
        Self { document, pages_id }
    }

    /// Builds the page for `plan` over `background` and serializes the document.
    pub(crate) fn assemble(
        mut self,
        plan: &PagePlan,
        background: &DecodedBackground,
    ) -> Result<Vec<u8>, RenderError> {
        let (page_width, page_height) = plan.page.dimensions_pt();

        let image_id = self.add_image(background)?;

        let usages = collect_font_usage(plan);
        let mut font_dict = Dictionary::new();
        for usage in &usages {
            let font_id = self.embed_font(usage)?;
            font_dict.set(usage.resource_name.as_bytes().to_vec(), font_id);
        }

        let mut page = PageContext::new(page_width, page_height);
        page.draw_background(BACKGROUND_NAME);
        for field in &plan.fields {
            let resource = usages
                .iter()
                .find(|u| u.font.key() == field.font.key())
                .map(|u| u.resource_name.as_str())
                .ok_or_else(|| {
                    RenderError::Pdf(format!("no font resource for field '{}'", field.role))
                })?;
            page.draw_field(resource, field);
        }

        let content = page.finish().encode()?;
        let compressed = deflate(&content).map_err(|e| RenderError::Pdf(e.to_string()))?;
        let content_id = self
            .document
            .add_object(Stream::new(dictionary! { "Filter" => "FlateDecode" }, compressed));

        let resources = dictionary! {
            "Font" => font_dict,
            "XObject" => dictionary! { BACKGROUND_NAME => image_id },
        };
        let page_id = self.document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), page_width.into(), page_height.into()],
            "Contents" => content_id,
            "Resources" => resources,
        });

        self.document.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = self
            .document
            .add_object(dictionary! { "Type" => "Catalog", "Pages" => self.pages_id });
        self.document.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        self.document
            .save_to(&mut bytes)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        Ok(bytes)
    }

    fn add_image(&mut self, background: &DecodedBackground) -> Result<ObjectId, RenderError> {
        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => background.width as i64,
            "Height" => background.height as i64,
            "ColorSpace" => background.color_space,
            "BitsPerComponent" => 8,
            "Filter" => background.filter,
        };

        if let Some(alpha) = &background.smask {
            let mask = dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => background.width as i64,
                "Height" => background.height as i64,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            };
            let mask_id = self.document.add_object(Stream::new(mask, alpha.clone()));
            dict.set("SMask", mask_id);
        }

        log::debug!(
            "Embedding {}x{} background ({}, {}, {} bytes)",
            background.width,
            background.height,
            background.color_space,
            background.filter,
            background.data.len()
        );
        Ok(self.document.add_object(Stream::new(dict, background.data.clone())))
    }

    /// Embeds a font as Type0 with Identity-H encoding.
    ///
    /// TrueType outlines become a CIDFontType2 over `FontFile2`. CFF outlines
    /// become a CIDFontType0 over a `FontFile3` OpenType program, where CIDs
    /// are glyph indices.
    fn embed_font(&mut self, usage: &FontUsage) -> Result<ObjectId, RenderError> {
        let font = &usage.font;
        let metrics = font.metrics();
        let scale = 1000.0 / metrics.units_per_em as f32;
        let to_pdf = |v: i16| (v as f32 * scale).round() as i64;
        let base_font = Object::Name(font.postscript_name().as_bytes().to_vec());

        let compressed = deflate(font.data()).map_err(|e| RenderError::Pdf(e.to_string()))?;
        let (file_key, file_dict, cid_subtype) = match font.outlines() {
            FontOutlines::TrueType => (
                "FontFile2",
                dictionary! {
                    "Length1" => font.data().len() as i64,
                    "Filter" => "FlateDecode",
                },
                "CIDFontType2",
            ),
            FontOutlines::Cff => (
                "FontFile3",
                dictionary! {
                    "Subtype" => "OpenType",
                    "Filter" => "FlateDecode",
                },
                "CIDFontType0",
            ),
        };
        let file_id = self.document.add_object(Stream::new(file_dict, compressed));

        let bbox: Vec<Object> = metrics.bbox.iter().map(|v| Object::Integer(to_pdf(*v))).collect();
        let mut descriptor = dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => base_font.clone(),
            "Flags" => 4,
            "FontBBox" => bbox,
            "ItalicAngle" => metrics.italic_angle,
            "Ascent" => to_pdf(metrics.ascender),
            "Descent" => to_pdf(metrics.descender),
            "CapHeight" => to_pdf(metrics.cap_height),
            "StemV" => 80,
        };
        descriptor.set(file_key, file_id);
        let descriptor_id = self.document.add_object(descriptor);

        let widths = width_array(usage, scale);
        let mut cid_font = dictionary! {
            "Type" => "Font",
            "Subtype" => cid_subtype,
            "BaseFont" => base_font.clone(),
            "CIDSystemInfo" => dictionary! {
                "Registry" => Object::string_literal("Adobe"),
                "Ordering" => Object::string_literal("Identity"),
                "Supplement" => 0,
            },
            "FontDescriptor" => descriptor_id,
            "DW" => 1000,
            "W" => widths,
        };
        if font.outlines() == FontOutlines::TrueType {
            cid_font.set("CIDToGIDMap", "Identity");
        }
        let cid_font_id = self.document.add_object(cid_font);

        let cmap = to_unicode_cmap(&usage.glyphs);
        let cmap_id = self.document.add_object(Stream::new(Dictionary::new(), cmap.into_bytes()));

        log::debug!(
            "Embedding font '{}' as /{} ({} glyphs used)",
            font.family(),
            usage.resource_name,
            usage.glyphs.len()
        );
        Ok(self.document.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => base_font,
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![cid_font_id.into()],
            "ToUnicode" => cmap_id,
        }))
    }
}

/// Groups fonts in first-use order and names them `F1`, `F2`, ...
fn collect_font_usage(plan: &PagePlan) -> Vec<FontUsage> {
    let mut usages: Vec<FontUsage> = Vec::new();
    let mut index: BTreeMap<FontKey, usize> = BTreeMap::new();

    for field in &plan.fields {
        let slot = *index.entry(field.font.key().clone()).or_insert_with(|| {
            usages.push(FontUsage {
                resource_name: format!("F{}", usages.len() + 1),
                font: field.font.clone(),
                glyphs: BTreeMap::new(),
            });
            usages.len() - 1
        });
        let usage = &mut usages[slot];
        for glyph in &field.glyphs {
            let text = usage.glyphs.entry(glyph.glyph_id).or_default();
            if text.is_empty() {
                text.push_str(&glyph.text);
            }
        }
    }
    usages
}

/// `/W` entries: each run of consecutive glyph ids becomes `start [w1 w2 ...]`.
fn width_array(usage: &FontUsage, scale: f32) -> Vec<Object> {
    let mut entries = Vec::new();
    let mut run_start: Option<u16> = None;
    let mut run: Vec<Object> = Vec::new();
    let mut previous: Option<u16> = None;

    for &gid in usage.glyphs.keys() {
        let contiguous = previous.is_some_and(|p| p.checked_add(1) == Some(gid));
        if !contiguous {
            if let Some(start) = run_start.take() {
                entries.push(Object::Integer(start as i64));
                entries.push(Object::Array(std::mem::take(&mut run)));
            }
            run_start = Some(gid);
        }
        let width = (usage.font.nominal_advance(gid) as f32 * scale).round() as i64;
        run.push(Object::Integer(width));
        previous = Some(gid);
    }
    if let Some(start) = run_start {
        entries.push(Object::Integer(start as i64));
        entries.push(Object::Array(run));
    }
    entries
}

/// A ToUnicode CMap mapping each used glyph id to the text it starts.
fn to_unicode_cmap(glyphs: &BTreeMap<u16, String>) -> String {
    let mapped: Vec<(u16, &str)> = glyphs
        .iter()
        .filter(|(_, text)| !text.is_empty())
        .map(|(gid, text)| (*gid, text.as_str()))
        .collect();

    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n\
         <0000> <FFFF>\n\
         endcodespacerange\n",
    );

    // bfchar sections are limited to 100 entries each.
    for chunk in mapped.chunks(100) {
        let _ = writeln!(cmap, "{} beginbfchar", chunk.len());
        for (gid, text) in chunk {
            let utf16: String =
                text.encode_utf16().map(|unit| format!("{:04X}", unit)).collect();
            let _ = writeln!(cmap, "<{:04X}> <{}>", gid, utf16);
        }
        cmap.push_str("endbfchar\n");
    }

    cmap.push_str(
        "endcmap\n\
         CMapName currentdict /CMap defineresource pop\n\
         end\n\
         end\n",
    );
    cmap
}
