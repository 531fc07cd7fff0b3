//! Font resolution and text shaping.
//!
//! A [`FontResolver`] maps a field's `(font_dir, font_name)` pair to a parsed
//! [`FontHandle`]. Each resolver lives for a single render call, so two
//! templates that reuse a family name from different directories never see
//! each other's fonts, and concurrent renders share no font state.

use crate::error::RenderError;
use hamcert_traits::{AssetProvider, SharedAssetData, font_asset_paths};
use rustybuzz::{Feature, UnicodeBuffer};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};
use ttf_parser::{GlyphId, Tag};

thread_local! {
    static SCRATCH_BUFFER: RefCell<Option<UnicodeBuffer>> =
        RefCell::new(Some(UnicodeBuffer::new()));
}

fn shaping_features() -> &'static [Feature] {
    static FEATURES: OnceLock<Vec<Feature>> = OnceLock::new();
    FEATURES.get_or_init(|| {
        vec![
            Feature::new(Tag::from_bytes(b"liga"), 1, ..),
            Feature::new(Tag::from_bytes(b"kern"), 1, ..),
        ]
    })
}

/// Identity of a font asset: the directory it lives in plus its family name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FontKey {
    pub asset_dir: String,
    pub family: String,
}

impl FontKey {
    pub fn new(family: impl Into<String>, asset_dir: impl Into<String>) -> Self {
        Self { asset_dir: asset_dir.into(), family: family.into() }
    }
}

/// Face-level metrics, in font units.
#[derive(Debug, Clone, Copy)]
pub struct FontMetrics {
    pub units_per_em: u16,
    pub ascender: i16,
    pub descender: i16,
    pub cap_height: i16,
    pub italic_angle: f32,
    pub bbox: [i16; 4],
}

/// Outline format of a font program, which decides how it is embedded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontOutlines {
    /// `glyf` outlines, embedded as a TrueType program.
    TrueType,
    /// `CFF ` outlines, embedded as a whole OpenType program.
    Cff,
}

impl FontOutlines {
    fn detect(face: &ttf_parser::Face<'_>) -> Option<Self> {
        let raw = face.raw_face();
        if raw.table(Tag::from_bytes(b"glyf")).is_some() {
            Some(FontOutlines::TrueType)
        } else if raw.table(Tag::from_bytes(b"CFF ")).is_some() {
            Some(FontOutlines::Cff)
        } else {
            None
        }
    }
}

/// A loaded, validated font ready for shaping and embedding.
pub struct FontHandle {
    key: FontKey,
    source_path: String,
    postscript_name: String,
    metrics: FontMetrics,
    outlines: FontOutlines,
    data: SharedAssetData,
}

impl std::fmt::Debug for FontHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontHandle")
            .field("key", &self.key)
            .field("source_path", &self.source_path)
            .field("postscript_name", &self.postscript_name)
            .field("outlines", &self.outlines)
            .field("data_len", &self.data.len())
            .finish()
    }
}

impl FontHandle {
    /// Parses `data` and captures the metrics needed for layout and embedding.
    pub fn parse(
        key: FontKey,
        source_path: String,
        data: SharedAssetData,
    ) -> Result<Self, RenderError> {
        let face = ttf_parser::Face::parse(&data, 0).map_err(|e| {
            let reason = format!("{} is not a usable font: {}", source_path, e);
            RenderError::font(&key.family, &key.asset_dir, reason)
        })?;
        let outlines = FontOutlines::detect(&face).ok_or_else(|| {
            let reason = format!("{} has neither TrueType nor CFF outlines", source_path);
            RenderError::font(&key.family, &key.asset_dir, reason)
        })?;

        let units_per_em = face.units_per_em();
        let ascender = face.ascender();
        let descender = face.descender();
        let bbox = face.global_bounding_box();
        let metrics = FontMetrics {
            units_per_em,
            ascender,
            descender,
            cap_height: face.capital_height().unwrap_or(ascender),
            italic_angle: face.italic_angle(),
            bbox: [bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max],
        };

        let postscript_name = face
            .names()
            .into_iter()
            .filter(|name| name.name_id == ttf_parser::name_id::POST_SCRIPT_NAME)
            .find_map(|name| name.to_string())
            .map(|name| pdf_safe_name(&name))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| pdf_safe_name(&key.family));

        if rustybuzz::Face::from_slice(&data, 0).is_none() {
            return Err(RenderError::font(&key.family, &key.asset_dir, "font cannot be shaped"));
        }

        Ok(Self { key, source_path, postscript_name, metrics, outlines, data })
    }

    pub fn key(&self) -> &FontKey {
        &self.key
    }

    pub fn family(&self) -> &str {
        &self.key.family
    }

    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    pub fn postscript_name(&self) -> &str {
        &self.postscript_name
    }

    pub fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }

    pub fn outlines(&self) -> FontOutlines {
        self.outlines
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Creates a lightweight shaping view over the font data.
    fn as_face(&self) -> Option<rustybuzz::Face<'_>> {
        rustybuzz::Face::from_slice(&self.data, 0)
    }

    /// Scale factor from font units to points at `size`.
    pub fn scale(&self, size: f32) -> f32 {
        size / self.metrics.units_per_em as f32
    }

    /// Distance from the top of the line box to the baseline, in points.
    pub fn ascent_pt(&self, size: f32) -> f32 {
        self.metrics.ascender as f32 * self.scale(size)
    }

    /// Height of the line box (ascender to descender), in points.
    pub fn line_height_pt(&self, size: f32) -> f32 {
        (self.metrics.ascender as f32 - self.metrics.descender as f32) * self.scale(size)
    }

    /// Advance width of a glyph from the `hmtx` table, in font units.
    pub fn nominal_advance(&self, glyph_id: u16) -> i32 {
        self.as_face()
            .and_then(|face| face.glyph_hor_advance(GlyphId(glyph_id)))
            .map(i32::from)
            .unwrap_or(0)
    }

    /// Shapes `text` with kerning and standard ligatures.
    pub fn shape(&self, text: &str) -> Result<ShapedText, RenderError> {
        let face = self.as_face().ok_or_else(|| {
            RenderError::font(&self.key.family, &self.key.asset_dir, "font cannot be shaped")
        })?;

        let mut buffer =
            SCRATCH_BUFFER.with(|b| b.borrow_mut().take().unwrap_or_else(UnicodeBuffer::new));
        buffer.push_str(text);
        buffer.guess_segment_properties();

        let glyph_buffer = rustybuzz::shape(&face, shaping_features(), buffer);
        let infos = glyph_buffer.glyph_infos();
        let positions = glyph_buffer.glyph_positions();

        // Cluster values are byte offsets into `text`.
        let mut starts: Vec<usize> = infos.iter().map(|info| info.cluster as usize).collect();
        starts.sort_unstable();
        starts.dedup();
        let cluster_text = |start: usize| {
            let end = starts
                .iter()
                .copied()
                .find(|&s| s > start)
                .unwrap_or(text.len());
            text.get(start..end).unwrap_or_default().to_string()
        };

        let mut seen = HashSet::new();
        let mut glyphs = Vec::with_capacity(infos.len());
        let mut advance = 0;
        for (info, pos) in infos.iter().zip(positions.iter()) {
            let glyph_id = u16::try_from(info.glyph_id).unwrap_or(0);
            let nominal_advance =
                face.glyph_hor_advance(GlyphId(glyph_id)).map(i32::from).unwrap_or(0);
            let cluster = if seen.insert(info.cluster) {
                cluster_text(info.cluster as usize)
            } else {
                String::new()
            };
            glyphs.push(ShapedGlyph {
                glyph_id,
                advance: pos.x_advance,
                nominal_advance,
                text: cluster,
            });
            advance += pos.x_advance;
        }

        let recycled = glyph_buffer.clear();
        SCRATCH_BUFFER.with(|b| *b.borrow_mut() = Some(recycled));

        Ok(ShapedText { glyphs, advance })
    }
}

/// Keeps only characters that are safe in a PDF name without escaping.
fn pdf_safe_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+'))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShapedGlyph {
    pub glyph_id: u16,
    /// Shaped advance (including kerning), in font units.
    pub advance: i32,
    /// Advance from the font's metrics table, in font units.
    pub nominal_advance: i32,
    /// The source text this glyph starts, empty for continuation glyphs.
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapedText {
    pub glyphs: Vec<ShapedGlyph>,
    /// Total advance in font units.
    pub advance: i32,
}

/// Resolves font assets for one render call, loading each `(dir, family)` once.
#[derive(Debug)]
pub struct FontResolver<'a> {
    assets: &'a dyn AssetProvider,
    cache: HashMap<FontKey, Arc<FontHandle>>,
}

impl<'a> FontResolver<'a> {
    pub fn new(assets: &'a dyn AssetProvider) -> Self {
        Self { assets, cache: HashMap::new() }
    }

    /// Returns the font for `family` under `asset_dir`, loading it on first use.
    pub fn resolve(
        &mut self,
        family: &str,
        asset_dir: &str,
    ) -> Result<Arc<FontHandle>, RenderError> {
        let key = FontKey::new(family, asset_dir);
        if let Some(handle) = self.cache.get(&key) {
            log::trace!("Font cache hit for {}/{}", asset_dir, family);
            return Ok(handle.clone());
        }

        let candidates = font_asset_paths(asset_dir, family);
        let (path, data) = self
            .assets
            .load_first(&candidates)
            .map_err(|e| RenderError::font(family, asset_dir, e))?;

        log::debug!(
            "Loaded font '{}' from {} via {} ({} bytes)",
            family,
            path,
            self.assets.name(),
            data.len()
        );
        let handle = Arc::new(FontHandle::parse(key.clone(), path, data)?);
        self.cache.insert(key, handle.clone());
        Ok(handle)
    }

    /// Number of distinct fonts loaded so far.
    pub fn loaded(&self) -> usize {
        self.cache.len()
    }
}
