use lopdf::content::Operation;
use lopdf::{Dictionary, Document as LopdfDocument, Object};
use std::collections::{BTreeMap, HashMap};

/// One `TJ` as it lands on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub font: String,
    pub size: f32,
    pub color: [f32; 3],
    pub x: f32,
    pub y: f32,
    pub text: String,
}

fn first_page(doc: &LopdfDocument) -> &Dictionary {
    let (_, page_id) = doc.get_pages().into_iter().next().expect("document has no pages");
    doc.get_dictionary(page_id).expect("page is not a dictionary")
}

/// Follows a reference if `obj` is one.
fn resolve<'a>(doc: &'a LopdfDocument, obj: &'a Object) -> &'a Object {
    match obj.as_reference() {
        Ok(id) => doc.get_object(id).expect("dangling reference"),
        Err(_) => obj,
    }
}

fn resources(doc: &LopdfDocument) -> &Dictionary {
    let page = first_page(doc);
    resolve(doc, page.get(b"Resources").expect("page has no resources"))
        .as_dict()
        .expect("resources are not a dictionary")
}

pub fn page_size(doc: &LopdfDocument) -> (f32, f32) {
    let media_box = first_page(doc)
        .get(b"MediaBox")
        .and_then(Object::as_array)
        .expect("page has no MediaBox");
    (
        media_box[2].as_float().expect("width"),
        media_box[3].as_float().expect("height"),
    )
}

pub fn page_operations(doc: &LopdfDocument) -> Vec<Operation> {
    let (_, page_id) = doc.get_pages().into_iter().next().expect("document has no pages");
    doc.get_and_decode_page_content(page_id)
        .expect("content stream does not decode")
        .operations
}

/// The image XObjects on the first page, by resource name.
pub fn image_xobjects(doc: &LopdfDocument) -> BTreeMap<String, Dictionary> {
    let mut images = BTreeMap::new();
    if let Ok(xobjects) = resources(doc).get(b"XObject").and_then(Object::as_dict) {
        for (name, value) in xobjects.iter() {
            if let Ok(stream) = resolve(doc, value).as_stream() {
                images.insert(String::from_utf8_lossy(name).to_string(), stream.dict.clone());
            }
        }
    }
    images
}

/// BaseFont names of the fonts the first page uses.
pub fn extract_font_names(doc: &LopdfDocument) -> Vec<String> {
    let mut names = Vec::new();
    if let Ok(fonts) = resources(doc).get(b"Font").and_then(Object::as_dict) {
        for (_, value) in fonts.iter() {
            if let Ok(font) = resolve(doc, value).as_dict()
                && let Ok(base) = font.get(b"BaseFont").and_then(Object::as_name)
            {
                names.push(String::from_utf8_lossy(base).to_string());
            }
        }
    }
    names
}

/// How one Type0 font's program is embedded.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedFont {
    pub base_font: String,
    /// Subtype of the descendant CIDFont.
    pub cid_subtype: String,
    /// `FontFile2` or `FontFile3`.
    pub file_key: String,
    /// `/Subtype` of the font file stream, if it has one.
    pub file_subtype: Option<String>,
    pub has_cid_to_gid_map: bool,
}

fn name_of(dict: &Dictionary, key: &[u8]) -> Option<String> {
    dict.get(key)
        .and_then(Object::as_name)
        .ok()
        .map(|n| String::from_utf8_lossy(n).to_string())
}

/// Descendant font and font file details for every font on the first page.
pub fn embedded_fonts(doc: &LopdfDocument) -> Vec<EmbeddedFont> {
    let mut embedded = Vec::new();
    let Ok(fonts) = resources(doc).get(b"Font").and_then(Object::as_dict) else {
        return embedded;
    };

    for (_, value) in fonts.iter() {
        let font = resolve(doc, value).as_dict().expect("font is not a dictionary");
        let descendants = font
            .get(b"DescendantFonts")
            .and_then(Object::as_array)
            .expect("Type0 font without DescendantFonts");
        let cid_font = resolve(doc, &descendants[0]).as_dict().expect("CIDFont dictionary");
        let descriptor = resolve(doc, cid_font.get(b"FontDescriptor").expect("FontDescriptor"))
            .as_dict()
            .expect("FontDescriptor dictionary");

        let (file_key, file) = [&b"FontFile2"[..], b"FontFile3"]
            .into_iter()
            .find_map(|key| descriptor.get(key).ok().map(|file| (key, file)))
            .expect("FontDescriptor without an embedded program");
        let file = resolve(doc, file).as_stream().expect("font file stream");

        embedded.push(EmbeddedFont {
            base_font: name_of(font, b"BaseFont").unwrap_or_default(),
            cid_subtype: name_of(cid_font, b"Subtype").unwrap_or_default(),
            file_key: String::from_utf8_lossy(file_key).to_string(),
            file_subtype: name_of(&file.dict, b"Subtype"),
            has_cid_to_gid_map: cid_font.has(b"CIDToGIDMap"),
        });
    }
    embedded
}

/// Glyph id to text, per font resource name, read from the ToUnicode CMaps.
pub fn to_unicode_maps(doc: &LopdfDocument) -> HashMap<String, HashMap<u16, String>> {
    let mut maps = HashMap::new();
    let Ok(fonts) = resources(doc).get(b"Font").and_then(Object::as_dict) else {
        return maps;
    };

    for (name, value) in fonts.iter() {
        let Ok(font) = resolve(doc, value).as_dict() else { continue };
        let Ok(cmap_ref) = font.get(b"ToUnicode") else { continue };
        let Ok(stream) = resolve(doc, cmap_ref).as_stream() else { continue };
        let content = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());
        maps.insert(
            String::from_utf8_lossy(name).to_string(),
            parse_bfchar(&String::from_utf8_lossy(&content)),
        );
    }
    maps
}

fn parse_bfchar(cmap: &str) -> HashMap<u16, String> {
    let mut map = HashMap::new();
    let mut in_block = false;
    for line in cmap.lines() {
        let line = line.trim();
        if line.ends_with("beginbfchar") {
            in_block = true;
        } else if line == "endbfchar" {
            in_block = false;
        } else if in_block {
            let parts: Vec<&str> = line
                .split(|c| c == '<' || c == '>')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            if let [gid, utf16] = parts.as_slice() {
                let Ok(gid) = u16::from_str_radix(gid, 16) else { continue };
                let units: Vec<u16> = (0..utf16.len())
                    .step_by(4)
                    .filter_map(|i| utf16.get(i..i + 4))
                    .filter_map(|unit| u16::from_str_radix(unit, 16).ok())
                    .collect();
                map.insert(gid, String::from_utf16_lossy(&units));
            }
        }
    }
    map
}

/// Replays the content stream and collects every text show operation.
pub fn text_runs(doc: &LopdfDocument) -> Vec<TextRun> {
    let maps = to_unicode_maps(doc);
    let mut runs = Vec::new();
    let (mut font, mut size, mut color) = (String::new(), 0.0, [0.0; 3]);
    let (mut x, mut y) = (0.0, 0.0);

    for op in page_operations(doc) {
        let number = |i: usize| op.operands.get(i).and_then(|o| o.as_float().ok()).unwrap_or(0.0);
        match op.operator.as_str() {
            "BT" => (x, y) = (0.0, 0.0),
            "Tf" => {
                font = op
                    .operands
                    .first()
                    .and_then(|o| o.as_name().ok())
                    .map(|n| String::from_utf8_lossy(n).to_string())
                    .unwrap_or_default();
                size = number(1);
            }
            "rg" => color = [number(0), number(1), number(2)],
            "Td" => (x, y) = (x + number(0), y + number(1)),
            "TJ" | "Tj" => {
                let glyphs = maps.get(&font);
                let mut text = String::new();
                let mut strings = Vec::new();
                match op.operands.first() {
                    Some(Object::Array(items)) => {
                        strings.extend(items.iter().filter_map(|i| i.as_str().ok()))
                    }
                    Some(other) => strings.extend(other.as_str().ok()),
                    None => {}
                }
                for bytes in strings {
                    for pair in bytes.chunks(2) {
                        let gid = u16::from_be_bytes([pair[0], *pair.get(1).unwrap_or(&0)]);
                        if let Some(s) = glyphs.and_then(|m| m.get(&gid)) {
                            text.push_str(s);
                        }
                    }
                }
                runs.push(TextRun { font: font.clone(), size, color, x, y, text });
            }
            _ => {}
        }
    }
    runs
}
