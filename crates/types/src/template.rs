//! Template descriptors: where and how each certificate field is drawn.

use crate::color::Rgb;
use crate::geometry::TextPosition;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt;
use std::io::Read;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Field '{role}' has invalid font size {size}; must be > 0")]
    InvalidFontSize { role: Role, size: f32 },

    #[error("Field '{role}' has an empty font name")]
    EmptyFontName { role: Role },
}

/// Horizontal placement of text relative to its anchor.
#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Anchor is the left edge of the text box.
    #[default]
    Left,
    /// Anchor is the horizontal midpoint of the text box.
    Center,
    /// Anchor is the right edge; text grows leftward.
    Right,
}

impl FromStr for TextAlign {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "l" | "left" => Ok(TextAlign::Left),
            "c" | "center" | "centre" => Ok(TextAlign::Center),
            "r" | "right" => Ok(TextAlign::Right),
            other => Err(format!("Unknown text alignment: '{}'", other)),
        }
    }
}

impl<'de> Deserialize<'de> for TextAlign {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// A semantic field slot, independent of how it is styled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    CallSign,
    RecipientName,
    Frequency,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::CallSign => "call_sign",
            Role::RecipientName => "recipient_name",
            Role::Frequency => "frequency",
            Role::Other(name) => name,
        }
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        match s {
            "call_sign" | "callSign" => Role::CallSign,
            "recipient_name" | "recipientName" | "identity_name" => Role::RecipientName,
            "frequency" => Role::Frequency,
            other => Role::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Role::from(s.as_str()))
    }
}

/// Everything needed to draw one field: anchor, alignment, font and color.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FieldStyle {
    #[serde(rename = "text_position")]
    pub position: TextPosition,
    #[serde(rename = "text_align", default)]
    pub align: TextAlign,
    #[serde(rename = "font_name")]
    pub font_family: String,
    /// Font size in points.
    pub font_size: f32,
    #[serde(rename = "font_color", default)]
    pub color: Rgb,
    /// Directory (relative to the asset root) holding the font file.
    #[serde(rename = "font_dir")]
    pub font_dir: String,
}

impl FieldStyle {
    pub fn new(font_family: impl Into<String>, font_size: f32) -> Self {
        Self {
            position: TextPosition::default(),
            align: TextAlign::Left,
            font_family: font_family.into(),
            font_size,
            color: Rgb::BLACK,
            font_dir: String::new(),
        }
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.position = TextPosition::new(x, y);
        self
    }

    pub fn aligned(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }

    pub fn colored(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    pub fn font_dir(mut self, dir: impl Into<String>) -> Self {
        self.font_dir = dir.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
        }
    }

    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        ext.parse().ok()
    }
}

impl FromStr for ImageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
            other => Err(format!("Unsupported image type: '{}'", other)),
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ImageFormat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Where the background image bytes come from.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    Inline(Arc<Vec<u8>>),
    /// Standard base64, optionally in data-URL form (`data:image/png;base64,...`).
    Base64(String),
    /// A path relative to the asset root.
    Path(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundImage {
    pub format: ImageFormat,
    pub source: ImageSource,
}

impl BackgroundImage {
    pub fn inline(format: ImageFormat, bytes: Vec<u8>) -> Self {
        Self { format, source: ImageSource::Inline(Arc::new(bytes)) }
    }

    pub fn base64(format: ImageFormat, encoded: impl Into<String>) -> Self {
        Self { format, source: ImageSource::Base64(encoded.into()) }
    }

    pub fn path(format: ImageFormat, path: impl Into<String>) -> Self {
        Self { format, source: ImageSource::Path(path.into()) }
    }
}

impl<'de> Deserialize<'de> for BackgroundImage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Stored {
            #[serde(default)]
            file_name: Option<String>,
            #[serde(default, alias = "image_type")]
            file_type: Option<ImageFormat>,
            #[serde(default)]
            b64: Option<String>,
            #[serde(default)]
            path: Option<String>,
        }

        let stored = Stored::deserialize(deserializer)?;
        let format = stored
            .file_type
            .or_else(|| stored.file_name.as_deref().and_then(ImageFormat::from_file_name))
            .or_else(|| stored.path.as_deref().and_then(ImageFormat::from_file_name))
            .ok_or_else(|| de::Error::custom("background image type is not declared"))?;

        let source = match (stored.b64, stored.path) {
            (Some(b64), _) => ImageSource::Base64(b64),
            (None, Some(path)) => ImageSource::Path(path),
            (None, None) => {
                return Err(de::Error::custom("background image has neither 'b64' nor 'path'"));
            }
        };

        Ok(BackgroundImage { format, source })
    }
}

/// A reusable certificate template: background plus ordered field styles.
///
/// Fields are drawn in declaration order, so a later field paints over an
/// earlier one where they overlap.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct TemplateDescriptor {
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub background: BackgroundImage,
    #[serde(rename = "template_properties")]
    pub fields: IndexMap<Role, FieldStyle>,
}

impl TemplateDescriptor {
    pub fn new(name: impl Into<String>, background: BackgroundImage) -> Self {
        Self { name: name.into(), background, fields: IndexMap::new() }
    }

    /// Appends (or replaces) the style for `role`. Appended roles draw last.
    pub fn with_field(mut self, role: Role, style: FieldStyle) -> Self {
        self.fields.insert(role, style);
        self
    }

    pub fn field(&self, role: &Role) -> Option<&FieldStyle> {
        self.fields.get(role)
    }

    pub fn from_json(json: &str) -> Result<Self, TemplateError> {
        let descriptor: Self = serde_json::from_str(json)?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TemplateError> {
        let descriptor: Self = serde_json::from_reader(reader)?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    pub fn validate(&self) -> Result<(), TemplateError> {
        for (role, style) in &self.fields {
            if !(style.font_size > 0.0) {
                return Err(TemplateError::InvalidFontSize {
                    role: role.clone(),
                    size: style.font_size,
                });
            }
            if style.font_family.trim().is_empty() {
                return Err(TemplateError::EmptyFontName { role: role.clone() });
            }
        }
        Ok(())
    }
}

/// Resolved display strings for one render, keyed by role.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct FieldValues(IndexMap<Role, String>);

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, role: Role, value: impl Into<String>) -> Self {
        self.insert(role, value);
        self
    }

    pub fn insert(&mut self, role: Role, value: impl Into<String>) {
        self.0.insert(role, value.into());
    }

    pub fn get(&self, role: &Role) -> Option<&str> {
        self.0.get(role).map(String::as_str)
    }

    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Role, &str)> {
        self.0.iter().map(|(role, value)| (role, value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<R: Into<Role>, V: Into<String>> FromIterator<(R, V)> for FieldValues {
    fn from_iter<I: IntoIterator<Item = (R, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(r, v)| (r.into(), v.into())).collect())
    }
}
