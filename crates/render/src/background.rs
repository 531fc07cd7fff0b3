//! Background image loading and decoding.
//!
//! The declared format must match the actual bytes: a PNG labelled as JPEG is
//! rejected rather than silently decoded. JPEGs in RGB or grayscale are
//! embedded as-is (`DCTDecode`); everything else is decoded to raw samples
//! and flate-compressed, with any alpha channel split into a soft mask.

use crate::error::RenderError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::write::ZlibEncoder;
use hamcert_traits::{AssetProvider, SharedAssetData};
use hamcert_types::{BackgroundImage, ImageFormat, ImageSource};
use image::codecs::jpeg::JpegDecoder;
use image::{DynamicImage, ExtendedColorType, ImageDecoder};
use std::io::{Cursor, Write};
use std::sync::Arc;

/// Image samples ready to be written as a PDF image XObject.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedBackground {
    pub width: u32,
    pub height: u32,
    /// `DeviceRGB` or `DeviceGray`.
    pub color_space: &'static str,
    /// `DCTDecode` or `FlateDecode`.
    pub filter: &'static str,
    pub data: Vec<u8>,
    /// Flate-compressed 8-bit alpha samples, if the image has transparency.
    pub smask: Option<Vec<u8>>,
}

/// Fetches the raw bytes of a background from wherever the descriptor says they live.
pub fn load_background_bytes(
    background: &BackgroundImage,
    assets: &dyn AssetProvider,
) -> Result<SharedAssetData, RenderError> {
    match &background.source {
        ImageSource::Inline(bytes) => Ok(bytes.clone()),
        ImageSource::Base64(encoded) => decode_base64(encoded).map(Arc::new).map_err(|e| {
            RenderError::image(background.format, format!("invalid base64 payload: {}", e))
        }),
        ImageSource::Path(path) => {
            log::debug!("Loading background '{}' via {}", path, assets.name());
            assets
                .load(path)
                .map_err(|e| RenderError::image(background.format, e))
        }
    }
}

/// Decodes standard base64, tolerating a `data:` URL prefix and line breaks.
fn decode_base64(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let payload = match encoded.find(',') {
        Some(idx) => &encoded[idx + 1..],
        None => encoded,
    };
    let cleaned: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD.decode(cleaned)
}

/// Decodes `bytes` as `declared`, failing if the data is in another format.
pub fn decode_background(
    bytes: &[u8],
    declared: ImageFormat,
) -> Result<DecodedBackground, RenderError> {
    let actual = image::guess_format(bytes)
        .map_err(|_| RenderError::image(declared, "data is not a recognizable image"))?;

    let expected = match declared {
        ImageFormat::Png => image::ImageFormat::Png,
        ImageFormat::Jpeg => image::ImageFormat::Jpeg,
    };
    if actual != expected {
        return Err(RenderError::image(
            declared,
            format!("data is {:?}, not {}", actual, declared),
        ));
    }

    match declared {
        ImageFormat::Jpeg => decode_jpeg(bytes),
        ImageFormat::Png => {
            let image = image::load_from_memory_with_format(bytes, expected)
                .map_err(|e| RenderError::image(declared, e))?;
            encode_samples(image, declared)
        }
    }
}

fn decode_jpeg(bytes: &[u8]) -> Result<DecodedBackground, RenderError> {
    let decoder = JpegDecoder::new(Cursor::new(bytes))
        .map_err(|e| RenderError::image(ImageFormat::Jpeg, e))?;
    let (width, height) = decoder.dimensions();

    let passthrough = match decoder.original_color_type() {
        ExtendedColorType::Rgb8 => Some("DeviceRGB"),
        ExtendedColorType::L8 => Some("DeviceGray"),
        _ => None,
    };

    if let Some(color_space) = passthrough {
        return Ok(DecodedBackground {
            width,
            height,
            color_space,
            filter: "DCTDecode",
            data: bytes.to_vec(),
            smask: None,
        });
    }

    // CMYK and friends: let the decoder convert, then store as flate RGB.
    let image = DynamicImage::from_decoder(decoder)
        .map_err(|e| RenderError::image(ImageFormat::Jpeg, e))?;
    encode_samples(image, ImageFormat::Jpeg)
}

fn encode_samples(
    image: DynamicImage,
    format: ImageFormat,
) -> Result<DecodedBackground, RenderError> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(RenderError::image(format, "image has no pixels"));
    }

    let grayscale = !image.color().has_color();
    let smask = if image.color().has_alpha() {
        let alpha: Vec<u8> = image.to_rgba8().pixels().map(|p| p.0[3]).collect();
        Some(deflate(&alpha).map_err(|e| RenderError::image(format, e))?)
    } else {
        None
    };

    let (color_space, samples) = if grayscale {
        ("DeviceGray", image.to_luma8().into_raw())
    } else {
        ("DeviceRGB", image.to_rgb8().into_raw())
    };

    Ok(DecodedBackground {
        width,
        height,
        color_space,
        filter: "FlateDecode",
        data: deflate(&samples).map_err(|e| RenderError::image(format, e))?,
        smask,
    })
}

pub(crate) fn deflate(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}
