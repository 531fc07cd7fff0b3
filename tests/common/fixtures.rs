use hamcert::{
    BackgroundImage, Compositor, FieldStyle, FieldValues, ImageFormat, InMemoryAssetProvider,
    PageGeometry, Rgb, Role, TemplateDescriptor, TextAlign,
};
use image::{DynamicImage, Rgb as Pixel, RgbImage};
use std::io::Cursor;
use std::sync::Arc;

pub const DEJAVU: &[u8] = include_bytes!("../fixtures/fonts/DejaVuSans.ttf");
pub const DEJAVU_BOLD: &[u8] = include_bytes!("../fixtures/fonts/DejaVuSans-Bold.ttf");
/// An OpenType font with CFF outlines.
pub const ICONS_OTF: &[u8] = include_bytes!("../fixtures/fonts/FontAwesome.otf");

pub const FONT_DIR: &str = "fonts";
pub const TEAL: Rgb = Rgb::new(12, 168, 149);

fn encode(image: DynamicImage, format: image::ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), format)
        .expect("encode fixture image");
    buf
}

/// A small solid-colour PNG.
pub fn png_background(width: u32, height: u32) -> Vec<u8> {
    encode(
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Pixel([240, 236, 220]))),
        image::ImageFormat::Png,
    )
}

/// A small solid-colour baseline JPEG.
pub fn jpeg_background(width: u32, height: u32) -> Vec<u8> {
    encode(
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Pixel([20, 40, 80]))),
        image::ImageFormat::Jpeg,
    )
}

/// Fonts "A" (regular) and "B" (bold) under `fonts/`, plus `tmpl.png`.
pub fn assets() -> InMemoryAssetProvider {
    let assets = InMemoryAssetProvider::new();
    assets.insert_font(FONT_DIR, "A", DEJAVU.to_vec()).unwrap();
    assets.insert_font(FONT_DIR, "B", DEJAVU_BOLD.to_vec()).unwrap();
    assets.insert("tmpl.png", png_background(64, 45)).unwrap();
    assets
}

pub fn compositor() -> Compositor {
    Compositor::new(Arc::new(assets()), PageGeometry::default())
}

/// The three-field template used throughout: teal call sign and name, white frequency.
pub fn scenario_descriptor() -> TemplateDescriptor {
    TemplateDescriptor::new("scenario", BackgroundImage::path(ImageFormat::Png, "tmpl.png"))
        .with_field(
            Role::CallSign,
            FieldStyle::new("A", 47.0).at(4.0, 91.0).colored(TEAL).font_dir(FONT_DIR),
        )
        .with_field(
            Role::RecipientName,
            FieldStyle::new("A", 25.0).at(6.0, 105.0).colored(TEAL).font_dir(FONT_DIR),
        )
        .with_field(
            Role::Frequency,
            FieldStyle::new("B", 23.0)
                .at(131.0, 43.0)
                .aligned(TextAlign::Left)
                .colored(Rgb::WHITE)
                .font_dir(FONT_DIR),
        )
}

pub fn scenario_values() -> FieldValues {
    FieldValues::new()
        .with(Role::CallSign, "N0CALL")
        .with(Role::RecipientName, "Jane Doe")
        .with(Role::Frequency, "7.135 MHz")
}
