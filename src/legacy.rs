//! The two fixed certificate layouts, expressed as constant descriptors.
//!
//! Both draw on a landscape A4 background with fonts from [`LEGACY_FONT_DIR`].
//! The only variation inside a layout is the Classic frequency anchor, which
//! moves left for the wider 2 m frequency.
//!
//! The layouts were designed as 10 mm cells with the text vertically centred
//! in them. Each field's anchor is the top of the text box that puts the
//! baseline where that cell put it, see [`cell_baseline_mm`].

use crate::error::CertError;
use hamcert_types::{
    BackgroundImage, FieldStyle, FieldValues, MM_TO_PT, Rgb, Role, TemplateDescriptor, TextAlign,
};
use std::fmt;
use std::str::FromStr;

/// Font directory (relative to the asset root) used by both layouts.
pub const LEGACY_FONT_DIR: &str = "TEMP/FONT";

const TEAL: Rgb = Rgb::new(12, 168, 149);

const CELL_HEIGHT_MM: f32 = 10.0;

/// Ascender of the layout fonts, as a fraction of the em.
const LAYOUT_ASCENT_EM: f32 = 0.93;

/// Baseline of text set at `size_pt` in a layout cell whose top edge is at
/// `cell_y` millimetres.
pub fn cell_baseline_mm(cell_y: f32, size_pt: f32) -> f32 {
    cell_y + CELL_HEIGHT_MM / 2.0 + 0.3 * (size_pt / MM_TO_PT)
}

/// Text box top that lands the baseline on [`cell_baseline_mm`].
fn cell_top_mm(cell_y: f32, size_pt: f32) -> f32 {
    cell_baseline_mm(cell_y, size_pt) - LAYOUT_ASCENT_EM * (size_pt / MM_TO_PT)
}

/// The closed set of bands the fixed layouts know how to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Band {
    /// 40 m, printed as 7.135 MHz.
    Forty,
    /// 2 m, printed as 145.240 MHz.
    Two,
}

impl Band {
    pub const ALL: [Band; 2] = [Band::Forty, Band::Two];

    /// Looks up a band by its label (`"40 m"`, `"2 m"`).
    pub fn from_label(label: &str) -> Option<Band> {
        Band::ALL.into_iter().find(|band| band.label() == label.trim())
    }

    pub fn label(self) -> &'static str {
        match self {
            Band::Forty => "40 m",
            Band::Two => "2 m",
        }
    }

    /// Frequency in MHz, formatted for display.
    pub fn frequency(self) -> &'static str {
        match self {
            Band::Forty => "7.135",
            Band::Two => "145.240",
        }
    }
}

impl FromStr for Band {
    type Err = CertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Band::from_label(s).ok_or_else(|| CertError::UnknownBand(s.to_string()))
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegacyTemplate {
    /// Teal call sign and name on the left, white frequency in the banner.
    Classic,
    /// Black right-aligned text along the right edge.
    Modern,
}

impl LegacyTemplate {
    pub fn name(self) -> &'static str {
        match self {
            LegacyTemplate::Classic => "classic",
            LegacyTemplate::Modern => "modern",
        }
    }

    /// The layout with its default (40 m) geometry.
    pub fn descriptor(self, background: BackgroundImage) -> TemplateDescriptor {
        self.descriptor_for(background, Some(Band::Forty))
    }

    /// The layout with geometry adjusted for `band`.
    pub fn descriptor_for(
        self,
        background: BackgroundImage,
        band: Option<Band>,
    ) -> TemplateDescriptor {
        let descriptor = TemplateDescriptor::new(self.name(), background);
        match self {
            LegacyTemplate::Classic => {
                let frequency_x = match band {
                    Some(Band::Two) => 120.0,
                    _ => 132.0,
                };
                descriptor
                    .with_field(
                        Role::CallSign,
                        legacy_style("ArchivoBlack-Regular", 47.0, TEAL, 5.0, 91.0),
                    )
                    .with_field(
                        Role::RecipientName,
                        legacy_style("ArchivoBlack-Regular", 25.0, TEAL, 7.0, 105.0),
                    )
                    .with_field(
                        Role::Frequency,
                        legacy_style("ATOMICCLOCKRADIO", 23.0, Rgb::WHITE, frequency_x, 43.0),
                    )
            }
            LegacyTemplate::Modern => descriptor
                .with_field(
                    Role::CallSign,
                    legacy_style("Kanit-Bold", 48.0, Rgb::BLACK, 286.0, 80.0)
                        .aligned(TextAlign::Right),
                )
                .with_field(
                    Role::RecipientName,
                    legacy_style("Kanit-Bold", 18.0, Rgb::BLACK, 285.0, 95.0)
                        .aligned(TextAlign::Right),
                )
                .with_field(
                    Role::Frequency,
                    legacy_style("OrangeTypewriter", 16.0, Rgb::BLACK, 288.0, 23.0)
                        .aligned(TextAlign::Right),
                ),
        }
    }

    /// How this layout prints the frequency for `band`.
    pub fn frequency_text(self, band: Band) -> String {
        match self {
            LegacyTemplate::Classic => band.frequency().to_string(),
            LegacyTemplate::Modern => format!("{} MHz", band.frequency()),
        }
    }

    /// Field values for one recipient. An unknown band leaves the frequency out.
    pub fn values(self, call_sign: &str, name: &str, band: &str) -> FieldValues {
        let mut values = FieldValues::new()
            .with(Role::CallSign, call_sign)
            .with(Role::RecipientName, name);
        match Band::from_label(band) {
            Some(band) => values.insert(Role::Frequency, self.frequency_text(band)),
            None => log::warn!(
                "Band '{}' is not printable on the {} layout; frequency omitted",
                band,
                self.name()
            ),
        }
        values
    }
}

impl FromStr for LegacyTemplate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classic" | "v1" => Ok(LegacyTemplate::Classic),
            "modern" | "v2" => Ok(LegacyTemplate::Modern),
            other => Err(format!("Unknown layout '{}'; expected classic or modern", other)),
        }
    }
}

/// A field anchored at `x` and the box top matching a layout cell at `cell_y`.
fn legacy_style(font: &str, size: f32, color: Rgb, x: f32, cell_y: f32) -> FieldStyle {
    FieldStyle::new(font, size)
        .at(x, cell_top_mm(cell_y, size))
        .colored(color)
        .font_dir(LEGACY_FONT_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hamcert_types::{ImageFormat, TextPosition};

    fn background() -> BackgroundImage {
        BackgroundImage::path(ImageFormat::Png, "tmpl.png")
    }

    #[test]
    fn band_table_is_closed() {
        assert_eq!(Band::from_label("40 m"), Some(Band::Forty));
        assert_eq!(Band::from_label("2 m"), Some(Band::Two));
        assert_eq!(Band::from_label("20 m"), None);
        assert!(matches!("70 cm".parse::<Band>(), Err(CertError::UnknownBand(_))));
    }

    #[test]
    fn classic_layout_matches_fixed_geometry() {
        let descriptor = LegacyTemplate::Classic.descriptor(background());
        let roles: Vec<_> = descriptor.fields.keys().cloned().collect();
        assert_eq!(roles, vec![Role::CallSign, Role::RecipientName, Role::Frequency]);

        let call_sign = descriptor.field(&Role::CallSign).unwrap();
        assert_eq!(call_sign.font_family, "ArchivoBlack-Regular");
        assert_eq!(call_sign.font_size, 47.0);
        assert_eq!(call_sign.color, TEAL);
        assert_eq!(call_sign.align, TextAlign::Left);
        assert_eq!(call_sign.font_dir, LEGACY_FONT_DIR);

        let frequency = descriptor.field(&Role::Frequency).unwrap();
        assert_eq!(frequency.position, TextPosition::new(132.0, cell_top_mm(43.0, 23.0)));
        assert_eq!(frequency.color, Rgb::WHITE);
    }

    #[test]
    fn cell_anchors_sit_above_the_cell_baseline() {
        // 47 pt is 16.58 mm: baseline 91 + 5 + 4.97, box top one ascent higher.
        assert!((cell_baseline_mm(91.0, 47.0) - 100.975).abs() < 0.01);
        assert!((cell_top_mm(91.0, 47.0) - 85.555).abs() < 0.01);

        let descriptor = LegacyTemplate::Classic.descriptor(background());
        let call_sign = descriptor.field(&Role::CallSign).unwrap();
        let name = descriptor.field(&Role::RecipientName).unwrap();
        assert!(call_sign.position.y < 91.0);
        assert!(name.position.y < 105.0);
    }

    #[test]
    fn classic_two_metre_frequency_moves_left() {
        let descriptor = LegacyTemplate::Classic.descriptor_for(background(), Some(Band::Two));
        assert_eq!(
            descriptor.field(&Role::Frequency).unwrap().position.x,
            120.0
        );
    }

    #[test]
    fn modern_layout_is_right_aligned() {
        let descriptor = LegacyTemplate::Modern.descriptor(background());
        assert!(descriptor.fields.values().all(|style| style.align == TextAlign::Right));
        assert_eq!(
            descriptor.field(&Role::CallSign).unwrap().position,
            TextPosition::new(286.0, cell_top_mm(80.0, 48.0))
        );
        assert_eq!(descriptor.field(&Role::Frequency).unwrap().font_family, "OrangeTypewriter");
        assert!(descriptor.validate().is_ok());
    }

    #[test]
    fn frequency_text_differs_per_layout() {
        assert_eq!(LegacyTemplate::Classic.frequency_text(Band::Forty), "7.135");
        assert_eq!(LegacyTemplate::Modern.frequency_text(Band::Two), "145.240 MHz");
    }

    #[test]
    fn unknown_band_omits_frequency() {
        let values = LegacyTemplate::Modern.values("N0CALL", "Jane Doe", "20 m");
        assert_eq!(values.get(&Role::CallSign), Some("N0CALL"));
        assert_eq!(values.get(&Role::Frequency), None);

        let values = LegacyTemplate::Classic.values("N0CALL", "Jane Doe", "40 m");
        assert_eq!(values.get(&Role::Frequency), Some("7.135"));
    }

    #[test]
    fn parses_layout_names() {
        assert_eq!("Classic".parse::<LegacyTemplate>(), Ok(LegacyTemplate::Classic));
        assert_eq!("v2".parse::<LegacyTemplate>(), Ok(LegacyTemplate::Modern));
        assert!("fancy".parse::<LegacyTemplate>().is_err());
    }
}
