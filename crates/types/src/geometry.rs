use serde::{Deserialize, Serialize};

/// Points per millimetre.
pub const MM_TO_PT: f32 = 72.0 / 25.4;

/// An anchor point in millimetres, measured from the top-left page corner.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct TextPosition {
    pub x: f32,
    pub y: f32,
}

impl TextPosition {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned box in millimetres with a top-left origin.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Landscape,
    Portrait,
}

/// Paper size, always expressed portrait-first (width <= height for the named sizes).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub enum PageSize {
    #[default]
    A4,
    A5,
    Letter,
    Custom {
        width_mm: f32,
        height_mm: f32,
    },
}

impl PageSize {
    fn portrait_mm(self) -> (f32, f32) {
        match self {
            PageSize::A4 => (210.0, 297.0),
            PageSize::A5 => (148.0, 210.0),
            PageSize::Letter => (215.9, 279.4),
            PageSize::Custom { width_mm, height_mm } => (width_mm, height_mm),
        }
    }
}

/// Page size plus orientation. Defaults to landscape A4 (297 x 210 mm).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct PageGeometry {
    #[serde(default)]
    pub size: PageSize,
    #[serde(default)]
    pub orientation: Orientation,
}

impl PageGeometry {
    pub fn new(size: PageSize, orientation: Orientation) -> Self {
        Self { size, orientation }
    }

    /// Width and height in millimetres after applying the orientation.
    pub fn dimensions_mm(&self) -> (f32, f32) {
        let (w, h) = self.size.portrait_mm();
        match (self.orientation, self.size) {
            // Custom sizes are taken as given.
            (_, PageSize::Custom { .. }) => (w, h),
            (Orientation::Portrait, _) => (w.min(h), w.max(h)),
            (Orientation::Landscape, _) => (w.max(h), w.min(h)),
        }
    }

    /// Width and height in PDF points.
    pub fn dimensions_pt(&self) -> (f32, f32) {
        let (w, h) = self.dimensions_mm();
        (w * MM_TO_PT, h * MM_TO_PT)
    }
}
