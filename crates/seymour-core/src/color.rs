//! Color space conversions and distance metrics
//!
//! sRGB hex -> linear RGB -> CIE XYZ (D65, scaled to 0..100) -> CIE Lab.
//! Distances are CIE76 (Euclidean in Lab) and Manhattan distance in RGB.

use serde::{Deserialize, Serialize};

/// D65 reference white
const REF_X: f64 = 95.047;
const REF_Y: f64 = 100.0;
const REF_Z: f64 = 108.883;

const SRGB_LINEAR_THRESHOLD: f64 = 0.04045;
const LAB_EPSILON: f64 = 0.008856;

/// 8-bit sRGB triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Uppercase 6-digit hex, no leading `#`
    pub fn to_hex(self) -> String {
        rgb_to_hex(self.r, self.g, self.b)
    }
}

/// CIE XYZ, scaled to 0..100
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Xyz {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// CIE Lab value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabColor {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

impl LabColor {
    pub fn new(l: f64, a: f64, b: f64) -> Self {
        Self { l, a, b }
    }

    /// CIE76 distance to another Lab color
    pub fn delta_e(&self, other: &LabColor) -> f64 {
        delta_e(self, other)
    }
}

/// Strip `#`, uppercase and validate a hex code.
///
/// Returns `None` unless the result is exactly six hex digits.
pub fn normalize_hex(input: &str) -> Option<String> {
    let hex = input.trim().trim_start_matches('#').to_ascii_uppercase();
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(hex)
    } else {
        None
    }
}

/// Parse a hex code into RGB.
///
/// Malformed input yields black instead of an error. Ranking relies on this
/// being total, so callers that need validation should use [`normalize_hex`].
pub fn hex_to_rgb(hex: &str) -> Rgb {
    let Some(hex) = normalize_hex(hex) else {
        return Rgb::BLACK;
    };
    match hex::decode(&hex) {
        Ok(bytes) if bytes.len() == 3 => Rgb::new(bytes[0], bytes[1], bytes[2]),
        _ => Rgb::BLACK,
    }
}

pub fn rgb_to_hex(r: u8, g: u8, b: u8) -> String {
    hex::encode_upper([r, g, b])
}

fn linearize(channel: u8) -> f64 {
    let c = f64::from(channel) / 255.0;
    if c > SRGB_LINEAR_THRESHOLD {
        ((c + 0.055) / 1.055).powf(2.4)
    } else {
        c / 12.92
    }
}

pub fn rgb_to_xyz(rgb: Rgb) -> Xyz {
    let r = linearize(rgb.r);
    let g = linearize(rgb.g);
    let b = linearize(rgb.b);

    Xyz {
        x: (r * 0.4124564 + g * 0.3575761 + b * 0.1804375) * 100.0,
        y: (r * 0.2126729 + g * 0.7151522 + b * 0.0721750) * 100.0,
        z: (r * 0.0193339 + g * 0.1191920 + b * 0.9503041) * 100.0,
    }
}

fn lab_f(t: f64) -> f64 {
    if t > LAB_EPSILON {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

pub fn xyz_to_lab(xyz: Xyz) -> LabColor {
    let x = lab_f(xyz.x / REF_X);
    let y = lab_f(xyz.y / REF_Y);
    let z = lab_f(xyz.z / REF_Z);

    LabColor {
        l: 116.0 * y - 16.0,
        a: 500.0 * (x - y),
        b: 200.0 * (y - z),
    }
}

pub fn hex_to_lab(hex: &str) -> LabColor {
    xyz_to_lab(rgb_to_xyz(hex_to_rgb(hex)))
}

/// CIE76 color difference.
///
/// Tier thresholds are calibrated against this metric, do not swap in CIEDE2000.
pub fn delta_e(lab1: &LabColor, lab2: &LabColor) -> f64 {
    let dl = lab1.l - lab2.l;
    let da = lab1.a - lab2.a;
    let db = lab1.b - lab2.b;
    (dl * dl + da * da + db * db).sqrt()
}

/// Sum of absolute per-channel RGB differences (0..=765)
pub fn absolute_distance(hex1: &str, hex2: &str) -> u32 {
    let c1 = hex_to_rgb(hex1);
    let c2 = hex_to_rgb(hex2);
    u32::from(c1.r.abs_diff(c2.r)) + u32::from(c1.g.abs_diff(c2.g)) + u32::from(c1.b.abs_diff(c2.b))
}

/// Whether text drawn on top of this color should be light
pub fn is_dark(hex: &str) -> bool {
    let rgb = hex_to_rgb(hex);
    let luminance =
        (0.299 * f64::from(rgb.r) + 0.587 * f64::from(rgb.g) + 0.114 * f64::from(rgb.b)) / 255.0;
    luminance < 0.5
}
