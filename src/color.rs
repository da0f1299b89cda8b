use palette::{Lab, Srgb, white_point::D65};

/// CIE L*a*b* value under a D65 reference white.
pub type LabColor = Lab<D65, f64>;

// D65 reference white, XYZ scaled to Y = 100.
const XN: f64 = 95.047;
const YN: f64 = 100.0;
const ZN: f64 = 108.883;

const LAB_EPSILON: f64 = 0.008856;
const LAB_SLOPE: f64 = 7.787;
const LAB_OFFSET: f64 = 16.0 / 116.0;

/// Per-axis multipliers applied to the *squared* Lab deltas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabWeights {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

impl LabWeights {
    /// Weights used throughout the clustering pipeline. Red-green differences
    /// count more, which keeps skin tones apart.
    pub const PERCEPTUAL: LabWeights = LabWeights { l: 1.0, a: 1.5, b: 1.0 };

    /// Stricter weights of the threshold-gated matcher: deltas scaled by
    /// (1.5, 1.8, 1.2) before squaring.
    pub const BEAD_MATCH: LabWeights = LabWeights::scaled(1.5, 1.8, 1.2);

    pub const UNIFORM: LabWeights = LabWeights { l: 1.0, a: 1.0, b: 1.0 };

    /// Build weights from factors that scale the deltas themselves.
    pub const fn scaled(l: f64, a: f64, b: f64) -> Self {
        LabWeights { l: l * l, a: a * a, b: b * b }
    }
}

impl Default for LabWeights {
    fn default() -> Self {
        LabWeights::PERCEPTUAL
    }
}

#[inline]
fn decode_gamma(c: u8) -> f64 {
    let c = c as f64 / 255.0;
    if c > 0.04045 {
        ((c + 0.055) / 1.055).powf(2.4)
    } else {
        c / 12.92
    }
}

#[inline]
fn lab_f(t: f64) -> f64 {
    if t > LAB_EPSILON {
        t.cbrt()
    } else {
        LAB_SLOPE * t + LAB_OFFSET
    }
}

/// Convert an 8-bit sRGB triple to L*a*b* (sRGB → linear → XYZ → Lab).
///
/// The matrix and the linear toe of the Lab curve use the classic rounded
/// constants rather than `palette`'s exact CIE ones, so results match the
/// reference swatch values bead tables are tuned against.
pub fn rgb_to_lab(r: u8, g: u8, b: u8) -> LabColor {
    let (r, g, b) = (decode_gamma(r), decode_gamma(g), decode_gamma(b));

    let x = (r * 0.4124 + g * 0.3576 + b * 0.1805) * 100.0;
    let y = (r * 0.2126 + g * 0.7152 + b * 0.0722) * 100.0;
    let z = (r * 0.0193 + g * 0.1192 + b * 0.9505) * 100.0;

    let fx = lab_f(x / XN);
    let fy = lab_f(y / YN);
    let fz = lab_f(z / ZN);

    LabColor::new(116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz))
}

#[inline]
pub fn srgb_to_lab(c: Srgb<u8>) -> LabColor {
    rgb_to_lab(c.red, c.green, c.blue)
}

/// Weighted Euclidean distance in Lab space.
#[inline]
pub fn lab_distance(c1: &LabColor, c2: &LabColor, weights: LabWeights) -> f64 {
    let dl = c1.l - c2.l;
    let da = c1.a - c2.a;
    let db = c1.b - c2.b;
    (weights.l * dl * dl + weights.a * da * da + weights.b * db * db).sqrt()
}

/// Relative luminance in 0..1 (Rec. 601 weights).
#[inline]
pub fn luminance(c: Srgb<u8>) -> f64 {
    (0.299 * c.red as f64 + 0.587 * c.green as f64 + 0.114 * c.blue as f64) / 255.0
}

/// HSV saturation in 0..1.
#[inline]
pub fn saturation(c: Srgb<u8>) -> f64 {
    let max = c.red.max(c.green).max(c.blue) as f64;
    let min = c.red.min(c.green).min(c.blue) as f64;
    if max == 0.0 { 0.0 } else { (max - min) / max }
}

/// Unweighted channel mean in 0..255.
#[inline]
pub fn mean_brightness(c: Srgb<u8>) -> f64 {
    (c.red as f64 + c.green as f64 + c.blue as f64) / 3.0
}
