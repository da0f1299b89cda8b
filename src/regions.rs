use image::RgbaImage;
use palette::Srgb;

use crate::color::{luminance, saturation};
use crate::subject::SubjectMask;

/// Perceptual priority of a pixel, lowest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Tier {
    #[default]
    Background,
    Subject,
    Face,
    Eye,
}

impl Tier {
    /// Histogram weight of one pixel of this tier.
    pub fn weight(self) -> u32 {
        match self {
            Tier::Background => 1,
            Tier::Subject => 3,
            Tier::Face => 5,
            Tier::Eye => 8,
        }
    }
}

/// Hue in whole degrees (0..=360), saturation and value in 0..1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsv {
    pub h: f64,
    pub s: f64,
    pub v: f64,
}

/// Inclusive box in HSV space.
#[derive(Clone, Copy, Debug)]
pub struct HsvRange {
    pub h: (f64, f64),
    pub s: (f64, f64),
    pub v: (f64, f64),
}

impl HsvRange {
    fn contains(&self, hsv: Hsv) -> bool {
        (self.h.0..=self.h.1).contains(&hsv.h)
            && (self.s.0..=self.s.1).contains(&hsv.s)
            && (self.v.0..=self.v.1).contains(&hsv.v)
    }
}

/// Light, medium and dark skin.
pub const SKIN_TONE_RANGES: [HsvRange; 3] = [
    HsvRange { h: (0.0, 50.0), s: (0.1, 0.6), v: (0.5, 1.0) },
    HsvRange { h: (0.0, 35.0), s: (0.2, 0.7), v: (0.4, 0.9) },
    HsvRange { h: (0.0, 40.0), s: (0.15, 0.8), v: (0.2, 0.8) },
];

/// Share of skin-toned subject pixels above which the subject is a face.
pub const FACE_RATIO: f64 = 0.15;

// Iris/pupil and sclera characteristics.
const DARK_EYE_LUMINANCE_MAX: f64 = 0.3;
const DARK_EYE_SATURATION_MIN: f64 = 0.2;
const LIGHT_EYE_LUMINANCE_MIN: f64 = 0.3;
const LIGHT_EYE_SATURATION_MIN: f64 = 0.3;
const SCLERA_LUMINANCE_MIN: f64 = 0.8;
const SCLERA_SATURATION_MAX: f64 = 0.2;

const EYE_BAND: (f64, f64) = (0.2, 0.5);
const EYE_WINDOW_FRACTION: f64 = 0.1;
const EYE_BORDER_FRACTION: f64 = 0.2;
const IRIS_RATIO: f64 = 0.15;
const SCLERA_RATIO: f64 = 0.2;

// Math.round semantics: halves go towards +inf.
#[inline]
fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}

pub fn rgb_to_hsv(c: Srgb<u8>) -> Hsv {
    let r = c.red as f64 / 255.0;
    let g = c.green as f64 / 255.0;
    let b = c.blue as f64 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = max - min;

    let sector = if diff == 0.0 {
        0.0
    } else if max == r {
        ((g - b) / diff) % 6.0
    } else if max == g {
        (b - r) / diff + 2.0
    } else {
        (r - g) / diff + 4.0
    };

    let mut h = round_half_up(sector * 60.0);
    if h < 0.0 {
        h += 360.0;
    }

    Hsv { h, s: if max == 0.0 { 0.0 } else { diff / max }, v: max }
}

pub fn is_skin_tone(c: Srgb<u8>) -> bool {
    let hsv = rgb_to_hsv(c);
    SKIN_TONE_RANGES.iter().any(|range| range.contains(hsv))
}

/// Iris or pupil: dark and somewhat saturated, or mid/light and saturated.
pub fn is_eye_pixel(luminance: f64, saturation: f64) -> bool {
    (luminance <= DARK_EYE_LUMINANCE_MAX && saturation >= DARK_EYE_SATURATION_MIN)
        || (luminance >= LIGHT_EYE_LUMINANCE_MIN && saturation >= LIGHT_EYE_SATURATION_MIN)
}

/// White of the eye: bright and nearly unsaturated.
pub fn is_sclera_pixel(luminance: f64, saturation: f64) -> bool {
    luminance >= SCLERA_LUMINANCE_MIN && saturation <= SCLERA_SATURATION_MAX
}

/// Which eye-palette subset a color belongs to, if any.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EyeShade {
    Sclera,
    Dark,
    Light,
}

impl EyeShade {
    pub fn of(c: Srgb<u8>) -> Self {
        let lum = luminance(c);
        if is_sclera_pixel(lum, saturation(c)) {
            EyeShade::Sclera
        } else if lum <= DARK_EYE_LUMINANCE_MAX {
            EyeShade::Dark
        } else {
            EyeShade::Light
        }
    }
}

/// Per-pixel tier labels, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TierMap {
    width: u32,
    height: u32,
    tiers: Vec<Tier>,
}

impl TierMap {
    pub fn from_subject(mask: &SubjectMask) -> Self {
        let (width, height) = mask.dimensions();
        let tiers = mask
            .as_slice()
            .iter()
            .map(|&s| if s { Tier::Subject } else { Tier::Background })
            .collect();
        TierMap { width, height, tiers }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Tier {
        self.tiers[(y * self.width + x) as usize]
    }

    /// Labels in row-major order, matching `RgbaImage::pixels()`.
    pub fn as_slice(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn count(&self, tier: Tier) -> usize {
        self.tiers.iter().filter(|t| **t == tier).count()
    }

    /// Raise (x, y) to `tier` unless it already ranks higher.
    #[inline]
    fn promote(&mut self, x: u32, y: u32, tier: Tier) {
        let slot = &mut self.tiers[(y * self.width + x) as usize];
        *slot = (*slot).max(tier);
    }
}

/// Outcome of face detection over a subject mask.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceRegion {
    /// Skin-toned subject pixels.
    pub mask: Vec<bool>,
    pub skin_ratio: f64,
    pub is_face: bool,
}

/// Mark skin-toned subject pixels; the subject is a face when their share
/// exceeds [`FACE_RATIO`]. No subject pixels means no face.
pub fn detect_face_region(img: &RgbaImage, subject: &SubjectMask) -> FaceRegion {
    let mut mask = vec![false; subject.as_slice().len()];
    let mut subject_pixels = 0usize;
    let mut skin_pixels = 0usize;

    for ((p, &is_subject), slot) in img.pixels().zip(subject.as_slice()).zip(mask.iter_mut()) {
        if !is_subject {
            continue;
        }
        subject_pixels += 1;
        if is_skin_tone(Srgb::new(p[0], p[1], p[2])) {
            skin_pixels += 1;
            *slot = true;
        }
    }

    let skin_ratio = if subject_pixels == 0 {
        0.0
    } else {
        skin_pixels as f64 / subject_pixels as f64
    };

    FaceRegion { mask, skin_ratio, is_face: skin_ratio > FACE_RATIO }
}

/// Scan the upper-middle band of the image for windows that look like an eye
/// (enough iris/pupil pixels next to enough sclera pixels). Windows are only
/// tried where their top-left corner lies on a face pixel. Matches are
/// returned with a border of a fifth of the window size.
pub fn detect_eye_regions(img: &RgbaImage, face_mask: &[bool]) -> Vec<bool> {
    let (w, h) = img.dimensions();
    let mut eyes = vec![false; (w * h) as usize];

    let window = (w as f64 * EYE_WINDOW_FRACTION).floor() as u32;
    if window == 0 {
        return eyes;
    }
    let stride = (window / 2).max(1) as usize;
    let top = (h as f64 * EYE_BAND.0).floor() as u32;
    let bottom = (h as f64 * EYE_BAND.1).floor() as u32;

    for y in (top..bottom).step_by(stride) {
        for x in (0..w.saturating_sub(window)).step_by(stride) {
            if !face_mask[(y * w + x) as usize] {
                continue;
            }
            if window_looks_like_eye(img, x, y, window) {
                mark_eye(&mut eyes, x, y, window, w, h);
            }
        }
    }

    eyes
}

fn window_looks_like_eye(img: &RgbaImage, x0: u32, y0: u32, window: u32) -> bool {
    let (w, h) = img.dimensions();
    let mut iris = 0usize;
    let mut sclera = 0usize;
    let mut total = 0usize;

    for y in y0..(y0 + window).min(h) {
        for x in x0..(x0 + window).min(w) {
            let p = img.get_pixel(x, y);
            let c = Srgb::new(p[0], p[1], p[2]);
            let (lum, sat) = (luminance(c), saturation(c));
            if is_eye_pixel(lum, sat) {
                iris += 1;
            } else if is_sclera_pixel(lum, sat) {
                sclera += 1;
            }
            total += 1;
        }
    }

    if total == 0 {
        return false;
    }
    let total = total as f64;
    iris as f64 / total >= IRIS_RATIO && sclera as f64 / total >= SCLERA_RATIO
}

/// Mark the window plus its border; the border is clipped at the image edges
/// instead of wrapping onto neighbouring rows.
fn mark_eye(eyes: &mut [bool], x: u32, y: u32, window: u32, w: u32, h: u32) {
    let border = (window as f64 * EYE_BORDER_FRACTION).floor() as i64;
    let x0 = (x as i64 - border).max(0);
    let y0 = (y as i64 - border).max(0);
    let x1 = (x as i64 + window as i64 + border).min(w as i64);
    let y1 = (y as i64 + window as i64 + border).min(h as i64);
    for yy in y0..y1 {
        for xx in x0..x1 {
            eyes[(yy * w as i64 + xx) as usize] = true;
        }
    }
}

/// Full classification result.
#[derive(Clone, Debug)]
pub struct Regions {
    pub tiers: TierMap,
    pub is_face: bool,
}

impl Regions {
    pub fn has_eyes(&self) -> bool {
        self.tiers.count(Tier::Eye) > 0
    }
}

/// Label every pixel with its tier. Face and eye tiers are only assigned
/// when the subject is judged to be a face.
pub fn classify_regions(img: &RgbaImage, subject: &SubjectMask) -> Regions {
    let mut tiers = TierMap::from_subject(subject);
    let face = detect_face_region(img, subject);
    log::debug!("skin ratio {:.3}, face: {}", face.skin_ratio, face.is_face);

    if face.is_face {
        let (w, _) = tiers.dimensions();
        let eyes = detect_eye_regions(img, &face.mask);
        for (i, (&is_face, &is_eye)) in face.mask.iter().zip(eyes.iter()).enumerate() {
            let (x, y) = (i as u32 % w, i as u32 / w);
            if is_eye {
                tiers.promote(x, y, Tier::Eye);
            } else if is_face {
                tiers.promote(x, y, Tier::Face);
            }
        }
    }

    Regions { tiers, is_face: face.is_face }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn hsv_of_primaries() {
        assert_eq!(rgb_to_hsv(Srgb::new(255, 0, 0)), Hsv { h: 0.0, s: 1.0, v: 1.0 });
        assert_eq!(rgb_to_hsv(Srgb::new(0, 255, 0)).h, 120.0);
        assert_eq!(rgb_to_hsv(Srgb::new(0, 0, 255)).h, 240.0);
        assert_eq!(rgb_to_hsv(Srgb::new(255, 0, 255)).h, 300.0);
        assert_eq!(rgb_to_hsv(Srgb::new(0, 0, 0)), Hsv { h: 0.0, s: 0.0, v: 0.0 });
    }

    #[test]
    fn skin_tones() {
        assert!(is_skin_tone(Srgb::new(224, 172, 138)));
        assert!(is_skin_tone(Srgb::new(141, 85, 36)));
        assert!(!is_skin_tone(Srgb::new(40, 90, 200)));
        assert!(!is_skin_tone(Srgb::new(255, 255, 255)));
        assert!(!is_skin_tone(Srgb::new(20, 10, 5)));
    }

    #[test]
    fn eye_pixel_tests() {
        assert!(is_eye_pixel(0.1, 0.5));
        assert!(!is_eye_pixel(0.1, 0.1));
        assert!(is_eye_pixel(0.6, 0.4));
        assert!(is_sclera_pixel(0.95, 0.05));
        assert!(!is_sclera_pixel(0.7, 0.05));
    }

    #[test]
    fn eye_shades() {
        assert_eq!(EyeShade::of(Srgb::new(250, 250, 250)), EyeShade::Sclera);
        assert_eq!(EyeShade::of(Srgb::new(60, 30, 10)), EyeShade::Dark);
        assert_eq!(EyeShade::of(Srgb::new(60, 140, 220)), EyeShade::Light);
    }

    #[test]
    fn no_subject_means_no_face() {
        let img = RgbaImage::from_pixel(8, 8, Rgba([224, 172, 138, 255]));
        let face = detect_face_region(&img, &SubjectMask::empty(8, 8));
        assert!(!face.is_face);
        assert_eq!(face.skin_ratio, 0.0);
        assert!(face.mask.iter().all(|m| !m));
    }

    #[test]
    fn eye_pattern_in_face_band_is_found() {
        // 40x40 skin image, window = 4, band rows 8..20.
        let mut img = RgbaImage::from_pixel(40, 40, Rgba([224, 172, 138, 255]));
        for y in 8..12 {
            for x in 8..12 {
                let px = if x < 10 { Rgba([250, 250, 250, 255]) } else { Rgba([30, 60, 120, 255]) };
                img.put_pixel(x, y, px);
            }
        }
        let face_mask = vec![true; 40 * 40];
        let eyes = detect_eye_regions(&img, &face_mask);
        assert!(eyes[8 * 40 + 8]);
        // Border of 0 for a window of 4; nothing far away.
        assert!(!eyes[35 * 40 + 35]);
    }

    #[test]
    fn narrow_images_skip_eye_search() {
        let img = RgbaImage::from_pixel(9, 9, Rgba([0, 0, 0, 255]));
        let eyes = detect_eye_regions(&img, &[true; 81]);
        assert!(eyes.iter().all(|e| !e));
    }

    #[test]
    fn tiers_are_ordered_and_weighted() {
        assert!(Tier::Eye > Tier::Face && Tier::Face > Tier::Subject && Tier::Subject > Tier::Background);
        assert_eq!(
            [Tier::Background, Tier::Subject, Tier::Face, Tier::Eye].map(Tier::weight),
            [1, 3, 5, 8]
        );
    }
}
