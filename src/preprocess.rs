use image::RgbaImage;
use palette::Srgb;

use crate::color::mean_brightness;
use crate::edges::detect_edges;
use crate::subject::identify_subject;

/// Gray level above which a subject pixel turns white in monochrome mode.
pub const SUBJECT_GRAY_THRESHOLD: f64 = 127.0;
/// Background pixels need to be brighter to turn white.
pub const BACKGROUND_GRAY_THRESHOLD: f64 = 160.0;

/// Posterization step for subject pixels; background uses a coarser one.
pub const SUBJECT_STEP: f64 = 32.0;
pub const BACKGROUND_STEP: f64 = 64.0;

#[inline]
fn clamp_channel(v: f64) -> u8 {
    if v.is_nan() { 0 } else { v.round_ties_even().clamp(0.0, 255.0) as u8 }
}

/// Stretch brightness so the darkest pixel maps to 0 and the brightest to
/// 255, scaling every channel by the same affine map. Flat images are left
/// untouched.
pub fn enhance_contrast(img: &mut RgbaImage) {
    let (min, max) = img.pixels().fold((255.0f64, 0.0f64), |(lo, hi), p| {
        let v = mean_brightness(Srgb::new(p[0], p[1], p[2]));
        (lo.min(v), hi.max(v))
    });

    let range = max - min;
    if range <= 0.0 {
        return;
    }

    for p in img.pixels_mut() {
        for c in &mut p.0[..3] {
            *c = clamp_channel((*c as f64 - min) / range * 255.0);
        }
    }
}

/// Simplify an image before palette construction: stretch contrast, then
/// posterize (or threshold, for two colors) more gently inside the subject
/// than in the background.
pub fn preprocess(img: &RgbaImage, num_colors: usize) -> RgbaImage {
    let mut out = img.clone();
    enhance_contrast(&mut out);

    let subject = identify_subject(&detect_edges(&out));

    for (p, &is_subject) in out.pixels_mut().zip(subject.as_slice()) {
        if num_colors == 2 {
            let gray = (p[0] as f64 * 0.299 + p[1] as f64 * 0.587 + p[2] as f64 * 0.114).round();
            let threshold = if is_subject { SUBJECT_GRAY_THRESHOLD } else { BACKGROUND_GRAY_THRESHOLD };
            let v = if gray > threshold { 255 } else { 0 };
            p.0[..3].fill(v);
        } else {
            let step = if is_subject { SUBJECT_STEP } else { BACKGROUND_STEP };
            for c in &mut p.0[..3] {
                *c = clamp_channel((*c as f64 / step).round() * step);
            }
        }
    }

    out
}
