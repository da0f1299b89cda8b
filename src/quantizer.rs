use image::{Rgba, RgbaImage};
use palette::Srgb;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::beads::BeadPalette;
use crate::error::MosaicError;
use crate::matcher::PixelMatcher;

/// Bead usage per name, in bead-table order. Unused beads are absent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColorCounts {
    entries: Vec<(&'static str, u32)>,
}

impl ColorCounts {
    /// Tally per-entry counts of `beads`, dropping zeros.
    fn from_tally(beads: &BeadPalette, tally: &[u32]) -> Self {
        let entries = beads
            .entries()
            .iter()
            .zip(tally)
            .filter(|(_, n)| **n > 0)
            .map(|(e, &n)| (e.name, n))
            .collect();
        ColorCounts { entries }
    }

    pub fn get(&self, name: &str) -> u32 {
        self.entries.iter().find(|(n, _)| *n == name).map_or(0, |(_, c)| *c)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u32)> + '_ {
        self.entries.iter().copied()
    }

    /// Number of distinct beads used.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts; equals the pixel count of the quantized image.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, c)| *c as u64).sum()
    }
}

impl Serialize for ColorCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, count) in &self.entries {
            map.serialize_entry(name, count)?;
        }
        map.end()
    }
}

/// Recolor every pixel of `img` with the bead `matcher` picks for it and count
/// bead usage. Alpha is kept. `beads` must be the table the matcher draws from.
pub fn quantize<M: PixelMatcher + ?Sized>(
    img: &RgbaImage,
    matcher: &M,
    beads: &BeadPalette,
) -> Result<(RgbaImage, ColorCounts), MosaicError> {
    let mut out = img.clone();
    let mut tally = vec![0u32; beads.len()];

    for (x, y, px) in out.enumerate_pixels_mut() {
        let Rgba([r, g, b, a]) = *px;
        let entry = matcher
            .match_color(Srgb::new(r, g, b))
            .ok_or(MosaicError::NoMatch { x, y })?;
        let slot = beads
            .position(entry.name)
            .ok_or_else(|| MosaicError::UnknownBead(entry.name.to_string()))?;
        tally[slot] += 1;
        *px = Rgba([entry.rgb.red, entry.rgb.green, entry.rgb.blue, a]);
    }

    Ok((out, ColorCounts::from_tally(beads, &tally)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beads::{BLACK, WHITE};
    use crate::matcher::{MonochromeMatcher, NearestBeadMatcher};

    fn gradient(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| Rgba([(x * 17) as u8, (y * 23) as u8, ((x + y) * 9) as u8, 200]))
    }

    #[test]
    fn counts_cover_every_pixel() {
        let beads = BeadPalette::standard();
        let img = gradient(13, 9);
        let (out, counts) = quantize(&img, &NearestBeadMatcher::new(beads), beads).unwrap();
        assert_eq!(counts.total(), 13 * 9);
        assert!(counts.iter().all(|(_, c)| c > 0));
        for p in out.pixels() {
            assert_eq!(p[3], 200);
            assert!(beads.entries().iter().any(|e| e.rgb == Srgb::new(p[0], p[1], p[2])));
        }
    }

    #[test]
    fn monochrome_output_is_pure() {
        let beads = BeadPalette::standard();
        let img = gradient(10, 10);
        let (out, counts) = quantize(&img, &MonochromeMatcher::new(beads).unwrap(), beads).unwrap();
        assert!(out.pixels().all(|p| (p[0], p[1], p[2]) == (0, 0, 0) || (p[0], p[1], p[2]) == (255, 255, 255)));
        assert_eq!(counts.get(BLACK) + counts.get(WHITE), 100);
    }

    #[test]
    fn counts_serialize_as_map_in_table_order() {
        let beads = BeadPalette::standard();
        let img = RgbaImage::from_fn(3, 1, |x, _| match x {
            0 => Rgba([0, 0, 0, 255]),
            _ => Rgba([255, 255, 255, 255]),
        });
        let (_, counts) = quantize(&img, &NearestBeadMatcher::new(beads), beads).unwrap();
        assert_eq!(serde_json::to_string(&counts).unwrap(), r#"{"White":2,"Black":1}"#);
    }

    #[test]
    fn empty_image_has_no_counts() {
        let beads = BeadPalette::standard();
        let (out, counts) = quantize(&RgbaImage::new(0, 0), &NearestBeadMatcher::new(beads), beads).unwrap();
        assert_eq!(out.dimensions(), (0, 0));
        assert!(counts.is_empty());
    }
}
