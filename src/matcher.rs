use palette::Srgb;

use crate::beads::{BLACK, BeadEntry, BeadPalette, WHITE};
use crate::color::{LabWeights, lab_distance, mean_brightness, srgb_to_lab};
use crate::error::MosaicError;
use crate::options::ReductionLevel;

/// Maps an input color to the bead it is recolored with.
pub trait PixelMatcher {
    fn match_color(&self, color: Srgb<u8>) -> Option<&BeadEntry>;
}

/// Nearest bead across the whole table.
///
/// Used for every color mode of the clustering strategy. Recoloring searches
/// the full table, not the optimized palette.
#[derive(Clone, Copy, Debug)]
pub struct NearestBeadMatcher<'a> {
    beads: &'a BeadPalette,
    weights: LabWeights,
}

impl<'a> NearestBeadMatcher<'a> {
    pub fn new(beads: &'a BeadPalette) -> Self {
        NearestBeadMatcher { beads, weights: LabWeights::PERCEPTUAL }
    }

    pub fn with_weights(beads: &'a BeadPalette, weights: LabWeights) -> Self {
        NearestBeadMatcher { beads, weights }
    }
}

impl PixelMatcher for NearestBeadMatcher<'_> {
    fn match_color(&self, color: Srgb<u8>) -> Option<&BeadEntry> {
        self.beads.nearest(&srgb_to_lab(color), self.weights).map(|(entry, _)| entry)
    }
}

/// Black or White by a plain channel-mean threshold.
#[derive(Clone, Copy, Debug)]
pub struct MonochromeMatcher<'a> {
    black: &'a BeadEntry,
    white: &'a BeadEntry,
}

/// Channel mean above which a pixel turns white.
pub const MONOCHROME_THRESHOLD: f64 = 127.0;

impl<'a> MonochromeMatcher<'a> {
    pub fn new(beads: &'a BeadPalette) -> Result<Self, MosaicError> {
        let lookup = |name: &str| beads.get(name).ok_or_else(|| MosaicError::UnknownBead(name.to_string()));
        Ok(MonochromeMatcher { black: lookup(BLACK)?, white: lookup(WHITE)? })
    }
}

impl PixelMatcher for MonochromeMatcher<'_> {
    fn match_color(&self, color: Srgb<u8>) -> Option<&BeadEntry> {
        Some(if mean_brightness(color) > MONOCHROME_THRESHOLD { self.white } else { self.black })
    }
}

/// Threshold-gated matcher over a prefix of a bead table.
///
/// A bead is accepted only when it lies closer than the level's threshold;
/// otherwise the pixel becomes White or Black by brightness.
#[derive(Clone, Debug)]
pub struct ColorMatcher<'a> {
    beads: &'a BeadPalette,
    level: ReductionLevel,
    active: usize,
}

impl<'a> ColorMatcher<'a> {
    pub fn new(beads: &'a BeadPalette, level: ReductionLevel) -> Self {
        let mut matcher = ColorMatcher { beads, level, active: beads.len() };
        matcher.set_reduction_level(level);
        matcher
    }

    /// Matcher over the built-in Hama table.
    pub fn hama(level: ReductionLevel) -> ColorMatcher<'static> {
        ColorMatcher::new(BeadPalette::hama(), level)
    }

    pub fn set_reduction_level(&mut self, level: ReductionLevel) {
        self.level = level;
        self.active = level.slice_len().unwrap_or(self.beads.len()).min(self.beads.len());
    }

    pub fn level(&self) -> ReductionLevel {
        self.level
    }

    /// Beads currently eligible for a thresholded match.
    pub fn active_beads(&self) -> &[BeadEntry] {
        &self.beads.entries()[..self.active]
    }

    /// Matching without the White fallback on faults.
    pub fn try_match(&self, color: Srgb<u8>) -> Result<&'a BeadEntry, MosaicError> {
        let lab = srgb_to_lab(color);
        let threshold = self.level.threshold();

        let mut best: Option<(&'a BeadEntry, f64)> = None;
        for (entry, entry_lab) in self.beads.iter().take(self.active) {
            let d = lab_distance(&lab, entry_lab, LabWeights::BEAD_MATCH);
            if !d.is_finite() {
                return Err(MosaicError::NonFiniteDistance([color.red, color.green, color.blue]));
            }
            if d < threshold && best.is_none_or(|(_, best_d)| d < best_d) {
                best = Some((entry, d));
            }
        }

        if let Some((entry, _)) = best {
            return Ok(entry);
        }

        let brightness = (color.red as f64 * 299.0 + color.green as f64 * 587.0 + color.blue as f64 * 114.0) / 1000.0;
        let name = if brightness > 128.0 { WHITE } else { BLACK };
        self.beads.get(name).ok_or_else(|| MosaicError::UnknownBead(name.to_string()))
    }
}

impl PixelMatcher for ColorMatcher<'_> {
    fn match_color(&self, color: Srgb<u8>) -> Option<&BeadEntry> {
        self.try_match(color).ok().or_else(|| {
            log::warn!("bead match failed for {color:?}, defaulting to white");
            self.beads.get(WHITE)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_searches_whole_table() {
        let m = NearestBeadMatcher::new(BeadPalette::standard());
        assert_eq!(m.match_color(Srgb::new(1, 1, 1)).unwrap().name, BLACK);
        assert_eq!(m.match_color(Srgb::new(120, 120, 130)).unwrap().name, "Grey");
    }

    #[test]
    fn monochrome_threshold_is_exclusive() {
        let m = MonochromeMatcher::new(BeadPalette::standard()).unwrap();
        assert_eq!(m.match_color(Srgb::new(127, 127, 127)).unwrap().name, BLACK);
        assert_eq!(m.match_color(Srgb::new(128, 127, 127)).unwrap().name, WHITE);
    }

    #[test]
    fn monochrome_needs_black_and_white() {
        let table = BeadPalette::new(&crate::beads::STANDARD_BEADS[..5]);
        assert!(matches!(MonochromeMatcher::new(&table), Err(MosaicError::UnknownBead(_))));
    }

    #[test]
    fn level_slices_the_table() {
        let mut m = ColorMatcher::hama(ReductionLevel::High);
        assert_eq!(m.active_beads().len(), 8);
        m.set_reduction_level(ReductionLevel::Medium);
        assert_eq!(m.active_beads().len(), 12);
        m.set_reduction_level(ReductionLevel::Full);
        assert_eq!(m.active_beads().len(), 16);
    }

    #[test]
    fn close_colors_match_within_threshold() {
        let m = ColorMatcher::hama(ReductionLevel::Medium);
        assert_eq!(m.match_color(Srgb::new(230, 40, 40)).unwrap().name, "Red");
        assert_eq!(m.match_color(Srgb::new(254, 254, 254)).unwrap().name, WHITE);
    }

    #[test]
    fn far_colors_fall_back_by_brightness() {
        // Gold lies outside the High slice; nothing else is within 15.
        let m = ColorMatcher::hama(ReductionLevel::High);
        assert_eq!(m.match_color(Srgb::new(212, 175, 85)).unwrap().name, WHITE);
        // Pure black is far from the Hama black (35, 35, 35) under strict weights.
        assert_eq!(m.match_color(Srgb::new(0, 0, 0)).unwrap().name, BLACK);
        assert_eq!(m.match_color(Srgb::new(0, 60, 0)).unwrap().name, BLACK);
    }

    #[test]
    fn missing_fallback_bead_defaults_to_white() {
        // The first eight Hama beads have White but no Black.
        let table = BeadPalette::new(&crate::beads::HAMA_BEADS[..8]);
        let m = ColorMatcher::new(&table, ReductionLevel::High);
        assert!(matches!(m.try_match(Srgb::new(0, 0, 0)), Err(MosaicError::UnknownBead(_))));
        assert_eq!(m.match_color(Srgb::new(0, 0, 0)).unwrap().name, WHITE);
    }
}
