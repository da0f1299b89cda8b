use std::sync::OnceLock;

use palette::Srgb;

use crate::color::{LabColor, LabWeights, lab_distance, srgb_to_lab};

/// One physically available bead color. `name` is the stable identifier.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BeadEntry {
    pub name: &'static str,
    pub rgb: Srgb<u8>,
}

const fn bead(name: &'static str, r: u8, g: u8, b: u8) -> BeadEntry {
    BeadEntry { name, rgb: Srgb::new(r, g, b) }
}

pub const WHITE: &str = "White";
pub const BLACK: &str = "Black";

/// General bead set used by the clustering strategy.
pub const STANDARD_BEADS: [BeadEntry; 19] = [
    bead(WHITE, 255, 255, 255),
    bead("Cream", 255, 253, 208),
    bead("Peach", 255, 218, 185),
    bead("Light Pink", 255, 182, 193),
    bead("Pink", 255, 192, 203),
    bead("Yellow", 255, 255, 0),
    bead("Orange", 255, 128, 0),
    bead("Red", 255, 0, 0),
    bead("Purple", 128, 0, 128),
    bead("Dark Blue", 0, 0, 139),
    bead("Blue", 0, 0, 255),
    bead("Light Blue", 173, 216, 230),
    bead("Green", 0, 255, 0),
    bead("Dark Green", 0, 100, 0),
    bead("Brown", 139, 69, 19),
    bead("Light Brown", 205, 133, 63),
    bead("Light Grey", 192, 192, 192),
    bead("Grey", 128, 128, 128),
    bead(BLACK, 0, 0, 0),
];

/// Hama set tuned for real-world bead appearance, used by the threshold
/// matcher. Order matters: reduction levels take prefixes of it.
pub const HAMA_BEADS: [BeadEntry; 16] = [
    bead(WHITE, 255, 255, 255),
    bead("Cream", 238, 232, 215),
    bead("Yellow", 255, 215, 0),
    bead("Orange", 255, 102, 0),
    bead("Red", 230, 40, 40),
    bead("Pink", 255, 155, 180),
    bead("Purple", 147, 80, 158),
    bead("Blue", 45, 110, 200),
    bead("Light Blue", 100, 180, 210),
    bead("Green", 90, 170, 80),
    bead("Light Green", 150, 200, 120),
    bead("Brown", 139, 90, 60),
    bead("Grey", 145, 145, 145),
    bead(BLACK, 35, 35, 35),
    bead("Clear", 230, 230, 230),
    bead("Gold", 212, 175, 85),
];

/// An ordered bead table with Lab values precomputed per entry.
#[derive(Clone, Debug)]
pub struct BeadPalette {
    entries: Vec<BeadEntry>,
    labs: Vec<LabColor>,
}

impl BeadPalette {
    pub fn new(entries: &[BeadEntry]) -> Self {
        let labs = entries.iter().map(|e| srgb_to_lab(e.rgb)).collect();
        BeadPalette { entries: entries.to_vec(), labs }
    }

    /// Shared, lazily built table of [`STANDARD_BEADS`].
    pub fn standard() -> &'static BeadPalette {
        static STANDARD: OnceLock<BeadPalette> = OnceLock::new();
        STANDARD.get_or_init(|| BeadPalette::new(&STANDARD_BEADS))
    }

    /// Shared, lazily built table of [`HAMA_BEADS`].
    pub fn hama() -> &'static BeadPalette {
        static HAMA: OnceLock<BeadPalette> = OnceLock::new();
        HAMA.get_or_init(|| BeadPalette::new(&HAMA_BEADS))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[BeadEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BeadEntry, &LabColor)> {
        self.entries.iter().zip(self.labs.iter())
    }

    pub fn get(&self, name: &str) -> Option<&BeadEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name)
    }

    /// Nearest entry to `lab` among those accepted by `filter`.
    ///
    /// Ties keep the entry met first in table order. Returns `None` when no
    /// entry passes the filter.
    pub fn nearest_by<F>(&self, lab: &LabColor, weights: LabWeights, mut filter: F) -> Option<(&BeadEntry, f64)>
    where
        F: FnMut(&BeadEntry) -> bool,
    {
        let mut best: Option<(&BeadEntry, f64)> = None;
        for (entry, entry_lab) in self.iter() {
            if !filter(entry) {
                continue;
            }
            let d = lab_distance(lab, entry_lab, weights);
            if best.is_none_or(|(_, best_d)| d < best_d) {
                best = Some((entry, d));
            }
        }
        best
    }

    /// Nearest entry across the whole table.
    pub fn nearest(&self, lab: &LabColor, weights: LabWeights) -> Option<(&BeadEntry, f64)> {
        self.nearest_by(lab, weights, |_| true)
    }

    /// Nearest entry restricted to the named subset.
    pub fn nearest_in(&self, lab: &LabColor, weights: LabWeights, names: &[&str]) -> Option<(&BeadEntry, f64)> {
        self.nearest_by(lab, weights, |e| names.contains(&e.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::rgb_to_lab;

    #[test]
    fn names_are_unique() {
        for table in [&STANDARD_BEADS[..], &HAMA_BEADS[..]] {
            for (i, a) in table.iter().enumerate() {
                for b in &table[i + 1..] {
                    assert_ne!(a.name, b.name);
                }
            }
        }
    }

    #[test]
    fn exact_color_matches_itself() {
        let palette = BeadPalette::standard();
        for entry in palette.entries() {
            let lab = srgb_to_lab(entry.rgb);
            let (found, d) = palette.nearest(&lab, LabWeights::PERCEPTUAL).unwrap();
            assert_eq!(found.name, entry.name);
            assert_eq!(d, 0.0);
        }
    }

    #[test]
    fn subset_search_ignores_other_entries() {
        let palette = BeadPalette::standard();
        let lab = rgb_to_lab(255, 0, 0);
        let (found, _) = palette
            .nearest_in(&lab, LabWeights::PERCEPTUAL, &[WHITE, "Cream"])
            .unwrap();
        assert!(found.name == WHITE || found.name == "Cream");
        assert!(palette.nearest_in(&lab, LabWeights::PERCEPTUAL, &["Magenta"]).is_none());
    }

    #[test]
    fn lookup_by_name() {
        let palette = BeadPalette::hama();
        assert_eq!(palette.len(), 16);
        assert_eq!(palette.get(BLACK).unwrap().rgb, Srgb::new(35, 35, 35));
        assert_eq!(palette.position("Gold"), Some(15));
        assert!(palette.get("Dark Blue").is_none());
    }
}
