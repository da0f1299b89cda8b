use std::collections::HashMap;

use image::RgbaImage;
use palette::Srgb;

use crate::beads::{BLACK, BeadPalette, WHITE};
use crate::color::{LabWeights, lab_distance, luminance, saturation, srgb_to_lab};
use crate::edges::detect_edges;
use crate::error::MosaicError;
use crate::regions::{EyeShade, Tier, classify_regions, is_eye_pixel, is_skin_tone};
use crate::subject::identify_subject;

pub const SCLERA_BEADS: [&str; 2] = [WHITE, "Cream"];
pub const DARK_EYE_BEADS: [&str; 4] = [BLACK, "Dark Blue", "Brown", "Dark Green"];
pub const LIGHT_EYE_BEADS: [&str; 4] = ["Blue", "Light Blue", "Green", "Light Brown"];
pub const SKIN_TONE_BEADS: [&str; 5] = ["Peach", "Light Pink", "Cream", "Light Brown", "Brown"];

/// Weighted color frequencies, in first-seen order.
#[derive(Clone, Debug, Default)]
pub struct ColorHistogram {
    entries: Vec<(Srgb<u8>, u32)>,
    index: HashMap<[u8; 3], usize>,
}

impl ColorHistogram {
    pub fn add(&mut self, c: Srgb<u8>, weight: u32) {
        let key = [c.red, c.green, c.blue];
        match self.index.get(&key) {
            Some(&i) => self.entries[i].1 += weight,
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push((c, weight));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(Srgb<u8>, u32)] {
        &self.entries
    }
}

/// A group of observed colors and their weights.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColorCluster {
    members: Vec<(Srgb<u8>, u32)>,
}

impl ColorCluster {
    fn seed(color: Srgb<u8>, weight: u32) -> Self {
        ColorCluster { members: vec![(color, weight)] }
    }

    pub fn members(&self) -> &[(Srgb<u8>, u32)] {
        &self.members
    }

    /// Weight-averaged color, each channel rounded to the nearest integer.
    pub fn center(&self) -> Srgb<u8> {
        let (mut r, mut g, mut b, mut total) = (0u64, 0u64, 0u64, 0u64);
        for &(c, w) in &self.members {
            let w = w as u64;
            r += c.red as u64 * w;
            g += c.green as u64 * w;
            b += c.blue as u64 * w;
            total += w;
        }
        if total == 0 {
            return Srgb::new(0, 0, 0);
        }
        let avg = |sum: u64| (sum as f64 / total as f64).round() as u8;
        Srgb::new(avg(r), avg(g), avg(b))
    }
}

/// Greedy clustering: the first `k` colors seed the clusters, every later
/// color joins the cluster whose current center is nearest. Centers are
/// recomputed on each comparison, so input order shapes the result.
///
/// With no more than `k` distinct colors each color is its own cluster.
pub fn cluster_colors(colors: &[(Srgb<u8>, u32)], k: usize) -> Vec<ColorCluster> {
    if colors.len() <= k {
        return colors.iter().map(|&(c, w)| ColorCluster::seed(c, w)).collect();
    }
    if k == 0 {
        return Vec::new();
    }

    let mut clusters: Vec<ColorCluster> = colors[..k].iter().map(|&(c, w)| ColorCluster::seed(c, w)).collect();

    for &(color, weight) in &colors[k..] {
        let lab = srgb_to_lab(color);
        let mut closest = 0;
        let mut min_distance = f64::INFINITY;
        for (i, cluster) in clusters.iter().enumerate() {
            let d = lab_distance(&lab, &srgb_to_lab(cluster.center()), LabWeights::PERCEPTUAL);
            if d < min_distance {
                min_distance = d;
                closest = i;
            }
        }
        clusters[closest].members.push((color, weight));
    }

    clusters
}

/// Number of palette slots handed to each tier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TierBudget {
    pub eye: usize,
    pub face: usize,
    pub subject: usize,
    pub background: usize,
}

impl TierBudget {
    /// Split `n` slots across tiers. Shares are rounded up and granted in
    /// priority order, each capped by what is left, so the total is exactly
    /// `n`; background gets the remainder.
    pub fn allocate(n: usize, is_face: bool, has_eyes: bool) -> Self {
        let share = |fraction: f64| (n as f64 * fraction).ceil() as usize;
        let mut left = n;
        let mut take = |want: usize| {
            let got = want.min(left);
            left -= got;
            got
        };

        let budget = if is_face && has_eyes {
            let eye = take(share(0.3));
            let face = take(share(0.3));
            let subject = take(share(0.25));
            TierBudget { eye, face, subject, background: 0 }
        } else if is_face {
            let face = take(share(0.4));
            let subject = take(share(0.4));
            TierBudget { face, subject, ..Default::default() }
        } else {
            let subject = take(share(0.7));
            TierBudget { subject, ..Default::default() }
        };

        TierBudget { background: left, ..budget }
    }

    pub fn total(&self) -> usize {
        self.eye + self.face + self.subject + self.background
    }
}

/// Pick the bead names that best represent `img` with `num_colors` slots.
///
/// Pixels are weighted by tier (eye, face, subject, background), each tier
/// is clustered on its own budget, and cluster centers are snapped to beads.
/// Eye-like centers snap to eye beads and skin-toned ones to skin beads when
/// relevant. Names come out eye tier first, background last, and may repeat
/// when two clusters land on the same bead. Two colors always yield
/// `[Black, White]`.
pub fn create_optimized_palette(
    img: &RgbaImage,
    num_colors: usize,
    beads: &BeadPalette,
) -> Result<Vec<&'static str>, MosaicError> {
    if num_colors == 2 {
        for name in [BLACK, WHITE] {
            beads.get(name).ok_or_else(|| MosaicError::UnknownBead(name.to_string()))?;
        }
        return Ok(vec![BLACK, WHITE]);
    }

    let edges = detect_edges(img);
    let subject = identify_subject(&edges);
    let regions = classify_regions(img, &subject);

    let mut eye = ColorHistogram::default();
    let mut face = ColorHistogram::default();
    let mut subj = ColorHistogram::default();
    let mut background = ColorHistogram::default();

    for (p, &tier) in img.pixels().zip(regions.tiers.as_slice()) {
        let c = Srgb::new(p[0], p[1], p[2]);
        let histogram = match tier {
            Tier::Eye => &mut eye,
            Tier::Face => &mut face,
            Tier::Subject => &mut subj,
            Tier::Background => &mut background,
        };
        histogram.add(c, tier.weight());
    }

    let has_eyes = regions.is_face && !eye.is_empty();
    let budget = TierBudget::allocate(num_colors, regions.is_face, has_eyes);
    log::debug!(
        "palette budget {:?} from {}/{}/{}/{} distinct colors",
        budget,
        eye.len(),
        face.len(),
        subj.len(),
        background.len()
    );

    let clusters = [
        (&eye, budget.eye),
        (&face, budget.face),
        (&subj, budget.subject),
        (&background, budget.background),
    ]
    .into_iter()
    .flat_map(|(histogram, k)| cluster_colors(histogram.entries(), k));

    clusters
        .map(|cluster| snap_to_bead(cluster.center(), has_eyes, beads))
        .collect()
}

fn snap_to_bead(center: Srgb<u8>, has_eyes: bool, beads: &BeadPalette) -> Result<&'static str, MosaicError> {
    let lab = srgb_to_lab(center);
    let subset: Option<&[&str]> = if has_eyes && is_eye_pixel(luminance(center), saturation(center)) {
        Some(match EyeShade::of(center) {
            EyeShade::Sclera => &SCLERA_BEADS[..],
            EyeShade::Dark => &DARK_EYE_BEADS[..],
            EyeShade::Light => &LIGHT_EYE_BEADS[..],
        })
    } else if is_skin_tone(center) {
        Some(&SKIN_TONE_BEADS[..])
    } else {
        None
    };

    let found = match subset {
        Some(names) => beads.nearest_in(&lab, LabWeights::PERCEPTUAL, names),
        None => beads.nearest(&lab, LabWeights::PERCEPTUAL),
    };
    found.map(|(entry, _)| entry.name).ok_or_else(|| {
        let wanted = subset.map(|names| names.join(", ")).unwrap_or_default();
        MosaicError::UnknownBead(wanted)
    })
}
