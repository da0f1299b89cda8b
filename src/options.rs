use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How many distinct bead colors the mosaic may use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ReductionMode {
    Minimal,
    Basic,
    #[default]
    Standard,
    Detailed,
    Bw,
}

impl ReductionMode {
    pub const ALL: [ReductionMode; 5] = [
        ReductionMode::Minimal,
        ReductionMode::Basic,
        ReductionMode::Standard,
        ReductionMode::Detailed,
        ReductionMode::Bw,
    ];

    pub fn num_colors(self) -> usize {
        match self {
            ReductionMode::Minimal => 4,
            ReductionMode::Basic => 8,
            ReductionMode::Standard => 12,
            ReductionMode::Detailed => 16,
            ReductionMode::Bw => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReductionMode::Minimal => "minimal",
            ReductionMode::Basic => "basic",
            ReductionMode::Standard => "standard",
            ReductionMode::Detailed => "detailed",
            ReductionMode::Bw => "bw",
        }
    }

    /// Lenient parse: unknown names fall back to `Standard`.
    pub fn parse(s: &str) -> Self {
        s.parse().unwrap_or_else(|_| {
            log::warn!("unknown color reduction mode {s:?}, using standard");
            ReductionMode::Standard
        })
    }

    /// Palette slice the threshold matcher works with for this mode.
    pub fn matcher_level(self) -> ReductionLevel {
        match self {
            ReductionMode::Minimal | ReductionMode::Basic | ReductionMode::Bw => ReductionLevel::High,
            ReductionMode::Standard => ReductionLevel::Medium,
            ReductionMode::Detailed => ReductionLevel::Low,
        }
    }
}

impl FromStr for ReductionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReductionMode::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown color reduction mode: {s}"))
    }
}

impl From<String> for ReductionMode {
    fn from(s: String) -> Self {
        ReductionMode::parse(&s)
    }
}

impl fmt::Display for ReductionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reduction level of the threshold matcher: how much of the bead table is
/// searched and how far a match may be.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReductionLevel {
    High,
    Medium,
    Low,
    Full,
}

impl ReductionLevel {
    /// Number of leading bead-table entries searched; `None` means all.
    pub fn slice_len(self) -> Option<usize> {
        match self {
            ReductionLevel::High => Some(8),
            ReductionLevel::Medium => Some(12),
            ReductionLevel::Low => Some(16),
            ReductionLevel::Full => None,
        }
    }

    /// Largest accepted distance under `LabWeights::BEAD_MATCH`.
    pub fn threshold(self) -> f64 {
        match self {
            ReductionLevel::High => 15.0,
            ReductionLevel::Medium => 25.0,
            ReductionLevel::Low => 35.0,
            ReductionLevel::Full => 45.0,
        }
    }
}

/// Which pixel matching strategy drives recoloring.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    /// Region-weighted palette construction, then nearest bead per pixel.
    #[default]
    Clustering,
    /// Fixed Hama table with per-level distance thresholds.
    Threshold,
}

impl FromStr for MatchStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clustering" | "cluster" => Ok(MatchStrategy::Clustering),
            "threshold" | "simple" => Ok(MatchStrategy::Threshold),
            _ => Err(format!("unknown match strategy: {s}")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MosaicOptions {
    #[serde(alias = "colorReduction")]
    pub mode: ReductionMode,
    pub strategy: MatchStrategy,
    /// Contrast-stretch and posterize before matching.
    pub preprocess: bool,
}

impl Default for MosaicOptions {
    fn default() -> Self {
        MosaicOptions {
            mode: ReductionMode::default(),
            strategy: MatchStrategy::default(),
            preprocess: true,
        }
    }
}

impl MosaicOptions {
    pub fn with_mode(mode: ReductionMode) -> Self {
        MosaicOptions { mode, ..Default::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_sizes() {
        let sizes: Vec<usize> = ReductionMode::ALL.iter().map(|m| m.num_colors()).collect();
        assert_eq!(sizes, vec![4, 8, 12, 16, 2]);
        assert_eq!(ReductionMode::default().num_colors(), 12);
    }

    #[test]
    fn unknown_mode_falls_back_to_standard() {
        assert_eq!(ReductionMode::parse("vivid"), ReductionMode::Standard);
        assert_eq!(ReductionMode::parse("Detailed"), ReductionMode::Detailed);
        assert!("vivid".parse::<ReductionMode>().is_err());
    }

    #[test]
    fn options_from_json() {
        let opts: MosaicOptions = serde_json::from_str(r#"{"mode": "bw"}"#).unwrap();
        assert_eq!(opts.mode, ReductionMode::Bw);
        assert_eq!(opts.strategy, MatchStrategy::Clustering);
        assert!(opts.preprocess);

        let opts: MosaicOptions =
            serde_json::from_str(r#"{"colorReduction": "nonsense", "strategy": "threshold", "preprocess": false}"#)
                .unwrap();
        assert_eq!(opts.mode, ReductionMode::Standard);
        assert_eq!(opts.strategy, MatchStrategy::Threshold);
        assert!(!opts.preprocess);
    }

    #[test]
    fn levels() {
        assert_eq!(ReductionLevel::High.slice_len(), Some(8));
        assert_eq!(ReductionLevel::Full.slice_len(), None);
        assert_eq!(ReductionLevel::Medium.threshold(), 25.0);
        assert_eq!(ReductionMode::Detailed.matcher_level(), ReductionLevel::Low);
    }
}
