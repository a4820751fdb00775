use serde::Serialize;

/// Display tier for a normalized energy value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergyTier {
    Unknown,
    Low,
    Medium,
    High,
    Peak,
}

impl EnergyTier {
    pub fn label(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Peak => "Peak",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Unknown => "gray",
            Self::Low => "green",
            Self::Medium => "yellow",
            Self::High => "orange",
            Self::Peak => "red",
        }
    }
}

impl std::fmt::Display for EnergyTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify an energy value. `None` is `Unknown`; a present `0.0` is a real
/// reading and lands in `Low`. Thresholds are inclusive on the lower bound.
pub fn tier(energy: Option<f64>) -> EnergyTier {
    match energy {
        None => EnergyTier::Unknown,
        Some(e) if e >= 0.8 => EnergyTier::Peak,
        Some(e) if e >= 0.6 => EnergyTier::High,
        Some(e) if e >= 0.4 => EnergyTier::Medium,
        Some(_) => EnergyTier::Low,
    }
}

/// Accept an energy reading only if it is finite and within `[0, 1]`.
pub fn normalize(energy: f64) -> Option<f64> {
    (energy.is_finite() && (0.0..=1.0).contains(&energy)).then_some(energy)
}

/// Positions whose energy fell by more than `threshold` from the last track
/// with a reading. Tracks without a reading are stepped over.
pub fn detect_drops(curve: &[Option<f64>], threshold: f64) -> Vec<usize> {
    let mut drops = Vec::new();
    let mut last: Option<f64> = None;
    for (i, energy) in curve.iter().enumerate() {
        let Some(cur) = *energy else { continue };
        if last.is_some_and(|prev| cur - prev < -threshold) {
            drops.push(i);
        }
        last = Some(cur);
    }
    drops
}
