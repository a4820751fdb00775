//! Key compatibility between two tracks on the Camelot wheel.
//!
//! Tiered by ring offset from the outgoing key:
//! - perfect: same key or its relative (offset 0, either mode)
//! - smooth: offset ±1, either mode
//! - risky: offset ±4, either mode
//! - clash: everything else
//!
//! Every consumer that needs a transition verdict goes through here so the
//! wheel offsets live in one place.

use serde::Serialize;

use crate::camelot::CamelotKey;
use crate::model::Track;

/// Ring offsets for the safe tier.
const SAFE_OFFSETS: [i32; 2] = [-1, 1];
/// Ring offsets for the risky tier.
const RISKY_OFFSETS: [i32; 2] = [-4, 4];

/// Quality of a key change between consecutive tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    Perfect,
    Smooth,
    Risky,
    Clash,
    Unknown,
}

impl TransitionKind {
    pub fn score(self) -> f64 {
        match self {
            Self::Perfect => 1.0,
            Self::Smooth => 0.8,
            Self::Risky => 0.5,
            Self::Clash => 0.2,
            Self::Unknown => 0.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Perfect => "perfect",
            Self::Smooth => "smooth",
            Self::Risky => "risky",
            Self::Clash => "clash",
            Self::Unknown => "unknown",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Perfect => "Perfect",
            Self::Smooth => "Smooth",
            Self::Risky => "Risky",
            Self::Clash => "Clash",
            Self::Unknown => "Unknown",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Perfect => "green",
            Self::Smooth => "cyan",
            Self::Risky => "yellow",
            Self::Clash => "red",
            Self::Unknown => "gray",
        }
    }
}

impl std::fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The keys reachable from one key, grouped by tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompatibleKeys {
    /// The key itself, then its relative.
    pub perfect: [CamelotKey; 2],
    /// -1 and +1 in the same mode, then -1 and +1 in the opposite mode.
    pub safe: [CamelotKey; 4],
    /// -4 same mode, -4 opposite mode, +4 same mode, +4 opposite mode.
    pub risky: [CamelotKey; 4],
}

impl CompatibleKeys {
    /// Tier of `to` relative to the key these sets were built from.
    pub fn classify(&self, to: CamelotKey) -> TransitionKind {
        if self.perfect.contains(&to) {
            TransitionKind::Perfect
        } else if self.safe.contains(&to) {
            TransitionKind::Smooth
        } else if self.risky.contains(&to) {
            TransitionKind::Risky
        } else {
            TransitionKind::Clash
        }
    }
}

pub fn compatible_set(key: CamelotKey) -> CompatibleKeys {
    let opposite = key.mode().opposite();
    let [down, up] = SAFE_OFFSETS.map(|o| key.shifted(o));
    let [far_down, far_up] = RISKY_OFFSETS.map(|o| key.shifted(o));

    CompatibleKeys {
        perfect: [key, key.relative()],
        safe: [
            down,
            up,
            down.with_mode(opposite),
            up.with_mode(opposite),
        ],
        risky: [
            far_down,
            far_down.with_mode(opposite),
            far_up,
            far_up.with_mode(opposite),
        ],
    }
}

/// Classify the move from `from` to `to`. Either side absent is `Unknown`.
pub fn classify(from: Option<CamelotKey>, to: Option<CamelotKey>) -> TransitionKind {
    match (from, to) {
        (Some(from), Some(to)) => compatible_set(from).classify(to),
        _ => TransitionKind::Unknown,
    }
}

pub fn score(from: Option<CamelotKey>, to: Option<CamelotKey>) -> f64 {
    classify(from, to).score()
}

/// [`classify`] on raw key strings; unparseable strings count as absent.
pub fn classify_str(from: &str, to: &str) -> TransitionKind {
    classify(CamelotKey::parse(from), CamelotKey::parse(to))
}

pub fn score_str(from: &str, to: &str) -> f64 {
    classify_str(from, to).score()
}

/// Catalog tracks grouped by how well their key follows a given key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompatibleTracks<'a> {
    pub perfect: Vec<&'a Track>,
    pub safe: Vec<&'a Track>,
    pub risky: Vec<&'a Track>,
}

impl CompatibleTracks<'_> {
    pub fn len(&self) -> usize {
        self.perfect.len() + self.safe.len() + self.risky.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Sort `catalog` into the tiers of [`compatible_set`]. Tracks without a key
/// or with a clashing key are dropped; catalog order is kept within a tier.
pub fn compatible_tracks(key: CamelotKey, catalog: &[Track]) -> CompatibleTracks<'_> {
    let compat = compatible_set(key);
    let mut found = CompatibleTracks::default();
    for track in catalog {
        let Some(k) = track.key else { continue };
        match compat.classify(k) {
            TransitionKind::Perfect => found.perfect.push(track),
            TransitionKind::Smooth => found.safe.push(track),
            TransitionKind::Risky => found.risky.push(track),
            TransitionKind::Clash | TransitionKind::Unknown => {}
        }
    }
    found
}

/// Creative key changes: the parallel key, then the subdominant and dominant
/// in the same mode, then both in the opposite mode.
pub fn modal_interchange(key: CamelotKey) -> [CamelotKey; 5] {
    let opposite = key.mode().opposite();
    let subdominant = key.shifted(-1);
    let dominant = key.shifted(1);
    [
        key.relative(),
        subdominant,
        dominant,
        subdominant.with_mode(opposite),
        dominant.with_mode(opposite),
    ]
}
