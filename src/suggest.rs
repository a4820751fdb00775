//! Next-track suggestions and greedy set ordering.
//!
//! Each candidate gets an additive score built from tempo proximity, the
//! energy move the DJ wants, optional targets, genre continuity and the
//! harmonic verdict from [`crate::harmonic`].

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::harmonic::{self, TransitionKind};
use crate::model::Track;
use crate::tempo::{self, TempoShift};

/// Which way the energy should move on the next track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnergyDirection {
    #[default]
    Maintain,
    Boost,
    Drop,
}

/// Points awarded per criterion.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SuggestWeights {
    pub smooth_bpm: f64,
    pub moderate_bpm: f64,
    pub energy: f64,
    pub target_energy: f64,
    pub target_bpm: f64,
    pub same_genre: f64,
    /// Multiplied by the harmonic score (0.0 - 1.0) of the key change.
    pub harmonic: f64,
}

impl Default for SuggestWeights {
    fn default() -> Self {
        Self {
            smooth_bpm: 0.4,
            moderate_bpm: 0.2,
            energy: 0.3,
            target_energy: 0.2,
            target_bpm: 0.1,
            same_genre: 0.1,
            harmonic: 0.3,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SuggestOptions {
    pub direction: EnergyDirection,
    pub target_energy: Option<f64>,
    pub target_bpm: Option<f64>,
    pub weights: SuggestWeights,
    /// Keep only the best N; `None` keeps all.
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Suggestion<'a> {
    pub track: &'a Track,
    pub score: f64,
    pub transition: TransitionKind,
    pub reasons: Vec<&'static str>,
}

/// Score `candidate` as the track to play after `current`.
pub fn score_candidate(
    current: &Track,
    candidate: &Track,
    opts: &SuggestOptions,
) -> (f64, Vec<&'static str>) {
    let w = &opts.weights;
    let mut score = 0.0;
    let mut reasons = Vec::new();

    if let (Some(from), Some(to)) = (current.tempo, candidate.tempo) {
        match tempo::tempo_transition(from, to).shift {
            TempoShift::Smooth => {
                score += w.smooth_bpm;
                reasons.push("smooth_bpm");
            }
            TempoShift::Moderate => {
                score += w.moderate_bpm;
                reasons.push("moderate_bpm");
            }
            TempoShift::Aggressive | TempoShift::Extreme => {}
        }
    }

    if let (Some(from), Some(to)) = (current.energy, candidate.energy) {
        let diff = to - from;
        let hit = match opts.direction {
            EnergyDirection::Maintain => (diff.abs() < 0.1).then_some("matched_energy"),
            EnergyDirection::Boost => (0.1..=0.3).contains(&diff).then_some("energy_boost"),
            EnergyDirection::Drop => (-0.3..=-0.1).contains(&diff).then_some("energy_drop"),
        };
        if let Some(reason) = hit {
            score += w.energy;
            reasons.push(reason);
        }
    }

    if let (Some(target), Some(e)) = (opts.target_energy, candidate.energy) {
        if (e - target).abs() < 0.15 {
            score += w.target_energy;
            reasons.push("target_energy");
        }
    }

    if let (Some(target), Some(bpm)) = (opts.target_bpm, candidate.tempo) {
        if (bpm - target).abs() < 3.0 {
            score += w.target_bpm;
            reasons.push("target_bpm");
        }
    }

    if let (Some(a), Some(b)) = (&current.genre, &candidate.genre) {
        if a.eq_ignore_ascii_case(b) {
            score += w.same_genre;
            reasons.push("same_genre");
        }
    }

    if w.harmonic != 0.0 {
        let kind = harmonic::classify(current.key, candidate.key);
        score += w.harmonic * kind.score();
        match kind {
            TransitionKind::Perfect => reasons.push("harmonic_perfect"),
            TransitionKind::Smooth => reasons.push("harmonic_smooth"),
            _ => {}
        }
    }

    (score, reasons)
}

/// Rank `candidates` as follow-ups to `current`, best first. Candidates that
/// share `current`'s id are skipped. Ties keep catalog order.
pub fn suggest_next<'a>(
    current: &Track,
    candidates: &'a [Track],
    opts: &SuggestOptions,
) -> Vec<Suggestion<'a>> {
    let mut ranked: Vec<Suggestion<'a>> = candidates
        .par_iter()
        .filter(|c| current.id.is_empty() || c.id != current.id)
        .map(|c| {
            let (score, reasons) = score_candidate(current, c, opts);
            Suggestion {
                track: c,
                score,
                transition: harmonic::classify(current.key, c.key),
                reasons,
            }
        })
        .collect();

    sort_desc(&mut ranked, |s| s.score);
    if let Some(limit) = opts.limit {
        ranked.truncate(limit);
    }
    log::debug!(
        "Ranked {} candidates after {:?}",
        ranked.len(),
        current.id
    );
    ranked
}

/// Greedy ordering: open with the most energetic track, then keep taking the
/// best-scoring remaining track with energy held steady.
pub fn optimize_order(tracks: &[Track], weights: &SuggestWeights) -> Vec<Track> {
    if tracks.is_empty() {
        return Vec::new();
    }

    let mut remaining: Vec<&Track> = tracks.iter().collect();
    sort_desc(&mut remaining, |t| t.energy.unwrap_or(0.0));

    let opts = SuggestOptions {
        weights: weights.clone(),
        ..SuggestOptions::default()
    };

    let mut ordered = vec![remaining.remove(0)];
    while !remaining.is_empty() {
        let current = ordered[ordered.len() - 1];
        let scores: Vec<f64> = remaining
            .par_iter()
            .map(|c| score_candidate(current, c, &opts).0)
            .collect();

        // First index wins on ties.
        let best = scores
            .iter()
            .enumerate()
            .fold(0, |best, (i, s)| if *s > scores[best] { i } else { best });
        ordered.push(remaining.remove(best));
    }

    ordered.into_iter().cloned().collect()
}

/// Stable descending sort on an f64 key.
fn sort_desc<T>(items: &mut [T], key: impl Fn(&T) -> f64) {
    items.sort_by(|a, b| {
        key(b)
            .partial_cmp(&key(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}
