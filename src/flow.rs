//! Set-level flow analysis: walk the tracks in play order and report
//! transition quality, mean tempo and energy, and the energy curve.
//!
//! Missing data never aborts the walk. A track without a key yields an
//! `unknown` transition, a track without tempo or energy is left out of the
//! corresponding mean, and the energy curve keeps a `None` in its slot.

use serde::{Deserialize, Serialize};

use crate::camelot::CamelotKey;
use crate::energy::{self, EnergyTier};
use crate::harmonic::{self, TransitionKind};
use crate::model::{self, DjSet, Track};
use crate::tempo::{self, TempoTransition};

/// Tunables for [`analyze_with`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FlowOptions {
    /// Energy fall between consecutive tracks above which a drop is flagged.
    pub energy_drop_threshold: f64,
}

impl Default for FlowOptions {
    fn default() -> Self {
        Self {
            energy_drop_threshold: 0.2,
        }
    }
}

/// The move from the track at `position` to the one at `position + 1`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub position: usize,
    pub from_key: Option<CamelotKey>,
    pub to_key: Option<CamelotKey>,
    pub classification: TransitionKind,
    pub score: f64,
    /// Present only when both tracks have a tempo.
    pub tempo: Option<TempoTransition>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowReport {
    pub transitions: Vec<Transition>,
    pub mean_tempo: Option<f64>,
    pub mean_energy: Option<f64>,
    /// One slot per track, in set order.
    pub energy_curve: Vec<Option<f64>>,
    pub energy_tier: EnergyTier,
    pub energy_drops: Vec<usize>,
    /// Mean transition score; `None` with fewer than two tracks.
    pub harmonic_score: Option<f64>,
    pub total_duration_secs: Option<f64>,
    /// Seconds into the set at which each track starts. Unknown once an
    /// earlier track has no duration.
    pub start_secs: Vec<Option<f64>>,
}

impl FlowReport {
    /// Number of transitions of the given kind.
    pub fn count(&self, kind: TransitionKind) -> usize {
        self.transitions
            .iter()
            .filter(|t| t.classification == kind)
            .count()
    }
}

impl DjSet {
    pub fn analyze(&self) -> FlowReport {
        analyze(&self.tracks)
    }
}

pub fn analyze(tracks: &[Track]) -> FlowReport {
    analyze_with(tracks, &FlowOptions::default())
}

pub fn analyze_with(tracks: &[Track], options: &FlowOptions) -> FlowReport {
    log::debug!("Analyzing flow of {} tracks", tracks.len());

    let transitions: Vec<Transition> = tracks
        .windows(2)
        .enumerate()
        .map(|(position, pair)| transition(position, &pair[0], &pair[1]))
        .collect();

    let energy_curve: Vec<Option<f64>> = tracks.iter().map(|t| t.energy).collect();
    let mean_energy = mean(energy_curve.iter().flatten().copied());

    FlowReport {
        harmonic_score: mean(transitions.iter().map(|t| t.score)),
        transitions,
        mean_tempo: mean(tracks.iter().filter_map(|t| t.tempo)),
        mean_energy,
        energy_drops: energy::detect_drops(&energy_curve, options.energy_drop_threshold),
        energy_curve,
        energy_tier: energy::tier(mean_energy),
        total_duration_secs: model::total_duration(tracks),
        start_secs: start_offsets(tracks),
    }
}

fn start_offsets(tracks: &[Track]) -> Vec<Option<f64>> {
    tracks
        .iter()
        .scan(Some(0.0), |elapsed, t| {
            let start = *elapsed;
            *elapsed = elapsed.zip(t.duration_secs).map(|(e, d)| e + d);
            Some(start)
        })
        .collect()
}

fn transition(position: usize, from: &Track, to: &Track) -> Transition {
    let classification = harmonic::classify(from.key, to.key);
    log::trace!(
        "#{position} {} -> {}: {classification}",
        key_or_dash(from.key),
        key_or_dash(to.key),
    );

    Transition {
        position,
        from_key: from.key,
        to_key: to.key,
        classification,
        score: classification.score(),
        tempo: from
            .tempo
            .zip(to.tempo)
            .map(|(a, b)| tempo::tempo_transition(a, b)),
    }
}

fn key_or_dash(key: Option<CamelotKey>) -> String {
    key.map(|k| k.to_string()).unwrap_or_else(|| "-".to_string())
}

/// Arithmetic mean, `None` for an empty input.
fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: &str, tempo: f64, key: &str, energy: f64) -> Track {
        Track::new(id)
            .with_tempo(tempo)
            .with_key(key)
            .with_energy(energy)
    }

    #[test]
    fn empty_set() {
        let report = analyze(&[]);
        assert!(report.transitions.is_empty());
        assert_eq!(report.mean_tempo, None);
        assert_eq!(report.mean_energy, None);
        assert!(report.energy_curve.is_empty());
        assert_eq!(report.energy_tier, EnergyTier::Unknown);
        assert_eq!(report.harmonic_score, None);
    }

    #[test]
    fn single_track() {
        let report = analyze(&[track("a", 128.0, "8A", 0.6)]);
        assert!(report.transitions.is_empty());
        assert_eq!(report.mean_tempo, Some(128.0));
        assert_eq!(report.mean_energy, Some(0.6));
        assert_eq!(report.energy_curve, vec![Some(0.6)]);
        assert_eq!(report.energy_tier, EnergyTier::High);
    }

    #[test]
    fn three_track_walk() {
        let tracks = [
            track("a", 120.0, "8A", 0.3),
            track("b", 124.0, "9A", 0.5),
            track("c", 128.0, "1A", 0.8),
        ];
        let report = analyze(&tracks);

        assert_eq!(report.transitions.len(), 2);
        let first = &report.transitions[0];
        assert_eq!(first.position, 0);
        assert_eq!(first.classification, TransitionKind::Smooth);
        assert_eq!(first.score, 0.8);
        let second = &report.transitions[1];
        assert_eq!(second.position, 1);
        assert_eq!(second.from_key, CamelotKey::parse("9A"));
        assert_eq!(second.to_key, CamelotKey::parse("1A"));
        assert_eq!(second.classification, TransitionKind::Risky);
        assert_eq!(second.score, 0.5);

        assert_eq!(report.mean_tempo, Some(124.0));
        let mean_energy = report.mean_energy.unwrap();
        assert!((mean_energy - 1.6 / 3.0).abs() < 1e-9);
        assert_eq!(report.energy_curve, vec![Some(0.3), Some(0.5), Some(0.8)]);
        assert!((report.harmonic_score.unwrap() - 0.65).abs() < 1e-9);
        assert_eq!(report.energy_tier, EnergyTier::Medium);
    }

    #[test]
    fn missing_key_does_not_stop_walk() {
        let tracks = [
            track("a", 120.0, "8A", 0.5),
            Track::new("b").with_tempo(122.0),
            track("c", 124.0, "8B", 0.5),
            track("d", 124.0, "8A", 0.5),
        ];
        let report = analyze(&tracks);
        let kinds: Vec<_> = report.transitions.iter().map(|t| t.classification).collect();
        assert_eq!(
            kinds,
            vec![TransitionKind::Unknown, TransitionKind::Unknown, TransitionKind::Perfect]
        );
        assert_eq!(report.transitions[0].score, 0.0);
        assert_eq!(report.count(TransitionKind::Unknown), 2);
    }

    #[test]
    fn absent_values_excluded_from_means() {
        let tracks = [
            Track::new("a").with_tempo(120.0).with_energy(0.2),
            Track::new("b"),
            Track::new("c").with_tempo(130.0),
        ];
        let report = analyze(&tracks);
        assert_eq!(report.mean_tempo, Some(125.0));
        assert_eq!(report.mean_energy, Some(0.2));
        assert_eq!(report.energy_curve, vec![Some(0.2), None, None]);
    }

    #[test]
    fn zero_energy_counts_toward_mean() {
        let tracks = [
            Track::new("a").with_energy(0.0),
            Track::new("b").with_energy(0.6),
        ];
        let report = analyze(&tracks);
        assert_eq!(report.mean_energy, Some(0.3));
        assert_eq!(report.energy_curve, vec![Some(0.0), Some(0.6)]);
    }

    #[test]
    fn no_present_values_gives_none() {
        let report = analyze(&[Track::new("a"), Track::new("b")]);
        assert_eq!(report.mean_tempo, None);
        assert_eq!(report.mean_energy, None);
        assert_eq!(report.energy_curve, vec![None, None]);
        assert_eq!(report.harmonic_score, Some(0.0));
    }

    #[test]
    fn tempo_transition_attached_when_both_known() {
        let tracks = [
            track("a", 120.0, "8A", 0.5),
            track("b", 130.0, "8A", 0.5),
            Track::new("c").with_key("8A"),
        ];
        let report = analyze(&tracks);
        let t = report.transitions[0].tempo.as_ref().unwrap();
        assert_eq!(t.bpm_difference, 10.0);
        assert!(report.transitions[1].tempo.is_none());
    }

    #[test]
    fn huge_tempo_jump_is_reported_without_ramp() {
        let tracks = [
            Track::new("a").with_tempo(100.0),
            Track::new("b").with_tempo(1e12),
        ];
        let report = analyze(&tracks);
        let t = report.transitions[0].tempo.as_ref().unwrap();
        assert_eq!(t.shift, crate::tempo::TempoShift::Extreme);
        assert!(t.intermediate_bpms.is_empty());
        assert_eq!(report.mean_tempo, Some((100.0 + 1e12) / 2.0));
    }

    #[test]
    fn start_offsets_accumulate_durations() {
        let tracks = [
            Track::new("a").with_duration(300.0),
            Track::new("b").with_duration(240.5),
            Track::new("c"),
            Track::new("d").with_duration(200.0),
        ];
        let report = analyze(&tracks);
        assert_eq!(
            report.start_secs,
            vec![Some(0.0), Some(300.0), Some(540.5), None]
        );
        assert!(analyze(&[]).start_secs.is_empty());
    }

    #[test]
    fn energy_drops_use_threshold() {
        let tracks = [
            track("a", 124.0, "8A", 0.9),
            track("b", 124.0, "8A", 0.5),
            track("c", 124.0, "8A", 0.45),
        ];
        assert_eq!(analyze(&tracks).energy_drops, vec![1]);
        let strict = FlowOptions {
            energy_drop_threshold: 0.01,
        };
        assert_eq!(analyze_with(&tracks, &strict).energy_drops, vec![1, 2]);
    }

    #[test]
    fn analyze_is_idempotent() {
        let tracks = [
            track("a", 120.0, "8A", 0.3),
            Track::new("b").with_key("garbage"),
            track("c", 128.0, "1A", 0.8),
        ];
        assert_eq!(analyze(&tracks), analyze(&tracks));
    }

    #[test]
    fn set_analyze_matches_free_function() {
        let set = DjSet::new(vec![track("a", 120.0, "8A", 0.3), track("b", 122.0, "8B", 0.4)]);
        assert_eq!(set.analyze(), analyze(&set.tracks));
    }

    #[test]
    fn report_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Track>();
        assert_send_sync::<FlowReport>();
    }

    #[test]
    fn report_json_shape() {
        let tracks = [track("a", 120.0, "8A", 0.3), Track::new("b")];
        let json = serde_json::to_value(analyze(&tracks)).unwrap();
        assert_eq!(json["meanTempo"], 120.0);
        assert_eq!(json["energyCurve"], serde_json::json!([0.3, null]));
        assert_eq!(json["transitions"][0]["fromKey"], "8A");
        assert!(json["transitions"][0]["toKey"].is_null());
        assert_eq!(json["transitions"][0]["classification"], "unknown");
        assert!(json["totalDurationSecs"].is_null());
        assert_eq!(json["startSecs"], serde_json::json!([0.0, null]));
    }

    #[test]
    fn empty_set_serializes_undefined_means_as_null() {
        let json = serde_json::to_value(analyze(&[])).unwrap();
        assert!(json["meanTempo"].is_null());
        assert!(json["meanEnergy"].is_null());
        assert_eq!(json["transitions"], serde_json::json!([]));
    }
}
