use serde::Serialize;

/// Tempo step used when suggesting a ramp between two BPMs.
const RAMP_STEP_BPM: f64 = 3.0;

/// Largest change a ramp is offered for. Wider gaps get no stepping stones.
const MAX_RAMP_BPM: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TempoShift {
    Smooth,
    Moderate,
    Aggressive,
    Extreme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    VeryHard,
}

/// How hard it is to beatmatch from one tempo to another.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TempoTransition {
    pub shift: TempoShift,
    pub difficulty: Difficulty,
    /// Signed: positive when speeding up.
    pub bpm_difference: f64,
    /// Stepping stones for a gradual ramp; empty for small changes and for
    /// gaps wider than a ramp can bridge.
    pub intermediate_bpms: Vec<f64>,
    pub recommended: bool,
}

pub fn tempo_transition(from_bpm: f64, to_bpm: f64) -> TempoTransition {
    let diff = to_bpm - from_bpm;
    let abs_diff = diff.abs();

    let (shift, difficulty) = if abs_diff < 2.0 {
        (TempoShift::Smooth, Difficulty::Easy)
    } else if abs_diff < 5.0 {
        (TempoShift::Moderate, Difficulty::Medium)
    } else if abs_diff < 10.0 {
        (TempoShift::Aggressive, Difficulty::Hard)
    } else {
        (TempoShift::Extreme, Difficulty::VeryHard)
    };

    let intermediate_bpms = if abs_diff > 5.0 && abs_diff <= MAX_RAMP_BPM {
        let steps = (abs_diff / RAMP_STEP_BPM).floor() as u32;
        let direction = diff.signum();
        (1..=steps)
            .map(|i| from_bpm + direction * RAMP_STEP_BPM * f64::from(i))
            .collect()
    } else {
        Vec::new()
    };

    TempoTransition {
        shift,
        difficulty,
        bpm_difference: diff,
        intermediate_bpms,
        recommended: abs_diff < 5.0,
    }
}
