//! Track and set values handed to the engine by the catalog layer.
//!
//! Per-track fields are lenient: a value of the wrong type or outside its
//! valid range deserializes as absent instead of failing the whole set.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::camelot::CamelotKey;
use crate::energy;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "TrackRecord")]
pub struct Track {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    /// Beats per minute.
    pub tempo: Option<f64>,
    pub key: Option<CamelotKey>,
    /// Normalized to `[0, 1]`.
    pub energy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
}

/// Wire shape of a track. Alternate spellings are separate fields; the first
/// present one wins.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackRecord {
    #[serde(default, deserialize_with = "id_field")]
    id: String,
    #[serde(default, deserialize_with = "text_field")]
    title: Option<String>,
    #[serde(default, deserialize_with = "text_field")]
    artist: Option<String>,
    #[serde(default, deserialize_with = "text_field")]
    genre: Option<String>,
    #[serde(default, deserialize_with = "positive_field")]
    tempo: Option<f64>,
    #[serde(default, deserialize_with = "positive_field")]
    bpm: Option<f64>,
    #[serde(default, deserialize_with = "key_field")]
    key: Option<CamelotKey>,
    #[serde(default, deserialize_with = "energy_field")]
    energy: Option<f64>,
    #[serde(default, deserialize_with = "positive_field")]
    duration_secs: Option<f64>,
    #[serde(default, rename = "duration_secs", deserialize_with = "positive_field")]
    duration_secs_snake: Option<f64>,
    #[serde(default, deserialize_with = "positive_field")]
    duration: Option<f64>,
}

impl From<TrackRecord> for Track {
    fn from(r: TrackRecord) -> Self {
        Self {
            id: r.id,
            title: r.title,
            artist: r.artist,
            genre: r.genre,
            tempo: r.tempo.or(r.bpm),
            key: r.key,
            energy: r.energy,
            duration_secs: r.duration_secs.or(r.duration_secs_snake).or(r.duration),
        }
    }
}

impl Track {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn with_tempo(mut self, bpm: f64) -> Self {
        self.tempo = (bpm.is_finite() && bpm > 0.0).then_some(bpm);
        self
    }

    /// Unparseable keys leave the track without a key.
    pub fn with_key(mut self, key: &str) -> Self {
        self.key = CamelotKey::parse(key);
        self
    }

    pub fn with_energy(mut self, energy: f64) -> Self {
        self.energy = energy::normalize(energy);
        self
    }

    pub fn with_duration(mut self, secs: f64) -> Self {
        self.duration_secs = (secs.is_finite() && secs > 0.0).then_some(secs);
        self
    }

    /// "Artist - Title", falling back to whichever is present, then the id.
    pub fn display_name(&self) -> String {
        match (&self.artist, &self.title) {
            (Some(a), Some(t)) => format!("{a} - {t}"),
            (None, Some(t)) => t.clone(),
            (Some(a), None) => a.clone(),
            (None, None) => self.id.clone(),
        }
    }
}

/// An ordered set of tracks in performance order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DjSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub tracks: Vec<Track>,
}

impl DjSet {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self { name: None, tracks }
    }

    /// Sum of known track durations, `None` if no track has one.
    pub fn total_duration_secs(&self) -> Option<f64> {
        total_duration(&self.tracks)
    }
}

pub(crate) fn total_duration(tracks: &[Track]) -> Option<f64> {
    let mut durations = tracks.iter().filter_map(|t| t.duration_secs).peekable();
    durations.peek()?;
    Some(durations.sum())
}

fn id_field<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

fn text_field<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        _ => None,
    })
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn positive_field<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(number(&value).filter(|v| v.is_finite() && *v > 0.0))
}

fn energy_field<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    let value = Value::deserialize(d)?;
    let parsed = number(&value);
    if parsed.is_some_and(|e| energy::normalize(e).is_none()) {
        log::debug!("Energy {value} outside [0, 1], treating as absent");
    }
    Ok(parsed.and_then(energy::normalize))
}

fn key_field<'de, D: Deserializer<'de>>(d: D) -> Result<Option<CamelotKey>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => {
            let key = CamelotKey::parse(&s);
            if key.is_none() && !s.trim().is_empty() {
                log::debug!("Unrecognized key {s:?}, treating as absent");
            }
            key
        }
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_full_track() {
        let json = r#"{
            "id": "t1", "title": "Strobe", "artist": "deadmau5", "genre": "progressive",
            "tempo": 128, "key": "8A", "energy": 0.6, "durationSecs": 600
        }"#;
        let t: Track = serde_json::from_str(json).unwrap();
        assert_eq!(t.id, "t1");
        assert_eq!(t.tempo, Some(128.0));
        assert_eq!(t.key, CamelotKey::parse("8A"));
        assert_eq!(t.energy, Some(0.6));
        assert_eq!(t.duration_secs, Some(600.0));
        assert_eq!(t.display_name(), "deadmau5 - Strobe");
    }

    #[test]
    fn missing_fields_are_absent() {
        let t: Track = serde_json::from_str(r#"{"id": "x"}"#).unwrap();
        assert_eq!(t, Track::new("x"));
    }

    #[test]
    fn wrong_types_degrade_to_absent() {
        let json = r#"{"id": 42, "title": 7, "tempo": "fast", "key": 8, "energy": "high"}"#;
        let t: Track = serde_json::from_str(json).unwrap();
        assert_eq!(t.id, "42");
        assert_eq!(t.title, None);
        assert_eq!(t.tempo, None);
        assert_eq!(t.key, None);
        assert_eq!(t.energy, None);
    }

    #[test]
    fn out_of_range_values_are_absent() {
        let json = r#"{"id": "x", "tempo": -120, "key": "14A", "energy": 1.5, "duration": 0}"#;
        let t: Track = serde_json::from_str(json).unwrap();
        assert_eq!(t.tempo, None);
        assert_eq!(t.key, None);
        assert_eq!(t.energy, None);
        assert_eq!(t.duration_secs, None);
    }

    #[test]
    fn zero_energy_is_kept() {
        let t: Track = serde_json::from_str(r#"{"id": "x", "energy": 0}"#).unwrap();
        assert_eq!(t.energy, Some(0.0));
    }

    #[test]
    fn aliases_and_numeric_strings() {
        let t: Track =
            serde_json::from_str(r#"{"id": "x", "bpm": "124.5", "key": "F#m", "duration": 300}"#)
                .unwrap();
        assert_eq!(t.tempo, Some(124.5));
        assert_eq!(t.key, CamelotKey::parse("11A"));
        assert_eq!(t.duration_secs, Some(300.0));
    }

    #[test]
    fn both_spellings_prefer_canonical() {
        let json = r#"{"id": "x", "tempo": 120, "bpm": 126, "durationSecs": 300, "duration": 240}"#;
        let t: Track = serde_json::from_str(json).unwrap();
        assert_eq!(t.tempo, Some(120.0));
        assert_eq!(t.duration_secs, Some(300.0));

        let json = r#"{"id": "y", "tempo": "fast", "bpm": 126, "duration_secs": 200, "duration": 240}"#;
        let t: Track = serde_json::from_str(json).unwrap();
        assert_eq!(t.tempo, Some(126.0));
        assert_eq!(t.duration_secs, Some(200.0));
    }

    #[test]
    fn null_fields_are_absent() {
        let t: Track =
            serde_json::from_str(r#"{"id": "x", "tempo": null, "key": null, "energy": null}"#)
                .unwrap();
        assert_eq!(t.tempo, None);
        assert_eq!(t.key, None);
        assert_eq!(t.energy, None);
    }

    #[test]
    fn builders_validate() {
        let t = Track::new("a")
            .with_tempo(0.0)
            .with_key("nonsense")
            .with_energy(2.0)
            .with_duration(-1.0);
        assert_eq!(t, Track::new("a"));
    }

    #[test]
    fn set_duration_sums_known_values() {
        let set = DjSet::new(vec![
            Track::new("a").with_duration(200.0),
            Track::new("b"),
            Track::new("c").with_duration(100.0),
        ]);
        assert_eq!(set.total_duration_secs(), Some(300.0));
        assert_eq!(DjSet::new(vec![Track::new("a")]).total_duration_secs(), None);
    }

    #[test]
    fn serializes_key_as_code() {
        let t = Track::new("a").with_key("Am");
        let v = serde_json::to_value(&t).unwrap();
        assert_eq!(v["key"], "8A");
        assert!(v["energy"].is_null());
    }
}
