use serde_json::Value;
use std::path::Path;

use crate::error::{FlowError, Result};
use crate::model::{DjSet, Track};

/// On-disk encodings a set or catalog can be read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetFormat {
    Json,
    Yaml,
    Toml,
}

impl SetFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "toml" => Ok(Self::Toml),
            _ => Err(FlowError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Parse a set from text. Accepts `{ "name"?, "tracks": [...] }` or a bare
/// array of tracks.
pub fn parse_set(text: &str, format: SetFormat) -> Result<DjSet> {
    let doc = parse_document(text, format)?;
    set_from_value(doc)
}

/// Read a set from a file, choosing the format by extension.
pub fn load_set(path: &Path) -> Result<DjSet> {
    let format = SetFormat::from_path(path)?;
    let text = std::fs::read_to_string(path)?;
    let set = parse_set(&text, format)?;
    log::debug!("Loaded {} tracks from {}", set.tracks.len(), path.display());
    Ok(set)
}

/// A catalog has the same shape as a set; only the tracks matter.
pub fn load_catalog(path: &Path) -> Result<Vec<Track>> {
    Ok(load_set(path)?.tracks)
}

fn parse_document(text: &str, format: SetFormat) -> Result<Value> {
    Ok(match format {
        SetFormat::Json => serde_json::from_str(text)?,
        SetFormat::Yaml => serde_yaml::from_str(text)?,
        SetFormat::Toml => toml::from_str(text)?,
    })
}

/// Validate the container shape, then read each track leniently.
pub fn set_from_value(doc: Value) -> Result<DjSet> {
    let (name, tracks) = match doc {
        Value::Array(items) => (None, items),
        Value::Object(mut map) => {
            let name = map
                .remove("name")
                .and_then(|v| v.as_str().map(str::to_string));
            match map.remove("tracks") {
                Some(Value::Array(items)) => (name, items),
                Some(other) => {
                    return Err(FlowError::InvalidArgument(format!(
                        "`tracks` must be an ordered list, got {}",
                        type_name(&other)
                    )));
                }
                None => {
                    return Err(FlowError::InvalidArgument(
                        "set has no `tracks` list".to_string(),
                    ));
                }
            }
        }
        other => {
            return Err(FlowError::InvalidArgument(format!(
                "expected a set or a list of tracks, got {}",
                type_name(&other)
            )));
        }
    };

    let tracks = tracks
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            if !item.is_object() {
                return Err(FlowError::InvalidArgument(format!(
                    "track #{i} must be an object, got {}",
                    type_name(&item)
                )));
            }
            Ok(serde_json::from_value::<Track>(item)?)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(DjSet { name, tracks })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
