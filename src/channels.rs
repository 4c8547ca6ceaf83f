use crate::content_path::ContentPathResolver;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// A channel record carries "value" (the authored default) and optionally
// "current_value" (the scene override) plus an optional "image_file" map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChannelValue {
    Float {
        value: f64,
        default_value: f64,
        image_file: Option<String>,
    },
    Bool {
        value: bool,
        default_value: bool,
        image_file: Option<String>,
    },
    Color {
        value: [f64; 3],
        default_value: [f64; 3],
        alpha: f64,
        image_file: Option<String>,
    },
    String {
        value: String,
        default_value: String,
        image_file: Option<String>,
    },
    Image {
        image_file: Option<String>,
    },
}

impl ChannelValue {
    pub fn is_set(&self) -> bool {
        match self {
            ChannelValue::Float {
                value,
                default_value,
                image_file,
            } => value != default_value || image_file.is_some(),
            ChannelValue::Bool {
                value,
                default_value,
                image_file,
            } => value != default_value || image_file.is_some(),
            ChannelValue::Color {
                value,
                default_value,
                image_file,
                ..
            } => value != default_value || image_file.is_some(),
            ChannelValue::String {
                value,
                default_value,
                image_file,
            } => value != default_value || image_file.is_some(),
            ChannelValue::Image { image_file } => image_file.is_some(),
        }
    }

    pub fn image_file(&self) -> Option<&str> {
        match self {
            ChannelValue::Float { image_file, .. }
            | ChannelValue::Bool { image_file, .. }
            | ChannelValue::Color { image_file, .. }
            | ChannelValue::String { image_file, .. }
            | ChannelValue::Image { image_file } => image_file.as_deref(),
        }
    }

    pub fn as_rgba(&self) -> Option<(f64, f64, f64, f64)> {
        match self {
            ChannelValue::Color { value, alpha, .. } => {
                Some((value[0], value[1], value[2], *alpha))
            }
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            ChannelValue::Color { value, alpha, .. } => {
                Some((value[0] + value[1] + value[2]) / 3.0 * alpha)
            }
            _ => None,
        }
    }
}

pub fn map_channel(record: &Value, paths: &mut ContentPathResolver) -> ChannelValue {
    let image_file = resolve_image(record, paths);
    match record.get("type").and_then(Value::as_str).unwrap_or_default() {
        "float_color" | "color" => {
            let default_value = color3(record.get("value")).unwrap_or([0.0; 3]);
            let value = color3(record.get("current_value")).unwrap_or(default_value);
            ChannelValue::Color {
                value,
                default_value,
                alpha: 1.0,
                image_file,
            }
        }
        "float" | "int" | "enum" => {
            let default_value = float_of(record.get("value")).unwrap_or(0.0);
            let value = float_of(record.get("current_value")).unwrap_or(default_value);
            ChannelValue::Float {
                value,
                default_value,
                image_file,
            }
        }
        "bool" => {
            let default_value = bool_of(record.get("value")).unwrap_or(false);
            let value = bool_of(record.get("current_value")).unwrap_or(default_value);
            ChannelValue::Bool {
                value,
                default_value,
                image_file,
            }
        }
        "image" => ChannelValue::Image { image_file },
        _ => {
            let default_value = text_of(record.get("value")).unwrap_or_default();
            let value =
                text_of(record.get("current_value")).unwrap_or_else(|| default_value.clone());
            ChannelValue::String {
                value,
                default_value,
                image_file,
            }
        }
    }
}

fn resolve_image(record: &Value, paths: &mut ContentPathResolver) -> Option<String> {
    let raw = record.get("image_file").and_then(Value::as_str)?;
    match paths.resolve(raw) {
        Ok(found) => found.map(|path| path.to_string_lossy().to_string()),
        // Without content roots the channel simply stays imageless; the
        // caller reports the miss once per resolve.
        Err(_) => None,
    }
}

// Colors are stored as arrays; anything past the first three components
// (alpha, padding) is dropped.
fn color3(value: Option<&Value>) -> Option<[f64; 3]> {
    let parts = value?.as_array()?;
    if parts.len() < 3 {
        return None;
    }
    Some([
        parts[0].as_f64()?,
        parts[1].as_f64()?,
        parts[2].as_f64()?,
    ])
}

fn float_of(value: Option<&Value>) -> Option<f64> {
    value?.as_f64()
}

fn bool_of(value: Option<&Value>) -> Option<bool> {
    let value = value?;
    value.as_bool().or_else(|| value.as_f64().map(|n| n != 0.0))
}

fn text_of(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) => Some(text.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

pub fn channel_id(record: &Value) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

// First-class channel groups are object members shaped { "channel": {...} };
// the record id falls back to the member key.
pub fn first_level_channels(material: &Value) -> Vec<(String, &Value)> {
    let mut out = Vec::new();
    let Some(members) = material.as_object() else {
        return out;
    };
    for (key, member) in members {
        if let Some(record) = member.get("channel")
            && record.is_object()
        {
            let id = channel_id(record).unwrap_or(key).to_string();
            out.push((id, record));
        }
    }
    out
}

// "extra" blocks carry flat channel lists; entries either wrap the record in
// a "channel" member or are the record itself.
pub fn extra_channels(record: &Value) -> Vec<(String, &Value)> {
    let mut out = Vec::new();
    let Some(extras) = record.get("extra").and_then(Value::as_array) else {
        return out;
    };
    for extra in extras {
        let Some(entries) = extra.get("channels").and_then(Value::as_array) else {
            continue;
        };
        for entry in entries {
            let record = entry
                .get("channel")
                .filter(|wrapped| wrapped.is_object())
                .unwrap_or(entry);
            if let Some(id) = channel_id(record) {
                out.push((id.to_string(), record));
            }
        }
    }
    out
}
