use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// A scalar reading exactly as the feed sent it.
///
/// Upstream stations write `"s/i"` for "no information" and sometimes ship
/// numbers as strings, so a reading is kept raw and interpreted on demand.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Measurement {
    #[default]
    Missing,
    Number(f64),
    Text(String),
}

impl Measurement {
    /// Strictly numeric: only JSON numbers count.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Measurement::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    /// Numeric after coercion: JSON numbers, or text that parses as a float.
    ///
    /// Blank text, NaN and infinities are never numbers.
    pub fn coerce(&self) -> Option<f64> {
        match self {
            Measurement::Number(n) => n.is_finite().then_some(*n),
            Measurement::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return None;
                }
                s.parse::<f64>().ok().filter(|n| n.is_finite())
            }
            Measurement::Missing => None,
        }
    }

    /// The raw value as display text; empty when missing.
    pub fn label(&self) -> String {
        match self {
            Measurement::Missing => String::new(),
            Measurement::Number(n) => format_number(*n),
            Measurement::Text(s) => s.clone(),
        }
    }

    /// Like [`Measurement::label`] but with a placeholder for missing values.
    pub fn label_or(&self, placeholder: &str) -> String {
        match self {
            Measurement::Missing => placeholder.to_string(),
            other => other.label(),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Measurement::Missing)
    }
}

impl From<f64> for Measurement {
    fn from(n: f64) -> Self {
        Measurement::Number(n)
    }
}

impl From<&str> for Measurement {
    fn from(s: &str) -> Self {
        Measurement::Text(s.to_string())
    }
}

/// Shortest round-trip text for a reading; integral values carry no fraction.
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        // Avoid "-0".
        return "0".to_string();
    }
    n.to_string()
}

impl<'de> Deserialize<'de> for Measurement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_f64().map_or(Measurement::Missing, Measurement::Number),
            Value::String(s) => Measurement::Text(s),
            Value::Bool(b) => Measurement::Text(b.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) => Measurement::Missing,
        })
    }
}

impl Serialize for Measurement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Measurement::Missing => serializer.serialize_none(),
            Measurement::Number(n) => serializer.serialize_f64(*n),
            Measurement::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// Deserializes any scalar into text; `null`, arrays and objects become `None`.
pub(crate) fn lenient_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    })
}
