//! Forgiving `deserialize_with` helpers for numeric fields posted by pollers.
//!
//! Numbers may arrive as integers, floats or numeric strings. Anything that
//! cannot be read as a finite number becomes `None` instead of failing the
//! whole payload.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberInput {
    Int(i64),
    Float(f64),
    Text(String),
    Other(#[allow(dead_code)] IgnoredAny),
}

impl NumberInput {
    fn as_f64(&self) -> Option<f64> {
        let value = match self {
            NumberInput::Int(n) => *n as f64,
            NumberInput::Float(f) => *f,
            NumberInput::Text(text) => text.trim().parse::<f64>().ok()?,
            NumberInput::Other(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    /// Fractional values truncate toward zero.
    fn as_i64(&self) -> Option<i64> {
        match self {
            NumberInput::Int(n) => Some(*n),
            NumberInput::Text(text) => match text.trim().parse::<i64>() {
                Ok(n) => Some(n),
                Err(_) => self.as_f64().map(|f| f.trunc() as i64),
            },
            _ => self.as_f64().map(|f| f.trunc() as i64),
        }
    }
}

pub fn optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<NumberInput>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_i64()))
}

pub fn optional_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<NumberInput>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_f64()))
}

/// Like [`optional_i64`], with unreadable values mapped to 0.
pub fn i64_or_zero<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    optional_i64(deserializer).map(|v| v.unwrap_or(0))
}
