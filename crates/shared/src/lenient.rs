//! Tolerant decoders for backend records. Descriptive fields may arrive as
//! `null` or with a looser JSON type than the one the portal displays.

use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize};

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

/// `null` becomes `T::default()`.
pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Any scalar rendered as text; `null` becomes empty.
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Scalar>::deserialize(deserializer)? {
        None => String::new(),
        Some(Scalar::Text(value)) => value,
        Some(Scalar::Int(value)) => value.to_string(),
        Some(Scalar::Float(value)) => value.to_string(),
        Some(Scalar::Bool(value)) => value.to_string(),
    })
}

/// An integer sent as a number or a numeric string.
pub fn integer<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Scalar::deserialize(deserializer)? {
        Scalar::Int(value) => Ok(value),
        Scalar::Float(value) if value.fract() == 0.0 => Ok(value as i64),
        Scalar::Text(raw) => raw
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("expected an integer, got `{raw}`"))),
        Scalar::Float(value) => Err(de::Error::custom(format!(
            "expected an integer, got {value}"
        ))),
        Scalar::Bool(value) => Err(de::Error::custom(format!(
            "expected an integer, got {value}"
        ))),
    }
}

/// Like [`integer`], with `null` or an unparsable value read as zero.
pub fn integer_or_zero<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Scalar>::deserialize(deserializer)? {
        Some(Scalar::Int(value)) => value,
        Some(Scalar::Float(value)) => value as i64,
        Some(Scalar::Text(raw)) => raw.trim().parse::<f64>().map(|v| v as i64).unwrap_or(0),
        Some(Scalar::Bool(_)) | None => 0,
    })
}

/// Monetary amount as the backend sent it: a JSON number or a decimal string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(f64),
    Text(String),
}

impl Default for Amount {
    fn default() -> Self {
        Amount::Number(0.0)
    }
}

impl From<f64> for Amount {
    fn from(value: f64) -> Self {
        Amount::Number(value)
    }
}

impl Amount {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Amount::Number(value) => Some(*value),
            Amount::Text(raw) => raw.trim().parse().ok(),
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Amount::Number(value) => write!(f, "{value}"),
            Amount::Text(raw) => f.write_str(raw.trim()),
        }
    }
}
