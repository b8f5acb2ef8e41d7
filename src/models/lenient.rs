//! Field readers for documents this service does not fully control.
//!
//! Each reader yields `None` for null, missing or wrongly typed values so the
//! owning model can substitute its own default instead of failing the read.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Text(String),
    Int(i64),
    Float(f64),
    Flag(bool),
    Other(IgnoredAny),
}

fn loose<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Loose>, D::Error> {
    Option::<Loose>::deserialize(deserializer)
}

pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match loose(deserializer)? {
        Some(Loose::Text(value)) => Some(value),
        _ => None,
    })
}

/// Any numeric representation, truncated towards zero
pub fn integer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(match loose(deserializer)? {
        Some(Loose::Int(value)) => Some(value),
        Some(Loose::Float(value)) if value.is_finite() => Some(value as i64),
        Some(Loose::Text(value)) => value.trim().parse().ok(),
        _ => None,
    })
}

pub fn float<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(match loose(deserializer)? {
        Some(Loose::Float(value)) if value.is_finite() => Some(value),
        Some(Loose::Int(value)) => Some(value as f64),
        _ => None,
    })
}

pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    Ok(match loose(deserializer)? {
        Some(Loose::Flag(value)) => Some(value),
        _ => None,
    })
}
