use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::models::visit::Coordinates;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PositionError {
    #[error("location permission denied")]
    Denied,
    #[error("geolocation is not supported")]
    Unsupported,
    #[error("position unavailable: {0}")]
    Unavailable(String),
    #[error("timed out waiting for a position")]
    Timeout,
}

/// Device geolocation. Implementations may prompt the user, so callers bound the wait.
#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn current_position(&self, high_accuracy: bool) -> Result<Coordinates, PositionError>;
}

/// Outcome of the browser's permission prompt, as reported by the page
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ReportedPosition {
    Granted {
        lat: f64,
        lng: f64,
    },
    Denied,
    #[default]
    Unsupported,
}

#[async_trait]
impl PositionSource for ReportedPosition {
    async fn current_position(&self, _high_accuracy: bool) -> Result<Coordinates, PositionError> {
        match *self {
            ReportedPosition::Granted { lat, lng } => {
                if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
                    return Err(PositionError::Unavailable(format!(
                        "coordinates out of range: {}, {}",
                        lat, lng
                    )));
                }
                Ok(Coordinates { lat, lng })
            }
            ReportedPosition::Denied => Err(PositionError::Denied),
            ReportedPosition::Unsupported => Err(PositionError::Unsupported),
        }
    }
}
