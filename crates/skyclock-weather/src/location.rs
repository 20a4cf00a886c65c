//! Device position abstraction.
//!
//! The resolver only sees the [`GeolocationSource`] trait; the application
//! wires in a configured fixed position (headless systems have no real
//! geolocation capability), tests wire in whatever they need.

use std::time::Duration;

use async_trait::async_trait;

use crate::types::{Coordinate, GeolocationError};

/// One-shot position query parameters.
#[derive(Debug, Clone, Copy)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    /// Hard deadline for the whole query.
    pub timeout: Duration,
    /// A position cached up to this long ago is acceptable.
    pub max_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(20),
            max_age: Duration::from_secs(1),
        }
    }
}

/// A provider of the device's current position.
#[async_trait]
pub trait GeolocationSource: Send + Sync {
    /// Query the current position once. No retries are performed by callers.
    async fn current_position(
        &self,
        options: PositionOptions,
    ) -> Result<Coordinate, GeolocationError>;
}

/// Position taken from configuration. Absent coordinates mean geolocation is
/// unavailable, which a cycle surfaces as a terminal error.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfiguredPosition {
    coordinate: Option<Coordinate>,
}

impl ConfiguredPosition {
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Self {
        let coordinate = match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinate::new(latitude, longitude)),
            _ => None,
        };
        Self { coordinate }
    }
}

#[async_trait]
impl GeolocationSource for ConfiguredPosition {
    async fn current_position(
        &self,
        _options: PositionOptions,
    ) -> Result<Coordinate, GeolocationError> {
        self.coordinate.ok_or(GeolocationError::Unsupported)
    }
}
