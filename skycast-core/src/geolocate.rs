//! Abstraction over the environment's geolocation capability.
//!
//! The orchestrator never talks to a concrete positioning backend; it goes
//! through [`Geolocator`] so front ends can plug in whatever the platform
//! offers, and tests can substitute scripted positions.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::error::AcquisitionError;
use crate::model::Coordinates;

/// Request options passed to the positioning backend.
#[derive(Debug, Clone, Copy)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    pub max_cache_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(15),
            max_cache_age: Duration::from_secs(60),
        }
    }
}

/// Failure delivered by the positioning backend, mirroring the standard
/// geolocation failure codes 1-3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("location information is unavailable")]
    Unavailable,
    #[error("the location request timed out")]
    TimedOut,
}

impl GeolocationError {
    pub fn code(&self) -> u8 {
        match self {
            Self::PermissionDenied => 1,
            Self::Unavailable => 2,
            Self::TimedOut => 3,
        }
    }

    /// Map a raw backend failure code; codes outside 1-3 are treated as the
    /// position being unavailable.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Self::PermissionDenied,
            3 => Self::TimedOut,
            _ => Self::Unavailable,
        }
    }
}

impl From<GeolocationError> for AcquisitionError {
    fn from(err: GeolocationError) -> Self {
        match err {
            GeolocationError::PermissionDenied => AcquisitionError::PermissionDenied,
            GeolocationError::Unavailable => AcquisitionError::PositionUnavailable,
            GeolocationError::TimedOut => AcquisitionError::LocationTimeout,
        }
    }
}

/// Positioning backend: resolves the device's current coordinates exactly
/// once per call, with a single success-or-failure outcome.
#[async_trait]
pub trait Geolocator: Send + Sync + Debug {
    async fn current_position(
        &self,
        options: &PositionOptions,
    ) -> Result<Coordinates, GeolocationError>;
}

/// Geolocator that always reports a fixed position, e.g. a configured home
/// location in environments without a positioning service.
#[derive(Debug, Clone)]
pub struct FixedPosition(pub Coordinates);

#[async_trait]
impl Geolocator for FixedPosition {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Coordinates, GeolocationError> {
        Ok(self.0)
    }
}
