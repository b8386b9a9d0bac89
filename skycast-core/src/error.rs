//! Normalized error taxonomy for the acquisition pipeline.
//!
//! Every geolocation, geocoding and provider failure is translated into an
//! [`AcquisitionError`] before it reaches the orchestrator; no raw transport
//! error crosses the client boundary. Cache failures never surface here at
//! all, they degrade to cache misses.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcquisitionError {
    #[error("geolocation is not supported in this environment")]
    UnsupportedEnvironment,

    #[error("location permission denied")]
    PermissionDenied,

    #[error("location information is unavailable")]
    PositionUnavailable,

    #[error("the location request timed out")]
    LocationTimeout,

    #[error("missing or invalid API credential")]
    InvalidCredentials,

    #[error("city not found: {0}")]
    CityNotFound(String),

    #[error("too many requests to the weather service")]
    RateLimited,

    #[error("weather service failed with status {0}")]
    ServerFault(u16),

    #[error("network error: {0}")]
    NetworkFault(String),
}

impl AcquisitionError {
    /// Numeric code compatible with the historical error contract:
    /// geolocation failures use the environment codes 0-3, provider failures
    /// reuse the HTTP status, and anything transport-level is 0.
    pub fn code(&self) -> u16 {
        match self {
            Self::UnsupportedEnvironment => 0,
            Self::PermissionDenied => 1,
            Self::PositionUnavailable => 2,
            Self::LocationTimeout => 3,
            Self::InvalidCredentials => 401,
            Self::CityNotFound(_) => 404,
            Self::RateLimited => 429,
            Self::ServerFault(_) => 500,
            Self::NetworkFault(_) => 0,
        }
    }

    /// Whether repeating the same request can possibly succeed.
    ///
    /// Permission denied never is: repeating the request cannot succeed
    /// without user action outside the app. The same goes for an environment
    /// without geolocation and for a missing credential.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::UnsupportedEnvironment | Self::PermissionDenied | Self::InvalidCredentials
        )
    }

    /// User-facing message for display by a presentation layer.
    ///
    /// The non-retryable geolocation failures steer the user towards manual
    /// city search instead of a dead-end retry.
    pub fn user_message(&self) -> String {
        match self {
            Self::UnsupportedEnvironment => {
                "Geolocation is not available here. Please search for a city instead.".to_string()
            }
            Self::PermissionDenied => {
                "Location permission denied. Please search for a city instead.".to_string()
            }
            Self::PositionUnavailable => "Location information is unavailable.".to_string(),
            Self::LocationTimeout => "The request for your location timed out.".to_string(),
            Self::InvalidCredentials => {
                "The weather API credential is missing or invalid.".to_string()
            }
            Self::CityNotFound(city) => {
                format!("Could not find '{city}'. Please check the spelling and try again.")
            }
            Self::RateLimited => "Too many requests. Please wait a moment and retry.".to_string(),
            Self::ServerFault(_) => "The weather service had an error. Please retry.".to_string(),
            Self::NetworkFault(_) => {
                "A network error occurred. Please check your connection.".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for AcquisitionError {
    fn from(err: reqwest::Error) -> Self {
        Self::NetworkFault(err.to_string())
    }
}
