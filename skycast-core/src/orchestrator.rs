//! Acquisition state machine.
//!
//! Owns the phase the dashboard is in (idle, requesting location, loading
//! weather, success, error) and drives the geolocation and provider calls.
//! The state is exposed read-only; presentation layers only call the four
//! actions: `request_location`, `search_city`, `set_unit`, `retry`.
//!
//! Each action supersedes any outstanding one via a generation counter, so a
//! late completion from an older request never overwrites newer state.

use std::sync::{Mutex, MutexGuard};

use crate::client::WeatherClient;
use crate::error::AcquisitionError;
use crate::geolocate::{Geolocator, PositionOptions};
use crate::model::{UnitSystem, WeatherSnapshot};

/// Discrete phase of the acquisition pipeline; exactly one variant is live
/// at a time, carrying only the data valid for that phase.
#[derive(Debug, Clone)]
pub enum AcquisitionState {
    Idle,
    RequestingLocation,
    LoadingWeather,
    Success(WeatherSnapshot),
    Error(AcquisitionError),
}

impl AcquisitionState {
    /// True while an underlying operation is outstanding.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::RequestingLocation | Self::LoadingWeather)
    }
}

#[derive(Debug)]
struct Shared {
    state: AcquisitionState,
    unit: UnitSystem,
    generation: u64,
}

#[derive(Debug)]
pub struct Orchestrator {
    client: WeatherClient,
    geolocator: Option<Box<dyn Geolocator>>,
    options: PositionOptions,
    shared: Mutex<Shared>,
}

impl Orchestrator {
    /// `geolocator: None` models an environment without any positioning
    /// capability; `request_location` then fails as unsupported.
    pub fn new(client: WeatherClient, geolocator: Option<Box<dyn Geolocator>>) -> Self {
        Self {
            client,
            geolocator,
            options: PositionOptions::default(),
            shared: Mutex::new(Shared {
                state: AcquisitionState::Idle,
                unit: UnitSystem::default(),
                generation: 0,
            }),
        }
    }

    pub fn with_position_options(mut self, options: PositionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn state(&self) -> AcquisitionState {
        self.lock().state.clone()
    }

    pub fn unit(&self) -> UnitSystem {
        self.lock().unit
    }

    /// Update the unit preference. A pure local update in every phase: an
    /// already displayed snapshot keeps its original unit until the user
    /// re-triggers acquisition, so no re-fetch loop can start here.
    pub fn set_unit(&self, unit: UnitSystem) {
        self.lock().unit = unit;
    }

    /// Acquire weather for the device position.
    pub async fn request_location(&self) {
        let Some(geolocator) = self.geolocator.as_deref() else {
            let mut shared = self.lock();
            shared.generation += 1;
            shared.state = AcquisitionState::Error(AcquisitionError::UnsupportedEnvironment);
            return;
        };

        let generation = self.begin(AcquisitionState::RequestingLocation);

        let coords = match geolocator.current_position(&self.options).await {
            Ok(coords) => coords,
            Err(err) => {
                self.finish(generation, Err(err.into()));
                return;
            }
        };

        if !self.advance(generation, AcquisitionState::LoadingWeather) {
            return;
        }

        let unit = self.unit();
        let result = self.client.fetch_by_coordinates(coords, unit).await;
        self.finish(generation, result);
    }

    /// Acquire weather for a manually entered city name. Valid from any
    /// phase, including `Error` and `Success`; bypasses geolocation.
    pub async fn search_city(&self, name: &str) {
        let generation = self.begin(AcquisitionState::LoadingWeather);

        let unit = self.unit();
        let result = self.client.fetch_by_city(name, unit).await;
        self.finish(generation, result);
    }

    /// Re-attempt acquisition after a failure. Always restarts from
    /// geolocation, even when the failed attempt was a city search.
    pub async fn retry(&self) {
        self.request_location().await;
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn begin(&self, state: AcquisitionState) -> u64 {
        let mut shared = self.lock();
        shared.generation += 1;
        shared.state = state;
        shared.generation
    }

    fn advance(&self, generation: u64, state: AcquisitionState) -> bool {
        let mut shared = self.lock();
        if shared.generation != generation {
            tracing::debug!(generation, "request superseded before weather fetch");
            return false;
        }
        shared.state = state;
        true
    }

    fn finish(&self, generation: u64, result: Result<WeatherSnapshot, AcquisitionError>) {
        let mut shared = self.lock();
        if shared.generation != generation {
            tracing::debug!(generation, "discarding completion of superseded request");
            return;
        }
        shared.state = match result {
            Ok(snapshot) => AcquisitionState::Success(snapshot),
            Err(err) => AcquisitionState::Error(err),
        };
    }
}
