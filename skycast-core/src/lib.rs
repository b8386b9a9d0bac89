//! Core library for the `skycast` weather dashboard.
//!
//! This crate defines:
//! - Configuration & credential handling
//! - The weather provider client, with geocoding fallback for city search
//! - A TTL cache for weather snapshots over a pluggable key-value store
//! - The acquisition state machine a presentation layer drives
//!
//! It is used by `skycast-cli`, but can also be reused by other front ends.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod geolocate;
pub mod model;
pub mod orchestrator;

pub use cache::{FileStore, MemoryStore, SnapshotCache, StringStore};
pub use client::WeatherClient;
pub use config::Config;
pub use error::AcquisitionError;
pub use geolocate::{FixedPosition, GeolocationError, Geolocator, PositionOptions};
pub use model::{Coordinates, UnitSystem, WeatherSnapshot};
pub use orchestrator::{AcquisitionState, Orchestrator};
