//! Weather provider client: current conditions by coordinates or city name.
//!
//! All upstream failures are translated into [`AcquisitionError`] here; the
//! cache is consulted before any network round-trip, and city lookups run
//! through a geocoding step with a Korean administrative-suffix fallback.

use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::cache::{self, SnapshotCache};
use crate::config::Config;
use crate::error::AcquisitionError;
use crate::model::{Coordinates, UnitSystem, WeatherSnapshot};

const WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
const GEOCODE_URL: &str = "https://api.openweathermap.org/geo/1.0/direct";

#[derive(Debug)]
pub struct WeatherClient {
    http: Client,
    api_key: Option<String>,
    language: String,
    cache: SnapshotCache,
    weather_url: String,
    geocode_url: String,
}

impl WeatherClient {
    pub fn new(config: &Config, cache: SnapshotCache) -> Self {
        Self {
            http: Client::new(),
            api_key: config.api_key.clone(),
            language: config.language.clone(),
            cache,
            weather_url: WEATHER_URL.to_string(),
            geocode_url: GEOCODE_URL.to_string(),
        }
    }

    /// Point the client at alternative weather/geocoding endpoints.
    pub fn with_endpoints(mut self, weather_url: &str, geocode_url: &str) -> Self {
        self.weather_url = weather_url.to_string();
        self.geocode_url = geocode_url.to_string();
        self
    }

    /// Current conditions for the given coordinates, cache first.
    pub async fn fetch_by_coordinates(
        &self,
        coords: Coordinates,
        unit: UnitSystem,
    ) -> Result<WeatherSnapshot, AcquisitionError> {
        let key = cache::coordinate_key(coords, unit);
        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(%key, "serving snapshot from cache");
            return Ok(hit);
        }

        let api_key = self.credential()?;
        let snapshot = self.request_current(coords, unit, api_key).await?;
        self.cache.put(&key, &snapshot);
        Ok(snapshot)
    }

    /// Current conditions for a free-text city name.
    ///
    /// The name is resolved to coordinates via geocoding, then the same
    /// current-conditions request as [`fetch_by_coordinates`] is issued, but
    /// bypassing the coordinate cache; the result lands in the city-keyed
    /// entry instead.
    ///
    /// [`fetch_by_coordinates`]: WeatherClient::fetch_by_coordinates
    pub async fn fetch_by_city(
        &self,
        city: &str,
        unit: UnitSystem,
    ) -> Result<WeatherSnapshot, AcquisitionError> {
        let key = cache::city_key(city, unit);
        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(%key, "serving snapshot from cache");
            return Ok(hit);
        }

        let api_key = self.credential()?;
        let coords = self.resolve_city(city, api_key).await?;
        let snapshot = self.request_current(coords, unit, api_key).await?;
        self.cache.put(&key, &snapshot);
        Ok(snapshot)
    }

    fn credential(&self) -> Result<&str, AcquisitionError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(AcquisitionError::InvalidCredentials)
    }

    /// Resolve a city name to coordinates.
    ///
    /// Geocoding of Korean place names is inconsistent for bare city names:
    /// if the literal query has no match and the input is Hangul without an
    /// administrative suffix, one retry with "시" appended is attempted
    /// before giving up with `CityNotFound`.
    async fn resolve_city(
        &self,
        city: &str,
        api_key: &str,
    ) -> Result<Coordinates, AcquisitionError> {
        let mut matches = self.geocode(city, api_key).await?;

        if matches.is_empty() && wants_suffix_retry(city) {
            let retried = format!("{city}시");
            tracing::debug!(query = %retried, "retrying geocode with administrative suffix");
            matches = self.geocode(&retried, api_key).await?;
        }

        let first = matches
            .into_iter()
            .next()
            .ok_or_else(|| AcquisitionError::CityNotFound(city.to_string()))?;

        Ok(Coordinates { latitude: first.lat, longitude: first.lon })
    }

    async fn geocode(&self, query: &str, api_key: &str) -> Result<Vec<GeoMatch>, AcquisitionError> {
        let res = self
            .http
            .get(&self.geocode_url)
            .query(&[("q", query), ("limit", "1"), ("appid", api_key)])
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            return Err(error_for_status(status, query));
        }

        Ok(res.json().await?)
    }

    async fn request_current(
        &self,
        coords: Coordinates,
        unit: UnitSystem,
        api_key: &str,
    ) -> Result<WeatherSnapshot, AcquisitionError> {
        let res = self
            .http
            .get(&self.weather_url)
            .query(&[
                ("lat", coords.latitude.to_string()),
                ("lon", coords.longitude.to_string()),
                ("units", unit.as_str().to_string()),
                ("appid", api_key.to_string()),
                ("lang", self.language.clone()),
            ])
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let query = format!("{:.2},{:.2}", coords.latitude, coords.longitude);
            return Err(error_for_status(status, &query));
        }

        let parsed: CurrentConditions = res.json().await?;
        Ok(parsed.into_snapshot(Utc::now().timestamp_millis()))
    }
}

/// Map a non-success provider status into the error taxonomy.
fn error_for_status(status: StatusCode, query: &str) -> AcquisitionError {
    match status {
        StatusCode::UNAUTHORIZED => AcquisitionError::InvalidCredentials,
        StatusCode::NOT_FOUND => AcquisitionError::CityNotFound(query.to_string()),
        StatusCode::TOO_MANY_REQUESTS => AcquisitionError::RateLimited,
        s if s.is_server_error() => AcquisitionError::ServerFault(s.as_u16()),
        s => AcquisitionError::NetworkFault(format!("unexpected status {s}")),
    }
}

/// True when the query is Hangul without one of the administrative suffixes
/// "시", "군", "구" already attached.
fn wants_suffix_retry(city: &str) -> bool {
    let has_hangul = city.chars().any(|c| ('\u{AC00}'..='\u{D7A3}').contains(&c));
    has_hangul && !city.ends_with('시') && !city.ends_with('군') && !city.ends_with('구')
}

#[derive(Debug, Deserialize)]
struct GeoMatch {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    name: String,
    main: MainBlock,
    wind: WindBlock,
    weather: Vec<ConditionBlock>,
    sys: SysBlock,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: f64,
    feels_like: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct WindBlock {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct ConditionBlock {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct SysBlock {
    country: Option<String>,
    sunrise: i64,
    sunset: i64,
}

impl CurrentConditions {
    fn into_snapshot(self, fetched_at_epoch_ms: i64) -> WeatherSnapshot {
        let (description, icon) = self
            .weather
            .into_iter()
            .next()
            .map(|w| (w.description, w.icon))
            .unwrap_or_else(|| ("Unknown".to_string(), String::new()));

        WeatherSnapshot {
            location_name: self.name,
            country_code: self.sys.country.unwrap_or_default(),
            temperature: self.main.temp,
            feels_like: self.main.feels_like,
            humidity: self.main.humidity,
            wind_speed: self.wind.speed,
            condition_description: description,
            condition_icon_id: icon,
            sunrise_epoch: self.sys.sunrise,
            sunset_epoch: self.sys.sunset,
            fetched_at_epoch_ms,
        }
    }
}
