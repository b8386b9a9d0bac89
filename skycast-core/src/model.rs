use serde::{Deserialize, Serialize};

/// Geographic position, as delivered by a geolocation capability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Measurement system sent to the provider. Snapshots are unit-specific and
/// are never converted in place, so the unit participates in cache keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
        }
    }

    pub const fn all() -> &'static [UnitSystem] {
        &[UnitSystem::Metric, UnitSystem::Imperial]
    }
}

impl std::fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for UnitSystem {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "metric" => Ok(UnitSystem::Metric),
            "imperial" => Ok(UnitSystem::Imperial),
            _ => Err(anyhow::anyhow!(
                "Unknown unit system '{value}'. Supported systems: metric, imperial."
            )),
        }
    }
}

/// Immutable point-in-time weather reading for a location.
///
/// The serialized field names match the historical cache format, so entries
/// written by earlier builds stay readable; `fetched_at_epoch_ms` is the sole
/// cache-validity field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    #[serde(rename = "locationName")]
    pub location_name: String,
    #[serde(rename = "country")]
    pub country_code: String,
    #[serde(rename = "temp")]
    pub temperature: f64,
    #[serde(rename = "feelsLike")]
    pub feels_like: f64,
    pub humidity: u8,
    #[serde(rename = "windSpeed")]
    pub wind_speed: f64,
    #[serde(rename = "description")]
    pub condition_description: String,
    #[serde(rename = "icon")]
    pub condition_icon_id: String,
    #[serde(rename = "sunrise")]
    pub sunrise_epoch: i64,
    #[serde(rename = "sunset")]
    pub sunset_epoch: i64,
    #[serde(rename = "updatedAt")]
    pub fetched_at_epoch_ms: i64,
}
