use anyhow::anyhow;
use chrono::DateTime;
use clap::{Parser, Subcommand};

use skycast_core::{
    AcquisitionState, Config, Coordinates, FileStore, FixedPosition, Geolocator, Orchestrator,
    SnapshotCache, UnitSystem, WeatherClient, WeatherSnapshot,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skycast", version, about = "Weather dashboard CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the weather API credential and an optional home position.
    Configure,

    /// Show current weather for a city.
    Show {
        /// City name, free text.
        city: String,

        /// Unit system: "metric" or "imperial".
        #[arg(long, default_value = "metric")]
        units: String,
    },

    /// Show current weather for the configured home position.
    Here {
        /// Unit system: "metric" or "imperial".
        #[arg(long, default_value = "metric")]
        units: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, units } => {
                let unit = UnitSystem::try_from(units.as_str())?;
                let orchestrator = build_orchestrator()?;
                orchestrator.set_unit(unit);
                orchestrator.search_city(&city).await;
                report(&orchestrator.state(), unit)
            }
            Command::Here { units } => {
                let unit = UnitSystem::try_from(units.as_str())?;
                let orchestrator = build_orchestrator()?;
                orchestrator.set_unit(unit);
                orchestrator.request_location().await;
                report(&orchestrator.state(), unit)
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = inquire::Password::new("Weather API key:")
        .without_confirmation()
        .prompt()?;
    config.set_api_key(api_key);

    let set_home = inquire::Confirm::new("Set a home position for `skycast here`?")
        .with_default(config.home.is_some())
        .prompt()?;
    if set_home {
        let latitude = inquire::CustomType::<f64>::new("Latitude:").prompt()?;
        let longitude = inquire::CustomType::<f64>::new("Longitude:").prompt()?;
        config.set_home(Coordinates { latitude, longitude });
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

fn build_orchestrator() -> anyhow::Result<Orchestrator> {
    let config = Config::load()?;
    let store = FileStore::open_default()?;
    tracing::debug!("snapshot cache at {}", store.path().display());
    let client = WeatherClient::new(&config, SnapshotCache::new(Box::new(store)));

    // Without a configured home position there is no geolocation capability
    // in a terminal; `here` then reports the unsupported environment.
    let geolocator: Option<Box<dyn Geolocator>> = config
        .home_coordinates()
        .map(|coords| Box::new(FixedPosition(coords)) as Box<dyn Geolocator>);

    Ok(Orchestrator::new(client, geolocator))
}

fn report(state: &AcquisitionState, unit: UnitSystem) -> anyhow::Result<()> {
    match state {
        AcquisitionState::Success(snapshot) => {
            print_snapshot(snapshot, unit);
            Ok(())
        }
        AcquisitionState::Error(err) => {
            let mut message = err.user_message();
            if err.is_retryable() {
                message.push_str(" (retryable)");
            }
            Err(anyhow!(message))
        }
        state => Err(anyhow!("acquisition ended in an unexpected phase: {state:?}")),
    }
}

fn print_snapshot(snapshot: &WeatherSnapshot, unit: UnitSystem) {
    let (temp_suffix, speed_suffix) = match unit {
        UnitSystem::Metric => ("°C", "m/s"),
        UnitSystem::Imperial => ("°F", "mph"),
    };

    println!("{}, {}", snapshot.location_name, snapshot.country_code);
    println!("  Conditions:  {}", snapshot.condition_description);
    println!(
        "  Temperature: {:.1}{temp_suffix} (feels like {:.1}{temp_suffix})",
        snapshot.temperature, snapshot.feels_like
    );
    println!("  Humidity:    {}%", snapshot.humidity);
    println!("  Wind:        {:.1} {speed_suffix}", snapshot.wind_speed);

    if let (Some(sunrise), Some(sunset)) = (
        DateTime::from_timestamp(snapshot.sunrise_epoch, 0),
        DateTime::from_timestamp(snapshot.sunset_epoch, 0),
    ) {
        println!(
            "  Sun:         {} / {} UTC",
            sunrise.format("%H:%M"),
            sunset.format("%H:%M")
        );
    }
}
