//! The dashboard controller: sequences location lookup and the two weather
//! fetches, and owns the state views read from.

use std::sync::Arc;

use tracing::{error, info};

use crate::{
    error::Result,
    geolocation::{PositionSource, current_location},
    model::{Coordinates, CurrentConditions, ForecastEntry},
    provider::WeatherApi,
};

const REFRESH_FAILED: &str = "Failed to refresh weather data";

/// Everything a view needs to render the dashboard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    pub weather: Option<CurrentConditions>,
    pub forecast: Vec<ForecastEntry>,
    pub loading: bool,
    /// User-visible message; stays until dismissed or a new load starts.
    pub error: Option<String>,
    pub location_loading: bool,
    /// Coordinates of the last successful load.
    pub last_location: Option<Coordinates>,
}

#[derive(Debug)]
pub struct Dashboard {
    api: Arc<dyn WeatherApi>,
    position: Option<Arc<dyn PositionSource>>,
    state: DashboardState,
}

impl Dashboard {
    /// `position` is `None` when the platform has no position capability.
    pub fn new(api: Arc<dyn WeatherApi>, position: Option<Arc<dyn PositionSource>>) -> Self {
        Self {
            api,
            position,
            state: DashboardState::default(),
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    /// Initial load from the current position.
    pub async fn start(&mut self) {
        info!("Loading initial weather data");
        // Failures are already recorded in the state.
        let _ = self.use_current_location().await;
    }

    /// Fetch current conditions and forecast for `at` concurrently.
    ///
    /// Both requests run to completion; if either failed, nothing is stored
    /// and the error message is kept instead.
    pub async fn load_weather(&mut self, at: Coordinates) -> Result<()> {
        self.state.loading = true;
        self.state.error = None;

        let outcome = fetch_both(self.api.as_ref(), at).await;

        self.state.loading = false;

        match outcome {
            Ok((weather, forecast)) => {
                info!(
                    location = %weather.name,
                    days = forecast.len(),
                    "Weather data received"
                );
                self.state.weather = Some(weather);
                self.state.forecast = forecast;
                self.state.last_location = Some(at);
                Ok(())
            }
            Err(err) => {
                error!(error = %err, %at, "Error fetching weather data");
                self.state.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Look up the current position, then load weather for it.
    pub async fn use_current_location(&mut self) -> Result<()> {
        self.state.location_loading = true;
        self.state.error = None;

        let result = self.locate_and_load().await;

        self.state.location_loading = false;
        result
    }

    /// Load weather for a location picked from search suggestions.
    pub async fn select_location(&mut self, at: Coordinates) -> Result<()> {
        self.load_weather(at).await
    }

    /// Re-acquire the position and reload. Does nothing until weather has
    /// been shown once.
    ///
    /// A failed position lookup is reported with a generic message.
    pub async fn refresh(&mut self) -> Result<()> {
        if self.state.weather.is_none() {
            return Ok(());
        }

        info!("Refreshing weather data");
        let at = match current_location(self.position.as_deref()).await {
            Ok(at) => at,
            Err(err) => {
                error!(error = %err, "Error refreshing weather data");
                self.state.error = Some(REFRESH_FAILED.to_string());
                return Err(err);
            }
        };

        // Fetch failures keep their own message.
        self.load_weather(at).await
    }

    pub fn dismiss_error(&mut self) {
        self.state.error = None;
    }

    async fn locate_and_load(&mut self) -> Result<()> {
        let at = match current_location(self.position.as_deref()).await {
            Ok(at) => at,
            Err(err) => {
                error!(error = %err, "Error getting current location");
                self.state.error = Some(err.to_string());
                return Err(err);
            }
        };

        info!(%at, "Current location received");
        self.load_weather(at).await
    }
}

/// Run both fetches to completion, then fail if either failed.
async fn fetch_both(
    api: &dyn WeatherApi,
    at: Coordinates,
) -> Result<(CurrentConditions, Vec<ForecastEntry>)> {
    let (weather, forecast) = tokio::join!(api.current_weather(at), api.forecast(at));
    Ok((weather?, forecast?))
}
