use crate::{
    Config,
    error::Result,
    model::{Coordinates, CurrentConditions, ForecastEntry, LocationSuggestion},
    provider::openweather::OpenWeatherClient,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

/// The three remote operations the dashboard is built on.
///
/// Implementations convert every internal failure into a
/// [`DashboardError`](crate::DashboardError); nothing from the HTTP or JSON
/// layer escapes unwrapped.
#[async_trait]
pub trait WeatherApi: Send + Sync + Debug {
    async fn current_weather(&self, at: Coordinates) -> Result<CurrentConditions>;

    /// At most five entries, one per day, oldest first.
    async fn forecast(&self, at: Coordinates) -> Result<Vec<ForecastEntry>>;

    /// Queries shorter than two characters resolve to an empty list without
    /// touching the network.
    async fn search_locations(&self, query: &str) -> Result<Vec<LocationSuggestion>>;
}

/// Construct the OpenWeather client from config.
pub fn client_from_config(config: &Config) -> Arc<dyn WeatherApi> {
    Arc::new(OpenWeatherClient::from_config(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_from_config_uses_configured_urls() {
        let mut cfg = Config::default();
        cfg.base_url = "http://localhost:9999/data".into();
        cfg.set_api_key("KEY".into());

        let client = client_from_config(&cfg);
        let debug = format!("{client:?}");
        assert!(debug.contains("http://localhost:9999/data"));
    }
}
