//! Core library for the weather dashboard.
//!
//! This crate defines:
//! - Configuration & API key resolution
//! - The OpenWeather client behind the [`WeatherApi`] seam
//! - Normalized display records (current conditions, forecast, suggestions)
//! - A single-shot geolocation adapter and a debounced location search
//! - The [`Dashboard`] controller and the state it exposes
//!
//! It is used by `dashboard-cli`, but can also drive other front ends.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod geolocation;
pub mod model;
pub mod normalize;
pub mod provider;
pub mod search;

pub use config::Config;
pub use dashboard::{Dashboard, DashboardState};
pub use error::DashboardError;
pub use geolocation::{FixedPosition, PositionOptions, PositionSource, current_location};
pub use model::{Coordinates, CurrentConditions, ForecastEntry, LocationSuggestion};
pub use provider::{WeatherApi, client_from_config, openweather::OpenWeatherClient};
pub use search::{SearchDebouncer, SearchUpdate};
