use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DashboardError;

/// A point on the globe in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Reject non-finite or out-of-range values.
    ///
    /// Fetchers trust their input; callers building coordinates from user
    /// input are expected to run this first.
    pub fn validate(self) -> Result<Self, DashboardError> {
        let ok = self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude);

        if ok {
            Ok(self)
        } else {
            Err(DashboardError::InvalidCoordinates {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Current conditions at a location, normalized for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub name: String,
    pub country: String,
    pub temperature_c: i32,
    pub feels_like_c: i32,
    pub description: String,
    pub icon: String,
    pub humidity_pct: u8,
    pub pressure_hpa: u32,
    pub wind_speed_mps: f64,
    pub wind_direction_deg: f64,
    /// Omitted by the provider for some stations.
    pub visibility_m: Option<u32>,
    pub sunrise: i64,
    pub sunset: i64,
}

const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

impl CurrentConditions {
    /// 16-point compass label for the wind direction.
    pub fn wind_compass(&self) -> &'static str {
        let sector = (self.wind_direction_deg / 22.5).round() as i64;
        COMPASS_POINTS[sector.rem_euclid(16) as usize]
    }

    pub fn icon_url(&self) -> String {
        format!("https://openweathermap.org/img/wn/{}@4x.png", self.icon)
    }

    pub fn sunrise_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.sunrise, 0)
    }

    pub fn sunset_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.sunset, 0)
    }
}

/// One representative reading per forecast day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    /// Short label such as `Mon, Jan 15`.
    pub date: String,
    pub time: DateTime<Utc>,
    pub min_c: i32,
    pub max_c: i32,
    pub description: String,
    pub icon: String,
    pub humidity_pct: u8,
    pub wind_speed_mps: f64,
}

/// A geocoding match offered while the user types a place name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSuggestion {
    pub name: String,
    pub country: String,
    pub state: Option<String>,
    pub coordinates: Coordinates,
}

impl LocationSuggestion {
    pub fn display_name(&self) -> String {
        match &self.state {
            Some(state) => format!("{}, {}", self.name, state),
            None => self.name.clone(),
        }
    }

    /// Text shown in the search field once the suggestion is picked.
    pub fn label(&self) -> String {
        format!("{}, {}", self.name, self.country)
    }
}
