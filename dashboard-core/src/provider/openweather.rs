use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Local, Offset};
use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, instrument, warn};

use crate::{
    Config,
    config::{DEFAULT_BASE_URL, DEFAULT_GEO_BASE_URL},
    error::{DashboardError, Result},
    model::{Coordinates, CurrentConditions, ForecastEntry, LocationSuggestion},
    normalize::{day_label, daily_samples, round_temp},
};

use super::WeatherApi;

/// Shortest query sent to the geocoding endpoint.
pub const MIN_QUERY_CHARS: usize = 2;

/// Matches requested per geocoding call.
pub const SEARCH_LIMIT: u8 = 5;

#[derive(Debug, Clone, Copy)]
enum Endpoint {
    Current,
    Forecast,
    Geocoding,
}

impl Endpoint {
    fn fallback_message(self) -> &'static str {
        match self {
            Endpoint::Current => "Failed to fetch weather data",
            Endpoint::Forecast => "Failed to fetch forecast data",
            Endpoint::Geocoding => "Failed to search locations",
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    geo_base_url: String,
    /// Offset used to render forecast day labels.
    label_offset: FixedOffset,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            geo_base_url: DEFAULT_GEO_BASE_URL.to_string(),
            label_offset: Local::now().offset().fix(),
            http: Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.resolve_api_key())
            .with_base_urls(config.base_url.clone(), config.geo_base_url.clone())
    }

    pub fn with_base_urls(mut self, base_url: String, geo_base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self.geo_base_url = geo_base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_label_offset(mut self, offset: FixedOffset) -> Self {
        self.label_offset = offset;
        self
    }

    /// GET `url`, check the status and decode the JSON body.
    async fn get_json<T, Q>(&self, endpoint: Endpoint, url: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let fallback = endpoint.fallback_message();

        debug!(?endpoint, url, "Sending OpenWeather request");

        let res = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            // The URL carries the API key; keep it out of user-facing messages.
            .map_err(|e| DashboardError::network(e.without_url(), fallback))?;

        let status = res.status();

        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            let message = provider_message(&body)
                .unwrap_or_else(|| format!("HTTP {}: {}", status.as_u16(), fallback));

            warn!(?endpoint, status = status.as_u16(), %message, "OpenWeather request failed");

            return Err(DashboardError::Fetch {
                status: status.as_u16(),
                message,
            });
        }

        let body = res
            .text()
            .await
            .map_err(|e| DashboardError::network(e.without_url(), fallback))?;

        serde_json::from_str(&body).map_err(|e| {
            warn!(?endpoint, error = %e, "Failed to parse OpenWeather response");
            DashboardError::network(e, fallback)
        })
    }

    #[instrument(skip(self), fields(lat = at.latitude, lon = at.longitude))]
    async fn fetch_current(&self, at: Coordinates) -> Result<CurrentConditions> {
        let url = format!("{}/weather", self.base_url);
        let query = CoordQuery::new(at, &self.api_key);

        let parsed: OwCurrentResponse = self.get_json(Endpoint::Current, &url, &query).await?;

        Ok(parsed.into_conditions())
    }

    #[instrument(skip(self), fields(lat = at.latitude, lon = at.longitude))]
    async fn fetch_forecast(&self, at: Coordinates) -> Result<Vec<ForecastEntry>> {
        let url = format!("{}/forecast", self.base_url);
        let query = CoordQuery::new(at, &self.api_key);

        let parsed: OwForecastResponse = self.get_json(Endpoint::Forecast, &url, &query).await?;

        parsed.into_entries(&self.label_offset)
    }

    #[instrument(skip(self))]
    async fn fetch_suggestions(&self, query: &str) -> Result<Vec<LocationSuggestion>> {
        if query.chars().count() < MIN_QUERY_CHARS {
            return Ok(Vec::new());
        }

        let url = format!("{}/direct", self.geo_base_url);
        let params = GeoQuery {
            q: query,
            limit: SEARCH_LIMIT,
            appid: &self.api_key,
        };

        let matches: Vec<OwGeoMatch> = self.get_json(Endpoint::Geocoding, &url, &params).await?;

        Ok(matches.into_iter().map(OwGeoMatch::into_suggestion).collect())
    }
}

#[async_trait]
impl WeatherApi for OpenWeatherClient {
    async fn current_weather(&self, at: Coordinates) -> Result<CurrentConditions> {
        self.fetch_current(at).await
    }

    async fn forecast(&self, at: Coordinates) -> Result<Vec<ForecastEntry>> {
        self.fetch_forecast(at).await
    }

    async fn search_locations(&self, query: &str) -> Result<Vec<LocationSuggestion>> {
        self.fetch_suggestions(query).await
    }
}

/// Non-empty `message` field of an OpenWeather error body, if any.
fn provider_message(body: &str) -> Option<String> {
    serde_json::from_str::<OwErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
}

#[derive(Debug, Serialize)]
struct CoordQuery<'a> {
    lat: f64,
    lon: f64,
    appid: &'a str,
    units: &'static str,
}

impl<'a> CoordQuery<'a> {
    fn new(at: Coordinates, appid: &'a str) -> Self {
        Self {
            lat: at.latitude,
            lon: at.longitude,
            appid,
            units: "metric",
        }
    }
}

#[derive(Debug, Serialize)]
struct GeoQuery<'a> {
    q: &'a str,
    limit: u8,
    appid: &'a str,
}

#[derive(Debug, Deserialize)]
struct OwErrorBody {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
    #[serde(default)]
    deg: f64,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
    pressure: u32,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    #[serde(default)]
    country: String,
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    #[serde(default)]
    visibility: Option<u32>,
    sys: OwSys,
}

impl OwCurrentResponse {
    fn into_conditions(self) -> CurrentConditions {
        let (description, icon) = first_condition(&self.weather);

        CurrentConditions {
            name: self.name,
            country: self.sys.country,
            temperature_c: round_temp(self.main.temp),
            feels_like_c: round_temp(self.main.feels_like),
            description,
            icon,
            humidity_pct: self.main.humidity,
            pressure_hpa: self.main.pressure,
            wind_speed_mps: self.wind.speed,
            wind_direction_deg: self.wind.deg,
            visibility_m: self.visibility,
            sunrise: self.sys.sunrise,
            sunset: self.sys.sunset,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp_min: f64,
    temp_max: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwForecastItem {
    dt: i64,
    main: OwForecastMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastItem>,
}

impl OwForecastResponse {
    fn into_entries(self, label_offset: &FixedOffset) -> Result<Vec<ForecastEntry>> {
        daily_samples(&self.list)
            .map(|item| {
                let time = DateTime::from_timestamp(item.dt, 0).ok_or_else(|| {
                    DashboardError::Network(format!(
                        "Forecast sample has an invalid timestamp: {}",
                        item.dt
                    ))
                })?;

                let (description, icon) = first_condition(&item.weather);

                Ok(ForecastEntry {
                    date: day_label(time, label_offset),
                    time,
                    min_c: round_temp(item.main.temp_min),
                    max_c: round_temp(item.main.temp_max),
                    description,
                    icon,
                    humidity_pct: item.main.humidity,
                    wind_speed_mps: item.wind.speed,
                })
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct OwGeoMatch {
    name: String,
    #[serde(default)]
    country: String,
    state: Option<String>,
    lat: f64,
    lon: f64,
}

impl OwGeoMatch {
    fn into_suggestion(self) -> LocationSuggestion {
        LocationSuggestion {
            name: self.name,
            country: self.country,
            state: self.state,
            coordinates: Coordinates::new(self.lat, self.lon),
        }
    }
}

fn first_condition(weather: &[OwWeather]) -> (String, String) {
    weather
        .first()
        .map(|w| (w.description.clone(), w.icon.clone()))
        .unwrap_or_else(|| ("Unknown".to_string(), String::new()))
}
