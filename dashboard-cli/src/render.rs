use std::fmt::Write;

use chrono::{DateTime, Local, Utc};
use dashboard_core::{
    CurrentConditions, DashboardState, ForecastEntry, LocationSuggestion, SearchUpdate,
};

pub fn dashboard(state: &DashboardState) -> String {
    let mut out = String::new();

    if let Some(error) = &state.error {
        let _ = writeln!(out, "Error: {error}\n");
    }

    if state.loading || state.location_loading {
        let _ = writeln!(out, "Loading...");
        return out;
    }

    if let Some(weather) = &state.weather {
        out.push_str(&current(weather));

        if !state.forecast.is_empty() {
            out.push('\n');
            out.push_str(&forecast(&state.forecast));
        }
    }

    out
}

pub fn current(weather: &CurrentConditions) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}, {}", weather.name, weather.country);
    let _ = writeln!(
        out,
        "  {}°C  {} (feels like {}°C)",
        weather.temperature_c, weather.description, weather.feels_like_c
    );
    let _ = writeln!(out, "  {:<12}{}%", "Humidity", weather.humidity_pct);
    let _ = writeln!(out, "  {:<12}{} hPa", "Pressure", weather.pressure_hpa);
    let _ = writeln!(
        out,
        "  {:<12}{} m/s {}",
        "Wind",
        weather.wind_speed_mps,
        weather.wind_compass()
    );
    let _ = writeln!(out, "  {:<12}{}", "Visibility", visibility(weather.visibility_m));
    let _ = writeln!(out, "  {:<12}{}", "Sunrise", clock(weather.sunrise_utc()));
    let _ = writeln!(out, "  {:<12}{}", "Sunset", clock(weather.sunset_utc()));

    out
}

pub fn forecast(entries: &[ForecastEntry]) -> String {
    let mut out = String::from("5-Day Forecast\n");

    for day in entries {
        let _ = writeln!(
            out,
            "  {:<12}{:>4}° /{:>4}°  {:<20} {} m/s",
            day.date,
            day.max_c,
            day.min_c,
            day.description,
            day.wind_speed_mps.round()
        );
    }

    out
}

pub fn suggestion_line(suggestion: &LocationSuggestion) -> String {
    format!(
        "{} ({})  {}",
        suggestion.display_name(),
        suggestion.country,
        suggestion.coordinates
    )
}

pub fn suggestions(found: &[LocationSuggestion]) -> String {
    if found.is_empty() {
        return "No locations found\n".to_string();
    }

    found
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}. {}\n", i + 1, suggestion_line(s)))
        .collect()
}

pub fn search_update(update: &SearchUpdate) -> String {
    format!("> {}\n{}", update.query, suggestions(&update.suggestions))
}

fn visibility(meters: Option<u32>) -> String {
    match meters {
        Some(m) => format!("{} km", (f64::from(m) / 1000.0).round()),
        None => "n/a".to_string(),
    }
}

fn clock(at: Option<DateTime<Utc>>) -> String {
    at.map(|t| t.with_timezone(&Local).format("%I:%M %p").to_string())
        .unwrap_or_else(|| "n/a".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashboard_core::Coordinates;

    fn weather() -> CurrentConditions {
        CurrentConditions {
            name: "Berlin".into(),
            country: "DE".into(),
            temperature_c: 5,
            feels_like_c: 2,
            description: "overcast clouds".into(),
            icon: "04d".into(),
            humidity_pct: 75,
            pressure_hpa: 1013,
            wind_speed_mps: 5.1,
            wind_direction_deg: 230.0,
            visibility_m: Some(9_600),
            sunrise: 1_705_302_900,
            sunset: 1_705_332_600,
        }
    }

    #[test]
    fn current_block_lists_details() {
        let text = current(&weather());
        assert!(text.starts_with("Berlin, DE\n"));
        assert!(text.contains("5°C  overcast clouds (feels like 2°C)"));
        assert!(text.contains("1013 hPa"));
        assert!(text.contains("5.1 m/s SW"));
        assert!(text.contains("10 km"));
    }

    #[test]
    fn missing_visibility_is_na() {
        assert_eq!(visibility(None), "n/a");
        assert_eq!(visibility(Some(400)), "0 km");
    }

    #[test]
    fn error_shown_above_content() {
        let state = DashboardState {
            weather: Some(weather()),
            error: Some("city not found".into()),
            ..Default::default()
        };
        let text = dashboard(&state);
        assert!(text.starts_with("Error: city not found"));
        assert!(text.contains("Berlin, DE"));
    }

    #[test]
    fn loading_hides_content() {
        let state = DashboardState {
            weather: Some(weather()),
            loading: true,
            ..Default::default()
        };
        assert_eq!(dashboard(&state), "Loading...\n");
    }

    #[test]
    fn suggestions_are_numbered() {
        let found = vec![LocationSuggestion {
            name: "London".into(),
            country: "GB".into(),
            state: Some("England".into()),
            coordinates: Coordinates::new(51.5073, -0.1276),
        }];
        assert_eq!(
            suggestions(&found),
            "1. London, England (GB)  51.5073, -0.1276\n"
        );
        assert_eq!(suggestions(&[]), "No locations found\n");
    }
}
