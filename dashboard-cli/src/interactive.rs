use std::fmt;

use dashboard_core::{Config, Dashboard, LocationSuggestion, WeatherApi, client_from_config};
use inquire::{InquireError, Select, Text};

use crate::{cli::position_source, render};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuItem {
    Search,
    CurrentLocation,
    Refresh,
    DismissError,
    Quit,
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MenuItem::Search => "Search for a city",
            MenuItem::CurrentLocation => "Current location",
            MenuItem::Refresh => "Refresh",
            MenuItem::DismissError => "Dismiss error",
            MenuItem::Quit => "Quit",
        })
    }
}

fn menu_items(dashboard: &Dashboard) -> Vec<MenuItem> {
    let state = dashboard.state();
    let mut items = vec![MenuItem::Search, MenuItem::CurrentLocation];
    if state.weather.is_some() {
        items.push(MenuItem::Refresh);
    }
    if state.error.is_some() {
        items.push(MenuItem::DismissError);
    }
    items.push(MenuItem::Quit);
    items
}

struct Choice(LocationSuggestion);

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render::suggestion_line(&self.0))
    }
}

/// Search `query` and let the user pick one match.
///
/// Search failures are logged and treated as "no matches".
pub async fn pick_location(
    api: &dyn WeatherApi,
    query: &str,
) -> anyhow::Result<Option<LocationSuggestion>> {
    let found = match api.search_locations(query).await {
        Ok(found) => found,
        Err(err) => {
            tracing::warn!(error = %err, "Error fetching suggestions");
            Vec::new()
        }
    };

    if found.is_empty() {
        println!("No locations found for '{query}'");
        return Ok(None);
    }

    let choices = found.into_iter().map(Choice).collect();
    let picked = Select::new("Pick a location:", choices).prompt_skippable()?;

    Ok(picked.map(|c| c.0))
}

pub async fn run(config: &Config) -> anyhow::Result<()> {
    let api = client_from_config(config);
    let mut dashboard = Dashboard::new(api.clone(), position_source(config));

    dashboard.start().await;

    // Load failures land in the dashboard state and are rendered on the next
    // pass, so their results are not inspected here.
    loop {
        print!("{}", render::dashboard(dashboard.state()));

        let choice = match Select::new("What next?", menu_items(&dashboard)).prompt() {
            Ok(choice) => choice,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(err) => return Err(err.into()),
        };

        match choice {
            MenuItem::Search => {
                let query = Text::new("City:").prompt()?;
                if let Some(picked) = pick_location(api.as_ref(), &query).await? {
                    println!("{}", picked.label());
                    let _ = dashboard.select_location(picked.coordinates).await;
                }
            }
            MenuItem::CurrentLocation => {
                let _ = dashboard.use_current_location().await;
            }
            MenuItem::Refresh => {
                let _ = dashboard.refresh().await;
            }
            MenuItem::DismissError => dashboard.dismiss_error(),
            MenuItem::Quit => break,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashboard_core::OpenWeatherClient;
    use std::sync::Arc;

    #[tokio::test]
    async fn menu_hides_refresh_and_dismiss_until_relevant() {
        let mut dashboard = Dashboard::new(Arc::new(OpenWeatherClient::new("KEY".into())), None);
        assert_eq!(
            menu_items(&dashboard),
            vec![MenuItem::Search, MenuItem::CurrentLocation, MenuItem::Quit]
        );

        // No position capability: the lookup fails without any request.
        dashboard.start().await;
        assert_eq!(
            menu_items(&dashboard),
            vec![
                MenuItem::Search,
                MenuItem::CurrentLocation,
                MenuItem::DismissError,
                MenuItem::Quit
            ]
        );
    }
}
