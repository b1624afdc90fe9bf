use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use dashboard_core::{
    Config, Coordinates, Dashboard, FixedPosition, PositionSource, SearchDebouncer,
    client_from_config,
};
use inquire::{Confirm, CustomType, Password, Text};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{interactive, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-dashboard", version, about = "Weather dashboard for the terminal")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the API key, default location and search delay.
    Configure,

    /// Show current conditions and the 5-day forecast.
    ///
    /// Without arguments the default location is used.
    Show {
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Place name; the best geocoding match is used.
        #[arg(long, conflicts_with_all = ["lat", "lon"])]
        place: Option<String>,
    },

    /// List locations matching a name.
    Search {
        /// City or place name (at least 2 characters).
        query: String,
    },

    /// Read query text from stdin line by line, as if typed, and print
    /// suggestions once input pauses.
    Suggest,

    /// Menu-driven dashboard session.
    Interactive,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;

        match self.command {
            Command::Configure => configure(config).await,
            Command::Show { lat, lon, place } => show(&config, lat.zip(lon), place).await,
            Command::Search { query } => search(&config, &query).await,
            Command::Suggest => suggest(&config).await,
            Command::Interactive => interactive::run(&config).await,
        }
    }
}

/// The configured default location stands in for a platform position.
pub fn position_source(config: &Config) -> Option<Arc<dyn PositionSource>> {
    config
        .default_location
        .map(|at| Arc::new(FixedPosition(at)) as Arc<dyn PositionSource>)
}

async fn configure(mut config: Config) -> anyhow::Result<()> {
    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .with_help_message("Leave empty to keep the current key")
        .prompt()?;

    if !api_key.trim().is_empty() {
        config.set_api_key(api_key.trim().to_string());
    }

    let set_default = Confirm::new("Set a default location?")
        .with_default(config.default_location.is_some())
        .prompt()?;

    if set_default {
        let api = client_from_config(&config);
        let query = Text::new("Default location name:").prompt()?;

        let location = match interactive::pick_location(api.as_ref(), &query).await? {
            Some(picked) => picked.coordinates,
            None => {
                let latitude = CustomType::<f64>::new("Latitude:")
                    .with_error_message("Please type a number")
                    .prompt()?;
                let longitude = CustomType::<f64>::new("Longitude:")
                    .with_error_message("Please type a number")
                    .prompt()?;
                Coordinates::new(latitude, longitude).validate()?
            }
        };

        config.set_default_location(Some(location));
    } else {
        config.set_default_location(None);
    }

    config.search_debounce_ms = CustomType::<u64>::new("Search delay (ms):")
        .with_default(config.search_debounce_ms)
        .prompt()?;

    let path = config.save()?;
    println!("Saved configuration to {}", path.display());

    Ok(())
}

async fn show(
    config: &Config,
    coordinates: Option<(f64, f64)>,
    place: Option<String>,
) -> anyhow::Result<()> {
    let api = client_from_config(config);
    let mut dashboard = Dashboard::new(api.clone(), position_source(config));

    match (coordinates, place) {
        (Some((latitude, longitude)), _) => {
            let at = Coordinates::new(latitude, longitude).validate()?;
            dashboard.select_location(at).await?;
        }
        (None, Some(place)) => {
            let best = api
                .search_locations(&place)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| anyhow!("No locations found for '{place}'"))?;

            println!("{}", best.label());
            dashboard.select_location(best.coordinates).await?;
        }
        (None, None) => {
            dashboard.use_current_location().await.map_err(|e| {
                anyhow!(
                    "{e}\nHint: pass --lat/--lon or --place, or set a default location \
                     with `weather-dashboard configure`."
                )
            })?;
        }
    }

    print!("{}", render::dashboard(dashboard.state()));
    Ok(())
}

async fn search(config: &Config, query: &str) -> anyhow::Result<()> {
    let api = client_from_config(config);
    let found = api.search_locations(query).await?;

    print!("{}", render::suggestions(&found));
    Ok(())
}

async fn suggest(config: &Config) -> anyhow::Result<()> {
    let (mut debouncer, mut updates) =
        SearchDebouncer::new(client_from_config(config), config.search_debounce());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_input: Option<String> = None;
    let mut awaiting = false;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line.context("Failed to read query from stdin")? {
                    Some(line) => {
                        let query = line.trim_end().to_string();
                        debouncer.input(query.clone());
                        last_input = Some(query);
                        awaiting = true;
                    }
                    None => break,
                }
            }
            Some(update) = updates.recv() => {
                if last_input.as_deref() == Some(update.query.as_str()) {
                    awaiting = false;
                }
                print!("{}", render::search_update(&update));
            }
        }
    }

    // Input closed; let the last pending search finish.
    while awaiting {
        let Some(update) = updates.recv().await else {
            break;
        };
        awaiting = last_input.as_deref() != Some(update.query.as_str());
        print!("{}", render::search_update(&update));
    }

    Ok(())
}
