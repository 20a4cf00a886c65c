use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use skyclock_core::store::SharedStore;
use skyclock_core::{Config, FileStore, TimeFormat, TimeParts};
use skyclock_weather::{
    selected, ConfiguredPosition, LocationResolver, PlaceSearch, ResolutionState,
    ReverseGeocoder, WeatherCache, WeatherFetcher, WeatherSnapshot,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skyclock", version, about = "Clock & weather companion")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the current time and weather once (the default).
    Show,

    /// Keep the clock running, re-rendering every second.
    Watch,

    /// Search for places and preview their weather.
    Search {
        /// Free-text place query, at least 3 characters.
        query: String,
    },

    /// Search and persist the first matching place as the selection.
    Select {
        /// Free-text place query, at least 3 characters.
        query: String,
    },

    /// Clear the selected place and go back to the device position.
    Clear,

    /// Persist the time format preference.
    Format {
        /// "12h" or "24h".
        format: TimeFormat,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let services = Services::build()?;

        match self.command.unwrap_or(Command::Show) {
            Command::Show => services.show().await,
            Command::Watch => services.watch().await,
            Command::Search { query } => services.search(&query).await,
            Command::Select { query } => services.select(&query).await,
            Command::Clear => {
                selected::clear(&services.store)?;
                println!("Selection cleared; using device position.");
                Ok(())
            }
            Command::Format { format } => {
                format.save(&services.store)?;
                Ok(())
            }
        }
    }
}

struct Services {
    store: SharedStore,
    resolver: LocationResolver,
    place_search: PlaceSearch,
}

impl Services {
    fn build() -> Result<Self> {
        let config = Config::load()?;
        let store = skyclock_core::store::shared(FileStore::open(config.state_path())?);

        let cache = WeatherCache::new(store.clone());
        let fetcher = match &config.services.weather_base_url {
            Some(base) => WeatherFetcher::with_base_url(cache, base),
            None => WeatherFetcher::new(cache),
        };

        let geocode_key = config.services.geocode_api_key.clone();
        let geocoder = match &config.services.geocode_base_url {
            Some(base) => ReverseGeocoder::with_base_url(geocode_key, base),
            None => ReverseGeocoder::new(geocode_key),
        };

        let place_search = match &config.services.search_base_url {
            Some(base) => PlaceSearch::with_base_url(fetcher.clone(), base),
            None => PlaceSearch::new(fetcher.clone()),
        };

        let source = Arc::new(ConfiguredPosition::from_parts(
            config.device.latitude,
            config.device.longitude,
        ));
        let resolver = LocationResolver::new(fetcher, geocoder, source);

        Ok(Self {
            store,
            resolver,
            place_search,
        })
    }

    async fn show(&self) -> Result<()> {
        let (state, selected) = self.resolve_current().await;
        render(&state, TimeFormat::load(&self.store), selected);
        Ok(())
    }

    async fn watch(&self) -> Result<()> {
        let (state, selected) = self.resolve_current().await;
        render(&state, TimeFormat::load(&self.store), selected);

        // A selected place shows the service-reported local time, which a
        // ticker cannot advance; the live clock only runs on device time.
        if selected {
            return Ok(());
        }

        let format = TimeFormat::load(&self.store);
        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let parts = TimeParts::of(chrono::Local::now().time(), format);
                    print!("\r{parts}  ");
                    use std::io::Write;
                    let _ = std::io::stdout().flush();
                }
                _ = tokio::signal::ctrl_c() => {
                    println!();
                    return Ok(());
                }
            }
        }
    }

    async fn search(&self, query: &str) -> Result<()> {
        self.place_search.input(query).await;
        let results = self.place_search.results();

        if query.trim().len() < skyclock_weather::search::MIN_QUERY_LEN {
            println!("Please enter at least 3 characters.");
            return Ok(());
        }
        if results.is_empty() {
            println!("No places found.");
            return Ok(());
        }

        for place in results {
            println!("{}", place.display_name);
            if let Some(weather) = &place.weather {
                println!("    {}", describe(weather));
            }
        }
        Ok(())
    }

    async fn select(&self, query: &str) -> Result<()> {
        let candidates = self.place_search.search_now(query.trim()).await?;
        let place = candidates
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No place found for '{query}'"))?;

        selected::save(&self.store, &place)?;
        println!("Selected: {}", place.display_name);
        Ok(())
    }

    /// One resolution cycle for the persisted selection, or the device
    /// position when nothing is selected. Also reports whether a selection
    /// was active, which decides whose clock the display follows.
    async fn resolve_current(&self) -> (ResolutionState, bool) {
        let place = selected::load(&self.store);
        let selected = place.is_some();
        self.resolver.resolve(place).await;
        (self.resolver.state(), selected)
    }
}

fn render(state: &ResolutionState, format: TimeFormat, selected: bool) {
    // An explicit place shows the service-reported local time; the device
    // clock is only authoritative for the device's own position.
    let time = if selected {
        state.weather.as_ref().and_then(|w| w.local_time).map(|t| t.time())
    } else {
        None
    }
    .unwrap_or_else(|| chrono::Local::now().time());
    println!("{}", TimeParts::of(time, format));

    match &state.label {
        Some(label) => println!("{label}"),
        None => println!("Getting location..."),
    }

    match (&state.weather, &state.error) {
        (Some(weather), _) => println!("{}", describe(weather)),
        (None, Some(error)) => println!("{}", error.user_message()),
        (None, None) => println!("Loading weather data..."),
    }
}

fn describe(weather: &WeatherSnapshot) -> String {
    format!(
        "{}  {:.1}°C  {:.1} km/h  {}%",
        weather.condition().description(),
        weather.temperature,
        weather.wind_speed,
        weather.humidity
    )
}
