//! Current-weather fetching against an Open-Meteo-shaped service, with
//! cache-first semantics.

use chrono::NaiveDateTime;
use reqwest::Client;
use serde::Deserialize;

use crate::cache::WeatherCache;
use crate::types::{Coordinate, WeatherError, WeatherSnapshot};

const OPEN_METEO_BASE: &str = "https://api.open-meteo.com";

/// Humidity assumed when the service omits the field.
const DEFAULT_HUMIDITY: u8 = 50;

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current_weather: Option<CurrentWeatherBlock>,
}

#[derive(Debug, Deserialize)]
struct CurrentWeatherBlock {
    temperature: f64,
    windspeed: f64,
    weathercode: i32,
    humidity: Option<u8>,
    time: Option<String>,
}

impl CurrentWeatherBlock {
    fn into_snapshot(self) -> WeatherSnapshot {
        WeatherSnapshot {
            temperature: self.temperature,
            wind_speed: self.windspeed,
            weather_code: self.weathercode,
            humidity: self.humidity.unwrap_or(DEFAULT_HUMIDITY),
            local_time: self.time.as_deref().and_then(parse_local_time),
        }
    }
}

/// Open-Meteo reports local time as e.g. "2026-08-30T14:30", occasionally
/// with seconds. An unparseable value only loses the Mode-A clock, so it
/// degrades to `None`.
fn parse_local_time(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|e| tracing::debug!("Unparseable observation time '{}': {}", raw, e))
        .ok()
}

/// Resolves weather for a coordinate pair, consulting the cache before the
/// network. One failed attempt is final for that call; there is no retry and
/// no client-side timeout.
#[derive(Clone)]
pub struct WeatherFetcher {
    client: Client,
    base_url: String,
    cache: WeatherCache,
}

impl WeatherFetcher {
    pub fn new(cache: WeatherCache) -> Self {
        Self::with_base_url(cache, OPEN_METEO_BASE)
    }

    pub fn with_base_url(cache: WeatherCache, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            cache,
        }
    }

    /// Fetch the current weather for `coord`.
    ///
    /// Cache hits return immediately with no network call. A successful miss
    /// writes the normalized snapshot back under the same coordinates.
    /// Failures leave the cache untouched.
    ///
    /// # Errors
    /// `WeatherError` on any network, status or parse failure.
    pub async fn fetch(&self, coord: Coordinate) -> Result<WeatherSnapshot, WeatherError> {
        if let Some(snapshot) = self.cache.get(coord) {
            tracing::debug!("Using cached weather data");
            return Ok(snapshot);
        }

        let url = format!("{}/v1/forecast", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", coord.latitude.to_string()),
                ("longitude", coord.longitude.to_string()),
                ("current_weather", "true".to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Upstream(status));
        }

        let body: ForecastResponse = response.json().await?;
        let block = body
            .current_weather
            .ok_or_else(|| WeatherError::Parse("missing current_weather block".to_string()))?;

        let snapshot = block.into_snapshot();
        self.cache.put(coord, &snapshot);
        Ok(snapshot)
    }
}
