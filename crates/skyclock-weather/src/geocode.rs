//! Reverse geocoding: convert coordinates to a human-readable label.
//!
//! Failures here never fail a resolution cycle; they are logged and the
//! label simply stays unresolved.

use reqwest::Client;
use serde::Deserialize;

use crate::types::Coordinate;

const OPENCAGE_BASE: &str = "https://api.opencagedata.com";

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    components: AddressComponents,
}

#[derive(Debug, Deserialize, Default)]
struct AddressComponents {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

impl AddressComponents {
    /// "city, country" with town/village as fallbacks for the place and
    /// state as fallback for the country.
    fn label(self) -> Option<String> {
        let place = self.city.or(self.town).or(self.village)?;
        match self.country.or(self.state) {
            Some(region) => Some(format!("{place}, {region}")),
            None => Some(place),
        }
    }
}

#[derive(Clone)]
pub struct ReverseGeocoder {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl ReverseGeocoder {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(api_key, OPENCAGE_BASE)
    }

    pub fn with_base_url(api_key: Option<String>, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Reverse geocode `coord` to a label like "Berlin, Germany".
    ///
    /// Returns `None` on any failure (missing API key, network, parse, no
    /// usable components); the caller keeps its placeholder label.
    pub async fn lookup(&self, coord: Coordinate) -> Option<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::debug!("No geocode API key configured, skipping label lookup");
            return None;
        };

        let url = format!("{}/geocode/v1/json", self.base_url);
        let query = format!("{},{}", coord.latitude, coord.longitude);

        let response = match self
            .client
            .get(&url)
            .query(&[("q", query.as_str()), ("key", api_key)])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("Reverse geocode request failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!("Reverse geocode returned status {}", response.status());
            return None;
        }

        let body: GeocodeResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                tracing::debug!("Reverse geocode parse error: {}", e);
                return None;
            }
        };

        let label = body.results.into_iter().next()?.components.label()?;
        tracing::info!("Reverse geocoded to: {}", label);
        Some(label)
    }
}
