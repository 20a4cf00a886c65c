//! Debounced place search with weather previews.
//!
//! Keystrokes feed [`PlaceSearch::input`]; a search is only issued after the
//! debounce window of input inactivity, and a superseded search never
//! overwrites the candidate list of a newer one (same generation-token
//! scheme as the resolver).

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use serde::Deserialize;

use crate::provider::WeatherFetcher;
use crate::types::{PlaceCandidate, WeatherError};

const NOMINATIM_BASE: &str = "https://nominatim.openstreetmap.org";
const AGENT: &str = "skyclock/0.1 (clock & weather companion)";

/// Quiet period required after the last keystroke before searching.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(600);

/// Queries shorter than this clear the list without a request.
pub const MIN_QUERY_LEN: usize = 3;

/// Maximum number of candidates requested from the search service.
pub const SEARCH_LIMIT: usize = 5;

/// Nominatim returns lat/lon as numeric strings; parsed at this boundary.
#[derive(Debug, Deserialize)]
struct SearchHit {
    display_name: String,
    lat: String,
    lon: String,
}

#[derive(Clone)]
pub struct PlaceSearch {
    client: Client,
    base_url: String,
    fetcher: WeatherFetcher,
    debounce: Duration,
    generation: Arc<AtomicU64>,
    results: Arc<Mutex<Vec<PlaceCandidate>>>,
    searching: Arc<AtomicBool>,
}

impl PlaceSearch {
    pub fn new(fetcher: WeatherFetcher) -> Self {
        Self::with_base_url(fetcher, NOMINATIM_BASE)
    }

    pub fn with_base_url(fetcher: WeatherFetcher, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            fetcher,
            debounce: DEBOUNCE_WINDOW,
            generation: Arc::new(AtomicU64::new(0)),
            results: Arc::new(Mutex::new(Vec::new())),
            searching: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shorten the debounce window (tests).
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Current candidate list, in the order the search service returned.
    pub fn results(&self) -> Vec<PlaceCandidate> {
        self.results.lock().clone()
    }

    /// Whether a search request is currently in flight (drives the spinner).
    pub fn is_searching(&self) -> bool {
        self.searching.load(Ordering::SeqCst)
    }

    /// Feed the current query text, as of the latest keystroke.
    ///
    /// Waits out the debounce window and then searches, unless a newer
    /// keystroke arrives in the meantime. Queries below the minimum length
    /// clear the candidate list immediately without any request. Returns
    /// this input's generation token.
    pub async fn input(&self, query: &str) -> u64 {
        let query = query.trim().to_string();

        // Bump and clear inside one critical section; an older input's
        // clear must never land after a newer one's candidates.
        let generation = {
            let mut results = self.results.lock();
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            if query.len() < MIN_QUERY_LEN {
                results.clear();
                self.searching.store(false, Ordering::SeqCst);
            }
            generation
        };
        if query.len() < MIN_QUERY_LEN {
            return generation;
        }

        tokio::time::sleep(self.debounce).await;
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(query = %query, "Query superseded during debounce");
            return generation;
        }

        self.searching.store(true, Ordering::SeqCst);
        match self.search_now(&query).await {
            Ok(candidates) => self.apply(generation, candidates),
            Err(e) => {
                tracing::warn!("Place search failed: {}", e);
                self.apply(generation, Vec::new());
            }
        }
        generation
    }

    /// Issue one search request and attach a weather preview to every
    /// candidate concurrently. A per-candidate weather failure leaves its
    /// `weather` unset; it never fails the search. Queries below the
    /// minimum length yield an empty list without any request.
    ///
    /// # Errors
    /// `WeatherError` when the search request itself fails.
    pub async fn search_now(&self, query: &str) -> Result<Vec<PlaceCandidate>, WeatherError> {
        let query = query.trim();
        if query.len() < MIN_QUERY_LEN {
            tracing::debug!(query = %query, "Query below minimum length, not searching");
            return Ok(Vec::new());
        }

        let url = format!("{}/search", self.base_url);
        let limit = SEARCH_LIMIT.to_string();
        let response = self
            .client
            .get(&url)
            .header(USER_AGENT, AGENT)
            .query(&[("q", query), ("format", "json"), ("limit", &limit)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Upstream(status));
        }

        let hits: Vec<SearchHit> = response.json().await?;
        let mut candidates: Vec<PlaceCandidate> = hits
            .into_iter()
            .filter_map(|hit| {
                match (hit.lat.parse::<f64>(), hit.lon.parse::<f64>()) {
                    (Ok(latitude), Ok(longitude)) => Some(PlaceCandidate {
                        display_name: hit.display_name,
                        latitude,
                        longitude,
                        weather: None,
                    }),
                    _ => {
                        tracing::debug!(
                            place = %hit.display_name,
                            "Dropping candidate with unparseable coordinates"
                        );
                        None
                    }
                }
            })
            .collect();

        let previews: Vec<_> = candidates
            .iter()
            .map(|candidate| {
                let fetcher = self.fetcher.clone();
                let coord = candidate.coordinate();
                tokio::spawn(async move { fetcher.fetch(coord).await.ok() })
            })
            .collect();

        for (candidate, preview) in candidates.iter_mut().zip(previews) {
            // A failed preview fetch (or panicked task) just leaves the
            // candidate without weather.
            candidate.weather = preview.await.ok().flatten();
        }

        Ok(candidates)
    }

    fn apply(&self, generation: u64, candidates: Vec<PlaceCandidate>) {
        let mut results = self.results.lock();
        if self.generation.load(Ordering::SeqCst) == generation {
            *results = candidates;
            self.searching.store(false, Ordering::SeqCst);
        } else {
            tracing::debug!(
                stale = generation,
                "Discarding candidate list from superseded search"
            );
        }
    }
}
