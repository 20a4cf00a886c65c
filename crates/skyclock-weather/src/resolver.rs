//! Location + weather resolution cycles.
//!
//! A cycle is triggered by selecting a place, clearing the selection or the
//! initial load. Every cycle carries a generation token; any asynchronous
//! completion re-checks its token against the current one before applying
//! its piece of state, so results from a superseded cycle are discarded
//! instead of overwriting newer state. In-flight requests are not actually
//! aborted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::geocode::ReverseGeocoder;
use crate::location::{GeolocationSource, PositionOptions};
use crate::provider::WeatherFetcher;
use crate::types::{GeolocationError, PlaceCandidate, ResolveError, WeatherSnapshot};

/// Observable outcome of the active resolution cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolutionState {
    /// Token of the cycle this state belongs to.
    pub generation: u64,
    /// Human-readable location label; `None` while unresolved.
    pub label: Option<String>,
    pub weather: Option<WeatherSnapshot>,
    pub error: Option<ResolveError>,
    pub loading: bool,
}

type SharedState = Arc<Mutex<ResolutionState>>;

#[derive(Clone)]
pub struct LocationResolver {
    fetcher: WeatherFetcher,
    geocoder: ReverseGeocoder,
    source: Arc<dyn GeolocationSource>,
    options: PositionOptions,
    state: SharedState,
    generation: Arc<AtomicU64>,
}

impl LocationResolver {
    pub fn new(
        fetcher: WeatherFetcher,
        geocoder: ReverseGeocoder,
        source: Arc<dyn GeolocationSource>,
    ) -> Self {
        Self {
            fetcher,
            geocoder,
            source,
            options: PositionOptions::default(),
            state: Arc::new(Mutex::new(ResolutionState::default())),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ResolutionState {
        self.state.lock().clone()
    }

    /// Run one resolution cycle. `Some(place)` resolves an explicit place,
    /// `None` the device position. Starting a cycle supersedes any cycle
    /// still in flight. Returns this cycle's generation token.
    pub async fn resolve(&self, place: Option<PlaceCandidate>) -> u64 {
        // Bump and reset inside one critical section; an older cycle's
        // reset must never land after a newer one's.
        let generation = {
            let mut st = self.state.lock();
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *st = ResolutionState {
                generation,
                loading: true,
                ..ResolutionState::default()
            };
            generation
        };

        match place {
            Some(place) => self.resolve_place(generation, place).await,
            None => self.resolve_device(generation).await,
        }
        generation
    }

    /// Mode A: an explicit place. The label is known synchronously; weather
    /// comes pre-attached from search or from one fetch. Terminal on first
    /// success or failure.
    async fn resolve_place(&self, generation: u64, place: PlaceCandidate) {
        apply_to(&self.state, generation, |st| {
            st.label = Some(place.display_name.clone());
        });

        if let Some(weather) = place.weather.clone() {
            apply_to(&self.state, generation, |st| {
                st.weather = Some(weather);
                st.loading = false;
            });
            return;
        }

        match self.fetcher.fetch(place.coordinate()).await {
            Ok(weather) => apply_to(&self.state, generation, |st| {
                st.weather = Some(weather);
                st.loading = false;
            }),
            Err(e) => {
                tracing::warn!("Weather fetch for selected place failed: {}", e);
                apply_to(&self.state, generation, |st| {
                    st.error = Some(ResolveError::WeatherUnavailable);
                    st.loading = false;
                });
            }
        }
    }

    /// Mode B: device position, then weather and reverse geocode as two
    /// independent tasks. Whichever completes updates only its own piece of
    /// state; a geocode failure just leaves the label unresolved.
    async fn resolve_device(&self, generation: u64) {
        let position = tokio::time::timeout(
            self.options.timeout,
            self.source.current_position(self.options),
        )
        .await
        .unwrap_or(Err(GeolocationError::Timeout));

        let coord = match position {
            Ok(coord) => coord,
            Err(e) => {
                tracing::warn!("Geolocation failed: {}", e);
                apply_to(&self.state, generation, |st| {
                    st.error = Some(ResolveError::GeolocationUnavailable(e.to_string()));
                    st.loading = false;
                });
                return;
            }
        };

        let weather_task = {
            let fetcher = self.fetcher.clone();
            let state = self.state.clone();
            tokio::spawn(async move {
                match fetcher.fetch(coord).await {
                    Ok(weather) => apply_to(&state, generation, |st| {
                        st.weather = Some(weather);
                    }),
                    Err(e) => {
                        tracing::warn!("Weather fetch failed: {}", e);
                        apply_to(&state, generation, |st| {
                            st.error = Some(ResolveError::WeatherUnavailable);
                        });
                    }
                }
            })
        };

        let label_task = {
            let geocoder = self.geocoder.clone();
            let state = self.state.clone();
            tokio::spawn(async move {
                if let Some(label) = geocoder.lookup(coord).await {
                    apply_to(&state, generation, |st| {
                        st.label = Some(label);
                    });
                }
            })
        };

        let (weather_joined, label_joined) = tokio::join!(weather_task, label_task);
        for joined in [weather_joined, label_joined] {
            if let Err(e) = joined {
                tracing::error!("Resolution task panicked: {}", e);
            }
        }

        apply_to(&self.state, generation, |st| st.loading = false);
    }
}

/// Apply a state change only if `generation` is still the active cycle.
fn apply_to(state: &SharedState, generation: u64, f: impl FnOnce(&mut ResolutionState)) {
    let mut st = state.lock();
    if st.generation == generation {
        f(&mut st);
    } else {
        tracing::debug!(
            stale = generation,
            current = st.generation,
            "Discarding result from superseded cycle"
        );
    }
}
