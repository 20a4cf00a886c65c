//! Location resolution, place search and weather data for skyclock.
//!
//! Weather comes from an Open-Meteo-shaped API with a five-minute local
//! cache, place search from Nominatim, labels from reverse geocoding.

pub mod cache;
pub mod geocode;
pub mod location;
pub mod provider;
pub mod resolver;
pub mod search;
pub mod selected;
pub mod types;

pub use cache::WeatherCache;
pub use geocode::ReverseGeocoder;
pub use location::{ConfiguredPosition, GeolocationSource, PositionOptions};
pub use provider::WeatherFetcher;
pub use resolver::{LocationResolver, ResolutionState};
pub use search::PlaceSearch;
pub use types::*;
