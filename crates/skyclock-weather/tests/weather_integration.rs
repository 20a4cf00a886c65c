//! Integration tests for weather fetching and location resolution against
//! mock HTTP services.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use skyclock_core::store::{shared, MemoryStore, SharedStore};
use skyclock_weather::{
    ConfiguredPosition, Coordinate, LocationResolver, PlaceCandidate, ResolveError,
    ReverseGeocoder, WeatherCache, WeatherFetcher, WeatherSnapshot,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn forecast_body(temperature: f64) -> serde_json::Value {
    serde_json::json!({
        "current_weather": {
            "temperature": temperature,
            "windspeed": 14.2,
            "weathercode": 3,
            "humidity": 71,
            "time": "2026-08-30T14:30"
        }
    })
}

fn geocode_body(city: &str, country: &str) -> serde_json::Value {
    serde_json::json!({
        "results": [
            { "components": { "city": city, "state": "Berlin", "country": country } }
        ]
    })
}

fn fetcher_against(server: &MockServer, store: SharedStore) -> WeatherFetcher {
    WeatherFetcher::with_base_url(WeatherCache::new(store), &server.uri())
}

fn place(name: &str, lat: f64, lon: f64) -> PlaceCandidate {
    PlaceCandidate {
        display_name: name.to_string(),
        latitude: lat,
        longitude: lon,
        weather: None,
    }
}

fn snapshot(temperature: f64) -> WeatherSnapshot {
    WeatherSnapshot {
        temperature,
        wind_speed: 1.0,
        weather_code: 0,
        humidity: 40,
        local_time: None,
    }
}

#[tokio::test]
async fn test_fetch_normalizes_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("latitude", "52.52"))
        .and(query_param("longitude", "13.405"))
        .and(query_param("current_weather", "true"))
        .and(query_param("timezone", "auto"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(21.3)))
        .mount(&server)
        .await;

    let fetcher = fetcher_against(&server, shared(MemoryStore::new()));
    let weather = fetcher.fetch(Coordinate::new(52.52, 13.405)).await.unwrap();

    assert_eq!(weather.temperature, 21.3);
    assert_eq!(weather.wind_speed, 14.2);
    assert_eq!(weather.weather_code, 3);
    assert_eq!(weather.humidity, 71);
    assert!(weather.local_time.is_some());
}

#[tokio::test]
async fn test_fetch_defaults_missing_humidity() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "current_weather": {
                "temperature": -2.0,
                "windspeed": 3.0,
                "weathercode": 71
            }
        })))
        .mount(&server)
        .await;

    let fetcher = fetcher_against(&server, shared(MemoryStore::new()));
    let weather = fetcher.fetch(Coordinate::new(60.17, 24.94)).await.unwrap();
    assert_eq!(weather.humidity, 50);
}

#[tokio::test]
async fn test_second_fetch_is_served_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(21.3)))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher_against(&server, shared(MemoryStore::new()));
    let coord = Coordinate::new(52.52, 13.405);

    let first = fetcher.fetch(coord).await.unwrap();
    let second = fetcher.fetch(coord).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_failed_fetch_does_not_touch_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = shared(MemoryStore::new());
    let fetcher = fetcher_against(&server, store.clone());
    let coord = Coordinate::new(52.52, 13.405);

    assert!(fetcher.fetch(coord).await.is_err());
    assert!(WeatherCache::new(store).get(coord).is_none());
}

#[tokio::test]
async fn test_missing_current_weather_block_is_a_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let fetcher = fetcher_against(&server, shared(MemoryStore::new()));
    assert!(fetcher.fetch(Coordinate::new(0.0, 0.0)).await.is_err());
}

fn resolver_against(
    server: &MockServer,
    geocode_key: Option<String>,
    source: ConfiguredPosition,
) -> LocationResolver {
    let fetcher = fetcher_against(server, shared(MemoryStore::new()));
    let geocoder = ReverseGeocoder::with_base_url(geocode_key, &server.uri());
    LocationResolver::new(fetcher, geocoder, Arc::new(source))
}

#[tokio::test]
async fn test_mode_a_uses_attached_weather_without_fetching() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(0.0)))
        .expect(0)
        .mount(&server)
        .await;

    let resolver = resolver_against(&server, None, ConfiguredPosition::default());
    let mut selected = place("Berlin, Deutschland", 52.52, 13.405);
    selected.weather = Some(snapshot(19.0));

    resolver.resolve(Some(selected)).await;

    let state = resolver.state();
    assert_eq!(state.label.as_deref(), Some("Berlin, Deutschland"));
    assert_eq!(state.weather, Some(snapshot(19.0)));
    assert!(state.error.is_none());
    assert!(!state.loading);
}

#[tokio::test]
async fn test_mode_a_fetches_when_weather_missing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(21.3)))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = resolver_against(&server, None, ConfiguredPosition::default());
    resolver.resolve(Some(place("Berlin, Deutschland", 52.52, 13.405))).await;

    let state = resolver.state();
    assert_eq!(state.label.as_deref(), Some("Berlin, Deutschland"));
    assert_eq!(state.weather.map(|w| w.temperature), Some(21.3));
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_mode_a_surfaces_weather_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let resolver = resolver_against(&server, None, ConfiguredPosition::default());
    resolver.resolve(Some(place("Nowhere", 1.0, 2.0))).await;

    let state = resolver.state();
    // The label is known synchronously even when the weather fails.
    assert_eq!(state.label.as_deref(), Some("Nowhere"));
    assert_eq!(state.error, Some(ResolveError::WeatherUnavailable));
    assert!(state.weather.is_none());
    assert!(!state.loading);
}

#[tokio::test]
async fn test_mode_b_resolves_weather_and_label() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("latitude", "52.52"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(21.3)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/geocode/v1/json"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(geocode_body("Berlin", "Germany")))
        .mount(&server)
        .await;

    let resolver = resolver_against(
        &server,
        Some("test-key".to_string()),
        ConfiguredPosition::from_parts(Some(52.52), Some(13.405)),
    );
    resolver.resolve(None).await;

    let state = resolver.state();
    assert_eq!(state.label.as_deref(), Some("Berlin, Germany"));
    assert_eq!(state.weather.map(|w| w.temperature), Some(21.3));
    assert!(state.error.is_none());
    assert!(!state.loading);
}

#[tokio::test]
async fn test_mode_b_geocode_failure_is_partial() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(21.3)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/geocode/v1/json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let resolver = resolver_against(
        &server,
        Some("test-key".to_string()),
        ConfiguredPosition::from_parts(Some(52.52), Some(13.405)),
    );
    resolver.resolve(None).await;

    let state = resolver.state();
    // Weather renders normally; only the label stays unresolved.
    assert_eq!(state.weather.map(|w| w.temperature), Some(21.3));
    assert!(state.label.is_none());
    assert!(state.error.is_none());
    assert!(!state.loading);
}

#[tokio::test]
async fn test_mode_b_geolocation_failure_is_terminal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(0.0)))
        .expect(0)
        .mount(&server)
        .await;

    let resolver = resolver_against(&server, None, ConfiguredPosition::default());
    resolver.resolve(None).await;

    let state = resolver.state();
    assert!(matches!(state.error, Some(ResolveError::GeolocationUnavailable(_))));
    assert!(state.weather.is_none());
    assert!(!state.loading);
}

#[tokio::test]
async fn test_stale_cycle_results_are_discarded() {
    let server = MockServer::start().await;
    // Cycle A's weather fetch resolves slowly.
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("latitude", "52.52"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(forecast_body(99.0))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let resolver = resolver_against(
        &server,
        None,
        ConfiguredPosition::from_parts(Some(52.52), Some(13.405)),
    );

    // Cycle A: device position, weather pending.
    let background = resolver.clone();
    let cycle_a = tokio::spawn(async move { background.resolve(None).await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Cycle B: explicit place with attached weather, terminal immediately.
    let mut selected = place("Paris, France", 48.8566, 2.3522);
    selected.weather = Some(snapshot(18.0));
    let generation_b = resolver.resolve(Some(selected)).await;

    // Let cycle A's fetch resolve late; its result must be dropped.
    cycle_a.await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let state = resolver.state();
    assert_eq!(state.generation, generation_b);
    assert_eq!(state.label.as_deref(), Some("Paris, France"));
    assert_eq!(state.weather, Some(snapshot(18.0)));
    assert!(state.error.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_racing_cycles_settle_on_newest_generation() {
    let server = MockServer::start().await;
    let resolver = resolver_against(&server, None, ConfiguredPosition::default());

    // Two cycles started from parallel tasks; whichever draws the higher
    // generation must own the final state, never the other.
    for _ in 0..50 {
        let mut berlin = place("Berlin, Deutschland", 52.52, 13.405);
        berlin.weather = Some(snapshot(19.0));
        let mut paris = place("Paris, France", 48.8566, 2.3522);
        paris.weather = Some(snapshot(18.0));

        let first = {
            let resolver = resolver.clone();
            tokio::spawn(async move { resolver.resolve(Some(berlin)).await })
        };
        let second = {
            let resolver = resolver.clone();
            tokio::spawn(async move { resolver.resolve(Some(paris)).await })
        };
        let (gen_berlin, gen_paris) = (first.await.unwrap(), second.await.unwrap());

        let state = resolver.state();
        assert_eq!(state.generation, gen_berlin.max(gen_paris));
        let expected = if gen_berlin > gen_paris {
            "Berlin, Deutschland"
        } else {
            "Paris, France"
        };
        assert_eq!(state.label.as_deref(), Some(expected));
        assert!(!state.loading);
    }
}
