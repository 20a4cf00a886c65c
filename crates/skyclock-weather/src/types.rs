use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Geographic coordinate pair. Immutable once obtained for a resolution
/// cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Normalized current-weather reading for one coordinate pair at one point
/// in time. Read-only once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Temperature in °C
    pub temperature: f64,
    /// Wind speed in km/h
    pub wind_speed: f64,
    /// Raw WMO weather code
    pub weather_code: i32,
    /// Relative humidity 0-100; the upstream service does not always report
    /// it, in which case 50 is assumed
    pub humidity: u8,
    /// Local observation time reported by the service; drives the displayed
    /// clock when viewing an explicit place
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_time: Option<NaiveDateTime>,
}

impl WeatherSnapshot {
    pub fn condition(&self) -> WeatherCondition {
        WeatherCondition::from_wmo_code(self.weather_code)
    }
}

/// Weather condition categories mapped from WMO codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    #[default]
    Clear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    HeavyRain,
    Snow,
    Sleet,
    Thunderstorm,
}

impl WeatherCondition {
    /// Convert WMO weather code to WeatherCondition
    /// See: https://open-meteo.com/en/docs#weathervariables
    pub fn from_wmo_code(code: i32) -> Self {
        match code {
            0 => Self::Clear,
            1..=2 => Self::PartlyCloudy,
            3 => Self::Cloudy,
            45 | 48 => Self::Fog,
            51 | 53 | 55 => Self::Drizzle,
            56 | 57 => Self::Sleet, // Freezing drizzle
            61 | 63 | 80 => Self::Rain,
            65 | 81 | 82 => Self::HeavyRain,
            66 | 67 => Self::Sleet, // Freezing rain
            71 | 73 | 75 | 77 | 85 | 86 => Self::Snow,
            95 | 96 | 99 => Self::Thunderstorm,
            _ => Self::Clear, // Unknown codes default to clear
        }
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::Cloudy => "Cloudy",
            Self::Fog => "Fog",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::HeavyRain => "Heavy Rain",
            Self::Snow => "Snow",
            Self::Sleet => "Sleet",
            Self::Thunderstorm => "Thunderstorm",
        }
    }
}

/// A place returned by the search service, with its weather preview attached
/// asynchronously. Rebuilt on every search; persisted only when the user
/// selects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceCandidate {
    pub display_name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherSnapshot>,
}

impl PlaceCandidate {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Device position errors
#[derive(Debug, thiserror::Error)]
pub enum GeolocationError {
    #[error("Geolocation is not supported on this system")]
    Unsupported,
    #[error("Position request timed out")]
    Timeout,
    #[error("Geolocation error: {0}")]
    Other(String),
}

/// Weather fetch and place search errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Weather service returned status {0}")]
    Upstream(reqwest::StatusCode),
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Terminal outcome of a resolution cycle, rendered directly by the
/// presentation layer. Reverse-geocode failures are not represented here;
/// they only leave the label unresolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("Could not retrieve location: {0}")]
    GeolocationUnavailable(String),
    #[error("Could not fetch weather data")]
    WeatherUnavailable,
}

impl ResolveError {
    /// User-facing message for the presentation layer.
    pub fn user_message(&self) -> &'static str {
        match self {
            ResolveError::GeolocationUnavailable(_) => "Could not retrieve location.",
            ResolveError::WeatherUnavailable => "Could not fetch weather data.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wmo_code_clear() {
        assert_eq!(WeatherCondition::from_wmo_code(0), WeatherCondition::Clear);
    }

    #[test]
    fn test_wmo_code_partly_cloudy() {
        assert_eq!(WeatherCondition::from_wmo_code(1), WeatherCondition::PartlyCloudy);
        assert_eq!(WeatherCondition::from_wmo_code(2), WeatherCondition::PartlyCloudy);
    }

    #[test]
    fn test_wmo_code_rain_buckets() {
        assert_eq!(WeatherCondition::from_wmo_code(61), WeatherCondition::Rain);
        assert_eq!(WeatherCondition::from_wmo_code(80), WeatherCondition::Rain);
        assert_eq!(WeatherCondition::from_wmo_code(82), WeatherCondition::HeavyRain);
    }

    #[test]
    fn test_wmo_code_unknown_defaults_to_clear() {
        assert_eq!(WeatherCondition::from_wmo_code(999), WeatherCondition::Clear);
        assert_eq!(WeatherCondition::from_wmo_code(-1), WeatherCondition::Clear);
    }

    #[test]
    fn test_snapshot_condition() {
        let snapshot = WeatherSnapshot {
            temperature: 3.5,
            wind_speed: 12.0,
            weather_code: 95,
            humidity: 80,
            local_time: None,
        };
        assert_eq!(snapshot.condition(), WeatherCondition::Thunderstorm);
        assert_eq!(snapshot.condition().description(), "Thunderstorm");
    }

    #[test]
    fn test_snapshot_serde_skips_absent_local_time() {
        let snapshot = WeatherSnapshot {
            temperature: 20.0,
            wind_speed: 5.0,
            weather_code: 0,
            humidity: 50,
            local_time: None,
        };
        let json = serde_json::to_string(&snapshot).unwrap_or_default();
        assert!(!json.contains("local_time"));

        let back: Result<WeatherSnapshot, _> = serde_json::from_str(&json);
        assert_eq!(back.ok(), Some(snapshot));
    }

    #[test]
    fn test_candidate_coordinate() {
        let place = PlaceCandidate {
            display_name: "Berlin, Deutschland".to_string(),
            latitude: 52.52,
            longitude: 13.405,
            weather: None,
        };
        assert_eq!(place.coordinate(), Coordinate::new(52.52, 13.405));
    }
}
