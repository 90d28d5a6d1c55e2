//! Weather lookup
//!
//! The dialogue core only needs [`WeatherService::fetch`]; the bundled
//! implementation talks to OpenWeatherMap.

pub mod openweather;

use crate::error::VoiceResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use openweather::OpenWeatherClient;

/// Current conditions for one city; lives for a single turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub city: String,
    /// Degrees Celsius, rounded
    pub temp: i32,
    pub feels_like: i32,
    /// Condition group such as "Clear" or "Rain"
    pub condition: String,
    pub description: String,
    /// Percent
    pub humidity: u8,
    /// Meters per second
    pub wind_speed: f64,
}

impl WeatherReport {
    /// Emoji for the condition group, used in logs
    pub fn emoji(&self) -> &'static str {
        match self.condition.as_str() {
            "Clear" => "☀️",
            "Clouds" => "☁️",
            "Rain" => "🌧️",
            "Snow" => "❄️",
            "Thunderstorm" => "⛈️",
            "Drizzle" => "🌦️",
            "Mist" | "Fog" | "Haze" => "🌫️",
            "Smoke" | "Squall" => "💨",
            "Dust" | "Tornado" => "🌪️",
            "Sand" => "🏜️",
            "Ash" => "🌋",
            _ => "🌈",
        }
    }
}

/// Weather collaborator
#[async_trait]
pub trait WeatherService: Send + Sync {
    /// Current conditions for `city`
    async fn fetch(&self, city: &str) -> VoiceResult<WeatherReport>;
}
