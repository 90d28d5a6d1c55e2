//! OpenWeatherMap current-weather client

use super::{WeatherReport, WeatherService};
use crate::config::Config;
use crate::error::{Service, VoiceError, VoiceResult};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct ApiResponse {
    name: String,
    main: ApiMain,
    weather: Vec<ApiCondition>,
    wind: ApiWind,
}

#[derive(Debug, Deserialize)]
struct ApiMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct ApiCondition {
    main: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ApiWind {
    speed: f64,
}

impl TryFrom<ApiResponse> for WeatherReport {
    type Error = VoiceError;

    fn try_from(api: ApiResponse) -> Result<Self, Self::Error> {
        let condition = api
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| weather_error("payload has no weather conditions"))?;
        Ok(WeatherReport {
            city: api.name,
            temp: api.main.temp.round() as i32,
            feels_like: api.main.feels_like.round() as i32,
            condition: condition.main,
            description: condition.description,
            humidity: api.main.humidity,
            wind_speed: api.wind.speed,
        })
    }
}

pub struct OpenWeatherClient {
    url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenWeatherClient {
    pub fn new(config: &Config) -> VoiceResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.service_timeout())
            .build()
            .map_err(weather_error)?;
        Ok(Self {
            url: config.weather_url.clone(),
            api_key: config.weather_api_key.clone(),
            client,
        })
    }
}

/// Decode a successful response body
fn parse_report(body: &str) -> VoiceResult<WeatherReport> {
    let api: ApiResponse = serde_json::from_str(body)
        .map_err(|e| weather_error(format!("malformed payload: {}", e)))?;
    WeatherReport::try_from(api)
}

#[async_trait]
impl WeatherService for OpenWeatherClient {
    async fn fetch(&self, city: &str) -> VoiceResult<WeatherReport> {
        if self.api_key.trim().is_empty() {
            return Err(weather_error("API key missing (set OPEN_WEATHER_API)"));
        }

        debug!("Fetching weather for {}", city);
        let response = self
            .client
            .get(&self.url)
            .query(&[("q", city), ("appid", self.api_key.as_str()), ("units", "metric")])
            .send()
            .await
            .map_err(weather_error)?;

        let status = response.status();
        let body = response.text().await.map_err(weather_error)?;
        match status {
            StatusCode::NOT_FOUND => {
                return Err(weather_error(format!("city not found: {}", city)));
            }
            StatusCode::UNAUTHORIZED => {
                return Err(weather_error("API key rejected"));
            }
            s if !s.is_success() => {
                return Err(weather_error(format!("API error {}: {}", s, body)));
            }
            _ => {}
        }

        let report = parse_report(&body)?;
        info!(
            "{} Weather for {}: {}, {}°C",
            report.emoji(),
            report.city,
            report.description,
            report.temp
        );
        Ok(report)
    }
}

fn weather_error(cause: impl std::fmt::Display) -> VoiceError {
    VoiceError::service(Service::Weather, cause)
}
