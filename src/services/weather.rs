// src/services/weather.rs

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Forecast entries per day (OpenWeather 3-hourly steps).
pub const STEPS_PER_DAY: u32 = 8;
pub const MAX_FORECAST_DAYS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherData {
    pub timestamp: DateTime<Utc>,
    /// °C
    pub temperature: f64,
    /// %
    pub humidity: f64,
    /// hPa
    pub pressure: f64,
    /// m/s
    pub wind_speed: f64,
    /// degrees
    pub wind_direction: f64,
    /// %
    pub cloud_cover: f64,
    /// mm
    pub precipitation: f64,
    /// %
    pub precipitation_probability: f64,
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, lat: f64, lon: f64) -> WeatherData;

    async fn forecast(&self, lat: f64, lon: f64, days: u32) -> Vec<WeatherData>;

    fn source(&self) -> &'static str;
}

#[derive(Debug, Default, Clone)]
pub struct StubWeatherProvider;

#[async_trait]
impl WeatherProvider for StubWeatherProvider {
    async fn current(&self, _lat: f64, _lon: f64) -> WeatherData {
        mock_current(Utc::now())
    }

    async fn forecast(&self, _lat: f64, _lon: f64, days: u32) -> Vec<WeatherData> {
        mock_forecast(Utc::now(), days)
    }

    fn source(&self) -> &'static str {
        "mock"
    }
}

pub fn mock_current(now: DateTime<Utc>) -> WeatherData {
    WeatherData {
        timestamp: now,
        temperature: 25.5,
        humidity: 65.0,
        pressure: 1013.25,
        wind_speed: 3.2,
        wind_direction: 180.0,
        cloud_cover: 40.0,
        precipitation: 0.0,
        precipitation_probability: 20.0,
    }
}

/// Synthetic 3-hourly forecast with a shower every 36 hours.
pub fn mock_forecast(start: DateTime<Utc>, days: u32) -> Vec<WeatherData> {
    (0..days.min(MAX_FORECAST_DAYS) * STEPS_PER_DAY)
        .map(|i| {
            let step = f64::from(i);
            let precipitation = if i % 12 == 0 { 2.5 + f64::from(i % 3) * 1.5 } else { 0.0 };
            WeatherData {
                timestamp: start + Duration::hours(i64::from(i) * 3),
                temperature: 20.0 + f64::from(i % 24) * 0.5,
                humidity: 60.0 + f64::from(i % 10) * 2.0,
                pressure: 1013.25 + f64::from(i % 5) * 0.5,
                wind_speed: 2.0 + f64::from(i % 8) * 0.5,
                wind_direction: (step * 45.0) % 360.0,
                cloud_cover: 30.0 + f64::from(i % 20) * 2.0,
                precipitation,
                precipitation_probability: 20.0 + f64::from(i % 5) * 10.0,
            }
        })
        .collect()
}

/// OpenWeatherMap current + 5-day/3-hour forecast, with mock fallback.
pub struct OpenWeatherProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

// Types to deserialize OpenWeather responses
#[derive(Deserialize)]
struct OwMain {
    temp: f64,
    humidity: f64,
    pressure: f64,
}
#[derive(Deserialize)]
struct OwWind {
    speed: f64,
    #[serde(default)]
    deg: f64,
}
#[derive(Deserialize)]
struct OwClouds {
    all: f64,
}
#[derive(Deserialize, Default)]
struct OwRain {
    #[serde(rename = "1h", default)]
    one_hour: f64,
    #[serde(rename = "3h", default)]
    three_hours: f64,
}
#[derive(Deserialize)]
struct OwItem {
    dt: i64,
    main: OwMain,
    wind: OwWind,
    clouds: OwClouds,
    #[serde(default)]
    rain: Option<OwRain>,
    #[serde(default)]
    pop: f64,
}
#[derive(Deserialize)]
struct OwForecast {
    list: Vec<OwItem>,
}

impl OwItem {
    fn into_weather(self, forecast: bool) -> WeatherData {
        let rain = self.rain.unwrap_or_default();
        WeatherData {
            timestamp: DateTime::from_timestamp(self.dt, 0).unwrap_or_else(Utc::now),
            temperature: self.main.temp,
            humidity: self.main.humidity,
            pressure: self.main.pressure,
            wind_speed: self.wind.speed,
            wind_direction: self.wind.deg,
            cloud_cover: self.clouds.all,
            precipitation: if forecast { rain.three_hours } else { rain.one_hour },
            precipitation_probability: self.pop * 100.0,
        }
    }
}

impl OpenWeatherProvider {
    pub fn new(client: reqwest::Client, base_url: String, api_key: String) -> Self {
        Self { client, base_url, api_key }
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        lat: f64,
        lon: f64,
    ) -> Result<T, reqwest::Error> {
        self.client
            .get(format!("{}/{endpoint}", self.base_url.trim_end_matches('/')))
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current(&self, lat: f64, lon: f64) -> WeatherData {
        match self.get::<OwItem>("weather", lat, lon).await {
            Ok(item) => item.into_weather(false),
            Err(e) => {
                warn!(lat, lon, "OpenWeather current failed, using mock data: {e}");
                mock_current(Utc::now())
            }
        }
    }

    async fn forecast(&self, lat: f64, lon: f64, days: u32) -> Vec<WeatherData> {
        let take = (days.min(MAX_FORECAST_DAYS) * STEPS_PER_DAY) as usize;
        match self.get::<OwForecast>("forecast", lat, lon).await {
            Ok(f) => f.list.into_iter().take(take).map(|i| i.into_weather(true)).collect(),
            Err(e) => {
                warn!(lat, lon, "OpenWeather forecast failed, using mock data: {e}");
                mock_forecast(Utc::now(), days)
            }
        }
    }

    fn source(&self) -> &'static str {
        "openweathermap"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_forecast_shape() {
        let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let f = mock_forecast(start, 2);
        assert_eq!(f.len(), 16);
        assert_eq!(f[0].precipitation, 2.5);
        assert_eq!(f[1].precipitation, 0.0);
        assert_eq!(f[12].precipitation, 2.5);
        assert_eq!(f[3].timestamp - f[0].timestamp, Duration::hours(9));
    }

    #[test]
    fn mock_forecast_caps_days() {
        assert_eq!(mock_forecast(Utc::now(), 30).len(), (MAX_FORECAST_DAYS * STEPS_PER_DAY) as usize);
    }

    #[test]
    fn parses_openweather_item() {
        let raw = serde_json::json!({
            "dt": 1_700_000_000,
            "main": { "temp": 28.1, "humidity": 70, "pressure": 1009 },
            "wind": { "speed": 4.1 },
            "clouds": { "all": 75 },
            "rain": { "3h": 1.25 },
            "pop": 0.6
        });
        let item: OwItem = serde_json::from_value(raw).unwrap();
        let w = item.into_weather(true);
        assert_eq!(w.precipitation, 1.25);
        assert_eq!(w.wind_direction, 0.0);
        assert!((w.precipitation_probability - 60.0).abs() < 1e-9);
    }
}
