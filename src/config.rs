// src/config.rs

//! Runtime configuration, read from the environment (and `.env` if present).

use std::env;

use anyhow::{bail, Context, Result};

use crate::engine::{
    EngineParams, DEFAULT_DESIGN_STORAGE_FRACTION, DEFAULT_RUNOFF_COEFFICIENT,
    DEFAULT_WATER_PRICE_PER_KL,
};

const DEFAULT_ORIGINS: &str =
    "http://localhost:5173,http://localhost:3000,http://127.0.0.1:5173,http://127.0.0.1:3000";

/// Which implementation backs the outbound data providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderMode {
    Live,
    Stub,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub app_name: String,
    pub app_env: String,
    pub api_prefix: String,

    /// Postgres URL; `None` runs on the in-memory store.
    pub database_url: Option<String>,

    pub secret_key: String,
    pub access_token_expire_minutes: i64,
    pub allowed_origins: Vec<String>,

    pub provider_mode: ProviderMode,
    pub http_timeout_secs: u64,
    pub climate_api_url: String,
    pub openweather_api_key: Option<String>,
    pub openweather_api_url: String,
    pub nasa_power_url: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_api_url: String,

    pub engine: EngineParams,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            app_name: "RTRWH-AR".into(),
            app_env: "development".into(),
            api_prefix: "/api".into(),
            database_url: None,
            secret_key: "change_me".into(),
            access_token_expire_minutes: 60,
            allowed_origins: split_origins(DEFAULT_ORIGINS),
            provider_mode: ProviderMode::Live,
            http_timeout_secs: 10,
            climate_api_url: "https://climate-api.open-meteo.com/v1/climate".into(),
            openweather_api_key: None,
            openweather_api_url: "http://api.openweathermap.org/data/2.5".into(),
            nasa_power_url: "https://power.larc.nasa.gov/api/temporal/daily/point".into(),
            openai_api_key: None,
            openai_model: "gpt-4o-mini".into(),
            openai_api_url: "https://api.openai.com/v1".into(),
            engine: EngineParams::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let d = Config::default();
        let config = Config {
            host: env::var("HOST").unwrap_or(d.host),
            port: parse_var("PORT", d.port)?,
            app_name: env::var("APP_NAME").unwrap_or(d.app_name),
            app_env: env::var("APP_ENV").unwrap_or(d.app_env),
            api_prefix: env::var("API_PREFIX").unwrap_or(d.api_prefix),
            database_url: optional_var("DATABASE_URL"),
            secret_key: env::var("SECRET_KEY").unwrap_or(d.secret_key),
            access_token_expire_minutes: parse_var(
                "ACCESS_TOKEN_EXPIRE_MINUTES",
                d.access_token_expire_minutes,
            )?,
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .map(|s| split_origins(&s))
                .unwrap_or(d.allowed_origins),
            provider_mode: match env::var("CONTEXT_MODE").as_deref() {
                Ok("stub") => ProviderMode::Stub,
                Ok("live") | Err(_) => ProviderMode::Live,
                Ok(other) => bail!("CONTEXT_MODE must be 'live' or 'stub' (got '{other}')"),
            },
            http_timeout_secs: parse_var("HTTP_TIMEOUT_SECS", d.http_timeout_secs)?,
            climate_api_url: env::var("CLIMATE_API_URL").unwrap_or(d.climate_api_url),
            openweather_api_key: optional_var("OPENWEATHER_API_KEY"),
            openweather_api_url: env::var("OPENWEATHER_API_URL").unwrap_or(d.openweather_api_url),
            nasa_power_url: env::var("NASA_POWER_URL").unwrap_or(d.nasa_power_url),
            openai_api_key: optional_var("OPENAI_API_KEY"),
            openai_model: env::var("OPENAI_MODEL").unwrap_or(d.openai_model),
            openai_api_url: env::var("OPENAI_API_URL").unwrap_or(d.openai_api_url),
            engine: EngineParams {
                runoff_coefficient: parse_var("RUNOFF_COEFFICIENT", DEFAULT_RUNOFF_COEFFICIENT)?,
                design_storage_fraction: parse_var(
                    "DESIGN_STORAGE_FRACTION",
                    DEFAULT_DESIGN_STORAGE_FRACTION,
                )?,
                water_price_per_kl: parse_var("WATER_PRICE_PER_KL", DEFAULT_WATER_PRICE_PER_KL)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            bail!("PORT must be greater than 0");
        }
        if self.access_token_expire_minutes <= 0 {
            bail!("ACCESS_TOKEN_EXPIRE_MINUTES must be positive");
        }
        let c = self.engine.runoff_coefficient;
        if !(c > 0.0 && c <= 1.0) {
            bail!("RUNOFF_COEFFICIENT must be in (0, 1]");
        }
        if !(self.engine.design_storage_fraction > 0.0) {
            bail!("DESIGN_STORAGE_FRACTION must be positive");
        }
        if !(self.engine.water_price_per_kl > 0.0) {
            bail!("WATER_PRICE_PER_KL must be positive");
        }
        Ok(())
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().with_context(|| format!("Invalid {key}")),
        Err(_) => Ok(default),
    }
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.address(), "0.0.0.0:8080");
        assert_eq!(config.allowed_origins.len(), 4);
        assert_eq!(config.engine, EngineParams::default());
        assert!(!config.is_production());
    }

    #[test]
    fn rejects_zero_port() {
        let config = Config { port: 0, ..Config::default() };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("PORT must be greater than 0"));
    }

    #[test]
    fn rejects_bad_engine_params() {
        let mut config = Config::default();
        config.engine.runoff_coefficient = 1.2;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.engine.water_price_per_kl = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn origins_are_trimmed() {
        assert_eq!(
            split_origins(" http://a.test , ,http://b.test"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }
}
