// src/lib.rs

pub mod auth;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::{sync::Arc, time::Duration};

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::{Config, ProviderMode};
use crate::db::{MemoryStore, PgStore, Store};
use crate::services::{
    chat::{ChatProvider, OpenAiChat, UnavailableChat},
    context::{ContextProvider, LiveContextProvider, StubContextProvider},
    gamification::{GamificationStore, InMemoryGamification},
    nasa_power::{LiveNasaPowerProvider, NasaPowerProvider, StubNasaPowerProvider},
    weather::{OpenWeatherProvider, StubWeatherProvider, WeatherProvider},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn Store>,
    pub context: Arc<dyn ContextProvider>,
    pub weather: Arc<dyn WeatherProvider>,
    pub nasa_power: Arc<dyn NasaPowerProvider>,
    pub chat: Arc<dyn ChatProvider>,
    pub gamification: Arc<dyn GamificationStore>,
}

impl AppState {
    /// In-memory store and deterministic providers; no network or database.
    pub fn stub(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            store: Arc::new(MemoryStore::new()),
            context: Arc::new(StubContextProvider),
            weather: Arc::new(StubWeatherProvider),
            nasa_power: Arc::new(StubNasaPowerProvider),
            chat: Arc::new(UnavailableChat),
            gamification: Arc::new(InMemoryGamification::default()),
        }
    }

    pub async fn from_config(config: Config) -> anyhow::Result<Self> {
        let (store, pool): (Arc<dyn Store>, Option<_>) = match &config.database_url {
            Some(url) => {
                let pg = PgStore::new(db::connect(url).await?);
                pg.ensure_schema().await?;
                let pool = pg.pool().clone();
                (Arc::new(pg) as Arc<dyn Store>, Some(pool))
            }
            None => {
                warn!("DATABASE_URL not set, using in-memory store");
                (Arc::new(MemoryStore::new()) as Arc<dyn Store>, None)
            }
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;

        let (context, weather, nasa_power): (
            Arc<dyn ContextProvider>,
            Arc<dyn WeatherProvider>,
            Arc<dyn NasaPowerProvider>,
        ) = match config.provider_mode {
            ProviderMode::Stub => {
                info!("data providers in stub mode");
                (
                    Arc::new(StubContextProvider) as Arc<dyn ContextProvider>,
                    Arc::new(StubWeatherProvider) as Arc<dyn WeatherProvider>,
                    Arc::new(StubNasaPowerProvider) as Arc<dyn NasaPowerProvider>,
                )
            }
            ProviderMode::Live => {
                let weather: Arc<dyn WeatherProvider> = match &config.openweather_api_key {
                    Some(key) => Arc::new(OpenWeatherProvider::new(
                        client.clone(),
                        config.openweather_api_url.clone(),
                        key.clone(),
                    )),
                    None => {
                        warn!("OPENWEATHER_API_KEY not set, weather endpoints serve mock data");
                        Arc::new(StubWeatherProvider)
                    }
                };
                let context: Arc<dyn ContextProvider> = Arc::new(LiveContextProvider::new(
                    client.clone(),
                    config.climate_api_url.clone(),
                    pool,
                ));
                let nasa_power: Arc<dyn NasaPowerProvider> =
                    Arc::new(LiveNasaPowerProvider::new(client.clone(), config.nasa_power_url.clone()));
                (context, weather, nasa_power)
            }
        };

        let chat: Arc<dyn ChatProvider> = match &config.openai_api_key {
            Some(key) => Arc::new(OpenAiChat::new(
                client,
                config.openai_api_url.clone(),
                key.clone(),
                config.openai_model.clone(),
            )),
            None => {
                warn!("OPENAI_API_KEY not set, chat is unavailable");
                Arc::new(UnavailableChat)
            }
        };

        Ok(Self {
            config: Arc::new(config),
            store,
            context,
            weather,
            nasa_power,
            chat,
            gamification: Arc::new(InMemoryGamification::default()),
        })
    }
}

pub fn create_router(state: AppState) -> Router {
    let config = state.config.clone();

    let router = Router::new()
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health))
        .nest(&config.api_prefix, routes::api_router())
        .with_state(state);

    middleware::with_security_headers(router, &config)
        .layer(middleware::cors_layer(&config))
        .layer(TraceLayer::new_for_http())
}
