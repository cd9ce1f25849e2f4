// src/middleware.rs

use std::time::Duration;

use axum::{
    http::{
        header::{self, HeaderName},
        HeaderValue, Method,
    },
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    set_header::SetResponseHeaderLayer,
};
use tracing::warn;

use crate::config::Config;

const CSP: &str = "default-src 'self'; img-src 'self' data:; script-src 'self'; \
                   style-src 'self' 'unsafe-inline'; font-src 'self' data:; connect-src 'self'";

/// CORS restricted to the configured origins.
pub fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
        ])
        .expose_headers([header::CONTENT_LENGTH, HeaderName::from_static("x-request-id")])
        .max_age(Duration::from_secs(600))
}

fn security_headers(production: bool) -> Vec<(HeaderName, HeaderValue)> {
    let mut headers = vec![
        (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        (header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY")),
        (header::X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block")),
        (
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        ),
        (header::REFERRER_POLICY, HeaderValue::from_static("strict-origin-when-cross-origin")),
        (
            HeaderName::from_static("permissions-policy"),
            HeaderValue::from_static("camera=(), microphone=(), geolocation=(self), payment=()"),
        ),
    ];
    if production {
        headers.push((header::CONTENT_SECURITY_POLICY, HeaderValue::from_static(CSP)));
    }
    headers
}

/// Attach the security headers to every response from `router`.
pub fn with_security_headers<S>(router: Router<S>, config: &Config) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    security_headers(config.is_production())
        .into_iter()
        .fold(router, |r, (name, value)| r.layer(SetResponseHeaderLayer::overriding(name, value)))
}
