// src/auth.rs

//! Password hashing, access tokens and the request extractors that read them.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ApiError;
use crate::AppState;

/// Salted SHA-256, stored as `salt$hexdigest`.
pub fn hash_password(password: &str) -> String {
    let salt = uuid::Uuid::new_v4().simple().to_string();
    format!("{salt}${}", digest(&salt, password))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, hash)) => digest(salt, password) == hash,
        None => false,
    }
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// user email
    pub sub: String,
    pub exp: usize,
}

pub fn create_access_token(
    subject: &str,
    secret: &str,
    expire_minutes: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let exp = (Utc::now() + Duration::minutes(expire_minutes)).timestamp();
    let claims = Claims { sub: subject.to_string(), exp: exp.max(0) as usize };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())
        .map(|data| data.claims)
}

fn bearer(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ").or_else(|| value.strip_prefix("bearer "))?.trim();
    // browser clients sometimes send the literal string for a missing token
    match token {
        "" | "null" | "undefined" => None,
        t => Some(t),
    }
}

fn subject(parts: &Parts, secret: &str) -> Option<String> {
    let token = bearer(parts)?;
    decode_token(token, secret).ok().map(|c| c.sub)
}

/// Email of the caller when a valid token is present; anonymous otherwise.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<String>);

#[axum::async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(subject(parts, &state.config.secret_key)))
    }
}

/// Email of the caller; rejects with 401 without a valid token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        subject(parts, &state.config.secret_key)
            .map(AuthUser)
            .ok_or_else(|| ApiError::Unauthorized("Invalid token".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[test]
    fn password_round_trip() {
        let stored = hash_password("s3cret");
        assert!(verify_password("s3cret", &stored));
        assert!(!verify_password("S3cret", &stored));
        assert!(!verify_password("s3cret", "no-salt"));
        // fresh salt each time
        assert_ne!(stored, hash_password("s3cret"));
    }

    #[test]
    fn token_carries_subject() {
        let token = create_access_token("a@b.in", "k", 5).unwrap();
        assert_eq!(decode_token(&token, "k").unwrap().sub, "a@b.in");
        assert!(decode_token(&token, "other").is_err());
    }

    #[test]
    fn expired_token_rejected() {
        let token = create_access_token("a@b.in", "k", -10).unwrap();
        assert!(decode_token(&token, "k").is_err());
    }

    #[test]
    fn bearer_header_parsing() {
        let token = create_access_token("x@y.in", "k", 5).unwrap();
        let (parts, _) = Request::builder()
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(subject(&parts, "k").as_deref(), Some("x@y.in"));

        let (parts, _) = Request::builder()
            .header(AUTHORIZATION, "Bearer null")
            .body(())
            .unwrap()
            .into_parts();
        assert!(bearer(&parts).is_none());
    }
}
