// src/routes/auth.rs

use axum::{extract::State, Form, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    auth::{create_access_token, hash_password, verify_password, AuthUser},
    error::{internal_error, ApiError, ApiResult},
    models::{NewUser, User, UserPatch},
    AppState,
};

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Deserialize)]
pub struct RegisterBody {
    pub email: String,
    pub name: String,
    pub password: String,
}

/// OAuth2 password form; `username` carries the email.
#[derive(Deserialize)]
pub struct TokenForm {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: &'static str,
}

fn check_email(email: &str) -> ApiResult<()> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(ApiError::BadRequest(format!("invalid email address: {email}"))),
    }
}

pub async fn register(
    State(state): State<AppState>,
    Json(b): Json<RegisterBody>,
) -> ApiResult<Json<User>> {
    let email = b.email.trim().to_lowercase();
    check_email(&email)?;
    let name = b.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::BadRequest("name must not be empty".into()));
    }
    if b.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let user = state
        .store
        .create_user(NewUser { email, name, password_hash: hash_password(&b.password) })
        .await?;
    info!(user_id = user.id, "user registered");
    Ok(Json(user))
}

async fn issue_token(state: &AppState, email: &str, password: &str) -> ApiResult<Json<Token>> {
    let email = email.trim().to_lowercase();
    let user = state.store.find_user_by_email(&email).await?;
    let user = match user {
        Some(u) if verify_password(password, &u.password_hash) => u,
        _ => return Err(ApiError::BadRequest("Incorrect email or password".into())),
    };
    let access_token = create_access_token(
        &user.email,
        &state.config.secret_key,
        state.config.access_token_expire_minutes,
    )
    .map_err(internal_error)?;
    Ok(Json(Token { access_token, token_type: "bearer" }))
}

pub async fn token(State(state): State<AppState>, Form(f): Form<TokenForm>) -> ApiResult<Json<Token>> {
    issue_token(&state, &f.username, &f.password).await
}

pub async fn login(State(state): State<AppState>, Json(b): Json<LoginBody>) -> ApiResult<Json<Token>> {
    issue_token(&state, &b.email, &b.password).await
}

async fn current_user(state: &AppState, email: &str) -> ApiResult<User> {
    state
        .store
        .find_user_by_email(email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))
}

pub async fn me(State(state): State<AppState>, AuthUser(email): AuthUser) -> ApiResult<Json<User>> {
    Ok(Json(current_user(&state, &email).await?))
}

pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(email): AuthUser,
    Json(mut patch): Json<UserPatch>,
) -> ApiResult<Json<User>> {
    let user = current_user(&state, &email).await?;

    if let Some(name) = &patch.name {
        if name.trim().is_empty() {
            return Err(ApiError::BadRequest("name must not be empty".into()));
        }
        patch.name = Some(name.trim().to_string());
    }
    if let Some(new_email) = &patch.email {
        let new_email = new_email.trim().to_lowercase();
        check_email(&new_email)?;
        patch.email = Some(new_email);
    }
    patch.location = patch.location.map(|l| l.trim().to_string());

    let updated = state.store.update_user(user.id, patch).await?;
    Ok(Json(updated))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(check_email("a@b.in").is_ok());
        assert!(check_email("@b.in").is_err());
        assert!(check_email("ab.in").is_err());
        assert!(check_email("a@localhost").is_err());
    }
}
