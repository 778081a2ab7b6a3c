use axum::Json;
use axum::extract::State;
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::auth::jwt::{Claims, encode_token};
use crate::auth::{password, reset_token};
use crate::config::Config;
use crate::db;
use crate::email;
use crate::error::AppError;
use crate::models::{Role, User};
use crate::state::SharedState;

const RESET_REQUESTED: &str =
    "If an account with this email exists, a password reset link has been sent.";

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct ResetRequest {
    pub email: Option<String>,
}

#[derive(Deserialize)]
pub struct ResetConfirmRequest {
    pub uid: Option<String>,
    pub token: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub role: Option<Role>,
    pub name: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub message: String,
    pub user: UserSummary,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub message: String,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn auth_cookies(config: &Config, access_token: &str, refresh_token: &str) -> CookieJar {
    let access = Cookie::build(("access_token", access_token.to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(config.access_token_minutes))
        .build();

    let refresh = Cookie::build(("refresh_token", refresh_token.to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(config.refresh_token_days))
        .build();

    CookieJar::new().add(access).add(refresh)
}

fn clear_auth_cookies() -> CookieJar {
    let access = Cookie::build(("access_token", ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build();
    let refresh = Cookie::build(("refresh_token", ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build();
    CookieJar::new().add(access).add(refresh)
}

fn generate_refresh_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Mint an access token and a stored refresh token for `user`.
async fn issue_tokens(state: &SharedState, user: &User) -> Result<(String, String), AppError> {
    let claims = Claims::new(
        user.id,
        user.is_superuser,
        Duration::minutes(state.config.access_token_minutes),
    );
    let access_token =
        encode_token(&claims, &state.config.jwt_secret).map_err(AppError::Internal)?;

    let refresh = generate_refresh_token();
    db::refresh_tokens::create(
        &state.pool,
        user.id,
        &hash_token(&refresh),
        Utc::now() + Duration::days(state.config.refresh_token_days),
    )
    .await?;

    Ok((access_token, refresh))
}

pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<SessionResponse>), AppError> {
    let (Some(email), Some(pw)) = (required(req.email), required(req.password)) else {
        return Err(AppError::BadRequest(
            "Email and password are required".to_string(),
        ));
    };
    let email = email.trim().to_string();

    if state.login_limiter.check(&email).is_err() {
        return Err(AppError::RateLimited(
            "Too many login attempts. Please try again later.".to_string(),
        ));
    }

    let user = match db::users::find_by_email(&state.pool, &email).await? {
        Some(user) if user.is_active => user,
        _ => {
            state.login_limiter.record_failure(&email);
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        }
    };

    let valid = password::verify(&pw, &user.password_hash).map_err(AppError::Internal)?;
    if !valid {
        state.login_limiter.record_failure(&email);
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }
    state.login_limiter.clear(&email);

    let profile = db::profiles::find_active_by_user(&state.pool, user.id)
        .await?
        .ok_or_else(|| {
            AppError::Unauthorized("User profile not found or inactive".to_string())
        })?;

    db::users::record_login(&state.pool, user.id, Utc::now()).await?;
    let (access_token, refresh_token) = issue_tokens(&state, &user).await?;

    tracing::info!("User {} logged in", user.id);

    let jar = auth_cookies(&state.config, &access_token, &refresh_token);
    Ok((
        jar,
        Json(SessionResponse {
            message: "Login successful".to_string(),
            user: UserSummary {
                id: user.id,
                email: user.email.clone(),
                role: Some(profile.role),
                name: user.full_name(),
            },
            access_token,
            refresh_token,
        }),
    ))
}

pub async fn refresh(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<TokenResponse>), AppError> {
    let refresh_value = jar
        .get("refresh_token")
        .map(|c| c.value().to_string())
        .ok_or_else(|| {
            AppError::Unauthorized("Refresh token not found. Please login again.".to_string())
        })?;

    let stored = db::refresh_tokens::find_by_hash(&state.pool, &hash_token(&refresh_value))
        .await?
        .ok_or_else(|| {
            AppError::Unauthorized(
                "Invalid or expired refresh token. Please login again.".to_string(),
            )
        })?;

    if stored.expires_at < Utc::now() {
        return Err(AppError::Unauthorized(
            "Invalid or expired refresh token. Please login again.".to_string(),
        ));
    }

    // A token that was already spent means the chain leaked.
    if stored.used || !db::refresh_tokens::consume(&state.pool, stored.id).await? {
        tracing::warn!(
            "Refresh token reuse detected for user {}. Revoking all sessions.",
            stored.user_id
        );
        db::refresh_tokens::revoke_all_for_user(&state.pool, stored.user_id).await?;
        return Err(AppError::Unauthorized(
            "Refresh token reuse detected. All sessions revoked.".to_string(),
        ));
    }

    let user = db::users::find_by_id(&state.pool, stored.user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    let (access_token, refresh_token) = issue_tokens(&state, &user).await?;

    let jar = auth_cookies(&state.config, &access_token, &refresh_token);
    Ok((
        jar,
        Json(TokenResponse {
            message: "Token refreshed successfully".to_string(),
            access_token,
            refresh_token,
        }),
    ))
}

pub async fn logout(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse>), AppError> {
    if let Some(cookie) = jar.get("refresh_token") {
        db::refresh_tokens::delete_by_hash(&state.pool, &hash_token(cookie.value())).await?;
    }

    Ok((
        clear_auth_cookies(),
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    ))
}

pub async fn password_reset_request(
    State(state): State<SharedState>,
    Json(req): Json<ResetRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = required(req.email)
        .ok_or_else(|| AppError::BadRequest("Email is required".to_string()))?;

    let generic = Json(MessageResponse {
        message: RESET_REQUESTED.to_string(),
    });

    let Some(user) = db::users::find_by_email(&state.pool, email.trim()).await? else {
        return Ok(generic);
    };
    if !user.is_active {
        return Err(AppError::NotFound(
            "Account not found. Please contact your manager for assistance.".to_string(),
        ));
    }

    let token = reset_token::make_token(&user, &state.config.jwt_secret, Utc::now())
        .map_err(AppError::Internal)?;
    let reset_url = email::reset_password_url(
        &state.config.frontend_url,
        &reset_token::encode_uid(user.id),
        &token,
    );

    match &state.system_mailer {
        Some(mailer) => {
            mailer
                .send_password_reset(&user.email, &user.full_name(), &reset_url)
                .await
                .map_err(|e| AppError::Internal(format!("Password reset email: {e}")))?;
            tracing::info!("Password reset link sent to user {}", user.id);
        }
        None => {
            tracing::warn!("System SMTP not configured. Password reset link: {reset_url}");
        }
    }

    Ok(generic)
}

pub async fn password_reset_confirm(
    State(state): State<SharedState>,
    Json(req): Json<ResetConfirmRequest>,
) -> Result<(CookieJar, Json<SessionResponse>), AppError> {
    let (Some(uid), Some(token), Some(new_password)) =
        (required(req.uid), required(req.token), required(req.password))
    else {
        return Err(AppError::BadRequest(
            "uid, token, and password are required".to_string(),
        ));
    };

    if new_password.chars().count() < password::MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {} characters long",
            password::MIN_PASSWORD_LEN
        )));
    }

    let user = match reset_token::decode_uid(&uid) {
        Some(id) => db::users::find_by_id(&state.pool, id).await?,
        None => None,
    }
    .ok_or_else(|| {
        AppError::InvalidToken(
            "Invalid reset link. Please request a new password reset link.".to_string(),
        )
    })?;

    if !reset_token::check_token(&user, &token, &state.config.jwt_secret, Utc::now()) {
        return Err(AppError::InvalidToken(
            "Invalid or expired reset link. Please request a new password reset link.".to_string(),
        ));
    }

    if !user.is_active {
        return Err(AppError::Forbidden(
            "Account is inactive. Please contact your manager for assistance.".to_string(),
        ));
    }

    let pw_hash = password::hash(&new_password).map_err(AppError::Internal)?;
    db::users::update_password(&state.pool, user.id, &pw_hash).await?;
    db::refresh_tokens::revoke_all_for_user(&state.pool, user.id).await?;
    db::users::record_login(&state.pool, user.id, Utc::now()).await?;

    let role = db::profiles::find_active_by_user(&state.pool, user.id)
        .await?
        .map(|p| p.role);
    let (access_token, refresh_token) = issue_tokens(&state, &user).await?;

    tracing::info!("Password reset completed for user {}", user.id);

    let jar = auth_cookies(&state.config, &access_token, &refresh_token);
    Ok((
        jar,
        Json(SessionResponse {
            message: "Password reset successfully. You are now logged in.".to_string(),
            user: UserSummary {
                id: user.id,
                email: user.email.clone(),
                role,
                name: user.full_name(),
            },
            access_token,
            refresh_token,
        }),
    ))
}
