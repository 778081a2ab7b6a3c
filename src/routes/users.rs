use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::extractor::AuthUser;
use crate::auth::requester::Requester;
use crate::auth::reset_token;
use crate::db;
use crate::email;
use crate::error::AppError;
use crate::models::{ProfileDetails, Role, User};
use crate::state::SharedState;

#[derive(Serialize)]
pub struct ProfileResponse {
    pub user_obj: ProfileDetails,
}

#[derive(Deserialize)]
pub struct CreateEmployeeRequest {
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub phone: Option<String>,
}

#[derive(Serialize)]
pub struct EmployeeResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee: Option<ProfileDetails>,
}

pub async fn profile(
    State(state): State<SharedState>,
    auth: AuthUser,
) -> Result<Json<ProfileResponse>, AppError> {
    let requester = Requester::resolve(&state.pool, &auth).await?;
    let details = db::profiles::find_details(&state.pool, requester.profile_id)
        .await?
        .ok_or(AppError::ProfileNotFound)?;

    Ok(Json(ProfileResponse { user_obj: details }))
}

pub async fn create_employee(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(req): Json<CreateEmployeeRequest>,
) -> Result<(StatusCode, Json<EmployeeResponse>), AppError> {
    let requester = Requester::resolve(&state.pool, &auth).await?;
    requester.require_manager("Only managers can create employees.")?;

    let email = req
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::BadRequest("Email is required".to_string()))?
        .to_string();
    let display_name = if req.first_name.trim().is_empty() {
        email.clone()
    } else {
        format!("{} {}", req.first_name.trim(), req.last_name.trim())
            .trim()
            .to_string()
    };

    if let Some(existing) = db::users::find_any_by_email(&state.pool, &email).await? {
        if !existing.is_deleted {
            return Err(AppError::BadRequest(
                "A user with this email already exists.".to_string(),
            ));
        }
        db::users::restore(&state.pool, existing.id).await?;
        tracing::info!("User {} restored by {}", existing.id, requester.user_id);
        return Ok((
            StatusCode::OK,
            Json(EmployeeResponse {
                message: format!("Employee {display_name} restored successfully."),
                employee: None,
            }),
        ));
    }

    let phone = req.phone.as_deref().map(str::trim).filter(|p| !p.is_empty());

    let mut tx = state.pool.begin().await?;
    let user = db::users::create(
        &mut *tx,
        &email,
        req.first_name.trim(),
        req.last_name.trim(),
        "",
        false,
    )
    .await?;
    let profile = db::profiles::create(&mut *tx, user.id, Role::Employee, phone)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::BadRequest("A user with this phone number already exists.".to_string())
            }
            _ => AppError::Database(e),
        })?;
    tx.commit().await?;

    tracing::info!("Employee {} created by {}", user.id, requester.user_id);
    send_set_password(&state, &user).await;

    let employee = db::profiles::find_details(&state.pool, profile.id).await?;
    Ok((
        StatusCode::CREATED,
        Json(EmployeeResponse {
            message: format!("Employee {display_name} created successfully."),
            employee,
        }),
    ))
}

/// Invite a new account to choose its password. Failures are logged only.
async fn send_set_password(state: &SharedState, user: &User) {
    let token = match reset_token::make_token(user, &state.config.jwt_secret, Utc::now()) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!("Set-password token for {}: {e}", user.id);
            return;
        }
    };
    let url = email::set_password_url(
        &state.config.frontend_url,
        &reset_token::encode_uid(user.id),
        &token,
    );

    let Some(mailer) = &state.system_mailer else {
        tracing::warn!("System SMTP not configured. Set-password link: {url}");
        return;
    };
    if let Err(e) = mailer
        .send_set_password(&user.email, &user.full_name(), &url)
        .await
    {
        tracing::error!("Failed to send set-password email to {}: {e}", user.id);
    }
}
