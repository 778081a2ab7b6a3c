use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    /// Rejected by the authentication gate on a protected route.
    Unauthenticated(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    BadRequest(String),
    InvalidToken(String),
    AlreadyConverted,
    ProfileNotFound,
    RateLimited(String),
    Internal(String),
    Database(sqlx::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated(_) | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_)
            | AppError::InvalidToken(_)
            | AppError::AlreadyConverted
            | AppError::ProfileNotFound => StatusCode::BAD_REQUEST,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Internal details are logged, never returned.
    pub fn message(&self) -> String {
        match self {
            AppError::Unauthenticated(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::BadRequest(msg)
            | AppError::InvalidToken(msg)
            | AppError::RateLimited(msg) => msg.clone(),
            AppError::AlreadyConverted => "This lead is already a project".to_string(),
            AppError::ProfileNotFound => "User profile not found".to_string(),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                "Internal server error".to_string()
            }
            AppError::Database(err) => {
                tracing::error!("Database error: {err}");
                "Internal server error".to_string()
            }
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Unauthenticated(msg) => write!(f, "Unauthenticated: {msg}"),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
            AppError::NotFound(msg) => write!(f, "Not Found: {msg}"),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {msg}"),
            AppError::InvalidToken(msg) => write!(f, "Invalid Token: {msg}"),
            AppError::AlreadyConverted => write!(f, "Already Converted"),
            AppError::ProfileNotFound => write!(f, "Profile Not Found"),
            AppError::RateLimited(msg) => write!(f, "Rate Limited: {msg}"),
            AppError::Internal(msg) => write!(f, "Internal Error: {msg}"),
            AppError::Database(err) => write!(f, "Database Error: {err}"),
        }
    }
}

/// Auth/common endpoints answer `{"error": "<message>"}`, bad credentials
/// included. Only the authentication gate answers `{"detail": "<message>"}`.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();

        let body = match self {
            AppError::Unauthenticated(_) => json!({ "detail": message }),
            _ => json!({ "error": message }),
        };
        (status, axum::Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err)
    }
}

/// Lead endpoints answer `{"error": true, "message": "<message>"}`.
#[derive(Debug)]
pub struct LeadApiError(pub AppError);

impl IntoResponse for LeadApiError {
    fn into_response(self) -> Response {
        match self.0 {
            AppError::Unauthenticated(_) => self.0.into_response(),
            err => {
                let status = err.status();
                let body = json!({ "error": true, "message": err.message() });
                (status, axum::Json(body)).into_response()
            }
        }
    }
}

impl From<AppError> for LeadApiError {
    fn from(err: AppError) -> Self {
        LeadApiError(err)
    }
}

impl From<sqlx::Error> for LeadApiError {
    fn from(err: sqlx::Error) -> Self {
        LeadApiError(AppError::Database(err))
    }
}

/// Status/source management answers `{"success": false, "error": "<code>"}`.
#[derive(Debug)]
pub enum OptionsError {
    Code(StatusCode, &'static str),
    App(AppError),
}

impl IntoResponse for OptionsError {
    fn into_response(self) -> Response {
        match self {
            OptionsError::Code(status, code) => {
                (status, axum::Json(json!({ "success": false, "error": code }))).into_response()
            }
            OptionsError::App(err) => err.into_response(),
        }
    }
}

impl From<AppError> for OptionsError {
    fn from(err: AppError) -> Self {
        OptionsError::App(err)
    }
}

impl From<sqlx::Error> for OptionsError {
    fn from(err: sqlx::Error) -> Self {
        OptionsError::App(AppError::Database(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn bad_credentials_use_the_error_key() {
        let response = AppError::Unauthorized("Invalid credentials".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_of(response).await, json!({ "error": "Invalid credentials" }));
    }

    #[tokio::test]
    async fn gate_rejections_use_the_detail_key() {
        let err = AppError::Unauthenticated("no token".to_string());
        let response = LeadApiError(err).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_of(response).await, json!({ "detail": "no token" }));
    }

    #[tokio::test]
    async fn lead_errors_carry_a_flag_and_message() {
        let response = LeadApiError(AppError::AlreadyConverted).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_of(response).await,
            json!({ "error": true, "message": "This lead is already a project" })
        );
    }
}
