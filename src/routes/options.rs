use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::auth::extractor::AuthUser;
use crate::auth::requester::Requester;
use crate::db;
use crate::error::{AppError, OptionsError};
use crate::models::LeadStatus;
use crate::state::SharedState;

#[derive(Serialize)]
pub struct OptionRef {
    pub id: i32,
    pub name: String,
}

#[derive(Serialize)]
pub struct OptionsResponse {
    pub statuses: Vec<OptionRef>,
    pub sources: Vec<OptionRef>,
}

#[derive(Deserialize)]
pub struct CreateOption {
    pub name: Option<String>,
    pub sort_order: Option<i32>,
}

#[derive(Serialize)]
pub struct StatusCreated {
    pub success: bool,
    pub status: LeadStatus,
}

#[derive(Serialize)]
pub struct SourceCreated {
    pub success: bool,
    pub source: OptionRef,
}

#[derive(Serialize)]
pub struct Deleted {
    pub success: bool,
}

async fn require_manager(state: &SharedState, auth: &AuthUser) -> Result<(), OptionsError> {
    let requester = Requester::resolve(&state.pool, auth).await?;
    if requester.is_manager() {
        Ok(())
    } else {
        Err(OptionsError::Code(StatusCode::FORBIDDEN, "unauthorized"))
    }
}

fn required_name(req: &CreateOption) -> Result<String, OptionsError> {
    req.name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .ok_or(OptionsError::Code(StatusCode::BAD_REQUEST, "name_required"))
}

pub async fn list(
    State(state): State<SharedState>,
    _auth: AuthUser,
) -> Result<Json<OptionsResponse>, AppError> {
    let statuses = db::lead_options::list_statuses(&state.pool)
        .await?
        .into_iter()
        .map(|s| OptionRef {
            id: s.id,
            name: s.name,
        })
        .collect();
    let sources = db::lead_options::list_sources(&state.pool)
        .await?
        .into_iter()
        .map(|s| OptionRef {
            id: s.id,
            name: s.source,
        })
        .collect();

    Ok(Json(OptionsResponse { statuses, sources }))
}

pub async fn create_status(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(req): Json<CreateOption>,
) -> Result<(StatusCode, Json<StatusCreated>), OptionsError> {
    require_manager(&state, &auth).await?;
    let name = required_name(&req)?;

    if db::lead_options::status_name_taken(&state.pool, &name).await? {
        return Err(OptionsError::Code(StatusCode::BAD_REQUEST, "status_exists"));
    }

    let sort_order = match req.sort_order {
        Some(order) => order,
        None => db::lead_options::list_statuses(&state.pool)
            .await?
            .iter()
            .map(|s| s.sort_order + 1)
            .max()
            .unwrap_or(0),
    };
    let status = db::lead_options::create_status(&state.pool, &name, sort_order).await?;
    tracing::info!("Lead status '{}' created", status.name);

    Ok((
        StatusCode::CREATED,
        Json(StatusCreated {
            success: true,
            status,
        }),
    ))
}

pub async fn delete_status(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Deleted>, OptionsError> {
    require_manager(&state, &auth).await?;

    let not_found = OptionsError::Code(StatusCode::NOT_FOUND, "status_not_found");
    let Ok(id) = id.parse::<i32>() else {
        return Err(not_found);
    };
    if db::lead_options::find_status(&state.pool, id).await?.is_none() {
        return Err(not_found);
    }
    if db::lead_options::status_in_use(&state.pool, id).await? {
        return Err(OptionsError::Code(StatusCode::BAD_REQUEST, "status_in_use"));
    }

    db::lead_options::delete_status(&state.pool, id).await?;
    Ok(Json(Deleted { success: true }))
}

pub async fn create_source(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(req): Json<CreateOption>,
) -> Result<(StatusCode, Json<SourceCreated>), OptionsError> {
    require_manager(&state, &auth).await?;
    let name = required_name(&req)?;

    if db::lead_options::source_taken(&state.pool, &name).await? {
        return Err(OptionsError::Code(StatusCode::BAD_REQUEST, "source_exists"));
    }

    let source = db::lead_options::create_source(&state.pool, &name).await?;
    tracing::info!("Lead source '{}' created", source.source);

    Ok((
        StatusCode::CREATED,
        Json(SourceCreated {
            success: true,
            source: OptionRef {
                id: source.id,
                name: source.source,
            },
        }),
    ))
}

pub async fn delete_source(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Deleted>, OptionsError> {
    require_manager(&state, &auth).await?;

    let not_found = OptionsError::Code(StatusCode::NOT_FOUND, "source_not_found");
    let Ok(id) = id.parse::<i32>() else {
        return Err(not_found);
    };
    let Some(source) = db::lead_options::find_source(&state.pool, id).await? else {
        return Err(not_found);
    };
    if db::lead_options::source_in_use(&state.pool, &source.source).await? {
        return Err(OptionsError::Code(StatusCode::BAD_REQUEST, "source_in_use"));
    }

    db::lead_options::delete_source(&state.pool, id).await?;
    Ok(Json(Deleted { success: true }))
}
