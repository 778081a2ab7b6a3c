//! Lead-to-project conversion.

use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::requester::Requester;
use crate::db;
use crate::error::AppError;
use crate::models::Lead;

pub fn authorize(requester: &Requester) -> Result<(), AppError> {
    requester.require_manager("Only managers can convert leads to projects")
}

/// Why a record can or cannot be converted right now.
pub fn check_convertible(lead: Option<&Lead>) -> Result<(), AppError> {
    match lead {
        Some(lead) if lead.is_active && !lead.is_project => Ok(()),
        Some(lead) if lead.is_active => Err(AppError::AlreadyConverted),
        _ => Err(AppError::NotFound("Lead not found".to_string())),
    }
}

pub async fn convert(pool: &PgPool, requester: &Requester, lead_id: Uuid) -> Result<Lead, AppError> {
    authorize(requester)?;

    if let Some(project) = db::leads::mark_as_project(pool, lead_id).await? {
        tracing::info!("Lead {lead_id} converted to project by user {}", requester.user_id);
        return Ok(project);
    }

    // The conditional update matched nothing; re-read to say why.
    let current = db::leads::find_by_id(pool, lead_id).await?;
    check_convertible(current.as_ref())?;
    Err(AppError::AlreadyConverted)
}
