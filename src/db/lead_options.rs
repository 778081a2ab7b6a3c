use sqlx::PgPool;

use crate::models::{LeadSource, LeadStatus};

pub async fn list_statuses(pool: &PgPool) -> Result<Vec<LeadStatus>, sqlx::Error> {
    sqlx::query_as::<_, LeadStatus>("SELECT * FROM lead_statuses ORDER BY sort_order, name")
        .fetch_all(pool)
        .await
}

pub async fn find_status(pool: &PgPool, id: i32) -> Result<Option<LeadStatus>, sqlx::Error> {
    sqlx::query_as::<_, LeadStatus>("SELECT * FROM lead_statuses WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn status_name_taken(pool: &PgPool, name: &str) -> Result<bool, sqlx::Error> {
    let row: (bool,) =
        sqlx::query_as("SELECT EXISTS (SELECT 1 FROM lead_statuses WHERE name = $1)")
            .bind(name)
            .fetch_one(pool)
            .await?;
    Ok(row.0)
}

pub async fn create_status(
    pool: &PgPool,
    name: &str,
    sort_order: i32,
) -> Result<LeadStatus, sqlx::Error> {
    sqlx::query_as::<_, LeadStatus>(
        "INSERT INTO lead_statuses (name, sort_order) VALUES ($1, $2) RETURNING *",
    )
    .bind(name)
    .bind(sort_order)
    .fetch_one(pool)
    .await
}

pub async fn status_in_use(pool: &PgPool, id: i32) -> Result<bool, sqlx::Error> {
    let row: (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM leads WHERE status_id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

pub async fn delete_status(pool: &PgPool, id: i32) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM lead_statuses WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn list_sources(pool: &PgPool) -> Result<Vec<LeadSource>, sqlx::Error> {
    sqlx::query_as::<_, LeadSource>("SELECT * FROM lead_sources ORDER BY source")
        .fetch_all(pool)
        .await
}

pub async fn find_source(pool: &PgPool, id: i32) -> Result<Option<LeadSource>, sqlx::Error> {
    sqlx::query_as::<_, LeadSource>("SELECT * FROM lead_sources WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn source_taken(pool: &PgPool, source: &str) -> Result<bool, sqlx::Error> {
    let row: (bool,) =
        sqlx::query_as("SELECT EXISTS (SELECT 1 FROM lead_sources WHERE source = $1)")
            .bind(source)
            .fetch_one(pool)
            .await?;
    Ok(row.0)
}

pub async fn create_source(pool: &PgPool, source: &str) -> Result<LeadSource, sqlx::Error> {
    sqlx::query_as::<_, LeadSource>("INSERT INTO lead_sources (source) VALUES ($1) RETURNING *")
        .bind(source)
        .fetch_one(pool)
        .await
}

/// Sources are referenced by value, not by key.
pub async fn source_in_use(pool: &PgPool, source: &str) -> Result<bool, sqlx::Error> {
    let row: (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM leads WHERE source = $1)")
        .bind(source)
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

pub async fn delete_source(pool: &PgPool, id: i32) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM lead_sources WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
