use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Profile, ProfileDetails, Role};

const DETAILS_SELECT: &str = "SELECT p.id, p.user_id, u.email, u.first_name, u.last_name,
            p.role, p.phone, p.is_active, p.created_at
     FROM profiles p JOIN users u ON u.id = p.user_id";

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    user_id: Uuid,
    role: Role,
    phone: Option<&str>,
) -> Result<Profile, sqlx::Error> {
    sqlx::query_as::<_, Profile>(
        "INSERT INTO profiles (user_id, role, phone) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(user_id)
    .bind(role)
    .bind(phone)
    .fetch_one(executor)
    .await
}

/// The caller's profile, provided both the profile and its user are active.
pub async fn find_active_by_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<Profile>, sqlx::Error> {
    sqlx::query_as::<_, Profile>(
        "SELECT p.* FROM profiles p JOIN users u ON u.id = p.user_id
         WHERE p.user_id = $1 AND p.is_active = true
           AND u.is_active = true AND u.is_deleted = false",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn find_details(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<ProfileDetails>, sqlx::Error> {
    sqlx::query_as::<_, ProfileDetails>(&format!("{DETAILS_SELECT} WHERE p.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Active assignable profiles, newest first.
pub async fn list_active(pool: &PgPool) -> Result<Vec<ProfileDetails>, sqlx::Error> {
    sqlx::query_as::<_, ProfileDetails>(&format!(
        "{DETAILS_SELECT} WHERE p.is_active = true AND u.is_deleted = false
         ORDER BY p.created_at DESC"
    ))
    .fetch_all(pool)
    .await
}

pub async fn is_assignable(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let row: (bool,) = sqlx::query_as(
        "SELECT EXISTS (
            SELECT 1 FROM profiles p JOIN users u ON u.id = p.user_id
            WHERE p.id = $1 AND p.is_active = true AND u.is_deleted = false
         )",
    )
    .bind(id)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}
