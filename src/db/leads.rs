use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::leads::visibility::LeadScope;
use crate::models::{FollowUpState, Lead, LeadFields};

/// Every query reads leads as `l` with these joins so rows map onto [`Lead`].
const LEAD_COLUMNS: &str = "l.*, s.name AS status_name, pu.email AS assigned_to_email,
        trim(pu.first_name || ' ' || pu.last_name) AS assigned_to_name,
        cu.email AS created_by_email";

const LEAD_JOINS: &str = "
     LEFT JOIN lead_statuses s ON s.id = l.status_id
     LEFT JOIN profiles p ON p.id = l.assigned_to
     LEFT JOIN users pu ON pu.id = p.user_id
     LEFT JOIN users cu ON cu.id = l.created_by";

fn select_from(source: &str) -> String {
    format!("SELECT {LEAD_COLUMNS} FROM {source} l{LEAD_JOINS}")
}

/// One page of the records `scope` admits, newest first.
pub async fn list(
    pool: &PgPool,
    scope: &LeadScope,
    limit: i64,
    offset: i64,
) -> Result<Vec<Lead>, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new(select_from("leads"));
    scope.push_where(&mut qb);
    qb.push(" ORDER BY l.created_at DESC, l.id DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    qb.build_query_as::<Lead>().fetch_all(pool).await
}

pub async fn count(pool: &PgPool, scope: &LeadScope) -> Result<i64, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new(
        "SELECT COUNT(*) FROM leads l LEFT JOIN lead_statuses s ON s.id = l.status_id",
    );
    scope.push_where(&mut qb);

    qb.build_query_scalar::<i64>().fetch_one(pool).await
}

/// Lookup regardless of `is_active` or `is_project`.
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Lead>, sqlx::Error> {
    sqlx::query_as::<_, Lead>(&format!("{} WHERE l.id = $1", select_from("leads")))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Titles are unique case-insensitively across every row, deactivated ones
/// included.
pub async fn title_taken(
    pool: &PgPool,
    title: &str,
    exclude: Option<Uuid>,
) -> Result<bool, sqlx::Error> {
    let row: (bool,) = sqlx::query_as(
        "SELECT EXISTS (
             SELECT 1 FROM leads
             WHERE lower(title) = lower($1) AND ($2::uuid IS NULL OR id <> $2)
         )",
    )
    .bind(title)
    .bind(exclude)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

pub async fn create(
    pool: &PgPool,
    fields: &LeadFields,
    created_by: Uuid,
) -> Result<Lead, sqlx::Error> {
    let sql = format!(
        "WITH l AS (
             INSERT INTO leads (title, status_id, source, description, company_name,
                 contact_first_name, contact_last_name, contact_email, contact_phone,
                 contact_position_title, contact_linkedin_url, assigned_to, follow_up_at,
                 follow_up_status, send_reminder_email, reminder_time_offset, priority,
                 created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                 $16, $17, $18)
             RETURNING *
         ) {}",
        select_from("l")
    );

    bind_fields(sqlx::query_as::<_, Lead>(&sql), fields)
        .bind(created_by)
        .fetch_one(pool)
        .await
}

/// Overwrite the client-writable columns of an active record. Moving
/// `follow_up_at` re-arms the reminder email.
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    fields: &LeadFields,
) -> Result<Option<Lead>, sqlx::Error> {
    let sql = format!(
        "WITH l AS (
             UPDATE leads SET
                 title = $1, status_id = $2, source = $3, description = $4,
                 company_name = $5, contact_first_name = $6, contact_last_name = $7,
                 contact_email = $8, contact_phone = $9, contact_position_title = $10,
                 contact_linkedin_url = $11, assigned_to = $12,
                 reminder_email_sent_at = CASE
                     WHEN leads.follow_up_at IS DISTINCT FROM $13 THEN NULL
                     ELSE leads.reminder_email_sent_at
                 END,
                 follow_up_at = $13, follow_up_status = $14, send_reminder_email = $15,
                 reminder_time_offset = $16, priority = $17, updated_at = now()
             WHERE id = $18 AND is_active = true
             RETURNING *
         ) {}",
        select_from("l")
    );

    bind_fields(sqlx::query_as::<_, Lead>(&sql), fields)
        .bind(id)
        .fetch_optional(pool)
        .await
}

fn bind_fields<'q>(
    query: sqlx::query::QueryAs<'q, Postgres, Lead, sqlx::postgres::PgArguments>,
    fields: &'q LeadFields,
) -> sqlx::query::QueryAs<'q, Postgres, Lead, sqlx::postgres::PgArguments> {
    query
        .bind(&fields.title)
        .bind(fields.status_id)
        .bind(&fields.source)
        .bind(&fields.description)
        .bind(&fields.company_name)
        .bind(&fields.contact_first_name)
        .bind(&fields.contact_last_name)
        .bind(&fields.contact_email)
        .bind(&fields.contact_phone)
        .bind(&fields.contact_position_title)
        .bind(&fields.contact_linkedin_url)
        .bind(fields.assigned_to)
        .bind(fields.follow_up_at)
        .bind(fields.follow_up_status)
        .bind(fields.send_reminder_email)
        .bind(fields.reminder_time_offset)
        .bind(fields.priority)
}

/// Soft delete. Returns false when the record was missing or already inactive.
pub async fn deactivate(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE leads SET is_active = false, updated_at = now()
         WHERE id = $1 AND is_active = true",
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_follow_up_status(
    pool: &PgPool,
    id: Uuid,
    state: FollowUpState,
) -> Result<Option<Lead>, sqlx::Error> {
    let sql = format!(
        "WITH l AS (
             UPDATE leads SET follow_up_status = $1, updated_at = now()
             WHERE id = $2 AND is_active = true
             RETURNING *
         ) {}",
        select_from("l")
    );
    sqlx::query_as::<_, Lead>(&sql)
        .bind(state)
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Flip an active lead into a project. `None` when no active,
/// not-yet-converted row matched.
pub async fn mark_as_project(pool: &PgPool, id: Uuid) -> Result<Option<Lead>, sqlx::Error> {
    let sql = format!(
        "WITH l AS (
             UPDATE leads SET is_project = true, updated_at = now()
             WHERE id = $1 AND is_active = true AND is_project = false
             RETURNING *
         ) {}",
        select_from("l")
    );
    sqlx::query_as::<_, Lead>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Records in `scope` that carry a follow-up, soonest first.
pub async fn list_follow_ups(pool: &PgPool, scope: &LeadScope) -> Result<Vec<Lead>, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new(select_from("leads"));
    scope.push_where(&mut qb);
    qb.push(
        " AND (l.follow_up_at IS NOT NULL OR l.follow_up_status IS NOT NULL)
         ORDER BY l.follow_up_at ASC NULLS LAST, l.created_at DESC",
    );

    qb.build_query_as::<Lead>().fetch_all(pool).await
}

/// Reminder candidates: opted in, scheduled, still pending, not yet sent,
/// and assigned to someone with an email address.
pub async fn pending_reminders(pool: &PgPool, limit: i64) -> Result<Vec<Lead>, sqlx::Error> {
    sqlx::query_as::<_, Lead>(&format!(
        "{} WHERE l.is_active = true
           AND l.send_reminder_email = true
           AND l.follow_up_at IS NOT NULL
           AND l.reminder_email_sent_at IS NULL
           AND pu.email IS NOT NULL
           AND l.follow_up_status IS DISTINCT FROM 'done'
         ORDER BY l.follow_up_at ASC
         LIMIT $1",
        select_from("leads")
    ))
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn mark_reminder_sent(
    pool: &PgPool,
    id: Uuid,
    at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE leads SET reminder_email_sent_at = $1 WHERE id = $2")
        .bind(at)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
