//! Lead create/update payloads and their validation.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::error::AppError;
use crate::models::{FollowUpState, LeadFields, ReminderOffset};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

const TITLE_MAX: usize = 255;

/// Body of `POST /api/leads/` and `PUT /api/leads/{id}/`. Absent fields
/// keep their current value on update; an explicit `null` clears a nullable
/// field.
#[derive(Debug, Default, Deserialize)]
pub struct LeadPayload {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub status: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub source: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    pub company_name: Option<String>,
    pub contact_first_name: Option<String>,
    pub contact_last_name: Option<String>,
    pub contact_email: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub contact_phone: Option<Option<String>>,
    pub contact_position_title: Option<String>,
    pub contact_linkedin_url: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub assigned_to: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "nullable")]
    pub follow_up_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "nullable")]
    pub follow_up_status: Option<Option<FollowUpState>>,
    pub send_reminder_email: Option<bool>,
    pub reminder_time_offset: Option<ReminderOffset>,
    pub priority: Option<bool>,
}

/// Present keys land in `Some`, so `null` becomes `Some(None)` while a
/// missing key stays `None` through `#[serde(default)]`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl LeadPayload {
    /// Overlay the payload on `base` and check the field-level rules.
    pub fn apply(self, base: LeadFields) -> Result<LeadFields, AppError> {
        let mut fields = LeadFields {
            title: self.title.map(|t| t.trim().to_string()).unwrap_or(base.title),
            status_id: self.status.unwrap_or(base.status_id),
            source: self.source.unwrap_or(base.source),
            description: self.description.unwrap_or(base.description),
            company_name: self.company_name.unwrap_or(base.company_name),
            contact_first_name: self.contact_first_name.unwrap_or(base.contact_first_name),
            contact_last_name: self.contact_last_name.unwrap_or(base.contact_last_name),
            contact_email: self
                .contact_email
                .map(|e| e.trim().to_string())
                .unwrap_or(base.contact_email),
            contact_phone: self.contact_phone.unwrap_or(base.contact_phone),
            contact_position_title: self
                .contact_position_title
                .unwrap_or(base.contact_position_title),
            contact_linkedin_url: self.contact_linkedin_url.unwrap_or(base.contact_linkedin_url),
            assigned_to: self.assigned_to.unwrap_or(base.assigned_to),
            follow_up_at: self.follow_up_at.unwrap_or(base.follow_up_at),
            follow_up_status: self.follow_up_status.unwrap_or(base.follow_up_status),
            send_reminder_email: self.send_reminder_email.unwrap_or(base.send_reminder_email),
            reminder_time_offset: self.reminder_time_offset.unwrap_or(base.reminder_time_offset),
            priority: self.priority.unwrap_or(base.priority),
        };

        if fields.title.is_empty() {
            return Err(AppError::BadRequest("title: This field is required.".to_string()));
        }
        if fields.title.chars().count() > TITLE_MAX {
            return Err(AppError::BadRequest(format!(
                "title: Ensure this field has no more than {TITLE_MAX} characters."
            )));
        }
        if !fields.contact_email.is_empty() && !EMAIL_RE.is_match(&fields.contact_email) {
            return Err(AppError::BadRequest(
                "contact_email: Enter a valid email address.".to_string(),
            ));
        }
        if fields.follow_up_at.is_some() && fields.follow_up_status.is_none() {
            fields.follow_up_status = Some(FollowUpState::Pending);
        }

        Ok(fields)
    }
}

/// Database-backed rules: unique title, known status, assignable profile.
pub async fn check_references(
    pool: &PgPool,
    fields: &LeadFields,
    exclude: Option<Uuid>,
) -> Result<(), AppError> {
    if db::leads::title_taken(pool, &fields.title, exclude).await? {
        return Err(AppError::BadRequest(
            "Lead already exists with this title".to_string(),
        ));
    }
    if let Some(status_id) = fields.status_id {
        if db::lead_options::find_status(pool, status_id).await?.is_none() {
            return Err(AppError::BadRequest(format!(
                "status: Invalid pk \"{status_id}\" - object does not exist."
            )));
        }
    }
    if let Some(profile_id) = fields.assigned_to {
        if !db::profiles::is_assignable(pool, profile_id).await? {
            return Err(AppError::BadRequest(format!(
                "assigned_to: Invalid pk \"{profile_id}\" - object does not exist."
            )));
        }
    }
    Ok(())
}
