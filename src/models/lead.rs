use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Follow-up state as stored on the lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "follow_up_state", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FollowUpState {
    Pending,
    Done,
}

/// Follow-up status as presented to clients: a pending follow-up whose time
/// has passed is overdue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowUpStatus {
    Pending,
    Overdue,
    Done,
}

impl FollowUpStatus {
    pub fn derive(
        stored: Option<FollowUpState>,
        follow_up_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        match (stored, follow_up_at) {
            (Some(FollowUpState::Done), _) => Some(FollowUpStatus::Done),
            (_, Some(at)) if at < now => Some(FollowUpStatus::Overdue),
            (Some(FollowUpState::Pending), _) | (None, Some(_)) => Some(FollowUpStatus::Pending),
            (None, None) => None,
        }
    }
}

/// How long before `follow_up_at` the reminder email goes out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "reminder_offset")]
pub enum ReminderOffset {
    #[default]
    #[sqlx(rename = "exact")]
    #[serde(rename = "exact")]
    Exact,
    #[sqlx(rename = "30min")]
    #[serde(rename = "30min")]
    ThirtyMinutes,
    #[sqlx(rename = "1hour")]
    #[serde(rename = "1hour")]
    OneHour,
    #[sqlx(rename = "1day")]
    #[serde(rename = "1day")]
    OneDay,
}

impl ReminderOffset {
    pub fn duration(self) -> Duration {
        match self {
            ReminderOffset::Exact => Duration::zero(),
            ReminderOffset::ThirtyMinutes => Duration::minutes(30),
            ReminderOffset::OneHour => Duration::hours(1),
            ReminderOffset::OneDay => Duration::days(1),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReminderOffset::Exact => "At exact time",
            ReminderOffset::ThirtyMinutes => "30 minutes before",
            ReminderOffset::OneHour => "1 hour before",
            ReminderOffset::OneDay => "1 day before",
        }
    }

    pub fn scheduled_at(self, follow_up_at: DateTime<Utc>) -> DateTime<Utc> {
        follow_up_at - self.duration()
    }
}

/// A lead row joined with its status name, assignee, and creator.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Lead {
    pub id: Uuid,
    pub title: String,
    pub status_id: Option<i32>,
    pub status_name: Option<String>,
    pub source: Option<String>,
    pub description: Option<String>,
    pub company_name: String,
    pub contact_first_name: String,
    pub contact_last_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub contact_position_title: String,
    pub contact_linkedin_url: String,
    pub assigned_to: Option<Uuid>,
    pub assigned_to_email: Option<String>,
    pub assigned_to_name: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_by_email: Option<String>,
    pub follow_up_at: Option<DateTime<Utc>>,
    pub follow_up_status: Option<FollowUpState>,
    pub send_reminder_email: bool,
    pub reminder_time_offset: ReminderOffset,
    pub reminder_email_sent_at: Option<DateTime<Utc>>,
    pub priority: bool,
    pub is_project: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-writable lead columns, validated before they reach the database.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadFields {
    pub title: String,
    pub status_id: Option<i32>,
    pub source: Option<String>,
    pub description: Option<String>,
    pub company_name: String,
    pub contact_first_name: String,
    pub contact_last_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub contact_position_title: String,
    pub contact_linkedin_url: String,
    pub assigned_to: Option<Uuid>,
    pub follow_up_at: Option<DateTime<Utc>>,
    pub follow_up_status: Option<FollowUpState>,
    pub send_reminder_email: bool,
    pub reminder_time_offset: ReminderOffset,
    pub priority: bool,
}

impl From<&Lead> for LeadFields {
    fn from(lead: &Lead) -> Self {
        LeadFields {
            title: lead.title.clone(),
            status_id: lead.status_id,
            source: lead.source.clone(),
            description: lead.description.clone(),
            company_name: lead.company_name.clone(),
            contact_first_name: lead.contact_first_name.clone(),
            contact_last_name: lead.contact_last_name.clone(),
            contact_email: lead.contact_email.clone(),
            contact_phone: lead.contact_phone.clone(),
            contact_position_title: lead.contact_position_title.clone(),
            contact_linkedin_url: lead.contact_linkedin_url.clone(),
            assigned_to: lead.assigned_to,
            follow_up_at: lead.follow_up_at,
            follow_up_status: lead.follow_up_status,
            send_reminder_email: lead.send_reminder_email,
            reminder_time_offset: lead.reminder_time_offset,
            priority: lead.priority,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusRef {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssigneeRef {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatorRef {
    pub id: Uuid,
    pub email: String,
}

/// Client representation of a lead or project.
#[derive(Debug, Clone, Serialize)]
pub struct LeadView {
    pub id: Uuid,
    pub title: String,
    pub status: Option<StatusRef>,
    pub source: Option<String>,
    pub description: Option<String>,
    pub company_name: String,
    pub contact_first_name: String,
    pub contact_last_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub contact_position_title: String,
    pub contact_linkedin_url: String,
    pub assigned_to: Option<AssigneeRef>,
    pub follow_up_at: Option<DateTime<Utc>>,
    pub follow_up_status: Option<FollowUpStatus>,
    pub send_reminder_email: bool,
    pub reminder_time_offset: ReminderOffset,
    pub priority: bool,
    pub created_by: Option<CreatorRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
    pub is_project: bool,
}

impl Lead {
    pub fn view(&self, now: DateTime<Utc>) -> LeadView {
        LeadView {
            id: self.id,
            title: self.title.clone(),
            status: self
                .status_id
                .zip(self.status_name.clone())
                .map(|(id, name)| StatusRef { id, name }),
            source: self.source.clone(),
            description: self.description.clone(),
            company_name: self.company_name.clone(),
            contact_first_name: self.contact_first_name.clone(),
            contact_last_name: self.contact_last_name.clone(),
            contact_email: self.contact_email.clone(),
            contact_phone: self.contact_phone.clone(),
            contact_position_title: self.contact_position_title.clone(),
            contact_linkedin_url: self.contact_linkedin_url.clone(),
            assigned_to: self.assigned_to.map(|id| AssigneeRef {
                id,
                email: self.assigned_to_email.clone().unwrap_or_default(),
                name: self.assigned_to_name.clone().unwrap_or_default(),
            }),
            follow_up_at: self.follow_up_at,
            follow_up_status: FollowUpStatus::derive(
                self.follow_up_status,
                self.follow_up_at,
                now,
            ),
            send_reminder_email: self.send_reminder_email,
            reminder_time_offset: self.reminder_time_offset,
            priority: self.priority,
            created_by: self.created_by.map(|id| CreatorRef {
                id,
                email: self.created_by_email.clone().unwrap_or_default(),
            }),
            created_at: self.created_at,
            updated_at: self.updated_at,
            is_active: self.is_active,
            is_project: self.is_project,
        }
    }
}

pub fn views(leads: &[Lead]) -> Vec<LeadView> {
    let now = Utc::now();
    leads.iter().map(|lead| lead.view(now)).collect()
}
