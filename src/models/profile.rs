use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Manager,
    Employee,
    DevLead,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Manager, Role::Employee, Role::DevLead];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Manager => "manager",
            Role::Employee => "employee",
            Role::DevLead => "dev_lead",
        }
    }

    /// Name used by the frontend's role table (`UserRole` in listing responses).
    pub fn constant_name(self) -> &'static str {
        match self {
            Role::Manager => "MANAGER",
            Role::Employee => "EMPLOYEE",
            Role::DevLead => "DEV_LEAD",
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: Role,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Profile joined with its user, as embedded in API responses.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ProfileDetails {
    pub id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
