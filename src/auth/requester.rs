use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::Role;

/// The resolved identity every piece of lead logic is handed explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requester {
    pub user_id: Uuid,
    pub profile_id: Uuid,
    pub role: Role,
    pub is_superuser: bool,
}

impl Requester {
    /// Look up the caller's active profile. A token whose user has no
    /// active profile yields `ProfileNotFound`. The superuser flag is read
    /// from the user row, so revoking it takes effect on the next request.
    pub async fn resolve(pool: &PgPool, auth: &AuthUser) -> Result<Self, AppError> {
        let profile = db::profiles::find_active_by_user(pool, auth.user_id)
            .await?
            .ok_or(AppError::ProfileNotFound)?;
        let user = db::users::find_by_id(pool, auth.user_id)
            .await?
            .ok_or(AppError::ProfileNotFound)?;

        Ok(Requester {
            user_id: auth.user_id,
            profile_id: profile.id,
            role: profile.role,
            is_superuser: user.is_superuser,
        })
    }

    /// Employees only see records assigned to them; everyone else sees all.
    pub fn scoped_to_own_records(&self) -> bool {
        self.role == Role::Employee && !self.is_superuser
    }

    pub fn is_manager(&self) -> bool {
        self.role == Role::Manager || self.is_superuser
    }

    pub fn require_manager(&self, message: &str) -> Result<(), AppError> {
        if self.is_manager() {
            Ok(())
        } else {
            Err(AppError::Forbidden(message.to_string()))
        }
    }
}
