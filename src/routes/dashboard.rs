use axum::Json;
use axum::extract::State;
use chrono::Utc;
use serde::Serialize;

use crate::auth::extractor::AuthUser;
use crate::auth::requester::Requester;
use crate::db;
use crate::error::LeadApiError;
use crate::leads::reminders::{self, Bucket};
use crate::leads::visibility::{LeadFilters, LeadScope, ListingKind};
use crate::models::{LeadView, views};
use crate::state::SharedState;

#[derive(Serialize)]
pub struct BucketView {
    pub count: usize,
    pub leads: Vec<LeadView>,
}

impl From<Bucket> for BucketView {
    fn from(bucket: Bucket) -> Self {
        BucketView {
            count: bucket.count,
            leads: views(&bucket.leads),
        }
    }
}

#[derive(Serialize)]
pub struct Reminders {
    pub overdue: BucketView,
    pub due_today: BucketView,
    pub upcoming: BucketView,
    pub done: BucketView,
}

#[derive(Serialize)]
pub struct RemindersResponse {
    pub success: bool,
    pub reminders: Reminders,
}

pub async fn reminders(
    State(state): State<SharedState>,
    auth: AuthUser,
) -> Result<Json<RemindersResponse>, LeadApiError> {
    let requester = Requester::resolve(&state.pool, &auth).await?;
    let scope = LeadScope::new(&requester, ListingKind::All, LeadFilters::default());

    let leads = db::leads::list_follow_ups(&state.pool, &scope).await?;
    let buckets = reminders::bucket(leads, Utc::now());

    Ok(Json(RemindersResponse {
        success: true,
        reminders: Reminders {
            overdue: buckets.overdue.into(),
            due_today: buckets.due_today.into(),
            upcoming: buckets.upcoming.into(),
            done: BucketView {
                count: buckets.done,
                leads: Vec::new(),
            },
        },
    }))
}
