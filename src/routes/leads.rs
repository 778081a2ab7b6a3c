use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Path, Query, RawQuery, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::auth::requester::Requester;
use crate::db;
use crate::email;
use crate::error::{AppError, LeadApiError};
use crate::leads::conversion;
use crate::leads::input::{self, LeadPayload};
use crate::leads::pagination::Page;
use crate::leads::visibility::{LeadFilters, LeadQuery, LeadScope, ListingKind};
use crate::models::{FollowUpState, Lead, LeadFields, LeadView, Role, views};
use crate::state::SharedState;

const CLOSED_STATUS: &str = "closed";
const CLOSED_PREVIEW: i64 = 5;

#[derive(Serialize)]
pub struct UserRef {
    pub id: Uuid,
    #[serde(rename = "user__email")]
    pub user_email: String,
}

#[derive(Serialize)]
pub struct ClosedLeads {
    pub leads_count: i64,
    pub close_leads: Vec<LeadView>,
    pub offset: i64,
}

#[derive(Serialize)]
pub struct LeadListResponse {
    pub leads: Vec<LeadView>,
    pub count: i64,
    pub offset: i64,
    pub limit: i64,
    pub search: bool,
    pub close_leads: ClosedLeads,
    pub users: Vec<UserRef>,
    #[serde(rename = "UserRole")]
    pub user_role: BTreeMap<&'static str, &'static str>,
}

#[derive(Serialize)]
pub struct ProjectListResponse {
    pub projects_count: i64,
    pub projects: Vec<LeadView>,
    pub next: Option<String>,
    pub previous: Option<String>,
}

#[derive(Serialize)]
pub struct LeadDetailResponse {
    pub lead_obj: LeadView,
    #[serde(rename = "UserRole")]
    pub user_role: BTreeMap<&'static str, &'static str>,
}

#[derive(Serialize)]
pub struct LeadMessage {
    pub error: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_obj: Option<LeadView>,
}

#[derive(Serialize)]
pub struct ConvertResponse {
    pub error: bool,
    pub message: String,
    pub is_project: bool,
    pub project: LeadView,
}

#[derive(Deserialize)]
pub struct FollowUpStatusRequest {
    pub follow_up_status: Option<String>,
}

fn user_roles() -> BTreeMap<&'static str, &'static str> {
    Role::ALL
        .iter()
        .map(|role| (role.constant_name(), role.as_str()))
        .collect()
}

fn lead_not_found() -> AppError {
    AppError::NotFound("Lead not found".to_string())
}

fn parse_id(id: &str) -> Result<Uuid, AppError> {
    id.parse::<Uuid>().map_err(|_| lead_not_found())
}

fn title_conflict(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::BadRequest("Lead already exists with this title".to_string())
        }
        _ => AppError::Database(err),
    }
}

/// Fetch a record the requester is allowed to see, lead or project.
async fn find_visible(
    state: &SharedState,
    requester: &Requester,
    id: &str,
) -> Result<Lead, AppError> {
    let id = parse_id(id)?;
    let scope = LeadScope::new(requester, ListingKind::All, LeadFilters::default());
    db::leads::find_by_id(&state.pool, id)
        .await?
        .filter(|lead| scope.matches(lead))
        .ok_or_else(lead_not_found)
}

/// Tell the new assignee about the lead without holding up the response.
fn notify_assignee(state: &SharedState, lead: &Lead) {
    let Some(to_email) = lead.assigned_to_email.clone() else {
        return;
    };
    let Some(mailer) = state.system_mailer.clone() else {
        tracing::debug!("System SMTP not configured, skipping assignment email for {}", lead.id);
        return;
    };

    let lead_id = lead.id;
    let name = lead.assigned_to_name.clone().unwrap_or_default();
    let title = lead.title.clone();
    let company = lead.company_name.clone();
    let url = email::lead_url(&state.config.frontend_url, lead.id);

    tokio::spawn(async move {
        if let Err(e) = mailer
            .send_lead_assigned(&to_email, &name, &title, &company, &url)
            .await
        {
            tracing::error!("Failed to send assignment email for lead {lead_id}: {e}");
        }
    });
}

pub async fn list(
    State(state): State<SharedState>,
    auth: AuthUser,
    Query(query): Query<LeadQuery>,
) -> Result<Json<LeadListResponse>, LeadApiError> {
    let requester = Requester::resolve(&state.pool, &auth).await?;

    let filters = LeadFilters::from_query(&query);
    let search = filters.is_search();
    let page = Page::parse(query.limit.as_deref(), query.offset.as_deref());

    let scope = LeadScope::new(&requester, ListingKind::Leads, filters);
    let count = db::leads::count(&state.pool, &scope).await?;
    let leads = db::leads::list(&state.pool, &scope, page.limit, page.offset).await?;

    let closed_scope = LeadScope::new(
        &requester,
        ListingKind::Leads,
        LeadFilters::with_status_name(CLOSED_STATUS),
    );
    let closed_count = db::leads::count(&state.pool, &closed_scope).await?;
    let closed = db::leads::list(&state.pool, &closed_scope, CLOSED_PREVIEW, 0).await?;

    let users = db::profiles::list_active(&state.pool)
        .await?
        .into_iter()
        .map(|p| UserRef {
            id: p.id,
            user_email: p.email,
        })
        .collect();

    Ok(Json(LeadListResponse {
        leads: views(&leads),
        count,
        offset: page.offset,
        limit: page.limit,
        search,
        close_leads: ClosedLeads {
            leads_count: closed_count,
            close_leads: views(&closed),
            offset: 0,
        },
        users,
        user_role: user_roles(),
    }))
}

pub async fn projects(
    State(state): State<SharedState>,
    auth: AuthUser,
    Query(query): Query<LeadQuery>,
    RawQuery(raw_query): RawQuery,
) -> Result<Json<ProjectListResponse>, LeadApiError> {
    let requester = Requester::resolve(&state.pool, &auth).await?;

    let page = Page::parse(query.limit.as_deref(), query.offset.as_deref());
    let scope = LeadScope::new(
        &requester,
        ListingKind::Projects,
        LeadFilters::from_query(&query),
    );

    let count = db::leads::count(&state.pool, &scope).await?;
    let projects = db::leads::list(&state.pool, &scope, page.limit, page.offset).await?;
    let links = page.links(
        &state.config.base_url,
        "/api/leads/projects/",
        raw_query.as_deref(),
        count,
    );

    Ok(Json(ProjectListResponse {
        projects_count: count,
        projects: views(&projects),
        next: links.next,
        previous: links.previous,
    }))
}

pub async fn create(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(payload): Json<LeadPayload>,
) -> Result<(StatusCode, Json<LeadMessage>), LeadApiError> {
    let requester = Requester::resolve(&state.pool, &auth).await?;

    let fields = payload.apply(LeadFields::default())?;
    input::check_references(&state.pool, &fields, None).await?;

    let lead = db::leads::create(&state.pool, &fields, requester.user_id)
        .await
        .map_err(title_conflict)?;
    tracing::info!("Lead {} created by user {}", lead.id, requester.user_id);

    if lead.assigned_to.is_some() {
        notify_assignee(&state, &lead);
    }

    Ok((
        StatusCode::CREATED,
        Json(LeadMessage {
            error: false,
            message: "Lead Created Successfully".to_string(),
            id: Some(lead.id),
            lead_obj: None,
        }),
    ))
}

pub async fn get(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<LeadDetailResponse>, LeadApiError> {
    let requester = Requester::resolve(&state.pool, &auth).await?;
    let lead = find_visible(&state, &requester, &id).await?;

    Ok(Json(LeadDetailResponse {
        lead_obj: lead.view(chrono::Utc::now()),
        user_role: user_roles(),
    }))
}

pub async fn update(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<LeadPayload>,
) -> Result<Json<LeadMessage>, LeadApiError> {
    let requester = Requester::resolve(&state.pool, &auth).await?;
    let current = find_visible(&state, &requester, &id).await?;

    let fields = payload.apply(LeadFields::from(&current))?;
    input::check_references(&state.pool, &fields, Some(current.id)).await?;

    let lead = db::leads::update(&state.pool, current.id, &fields)
        .await
        .map_err(title_conflict)?
        .ok_or_else(lead_not_found)?;

    if lead.assigned_to.is_some() && lead.assigned_to != current.assigned_to {
        notify_assignee(&state, &lead);
    }

    Ok(Json(LeadMessage {
        error: false,
        message: "Lead Updated Successfully".to_string(),
        id: Some(lead.id),
        lead_obj: Some(lead.view(chrono::Utc::now())),
    }))
}

pub async fn delete(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<LeadMessage>, LeadApiError> {
    let requester = Requester::resolve(&state.pool, &auth).await?;
    let lead = find_visible(&state, &requester, &id).await?;

    if !db::leads::deactivate(&state.pool, lead.id).await? {
        return Err(lead_not_found().into());
    }
    tracing::info!("Lead {} deactivated by user {}", lead.id, requester.user_id);

    Ok(Json(LeadMessage {
        error: false,
        message: "Lead Deleted Successfully".to_string(),
        id: None,
        lead_obj: None,
    }))
}

pub async fn follow_up_status(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<FollowUpStatusRequest>,
) -> Result<Json<LeadMessage>, LeadApiError> {
    let requester = Requester::resolve(&state.pool, &auth).await?;

    let new_state = match req.follow_up_status.as_deref().map(str::trim) {
        Some("pending") => FollowUpState::Pending,
        Some("done") => FollowUpState::Done,
        _ => {
            return Err(AppError::BadRequest(
                "follow_up_status must be 'pending' or 'done'".to_string(),
            )
            .into());
        }
    };

    let lead = find_visible(&state, &requester, &id).await?;
    let lead = db::leads::set_follow_up_status(&state.pool, lead.id, new_state)
        .await?
        .ok_or_else(lead_not_found)?;

    Ok(Json(LeadMessage {
        error: false,
        message: "Follow-up status updated".to_string(),
        id: Some(lead.id),
        lead_obj: Some(lead.view(chrono::Utc::now())),
    }))
}

pub async fn convert_to_project(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ConvertResponse>, LeadApiError> {
    let requester = Requester::resolve(&state.pool, &auth).await?;
    conversion::authorize(&requester)?;
    let lead_id = parse_id(&id)?;

    let project = conversion::convert(&state.pool, &requester, lead_id).await?;

    Ok(Json(ConvertResponse {
        error: false,
        message: "Lead converted to project successfully".to_string(),
        is_project: true,
        project: project.view(chrono::Utc::now()),
    }))
}
