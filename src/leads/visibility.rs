//! Which lead/project records a requester may list.
//!
//! A [`LeadScope`] is built from the requester, the listing kind, and the
//! typed query filters. It renders either as a SQL `WHERE` clause or as an
//! in-memory predicate; both must accept exactly the same rows.

use serde::Deserialize;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::auth::requester::Requester;
use crate::models::Lead;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingKind {
    Leads,
    Projects,
    /// Both leads and projects (detail lookups, reminders).
    All,
}

/// Raw listing query string. Every field stays a string so a malformed
/// value never rejects the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadQuery {
    pub name: Option<String>,
    pub city: Option<String>,
    pub email: Option<String>,
    pub status: Option<String>,
    pub source: Option<String>,
    pub assigned_to: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusFilter {
    Id(i32),
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssigneeFilter {
    Profile(Uuid),
    /// The value did not parse as a profile id; nothing can match.
    NoMatch,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadFilters {
    pub name: Option<String>,
    pub city: Option<String>,
    pub email: Option<String>,
    pub status: Option<StatusFilter>,
    pub source: Option<String>,
    pub assigned_to: Option<AssigneeFilter>,
}

impl LeadFilters {
    pub fn from_query(query: &LeadQuery) -> Self {
        LeadFilters {
            name: non_blank(&query.name),
            city: non_blank(&query.city),
            email: non_blank(&query.email),
            status: non_blank(&query.status).map(|value| match value.parse::<i32>() {
                Ok(id) => StatusFilter::Id(id),
                Err(_) => StatusFilter::Name(value),
            }),
            source: non_blank(&query.source),
            assigned_to: non_blank(&query.assigned_to).map(|value| {
                value
                    .parse::<Uuid>()
                    .map(AssigneeFilter::Profile)
                    .unwrap_or(AssigneeFilter::NoMatch)
            }),
        }
    }

    pub fn with_status_name(name: &str) -> Self {
        LeadFilters {
            status: Some(StatusFilter::Name(name.to_string())),
            ..Default::default()
        }
    }

    /// True when the client asked for any filtering at all.
    pub fn is_search(&self) -> bool {
        self.name.is_some()
            || self.city.is_some()
            || self.email.is_some()
            || self.status.is_some()
            || self.source.is_some()
            || self.assigned_to.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct LeadScope {
    kind: ListingKind,
    owner: Option<Uuid>,
    filters: LeadFilters,
}

impl LeadScope {
    pub fn new(requester: &Requester, kind: ListingKind, filters: LeadFilters) -> Self {
        LeadScope {
            kind,
            owner: requester
                .scoped_to_own_records()
                .then_some(requester.profile_id),
            filters,
        }
    }

    pub fn kind(&self) -> ListingKind {
        self.kind
    }

    /// Append ` WHERE …` for a query over `leads l` joined to
    /// `lead_statuses s`.
    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" WHERE l.is_active = true");

        match self.kind {
            ListingKind::Leads => {
                qb.push(" AND l.is_project = false");
            }
            ListingKind::Projects => {
                qb.push(" AND l.is_project = true");
            }
            ListingKind::All => {}
        }

        if let Some(owner) = self.owner {
            qb.push(" AND l.assigned_to = ").push_bind(owner);
        }

        let filters = &self.filters;
        if let Some(name) = &filters.name {
            let pattern = like_pattern(name);
            qb.push(" AND (l.company_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR l.contact_first_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR l.contact_last_name ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(city) = &filters.city {
            qb.push(" AND l.company_name ILIKE ")
                .push_bind(like_pattern(city));
        }
        if let Some(email) = &filters.email {
            qb.push(" AND l.contact_email ILIKE ")
                .push_bind(like_pattern(email));
        }
        match &filters.status {
            Some(StatusFilter::Id(id)) => {
                qb.push(" AND l.status_id = ").push_bind(*id);
            }
            Some(StatusFilter::Name(name)) => {
                qb.push(" AND s.name = ").push_bind(name.clone());
            }
            None => {}
        }
        if let Some(source) = &filters.source {
            qb.push(" AND l.source = ").push_bind(source.clone());
        }
        match filters.assigned_to {
            Some(AssigneeFilter::Profile(id)) => {
                qb.push(" AND l.assigned_to = ").push_bind(id);
            }
            Some(AssigneeFilter::NoMatch) => {
                qb.push(" AND FALSE");
            }
            None => {}
        }
    }

    pub fn matches(&self, lead: &Lead) -> bool {
        if !lead.is_active {
            return false;
        }
        match self.kind {
            ListingKind::Leads if lead.is_project => return false,
            ListingKind::Projects if !lead.is_project => return false,
            _ => {}
        }
        if let Some(owner) = self.owner {
            if lead.assigned_to != Some(owner) {
                return false;
            }
        }

        let filters = &self.filters;
        if let Some(name) = &filters.name {
            let hit = [
                &lead.company_name,
                &lead.contact_first_name,
                &lead.contact_last_name,
            ]
            .iter()
            .any(|field| contains_ci(field, name));
            if !hit {
                return false;
            }
        }
        if let Some(city) = &filters.city {
            if !contains_ci(&lead.company_name, city) {
                return false;
            }
        }
        if let Some(email) = &filters.email {
            if !contains_ci(&lead.contact_email, email) {
                return false;
            }
        }
        let status_ok = match &filters.status {
            Some(StatusFilter::Id(id)) => lead.status_id == Some(*id),
            Some(StatusFilter::Name(name)) => lead.status_name.as_deref() == Some(name.as_str()),
            None => true,
        };
        if !status_ok {
            return false;
        }
        if let Some(source) = &filters.source {
            if lead.source.as_deref() != Some(source.as_str()) {
                return false;
            }
        }
        match filters.assigned_to {
            Some(AssigneeFilter::Profile(id)) => lead.assigned_to == Some(id),
            Some(AssigneeFilter::NoMatch) => false,
            None => true,
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// `%needle%` with LIKE wildcards in the needle escaped.
fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
