//! Follow-up reminder scheduling and the dashboard buckets.

use chrono::{DateTime, Duration, NaiveTime, Utc};

use crate::models::{FollowUpState, Lead};

pub const UPCOMING_CAP: usize = 10;

/// Reminder candidates loaded per sweep.
pub const SWEEP_BATCH: i64 = 200;

#[derive(Debug, Default)]
pub struct Bucket {
    pub count: usize,
    pub leads: Vec<Lead>,
}

#[derive(Debug, Default)]
pub struct ReminderBuckets {
    pub overdue: Bucket,
    pub due_today: Bucket,
    pub upcoming: Bucket,
    pub done: usize,
}

/// Sort pending follow-ups around the current UTC day. `leads` must be
/// ordered by `follow_up_at` ascending.
pub fn bucket(leads: Vec<Lead>, now: DateTime<Utc>) -> ReminderBuckets {
    let today = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    let tomorrow = today + Duration::days(1);

    let mut buckets = ReminderBuckets::default();
    for lead in leads {
        match (lead.follow_up_status, lead.follow_up_at) {
            (Some(FollowUpState::Done), _) => buckets.done += 1,
            (Some(FollowUpState::Pending), Some(at)) => {
                let target = if at < today {
                    &mut buckets.overdue
                } else if at < tomorrow {
                    &mut buckets.due_today
                } else {
                    &mut buckets.upcoming
                };
                target.count += 1;
                target.leads.push(lead);
            }
            _ => {}
        }
    }
    buckets.upcoming.leads.truncate(UPCOMING_CAP);
    buckets
}

/// Whether the sweep should email this lead's assignee now.
pub fn reminder_due(lead: &Lead, now: DateTime<Utc>) -> bool {
    if !lead.send_reminder_email || lead.reminder_email_sent_at.is_some() {
        return false;
    }
    match lead.follow_up_at {
        Some(at) => lead.reminder_time_offset.scheduled_at(at) <= now,
        None => false,
    }
}
