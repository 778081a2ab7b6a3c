use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::db;
use crate::email;
use crate::leads::reminders::{self, SWEEP_BATCH};
use crate::state::SharedState;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Start the background loop: follow-up reminders plus housekeeping.
pub fn spawn(state: SharedState, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
    tokio::spawn(run(state, shutdown))
}

async fn run(state: SharedState, mut shutdown: watch::Receiver<bool>) {
    let interval = Duration::from_secs(state.config.reminder_interval_secs.max(1));
    tracing::info!("Reminder worker started (every {}s)", interval.as_secs());

    loop {
        if *shutdown.borrow() {
            break;
        }

        match sweep(&state, Utc::now()).await {
            Ok(report) if report.sent > 0 || report.failed > 0 => {
                tracing::info!(
                    "Reminder sweep: {} sent, {} skipped, {} failed",
                    report.sent,
                    report.skipped,
                    report.failed
                );
            }
            Ok(_) => {}
            Err(e) => tracing::error!("Reminder sweep error: {e}"),
        }

        housekeeping(&state).await;

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.changed() => {}
        }
    }

    tracing::info!("Reminder worker stopped");
}

/// Email every assignee whose reminder time has arrived. A lead is stamped
/// only after its email went out, so failed sends are retried next sweep.
pub async fn sweep(state: &SharedState, now: DateTime<Utc>) -> Result<SweepReport, String> {
    let Some(mailer) = state.system_mailer.as_ref() else {
        return Ok(SweepReport::default());
    };

    let leads = db::leads::pending_reminders(&state.pool, SWEEP_BATCH)
        .await
        .map_err(|e| format!("Failed to load reminders: {e}"))?;

    let mut report = SweepReport::default();
    for lead in leads {
        if !reminders::reminder_due(&lead, now) {
            report.skipped += 1;
            continue;
        }
        let (Some(to_email), Some(follow_up_at)) = (lead.assigned_to_email.as_deref(), lead.follow_up_at)
        else {
            report.skipped += 1;
            continue;
        };

        let name = lead.assigned_to_name.as_deref().unwrap_or_default();
        let result = mailer
            .send_follow_up_reminder(
                to_email,
                name,
                &lead.title,
                &follow_up_at.format("%Y-%m-%d %H:%M UTC").to_string(),
                lead.reminder_time_offset.label(),
                &email::lead_url(&state.config.frontend_url, lead.id),
            )
            .await;

        match result {
            Ok(()) => {
                db::leads::mark_reminder_sent(&state.pool, lead.id, now)
                    .await
                    .map_err(|e| format!("Failed to stamp reminder for {}: {e}", lead.id))?;
                report.sent += 1;
            }
            Err(e) => {
                tracing::warn!("Reminder for lead {} not sent: {e}", lead.id);
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

async fn housekeeping(state: &SharedState) {
    state.login_limiter.cleanup();

    match db::refresh_tokens::purge_expired(&state.pool).await {
        Ok(0) => {}
        Ok(n) => tracing::debug!("Purged {n} expired refresh tokens"),
        Err(e) => tracing::warn!("Refresh token purge failed: {e}"),
    }
}
