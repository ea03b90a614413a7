//! Background refresh at fixed wall-clock times

use std::sync::Arc;

use chrono::{Days, Local, NaiveDateTime, NaiveTime};

use super::{RefreshOutcome, SnapshotSource, SnapshotStore};

/// Parse "HH:MM" entries, dropping (and logging) anything malformed
pub fn parse_refresh_times(raw: &[String]) -> Vec<NaiveTime> {
    let mut times: Vec<NaiveTime> = raw
        .iter()
        .filter_map(|entry| match NaiveTime::parse_from_str(entry.trim(), "%H:%M") {
            Ok(time) => Some(time),
            Err(e) => {
                tracing::warn!(entry = %entry, error = %e, "Ignoring invalid refresh time");
                None
            }
        })
        .collect();
    times.sort();
    times.dedup();
    times
}

/// First scheduled instant strictly after `now`
pub fn next_refresh_at(now: NaiveDateTime, times: &[NaiveTime]) -> Option<NaiveDateTime> {
    let today = now.date();
    let tomorrow = today.checked_add_days(Days::new(1))?;

    times
        .iter()
        .map(|time| today.and_time(*time))
        .find(|candidate| *candidate > now)
        .or_else(|| times.first().map(|time| tomorrow.and_time(*time)))
}

/// Refresh `store` from `source` at each configured time, forever.
///
/// Runs as its own task; it only contends with requests through the store's
/// refresh lock.
pub async fn run_scheduler<S: SnapshotSource>(
    store: Arc<SnapshotStore>,
    source: Arc<S>,
    times: Vec<NaiveTime>,
) {
    if times.is_empty() {
        tracing::info!("No refresh times configured; scheduler disabled");
        return;
    }

    loop {
        let now = Local::now().naive_local();
        let Some(next) = next_refresh_at(now, &times) else {
            return;
        };
        let wait = (next - now).to_std().unwrap_or_default();
        tracing::debug!(next = %next, "Next scheduled snapshot refresh");
        tokio::time::sleep(wait).await;

        match store.refresh(source.as_ref()).await {
            Ok(RefreshOutcome::Loaded { version, .. }) => {
                tracing::info!(version, "Scheduled refresh completed");
            }
            Ok(RefreshOutcome::AlreadyLoading) => {
                tracing::info!("Scheduled refresh skipped; a refresh is already running");
            }
            Err(e) => {
                tracing::error!(error = %e, "Scheduled refresh failed; keeping previous snapshot");
            }
        }
    }
}
