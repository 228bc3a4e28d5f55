use crate::domain::model::{EntryOutcome, RegistryEntry};
use crate::domain::ports::Fetcher;
use crate::utils::error::MsrError;
use std::time::Duration;

/// Slack on top of the client timeout before the task-level timeout fires.
const TIMEOUT_GRACE: Duration = Duration::from_secs(1);

/// Current wall-clock time as a Unix timestamp in seconds.
pub fn unix_now() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Runs one entry through a fetch.
///
/// Fresh entries are returned untouched without any network call. For stale
/// entries a successful fetch replaces the byte count and load time, and
/// moves the expiry to `now + max-age` when the response carried one. Any
/// failure keeps the previous values.
pub async fn refresh_entry<F>(
    fetcher: &F,
    entry: RegistryEntry,
    now: f64,
    timeout: Duration,
) -> EntryOutcome
where
    F: Fetcher + ?Sized,
{
    if !entry.is_stale(now) {
        tracing::debug!("{} is fresh until {}", entry.url, entry.expires_at);
        return EntryOutcome::Fresh(entry);
    }

    let deadline = timeout + TIMEOUT_GRACE;
    let result = match tokio::time::timeout(deadline, fetcher.fetch(&entry.url)).await {
        Ok(result) => result,
        Err(_) => Err(MsrError::FetchTimeout {
            url: entry.url.clone(),
            seconds: timeout.as_secs_f64(),
        }),
    };

    match result {
        Ok(outcome) => {
            let expires_at = match outcome.max_age {
                Some(max_age) => now + max_age,
                None => entry.expires_at,
            };
            EntryOutcome::Refreshed(RegistryEntry {
                content_bytes: outcome.content_bytes,
                load_time_seconds: outcome.elapsed.as_secs_f64(),
                expires_at,
                ..entry
            })
        }
        Err(e) => {
            tracing::warn!("❌ Failed to fetch {}: {}", entry.url, e);
            let reason = e.to_string();
            EntryOutcome::Failed(entry, reason)
        }
    }
}
