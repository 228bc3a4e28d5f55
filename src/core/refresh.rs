use crate::core::fetch::{refresh_entry, unix_now};
use crate::domain::model::{EntryOutcome, RefreshSummary, RegistryEntry};
use crate::domain::ports::{ConfigProvider, Fetcher, RegistryStore};
use crate::utils::error::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Runs refresh cycles: load the registry, fetch every stale entry through a
/// bounded pool, then write the whole registry back once.
pub struct RefreshCoordinator<S: RegistryStore, F: Fetcher + 'static> {
    store: S,
    fetcher: Arc<F>,
    concurrency: usize,
    timeout: Duration,
}

impl<S: RegistryStore, F: Fetcher + 'static> RefreshCoordinator<S, F> {
    pub fn new(store: S, fetcher: Arc<F>, concurrency: usize, timeout: Duration) -> Self {
        Self {
            store,
            fetcher,
            concurrency: concurrency.max(1),
            timeout,
        }
    }

    pub fn from_config<C: ConfigProvider>(store: S, fetcher: Arc<F>, config: &C) -> Self {
        Self::new(store, fetcher, config.concurrency(), config.request_timeout())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// One full refresh cycle against the store.
    pub async fn refresh(&self) -> Result<RefreshSummary> {
        let entries = self.store.load().await?;
        let summary = self.refresh_entries(entries, unix_now()).await;
        self.store.save(&summary.entries).await?;

        tracing::info!(
            "🔄 Refresh complete: {} refreshed, {} fresh, {} failed",
            summary.refreshed,
            summary.fresh,
            summary.failed
        );
        Ok(summary)
    }

    /// Fans the entries out to at most `concurrency` concurrent fetches and
    /// joins them all. Output order matches input order; an entry whose
    /// worker failed (or panicked) comes back unchanged.
    pub async fn refresh_entries(&self, entries: Vec<RegistryEntry>, now: f64) -> RefreshSummary {
        let mut slots: Vec<Option<EntryOutcome>> = vec![None; entries.len()];
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        tracing::debug!(
            "Dispatching {} entries with concurrency {}",
            entries.len(),
            self.concurrency
        );

        for (index, entry) in entries.iter().cloned().enumerate() {
            // 新鮮的項目不佔用 worker
            if !entry.is_stale(now) {
                slots[index] = Some(EntryOutcome::Fresh(entry));
                continue;
            }

            let fetcher = Arc::clone(&self.fetcher);
            let permits = Arc::clone(&permits);
            let timeout = self.timeout;

            tasks.spawn(async move {
                let _permit = match permits.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => return (index, EntryOutcome::Failed(entry, e.to_string())),
                };
                (index, refresh_entry(fetcher.as_ref(), entry, now, timeout).await)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(e) => tracing::error!("Fetch task aborted: {}", e),
            }
        }

        let mut summary = RefreshSummary::default();
        for (slot, original) in slots.into_iter().zip(entries) {
            let outcome = slot.unwrap_or_else(|| {
                EntryOutcome::Failed(original, "fetch task did not complete".to_string())
            });
            match &outcome {
                EntryOutcome::Fresh(_) => summary.fresh += 1,
                EntryOutcome::Refreshed(_) => summary.refreshed += 1,
                EntryOutcome::Failed(..) => summary.failed += 1,
            }
            summary.entries.push(outcome.into_entry());
        }

        summary
    }
}
