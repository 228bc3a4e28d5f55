use crate::core::refresh::RefreshCoordinator;
use crate::core::report::{measure_rows, race_rows};
use crate::domain::model::{MeasureRow, RaceRow, RegistryEntry};
use crate::domain::ports::{Fetcher, RegistryStore};
use crate::utils::error::Result;
use crate::utils::validation::validate_url;

/// The operations behind the `register`, `measure` and `race` commands.
pub struct MsrEngine<S: RegistryStore, F: Fetcher + 'static> {
    coordinator: RefreshCoordinator<S, F>,
}

impl<S: RegistryStore, F: Fetcher + 'static> MsrEngine<S, F> {
    pub fn new(coordinator: RefreshCoordinator<S, F>) -> Self {
        Self { coordinator }
    }

    /// Validates and registers a URL. Returns `false` if it was already present.
    pub async fn register(&self, url: &str) -> Result<bool> {
        validate_url(url)?;

        let added = self
            .coordinator
            .store()
            .append(RegistryEntry::new(url))
            .await?;
        if added {
            tracing::info!("✅ Registered {}", url);
        } else {
            tracing::info!("{} is already registered", url);
        }
        Ok(added)
    }

    /// Runs one refresh cycle and returns the updated registry.
    pub async fn refresh(&self) -> Result<Vec<RegistryEntry>> {
        Ok(self.coordinator.refresh().await?.entries)
    }

    pub async fn measure(&self) -> Result<Vec<MeasureRow>> {
        let entries = self.refresh().await?;
        Ok(measure_rows(&entries))
    }

    pub async fn race(&self) -> Result<Vec<RaceRow>> {
        let entries = self.refresh().await?;
        Ok(race_rows(&entries))
    }
}
