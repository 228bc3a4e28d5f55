use crate::domain::model::{FetchOutcome, RegistryEntry};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

pub trait RegistryStore: Send + Sync {
    fn load(&self) -> impl std::future::Future<Output = Result<Vec<RegistryEntry>>> + Send;
    fn save(&self, entries: &[RegistryEntry])
        -> impl std::future::Future<Output = Result<()>> + Send;
    /// Returns `false` when the URL was already registered.
    fn append(&self, entry: RegistryEntry)
        -> impl std::future::Future<Output = Result<bool>> + Send;
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchOutcome>;
}

pub trait ConfigProvider: Send + Sync {
    fn registry_path(&self) -> PathBuf;
    fn concurrency(&self) -> usize;
    fn request_timeout(&self) -> Duration;
    fn user_agent(&self) -> &str;
}
