pub mod cache_control;
pub mod engine;
pub mod fetch;
pub mod refresh;
pub mod report;

pub use crate::domain::model::{EntryOutcome, FetchOutcome, RefreshSummary, RegistryEntry};
pub use crate::domain::ports::{ConfigProvider, Fetcher, RegistryStore};
pub use crate::utils::error::Result;
