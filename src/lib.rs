pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{Cli, Command};
pub use config::{Settings, SettingsOverrides};

pub use adapters::{FileRegistry, HttpFetcher};
pub use crate::core::{engine::MsrEngine, refresh::RefreshCoordinator};
pub use domain::model::RegistryEntry;
pub use utils::error::{MsrError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
