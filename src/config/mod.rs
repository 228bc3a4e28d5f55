#[cfg(feature = "cli")]
pub mod cli;
pub mod settings;

#[cfg(feature = "cli")]
pub use cli::{Cli, Command};
pub use settings::{Settings, SettingsOverrides};
