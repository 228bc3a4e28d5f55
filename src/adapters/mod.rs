// Adapters layer: concrete implementations of the domain ports.

pub mod file_registry;
pub mod http_fetcher;

pub use file_registry::FileRegistry;
pub use http_fetcher::HttpFetcher;
