use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One tracked URL and its last observed measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub url: String,
    pub content_bytes: u64,
    pub load_time_seconds: f64,
    /// Unix timestamp in seconds.
    pub expires_at: f64,
}

impl RegistryEntry {
    /// A never-fetched entry; `expires_at == 0` forces the first refresh.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content_bytes: 0,
            load_time_seconds: 0.0,
            expires_at: 0.0,
        }
    }

    pub fn is_stale(&self, now: f64) -> bool {
        self.expires_at < now
    }
}

/// What a successful GET observed.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub content_bytes: u64,
    pub elapsed: Duration,
    /// `max-age` in seconds, when the response carried a usable one.
    pub max_age: Option<f64>,
}

/// Result of running one entry through a fetch worker.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryOutcome {
    Fresh(RegistryEntry),
    Refreshed(RegistryEntry),
    /// The previous values are kept; the string describes the failure.
    Failed(RegistryEntry, String),
}

impl EntryOutcome {
    pub fn into_entry(self) -> RegistryEntry {
        match self {
            EntryOutcome::Fresh(entry)
            | EntryOutcome::Refreshed(entry)
            | EntryOutcome::Failed(entry, _) => entry,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshSummary {
    pub entries: Vec<RegistryEntry>,
    pub fresh: usize,
    pub refreshed: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasureRow {
    pub url: String,
    pub content_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceRow {
    pub domain: String,
    pub average_load_time: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entry_is_stale() {
        let entry = RegistryEntry::new("https://example.com");
        assert_eq!(entry.content_bytes, 0);
        assert!(entry.is_stale(1.0));
    }

    #[test]
    fn test_future_expiry_is_fresh() {
        let entry = RegistryEntry {
            expires_at: 200.0,
            ..RegistryEntry::new("https://example.com")
        };
        assert!(!entry.is_stale(100.0));
        assert!(entry.is_stale(200.5));
    }
}
