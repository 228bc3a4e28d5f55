use crate::domain::model::RegistryEntry;
use crate::domain::ports::{ConfigProvider, RegistryStore};
use crate::utils::error::{MsrError, Result};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Registry persisted as one space-delimited line per entry:
/// `url content_bytes load_time_seconds expires_at`.
#[derive(Debug, Clone)]
pub struct FileRegistry {
    path: PathBuf,
}

impl FileRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self::new(config.registry_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_contents(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(MsrError::IoError(e)),
        }
    }

    fn ensure_parent_dir(&self) -> Result<&Path> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;
        Ok(parent)
    }
}

pub fn parse_line(line: &str, line_number: usize) -> Result<RegistryEntry> {
    let malformed = |reason: String| MsrError::MalformedLine {
        line_number,
        reason,
    };

    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 4 {
        return Err(malformed(format!("expected 4 fields, found {}", fields.len())));
    }

    let content_bytes = fields[1]
        .parse::<u64>()
        .map_err(|e| malformed(format!("content bytes '{}': {}", fields[1], e)))?;
    let load_time_seconds = parse_float(fields[2])
        .map_err(|reason| malformed(format!("load time '{}': {}", fields[2], reason)))?;
    if load_time_seconds < 0.0 {
        return Err(malformed(format!("load time '{}' is negative", fields[2])));
    }
    let expires_at = parse_float(fields[3])
        .map_err(|reason| malformed(format!("expiry '{}': {}", fields[3], reason)))?;

    Ok(RegistryEntry {
        url: fields[0].to_string(),
        content_bytes,
        load_time_seconds,
        expires_at,
    })
}

fn parse_float(field: &str) -> std::result::Result<f64, String> {
    let value = field.parse::<f64>().map_err(|e| e.to_string())?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err("not a finite number".to_string())
    }
}

/// `f64` Display never uses exponent notation, so lines stay decimal.
pub fn format_line(entry: &RegistryEntry) -> String {
    format!(
        "{} {} {} {}\n",
        entry.url, entry.content_bytes, entry.load_time_seconds, entry.expires_at
    )
}

/// Parses a whole registry, skipping blank, malformed and duplicate lines.
/// Malformed lines stay on disk; see [`unparsed_lines`].
pub fn parse_registry(contents: &str) -> Vec<RegistryEntry> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for (index, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line, index + 1) {
            Ok(entry) => {
                if seen.insert(entry.url.clone()) {
                    entries.push(entry);
                } else {
                    tracing::warn!("Skipping duplicate registry entry for {}", entry.url);
                }
            }
            Err(e) => tracing::warn!("⚠️ Ignoring registry line: {}", e),
        }
    }

    entries
}

/// Non-blank lines that fail to parse, verbatim and in file order.
pub fn unparsed_lines(contents: &str) -> Vec<&str> {
    contents
        .lines()
        .enumerate()
        .filter(|(index, line)| !line.trim().is_empty() && parse_line(line, index + 1).is_err())
        .map(|(_, line)| line)
        .collect()
}

impl RegistryStore for FileRegistry {
    async fn load(&self) -> Result<Vec<RegistryEntry>> {
        let contents = self
            .read_contents()?
            .ok_or_else(|| MsrError::RegistryMissing {
                path: self.path.display().to_string(),
            })?;

        let entries = parse_registry(&contents);
        tracing::debug!(
            "Loaded {} registry entries from {}",
            entries.len(),
            self.path.display()
        );
        Ok(entries)
    }

    /// Rewrites the registry with `entries`. Lines of the current file that
    /// fail to parse are carried over unchanged after them.
    async fn save(&self, entries: &[RegistryEntry]) -> Result<()> {
        let dir = self.ensure_parent_dir()?;
        let previous = self.read_contents()?.unwrap_or_default();
        let carried = unparsed_lines(&previous);
        if !carried.is_empty() {
            tracing::warn!(
                "Keeping {} unparsable registry line(s) in {}",
                carried.len(),
                self.path.display()
            );
        }

        // 先寫入同目錄的暫存檔，再 rename 覆蓋，讀取端不會看到半寫入的檔案
        let mut temp = NamedTempFile::new_in(dir)?;
        for entry in entries {
            temp.write_all(format_line(entry).as_bytes())?;
        }
        for line in carried {
            temp.write_all(line.as_bytes())?;
            temp.write_all(b"\n")?;
        }
        temp.flush()?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path)?;

        tracing::debug!(
            "Saved {} registry entries to {}",
            entries.len(),
            self.path.display()
        );
        Ok(())
    }

    async fn append(&self, entry: RegistryEntry) -> Result<bool> {
        self.ensure_parent_dir()?;

        let contents = self.read_contents()?.unwrap_or_default();
        if parse_registry(&contents).iter().any(|e| e.url == entry.url) {
            return Ok(false);
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        if !contents.is_empty() && !contents.ends_with('\n') {
            file.write_all(b"\n")?;
        }
        file.write_all(format_line(&entry).as_bytes())?;
        file.flush()?;

        tracing::debug!("Appended {} to {}", entry.url, self.path.display());
        Ok(true)
    }
}
