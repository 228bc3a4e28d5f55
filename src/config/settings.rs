use crate::domain::ports::ConfigProvider;
use crate::utils::error::{MsrError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_FILE_NAME: &str = "msr_registry.txt";
pub const DEFAULT_CONCURRENCY: usize = 8;
pub const DEFAULT_TIMEOUT_SECS: f64 = 30.0;
pub const MAX_TIMEOUT_SECS: f64 = 3600.0;

/// Process-wide settings. Built once at startup and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub file_name: String,
    pub concurrency: usize,
    pub request_timeout_secs: f64,
    pub user_agent: String,
}

/// On-disk TOML layout; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    pub registry: Option<RegistrySection>,
    pub fetch: Option<FetchSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrySection {
    pub data_dir: Option<PathBuf>,
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchSection {
    pub concurrency: Option<usize>,
    pub timeout_seconds: Option<f64>,
    pub user_agent: Option<String>,
}

/// Values given on the command line or through `MSR_*` variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsOverrides {
    pub data_dir: Option<PathBuf>,
    pub concurrency: Option<usize>,
    pub timeout_seconds: Option<f64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: Self::default_data_dir(),
            file_name: DEFAULT_FILE_NAME.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: format!("msr/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Settings {
    /// `$XDG_DATA_HOME/msr`, falling back to `~/.local/share/msr`.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("share")))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("msr")
    }

    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// 從 TOML 檔案載入配置
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<FileConfig> {
        let content =
            std::fs::read_to_string(&path).map_err(|e| MsrError::ConfigValidationError {
                field: "config".to_string(),
                message: format!("cannot read {}: {}", path.as_ref().display(), e),
            })?;
        Self::parse_toml(&content)
    }

    pub fn parse_toml(content: &str) -> Result<FileConfig> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| MsrError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${MSR_HOME})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| MsrError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Layers defaults, then the config file, then overrides, and validates the result.
    pub fn resolve(file: Option<FileConfig>, overrides: SettingsOverrides) -> Result<Self> {
        let mut settings = Self::default();

        if let Some(file) = file {
            if let Some(registry) = file.registry {
                if let Some(data_dir) = registry.data_dir {
                    settings.data_dir = data_dir;
                }
                if let Some(file_name) = registry.file_name {
                    settings.file_name = file_name;
                }
            }
            if let Some(fetch) = file.fetch {
                if let Some(concurrency) = fetch.concurrency {
                    settings.concurrency = concurrency;
                }
                if let Some(timeout) = fetch.timeout_seconds {
                    settings.request_timeout_secs = timeout;
                }
                if let Some(user_agent) = fetch.user_agent {
                    settings.user_agent = user_agent;
                }
            }
        }

        if let Some(data_dir) = overrides.data_dir {
            settings.data_dir = data_dir;
        }
        if let Some(concurrency) = overrides.concurrency {
            settings.concurrency = concurrency;
        }
        if let Some(timeout) = overrides.timeout_seconds {
            settings.request_timeout_secs = timeout;
        }

        settings.validate()?;
        Ok(settings)
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(MsrError::InvalidConfigValueError {
                field: "registry.data_dir".to_string(),
                value: String::new(),
                reason: "Path cannot be empty".to_string(),
            });
        }
        validation::validate_file_name("registry.file_name", &self.file_name)?;
        validation::validate_positive_number("fetch.concurrency", self.concurrency, 1)?;
        validation::validate_range(
            "fetch.timeout_seconds",
            self.request_timeout_secs,
            0.001,
            MAX_TIMEOUT_SECS,
        )?;
        validation::validate_non_empty_string("fetch.user_agent", &self.user_agent)?;
        Ok(())
    }
}

impl ConfigProvider for Settings {
    fn registry_path(&self) -> PathBuf {
        self.data_dir.join(&self.file_name)
    }

    fn concurrency(&self) -> usize {
        self.concurrency
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.request_timeout_secs)
    }

    fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let settings = Settings::with_data_dir("/tmp/msr-test");
        assert_eq!(
            settings.registry_path(),
            PathBuf::from("/tmp/msr-test/msr_registry.txt")
        );
        assert_eq!(settings.concurrency(), DEFAULT_CONCURRENCY);
        assert_eq!(settings.request_timeout(), Duration::from_secs(30));
        assert!(settings.user_agent().starts_with("msr/"));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_parse_toml_config() {
        let toml_content = r#"
[registry]
data_dir = "/var/lib/msr"
file_name = "urls.txt"

[fetch]
concurrency = 3
timeout_seconds = 2.5
"#;

        let file = Settings::parse_toml(toml_content).unwrap();
        let settings = Settings::resolve(Some(file), SettingsOverrides::default()).unwrap();

        assert_eq!(settings.registry_path(), PathBuf::from("/var/lib/msr/urls.txt"));
        assert_eq!(settings.concurrency, 3);
        assert_eq!(settings.request_timeout(), Duration::from_millis(2500));
    }

    #[test]
    fn test_overrides_win_over_file() {
        let file = Settings::parse_toml("[fetch]\nconcurrency = 3\n").unwrap();
        let overrides = SettingsOverrides {
            data_dir: Some(PathBuf::from("/srv/msr")),
            concurrency: Some(12),
            timeout_seconds: None,
        };

        let settings = Settings::resolve(Some(file), overrides).unwrap();
        assert_eq!(settings.concurrency, 12);
        assert_eq!(settings.data_dir, PathBuf::from("/srv/msr"));
        assert_eq!(settings.request_timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("MSR_TEST_DATA_DIR", "/opt/msr-data");

        let file =
            Settings::parse_toml("[registry]\ndata_dir = \"${MSR_TEST_DATA_DIR}\"\n").unwrap();
        let registry = file.registry.unwrap();
        assert_eq!(registry.data_dir, Some(PathBuf::from("/opt/msr-data")));

        std::env::remove_var("MSR_TEST_DATA_DIR");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let zero_workers = SettingsOverrides {
            concurrency: Some(0),
            ..SettingsOverrides::default()
        };
        assert!(Settings::resolve(None, zero_workers).is_err());

        let file = Settings::parse_toml("[registry]\nfile_name = \"a/b.txt\"\n").unwrap();
        assert!(Settings::resolve(Some(file), SettingsOverrides::default()).is_err());

        let zero_timeout = SettingsOverrides {
            timeout_seconds: Some(0.0),
            ..SettingsOverrides::default()
        };
        let err = Settings::resolve(None, zero_timeout).unwrap_err();
        assert!(matches!(err, MsrError::InvalidConfigValueError { .. }));
    }

    #[test]
    fn test_malformed_toml() {
        let err = Settings::parse_toml("[fetch\nconcurrency = ").unwrap_err();
        assert!(matches!(err, MsrError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_unreadable_config_file_is_a_config_error() {
        let dir = tempfile::TempDir::new().unwrap();

        let err = Settings::load_file(dir.path().join("missing.toml")).unwrap_err();

        assert!(matches!(
            err,
            MsrError::ConfigValidationError { ref field, .. } if field == "config"
        ));
        assert_eq!(err.exit_code(), crate::utils::error::exit_code::CONFIG);
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[fetch]\nuser_agent = \"custom-agent\"\n")
            .unwrap();

        let file = Settings::load_file(temp_file.path()).unwrap();
        let settings = Settings::resolve(Some(file), SettingsOverrides::default()).unwrap();
        assert_eq!(settings.user_agent, "custom-agent");
    }
}
