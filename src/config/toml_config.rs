use crate::app::registrars;
use crate::core::profile::SiteProfile;
use crate::domain::model::Registrar;
use crate::utils::error::{CompareError, Result};
use crate::utils::validation::{validate_path, validate_url_template, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub server: Option<ServerConfig>,
    pub browser: Option<BrowserSettings>,
    pub diagnostics: Option<DiagnosticsConfig>,
    pub monitoring: Option<MonitoringConfig>,
    pub logging: Option<LoggingConfig>,
    /// 鍵名為註冊商名稱 (`namecheap`、`godaddy`、`register365`)
    pub sites: Option<BTreeMap<String, SiteOverride>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserSettings {
    pub executable: Option<String>,
    pub headful: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    pub enabled: bool,
    pub directory: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 以 JSON 格式輸出日誌
    pub json: Option<bool>,
}

/// 覆蓋內建站點設定，未指定的欄位沿用預設值
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteOverride {
    pub enabled: Option<bool>,
    pub headless: Option<bool>,
    pub entry_url: Option<String>,
    pub user_agent: Option<String>,
    pub navigation_timeout_secs: Option<u64>,
    pub input_timeout_secs: Option<u64>,
    pub results_timeout_secs: Option<u64>,
    pub settle_delay_ms: Option<u64>,
    pub poll_interval_ms: Option<u64>,
}

impl SiteOverride {
    pub fn apply(&self, profile: &mut SiteProfile) {
        if let Some(enabled) = self.enabled {
            profile.enabled = enabled;
        }
        if let Some(headless) = self.headless {
            profile.launch.headless = headless;
        }
        if let Some(entry_url) = &self.entry_url {
            profile.entry_url = entry_url.clone();
        }
        if let Some(user_agent) = &self.user_agent {
            profile.user_agent = Some(user_agent.clone());
        }
        if let Some(secs) = self.navigation_timeout_secs {
            profile.navigation_timeout = Duration::from_secs(secs);
        }
        if let (Some(secs), Some(search)) = (self.input_timeout_secs, profile.search.as_mut()) {
            search.input_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.results_timeout_secs {
            profile.results_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = self.settle_delay_ms {
            profile.settle_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = self.poll_interval_ms {
            profile.poll_interval = Duration::from_millis(ms);
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(CompareError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| CompareError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${CHROME_PATH})，未定義的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| CompareError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 內建站點設定套用 `[sites.*]` 覆蓋後的結果
    pub fn resolve_profiles(&self) -> Result<Vec<SiteProfile>> {
        let mut profiles = registrars::builtin_profiles();

        if let Some(sites) = &self.sites {
            for (key, site) in sites {
                let registrar: Registrar = key.parse().map_err(|_| CompareError::InvalidConfigValueError {
                    field: "sites".to_string(),
                    value: key.clone(),
                    reason: "Unknown registrar. Valid keys: namecheap, godaddy, register365".to_string(),
                })?;
                if let Some(profile) = profiles.iter_mut().find(|p| p.registrar == registrar) {
                    site.apply(profile);
                }
            }
        }

        Ok(profiles)
    }

    pub fn host(&self) -> Option<&str> {
        self.server.as_ref().and_then(|s| s.host.as_deref())
    }

    pub fn port(&self) -> Option<u16> {
        self.server.as_ref().and_then(|s| s.port)
    }

    pub fn chrome_executable(&self) -> Option<&str> {
        self.browser.as_ref().and_then(|b| b.executable.as_deref())
    }

    pub fn headful(&self) -> bool {
        self.browser.as_ref().and_then(|b| b.headful).unwrap_or(false)
    }

    pub fn diagnostics_enabled(&self) -> bool {
        self.diagnostics.as_ref().map(|d| d.enabled).unwrap_or(true)
    }

    pub fn diagnostics_dir(&self) -> Option<&str> {
        self.diagnostics.as_ref().and_then(|d| d.directory.as_deref())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|l| l.json)
            .unwrap_or(false)
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        if let Some(dir) = self.diagnostics_dir() {
            validate_path("diagnostics.directory", dir)?;
        }

        if let Some(executable) = self.chrome_executable() {
            validate_path("browser.executable", executable)?;
        }

        if self.port() == Some(0) {
            return Err(CompareError::InvalidConfigValueError {
                field: "server.port".to_string(),
                value: "0".to_string(),
                reason: "Port must be between 1 and 65535".to_string(),
            });
        }

        if let Some(sites) = &self.sites {
            for (key, site) in sites {
                if let Some(entry_url) = &site.entry_url {
                    validate_url_template(&format!("sites.{}.entry_url", key), entry_url)?;
                }
            }
        }

        for profile in self.resolve_profiles()? {
            profile.validate()?;
        }

        Ok(())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_builtin_profiles() {
        let config = TomlConfig::from_toml_str("").unwrap();
        let profiles = config.resolve_profiles().unwrap();

        assert_eq!(profiles.len(), 3);
        assert!(config.diagnostics_enabled());
        assert!(!config.monitoring_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[server]
host = "127.0.0.1"
port = 8080

[browser]
headful = true

[diagnostics]
enabled = false

[monitoring]
enabled = true

[logging]
json = true

[sites.godaddy]
enabled = true
headless = false
results_timeout_secs = 45

[sites.register365]
settle_delay_ms = 1500
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.host(), Some("127.0.0.1"));
        assert_eq!(config.port(), Some(8080));
        assert!(config.headful());
        assert!(!config.diagnostics_enabled());
        assert!(config.monitoring_enabled());
        assert!(config.json_logs());

        let profiles = config.resolve_profiles().unwrap();
        let godaddy = profiles.iter().find(|p| p.registrar == Registrar::GoDaddy).unwrap();
        assert!(godaddy.enabled);
        assert!(!godaddy.launch.headless);
        assert_eq!(godaddy.results_timeout, Duration::from_secs(45));

        let register365 = profiles
            .iter()
            .find(|p| p.registrar == Registrar::Register365)
            .unwrap();
        assert_eq!(register365.settle_delay, Duration::from_millis(1500));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TEST_DOMAIN_COMPARE_CHROME", "/opt/chrome/chrome");

        let toml_content = r#"
[browser]
executable = "${TEST_DOMAIN_COMPARE_CHROME}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.chrome_executable(), Some("/opt/chrome/chrome"));

        std::env::remove_var("TEST_DOMAIN_COMPARE_CHROME");
    }

    #[test]
    fn test_unknown_site_is_rejected() {
        let toml_content = r#"
[sites.bluehost]
enabled = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.resolve_profiles().is_err());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_entry_url_fails_validation() {
        let toml_content = r#"
[sites.namecheap]
entry_url = "ftp://namecheap.example"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_logs_default_off() {
        let config = TomlConfig::from_toml_str("[monitoring]\nenabled = true\n").unwrap();
        assert!(config.monitoring_enabled());
        assert!(!config.json_logs());
    }

    #[test]
    fn test_zero_poll_interval_fails_validation() {
        let toml_content = r#"
[sites.namecheap]
poll_interval_ms = 0
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[server]
port = 5050
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.port(), Some(5050));
    }
}
