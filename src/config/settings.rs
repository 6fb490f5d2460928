use crate::config::toml_config::TomlConfig;
use crate::core::profile::SiteProfile;
use crate::domain::model::Registrar;
use crate::utils::error::{CompareError, Result};
use crate::utils::validation::{validate_non_empty_string, Validate};
use std::collections::HashSet;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_DIAGNOSTICS_DIR: &str = "./diagnostics";

/// 合併 TOML 與命令列之後，服務實際使用的設定
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub host: String,
    pub port: u16,
    pub profiles: Vec<SiteProfile>,
    pub chrome_executable: Option<PathBuf>,
    pub headful: bool,
    pub diagnostics_dir: Option<PathBuf>,
    pub monitor: bool,
    pub json_logs: bool,
}

impl ServiceSettings {
    pub fn from_toml(toml: &TomlConfig) -> Result<Self> {
        let diagnostics_dir = if toml.diagnostics_enabled() {
            Some(PathBuf::from(
                toml.diagnostics_dir().unwrap_or(DEFAULT_DIAGNOSTICS_DIR),
            ))
        } else {
            None
        };

        Ok(Self {
            host: toml.host().unwrap_or(DEFAULT_HOST).to_string(),
            port: toml.port().unwrap_or(DEFAULT_PORT),
            profiles: toml.resolve_profiles()?,
            chrome_executable: toml.chrome_executable().map(PathBuf::from),
            headful: toml.headful(),
            diagnostics_dir,
            monitor: toml.monitoring_enabled(),
            json_logs: toml.json_logs(),
        })
    }

    #[cfg(feature = "cli")]
    pub fn merge(cli: &crate::config::CliConfig, toml: &TomlConfig) -> Result<Self> {
        let mut settings = Self::from_toml(toml)?;

        if let Some(host) = &cli.host {
            settings.host = host.clone();
        }
        if let Some(port) = cli.port {
            settings.port = port;
        }
        if !cli.sources.is_empty() {
            settings.restrict_sources(&cli.sources)?;
        }
        settings.headful |= cli.headful;
        settings.monitor |= cli.monitor;
        settings.json_logs |= cli.json_logs;

        if cli.no_diagnostics {
            settings.diagnostics_dir = None;
        } else if let Some(dir) = &cli.diagnostics_dir {
            settings.diagnostics_dir = Some(dir.clone());
        }

        Ok(settings)
    }

    /// 只啟用清單中的註冊商，其餘停用
    pub fn restrict_sources(&mut self, names: &[String]) -> Result<()> {
        let wanted = names
            .iter()
            .map(|name| name.parse::<Registrar>())
            .collect::<Result<HashSet<_>>>()?;

        for profile in &mut self.profiles {
            profile.enabled = wanted.contains(&profile.registrar);
        }
        Ok(())
    }

    pub fn enabled_profiles(&self) -> impl Iterator<Item = &SiteProfile> {
        self.profiles.iter().filter(|p| p.enabled)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| CompareError::InvalidConfigValueError {
                field: "server.host".to_string(),
                value: self.host.clone(),
                reason: "Host did not resolve to any address".to_string(),
            })
    }
}

impl Validate for ServiceSettings {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("server.host", &self.host)?;

        if self.port == 0 {
            return Err(CompareError::InvalidConfigValueError {
                field: "server.port".to_string(),
                value: self.port.to_string(),
                reason: "Port must be between 1 and 65535".to_string(),
            });
        }

        if self.enabled_profiles().next().is_none() {
            return Err(CompareError::ConfigError {
                message: "At least one registrar must be enabled".to_string(),
            });
        }

        for profile in self.enabled_profiles() {
            profile.validate()?;
        }

        Ok(())
    }
}
