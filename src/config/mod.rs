pub mod settings;
pub mod toml_config;

pub use settings::ServiceSettings;

#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::Validate;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use toml_config::TomlConfig;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "domain-compare")]
#[command(about = "Compare live domain registration prices across registrars")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "DOMAIN_COMPARE_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Registrars to query (overrides the enabled flags in the config file)
    #[arg(long, value_delimiter = ',')]
    pub sources: Vec<String>,

    /// Launch visible browser windows for every registrar
    #[arg(long)]
    pub headful: bool,

    /// Directory for screenshots and page dumps when a price element is missing
    #[arg(long)]
    pub diagnostics_dir: Option<PathBuf>,

    #[arg(long, help = "Disable diagnostics snapshots")]
    pub no_diagnostics: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log process CPU/memory after each comparison")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn load_toml(&self) -> Result<TomlConfig> {
        let Some(path) = &self.config else {
            return Ok(TomlConfig::default());
        };

        let toml = TomlConfig::from_file(path)?;
        toml.validate()?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(toml)
    }

    /// 命令列參數優先於 TOML 設定
    pub fn resolve(&self) -> Result<ServiceSettings> {
        let toml = self.load_toml()?;
        ServiceSettings::merge(self, &toml)
    }
}
