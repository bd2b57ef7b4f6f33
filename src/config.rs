use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default)]
    pub sources: SourcesConfig,
}

/// Paths and tools the collectors read from. Defaults match a stock Linux host.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourcesConfig {
    #[serde(default = "default_hostname_path")]
    pub hostname_path: PathBuf,
    #[serde(default = "default_proc_root")]
    pub proc_root: PathBuf,
    #[serde(default = "default_thermal_root")]
    pub thermal_root: PathBuf,
    #[serde(default = "default_embedded_gpu_load_path")]
    pub embedded_gpu_load_path: PathBuf,
    #[serde(default = "default_disk_path")]
    pub disk_path: PathBuf,
    #[serde(default = "default_gpu_tool")]
    pub gpu_tool: String,
    #[serde(default = "default_gpu_tool_timeout_ms")]
    pub gpu_tool_timeout_ms: u64,
    #[serde(default = "default_boot_history_tool")]
    pub boot_history_tool: String,
    #[serde(default = "default_boot_history_timeout_ms")]
    pub boot_history_timeout_ms: u64,
    #[serde(default = "default_cpu_sample_interval_ms")]
    pub cpu_sample_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            sources: SourcesConfig::default(),
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            hostname_path: default_hostname_path(),
            proc_root: default_proc_root(),
            thermal_root: default_thermal_root(),
            embedded_gpu_load_path: default_embedded_gpu_load_path(),
            disk_path: default_disk_path(),
            gpu_tool: default_gpu_tool(),
            gpu_tool_timeout_ms: default_gpu_tool_timeout_ms(),
            boot_history_tool: default_boot_history_tool(),
            boot_history_timeout_ms: default_boot_history_timeout_ms(),
            cpu_sample_interval_ms: default_cpu_sample_interval_ms(),
        }
    }
}

impl SourcesConfig {
    pub fn gpu_tool_timeout(&self) -> Duration {
        Duration::from_millis(self.gpu_tool_timeout_ms)
    }

    pub fn boot_history_timeout(&self) -> Duration {
        Duration::from_millis(self.boot_history_timeout_ms)
    }

    pub fn cpu_sample_interval(&self) -> Duration {
        Duration::from_millis(self.cpu_sample_interval_ms)
    }

    pub fn proc_file(&self, name: &str) -> PathBuf {
        self.proc_root.join(name)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("не удалось прочитать файл конфигурации {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("не удалось разобрать YAML в {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
    #[error("ошибка валидации конфигурации: {0}")]
    Validation(String),
}

impl Config {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let path_display = path_ref.display().to_string();
        let text = fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
            path: path_display.clone(),
            source,
        })?;

        let cfg: Config = serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path_display,
            source,
        })?;

        cfg.validate()?;
        Ok(cfg)
    }

    /// Replaces the port of `listen`, keeping the bind address.
    pub fn with_port(mut self, port: u16) -> Result<Self, ConfigError> {
        let mut addr = self.listen_addr()?;
        addr.set_port(port);
        self.listen = addr.to_string();
        Ok(self)
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        SocketAddr::from_str(self.listen.trim()).map_err(|_| {
            ConfigError::Validation(
                "поле listen должно быть корректным адресом host:port".to_string(),
            )
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen.trim().is_empty() {
            return Err(ConfigError::Validation(
                "поле listen обязательно".to_string(),
            ));
        }
        self.listen_addr()?;
        validate_sources(&self.sources)
    }

    pub fn example_yaml() -> &'static str {
        include_str!("../config.yaml.example")
    }
}

fn validate_sources(cfg: &SourcesConfig) -> Result<(), ConfigError> {
    if cfg.gpu_tool.trim().is_empty() {
        return Err(ConfigError::Validation(
            "sources.gpu_tool не должен быть пустым".to_string(),
        ));
    }
    if cfg.boot_history_tool.trim().is_empty() {
        return Err(ConfigError::Validation(
            "sources.boot_history_tool не должен быть пустым".to_string(),
        ));
    }
    if cfg.gpu_tool_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "sources.gpu_tool_timeout_ms должен быть > 0".to_string(),
        ));
    }
    if cfg.boot_history_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "sources.boot_history_timeout_ms должен быть > 0".to_string(),
        ));
    }
    if cfg.cpu_sample_interval_ms == 0 {
        return Err(ConfigError::Validation(
            "sources.cpu_sample_interval_ms должен быть > 0".to_string(),
        ));
    }
    Ok(())
}

fn default_listen() -> String {
    "0.0.0.0:9100".to_string()
}

fn default_hostname_path() -> PathBuf {
    PathBuf::from("/etc/hostname")
}

fn default_proc_root() -> PathBuf {
    PathBuf::from("/proc")
}

fn default_thermal_root() -> PathBuf {
    PathBuf::from("/sys/class/thermal")
}

fn default_embedded_gpu_load_path() -> PathBuf {
    PathBuf::from("/sys/devices/gpu.0/load")
}

fn default_disk_path() -> PathBuf {
    PathBuf::from("/")
}

fn default_gpu_tool() -> String {
    "nvidia-smi".to_string()
}

const fn default_gpu_tool_timeout_ms() -> u64 {
    3000
}

fn default_boot_history_tool() -> String {
    "last".to_string()
}

const fn default_boot_history_timeout_ms() -> u64 {
    5000
}

const fn default_cpu_sample_interval_ms() -> u64 {
    100
}
