use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

const APP_DIR: &str = "pledgeline";
const CONFIG_FILENAME: &str = "config.toml";

pub const DEFAULT_PAIDS_DISPOSITION: &str = "Paid";
pub const DEFAULT_PAIDS_AGENT: &str = "HOUSE";
pub const DEFAULT_IMPORT_AGENT: &str = "IMPORT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub paids: PaidsConfig,
    pub import: ImportConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaidsConfig {
    /// Name of the disposition recorded for each paid phone number.
    pub disposition: String,
    /// Agent credited when no open sale is found.
    pub default_agent: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    pub strip_phone_punctuation: bool,
    pub default_agent: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            paids: PaidsConfig {
                disposition: DEFAULT_PAIDS_DISPOSITION.to_string(),
                default_agent: DEFAULT_PAIDS_AGENT.to_string(),
            },
            import: ImportConfig {
                strip_phone_punctuation: true,
                default_agent: DEFAULT_IMPORT_AGENT.to_string(),
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing home directory")]
    MissingHomeDir,
    #[error("invalid config path: {0}")]
    InvalidConfigPath(PathBuf),
    #[error("config file not found: {0}")]
    MissingConfigFile(PathBuf),
    #[error("invalid config value for {field}: value cannot be empty")]
    EmptyValue { field: &'static str },
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    paids: Option<PaidsFile>,
    import: Option<ImportFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PaidsFile {
    disposition: Option<String>,
    default_agent: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ImportFile {
    strip_phone_punctuation: Option<bool>,
    default_agent: Option<String>,
}

pub fn load(config_path: Option<PathBuf>) -> Result<AppConfig> {
    let required = config_path.is_some();
    let path = match resolve_config_path(config_path) {
        Ok(path) => path,
        Err(ConfigError::MissingHomeDir) if !required => return Ok(AppConfig::default()),
        Err(ConfigError::InvalidConfigPath(_)) if !required => return Ok(AppConfig::default()),
        Err(err) => return Err(err),
    };
    match load_at_path(&path, required)? {
        Some(config) => Ok(config),
        None => Ok(AppConfig::default()),
    }
}

pub fn resolve_config_path(custom: Option<PathBuf>) -> Result<PathBuf> {
    match custom {
        Some(path) => {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidConfigPath(path));
            }
            Ok(path)
        }
        None => {
            let base = if let Some(dir) = env::var_os("XDG_CONFIG_HOME") {
                let path = PathBuf::from(dir);
                if path.as_os_str().is_empty() {
                    return Err(ConfigError::InvalidConfigPath(path));
                }
                path
            } else {
                let home = dirs::home_dir().ok_or(ConfigError::MissingHomeDir)?;
                home.join(".config")
            };
            Ok(base.join(APP_DIR).join(CONFIG_FILENAME))
        }
    }
}

fn load_at_path(path: &Path, required: bool) -> Result<Option<AppConfig>> {
    if !path.exists() {
        if required {
            return Err(ConfigError::MissingConfigFile(path.to_path_buf()));
        }
        return Ok(None);
    }

    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: ConfigFile = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(merge_config(parsed)?))
}

fn merge_config(parsed: ConfigFile) -> Result<AppConfig> {
    let mut config = AppConfig::default();

    if let Some(paids) = parsed.paids {
        if let Some(disposition) = paids.disposition {
            config.paids.disposition = non_empty(disposition, "paids.disposition")?;
        }
        if let Some(agent) = paids.default_agent {
            config.paids.default_agent = non_empty(agent, "paids.default_agent")?;
        }
    }

    if let Some(import) = parsed.import {
        if let Some(strip) = import.strip_phone_punctuation {
            config.import.strip_phone_punctuation = strip;
        }
        if let Some(agent) = import.default_agent {
            config.import.default_agent = non_empty(agent, "import.default_agent")?;
        }
    }

    Ok(config)
}

fn non_empty(value: String, field: &'static str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyValue { field });
    }
    Ok(trimmed.to_string())
}
