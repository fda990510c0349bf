//! Configuration file. Read-only: nothing is ever written back.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, Result},
    mirror::Mirror,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub pip: PipConfig,
    pub logging: LoggingConfig,
}

/// Paths used when none are given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub requirements: Option<PathBuf>,
    pub python: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipConfig {
    /// Mirror name or index URL
    pub mirror: Option<String>,
    /// Additional mirrors offered next to the built-in ones
    pub extra_mirrors: Vec<Mirror>,
    /// Wait after a successful command before refreshing, so pip has
    /// finished writing metadata
    pub refresh_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for PipConfig {
    fn default() -> Self {
        Self {
            mirror: None,
            extra_mirrors: vec![],
            refresh_delay_ms: 1000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Config {
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| AppError::Config("Could not find config directory".into()))?;
        Ok(config_dir.join("reqman").join("config.toml"))
    }

    /// An explicit path must exist; the default location is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) if !path.is_file() => {
                return Err(AppError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            Some(path) => path.to_path_buf(),
            None => match Self::config_path() {
                Ok(path) if path.is_file() => path,
                _ => return Ok(Self::default()),
            },
        };
        let content = std::fs::read_to_string(&path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        for m in &config.pip.extra_mirrors {
            if m.url.is_none() {
                return Err(AppError::Config(format!("Mirror '{}' has no url", m.name)));
            }
        }
        Ok(config)
    }

    pub fn log_file(&self) -> PathBuf {
        self.logging.file.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("reqman")
                .join("reqman.log")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.pip.refresh_delay_ms, 1000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_full_config() {
        let config = Config::parse(
            r#"
[paths]
requirements = "/work/requirements.txt"
python = "/envs/comfy"

[pip]
mirror = "tsinghua"
refresh_delay_ms = 250
extra_mirrors = [{ name = "corp", url = "https://pypi.corp/simple" }]

[logging]
level = "debug"
"#,
        )
        .unwrap();
        assert_eq!(
            config.paths.requirements,
            Some(PathBuf::from("/work/requirements.txt"))
        );
        assert_eq!(config.pip.mirror.as_deref(), Some("tsinghua"));
        assert_eq!(config.pip.refresh_delay_ms, 250);
        assert_eq!(config.pip.extra_mirrors[0].name, "corp");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_bad_config() {
        assert!(matches!(
            Config::parse("[pip]\nrefresh_delay_ms = \"soon\""),
            Err(AppError::Toml(_))
        ));
        assert!(matches!(
            Config::parse("[pip]\nextra_mirrors = [{ name = \"x\" }]"),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_load_explicit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        assert!(Config::load(Some(&path)).is_err());
        std::fs::write(&path, "[paths]\npython = \"/py\"\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.paths.python, Some(PathBuf::from("/py")));
    }
}
