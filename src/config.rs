use crate::error::{Error, Result};
use crate::similarity::DistParams;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub scoring: DistParams,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    /// How many ranked records `rank` prints
    pub max_results: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    // trace | debug | info | warn | error
    pub level: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { max_results: 10 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load `~/.shctx/config.toml`, writing the defaults there on first use.
    pub fn new() -> Result<Self> {
        let config_path = Self::get_config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Config::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(config_dir) = path.parent() {
            fs::create_dir_all(config_dir)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        for (dim, weight) in self.scoring.weights() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "scoring weight for {dim:?} must be a nonnegative number, got {weight}"
                )));
            }
        }
        Ok(())
    }

    fn get_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".shctx")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_round_trip_through_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::default();
        config.save_to(&path)?;
        assert_eq!(Config::load_from(&path)?, config);
        assert_eq!(config.scoring, DistParams::uniform(1.0));
        assert_eq!(config.display.max_results, 10);
        Ok(())
    }

    #[test]
    fn test_partial_file_uses_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(&path, "[scoring]\ntime = 0.25\ngit_dir = 3.0\n")?;

        let config = Config::load_from(&path)?;
        assert_eq!(config.scoring.time, 0.25);
        assert_eq!(config.scoring.git_dir, 3.0);
        assert_eq!(config.scoring.pwd, 1.0);
        assert_eq!(config.logging.level, "info");
        Ok(())
    }

    #[test]
    fn test_negative_weight_rejected() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(&path, "[scoring]\nshell = -1.0\n")?;

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        Ok(())
    }
}
