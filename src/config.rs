//! Config (C11): TOML-loaded bot configuration.

use std::path::Path;

use serde::Deserialize;

use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub bot: BotConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    pub owners: Vec<String>,
    #[serde(default = "default_state_path")]
    pub state_path: String,
    #[serde(default = "default_claims_path")]
    pub claims_path: String,
}

fn default_state_path() -> String {
    "state.json".into()
}
fn default_claims_path() -> String {
    "claims.json".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    pub fn load(path: &Path) -> CoreResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CoreError::NotFound(format!("cannot read config {}: {e}", path.display())))?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| CoreError::InvalidOrder(format!("malformed config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> CoreResult<()> {
        if self.bot.owners.is_empty() {
            return Err(CoreError::InvalidOrder("config must name at least one owner".into()));
        }
        Ok(())
    }

    pub fn is_owner(&self, account_id: &str) -> bool {
        self.bot.owners.iter().any(|o| o == account_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_parses_minimal_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[bot]\nowners = [\"alice\"]\n").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.bot.state_path, "state.json");
        assert_eq!(config.logging.level, "info");
        assert!(config.is_owner("alice"));
        assert!(!config.is_owner("bob"));
    }

    #[test]
    fn load_rejects_no_owners() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[bot]\nowners = []\n").unwrap();
        assert!(Config::load(file.path()).is_err());
    }
}
