//! Configuration types for the blacklist agent.

use crate::params::{LOG_DISABLED, LOG_ENABLED, SECURITY_LOG_KEY};
use crate::record::SubjectType;
use serde::{Deserialize, Serialize};

/// Root configuration for the blacklist agent.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Global settings.
    #[serde(default)]
    pub settings: Settings,

    /// Runtime parameters seeded into the fast store at startup.
    #[serde(default)]
    pub params: Params,
}

/// Global settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    /// Rebuild the blacklist cache from the record store at startup.
    #[serde(default = "default_true")]
    pub warm_up_on_start: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            warm_up_on_start: true,
        }
    }
}

/// Initial runtime parameters.
///
/// Absent values are not seeded, so a value already held by the fast store
/// is left as is.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Params {
    /// Strike threshold for addresses (0 disables).
    #[serde(default)]
    pub address_security: Option<i64>,

    /// Strike threshold for accounts (0 disables).
    #[serde(default)]
    pub account_security: Option<i64>,

    /// Write audit log entries.
    #[serde(default)]
    pub security_log: Option<bool>,
}

impl Params {
    /// Configured threshold for a subject type.
    pub fn threshold(&self, subject_type: SubjectType) -> Option<i64> {
        match subject_type {
            SubjectType::Address => self.address_security,
            SubjectType::Account => self.account_security,
        }
    }

    /// Key/value pairs to write into the `param` namespace.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut entries: Vec<(String, String)> = SubjectType::ALL
            .iter()
            .filter_map(|t| {
                self.threshold(*t)
                    .map(|limit| (t.threshold_key().to_string(), limit.to_string()))
            })
            .collect();

        if let Some(enabled) = self.security_log {
            let toggle = if enabled { LOG_ENABLED } else { LOG_DISABLED };
            entries.push((SECURITY_LOG_KEY.to_string(), toggle.to_string()));
        }
        entries
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let expanded = expand_env_vars(&content);
        let config: Config = serde_yaml::from_str(&expanded)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        for subject_type in SubjectType::ALL {
            if let Some(limit) = self.params.threshold(subject_type) {
                if limit < 0 {
                    anyhow::bail!(
                        "{} ({}) must not be negative",
                        subject_type.threshold_key(),
                        limit
                    );
                }
                if limit > i64::from(i32::MAX) {
                    anyhow::bail!(
                        "{} ({}) must be at most {}",
                        subject_type.threshold_key(),
                        limit,
                        i32::MAX
                    );
                }
            }
        }

        Ok(())
    }

    /// Generate example configuration YAML.
    pub fn example() -> String {
        r#"# Blacklist Agent Configuration

settings:
  warm_up_on_start: true       # Rebuild the blacklist cache at startup

# Runtime parameters, written to the fast store at startup.
# The fast store stays authoritative afterwards and is re-read on every signal.
params:
  address_security: 5          # Blacklist an address on its 6th consecutive signal
  account_security: ${ACCOUNT_SECURITY}    # From the environment; empty or 0 disables
  security_log: true           # Write audit log entries
"#
        .to_string()
    }
}

/// Expand environment variables in the format ${VAR_NAME}.
fn expand_env_vars(content: &str) -> String {
    let mut result = content.to_string();
    let re = match regex::Regex::new(r"\$\{([^}]+)\}") {
        Ok(re) => re,
        Err(_) => return result,
    };

    for cap in re.captures_iter(content) {
        let var_name = &cap[1];
        let var_value = std::env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.settings.warm_up_on_start);
        assert!(config.params.address_security.is_none());
        assert!(config.params.account_security.is_none());
        assert!(config.params.security_log.is_none());
    }

    #[test]
    fn test_expand_env_vars() {
        std::env::set_var("BLACKLIST_TEST_LIMIT", "4");
        let input = "address_security: ${BLACKLIST_TEST_LIMIT}";
        let result = expand_env_vars(input);
        assert_eq!(result, "address_security: 4");
        std::env::remove_var("BLACKLIST_TEST_LIMIT");
    }

    #[test]
    fn test_expand_env_vars_missing() {
        let input = "account_security: \"${NONEXISTENT_VAR}\"";
        let result = expand_env_vars(input);
        assert_eq!(result, "account_security: \"\"");
    }

    #[test]
    fn test_parse_config_yaml() {
        let yaml = r#"
settings:
  warm_up_on_start: false

params:
  address_security: 3
  security_log: true
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(!config.settings.warm_up_on_start);
        assert_eq!(config.params.address_security, Some(3));
        assert_eq!(config.params.account_security, None);
        assert_eq!(config.params.security_log, Some(true));
    }

    #[test]
    fn test_param_entries() {
        let params = Params {
            address_security: Some(3),
            account_security: None,
            security_log: Some(true),
        };
        let entries = params.entries();
        assert_eq!(
            entries,
            vec![
                ("address_security".to_string(), "3".to_string()),
                ("security_log".to_string(), "Enable".to_string()),
            ]
        );

        let params = Params {
            security_log: Some(false),
            ..Params::default()
        };
        assert_eq!(
            params.entries(),
            vec![("security_log".to_string(), "Disable".to_string())]
        );

        assert!(Params::default().entries().is_empty());
    }

    #[test]
    fn test_validate_negative_threshold() {
        let config = Config {
            params: Params {
                account_security: Some(-1),
                ..Params::default()
            },
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_threshold_too_large() {
        let config = Config {
            params: Params {
                address_security: Some(i64::from(i32::MAX) + 1),
                ..Params::default()
            },
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_threshold() {
        let config = Config {
            params: Params {
                address_security: Some(0),
                ..Params::default()
            },
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "params:\n  account_security: 2\n  security_log: false").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.params.account_security, Some(2));
        assert!(config.settings.warm_up_on_start);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "params:\n  address_security: -3").unwrap();
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_example_parses() {
        std::env::set_var("ACCOUNT_SECURITY", "3");
        let config: Config = serde_yaml::from_str(&expand_env_vars(&Config::example())).unwrap();
        std::env::remove_var("ACCOUNT_SECURITY");
        assert_eq!(config.params.address_security, Some(5));
        assert_eq!(config.params.account_security, Some(3));
    }
}
