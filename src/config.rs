use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::warn;

use crate::error::{BbError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProfileConfig {
    pub name: String,
    pub workspace: String,
    pub token_env: Option<String>,
    pub token_command: Option<String>,
    /// `base64(user:app-password)`, sent as-is in the Basic auth header.
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub default_profile: Option<String>,
    pub poll_interval_secs: u64,
    pub timeout_secs: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_profile: None,
            poll_interval_secs: 8,
            timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub profiles: Vec<ProfileConfig>,
}

/// Outcome of profile selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileChoice<'a> {
    Chosen(&'a ProfileConfig),
    /// No preference among several profiles; the user picks one.
    Ask(&'a [ProfileConfig]),
}

pub fn config_path() -> Option<PathBuf> {
    let config_dir = dirs::config_dir()?;
    Some(config_dir.join("bbtui").join("config.toml"))
}

impl Config {
    /// Load the user config, falling back to defaults when it is missing or
    /// cannot be parsed.
    pub fn load() -> Self {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Config::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Config::default();
        };

        match toml::from_str::<Config>(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring invalid config");
                Config::default()
            }
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.general.poll_interval_secs.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.general.timeout_secs.max(1))
    }

    /// Pick the profile to run with: the requested one, then the configured
    /// default, then the only profile there is. With several profiles and no
    /// preference the user is asked.
    pub fn select_profile(&self, requested: Option<&str>) -> Result<ProfileChoice<'_>> {
        let wanted = requested.or(self.general.default_profile.as_deref());

        if let Some(name) = wanted {
            return self
                .profiles
                .iter()
                .find(|p| p.name == name)
                .map(ProfileChoice::Chosen)
                .ok_or_else(|| {
                    BbError::Config(format!(
                        "profile '{}' not found (available: {})",
                        name,
                        self.profile_names()
                    ))
                });
        }

        match self.profiles.as_slice() {
            [only] => Ok(ProfileChoice::Chosen(only)),
            [] => Err(BbError::Config(format!(
                "no profiles configured; add one to {}",
                config_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "config.toml".to_string())
            ))),
            several => Ok(ProfileChoice::Ask(several)),
        }
    }

    fn profile_names(&self) -> String {
        self.profiles
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str) -> ProfileConfig {
        ProfileConfig {
            name: name.to_string(),
            workspace: format!("{}-ws", name),
            token_env: None,
            token_command: None,
            token: None,
        }
    }

    #[test]
    fn parse_valid_config() {
        let toml_str = r#"
[general]
default_profile = "work"
poll_interval_secs = 5

[[profiles]]
name = "work"
workspace = "acme"
token_env = "BITBUCKET_TOKEN"
token_command = "pass bitbucket"

[[profiles]]
name = "home"
workspace = "me"
token = "dXNlcjpwYXNz"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.profiles.len(), 2);
        assert_eq!(config.general.default_profile.as_deref(), Some("work"));
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.timeout(), Duration::from_secs(20));
        assert_eq!(config.profiles[1].token.as_deref(), Some("dXNlcjpwYXNz"));
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.profiles.is_empty());
        assert_eq!(config.poll_interval(), Duration::from_secs(8));
    }

    #[test]
    fn missing_or_invalid_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Config::load_from(&dir.path().join("nope.toml")), Config::default());

        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[[profiles]]\nname = 3").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
    }

    #[test]
    fn requested_profile_wins() {
        let config = Config {
            general: GeneralConfig {
                default_profile: Some("work".to_string()),
                ..GeneralConfig::default()
            },
            profiles: vec![profile("work"), profile("home")],
        };
        assert_eq!(
            config.select_profile(Some("home")).unwrap(),
            ProfileChoice::Chosen(&config.profiles[1])
        );
        assert_eq!(
            config.select_profile(None).unwrap(),
            ProfileChoice::Chosen(&config.profiles[0])
        );
    }

    #[test]
    fn single_profile_is_implicit() {
        let config = Config {
            profiles: vec![profile("solo")],
            ..Config::default()
        };
        assert_eq!(
            config.select_profile(None).unwrap(),
            ProfileChoice::Chosen(&config.profiles[0])
        );
    }

    #[test]
    fn several_profiles_without_preference_ask_the_user() {
        let config = Config {
            profiles: vec![profile("work"), profile("home")],
            ..Config::default()
        };
        match config.select_profile(None).unwrap() {
            ProfileChoice::Ask(profiles) => assert_eq!(profiles.len(), 2),
            other => panic!("expected Ask, got {:?}", other),
        }
    }

    #[test]
    fn unknown_profile_lists_choices() {
        let config = Config {
            profiles: vec![profile("work"), profile("home")],
            ..Config::default()
        };
        let err = config.select_profile(Some("ci")).unwrap_err().to_string();
        assert!(err.contains("'ci' not found"));
        assert!(err.contains("work, home"));
    }

    #[test]
    fn no_profiles_is_a_config_error() {
        let err = Config::default().select_profile(None).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
    }
}
