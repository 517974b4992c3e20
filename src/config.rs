//! User configuration
//!
//! Read from `--config PATH` when given, else `~/.chalkstep.toml` when it
//! exists, else built-in defaults. `CHALKSTEP_SERVER_URL` overrides the
//! server URL from the file.

use crate::animation::tween::MIN_SPEED;
use crate::session::BackPolicy;
use eyre::{eyre, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const SERVER_URL_ENV: &str = "CHALKSTEP_SERVER_URL";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub animation: AnimationConfig,
}

/// Explanation service location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:3000".to_string(),
            timeout_secs: 20,
        }
    }
}

impl ServerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub back_policy: BackPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Playback rate multiplier
    pub speed: f64,
    pub enabled: bool,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            enabled: true,
        }
    }
}

impl AnimationConfig {
    /// Rate handed to tweens; zero means jump straight to the end
    pub fn effective_speed(&self) -> f64 {
        if self.enabled {
            self.speed
        } else {
            0.0
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| eyre!("unable to determine home directory"))?;
        Ok(home.join(".chalkstep.toml"))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read config file {}", path.display()))?;
        let config = toml::from_str(&content)
            .wrap_err_with(|| format!("failed to parse {} as TOML", path.display()))?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Resolve the configuration for this process.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Ok(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        if let Ok(url) = std::env::var(SERVER_URL_ENV) {
            if !url.trim().is_empty() {
                config.server.url = url;
            }
        }
        let speed = config.animation.speed;
        if !speed.is_finite() || speed < 0.0 || (speed > 0.0 && speed < MIN_SPEED) {
            return Err(eyre!(
                "animation.speed must be 0 (instant) or at least {}, got {}",
                MIN_SPEED,
                speed
            ));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.url, "http://localhost:3000");
        assert_eq!(config.server.timeout(), Duration::from_secs(20));
        assert_eq!(config.session.back_policy, BackPolicy::Replay);
        assert_eq!(config.animation.effective_speed(), 1.0);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[session]\nback_policy = \"view-only\"\n\n[animation]\nenabled = false")
            .expect("write");
        let config = Config::from_file(file.path()).expect("parse");
        assert_eq!(config.session.back_policy, BackPolicy::ViewOnly);
        assert_eq!(config.animation.effective_speed(), 0.0);
        assert_eq!(config.server.timeout_secs, 20);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("nope.toml");
        assert!(Config::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_rejects_vanishing_speed() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[animation]\nspeed = 1e-300").expect("write");
        let err = Config::load(Some(file.path())).expect_err("should fail");
        assert!(err.to_string().contains("animation.speed"));

        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[animation]\nspeed = 0.0").expect("write");
        assert_eq!(Config::load(Some(file.path())).expect("load").animation.speed, 0.0);
    }

    #[test]
    fn test_bad_toml_reports_path() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[server\nurl = 1").expect("write");
        let err = Config::from_file(file.path()).expect_err("should fail");
        assert!(err.to_string().contains("TOML"));
    }
}
