//! Runtime configuration
//!
//! Every field has a default matching what the bundled game build expects, so
//! the config file is optional. Values given on the command line override the
//! file.

use crate::{KubedoomError, Result};
use clap::ValueEnum;
use kubedoom_common::{OverflowPolicy, RecordLayout};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Socket path the game's `nc -U` calls are compiled against
pub const DEFAULT_SOCKET_PATH: &str = "/dockerdoom.socket";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub launch: LaunchConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub socket_path: PathBuf,
    /// Seconds a client gets to send its command
    pub read_timeout_secs: u64,
    pub record_width: usize,
    pub overflow: OverflowPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let layout = RecordLayout::default();
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            read_timeout_secs: 30,
            record_width: layout.width,
            overflow: layout.overflow,
        }
    }
}

impl ServerConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn record_layout(&self) -> RecordLayout {
        RecordLayout {
            width: self.record_width,
            overflow: self.overflow,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Shell out to kubectl
    #[default]
    Kubectl,
    /// Talk to the API server directly
    Api,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub kubectl: PathBuf,
    /// Upper bound for a single list or delete call, in seconds
    pub command_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            kubectl: PathBuf::from("kubectl"),
            command_timeout_secs: 30,
        }
    }
}

impl BackendConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LaunchConfig {
    pub display: String,
    pub geometry: String,
    pub xvfb: PathBuf,
    pub x11vnc: PathBuf,
    /// Seconds to wait for the framebuffer before starting the VNC server
    pub display_settle_secs: u64,
    /// Game binary followed by its arguments
    pub game: Vec<String>,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            display: ":99".to_string(),
            geometry: "640x480".to_string(),
            xvfb: PathBuf::from("/usr/bin/Xvfb"),
            x11vnc: PathBuf::from("x11vnc"),
            display_settle_secs: 2,
            game: vec![
                "/usr/local/games/psdoom".to_string(),
                "-warp".to_string(),
                "-E1M1".to_string(),
            ],
        }
    }
}

impl LaunchConfig {
    pub fn display_settle(&self) -> Duration {
        Duration::from_secs(self.display_settle_secs)
    }
}

impl Config {
    /// Load the config file at `path`, or the defaults when there is none
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    KubedoomError::ConfigError(format!(
                        "Failed to read {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Self::from_yaml(&raw)?
            }
            None => Self::default(),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw)
            .map_err(|e| KubedoomError::ConfigError(format!("Invalid config: {}", e)))
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.record_width == 0 {
            return Err(KubedoomError::ConfigError(
                "server.record_width must be greater than zero".to_string(),
            ));
        }

        if self.launch.game.is_empty() {
            return Err(KubedoomError::ConfigError(
                "launch.game must name the game binary".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.server.socket_path, PathBuf::from("/dockerdoom.socket"));
        assert_eq!(config.server.record_layout(), RecordLayout::default());
        assert_eq!(config.backend.kind, BackendKind::Kubectl);
        assert_eq!(config.launch.display, ":99");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml(
            "server:\n  record_width: 64\n  overflow: truncate\nbackend:\n  kind: api\n",
        )
        .expect("valid yaml");

        assert_eq!(config.server.record_width, 64);
        assert_eq!(config.server.overflow, OverflowPolicy::Truncate);
        assert_eq!(config.server.read_timeout(), Duration::from_secs(30));
        assert_eq!(config.backend.kind, BackendKind::Api);
        assert_eq!(config.backend.kubectl, PathBuf::from("kubectl"));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = Config::from_yaml("server:\n  socket: /tmp/x.sock\n").unwrap_err();
        assert!(matches!(err, KubedoomError::ConfigError(_)));
    }

    #[test]
    fn test_zero_width_is_rejected() {
        let mut config = Config::default();
        config.server.record_width = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "server:\n  socket_path: /tmp/doom.sock").expect("write");

        let config = Config::load(Some(file.path())).expect("load");
        assert_eq!(config.server.socket_path, PathBuf::from("/tmp/doom.sock"));

        assert!(Config::load(Some(Path::new("/nonexistent/kubedoom.yaml"))).is_err());
        assert_eq!(Config::load(None).expect("defaults"), Config::default());
    }
}
