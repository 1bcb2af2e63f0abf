use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{HttpTesterError, Result};
use crate::utils::MessageFormatter;

/// Default cap on each request/response dump attached to a failure.
pub const DEFAULT_MAX_OUTPUT: usize = 1200;

/// Per-session settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Maximum bytes of request or response text in failure output.
    pub max_output: usize,

    /// Attach request/response dumps to failure output.
    pub dump_messages: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_output: DEFAULT_MAX_OUTPUT,
            dump_messages: true,
        }
    }
}

impl SessionConfig {
    pub fn with_max_output(mut self, max_output: usize) -> Self {
        self.max_output = max_output;
        self
    }

    pub fn with_dump_messages(mut self, dump_messages: bool) -> Self {
        self.dump_messages = dump_messages;
        self
    }

    pub fn formatter(&self) -> MessageFormatter {
        MessageFormatter::new(self.max_output)
    }
}

/// Loads [`SessionConfig`] from `httptester.toml`.
pub struct ConfigLoader;

impl ConfigLoader {
    const CONFIG_FILE: &'static str = "httptester.toml";

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<SessionConfig> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            HttpTesterError::Config(format!(
                "failed to read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        toml::from_str(&content)
            .map_err(|e| HttpTesterError::Config(format!("failed to parse config file: {}", e)))
    }

    /// Looks in the current directory and its parents first, then in
    /// `~/.config/httptester/`.
    pub fn find_and_load() -> Option<SessionConfig> {
        let from_cwd = std::env::current_dir()
            .ok()
            .and_then(|dir| Self::find_from(&dir));

        from_cwd.or_else(|| dirs::home_dir().and_then(|home| Self::load_from_home(&home)))
    }

    /// Walks from `dir` up to the filesystem root and loads the first
    /// `httptester.toml` found.
    pub fn find_from(dir: &Path) -> Option<SessionConfig> {
        let config_path = dir
            .ancestors()
            .map(|d| d.join(Self::CONFIG_FILE))
            .find(|p| p.exists())?;

        Self::load_or_warn(&config_path)
    }

    fn load_from_home(home: &Path) -> Option<SessionConfig> {
        let config_path = home
            .join(".config")
            .join("httptester")
            .join(Self::CONFIG_FILE);

        if config_path.exists() {
            Self::load_or_warn(&config_path)
        } else {
            None
        }
    }

    fn load_or_warn(path: &Path) -> Option<SessionConfig> {
        match Self::load_from_path(path) {
            Ok(config) => {
                tracing::debug!("Loaded config from {}", path.display());
                Some(config)
            }
            Err(e) => {
                tracing::warn!("Ignoring config file: {}", e);
                None
            }
        }
    }
}
