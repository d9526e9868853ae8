// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fs::read_to_string;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::Fallible;
use crate::types::user_id::UserId;

pub const CONFIG_FILE: &str = "flipwise.toml";

/// Settings read from `flipwise.toml` in the data directory. Every field is
/// optional; command-line flags take precedence.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// The learner's name. When set, sets are stored permanently and
    /// sessions are recorded.
    pub user: Option<String>,
    /// The port the web interface listens on.
    pub port: u16,
    /// How long written-mode results stay on screen, in milliseconds.
    pub feedback_ms: u64,
    /// Whether to open the browser when the server starts.
    pub open_browser: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user: None,
            port: 8000,
            feedback_ms: 1500,
            open_browser: true,
        }
    }
}

impl Config {
    /// Load the configuration from the given directory. A missing file
    /// yields the defaults.
    pub fn load(directory: &Path) -> Fallible<Self> {
        let path = directory.join(CONFIG_FILE);
        if !path.exists() {
            log::debug!("No {CONFIG_FILE}, using defaults.");
            return Ok(Self::default());
        }
        log::debug!("Loading configuration from {}", path.display());
        let content = read_to_string(&path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Fallible<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply the command-line overrides.
    pub fn with_overrides(mut self, user: Option<String>, port: Option<u16>, no_open: bool) -> Self {
        if user.is_some() {
            self.user = user;
        }
        if let Some(port) = port {
            self.port = port;
        }
        if no_open {
            self.open_browser = false;
        }
        self
    }

    pub fn user(&self) -> Option<UserId> {
        self.user
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(UserId::new)
    }

    pub fn feedback(&self) -> Duration {
        Duration::from_millis(self.feedback_ms)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_missing_file() -> Fallible<()> {
        let dir = tempdir()?;
        assert_eq!(Config::load(dir.path())?, Config::default());
        Ok(())
    }

    #[test]
    fn test_parse() -> Fallible<()> {
        let config = Config::parse("user = \"ada\"\nport = 9000\n")?;
        assert_eq!(config.user(), Some(UserId::new("ada")));
        assert_eq!(config.port, 9000);
        assert_eq!(config.feedback(), Duration::from_millis(1500));
        assert!(config.open_browser);
        Ok(())
    }

    #[test]
    fn test_unknown_field() {
        assert!(Config::parse("colour = \"blue\"").is_err());
    }

    #[test]
    fn test_overrides() -> Fallible<()> {
        let config = Config::parse("user = \"ada\"\nport = 9000\n")?;
        let config = config.with_overrides(Some("bob".to_string()), None, true);
        assert_eq!(config.user(), Some(UserId::new("bob")));
        assert_eq!(config.port, 9000);
        assert!(!config.open_browser);
        Ok(())
    }

    #[test]
    fn test_blank_user_is_anonymous() {
        let config = Config {
            user: Some("  ".to_string()),
            ..Config::default()
        };
        assert_eq!(config.user(), None);
    }
}
