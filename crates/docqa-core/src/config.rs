//! Configuration for the Document Q&A core
//!
//! Session behaviour knobs plus mock backend tuning, loadable from a
//! TOML file or built up with `with_*` methods.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Policy for matching an attachment in `remove_file`.
///
/// The original behaviour matched by display name, which makes two
/// distinct attachments sharing a name indistinguishable. Handle
/// matching is the stricter alternative; which one is correct is a
/// product decision, so both are kept behind this switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileMatch {
    /// Remove the first pending attachment with the same name.
    #[default]
    ByName,
    /// Remove the pending attachment with the same opaque handle.
    ByHandle,
}

/// Session store behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Delay between revealed tokens during streaming, in milliseconds
    pub stream_delay_ms: u64,
    /// Whether a submission must carry at least one attachment
    pub require_attachments: bool,
    /// Attachment matching policy for `remove_file`
    pub file_match: FileMatch,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            stream_delay_ms: 50,
            require_attachments: true,
            file_match: FileMatch::default(),
        }
    }
}

impl SessionConfig {
    /// Set the inter-token streaming delay
    pub fn with_stream_delay_ms(mut self, ms: u64) -> Self {
        self.stream_delay_ms = ms;
        self
    }

    /// Set whether submissions require at least one attachment
    pub fn with_require_attachments(mut self, required: bool) -> Self {
        self.require_attachments = required;
        self
    }

    /// Set the attachment matching policy
    pub fn with_file_match(mut self, policy: FileMatch) -> Self {
        self.file_match = policy;
        self
    }

    /// Inter-token delay as a `Duration`
    pub fn stream_delay(&self) -> Duration {
        Duration::from_millis(self.stream_delay_ms)
    }
}

/// Mock backend tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base simulated latency unit, in milliseconds
    pub latency_ms: u64,
    /// Credit balance a fresh backend starts with
    pub starting_credits: i64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            latency_ms: 1000,
            starting_credits: 20,
        }
    }
}

impl BackendConfig {
    /// Base latency unit as a `Duration`
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

/// Aggregate application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub session: SessionConfig,
    pub backend: BackendConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&content).map_err(|e| Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.session.stream_delay_ms, 50);
        assert!(config.session.require_attachments);
        assert_eq!(config.session.file_match, FileMatch::ByName);
        assert_eq!(config.backend.latency_ms, 1000);
        assert_eq!(config.backend.starting_credits, 20);
    }

    #[test]
    fn test_builder() {
        let session = SessionConfig::default()
            .with_stream_delay_ms(10)
            .with_require_attachments(false)
            .with_file_match(FileMatch::ByHandle);
        assert_eq!(session.stream_delay(), Duration::from_millis(10));
        assert!(!session.require_attachments);
        assert_eq!(session.file_match, FileMatch::ByHandle);
    }

    #[test]
    fn test_load_partial_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[session]\nstream_delay_ms = 5\nfile_match = \"by_handle\"\n\n[backend]\nstarting_credits = 3"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.session.stream_delay_ms, 5);
        // Unspecified fields keep their defaults
        assert!(config.session.require_attachments);
        assert_eq!(config.session.file_match, FileMatch::ByHandle);
        assert_eq!(config.backend.starting_credits, 3);
        assert_eq!(config.backend.latency_ms, 1000);
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[session\nbroken").unwrap();

        let result = Config::load(file.path());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/docqa.toml");
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
