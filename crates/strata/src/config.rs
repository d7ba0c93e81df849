//! # Runtime Configuration
//!
//! One TOML document, one section per unit. Every section and every field
//! is optional; anything missing falls back to its default.
//!
//! ```toml
//! [world]
//! entity_capacity = 4096
//! component_capacity = 1024
//!
//! [events]
//! event_capacity = 128
//!
//! [frame]
//! target_fps = 60
//! warn_on_slow_frame = true
//!
//! [logging]
//! filter = "strata=debug,info"
//! with_target = false
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use strata_ecs::WorldConfig;
use strata_events::EventConfig;
use thiserror::Error;

/// Errors raised while loading a [`RuntimeConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid TOML or does not match the schema.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Frame pacing.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Frames per second the budget is derived from. Zero disables the
    /// budget.
    pub target_fps: u32,
    /// Log a warning for frames that exceed the budget.
    pub warn_on_slow_frame: bool,
}

impl FrameConfig {
    /// Returns the time budget of one frame, if any.
    #[must_use]
    pub fn frame_budget(&self) -> Option<Duration> {
        (self.target_fps > 0).then(|| Duration::from_secs(1) / self.target_fps)
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            warn_on_slow_frame: true,
        }
    }
}

/// Log output.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive. `RUST_LOG` wins when set.
    pub filter: String,
    /// Include the event target (module path) in every line.
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_owned(),
            with_target: false,
        }
    }
}

/// Complete runtime configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// ECS sizing.
    pub world: WorldConfig,
    /// Event bus sizing.
    pub events: EventConfig,
    /// Frame pacing.
    pub frame: FrameConfig,
    /// Log output.
    pub logging: LogConfig,
}

impl RuntimeConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] if the document is malformed.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Reads and parses the TOML file at `path`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, [`ConfigError::Parse`]
    /// if it is malformed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(path = %path.display(), "runtime config loaded");
        Ok(config)
    }
}
