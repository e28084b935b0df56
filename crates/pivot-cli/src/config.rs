//! TOML configuration for the `pivot` binary.
//!
//! Every field is optional; a missing file section falls back to the built-in
//! defaults. Command-line flags override whatever is loaded here.
//!
//! ```toml
//! [connection]
//! url = "ws://127.0.0.1:8000/ws"
//! max_message_bytes = 4194304
//!
//! [generation]
//! max_depth = 3
//!
//! [layout]
//! node_spacing = 350.0
//! vertical_spacing = 500.0
//!
//! [coalesce]
//! window_ms = 100
//! ```

use std::path::Path;
use std::time::Duration;

use pivot::stream::coalescer::DEFAULT_WINDOW;
use pivot::stream::ws::{DEFAULT_MAX_MESSAGE_BYTES, DEFAULT_URL};
use pivot::stream::DEFAULT_MAX_DEPTH;
use pivot::{LayoutConfig, SessionConfig, WsTransportConfig};
use serde::{Deserialize, Serialize};

use crate::error::{CliError, Result};

// ---------------------------------------------------------------------------
// Top-level PivotConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PivotConfig {
    pub connection: ConnectionConfig,
    pub generation: GenerationConfig,
    pub layout: LayoutConfig,
    pub coalesce: CoalesceConfig,
}

impl PivotConfig {
    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|source| CliError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path` if given, otherwise use defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        let problems = config.validate();
        if problems.is_empty() {
            Ok(config)
        } else {
            Err(CliError::InvalidConfig { problems })
        }
    }

    /// Returns one message per out-of-range parameter.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.connection.url.trim().is_empty() {
            problems.push("connection.url must not be empty".to_string());
        }
        if self.connection.max_message_bytes == 0 {
            problems.push("connection.max_message_bytes must be positive".to_string());
        }
        if self.generation.max_depth == 0 {
            problems.push("generation.max_depth must be at least 1".to_string());
        }
        for (name, value) in [
            ("layout.node_spacing", self.layout.node_spacing),
            ("layout.vertical_spacing", self.layout.vertical_spacing),
        ] {
            if !value.is_finite() || value <= 0.0 {
                problems.push(format!("{name} must be a positive number, got {value}"));
            }
        }
        problems
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            coalesce_window: self.coalesce.window(),
            layout: self.layout,
        }
    }

    pub fn transport_config(&self) -> WsTransportConfig {
        WsTransportConfig {
            url: self.connection.url.clone(),
            max_message_bytes: self.connection.max_message_bytes,
        }
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub url: String,
    pub max_message_bytes: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub max_depth: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoalesceConfig {
    pub window_ms: u64,
}

impl Default for CoalesceConfig {
    fn default() -> Self {
        Self {
            window_ms: DEFAULT_WINDOW.as_millis() as u64,
        }
    }
}

impl CoalesceConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}
