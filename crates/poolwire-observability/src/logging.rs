//! Log subscriber set-up for poolwire binaries.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log levels and output format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Global default level: "trace" | "debug" | "info" | "warn" | "error"
    #[serde(default = "default_level")]
    pub level: String,
    /// Per-crate overrides, e.g. `poolwire-stream → debug`.
    #[serde(default)]
    pub components: BTreeMap<String, String>,
    /// One JSON object per line instead of human-readable text.
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            components: BTreeMap::new(),
            json: false,
        }
    }
}

impl LogConfig {
    /// Defaults overridden by `POOLWIRE_LOG` (a level or full filter
    /// directive) and `POOLWIRE_LOG_JSON=1`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(level) = std::env::var("POOLWIRE_LOG") {
            config.level = level;
        }
        config.json = std::env::var("POOLWIRE_LOG_JSON").is_ok_and(|v| v == "1" || v == "true");
        config
    }

    pub fn with_component(mut self, component: &str, level: &str) -> Self {
        self.components.insert(component.to_string(), level.to_string());
        self
    }

    /// `EnvFilter` directive string: `"info,poolwire_stream=debug"`.
    pub fn directives(&self) -> String {
        let mut directives = self.level.clone();
        for (component, level) in &self.components {
            directives.push_str(&format!(",{}={}", component.replace('-', "_"), level));
        }
        directives
    }
}

/// Install the global subscriber. Logs go to stderr so stdout stays free
/// for data. Fails if a subscriber is already installed.
pub fn init_tracing(config: &LogConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_new(config.directives()).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
    }
}
