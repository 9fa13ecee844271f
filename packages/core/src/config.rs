//! Engine configuration
//!
//! Every tunable the engine uses lives on [`EngineConfig`]. Values can be
//! loaded from JSON; missing fields fall back to their defaults.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Upper bound for any result limit; larger lists are a UI concern
const MAX_RESULT_LIMIT: usize = 500;

/// Placement parameters for the circular network layout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    pub center_x: f64,
    pub center_y: f64,
    pub radius: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            center_x: 300.0,
            center_y: 300.0,
            radius: 200.0,
        }
    }
}

/// Configuration for the link engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Quiet period before a resolver query runs
    pub debounce_ms: u64,

    /// Maximum candidates returned for a non-empty query
    pub search_limit: usize,

    /// Number of recent notes offered for an empty query
    pub recent_limit: usize,

    /// Maximum undo entries kept; the oldest is evicted first
    pub undo_capacity: usize,

    /// How long a delete stays undoable
    pub undo_window_secs: u64,

    /// Length of the most-connected list in graph summaries
    pub most_connected_limit: usize,

    /// Node count used when a caller does not pick a subgraph size
    pub default_subgraph_size: usize,

    /// Buffer size of the notification channel
    pub notification_capacity: usize,

    pub layout: LayoutConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 200,
            search_limit: 10,
            recent_limit: 10,
            undo_capacity: 20,
            undo_window_secs: 30,
            most_connected_limit: 10,
            default_subgraph_size: 50,
            notification_capacity: 64,
            layout: LayoutConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn undo_window(&self) -> Duration {
        Duration::from_secs(self.undo_window_secs)
    }

    /// Parse a JSON document and validate it
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(json).context("Invalid engine config JSON")?;
        config.validate().map_err(anyhow::Error::msg)?;
        Ok(config)
    }

    /// Read and validate a JSON config file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json_str(&raw)
            .with_context(|| format!("Failed to load config from {}", path.display()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("search_limit", self.search_limit),
            ("recent_limit", self.recent_limit),
            ("most_connected_limit", self.most_connected_limit),
            ("default_subgraph_size", self.default_subgraph_size),
        ] {
            if value == 0 {
                return Err(format!("{} must be greater than 0", name));
            }
            if value > MAX_RESULT_LIMIT {
                return Err(format!("{} cannot exceed {}", name, MAX_RESULT_LIMIT));
            }
        }

        if self.undo_capacity == 0 {
            return Err("undo_capacity must be greater than 0".to_string());
        }

        if self.notification_capacity == 0 {
            return Err("notification_capacity must be greater than 0".to_string());
        }

        if !self.layout.radius.is_finite() || self.layout.radius <= 0.0 {
            return Err("layout.radius must be a positive number".to_string());
        }

        if !self.layout.center_x.is_finite() || !self.layout.center_y.is_finite() {
            return Err("layout center must be finite".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.debounce(), Duration::from_millis(200));
        assert_eq!(config.search_limit, 10);
        assert_eq!(config.recent_limit, 10);
        assert_eq!(config.layout.center_x, 300.0);
        assert_eq!(config.layout.radius, 200.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig::default();

        config.search_limit = 0;
        assert!(config.validate().is_err());

        config.search_limit = MAX_RESULT_LIMIT + 1;
        assert!(config.validate().is_err());

        config.search_limit = 10;
        config.undo_capacity = 0;
        assert!(config.validate().is_err());

        config.undo_capacity = 5;
        config.layout.radius = -1.0;
        assert!(config.validate().is_err());

        config.layout.radius = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            EngineConfig::from_json_str(r#"{"debounceMs": 50, "layout": {"radius": 120.0}}"#)
                .unwrap();
        assert_eq!(config.debounce_ms, 50);
        assert_eq!(config.layout.radius, 120.0);
        assert_eq!(config.layout.center_x, 300.0);
        assert_eq!(config.search_limit, 10);
    }

    #[test]
    fn test_invalid_json_values_rejected() {
        assert!(EngineConfig::from_json_str(r#"{"searchLimit": 0}"#).is_err());
        assert!(EngineConfig::from_json_str("not json").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{"undoCapacity": 3}"#).unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.undo_capacity, 3);
        assert!(EngineConfig::load(&dir.path().join("missing.json")).is_err());
    }
}
