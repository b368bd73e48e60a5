// Copyright 2025 eraflo
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

//! Configuration for the scene manager.

use anyhow::{ensure, Context, Result};
use scenery_core::Millis;
use scenery_telemetry::MonitorConfig;
use serde::Deserialize;

/// Configuration for the [`SceneManager`](crate::SceneManager).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SceneManagerConfig {
    /// Ceiling of simultaneous loads. Performance feedback moves the live
    /// cap between 1 and this value.
    pub max_concurrent_scenes: usize,
    /// Hard deadline of a single load.
    pub loading_timeout_ms: Millis,
    /// Delay before a debounced unload takes effect.
    pub unload_delay_ms: Millis,
    /// Above this FPS the live cap grows back by one per checkpoint.
    pub concurrency_recover_fps: f64,
    /// Performance monitor settings.
    pub monitor: MonitorConfig,
}

impl Default for SceneManagerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_scenes: 3,
            loading_timeout_ms: 10_000,
            unload_delay_ms: 5_000,
            concurrency_recover_fps: 50.0,
            monitor: MonitorConfig::default(),
        }
    }
}

impl SceneManagerConfig {
    /// Parses and validates a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).context("Failed to parse scene manager config")?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the values describe a usable manager.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.max_concurrent_scenes >= 1,
            "max_concurrent_scenes must be at least 1"
        );
        ensure!(self.loading_timeout_ms > 0, "loading_timeout_ms must be positive");
        ensure!(
            self.monitor.check_interval_ms > 0,
            "monitor.check_interval_ms must be positive"
        );
        let thresholds = &self.monitor.thresholds;
        ensure!(
            thresholds.memory_low_bytes <= thresholds.memory_high_bytes,
            "memory_low_bytes ({}) exceeds memory_high_bytes ({})",
            thresholds.memory_low_bytes,
            thresholds.memory_high_bytes
        );
        ensure!(
            thresholds.downgrade_fps <= thresholds.upgrade_fps,
            "downgrade_fps ({}) exceeds upgrade_fps ({})",
            thresholds.downgrade_fps,
            thresholds.upgrade_fps
        );
        Ok(())
    }

    /// Replaces values the manager cannot run with: the concurrency ceiling
    /// is raised to 1 and zero timeouts or intervals take their defaults.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        self.max_concurrent_scenes = self.max_concurrent_scenes.max(1);
        if self.loading_timeout_ms == 0 {
            self.loading_timeout_ms = defaults.loading_timeout_ms;
        }
        if self.monitor.check_interval_ms == 0 {
            self.monitor.check_interval_ms = defaults.monitor.check_interval_ms;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenery_core::QualityTier;

    #[test]
    fn defaults_match_documented_values() {
        let config = SceneManagerConfig::default();
        assert_eq!(config.max_concurrent_scenes, 3);
        assert_eq!(config.loading_timeout_ms, 10_000);
        assert_eq!(config.unload_delay_ms, 5_000);
        assert_eq!(config.monitor.check_interval_ms, 1_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = SceneManagerConfig::from_json_str(
            r#"{ "max_concurrent_scenes": 2, "monitor": { "initial_quality": "high", "thresholds": { "downgrade_fps": 24.0 } } }"#,
        )
        .unwrap();
        assert_eq!(config.max_concurrent_scenes, 2);
        assert_eq!(config.loading_timeout_ms, 10_000);
        assert_eq!(config.monitor.initial_quality, QualityTier::High);
        assert_eq!(config.monitor.thresholds.downgrade_fps, 24.0);
        assert_eq!(config.monitor.thresholds.upgrade_fps, 55.0);
    }

    #[test]
    fn sanitized_replaces_unusable_values() {
        let config = SceneManagerConfig {
            max_concurrent_scenes: 0,
            loading_timeout_ms: 0,
            unload_delay_ms: 0,
            ..SceneManagerConfig::default()
        };
        assert!(config.validate().is_err());

        let config = config.sanitized();
        assert_eq!(config.max_concurrent_scenes, 1);
        assert_eq!(config.loading_timeout_ms, 10_000);
        assert_eq!(config.unload_delay_ms, 0, "an immediate debounce is allowed");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(SceneManagerConfig::from_json_str(r#"{ "max_concurrent_scenes": 0 }"#).is_err());
        assert!(SceneManagerConfig::from_json_str(
            r#"{ "monitor": { "thresholds": { "memory_low_bytes": 10, "memory_high_bytes": 5 } } }"#
        )
        .is_err());
        assert!(SceneManagerConfig::from_json_str("not json").is_err());
    }
}
