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

//! Frame-timing monitor with a hysteretic quality policy.
//!
//! The host calls [`PerformanceMonitor::record_frame`] on every animation
//! frame and [`PerformanceMonitor::poll`] on every loop turn. Once per
//! `check_interval_ms` the monitor closes its window, publishes a new
//! [`PerformanceMetrics`] snapshot and moves the tracked quality tier by at
//! most one step.

use scenery_core::{Clock, Millis, PerformanceMetrics, QualityTier, SceneError};
use serde::Deserialize;
use std::fmt::Debug;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

const MIB: u64 = 1024 * 1024;

/// Thresholds of the quality policy.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct QualityThresholds {
    /// Below this FPS the tier steps down.
    pub downgrade_fps: f64,
    /// Above this FPS (with low memory) the tier steps up.
    pub upgrade_fps: f64,
    /// Above this memory usage the tier steps down.
    pub memory_high_bytes: u64,
    /// Memory usage must stay below this for the tier to step up.
    pub memory_low_bytes: u64,
    /// An inter-frame delta above this counts as a dropped frame.
    pub dropped_frame_ms: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            downgrade_fps: 30.0,
            upgrade_fps: 55.0,
            memory_high_bytes: 100 * MIB,
            memory_low_bytes: 50 * MIB,
            dropped_frame_ms: 33.33,
        }
    }
}

impl QualityThresholds {
    /// Returns `true` if a snapshot shows rendering under pressure.
    pub fn is_under_pressure(&self, metrics: &PerformanceMetrics) -> bool {
        metrics.fps < self.downgrade_fps || metrics.memory_usage_bytes > self.memory_high_bytes
    }
}

/// Configuration for the [`PerformanceMonitor`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Interval between checkpoints.
    pub check_interval_ms: Millis,
    /// Tier tracked before the first checkpoint.
    pub initial_quality: QualityTier,
    /// Quality policy thresholds.
    pub thresholds: QualityThresholds,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_interval_ms: 1000,
            initial_quality: QualityTier::Medium,
            thresholds: QualityThresholds::default(),
        }
    }
}

/// Lifecycle of the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// Sampling frames and producing checkpoints.
    Running,
    /// Disposed; no further sampling or callbacks.
    Stopped,
}

/// Source of the application's current memory usage.
pub trait MemoryProbe: Send + Debug {
    /// Returns the memory in use, in bytes, or `None` if unavailable.
    fn used_bytes(&mut self) -> Option<u64>;
}

/// A probe for hosts that cannot report memory.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMemoryProbe;

impl MemoryProbe for NullMemoryProbe {
    fn used_bytes(&mut self) -> Option<u64> {
        None
    }
}

/// Consumer callbacks invoked at checkpoints.
///
/// Errors and panics raised by an observer are logged and swallowed.
pub trait PerformanceObserver: Send {
    /// Called at every checkpoint with the new snapshot.
    fn on_performance_change(&mut self, _metrics: &PerformanceMetrics) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called when the recommended tier differs from the tracked tier.
    fn on_quality_adjust(&mut self, _quality: QualityTier) -> anyhow::Result<()> {
        Ok(())
    }
}

/// The outcome of one checkpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckpointReport {
    /// The new snapshot.
    pub metrics: PerformanceMetrics,
    /// The new tier, if the policy moved it.
    pub quality_change: Option<QualityTier>,
}

/// Applies the hysteretic policy: at most one tier step per checkpoint.
///
/// | Condition | Result |
/// |---|---|
/// | FPS below `downgrade_fps` or memory above `memory_high_bytes` | one step down |
/// | FPS above `upgrade_fps` and memory below `memory_low_bytes` | one step up |
/// | otherwise | hold |
pub fn recommend_quality(
    current: QualityTier,
    metrics: &PerformanceMetrics,
    thresholds: &QualityThresholds,
) -> QualityTier {
    if thresholds.is_under_pressure(metrics) {
        current.downgraded()
    } else if metrics.fps > thresholds.upgrade_fps
        && metrics.memory_usage_bytes < thresholds.memory_low_bytes
    {
        current.upgraded()
    } else {
        current
    }
}

#[derive(Debug, Default)]
struct FrameWindow {
    last_frame_ts: Option<f64>,
    frames: u32,
    dropped: u32,
}

/// Samples frame timing and memory, and recommends quality tiers.
pub struct PerformanceMonitor {
    config: MonitorConfig,
    clock: Arc<dyn Clock>,
    memory: Box<dyn MemoryProbe>,
    state: MonitorState,
    window: FrameWindow,
    metrics: PerformanceMetrics,
    current_quality: QualityTier,
    next_checkpoint_ms: Millis,
    observers: Vec<Box<dyn PerformanceObserver>>,
}

impl PerformanceMonitor {
    /// Creates a running monitor. The first checkpoint is due one interval from now.
    pub fn new(config: MonitorConfig, clock: Arc<dyn Clock>, memory: Box<dyn MemoryProbe>) -> Self {
        let now = clock.now_ms();
        log::info!(
            "PerformanceMonitor started (interval={}ms, quality={}).",
            config.check_interval_ms,
            config.initial_quality
        );
        Self {
            current_quality: config.initial_quality,
            next_checkpoint_ms: now + config.check_interval_ms,
            metrics: PerformanceMetrics::initial(now),
            window: FrameWindow::default(),
            state: MonitorState::Running,
            observers: Vec::new(),
            config,
            clock,
            memory,
        }
    }

    /// Adds a consumer notified at every checkpoint.
    pub fn add_observer(&mut self, observer: Box<dyn PerformanceObserver>) {
        if self.state == MonitorState::Stopped {
            log::debug!("PerformanceMonitor: observer ignored, monitor is stopped.");
            return;
        }
        self.observers.push(observer);
    }

    /// Records one animation frame at the host's high-resolution timestamp.
    pub fn record_frame(&mut self, timestamp_ms: f64) {
        if self.state == MonitorState::Stopped {
            return;
        }
        let window = &mut self.window;
        if let Some(last) = window.last_frame_ts {
            if timestamp_ms - last > self.config.thresholds.dropped_frame_ms {
                window.dropped += 1;
            }
        }
        window.frames += 1;
        window.last_frame_ts = Some(timestamp_ms);
    }

    /// Runs a checkpoint if the interval has elapsed.
    pub fn poll(&mut self) -> Option<CheckpointReport> {
        if self.state == MonitorState::Stopped {
            return None;
        }
        if self.clock.now_ms() < self.next_checkpoint_ms {
            return None;
        }
        self.checkpoint()
    }

    /// Closes the current window immediately and evaluates the quality policy.
    ///
    /// Returns `None` once the monitor is stopped.
    pub fn checkpoint(&mut self) -> Option<CheckpointReport> {
        if self.state == MonitorState::Stopped {
            return None;
        }

        let now = self.clock.now_ms();
        let elapsed_ms = now.saturating_sub(self.metrics.last_check_ms) as f64;
        let frames = self.window.frames;

        let fps = if elapsed_ms > 0.0 {
            frames as f64 / (elapsed_ms / 1000.0)
        } else {
            0.0
        };
        let frame_time_ms = if frames > 0 {
            elapsed_ms / frames as f64
        } else {
            elapsed_ms
        };

        self.metrics = PerformanceMetrics {
            fps: (fps * 10.0).round() / 10.0,
            frame_time_ms: (frame_time_ms * 100.0).round() / 100.0,
            memory_usage_bytes: self.memory.used_bytes().unwrap_or(0),
            dropped_frames: self.window.dropped,
            last_check_ms: now,
        };
        self.window.frames = 0;
        self.window.dropped = 0;
        self.next_checkpoint_ms = now + self.config.check_interval_ms;

        log::trace!(
            "Checkpoint: fps={:.1} frame_time={:.2}ms memory={:.1}MB dropped={}",
            self.metrics.fps,
            self.metrics.frame_time_ms,
            self.metrics.memory_usage_mb(),
            self.metrics.dropped_frames
        );

        let recommended =
            recommend_quality(self.current_quality, &self.metrics, &self.config.thresholds);
        let quality_change = (recommended != self.current_quality).then(|| {
            log::debug!(
                "PerformanceMonitor: quality {} -> {}",
                self.current_quality,
                recommended
            );
            self.current_quality = recommended;
            recommended
        });

        let metrics = self.metrics;
        if let Some(quality) = quality_change {
            self.notify("on_quality_adjust", |observer| {
                observer.on_quality_adjust(quality)
            });
        }
        self.notify("on_performance_change", |observer| {
            observer.on_performance_change(&metrics)
        });

        Some(CheckpointReport {
            metrics,
            quality_change,
        })
    }

    fn notify<F>(&mut self, callback: &'static str, mut call: F)
    where
        F: FnMut(&mut dyn PerformanceObserver) -> anyhow::Result<()>,
    {
        for observer in self.observers.iter_mut() {
            if self.state == MonitorState::Stopped {
                return;
            }
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| call(observer.as_mut())));
            let reason = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => format!("{e:#}"),
                Err(_) => "observer panicked".to_owned(),
            };
            log::warn!("{}", SceneError::Callback { callback, reason });
        }
    }

    /// Returns the latest snapshot.
    pub fn metrics(&self) -> PerformanceMetrics {
        self.metrics
    }

    /// Returns the tier currently tracked by the policy.
    pub fn current_quality(&self) -> QualityTier {
        self.current_quality
    }

    /// Overrides the tracked tier without notifying observers.
    pub fn set_quality(&mut self, quality: QualityTier) {
        self.current_quality = quality;
    }

    /// Returns the monitor configuration.
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Returns the lifecycle state.
    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Stops sampling and drops every observer. Idempotent.
    ///
    /// The state flips to `Stopped` before anything else, so no callback can
    /// fire afterwards.
    pub fn dispose(&mut self) {
        if self.state == MonitorState::Stopped {
            return;
        }
        self.state = MonitorState::Stopped;
        self.observers.clear();
        self.window = FrameWindow::default();
        log::info!("PerformanceMonitor stopped.");
    }
}

impl Debug for PerformanceMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerformanceMonitor")
            .field("state", &self.state)
            .field("quality", &self.current_quality)
            .field("metrics", &self.metrics)
            .field("observers", &self.observers.len())
            .finish()
    }
}
