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

//! Performance snapshot shared between the monitor and its consumers.

use crate::clock::Millis;
use serde::Serialize;

/// A snapshot of rendering health, replaced wholesale at every checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerformanceMetrics {
    /// Frames per second over the last window, rounded to one decimal.
    pub fps: f64,
    /// Average frame time in milliseconds, rounded to two decimals.
    pub frame_time_ms: f64,
    /// Memory usage in bytes, 0 if unavailable.
    pub memory_usage_bytes: u64,
    /// Frames whose delta exceeded the dropped-frame threshold during the window.
    pub dropped_frames: u32,
    /// Time of the checkpoint that produced this snapshot.
    pub last_check_ms: Millis,
}

impl PerformanceMetrics {
    /// The optimistic snapshot reported before the first checkpoint.
    pub fn initial(now_ms: Millis) -> Self {
        Self {
            fps: 60.0,
            frame_time_ms: 16.67,
            memory_usage_bytes: 0,
            dropped_frames: 0,
            last_check_ms: now_ms,
        }
    }

    /// Returns the memory usage in megabytes (MB).
    pub fn memory_usage_mb(&self) -> f64 {
        self.memory_usage_bytes as f64 / (1024.0 * 1024.0)
    }
}
