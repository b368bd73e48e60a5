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

//! Runtime health sampling and device classification.
//!
//! [`PerformanceMonitor`] turns per-frame timestamps into periodic
//! [`PerformanceMetrics`](scenery_core::PerformanceMetrics) snapshots and
//! recommends quality-tier steps. The [`capabilities`] module classifies the
//! host once into an initial quality tier.

pub mod capabilities;
pub mod monitor;
pub mod probes;

pub use capabilities::{
    classify_renderer, detect_capabilities, select_quality_tier, CapabilityProbe, ConnectionClass,
    DeviceCapabilities, DeviceClass,
};
pub use monitor::{
    recommend_quality, CheckpointReport, MemoryProbe, MonitorConfig, MonitorState,
    NullMemoryProbe, PerformanceMonitor, PerformanceObserver, QualityThresholds,
};
pub use probes::{GraphicsSupport, SysinfoMemoryProbe, SysinfoProbe};
