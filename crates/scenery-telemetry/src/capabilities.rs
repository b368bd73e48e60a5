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

//! One-shot classification of the host into an initial quality tier.

use scenery_core::{QualityTier, SceneError};
use std::panic::{self, AssertUnwindSafe};

/// Coarse network class of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionClass {
    /// 2G-class links.
    Slow,
    /// 3G/4G-class links or better.
    Fast,
    /// Not reported by the host.
    #[default]
    Unknown,
}

impl ConnectionClass {
    /// Maps a browser-style effective connection type to a class.
    pub fn from_effective_type(effective_type: &str) -> Self {
        match effective_type {
            "slow-2g" | "2g" => ConnectionClass::Slow,
            "3g" | "4g" => ConnectionClass::Fast,
            _ => ConnectionClass::Unknown,
        }
    }
}

/// What the detector learned about the host.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceCapabilities {
    /// A basic 3D rendering context can be created.
    pub supports_basic_3d: bool,
    /// An advanced 3D rendering context can be created.
    pub supports_advanced_3d: bool,
    /// Approximate device memory in gigabytes, 0 if unknown.
    pub memory_gb: f32,
    /// Logical core count, 1 if unknown.
    pub cpu_cores: u32,
    /// Network class.
    pub connection: ConnectionClass,
}

impl DeviceCapabilities {
    /// The most conservative profile, used whenever probing fails.
    pub fn conservative() -> Self {
        Self {
            supports_basic_3d: false,
            supports_advanced_3d: false,
            memory_gb: 0.0,
            cpu_cores: 1,
            connection: ConnectionClass::Unknown,
        }
    }
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self::conservative()
    }
}

/// Read-only queries against the host's capability surface.
pub trait CapabilityProbe {
    /// Tries to construct a basic 3D rendering context.
    fn supports_basic_3d(&self) -> anyhow::Result<bool>;
    /// Tries to construct an advanced 3D rendering context.
    fn supports_advanced_3d(&self) -> anyhow::Result<bool>;
    /// Approximate device memory in gigabytes.
    fn device_memory_gb(&self) -> anyhow::Result<Option<f32>>;
    /// Number of logical cores.
    fn cpu_cores(&self) -> anyhow::Result<Option<u32>>;
    /// Network class.
    fn connection(&self) -> anyhow::Result<ConnectionClass>;
}

fn probe_all(probe: &dyn CapabilityProbe) -> anyhow::Result<DeviceCapabilities> {
    Ok(DeviceCapabilities {
        supports_basic_3d: probe.supports_basic_3d()?,
        supports_advanced_3d: probe.supports_advanced_3d()?,
        memory_gb: probe.device_memory_gb()?.unwrap_or(0.0),
        cpu_cores: probe.cpu_cores()?.filter(|cores| *cores > 0).unwrap_or(1),
        connection: probe.connection()?,
    })
}

/// Inspects the host once. Never fails: any error or panic raised by the
/// probe degrades to [`DeviceCapabilities::conservative`].
pub fn detect_capabilities(probe: &dyn CapabilityProbe) -> DeviceCapabilities {
    let failure = match panic::catch_unwind(AssertUnwindSafe(|| probe_all(probe))) {
        Ok(Ok(capabilities)) => {
            log::info!("Detected capabilities: {:?}", capabilities);
            return capabilities;
        }
        Ok(Err(e)) => SceneError::CapabilityDetection(format!("{e:#}")),
        Err(_) => SceneError::CapabilityDetection("probe panicked".to_owned()),
    };
    log::warn!("{failure}. Falling back to the conservative profile.");
    DeviceCapabilities::conservative()
}

/// Picks the initial quality tier for a device.
///
/// 1. No 3D support: `low`.
/// 2. Under 4 GB, under 4 cores, or a slow link: `low`.
/// 3. At least 8 GB, at least 8 cores and a fast link: `high`.
/// 4. Otherwise: `medium`.
pub fn select_quality_tier(capabilities: &DeviceCapabilities) -> QualityTier {
    if !capabilities.supports_basic_3d {
        return QualityTier::Low;
    }
    if capabilities.memory_gb < 4.0
        || capabilities.cpu_cores < 4
        || capabilities.connection == ConnectionClass::Slow
    {
        return QualityTier::Low;
    }
    if capabilities.memory_gb >= 8.0
        && capabilities.cpu_cores >= 8
        && capabilities.connection == ConnectionClass::Fast
    {
        return QualityTier::High;
    }
    QualityTier::Medium
}

/// Rough performance class derived from the GPU renderer string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    /// No rendering context at all.
    Poor,
    /// Integrated graphics.
    Low,
    /// Unrecognized renderer.
    Medium,
    /// Discrete graphics.
    High,
}

/// Classifies a renderer string; `None` means no context could be created.
pub fn classify_renderer(renderer: Option<&str>) -> DeviceClass {
    let Some(renderer) = renderer else {
        return DeviceClass::Poor;
    };
    let renderer = renderer.to_lowercase();
    if renderer.contains("intel") || renderer.contains("integrated") {
        DeviceClass::Low
    } else if ["nvidia", "amd", "radeon"]
        .iter()
        .any(|vendor| renderer.contains(vendor))
    {
        DeviceClass::High
    } else {
        DeviceClass::Medium
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticProbe {
        basic: bool,
        memory: Option<f32>,
        cores: Option<u32>,
        connection: ConnectionClass,
    }

    impl CapabilityProbe for StaticProbe {
        fn supports_basic_3d(&self) -> anyhow::Result<bool> {
            Ok(self.basic)
        }
        fn supports_advanced_3d(&self) -> anyhow::Result<bool> {
            Ok(false)
        }
        fn device_memory_gb(&self) -> anyhow::Result<Option<f32>> {
            Ok(self.memory)
        }
        fn cpu_cores(&self) -> anyhow::Result<Option<u32>> {
            Ok(self.cores)
        }
        fn connection(&self) -> anyhow::Result<ConnectionClass> {
            Ok(self.connection)
        }
    }

    struct BrokenProbe {
        panics: bool,
    }

    impl CapabilityProbe for BrokenProbe {
        fn supports_basic_3d(&self) -> anyhow::Result<bool> {
            if self.panics {
                panic!("context construction blew up");
            }
            anyhow::bail!("no rendering context")
        }
        fn supports_advanced_3d(&self) -> anyhow::Result<bool> {
            Ok(true)
        }
        fn device_memory_gb(&self) -> anyhow::Result<Option<f32>> {
            Ok(Some(16.0))
        }
        fn cpu_cores(&self) -> anyhow::Result<Option<u32>> {
            Ok(Some(16))
        }
        fn connection(&self) -> anyhow::Result<ConnectionClass> {
            Ok(ConnectionClass::Fast)
        }
    }

    fn caps(basic: bool, memory_gb: f32, cores: u32, connection: ConnectionClass) -> DeviceCapabilities {
        DeviceCapabilities {
            supports_basic_3d: basic,
            supports_advanced_3d: false,
            memory_gb,
            cpu_cores: cores,
            connection,
        }
    }

    #[test]
    fn quality_tier_decision_order() {
        use ConnectionClass::*;
        assert_eq!(select_quality_tier(&caps(false, 16.0, 16, Fast)), QualityTier::Low);
        assert_eq!(select_quality_tier(&caps(true, 2.0, 16, Fast)), QualityTier::Low);
        assert_eq!(select_quality_tier(&caps(true, 16.0, 2, Fast)), QualityTier::Low);
        assert_eq!(select_quality_tier(&caps(true, 16.0, 16, Slow)), QualityTier::Low);
        assert_eq!(select_quality_tier(&caps(true, 8.0, 8, Fast)), QualityTier::High);
        assert_eq!(select_quality_tier(&caps(true, 8.0, 8, Unknown)), QualityTier::Medium);
        assert_eq!(select_quality_tier(&caps(true, 4.0, 4, Fast)), QualityTier::Medium);
    }

    #[test]
    fn missing_values_use_documented_defaults() {
        let detected = detect_capabilities(&StaticProbe {
            basic: true,
            memory: None,
            cores: None,
            connection: ConnectionClass::Unknown,
        });
        assert_eq!(detected.memory_gb, 0.0);
        assert_eq!(detected.cpu_cores, 1);
        assert_eq!(select_quality_tier(&detected), QualityTier::Low);
    }

    #[test]
    fn probe_errors_degrade_to_conservative() {
        assert_eq!(
            detect_capabilities(&BrokenProbe { panics: false }),
            DeviceCapabilities::conservative()
        );
        assert_eq!(
            detect_capabilities(&BrokenProbe { panics: true }),
            DeviceCapabilities::conservative()
        );
    }

    #[test]
    fn effective_types_map_to_classes() {
        assert_eq!(ConnectionClass::from_effective_type("2g"), ConnectionClass::Slow);
        assert_eq!(ConnectionClass::from_effective_type("slow-2g"), ConnectionClass::Slow);
        assert_eq!(ConnectionClass::from_effective_type("4g"), ConnectionClass::Fast);
        assert_eq!(ConnectionClass::from_effective_type("wifi"), ConnectionClass::Unknown);
    }

    #[test]
    fn renderer_classification() {
        assert_eq!(classify_renderer(None), DeviceClass::Poor);
        assert_eq!(classify_renderer(Some("Intel(R) UHD Graphics 620")), DeviceClass::Low);
        assert_eq!(classify_renderer(Some("NVIDIA GeForce RTX 3080")), DeviceClass::High);
        assert_eq!(classify_renderer(Some("AMD Radeon Pro 5500M")), DeviceClass::High);
        assert_eq!(classify_renderer(Some("Apple M2")), DeviceClass::Medium);
    }
}
