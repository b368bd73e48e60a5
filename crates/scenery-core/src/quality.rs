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

//! Quality tiers and their static rendering presets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A discrete rendering-fidelity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    /// Minimal fidelity for weak devices or sustained pressure.
    Low,
    /// Balanced default.
    #[default]
    Medium,
    /// Full fidelity.
    High,
}

impl QualityTier {
    /// Returns the tier one step below, saturating at [`QualityTier::Low`].
    pub fn downgraded(self) -> Self {
        match self {
            QualityTier::High => QualityTier::Medium,
            QualityTier::Medium | QualityTier::Low => QualityTier::Low,
        }
    }

    /// Returns the tier one step above, saturating at [`QualityTier::High`].
    pub fn upgraded(self) -> Self {
        match self {
            QualityTier::Low => QualityTier::Medium,
            QualityTier::Medium | QualityTier::High => QualityTier::High,
        }
    }

    /// Returns the lowercase name used in configuration files.
    pub fn as_str(self) -> &'static str {
        match self {
            QualityTier::Low => "low",
            QualityTier::Medium => "medium",
            QualityTier::High => "high",
        }
    }

    /// Returns the static rendering preset for this tier.
    pub fn settings(self) -> &'static QualitySettings {
        match self {
            QualityTier::Low => &LOW_PRESET,
            QualityTier::Medium => &MEDIUM_PRESET,
            QualityTier::High => &HIGH_PRESET,
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rendering parameters handed to the external 3D engine for a tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualitySettings {
    /// Upper bound on geometry complexity, in polygons.
    pub max_polygons: u32,
    /// Texture edge length in pixels.
    pub texture_resolution: u32,
    /// Whether shadows are rendered.
    pub shadows: bool,
    /// Whether reflections are rendered.
    pub reflections: bool,
    /// Whether particle systems run.
    pub particles: bool,
    /// Whether the post-processing chain runs.
    pub post_processing: bool,
    /// Whether antialiasing is enabled.
    pub antialiasing: bool,
    /// Maximum number of dynamic lights.
    pub max_lights: u32,
    /// Shadow map edge length in pixels.
    pub shadow_map_size: u32,
    /// Resolution scale of post-processing passes (0.0 to 1.0).
    pub post_process_quality: f32,
}

const LOW_PRESET: QualitySettings = QualitySettings {
    max_polygons: 5_000,
    texture_resolution: 512,
    shadows: false,
    reflections: false,
    particles: false,
    post_processing: false,
    antialiasing: false,
    max_lights: 2,
    shadow_map_size: 512,
    post_process_quality: 0.5,
};

const MEDIUM_PRESET: QualitySettings = QualitySettings {
    max_polygons: 15_000,
    texture_resolution: 1024,
    shadows: true,
    reflections: false,
    particles: true,
    post_processing: true,
    antialiasing: true,
    max_lights: 4,
    shadow_map_size: 1024,
    post_process_quality: 0.75,
};

const HIGH_PRESET: QualitySettings = QualitySettings {
    max_polygons: 50_000,
    texture_resolution: 2048,
    shadows: true,
    reflections: true,
    particles: true,
    post_processing: true,
    antialiasing: true,
    max_lights: 8,
    shadow_map_size: 2048,
    post_process_quality: 1.0,
};
