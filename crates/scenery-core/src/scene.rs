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

//! Scene identity, configuration and status snapshots.

use crate::clock::Millis;
use crate::quality::QualityTier;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use std::sync::Arc;

/// A unique, human-readable scene identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneId(String);

impl SceneId {
    /// Creates a new identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SceneId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for SceneId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Qualitative urgency label of a scene.
///
/// Unknown labels read from configuration map to [`PriorityClass::Medium`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum PriorityClass {
    /// Above-the-fold content, always loaded first.
    Critical,
    /// Important content, loaded eagerly.
    High,
    /// Regular content, loaded when visible.
    #[default]
    Medium,
    /// Decorative content, first to be evicted.
    Low,
}

impl PriorityClass {
    /// Returns the queue rank of the class; lower is more urgent.
    ///
    /// | Class | Rank |
    /// |---|---|
    /// | critical | 1 |
    /// | high | 2 |
    /// | medium | 3 |
    /// | low | 4 |
    pub fn rank(self) -> u8 {
        match self {
            PriorityClass::Critical => 1,
            PriorityClass::High => 2,
            PriorityClass::Medium => 3,
            PriorityClass::Low => 4,
        }
    }

    /// Parses a class name, falling back to `medium` for unknown names.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "critical" => PriorityClass::Critical,
            "high" => PriorityClass::High,
            "medium" => PriorityClass::Medium,
            "low" => PriorityClass::Low,
            other => {
                log::debug!("Unknown priority class '{}', using medium.", other);
                PriorityClass::Medium
            }
        }
    }

    /// Returns `true` for classes that eviction must never touch.
    pub fn is_protected(self) -> bool {
        matches!(self, PriorityClass::Critical | PriorityClass::High)
    }
}

impl From<String> for PriorityClass {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

/// Immutable configuration supplied when a scene is registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Location of the scene, handed verbatim to the loader.
    pub url: String,
    /// Urgency class.
    #[serde(default)]
    pub priority: PriorityClass,
    /// Whether the scene should be queued as soon as it is registered.
    #[serde(default)]
    pub preload: bool,
    /// Initial quality tier of the scene.
    #[serde(default)]
    pub quality: QualityTier,
    /// Image shown while the scene is not rendered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_image: Option<String>,
}

impl SceneConfig {
    /// Creates a configuration with default class, quality and no preload.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            priority: PriorityClass::default(),
            preload: false,
            quality: QualityTier::default(),
            fallback_image: None,
        }
    }

    /// Sets the priority class.
    pub fn with_priority(mut self, priority: PriorityClass) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the preload flag.
    pub fn with_preload(mut self, preload: bool) -> Self {
        self.preload = preload;
        self
    }

    /// Sets the initial quality tier.
    pub fn with_quality(mut self, quality: QualityTier) -> Self {
        self.quality = quality;
        self
    }

    /// Sets the fallback image.
    pub fn with_fallback_image(mut self, image: impl Into<String>) -> Self {
        self.fallback_image = Some(image.into());
        self
    }
}

/// The UI element a scene is painted into.
///
/// Implemented by the presentation layer; the manager only asks whether the
/// element currently intersects the viewport.
pub trait SceneContainer: Send + Sync + Debug {
    /// Returns `true` if the element is currently inside the viewport.
    fn intersects_viewport(&self) -> bool;
}

/// A shared, opaque handle to a [`SceneContainer`].
pub type ContainerHandle = Arc<dyn SceneContainer>;

/// A read-only snapshot of a registered scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneStatus {
    /// The scene identifier.
    pub id: SceneId,
    /// The registration config.
    pub config: SceneConfig,
    /// Whether the scene is loaded.
    pub loaded: bool,
    /// Whether a load is in flight.
    pub loading: bool,
    /// The scene's current quality tier.
    pub quality: QualityTier,
    /// The base queue rank derived from the priority class.
    pub priority: u8,
    /// Last time the scene was requested or started loading.
    pub last_used_ms: Millis,
}
