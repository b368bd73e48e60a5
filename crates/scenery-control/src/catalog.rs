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

//! Named scene configurations loaded from JSON.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use scenery_core::{SceneConfig, SceneId};
use serde::Deserialize;

/// A set of scene configurations keyed by scene id.
///
/// ```json
/// {
///   "hero":  { "url": "https://cdn.example/hero.splinecode", "priority": "critical", "preload": true },
///   "about": { "url": "https://cdn.example/about.splinecode", "priority": "low", "fallback_image": "/about.png" }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct SceneCatalog {
    scenes: BTreeMap<SceneId, SceneConfig>,
}

impl SceneCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let catalog: Self = serde_json::from_str(json).context("Failed to parse scene catalog")?;
        for (id, config) in catalog.iter() {
            ensure!(!config.url.is_empty(), "Scene '{}' has an empty url", id);
        }
        Ok(catalog)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene catalog {}", path.display()))?;
        Self::from_json_str(&json)
    }

    /// Adds or replaces a scene.
    pub fn insert(&mut self, id: impl Into<SceneId>, config: SceneConfig) -> Option<SceneConfig> {
        self.scenes.insert(id.into(), config)
    }

    pub fn get(&self, id: &SceneId) -> Option<&SceneConfig> {
        self.scenes.get(id)
    }

    /// Scenes in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&SceneId, &SceneConfig)> {
        self.scenes.iter()
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}
