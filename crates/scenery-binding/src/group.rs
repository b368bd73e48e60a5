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

//! Several container-less scenes managed as one unit.

use std::collections::BTreeMap;
use std::sync::Arc;

use scenery_control::SceneManager;
use scenery_core::{ContainerHandle, SceneContainer, SceneEvent, SceneId, SceneSubscription};
use scenery_telemetry::DeviceCapabilities;

use crate::binding::BindingOptions;
use crate::state::BindingState;

/// Container that always reports itself in view.
///
/// Attached by [`SceneBindingGroup::load_all`], so an explicit request loads
/// scenes that have no component of their own.
#[derive(Debug, Default, Clone, Copy)]
pub struct PinnedContainer;

impl SceneContainer for PinnedContainer {
    fn intersects_viewport(&self) -> bool {
        true
    }
}

#[derive(Debug)]
struct GroupEntry {
    subscription: SceneSubscription,
    state: BindingState,
}

/// Registers a set of scenes and tracks a [`BindingState`] for each.
#[derive(Debug)]
pub struct SceneBindingGroup {
    entries: BTreeMap<SceneId, GroupEntry>,
}

impl SceneBindingGroup {
    /// Registers every scene of `scenes` without a container.
    pub fn register(
        manager: &mut SceneManager,
        scenes: impl IntoIterator<Item = BindingOptions>,
        capabilities: &DeviceCapabilities,
    ) -> Self {
        let mut entries = BTreeMap::new();
        for options in scenes {
            let quality = options.resolve_quality(capabilities);
            let subscription = manager.subscribe(&options.scene_id);
            manager.register_scene(options.scene_id.clone(), options.scene_config(quality), None);
            entries.insert(
                options.scene_id,
                GroupEntry {
                    subscription,
                    state: BindingState::initial(quality),
                },
            );
        }
        log::debug!("Registered a group of {} scenes.", entries.len());
        Self { entries }
    }

    /// State of `id`, or the initial state if the scene is not in the group.
    pub fn state(&self, id: &SceneId) -> BindingState {
        self.entries
            .get(id)
            .map(|entry| entry.state)
            .unwrap_or_default()
    }

    /// Applies pending lifecycle events of every scene and returns them.
    pub fn sync(&mut self) -> Vec<SceneEvent> {
        let mut applied = Vec::new();
        for (id, entry) in &mut self.entries {
            for event in entry.subscription.drain() {
                if &event.scene_id != id {
                    continue;
                }
                entry.state.apply(&event.kind);
                applied.push(event);
            }
        }
        applied
    }

    /// Requests every scene of the group.
    pub fn load_all(&self, manager: &mut SceneManager) {
        let pinned: ContainerHandle = Arc::new(PinnedContainer);
        for id in self.entries.keys() {
            manager.request_scene(id, Some(Arc::clone(&pinned)));
        }
    }

    /// Unloads every scene of the group immediately.
    pub fn unload_all(&self, manager: &mut SceneManager) {
        for id in self.entries.keys() {
            manager.unload_scene(id, true);
        }
    }

    /// Unsubscribes and unloads every scene of the group.
    pub fn release(self, manager: &mut SceneManager) {
        for (id, entry) in self.entries {
            manager.unsubscribe(&entry.subscription);
            manager.unload_scene(&id, true);
        }
    }

    /// Scene ids of the group, in id order.
    pub fn scene_ids(&self) -> impl Iterator<Item = &SceneId> {
        self.entries.keys()
    }

    /// Number of scenes in the group.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the group is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
