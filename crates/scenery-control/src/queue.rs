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

//! Priority-ordered queue of scenes awaiting a load slot.

use std::collections::VecDeque;

use scenery_core::{Millis, SceneId};

/// A scene waiting for a free load slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadingQueueItem {
    /// The waiting scene.
    pub scene_id: SceneId,
    /// Effective priority, 1 is the most urgent.
    pub priority: u8,
    /// When the scene was enqueued.
    pub enqueued_at_ms: Millis,
}

/// Queue ordered by ascending priority value. Items of equal priority keep
/// their insertion order, and a scene appears at most once.
#[derive(Debug, Default)]
pub struct LoadingQueue {
    items: VecDeque<LoadingQueueItem>,
}

impl LoadingQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `item` behind every entry of equal or better priority. An
    /// existing entry for the same scene is replaced.
    pub fn push(&mut self, item: LoadingQueueItem) {
        self.remove(&item.scene_id);
        let index = self
            .items
            .iter()
            .position(|queued| queued.priority > item.priority)
            .unwrap_or(self.items.len());
        self.items.insert(index, item);
    }

    /// Takes the most urgent item.
    pub fn pop_front(&mut self) -> Option<LoadingQueueItem> {
        self.items.pop_front()
    }

    /// Drops the entry for `scene_id`, returning whether one existed.
    pub fn remove(&mut self, scene_id: &SceneId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| &item.scene_id != scene_id);
        self.items.len() != before
    }

    pub fn contains(&self, scene_id: &SceneId) -> bool {
        self.items.iter().any(|item| &item.scene_id == scene_id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Scene ids in dequeue order.
    pub fn scene_ids(&self) -> impl Iterator<Item = &SceneId> {
        self.items.iter().map(|item| &item.scene_id)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
