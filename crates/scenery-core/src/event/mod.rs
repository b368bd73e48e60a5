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

//! Per-scene publish/subscribe channels for scene state transitions.
//!
//! The manager owns one [`SceneEventBus`]. Every listener subscribes to a
//! single scene id and receives that scene's events, in transition order,
//! over its own channel. The manager never holds references to UI code.

mod bus;

pub use self::bus::{SceneEventBus, SceneSubscription, SubscriptionId};

use crate::clock::Millis;
use crate::error::SceneError;
use crate::quality::QualityTier;
use crate::scene::SceneId;

/// The kind of state transition being reported.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEventKind {
    /// The scene finished loading.
    Loaded,
    /// The scene failed to load or timed out.
    Error(SceneError),
    /// The scene's quality tier changed.
    Quality(QualityTier),
    /// The scene was unloaded.
    Unloaded,
}

/// A state transition of one scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneEvent {
    /// The scene the event belongs to.
    pub scene_id: SceneId,
    /// What happened.
    pub kind: SceneEventKind,
    /// When it happened.
    pub at_ms: Millis,
}

impl SceneEvent {
    /// Creates a new event.
    pub fn new(scene_id: SceneId, kind: SceneEventKind, at_ms: Millis) -> Self {
        Self {
            scene_id,
            kind,
            at_ms,
        }
    }
}
