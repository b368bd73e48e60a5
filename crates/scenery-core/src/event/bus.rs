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

use super::SceneEvent;
use crate::scene::SceneId;
use std::collections::HashMap;

/// Identifies one subscription on a [`SceneEventBus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// The receiving end of a subscription to one scene's events.
///
/// Dropping it is enough to stop receiving; the bus prunes closed channels on
/// the next publish.
#[derive(Debug)]
pub struct SceneSubscription {
    id: SubscriptionId,
    scene_id: SceneId,
    receiver: flume::Receiver<SceneEvent>,
}

impl SceneSubscription {
    /// Returns the subscription identifier.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Returns the scene this subscription listens to.
    pub fn scene_id(&self) -> &SceneId {
        &self.scene_id
    }

    /// Drains every event delivered so far, oldest first.
    pub fn drain(&self) -> Vec<SceneEvent> {
        self.receiver.try_iter().collect()
    }

    /// Returns `true` once the bus has dropped this subscription.
    pub fn is_closed(&self) -> bool {
        self.receiver.is_disconnected()
    }
}

/// Manages typed, per-scene event channels.
///
/// Unlike a global broadcast medium, each subscriber only ever sees the
/// events of the scene it subscribed to.
#[derive(Debug, Default)]
pub struct SceneEventBus {
    channels: HashMap<SceneId, Vec<(SubscriptionId, flume::Sender<SceneEvent>)>>,
    next_id: u64,
}

impl SceneEventBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new unbounded channel for the given scene.
    pub fn subscribe(&mut self, scene_id: SceneId) -> SceneSubscription {
        let (sender, receiver) = flume::unbounded();
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.channels
            .entry(scene_id.clone())
            .or_default()
            .push((id, sender));
        log::trace!("Subscription {:?} opened for scene '{}'.", id, scene_id);
        SceneSubscription {
            id,
            scene_id,
            receiver,
        }
    }

    /// Closes a subscription. Unknown subscriptions are ignored.
    pub fn unsubscribe(&mut self, scene_id: &SceneId, id: SubscriptionId) {
        if let Some(senders) = self.channels.get_mut(scene_id) {
            senders.retain(|(sub_id, _)| *sub_id != id);
            if senders.is_empty() {
                self.channels.remove(scene_id);
            }
        }
    }

    /// Closes every subscription of a scene.
    pub fn close_scene(&mut self, scene_id: &SceneId) {
        self.channels.remove(scene_id);
    }

    /// Delivers an event to every live subscriber of its scene.
    ///
    /// Returns the number of subscribers reached.
    pub fn publish(&mut self, event: SceneEvent) -> usize {
        let Some(senders) = self.channels.get_mut(&event.scene_id) else {
            log::trace!("No listeners for scene '{}'.", event.scene_id);
            return 0;
        };

        senders.retain(|(_, sender)| sender.send(event.clone()).is_ok());
        let delivered = senders.len();
        if delivered == 0 {
            self.channels.remove(&event.scene_id);
        }
        delivered
    }

    /// Returns the number of open subscriptions for a scene.
    pub fn subscriber_count(&self, scene_id: &SceneId) -> usize {
        self.channels.get(scene_id).map_or(0, Vec::len)
    }

    /// Returns the total number of open subscriptions.
    pub fn len(&self) -> usize {
        self.channels.values().map(Vec::len).sum()
    }

    /// Returns `true` if no subscription is open.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Drops every channel; all subscriptions observe disconnection.
    pub fn clear(&mut self) {
        self.channels.clear();
    }
}
