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

//! The contract between the scene manager and whatever fetches scene assets.
//!
//! The manager hands a [`LoadRequest`] and a one-shot [`LoadCompletion`] to
//! its [`SceneLoader`]. The loader may resolve the completion synchronously or
//! from any thread later on; the outcome travels back over a channel and is
//! applied on the manager's next `update`. Every load carries a
//! [`LoadTicket`], so a completion that arrives after its load was cancelled,
//! timed out or superseded is recognised and discarded.

use std::fmt;
use std::sync::Arc;

use crossbeam_channel::Sender;
use scenery_core::{Clock, Millis, QualityTier, SceneId};

/// Identifies one load attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadTicket(pub(crate) u64);

impl LoadTicket {
    /// Wraps a raw ticket value. The manager issues tickets itself; this is
    /// for driving loaders directly.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

/// What to load.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub scene_id: SceneId,
    pub url: String,
    /// Quality tier the scene should be prepared at.
    pub quality: QualityTier,
    pub ticket: LoadTicket,
}

/// The result of one load attempt, stamped with the time it resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOutcome {
    pub scene_id: SceneId,
    pub ticket: LoadTicket,
    pub completed_at_ms: Millis,
    pub result: Result<(), String>,
}

/// One-shot handle used by a loader to report the outcome of a load.
pub struct LoadCompletion {
    scene_id: SceneId,
    ticket: LoadTicket,
    clock: Arc<dyn Clock>,
    sender: Sender<LoadOutcome>,
}

impl LoadCompletion {
    pub(crate) fn new(
        scene_id: SceneId,
        ticket: LoadTicket,
        clock: Arc<dyn Clock>,
        sender: Sender<LoadOutcome>,
    ) -> Self {
        Self {
            scene_id,
            ticket,
            clock,
            sender,
        }
    }

    pub fn scene_id(&self) -> &SceneId {
        &self.scene_id
    }

    pub fn ticket(&self) -> LoadTicket {
        self.ticket
    }

    /// Reports a successful load.
    pub fn succeed(self) {
        self.send(Ok(()));
    }

    /// Reports a failed load.
    pub fn fail(self, reason: impl Into<String>) {
        self.send(Err(reason.into()));
    }

    /// Reports the outcome of a fallible fetch.
    pub fn finish(self, result: anyhow::Result<()>) {
        self.send(result.map_err(|e| format!("{e:#}")));
    }

    fn send(self, result: Result<(), String>) {
        let outcome = LoadOutcome {
            scene_id: self.scene_id,
            ticket: self.ticket,
            completed_at_ms: self.clock.now_ms(),
            result,
        };
        if self.sender.send(outcome).is_err() {
            log::trace!("Load outcome dropped, scene manager is gone");
        }
    }
}

impl fmt::Debug for LoadCompletion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadCompletion")
            .field("scene_id", &self.scene_id)
            .field("ticket", &self.ticket)
            .finish_non_exhaustive()
    }
}

/// Fetches scene assets on behalf of the manager.
pub trait SceneLoader: Send {
    /// Starts loading `request`. The loader must eventually resolve
    /// `completion` or drop it; a dropped completion surfaces as a timeout.
    fn begin_load(&mut self, request: LoadRequest, completion: LoadCompletion);

    /// Abandons the load identified by `ticket`. Any outcome reported for it
    /// afterwards is ignored, so implementing this is an optimisation.
    fn cancel(&mut self, _scene_id: &SceneId, _ticket: LoadTicket) {}
}
