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

//! In-memory [`SceneLoader`] whose loads are resolved by hand.
//!
//! Useful to drive a [`SceneManager`](crate::SceneManager) deterministically
//! together with a [`ManualClock`](scenery_core::ManualClock).

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use scenery_core::SceneId;

use crate::loader::{LoadCompletion, LoadRequest, LoadTicket, SceneLoader};

#[derive(Debug, Default)]
struct RecorderState {
    requests: Vec<LoadRequest>,
    cancelled: Vec<(SceneId, LoadTicket)>,
    pending: Vec<LoadCompletion>,
}

/// Shared view of everything a [`RecordingLoader`] was asked to do.
#[derive(Debug, Default, Clone)]
pub struct LoadRecorder {
    state: Arc<Mutex<RecorderState>>,
}

impl LoadRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A loader feeding this recorder.
    pub fn loader(&self) -> RecordingLoader {
        RecordingLoader {
            recorder: self.clone(),
        }
    }

    /// Every load request, in the order the loads started.
    pub fn requests(&self) -> Vec<LoadRequest> {
        self.lock().requests.clone()
    }

    /// Ids of started loads, in start order.
    pub fn started(&self) -> Vec<String> {
        self.lock()
            .requests
            .iter()
            .map(|request| request.scene_id.as_str().to_owned())
            .collect()
    }

    /// Ids of cancelled loads, in cancellation order.
    pub fn cancelled(&self) -> Vec<String> {
        self.lock()
            .cancelled
            .iter()
            .map(|(id, _)| id.as_str().to_owned())
            .collect()
    }

    /// Number of loads not resolved yet.
    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }

    /// Resolves the oldest unresolved load of `id` successfully.
    pub fn succeed(&self, id: &str) -> bool {
        match self.take(id) {
            Some(completion) => {
                completion.succeed();
                true
            }
            None => false,
        }
    }

    /// Resolves the oldest unresolved load of `id` with a failure.
    pub fn fail(&self, id: &str, reason: &str) -> bool {
        match self.take(id) {
            Some(completion) => {
                completion.fail(reason);
                true
            }
            None => false,
        }
    }

    fn take(&self, id: &str) -> Option<LoadCompletion> {
        let mut state = self.lock();
        let index = state
            .pending
            .iter()
            .position(|completion| completion.scene_id().as_str() == id)?;
        Some(state.pending.remove(index))
    }

    fn lock(&self) -> MutexGuard<'_, RecorderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// [`SceneLoader`] that records requests and holds their completions until
/// the test resolves them through its [`LoadRecorder`].
#[derive(Debug)]
pub struct RecordingLoader {
    recorder: LoadRecorder,
}

impl SceneLoader for RecordingLoader {
    fn begin_load(&mut self, request: LoadRequest, completion: LoadCompletion) {
        let mut state = self.recorder.lock();
        state.requests.push(request);
        state.pending.push(completion);
    }

    fn cancel(&mut self, scene_id: &SceneId, ticket: LoadTicket) {
        self.recorder
            .lock()
            .cancelled
            .push((scene_id.clone(), ticket));
    }
}
