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

//! Defines the error taxonomy of the scene-loading subsystem.
//!
//! Only load errors ever reach consumers (through the `error` notification).
//! Capability and callback failures are recovered where they happen and are
//! logged with these variants so they read the same way in the logs.

use crate::clock::Millis;
use crate::scene::SceneId;
use thiserror::Error;

/// An error produced while detecting capabilities, loading a scene, or
/// notifying a consumer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
    /// Probing the host environment failed; the detector degrades to the
    /// most conservative capability profile.
    #[error("Capability detection failed: {0}")]
    CapabilityDetection(String),

    /// A scene did not finish loading before its deadline.
    #[error("Scene '{scene_id}' loading timeout after {timeout_ms}ms")]
    LoadTimeout {
        /// The scene that timed out.
        scene_id: SceneId,
        /// The deadline that was exceeded.
        timeout_ms: Millis,
    },

    /// The external engine rejected the load.
    #[error("Scene '{scene_id}' failed to load: {reason}")]
    LoadFailure {
        /// The scene that failed.
        scene_id: SceneId,
        /// The engine-provided reason.
        reason: String,
    },

    /// A consumer-supplied callback returned an error or panicked.
    #[error("Callback '{callback}' failed: {reason}")]
    Callback {
        /// The name of the callback that failed.
        callback: &'static str,
        /// What went wrong.
        reason: String,
    },
}

impl SceneError {
    /// Returns the scene this error belongs to, if any.
    pub fn scene_id(&self) -> Option<&SceneId> {
        match self {
            SceneError::LoadTimeout { scene_id, .. } | SceneError::LoadFailure { scene_id, .. } => {
                Some(scene_id)
            }
            SceneError::CapabilityDetection(_) | SceneError::Callback { .. } => None,
        }
    }

    /// Returns `true` if the error leaves the scene eligible for a retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SceneError::LoadTimeout { .. } | SceneError::LoadFailure { .. }
        )
    }
}
