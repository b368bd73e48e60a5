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

//! # Scenery Control
//!
//! The scene manager: the authoritative registry of every known scene, the
//! priority queue that sequences loads under a concurrency cap, and the
//! feedback loop that adapts that cap and the quality tier to measured
//! runtime performance.

pub mod async_loader;
pub mod catalog;
pub mod config;
pub mod loader;
pub mod manager;
pub mod queue;
pub mod recording;

pub use async_loader::AsyncSceneLoader;
pub use catalog::SceneCatalog;
pub use config::SceneManagerConfig;
pub use loader::{LoadCompletion, LoadOutcome, LoadRequest, LoadTicket, SceneLoader};
pub use manager::SceneManager;
pub use queue::{LoadingQueue, LoadingQueueItem};
pub use recording::{LoadRecorder, RecordingLoader};
