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

//! # Scenery Core
//!
//! Foundational crate containing the types and interface contracts shared by
//! the scene manager, the performance monitor and the UI bindings.

#![warn(missing_docs)]

pub mod clock;
pub mod error;
pub mod event;
pub mod quality;
pub mod scene;
pub mod telemetry;

pub use clock::{Clock, ManualClock, Millis, SystemClock};
pub use error::SceneError;
pub use event::{SceneEvent, SceneEventBus, SceneEventKind, SceneSubscription, SubscriptionId};
pub use quality::{QualitySettings, QualityTier};
pub use scene::{ContainerHandle, PriorityClass, SceneConfig, SceneContainer, SceneId, SceneStatus};
pub use telemetry::PerformanceMetrics;
