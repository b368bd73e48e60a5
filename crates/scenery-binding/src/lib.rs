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

//! # Scenery Binding
//!
//! Presentation-side adapters. A [`SceneBinding`] ties one scene to one
//! component: it registers the scene, follows the component's visibility,
//! folds the scene's lifecycle events into a [`BindingState`] and honours the
//! reduced-motion preference. [`SceneBindingGroup`] does the same for a set of
//! container-less scenes.

#![warn(missing_docs)]

pub mod binding;
pub mod group;
pub mod state;

pub use binding::{BindingOptions, IntersectionObserver, SceneBinding, DEFAULT_ROOT_MARGIN_PX};
pub use group::{PinnedContainer, SceneBindingGroup};
pub use state::BindingState;
