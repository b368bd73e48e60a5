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

//! Binding of one scene to one presentation component.

use scenery_control::SceneManager;
use scenery_core::{
    ContainerHandle, PriorityClass, QualityTier, SceneConfig, SceneEvent, SceneId, SceneStatus,
    SceneSubscription,
};
use scenery_telemetry::{select_quality_tier, DeviceCapabilities};
use tokio::sync::watch;

use crate::state::BindingState;

/// Distance around the viewport at which a container already counts as
/// visible, so loading starts before the component scrolls into view.
pub const DEFAULT_ROOT_MARGIN_PX: u32 = 200;

/// Host primitive reporting viewport visibility of a container.
///
/// Visibility transitions are delivered by calling
/// [`SceneBinding::on_intersection`].
pub trait IntersectionObserver: Send {
    /// Starts watching `container`, treating it as visible while it is
    /// within `root_margin_px` of the viewport.
    fn observe(&mut self, container: &ContainerHandle, root_margin_px: u32);
    /// Stops watching.
    fn disconnect(&mut self);
}

/// How a component wants its scene registered.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingOptions {
    /// The scene to bind.
    pub scene_id: SceneId,
    /// Where the scene is fetched from.
    pub url: String,
    /// Urgency class.
    pub priority: PriorityClass,
    /// Explicit quality tier. Derived from the device capabilities if unset.
    pub quality: Option<QualityTier>,
    /// Image shown while the scene is unavailable.
    pub fallback_image: Option<String>,
    /// Load without waiting for visibility.
    pub preload: bool,
    /// Pre-trigger margin handed to the intersection observer.
    pub root_margin_px: u32,
}

impl BindingOptions {
    /// Options with medium priority and capability-derived quality.
    pub fn new(scene_id: impl Into<SceneId>, url: impl Into<String>) -> Self {
        Self {
            scene_id: scene_id.into(),
            url: url.into(),
            priority: PriorityClass::Medium,
            quality: None,
            fallback_image: None,
            preload: false,
            root_margin_px: DEFAULT_ROOT_MARGIN_PX,
        }
    }

    /// Sets the priority class.
    pub fn with_priority(mut self, priority: PriorityClass) -> Self {
        self.priority = priority;
        self
    }

    /// Pins the quality tier.
    pub fn with_quality(mut self, quality: QualityTier) -> Self {
        self.quality = Some(quality);
        self
    }

    /// Sets the fallback image.
    pub fn with_fallback_image(mut self, image: impl Into<String>) -> Self {
        self.fallback_image = Some(image.into());
        self
    }

    /// Sets the preload flag.
    pub fn with_preload(mut self, preload: bool) -> Self {
        self.preload = preload;
        self
    }

    /// Sets the intersection pre-trigger margin.
    pub fn with_root_margin(mut self, root_margin_px: u32) -> Self {
        self.root_margin_px = root_margin_px;
        self
    }

    pub(crate) fn resolve_quality(&self, capabilities: &DeviceCapabilities) -> QualityTier {
        self.quality
            .unwrap_or_else(|| select_quality_tier(capabilities))
    }

    pub(crate) fn scene_config(&self, quality: QualityTier) -> SceneConfig {
        let config = SceneConfig::new(self.url.clone())
            .with_priority(self.priority)
            .with_preload(self.preload)
            .with_quality(quality);
        match &self.fallback_image {
            Some(image) => config.with_fallback_image(image.clone()),
            None => config,
        }
    }
}

/// Keeps one component's render state in step with its scene.
///
/// The component forwards visibility changes through
/// [`on_intersection`](Self::on_intersection) and calls
/// [`sync`](Self::sync) after each manager update to pick up lifecycle
/// events. [`state`](Self::state) is what the component renders from.
///
/// Call [`unmount`](Self::unmount) or [`dispose`](Self::dispose) when the
/// component goes away. Dropping a mounted binding only disconnects the
/// observer: the scene stays registered in the manager, loaded if it was.
pub struct SceneBinding {
    scene_id: SceneId,
    container: ContainerHandle,
    observer: Box<dyn IntersectionObserver>,
    subscription: Option<SceneSubscription>,
    reduced_motion: watch::Receiver<bool>,
    state: BindingState,
}

impl SceneBinding {
    /// Registers the scene and starts observing the container.
    pub fn mount(
        manager: &mut SceneManager,
        options: BindingOptions,
        capabilities: &DeviceCapabilities,
        container: ContainerHandle,
        mut observer: Box<dyn IntersectionObserver>,
        reduced_motion: watch::Receiver<bool>,
    ) -> Self {
        let quality = options.resolve_quality(capabilities);
        let scene_id = options.scene_id.clone();

        let subscription = manager.subscribe(&scene_id);
        manager.register_scene(
            scene_id.clone(),
            options.scene_config(quality),
            Some(container.clone()),
        );
        observer.observe(&container, options.root_margin_px);
        log::debug!(
            "Mounted binding for '{}' at {} quality.",
            scene_id,
            quality
        );

        let mut binding = Self {
            scene_id,
            container,
            observer,
            subscription: Some(subscription),
            reduced_motion,
            state: BindingState::initial(quality),
        };
        binding.refresh_reduced_motion();
        binding
    }

    /// Handles a visibility transition of the container.
    pub fn on_intersection(&mut self, manager: &mut SceneManager, is_intersecting: bool) {
        if !self.is_mounted() {
            return;
        }
        if is_intersecting {
            manager.request_scene(&self.scene_id, Some(self.container.clone()));
            self.state.should_render = true;
        } else {
            manager.unload_scene(&self.scene_id, false);
            self.state.should_render = false;
        }
    }

    /// Applies every lifecycle event received since the last call and
    /// re-reads the reduced-motion preference. Returns the applied events.
    pub fn sync(&mut self) -> Vec<SceneEvent> {
        let Some(subscription) = &self.subscription else {
            return Vec::new();
        };
        let events: Vec<SceneEvent> = subscription
            .drain()
            .into_iter()
            .filter(|event| event.scene_id == self.scene_id)
            .collect();
        for event in &events {
            log::trace!("Binding '{}' applying {:?}", self.scene_id, event.kind);
            self.state.apply(&event.kind);
        }
        self.refresh_reduced_motion();
        events
    }

    /// Requests the scene again, typically as a manual retry after an error.
    pub fn load_scene(&mut self, manager: &mut SceneManager) {
        if !self.is_mounted() {
            return;
        }
        manager.request_scene(&self.scene_id, Some(self.container.clone()));
        self.state.should_render = true;
        self.state.is_loading = true;
    }

    /// Unloads the scene immediately.
    pub fn unload_scene(&mut self, manager: &mut SceneManager) {
        if !self.is_mounted() {
            return;
        }
        manager.unload_scene(&self.scene_id, true);
        self.state.is_loaded = false;
        self.state.is_loading = false;
        self.state.should_render = false;
        self.state.fallback_visible = true;
    }

    /// The manager's view of the scene.
    pub fn status(&self, manager: &SceneManager) -> Option<SceneStatus> {
        manager.scene_status(&self.scene_id)
    }

    /// The state to render from, with the reduced-motion override applied.
    pub fn state(&self) -> BindingState {
        self.state.effective(self.reduced_motion())
    }

    /// Whether the fallback should replace the scene.
    pub fn should_use_fallback(&self) -> bool {
        self.state.should_use_fallback(self.reduced_motion())
    }

    /// Current reduced-motion preference.
    pub fn reduced_motion(&self) -> bool {
        *self.reduced_motion.borrow()
    }

    /// The bound scene.
    pub fn scene_id(&self) -> &SceneId {
        &self.scene_id
    }

    /// Whether [`unmount`](Self::unmount) has not been called yet.
    pub fn is_mounted(&self) -> bool {
        self.subscription.is_some()
    }

    /// Disconnects the observer, drops the subscription and unloads the
    /// scene without delay.
    pub fn unmount(mut self, manager: &mut SceneManager) {
        if let Some(subscription) = self.subscription.take() {
            self.observer.disconnect();
            manager.unsubscribe(&subscription);
            manager.unload_scene(&self.scene_id, true);
            log::debug!("Unmounted binding for '{}'.", self.scene_id);
        }
    }

    /// Like [`unmount`](Self::unmount), but also removes the scene from the
    /// manager. Use it when no other component will mount the same scene.
    pub fn dispose(mut self, manager: &mut SceneManager) {
        if let Some(subscription) = self.subscription.take() {
            self.observer.disconnect();
            manager.unsubscribe(&subscription);
            manager.dispose_scene(&self.scene_id);
            log::debug!("Disposed binding for '{}'.", self.scene_id);
        }
    }

    fn refresh_reduced_motion(&mut self) {
        if *self.reduced_motion.borrow_and_update() {
            self.state.should_render = false;
            self.state.fallback_visible = true;
        }
    }
}

impl Drop for SceneBinding {
    fn drop(&mut self) {
        if self.subscription.is_some() {
            log::debug!(
                "Binding for '{}' dropped while mounted, disconnecting observer.",
                self.scene_id
            );
            self.observer.disconnect();
        }
    }
}

impl std::fmt::Debug for SceneBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneBinding")
            .field("scene_id", &self.scene_id)
            .field("state", &self.state)
            .field("mounted", &self.is_mounted())
            .finish_non_exhaustive()
    }
}
