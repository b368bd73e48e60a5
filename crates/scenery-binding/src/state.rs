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

//! Render state derived from a scene's lifecycle events.

use scenery_core::{QualityTier, SceneEventKind};

/// What a component needs to decide how to render its scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingState {
    /// A load is in flight.
    pub is_loading: bool,
    /// The scene is loaded.
    pub is_loaded: bool,
    /// The last load failed or timed out.
    pub has_error: bool,
    /// The component is in view and should render the scene.
    pub should_render: bool,
    /// Current quality tier of the scene.
    pub quality: QualityTier,
    /// The fallback image or spinner should be shown.
    pub fallback_visible: bool,
}

impl BindingState {
    /// State of a freshly mounted component: nothing loaded, fallback shown.
    pub fn initial(quality: QualityTier) -> Self {
        Self {
            is_loading: false,
            is_loaded: false,
            has_error: false,
            should_render: false,
            quality,
            fallback_visible: true,
        }
    }

    /// Folds one lifecycle event into the state.
    pub fn apply(&mut self, kind: &SceneEventKind) {
        match kind {
            SceneEventKind::Loaded => {
                self.is_loaded = true;
                self.is_loading = false;
                self.has_error = false;
                self.fallback_visible = false;
            }
            SceneEventKind::Error(_) => {
                self.has_error = true;
                self.is_loading = false;
                self.fallback_visible = true;
            }
            SceneEventKind::Quality(quality) => self.quality = *quality,
            SceneEventKind::Unloaded => {
                self.is_loaded = false;
                self.is_loading = false;
                self.fallback_visible = true;
            }
        }
    }

    /// The state as presented, with reduced motion forcing the fallback.
    pub fn effective(&self, reduced_motion: bool) -> Self {
        Self {
            should_render: self.should_render && !reduced_motion,
            fallback_visible: self.fallback_visible || reduced_motion,
            ..*self
        }
    }

    /// Whether the fallback should replace the scene.
    pub fn should_use_fallback(&self, reduced_motion: bool) -> bool {
        reduced_motion || self.has_error || self.fallback_visible
    }
}

impl Default for BindingState {
    fn default() -> Self {
        Self::initial(QualityTier::Medium)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenery_core::{SceneError, SceneId};

    fn timeout() -> SceneEventKind {
        SceneEventKind::Error(SceneError::LoadTimeout {
            scene_id: SceneId::from("hero"),
            timeout_ms: 10_000,
        })
    }

    #[test]
    fn lifecycle_transitions() {
        let mut state = BindingState::initial(QualityTier::High);
        state.is_loading = true;

        state.apply(&SceneEventKind::Loaded);
        assert!(state.is_loaded && !state.is_loading && !state.fallback_visible);

        state.apply(&SceneEventKind::Quality(QualityTier::Low));
        assert_eq!(state.quality, QualityTier::Low);

        state.apply(&SceneEventKind::Unloaded);
        assert!(!state.is_loaded && state.fallback_visible);
    }

    #[test]
    fn error_shows_fallback_until_a_successful_load() {
        let mut state = BindingState::default();
        state.apply(&timeout());
        assert!(state.has_error && state.fallback_visible);
        assert!(state.should_use_fallback(false));

        state.apply(&SceneEventKind::Loaded);
        assert!(!state.has_error);
        assert!(!state.should_use_fallback(false));
    }

    #[test]
    fn reduced_motion_overrides_rendering() {
        let mut state = BindingState::default();
        state.should_render = true;
        state.fallback_visible = false;

        let presented = state.effective(true);
        assert!(!presented.should_render);
        assert!(presented.fallback_visible);
        assert!(state.should_use_fallback(true));

        assert_eq!(state.effective(false), state);
    }
}
