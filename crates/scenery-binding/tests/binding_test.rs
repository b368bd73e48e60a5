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


//! Integration tests for SceneBinding and SceneBindingGroup driven against a
//! real SceneManager with hand-resolved loads.

use scenery_binding::{BindingOptions, IntersectionObserver, SceneBinding, SceneBindingGroup};
use scenery_control::{LoadRecorder, SceneManager, SceneManagerConfig};
use scenery_core::{
    ContainerHandle, ManualClock, PriorityClass, QualityTier, SceneContainer, SceneEventKind,
    SceneId,
};
use scenery_telemetry::{ConnectionClass, DeviceCapabilities, NullMemoryProbe};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// Helper: a manager whose performance checkpoints never fire.
fn manager() -> (SceneManager, ManualClock, LoadRecorder) {
    let mut config = SceneManagerConfig::default();
    config.monitor.check_interval_ms = 24 * 3_600_000;
    let clock = ManualClock::new(0);
    let recorder = LoadRecorder::new();
    let manager = SceneManager::new(
        config,
        Arc::new(clock.clone()),
        Box::new(recorder.loader()),
        Box::new(NullMemoryProbe),
    );
    (manager, clock, recorder)
}

fn capable_device() -> DeviceCapabilities {
    DeviceCapabilities {
        supports_basic_3d: true,
        supports_advanced_3d: true,
        memory_gb: 16.0,
        cpu_cores: 8,
        connection: ConnectionClass::Fast,
    }
}

#[derive(Debug)]
struct OnScreen;

impl SceneContainer for OnScreen {
    fn intersects_viewport(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Default)]
struct ObserverLog(Arc<Mutex<Vec<String>>>);

impl ObserverLog {
    fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

struct RecordingObserver(ObserverLog);

impl IntersectionObserver for RecordingObserver {
    fn observe(&mut self, _container: &ContainerHandle, root_margin_px: u32) {
        self.0 .0.lock().unwrap().push(format!("observe:{root_margin_px}"));
    }

    fn disconnect(&mut self) {
        self.0 .0.lock().unwrap().push("disconnect".to_string());
    }
}

/// Helper: mounts a binding with an on-screen container.
fn mount(
    manager: &mut SceneManager,
    options: BindingOptions,
    reduced_motion: watch::Receiver<bool>,
) -> (SceneBinding, ObserverLog) {
    let log = ObserverLog::default();
    let binding = SceneBinding::mount(
        manager,
        options,
        &capable_device(),
        Arc::new(OnScreen),
        Box::new(RecordingObserver(log.clone())),
        reduced_motion,
    );
    (binding, log)
}

fn options(name: &str) -> BindingOptions {
    BindingOptions::new(name, format!("https://cdn.example/{name}.splinecode"))
}

fn kinds(events: Vec<scenery_core::SceneEvent>) -> Vec<SceneEventKind> {
    events.into_iter().map(|event| event.kind).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// SceneBinding
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_mount_registers_and_observes() {
    let (mut manager, _clock, recorder) = manager();
    let (_tx, rx) = watch::channel(false);

    let (binding, log) = mount(&mut manager, options("hero"), rx);

    let status = binding.status(&manager).unwrap();
    assert_eq!(status.quality, QualityTier::High, "derived from capabilities");
    assert_eq!(status.config.url, "https://cdn.example/hero.splinecode");
    assert_eq!(log.entries(), vec!["observe:200"]);
    assert!(recorder.started().is_empty(), "medium scenes wait for visibility");

    let state = binding.state();
    assert!(!state.should_render && state.fallback_visible);
}

#[test]
fn test_explicit_quality_wins_over_capabilities() {
    let (mut manager, _clock, _recorder) = manager();
    let (_tx, rx) = watch::channel(false);

    let (binding, _log) = mount(
        &mut manager,
        options("hero").with_quality(QualityTier::Low).with_root_margin(50),
        rx,
    );

    assert_eq!(binding.state().quality, QualityTier::Low);
    assert_eq!(binding.status(&manager).unwrap().quality, QualityTier::Low);
}

#[test]
fn test_visibility_drives_loading_and_debounced_unload() {
    let (mut manager, clock, recorder) = manager();
    let (_tx, rx) = watch::channel(false);
    let (mut binding, _log) = mount(&mut manager, options("hero"), rx);

    binding.on_intersection(&mut manager, true);
    assert_eq!(recorder.started(), vec!["hero"]);
    assert!(binding.state().should_render);

    assert!(recorder.succeed("hero"));
    manager.update();
    assert_eq!(kinds(binding.sync()), vec![SceneEventKind::Loaded]);

    let state = binding.state();
    assert!(state.is_loaded && state.should_render && !state.fallback_visible);
    assert!(!binding.should_use_fallback());

    binding.on_intersection(&mut manager, false);
    assert!(!binding.state().should_render);
    assert_eq!(manager.pending_unloads(), 1);

    clock.advance(5_000);
    manager.update();
    assert_eq!(kinds(binding.sync()), vec![SceneEventKind::Unloaded]);
    let state = binding.state();
    assert!(!state.is_loaded && state.fallback_visible);
}

#[test]
fn test_error_then_manual_retry() {
    let (mut manager, _clock, recorder) = manager();
    let (_tx, rx) = watch::channel(false);
    let (mut binding, _log) = mount(&mut manager, options("hero"), rx);

    binding.on_intersection(&mut manager, true);
    assert!(recorder.fail("hero", "engine rejected scene"));
    manager.update();
    binding.sync();

    let state = binding.state();
    assert!(state.has_error && state.fallback_visible && !state.is_loading);
    assert!(binding.should_use_fallback());

    binding.load_scene(&mut manager);
    assert!(binding.state().is_loading);
    assert_eq!(recorder.started(), vec!["hero", "hero"]);

    assert!(recorder.succeed("hero"));
    manager.update();
    binding.sync();
    let state = binding.state();
    assert!(state.is_loaded && !state.has_error && !state.is_loading);
}

#[test]
fn test_reduced_motion_forces_fallback() {
    let (mut manager, _clock, recorder) = manager();
    let (tx, rx) = watch::channel(true);
    let (mut binding, _log) = mount(&mut manager, options("hero"), rx);

    binding.on_intersection(&mut manager, true);
    assert!(recorder.succeed("hero"));
    manager.update();
    binding.sync();

    let state = binding.state();
    assert!(state.is_loaded);
    assert!(!state.should_render);
    assert!(state.fallback_visible);
    assert!(binding.should_use_fallback());

    // Preference switched off at runtime: the next visibility change renders.
    tx.send(false).unwrap();
    assert!(!binding.reduced_motion());
    binding.on_intersection(&mut manager, true);
    assert!(binding.state().should_render);

    // And back on: the override applies immediately.
    tx.send(true).unwrap();
    assert!(!binding.state().should_render);
    binding.sync();
    tx.send(false).unwrap();
    assert!(!binding.state().should_render, "sync recorded the forced state");
}

#[test]
fn test_events_of_other_scenes_are_ignored() {
    let (mut manager, _clock, recorder) = manager();
    let (_tx, rx) = watch::channel(false);
    let (mut hero, _) = mount(&mut manager, options("hero"), rx.clone());
    let (mut about, _) = mount(&mut manager, options("about"), rx);

    hero.on_intersection(&mut manager, true);
    assert!(recorder.succeed("hero"));
    manager.update();

    assert_eq!(hero.sync().len(), 1);
    assert!(about.sync().is_empty());
    assert!(!about.state().is_loaded);
}

#[test]
fn test_unmount_releases_everything() {
    let (mut manager, _clock, recorder) = manager();
    let (_tx, rx) = watch::channel(false);
    let (mut binding, log) = mount(&mut manager, options("hero"), rx);

    binding.on_intersection(&mut manager, true);
    assert!(recorder.succeed("hero"));
    manager.update();
    binding.sync();
    assert_eq!(manager.subscription_count(), 1);

    binding.unmount(&mut manager);

    assert_eq!(log.entries(), vec!["observe:200", "disconnect"]);
    assert_eq!(manager.subscription_count(), 0);
    assert_eq!(manager.pending_unloads(), 0);
    assert!(!manager.scene_status(&SceneId::from("hero")).unwrap().loaded);
}

#[test]
fn test_unmount_while_loading_cancels_load() {
    let (mut manager, _clock, recorder) = manager();
    let (_tx, rx) = watch::channel(false);
    let (binding, _log) = mount(
        &mut manager,
        options("hero").with_priority(PriorityClass::Critical),
        rx,
    );
    assert_eq!(recorder.started(), vec!["hero"]);

    binding.unmount(&mut manager);

    assert_eq!(recorder.cancelled(), vec!["hero"]);
    assert_eq!(manager.loading_count(), 0);
}

#[test]
fn test_drop_without_unmount_disconnects_observer() {
    let (mut manager, _clock, recorder) = manager();
    let (_tx, rx) = watch::channel(false);
    let (mut binding, log) = mount(&mut manager, options("hero"), rx);
    binding.on_intersection(&mut manager, true);
    assert!(recorder.succeed("hero"));
    manager.update();

    drop(binding);

    assert_eq!(log.entries(), vec!["observe:200", "disconnect"]);
    // Dropping is not unmounting: the manager still holds the loaded scene.
    assert_eq!(manager.scene_count(), 1);
    assert!(manager.scene_status(&SceneId::from("hero")).unwrap().loaded);
}

#[test]
fn test_dispose_removes_scene_from_manager() {
    let (mut manager, _clock, recorder) = manager();
    let (_tx, rx) = watch::channel(false);
    let (mut binding, log) = mount(&mut manager, options("hero"), rx);
    binding.on_intersection(&mut manager, true);
    assert!(recorder.succeed("hero"));
    manager.update();

    binding.dispose(&mut manager);

    assert_eq!(log.entries(), vec!["observe:200", "disconnect"]);
    assert_eq!(manager.scene_count(), 0);
    assert_eq!(manager.subscription_count(), 0);
    assert!(manager.scene_status(&SceneId::from("hero")).is_none());
}

// ─────────────────────────────────────────────────────────────────────────────
// SceneBindingGroup
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_group_loads_and_unloads_together() {
    let (mut manager, _clock, recorder) = manager();
    let mut group = SceneBindingGroup::register(
        &mut manager,
        vec![options("a"), options("b")],
        &DeviceCapabilities::conservative(),
    );
    assert_eq!(group.len(), 2);
    assert!(recorder.started().is_empty());

    group.load_all(&mut manager);
    assert_eq!(recorder.started(), vec!["a", "b"]);

    assert!(recorder.succeed("a") && recorder.succeed("b"));
    manager.update();
    assert_eq!(group.sync().len(), 2);

    let a = group.state(&SceneId::from("a"));
    assert!(a.is_loaded);
    assert_eq!(a.quality, QualityTier::Low, "conservative devices start low");

    group.unload_all(&mut manager);
    group.sync();
    assert!(!group.state(&SceneId::from("b")).is_loaded);
    assert!(group.state(&SceneId::from("unknown")).fallback_visible);

    group.release(&mut manager);
    assert_eq!(manager.subscription_count(), 0);
}
