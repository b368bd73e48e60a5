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

//! The scene manager.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use scenery_core::{
    Clock, ContainerHandle, Millis, PerformanceMetrics, QualityTier, SceneConfig, SceneError,
    SceneEvent, SceneEventBus, SceneEventKind, SceneId, SceneStatus, SceneSubscription,
};
use scenery_telemetry::{
    CheckpointReport, MemoryProbe, MonitorState, PerformanceMonitor, PerformanceObserver,
};

use crate::catalog::SceneCatalog;
use crate::config::SceneManagerConfig;
use crate::loader::{LoadCompletion, LoadOutcome, LoadRequest, LoadTicket, SceneLoader};
use crate::queue::{LoadingQueue, LoadingQueueItem};

/// Runtime record of a registered scene.
#[derive(Debug)]
struct SceneInstance {
    id: SceneId,
    config: SceneConfig,
    container: Option<ContainerHandle>,
    loaded: bool,
    loading: bool,
    quality: QualityTier,
    priority: u8,
    last_used_ms: Millis,
}

impl SceneInstance {
    fn status(&self) -> SceneStatus {
        SceneStatus {
            id: self.id.clone(),
            config: self.config.clone(),
            loaded: self.loaded,
            loading: self.loading,
            quality: self.quality,
            priority: self.priority,
            last_used_ms: self.last_used_ms,
        }
    }

    fn is_visible(&self) -> bool {
        self.container
            .as_ref()
            .is_some_and(|container| container.intersects_viewport())
    }
}

#[derive(Debug, Clone, Copy)]
struct InFlightLoad {
    ticket: LoadTicket,
    deadline_ms: Millis,
}

/// Registry and load scheduler for every scene of the application.
///
/// The manager is driven by its host: [`record_frame`](Self::record_frame)
/// once per rendered frame and [`update`](Self::update) once per loop turn.
/// `update` applies finished loads, expires overdue ones, fires debounced
/// unloads, runs the performance checkpoint when due and starts queued loads
/// while the concurrency cap allows.
///
/// Observers subscribe per scene and receive [`SceneEvent`]s in the order
/// the transitions happened.
pub struct SceneManager {
    config: SceneManagerConfig,
    clock: Arc<dyn Clock>,
    loader: Box<dyn SceneLoader>,
    monitor: PerformanceMonitor,
    scenes: HashMap<SceneId, SceneInstance>,
    queue: LoadingQueue,
    active: HashSet<SceneId>,
    in_flight: HashMap<SceneId, InFlightLoad>,
    unload_timers: HashMap<SceneId, Millis>,
    bus: SceneEventBus,
    completion_tx: Sender<LoadOutcome>,
    completion_rx: Receiver<LoadOutcome>,
    max_concurrent: usize,
    next_ticket: u64,
    destroyed: bool,
}

impl SceneManager {
    /// Creates a manager and its performance monitor.
    ///
    /// An invalid config is logged and its unusable values fall back as
    /// described by [`SceneManagerConfig::sanitized`].
    pub fn new(
        config: SceneManagerConfig,
        clock: Arc<dyn Clock>,
        loader: Box<dyn SceneLoader>,
        memory: Box<dyn MemoryProbe>,
    ) -> Self {
        if let Err(e) = config.validate() {
            log::warn!("Invalid scene manager config: {e:#}. Falling back to defaults where needed.");
        }
        let config = config.sanitized();
        let monitor = PerformanceMonitor::new(config.monitor.clone(), Arc::clone(&clock), memory);
        let (completion_tx, completion_rx) = crossbeam_channel::unbounded();
        let max_concurrent = config.max_concurrent_scenes;

        log::info!(
            "Scene manager started (max {} concurrent loads, {}ms timeout, {}ms unload delay).",
            max_concurrent,
            config.loading_timeout_ms,
            config.unload_delay_ms
        );

        Self {
            config,
            clock,
            loader,
            monitor,
            scenes: HashMap::new(),
            queue: LoadingQueue::new(),
            active: HashSet::new(),
            in_flight: HashMap::new(),
            unload_timers: HashMap::new(),
            bus: SceneEventBus::new(),
            completion_tx,
            completion_rx,
            max_concurrent,
            next_ticket: 1,
            destroyed: false,
        }
    }

    /// Registers a scene. Registering an existing id replaces it.
    ///
    /// Scenes flagged for preload, and critical or high scenes, are queued
    /// for loading immediately.
    pub fn register_scene(
        &mut self,
        id: impl Into<SceneId>,
        config: SceneConfig,
        container: Option<ContainerHandle>,
    ) {
        let id = id.into();
        if self.destroyed {
            log::debug!("Ignoring registration of '{}' after destroy.", id);
            return;
        }

        if self.scenes.contains_key(&id) {
            log::debug!("Scene '{}' registered again, replacing previous registration.", id);
            self.release(&id);
        }

        let now = self.clock.now_ms();
        let priority = config.priority.rank();
        let eager = config.preload || priority <= 2;
        log::info!(
            "Registered scene '{}' ({:?}, preload: {}).",
            id,
            config.priority,
            config.preload
        );

        self.scenes.insert(
            id.clone(),
            SceneInstance {
                id: id.clone(),
                quality: config.quality,
                config,
                container,
                loaded: false,
                loading: false,
                priority,
                last_used_ms: now,
            },
        );

        if eager {
            self.enqueue(&id, priority);
        }
    }

    /// Registers every scene of `catalog` without a container.
    pub fn register_catalog(&mut self, catalog: &SceneCatalog) {
        for (id, config) in catalog.iter() {
            self.register_scene(id.clone(), config.clone(), None);
        }
    }

    /// Signals that `id` is wanted now.
    ///
    /// Refreshes recency, cancels a pending debounced unload and, when the
    /// scene's container intersects the viewport, queues it one rank above
    /// its base priority. Unknown ids are ignored.
    pub fn request_scene(&mut self, id: &SceneId, container: Option<ContainerHandle>) {
        if self.destroyed {
            return;
        }
        let now = self.clock.now_ms();
        let Some(scene) = self.scenes.get_mut(id) else {
            log::debug!("Request for unknown scene '{}' ignored.", id);
            return;
        };

        scene.last_used_ms = now;
        if container.is_some() {
            scene.container = container;
        }
        let visible = scene.is_visible();
        let boosted = scene.priority.saturating_sub(1).max(1);

        if self.unload_timers.remove(id).is_some() {
            log::debug!("Pending unload of '{}' cancelled by request.", id);
        }
        if visible {
            self.enqueue(id, boosted);
        }
    }

    /// Unloads a scene, either now or after the configured delay.
    ///
    /// A delayed unload replaces any timer already pending for the scene and
    /// is cancelled by a later [`request_scene`](Self::request_scene).
    pub fn unload_scene(&mut self, id: &SceneId, immediate: bool) {
        if self.destroyed || !self.scenes.contains_key(id) {
            return;
        }

        if immediate {
            self.unload_timers.remove(id);
            self.unload_now(id);
        } else {
            let deadline = self.clock.now_ms() + self.config.unload_delay_ms;
            self.unload_timers.insert(id.clone(), deadline);
            log::debug!("Unload of '{}' scheduled at {}ms.", id, deadline);
        }
    }

    /// Unloads `id`, forgets its registration and closes its subscriptions.
    pub fn dispose_scene(&mut self, id: &SceneId) {
        if self.destroyed || !self.scenes.contains_key(id) {
            return;
        }
        self.unload_timers.remove(id);
        self.unload_now(id);
        self.scenes.remove(id);
        self.bus.close_scene(id);
        log::info!("Disposed scene '{}'.", id);
    }

    pub fn scene_status(&self, id: &SceneId) -> Option<SceneStatus> {
        self.scenes.get(id).map(SceneInstance::status)
    }

    /// Snapshots of every registered scene, ordered by id.
    pub fn all_scenes(&self) -> Vec<SceneStatus> {
        let mut scenes: Vec<SceneStatus> = self.scenes.values().map(SceneInstance::status).collect();
        scenes.sort_by(|a, b| a.id.cmp(&b.id));
        scenes
    }

    /// Latest performance checkpoint, or `None` once destroyed.
    pub fn performance_metrics(&self) -> Option<PerformanceMetrics> {
        (!self.destroyed).then(|| self.monitor.metrics())
    }

    /// Quality tier currently selected by the performance monitor.
    pub fn current_quality(&self) -> QualityTier {
        self.monitor.current_quality()
    }

    /// Subscribes to lifecycle events of `id`. The scene need not be
    /// registered yet.
    pub fn subscribe(&mut self, id: &SceneId) -> SceneSubscription {
        let subscription = self.bus.subscribe(id.clone());
        if self.destroyed {
            self.bus.close_scene(id);
        }
        subscription
    }

    pub fn unsubscribe(&mut self, subscription: &SceneSubscription) {
        self.bus.unsubscribe(subscription.scene_id(), subscription.id());
    }

    pub fn add_performance_observer(&mut self, observer: Box<dyn PerformanceObserver>) {
        self.monitor.add_observer(observer);
    }

    /// Feeds one rendered frame to the performance monitor.
    pub fn record_frame(&mut self, timestamp_ms: f64) {
        if !self.destroyed {
            self.monitor.record_frame(timestamp_ms);
        }
    }

    /// Advances the manager to the current clock time.
    pub fn update(&mut self) {
        if self.destroyed {
            return;
        }

        // 1. Apply finished loads
        while let Ok(outcome) = self.completion_rx.try_recv() {
            self.apply_outcome(outcome);
        }

        // 2. Expire overdue loads
        self.expire_loads();

        // 3. Fire debounced unloads
        self.fire_unload_timers();

        // 4. Performance feedback
        if let Some(report) = self.monitor.poll() {
            self.apply_checkpoint(report);
        }

        // 5. Fill free load slots
        self.process_queue();
    }

    /// Tears the manager down. Pending timers are cancelled, in-flight loads
    /// abandoned and every scene reports `Unloaded` once. Calling it again
    /// does nothing.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;

        let timers = self.unload_timers.len();
        self.unload_timers.clear();
        self.queue.clear();
        let mut in_flight: Vec<(SceneId, InFlightLoad)> = self.in_flight.drain().collect();
        in_flight.sort_by_key(|(_, load)| load.ticket);
        for (id, load) in &in_flight {
            self.loader.cancel(id, load.ticket);
        }
        self.monitor.dispose();

        let now = self.clock.now_ms();
        let mut ids: Vec<SceneId> = self.scenes.keys().cloned().collect();
        ids.sort();
        for id in ids {
            if let Some(scene) = self.scenes.get_mut(&id) {
                scene.loaded = false;
                scene.loading = false;
            }
            self.bus
                .publish(SceneEvent::new(id, SceneEventKind::Unloaded, now));
        }

        self.scenes.clear();
        self.active.clear();
        self.bus.clear();
        while self.completion_rx.try_recv().is_ok() {}

        log::info!(
            "Scene manager destroyed ({} pending unloads and {} in-flight loads cancelled).",
            timers,
            in_flight.len()
        );
    }

    /// Live concurrency cap, between 1 and the configured maximum.
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub fn loading_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Scenes loading or loaded.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Queued scene ids in load order.
    pub fn queued_scenes(&self) -> Vec<SceneId> {
        self.queue.scene_ids().cloned().collect()
    }

    pub fn pending_unloads(&self) -> usize {
        self.unload_timers.len()
    }

    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    /// Total number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.bus.len()
    }

    pub fn monitor_state(&self) -> MonitorState {
        self.monitor.state()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn config(&self) -> &SceneManagerConfig {
        &self.config
    }

    fn publish(&mut self, id: &SceneId, kind: SceneEventKind) {
        let event = SceneEvent::new(id.clone(), kind, self.clock.now_ms());
        self.bus.publish(event);
    }

    fn enqueue(&mut self, id: &SceneId, priority: u8) {
        let Some(scene) = self.scenes.get(id) else {
            return;
        };
        if scene.loading || scene.loaded {
            log::trace!("Scene '{}' already loading or loaded, not queued.", id);
            return;
        }
        self.queue.push(LoadingQueueItem {
            scene_id: id.clone(),
            priority,
            enqueued_at_ms: self.clock.now_ms(),
        });
        self.process_queue();
    }

    fn process_queue(&mut self) {
        while self.in_flight.len() < self.max_concurrent {
            let Some(item) = self.queue.pop_front() else {
                break;
            };
            self.start_load(&item.scene_id);
        }
    }

    fn start_load(&mut self, id: &SceneId) {
        let now = self.clock.now_ms();
        let Some(scene) = self.scenes.get_mut(id) else {
            return;
        };
        if scene.loading || scene.loaded {
            return;
        }

        scene.loading = true;
        scene.last_used_ms = now;
        let request = LoadRequest {
            scene_id: id.clone(),
            url: scene.config.url.clone(),
            quality: scene.quality,
            ticket: LoadTicket(self.next_ticket),
        };
        self.next_ticket += 1;

        self.active.insert(id.clone());
        self.in_flight.insert(
            id.clone(),
            InFlightLoad {
                ticket: request.ticket,
                deadline_ms: now + self.config.loading_timeout_ms,
            },
        );
        let completion = LoadCompletion::new(
            id.clone(),
            request.ticket,
            Arc::clone(&self.clock),
            self.completion_tx.clone(),
        );

        log::debug!(
            "Loading scene '{}' from {} at {} quality ({} in flight).",
            id,
            request.url,
            request.quality,
            self.in_flight.len()
        );
        self.loader.begin_load(request, completion);
    }

    fn apply_outcome(&mut self, outcome: LoadOutcome) {
        let Some(load) = self.in_flight.get(&outcome.scene_id).copied() else {
            log::debug!("Ignoring completion for '{}', no load in flight.", outcome.scene_id);
            return;
        };
        if load.ticket != outcome.ticket {
            log::debug!("Ignoring stale completion for '{}'.", outcome.scene_id);
            return;
        }
        if outcome.completed_at_ms >= load.deadline_ms {
            // Resolved after its deadline, the timeout wins.
            return;
        }

        let id = outcome.scene_id;
        self.in_flight.remove(&id);
        let Some(scene) = self.scenes.get_mut(&id) else {
            return;
        };
        scene.loading = false;

        match outcome.result {
            Ok(()) => {
                scene.loaded = true;
                log::info!("Scene '{}' loaded.", id);
                self.publish(&id, SceneEventKind::Loaded);
            }
            Err(reason) => {
                self.active.remove(&id);
                let error = SceneError::LoadFailure {
                    scene_id: id.clone(),
                    reason,
                };
                log::warn!("{}", error);
                self.publish(&id, SceneEventKind::Error(error));
            }
        }
    }

    fn expire_loads(&mut self) {
        let now = self.clock.now_ms();
        let mut expired: Vec<(SceneId, InFlightLoad)> = self
            .in_flight
            .iter()
            .filter(|(_, load)| load.deadline_ms <= now)
            .map(|(id, load)| (id.clone(), *load))
            .collect();
        expired.sort_by_key(|(_, load)| load.ticket);

        for (id, load) in expired {
            self.in_flight.remove(&id);
            self.active.remove(&id);
            self.loader.cancel(&id, load.ticket);
            if let Some(scene) = self.scenes.get_mut(&id) {
                scene.loading = false;
            }
            let error = SceneError::LoadTimeout {
                scene_id: id.clone(),
                timeout_ms: self.config.loading_timeout_ms,
            };
            log::warn!("{}", error);
            self.publish(&id, SceneEventKind::Error(error));
        }
    }

    fn fire_unload_timers(&mut self) {
        let now = self.clock.now_ms();
        let mut due: Vec<(SceneId, Millis)> = self
            .unload_timers
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(id, deadline)| (id.clone(), *deadline))
            .collect();
        due.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

        for (id, _) in due {
            self.unload_timers.remove(&id);
            self.unload_now(&id);
        }
    }

    fn apply_checkpoint(&mut self, report: CheckpointReport) {
        if let Some(quality) = report.quality_change {
            self.adjust_all_quality(quality);
        }

        let metrics = report.metrics;
        if self.monitor.config().thresholds.is_under_pressure(&metrics) {
            let reduced = self.max_concurrent.saturating_sub(1).max(1);
            if reduced != self.max_concurrent {
                log::info!(
                    "Performance pressure ({:.1} fps, {:.1} MB), concurrency {} -> {}.",
                    metrics.fps,
                    metrics.memory_usage_mb(),
                    self.max_concurrent,
                    reduced
                );
            }
            self.max_concurrent = reduced;
            self.evict_under_pressure();
        } else if metrics.fps > self.config.concurrency_recover_fps
            && self.max_concurrent < self.config.max_concurrent_scenes
        {
            self.max_concurrent += 1;
            log::info!(
                "Performance recovered ({:.1} fps), concurrency raised to {}.",
                metrics.fps,
                self.max_concurrent
            );
        }
    }

    fn adjust_all_quality(&mut self, quality: QualityTier) {
        log::info!("Adjusting all scenes to {} quality.", quality);
        let mut ids: Vec<SceneId> = self.scenes.keys().cloned().collect();
        ids.sort();
        for id in ids {
            if let Some(scene) = self.scenes.get_mut(&id) {
                scene.quality = quality;
            }
            self.publish(&id, SceneEventKind::Quality(quality));
        }
    }

    /// Evicts the least recently used medium and low scenes until the loaded
    /// count fits the cap, always leaving at least one scene loaded.
    fn evict_under_pressure(&mut self) {
        let loaded = self.scenes.values().filter(|scene| scene.loaded).count();
        let mut candidates: Vec<(Millis, SceneId)> = self
            .scenes
            .values()
            .filter(|scene| scene.loaded && !scene.config.priority.is_protected())
            .map(|scene| (scene.last_used_ms, scene.id.clone()))
            .collect();
        candidates.sort();

        let wanted = loaded.saturating_sub(self.max_concurrent).max(1);
        let count = wanted.min(loaded.saturating_sub(1));

        for (_, id) in candidates.into_iter().take(count) {
            log::info!("Evicting scene '{}' under performance pressure.", id);
            self.unload_timers.remove(&id);
            self.unload_now(&id);
        }
    }

    fn unload_now(&mut self, id: &SceneId) {
        let Some(scene) = self.scenes.get_mut(id) else {
            return;
        };
        scene.loaded = false;
        scene.loading = false;

        self.queue.remove(id);
        self.active.remove(id);
        if let Some(load) = self.in_flight.remove(id) {
            self.loader.cancel(id, load.ticket);
        }

        log::debug!("Scene '{}' unloaded.", id);
        self.publish(id, SceneEventKind::Unloaded);
        self.process_queue();
    }

    /// Drops the runtime state of an existing registration before it is
    /// replaced.
    fn release(&mut self, id: &SceneId) {
        let was_active = self
            .scenes
            .get(id)
            .is_some_and(|scene| scene.loaded || scene.loading);
        self.unload_timers.remove(id);
        self.queue.remove(id);
        self.active.remove(id);
        if let Some(load) = self.in_flight.remove(id) {
            self.loader.cancel(id, load.ticket);
        }
        if was_active {
            self.publish(id, SceneEventKind::Unloaded);
        }
    }
}

impl Drop for SceneManager {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl std::fmt::Debug for SceneManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneManager")
            .field("scenes", &self.scenes.len())
            .field("loading", &self.in_flight.len())
            .field("queued", &self.queue.len())
            .field("max_concurrent", &self.max_concurrent)
            .field("destroyed", &self.destroyed)
            .finish_non_exhaustive()
    }
}
