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


//! Integration tests for the quality policy as seen through a running
//! PerformanceMonitor.

use scenery_core::{Clock, ManualClock, QualityTier};
use scenery_telemetry::{MemoryProbe, MonitorConfig, PerformanceMonitor, PerformanceObserver};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

const MIB: u64 = 1024 * 1024;

/// Helper: memory probe whose reading the test controls.
#[derive(Debug, Clone, Default)]
struct SharedMemory(Arc<AtomicU64>);

impl MemoryProbe for SharedMemory {
    fn used_bytes(&mut self) -> Option<u64> {
        Some(self.0.load(Ordering::SeqCst))
    }
}

#[derive(Default, Clone)]
struct Adjustments(Arc<Mutex<Vec<QualityTier>>>);

impl PerformanceObserver for Adjustments {
    fn on_quality_adjust(&mut self, quality: QualityTier) -> anyhow::Result<()> {
        self.0.lock().unwrap().push(quality);
        Ok(())
    }
}

/// Helper: runs one full window of `fps` frames and polls the monitor.
fn run_second(monitor: &mut PerformanceMonitor, clock: &ManualClock, fps: u32) {
    let start = clock.now_ms() as f64;
    let spacing = 1000.0 / f64::from(fps.max(1));
    for i in 0..fps {
        monitor.record_frame(start + f64::from(i) * spacing);
    }
    clock.advance(1_000);
    assert!(monitor.poll().is_some(), "a checkpoint is due every second");
}

#[test]
fn test_quality_moves_one_step_per_checkpoint() {
    let clock = ManualClock::new(0);
    let memory = SharedMemory::default();
    let adjustments = Adjustments::default();
    let mut monitor = PerformanceMonitor::new(
        MonitorConfig::default(),
        Arc::new(clock.clone()),
        Box::new(memory.clone()),
    );
    monitor.add_observer(Box::new(adjustments.clone()));
    assert_eq!(monitor.current_quality(), QualityTier::Medium);

    run_second(&mut monitor, &clock, 20);
    assert_eq!(monitor.current_quality(), QualityTier::Low);

    memory.0.store(10 * MIB, Ordering::SeqCst);
    run_second(&mut monitor, &clock, 60);
    assert_eq!(monitor.current_quality(), QualityTier::Medium, "no jump to high");

    run_second(&mut monitor, &clock, 60);
    assert_eq!(monitor.current_quality(), QualityTier::High);

    // Between the thresholds the tier holds.
    run_second(&mut monitor, &clock, 45);
    assert_eq!(monitor.current_quality(), QualityTier::High);

    // Memory pressure alone steps down.
    memory.0.store(150 * MIB, Ordering::SeqCst);
    run_second(&mut monitor, &clock, 60);
    assert_eq!(monitor.current_quality(), QualityTier::Medium);

    assert_eq!(
        *adjustments.0.lock().unwrap(),
        vec![
            QualityTier::Low,
            QualityTier::Medium,
            QualityTier::High,
            QualityTier::Medium
        ]
    );
}

#[test]
fn test_high_fps_with_moderate_memory_holds_tier() {
    let clock = ManualClock::new(0);
    let memory = SharedMemory::default();
    memory.0.store(75 * MIB, Ordering::SeqCst);
    let mut monitor = PerformanceMonitor::new(
        MonitorConfig::default(),
        Arc::new(clock.clone()),
        Box::new(memory),
    );

    run_second(&mut monitor, &clock, 60);

    assert_eq!(monitor.current_quality(), QualityTier::Medium);
    assert_eq!(monitor.metrics().memory_usage_bytes, 75 * MIB);
}
