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

//! Scenery runtime.
//!
//! Builds a scene manager from a JSON config and a scene catalog, lays the
//! catalog out as sections of a simulated page and scrolls through it while
//! pumping frames. Scenes are fetched from disk on a tokio runtime.

mod fetch;
mod viewport;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use scenery_binding::{BindingOptions, SceneBinding};
use scenery_control::{AsyncSceneLoader, SceneCatalog, SceneManager, SceneManagerConfig};
use scenery_core::{PerformanceMetrics, QualityTier, SceneContainer, SceneEventKind, SystemClock};
use scenery_telemetry::{
    detect_capabilities, select_quality_tier, ConnectionClass, GraphicsSupport,
    PerformanceObserver, SysinfoMemoryProbe, SysinfoProbe,
};
use tokio::sync::watch;

use crate::viewport::{PageSection, ScrollViewport, SectionObserver};

#[derive(Debug, Parser)]
#[command(name = "scenery-runtime", version, about = "Drives scene loading over a scrolling page")]
struct Args {
    /// Scene catalog (JSON map of scene id to scene config).
    #[arg(long)]
    catalog: PathBuf,

    /// Scene manager config (JSON). Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory relative scene urls are resolved against. Defaults to the
    /// catalog's directory.
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Number of frames to run.
    #[arg(long, default_value_t = 600)]
    frames: u32,

    /// Target frame rate.
    #[arg(long, default_value_t = 60.0)]
    fps: f64,

    /// Viewport height in pixels; every scene section is this tall.
    #[arg(long, default_value_t = 800)]
    viewport_height: u64,

    /// Effective network type reported by the host (slow-2g, 2g, 3g, 4g).
    #[arg(long, default_value = "4g")]
    connection: String,

    /// Act as if the user prefers reduced motion.
    #[arg(long)]
    reduced_motion: bool,
}

/// Logs every checkpoint.
struct LogObserver;

impl PerformanceObserver for LogObserver {
    fn on_performance_change(&mut self, metrics: &PerformanceMetrics) -> Result<()> {
        log::debug!(
            "{:.1} fps, {:.2} ms/frame, {:.1} MB, {} dropped",
            metrics.fps,
            metrics.frame_time_ms,
            metrics.memory_usage_mb(),
            metrics.dropped_frames
        );
        Ok(())
    }

    fn on_quality_adjust(&mut self, quality: QualityTier) -> Result<()> {
        log::info!("Quality adjusted to {}.", quality);
        Ok(())
    }
}

struct MountedScene {
    binding: SceneBinding,
    section: Arc<PageSection>,
    visible: bool,
}

fn load_config(path: Option<&PathBuf>) -> Result<SceneManagerConfig> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            SceneManagerConfig::from_json_str(&json)
                .with_context(|| format!("Invalid config {}", path.display()))
        }
        None => Ok(SceneManagerConfig::default()),
    }
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();
    run(Args::parse())
}

fn run(args: Args) -> Result<()> {
    anyhow::ensure!(args.fps > 0.0, "--fps must be positive");

    let mut config = load_config(args.config.as_ref())?;
    let catalog = SceneCatalog::from_path(&args.catalog)?;
    let assets = match &args.assets {
        Some(dir) => dir.clone(),
        None => args
            .catalog
            .parent()
            .map(PathBuf::from)
            .unwrap_or_default(),
    };

    let probe = SysinfoProbe::new()
        .with_graphics(GraphicsSupport {
            basic_3d: true,
            advanced_3d: true,
        })
        .with_connection(ConnectionClass::from_effective_type(&args.connection));
    let capabilities = detect_capabilities(&probe);
    config.monitor.initial_quality = select_quality_tier(&capabilities);

    let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
    let base = Arc::new(assets);
    let loader = AsyncSceneLoader::new(runtime.handle().clone(), move |request| {
        fetch::fetch_scene(Arc::clone(&base), request)
    });

    let mut manager = SceneManager::new(
        config,
        Arc::new(SystemClock::new()),
        Box::new(loader),
        Box::new(SysinfoMemoryProbe::new()),
    );
    manager.add_performance_observer(Box::new(LogObserver));

    let (_reduced_motion_tx, reduced_motion) = watch::channel(args.reduced_motion);
    let viewport = Arc::new(ScrollViewport::new(args.viewport_height));
    let mut scenes = Vec::with_capacity(catalog.len());
    for (index, (id, scene)) in catalog.iter().enumerate() {
        let section = Arc::new(PageSection::new(
            Arc::clone(&viewport),
            index as u64 * args.viewport_height,
            args.viewport_height,
        ));
        let mut options = BindingOptions::new(id.clone(), scene.url.clone())
            .with_priority(scene.priority)
            .with_preload(scene.preload)
            .with_quality(scene.quality);
        if let Some(image) = &scene.fallback_image {
            options = options.with_fallback_image(image.clone());
        }
        let binding = SceneBinding::mount(
            &mut manager,
            options,
            &capabilities,
            section.clone(),
            Box::new(SectionObserver::new(Arc::clone(&section))),
            reduced_motion.clone(),
        );
        scenes.push(MountedScene {
            binding,
            section,
            visible: false,
        });
    }

    let page_height = catalog.len() as u64 * args.viewport_height;
    let scroll_range = page_height.saturating_sub(args.viewport_height);
    let frame_budget = Duration::from_secs_f64(1.0 / args.fps);
    let start = Instant::now();
    log::info!(
        "Running {} frames over {} scenes ({}px page).",
        args.frames,
        scenes.len(),
        page_height
    );

    for frame in 0..args.frames {
        let frame_start = Instant::now();
        let progress = f64::from(frame) / f64::from(args.frames.max(1));
        viewport.scroll_to((progress * scroll_range as f64) as u64);

        for scene in &mut scenes {
            if !scene.section.is_observed() {
                continue;
            }
            let visible = scene.section.intersects_viewport();
            if visible != scene.visible {
                scene.visible = visible;
                scene.binding.on_intersection(&mut manager, visible);
            }
        }

        manager.record_frame(start.elapsed().as_secs_f64() * 1000.0);
        manager.update();

        for scene in &mut scenes {
            for event in scene.binding.sync() {
                match event.kind {
                    SceneEventKind::Loaded => {
                        log::info!("'{}' ready at frame {}.", event.scene_id, frame)
                    }
                    SceneEventKind::Error(error) => log::warn!("Showing fallback: {}", error),
                    _ => {}
                }
            }
        }

        if let Some(remaining) = frame_budget.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(remaining);
        }
    }

    let summary: Vec<serde_json::Value> = scenes
        .iter()
        .map(|scene| {
            let state = scene.binding.state();
            serde_json::json!({
                "scene": scene.binding.scene_id(),
                "loaded": state.is_loaded,
                "error": state.has_error,
                "quality": state.quality.as_str(),
                "fallback": scene.binding.should_use_fallback(),
            })
        })
        .collect();
    let report = serde_json::json!({
        "metrics": manager.performance_metrics(),
        "max_concurrent": manager.max_concurrent(),
        "scenes": summary,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    for scene in scenes {
        scene.binding.unmount(&mut manager);
    }
    manager.destroy();
    Ok(())
}
