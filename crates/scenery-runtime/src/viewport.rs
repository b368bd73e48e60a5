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

//! A simulated scrolling page standing in for the host's viewport.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use scenery_binding::IntersectionObserver;
use scenery_core::{ContainerHandle, SceneContainer};

/// Vertical viewport over the page.
#[derive(Debug)]
pub struct ScrollViewport {
    offset_px: AtomicU64,
    height_px: u64,
}

impl ScrollViewport {
    pub fn new(height_px: u64) -> Self {
        Self {
            offset_px: AtomicU64::new(0),
            height_px,
        }
    }

    pub fn scroll_to(&self, offset_px: u64) {
        self.offset_px.store(offset_px, Ordering::Relaxed);
    }

    pub fn offset(&self) -> u64 {
        self.offset_px.load(Ordering::Relaxed)
    }

    pub fn height(&self) -> u64 {
        self.height_px
    }
}

/// A block of the page hosting one scene.
#[derive(Debug)]
pub struct PageSection {
    viewport: Arc<ScrollViewport>,
    top_px: u64,
    height_px: u64,
    margin_px: AtomicU32,
    observed: AtomicBool,
}

impl PageSection {
    pub fn new(viewport: Arc<ScrollViewport>, top_px: u64, height_px: u64) -> Self {
        Self {
            viewport,
            top_px,
            height_px,
            margin_px: AtomicU32::new(0),
            observed: AtomicBool::new(false),
        }
    }

    /// Whether an observer is attached.
    pub fn is_observed(&self) -> bool {
        self.observed.load(Ordering::Relaxed)
    }
}

impl SceneContainer for PageSection {
    fn intersects_viewport(&self) -> bool {
        let margin = i64::from(self.margin_px.load(Ordering::Relaxed));
        let view_top = self.viewport.offset() as i64 - margin;
        let view_bottom = (self.viewport.offset() + self.viewport.height()) as i64 + margin;
        let top = self.top_px as i64;
        let bottom = (self.top_px + self.height_px) as i64;
        top < view_bottom && bottom > view_top
    }
}

/// Observer attaching to a [`PageSection`]. The frame loop reads
/// [`PageSection::is_observed`] and delivers transitions itself.
#[derive(Debug)]
pub struct SectionObserver {
    section: Arc<PageSection>,
}

impl SectionObserver {
    pub fn new(section: Arc<PageSection>) -> Self {
        Self { section }
    }
}

impl IntersectionObserver for SectionObserver {
    fn observe(&mut self, _container: &ContainerHandle, root_margin_px: u32) {
        self.section.margin_px.store(root_margin_px, Ordering::Relaxed);
        self.section.observed.store(true, Ordering::Relaxed);
    }

    fn disconnect(&mut self) {
        self.section.observed.store(false, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn margin_triggers_before_the_section_scrolls_in() {
        let viewport = Arc::new(ScrollViewport::new(800));
        let section = Arc::new(PageSection::new(Arc::clone(&viewport), 900, 400));
        let handle: ContainerHandle = section.clone();
        assert!(!section.intersects_viewport());

        let mut observer = SectionObserver::new(Arc::clone(&section));
        observer.observe(&handle, 200);
        assert!(section.is_observed());
        assert!(section.intersects_viewport());

        viewport.scroll_to(1_500);
        assert!(!section.intersects_viewport());

        observer.disconnect();
        assert!(!section.is_observed());
    }
}
