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

//! Scene fetching from the local filesystem.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{ensure, Context, Result};
use scenery_control::LoadRequest;

/// Maps a scene url to a file. `file://` prefixes are stripped and relative
/// paths are resolved against `base`.
pub fn resolve(base: &Path, url: &str) -> PathBuf {
    let path = Path::new(url.strip_prefix("file://").unwrap_or(url));
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Reads the scene file. An unreadable or empty file fails the load.
pub async fn fetch_scene(base: Arc<PathBuf>, request: LoadRequest) -> Result<()> {
    let path = resolve(&base, &request.url);
    let bytes = tokio::fs::read(&path).await.with_context(|| {
        format!(
            "Failed to read scene '{}' from {}",
            request.scene_id,
            path.display()
        )
    })?;
    ensure!(!bytes.is_empty(), "Scene file {} is empty", path.display());

    log::debug!(
        "Fetched {} bytes for '{}' at {} quality.",
        bytes.len(),
        request.scene_id,
        request.quality
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenery_control::LoadTicket;
    use scenery_core::{QualityTier, SceneId};
    use tempfile::tempdir;

    fn request(url: &str) -> LoadRequest {
        LoadRequest {
            scene_id: SceneId::from("hero"),
            url: url.to_string(),
            quality: QualityTier::Medium,
            ticket: LoadTicket::new(1),
        }
    }

    #[test]
    fn resolves_relative_and_file_urls() {
        let base = Path::new("/srv/scenes");
        assert_eq!(resolve(base, "hero.splinecode"), base.join("hero.splinecode"));
        assert_eq!(
            resolve(base, "file:///tmp/hero.splinecode"),
            PathBuf::from("/tmp/hero.splinecode")
        );
        assert_eq!(
            resolve(base, "file://nested/hero.splinecode"),
            base.join("nested/hero.splinecode")
        );
    }

    #[tokio::test]
    async fn fetches_existing_scene() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("hero.splinecode"), b"scene").unwrap();

        fetch_scene(Arc::new(dir.path().to_path_buf()), request("hero.splinecode"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn missing_or_empty_scene_fails() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("empty.splinecode"), b"").unwrap();
        let base = Arc::new(dir.path().to_path_buf());

        let missing = fetch_scene(Arc::clone(&base), request("missing.splinecode")).await;
        assert!(format!("{:#}", missing.unwrap_err()).contains("Failed to read scene 'hero'"));

        let empty = fetch_scene(base, request("empty.splinecode")).await;
        assert!(empty.unwrap_err().to_string().contains("is empty"));
    }
}
