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

//! [`SceneLoader`] adapter that runs fetches as tasks on a tokio runtime.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use scenery_core::SceneId;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::loader::{LoadCompletion, LoadRequest, LoadTicket, SceneLoader};

/// Spawns one task per load; cancelling a load aborts its task.
pub struct AsyncSceneLoader<F> {
    runtime: Handle,
    fetch: Arc<F>,
    tasks: HashMap<SceneId, (LoadTicket, JoinHandle<()>)>,
}

impl<F, Fut> AsyncSceneLoader<F>
where
    F: Fn(LoadRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    pub fn new(runtime: Handle, fetch: F) -> Self {
        Self {
            runtime,
            fetch: Arc::new(fetch),
            tasks: HashMap::new(),
        }
    }

    /// Number of loads whose task has not finished yet.
    pub fn running(&self) -> usize {
        self.tasks
            .values()
            .filter(|(_, handle)| !handle.is_finished())
            .count()
    }
}

impl<F, Fut> SceneLoader for AsyncSceneLoader<F>
where
    F: Fn(LoadRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    fn begin_load(&mut self, request: LoadRequest, completion: LoadCompletion) {
        self.tasks.retain(|_, (_, handle)| !handle.is_finished());

        let scene_id = request.scene_id.clone();
        let ticket = request.ticket;
        let fetch = Arc::clone(&self.fetch);
        let handle = self.runtime.spawn(async move {
            let result = (*fetch)(request).await;
            completion.finish(result);
        });

        if let Some((_, previous)) = self.tasks.insert(scene_id, (ticket, handle)) {
            previous.abort();
        }
    }

    fn cancel(&mut self, scene_id: &SceneId, ticket: LoadTicket) {
        let matches = self
            .tasks
            .get(scene_id)
            .is_some_and(|(running, _)| *running == ticket);
        if matches {
            if let Some((_, handle)) = self.tasks.remove(scene_id) {
                log::debug!("Aborting load task for scene '{}'", scene_id);
                handle.abort();
            }
        }
    }
}

impl<F> fmt::Debug for AsyncSceneLoader<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncSceneLoader")
            .field("tasks", &self.tasks.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::LoadOutcome;
    use scenery_core::{ManualClock, QualityTier};
    use std::time::Duration;

    fn make(
        id: &str,
        ticket: u64,
        sender: crossbeam_channel::Sender<LoadOutcome>,
    ) -> (LoadRequest, LoadCompletion) {
        let scene_id = SceneId::from(id);
        let ticket = LoadTicket(ticket);
        (
            LoadRequest {
                scene_id: scene_id.clone(),
                url: format!("https://cdn.example/{id}.splinecode"),
                quality: QualityTier::Medium,
                ticket,
            },
            LoadCompletion::new(scene_id, ticket, Arc::new(ManualClock::new(0)), sender),
        )
    }

    #[test]
    fn completes_through_the_runtime() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut loader =
            AsyncSceneLoader::new(runtime.handle().clone(), |request: LoadRequest| async move {
                if request.url.contains("broken") {
                    anyhow::bail!("bad payload");
                }
                Ok(())
            });

        let (req, done) = make("hero", 1, tx.clone());
        loader.begin_load(req, done);
        let (req, done) = make("broken", 2, tx);
        loader.begin_load(req, done);

        let mut outcomes: Vec<LoadOutcome> = (0..2)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        outcomes.sort_by_key(|o| o.ticket);
        assert_eq!(outcomes[0].result, Ok(()));
        assert_eq!(outcomes[1].result, Err("bad payload".to_string()));
    }

    #[test]
    fn cancel_aborts_the_matching_task() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut loader = AsyncSceneLoader::new(runtime.handle().clone(), |_: LoadRequest| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<(), anyhow::Error>(())
        });

        let (req, done) = make("hero", 1, tx);
        loader.begin_load(req, done);
        loader.cancel(&SceneId::from("other"), LoadTicket(1));
        assert_eq!(loader.tasks.len(), 1);
        loader.cancel(&SceneId::from("hero"), LoadTicket(2));
        assert_eq!(loader.tasks.len(), 1);
        loader.cancel(&SceneId::from("hero"), LoadTicket(1));
        assert!(loader.tasks.is_empty());

        // Aborting drops the completion, which disconnects the channel.
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_err());
    }
}
