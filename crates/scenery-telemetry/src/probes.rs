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

//! sysinfo-based implementations of the capability and memory probes.

use crate::capabilities::{CapabilityProbe, ConnectionClass};
use crate::monitor::MemoryProbe;
use anyhow::anyhow;
use std::sync::Mutex;
use sysinfo::{Pid, ProcessesToUpdate, System};

const GIB: f32 = 1024.0 * 1024.0 * 1024.0;

/// Rendering-context support, as reported by the host's graphics layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GraphicsSupport {
    /// A basic 3D context is available.
    pub basic_3d: bool,
    /// An advanced 3D context is available.
    pub advanced_3d: bool,
}

/// A capability probe that reads memory and core count with `sysinfo`.
///
/// Graphics support and the connection class are not visible to `sysinfo`
/// and must be supplied by the host.
pub struct SysinfoProbe {
    system: Mutex<System>,
    graphics: GraphicsSupport,
    connection: ConnectionClass,
}

impl SysinfoProbe {
    /// Creates a probe with a freshly refreshed system snapshot.
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_memory();
        system.refresh_cpu_all();
        Self {
            system: Mutex::new(system),
            graphics: GraphicsSupport::default(),
            connection: ConnectionClass::Unknown,
        }
    }

    /// Sets the graphics support reported by the host.
    pub fn with_graphics(mut self, graphics: GraphicsSupport) -> Self {
        self.graphics = graphics;
        self
    }

    /// Sets the connection class reported by the host.
    pub fn with_connection(mut self, connection: ConnectionClass) -> Self {
        self.connection = connection;
        self
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl CapabilityProbe for SysinfoProbe {
    fn supports_basic_3d(&self) -> anyhow::Result<bool> {
        Ok(self.graphics.basic_3d)
    }

    fn supports_advanced_3d(&self) -> anyhow::Result<bool> {
        Ok(self.graphics.advanced_3d)
    }

    fn device_memory_gb(&self) -> anyhow::Result<Option<f32>> {
        let system = self
            .system
            .lock()
            .map_err(|_| anyhow!("system snapshot lock poisoned"))?;
        let total = system.total_memory();
        Ok((total > 0).then(|| total as f32 / GIB))
    }

    fn cpu_cores(&self) -> anyhow::Result<Option<u32>> {
        let system = self
            .system
            .lock()
            .map_err(|_| anyhow!("system snapshot lock poisoned"))?;
        let cores = system.cpus().len() as u32;
        Ok((cores > 0).then_some(cores))
    }

    fn connection(&self) -> anyhow::Result<ConnectionClass> {
        Ok(self.connection)
    }
}

/// Reports the resident memory of the current process.
pub struct SysinfoMemoryProbe {
    system: System,
    pid: Option<Pid>,
}

impl SysinfoMemoryProbe {
    /// Creates a probe bound to the current process.
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                log::warn!("SysinfoMemoryProbe: current pid unavailable ({e}); memory reads as 0.");
                None
            }
        };
        Self {
            system: System::new(),
            pid,
        }
    }
}

impl Default for SysinfoMemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SysinfoMemoryProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SysinfoMemoryProbe")
            .field("pid", &self.pid)
            .finish()
    }
}

impl MemoryProbe for SysinfoMemoryProbe {
    fn used_bytes(&mut self) -> Option<u64> {
        let pid = self.pid?;
        self.system
            .refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        self.system.process(pid).map(|process| process.memory())
    }
}
