// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Task scheduler: runs the benchmark on a dedicated, named task.
//!
//! On the device the task is pinned to a core with a fixed stack and
//! priority. On the host it is an OS thread: the stack size is honoured
//! (raised to a host floor when smaller) and, on Linux, the thread's CPU
//! affinity is restricted to the requested core. When the kernel refuses
//! the mask, or on other hosts, the task still runs unpinned with a
//! warning. Priority is advisory everywhere. The core id is recorded in a
//! thread-local so the task can report where it ran.

use crate::{RuntimeError, TaskConfig};
use std::cell::Cell;
use std::thread::{self, JoinHandle};

/// Smallest stack handed to a host thread. Host formatting and logging
/// need more headroom than the device build.
pub const HOST_MIN_STACK_SIZE: usize = 256 * 1024;

thread_local! {
    static CURRENT_CORE: Cell<Option<usize>> = const { Cell::new(None) };
}

/// Returns the core the calling task was pinned to, if it was spawned by
/// [`spawn_pinned`].
pub fn current_core() -> Option<usize> {
    CURRENT_CORE.with(Cell::get)
}

/// Name, stack, priority and core of a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    pub name: String,
    pub stack_size: usize,
    pub priority: u8,
    pub core: usize,
}

impl From<&TaskConfig> for TaskSpec {
    fn from(cfg: &TaskConfig) -> Self {
        Self {
            name: cfg.name.clone(),
            stack_size: cfg.stack_size,
            priority: cfg.priority,
            core: cfg.core,
        }
    }
}

/// Handle to a spawned task.
#[derive(Debug)]
pub struct TaskHandle<T> {
    name: String,
    core: usize,
    handle: JoinHandle<T>,
}

impl<T> TaskHandle<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn core(&self) -> usize {
        self.core
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the task to end.
    ///
    /// # Errors
    /// [`RuntimeError::Task`] if the task panicked.
    pub fn join(self) -> Result<T, RuntimeError> {
        self.handle
            .join()
            .map_err(|_| RuntimeError::Task(format!("task '{}' panicked", self.name)))
    }
}

/// Restricts the calling thread to `core`. Returns whether the kernel
/// accepted the mask.
#[cfg(target_os = "linux")]
fn pin_current_thread(core: usize) -> bool {
    use nix::sched::{sched_setaffinity, CpuSet};
    use nix::unistd::Pid;

    let mut set = CpuSet::new();
    if let Err(e) = set.set(core) {
        tracing::warn!("core {core} is outside the affinity mask: {e}");
        return false;
    }
    match sched_setaffinity(Pid::from_raw(0), &set) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("failed to pin task to core {core}: {e}");
            false
        }
    }
}

#[cfg(not(target_os = "linux"))]
fn pin_current_thread(core: usize) -> bool {
    tracing::warn!("core affinity is not supported on this host; core {core} is advisory");
    false
}

/// Creates a task running `f` and returns immediately.
///
/// The task pins itself to `spec.core` before calling `f`.
pub fn spawn_pinned<F, T>(spec: &TaskSpec, f: F) -> Result<TaskHandle<T>, RuntimeError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let stack = spec.stack_size.max(HOST_MIN_STACK_SIZE);
    if stack != spec.stack_size {
        tracing::debug!(
            requested = spec.stack_size,
            granted = stack,
            "task stack raised to host minimum"
        );
    }

    let core = spec.core;
    let handle = thread::Builder::new()
        .name(spec.name.clone())
        .stack_size(stack)
        .spawn(move || {
            let pinned = pin_current_thread(core);
            CURRENT_CORE.with(|c| c.set(Some(core)));
            tracing::info!(pinned, "benchmark task started on core {core}");
            f()
        })
        .map_err(|e| RuntimeError::Task(format!("cannot spawn task '{}': {e}", spec.name)))?;

    tracing::info!(
        task = %spec.name,
        core,
        priority = spec.priority,
        "task created (priority is advisory on this host)"
    );

    Ok(TaskHandle {
        name: spec.name.clone(),
        core,
        handle,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_runs_with_core_recorded() {
        let spec = TaskSpec::from(&TaskConfig::default());
        let handle = spawn_pinned(&spec, || (current_core(), thread::current().name().map(String::from)))
            .unwrap();
        assert_eq!(handle.core(), 1);
        let (core, name) = handle.join().unwrap();
        assert_eq!(core, Some(1));
        assert_eq!(name.as_deref(), Some("BenchmarkTask"));
    }

    #[cfg(target_os = "linux")]
    fn allowed_cores(set: &nix::sched::CpuSet) -> Vec<usize> {
        (0..nix::sched::CpuSet::count())
            .filter(|&c| set.is_set(c).unwrap_or(false))
            .collect()
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_task_affinity_is_the_requested_core() {
        use nix::sched::sched_getaffinity;
        use nix::unistd::Pid;

        let parent = sched_getaffinity(Pid::from_raw(0)).unwrap();
        let core = allowed_cores(&parent)[0];
        let spec = TaskSpec {
            name: "pinned".into(),
            stack_size: 4096,
            priority: 5,
            core,
        };
        let mask = spawn_pinned(&spec, || sched_getaffinity(Pid::from_raw(0)))
            .unwrap()
            .join()
            .unwrap()
            .unwrap();
        assert_eq!(allowed_cores(&mask), vec![core]);
        // The spawning thread keeps its own mask.
        let after = sched_getaffinity(Pid::from_raw(0)).unwrap();
        assert_eq!(allowed_cores(&after), allowed_cores(&parent));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_unknown_core_runs_unpinned() {
        use nix::sched::{sched_getaffinity, CpuSet};
        use nix::unistd::Pid;

        let parent = sched_getaffinity(Pid::from_raw(0)).unwrap();
        let spec = TaskSpec {
            name: "stray".into(),
            stack_size: 4096,
            priority: 5,
            core: CpuSet::count() + 1,
        };
        let (core, mask) = spawn_pinned(&spec, || (current_core(), sched_getaffinity(Pid::from_raw(0))))
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(core, Some(CpuSet::count() + 1));
        assert_eq!(allowed_cores(&mask.unwrap()), allowed_cores(&parent));
    }

    #[test]
    fn test_current_core_unset_outside_tasks() {
        assert_eq!(current_core(), None);
    }

    #[test]
    fn test_panicking_task_reports_error() {
        let spec = TaskSpec {
            name: "doomed".into(),
            stack_size: 1024,
            priority: 1,
            core: 0,
        };
        let handle = spawn_pinned(&spec, || panic!("boom")).unwrap();
        let err = handle.join().map(|_: ()| ()).unwrap_err();
        assert!(matches!(err, RuntimeError::Task(ref m) if m.contains("doomed")));
    }
}
