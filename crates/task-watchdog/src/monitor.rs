// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Host task watchdog.
//!
//! A background thread wakes a few times per timeout period and checks when
//! each monitored core was last fed. A core left unfed for longer than the
//! timeout trips the watchdog: with `trigger_panic` the process aborts (the
//! host stand-in for a system reset), otherwise the trip is logged and
//! counted.
//!
//! Disabling stops the checks but keeps the thread parked, so a later
//! `enable` only swaps the configuration and resets the feed clocks.

use crate::{Watchdog, WatchdogConfig, WatchdogError, MAX_CORES};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

struct MonitorState {
    config: Option<WatchdogConfig>,
    last_feed: [Instant; MAX_CORES],
    shutdown: bool,
}

struct Shared {
    state: Mutex<MonitorState>,
    wake: Condvar,
    trips: AtomicU64,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, MonitorState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn feed(&self, core: usize) -> Result<(), WatchdogError> {
        let mut state = self.lock();
        let config = state.config.ok_or(WatchdogError::NotEnabled)?;
        if !config.monitored_cores.contains(core) {
            return Err(WatchdogError::CoreNotMonitored {
                core,
                monitored: config.monitored_cores.to_string(),
            });
        }
        state.last_feed[core] = Instant::now();
        Ok(())
    }
}

/// A cloneable handle that can feed a [`TaskWatchdog`] from any thread.
#[derive(Clone)]
pub struct FeedHandle {
    shared: Arc<Shared>,
}

impl FeedHandle {
    /// Records progress on `core`.
    pub fn feed(&self, core: usize) -> Result<(), WatchdogError> {
        self.shared.feed(core)
    }
}

/// Software watchdog over a set of cores.
///
/// # Example
/// ```
/// use task_watchdog::{CoreMask, TaskWatchdog, Watchdog, WatchdogConfig};
///
/// let cfg = WatchdogConfig {
///     timeout_ms: 1000,
///     monitored_cores: CoreMask::DUAL,
///     trigger_panic: false,
/// };
/// let mut wd = TaskWatchdog::start(&cfg).unwrap();
/// wd.feed(0).unwrap();
/// wd.disable().unwrap();
/// assert!(!wd.is_enabled());
/// ```
pub struct TaskWatchdog {
    shared: Arc<Shared>,
    monitor: Option<JoinHandle<()>>,
}

impl TaskWatchdog {
    /// Creates a disabled watchdog. No thread runs until the first `enable`.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(MonitorState {
                    config: None,
                    last_feed: [Instant::now(); MAX_CORES],
                    shutdown: false,
                }),
                wake: Condvar::new(),
                trips: AtomicU64::new(0),
            }),
            monitor: None,
        }
    }

    /// Creates a watchdog and enables it with `config`.
    pub fn start(config: &WatchdogConfig) -> Result<Self, WatchdogError> {
        let mut wd = Self::new();
        wd.enable(config)?;
        Ok(wd)
    }

    /// Records progress on `core`.
    pub fn feed(&self, core: usize) -> Result<(), WatchdogError> {
        self.shared.feed(core)
    }

    pub fn feed_handle(&self) -> FeedHandle {
        FeedHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Number of timeouts observed while `trigger_panic` was off.
    pub fn trip_count(&self) -> u64 {
        self.shared.trips.load(Ordering::Relaxed)
    }

    /// Returns the active configuration, if enabled.
    pub fn config(&self) -> Option<WatchdogConfig> {
        self.shared.lock().config
    }

    fn ensure_monitor(&mut self) -> Result<(), WatchdogError> {
        if self.monitor.is_none() {
            let shared = Arc::clone(&self.shared);
            let handle = thread::Builder::new()
                .name("task-wdt".into())
                .spawn(move || monitor_loop(&shared))?;
            self.monitor = Some(handle);
        }
        Ok(())
    }
}

impl Default for TaskWatchdog {
    fn default() -> Self {
        Self::new()
    }
}

impl Watchdog for TaskWatchdog {
    fn disable(&mut self) -> Result<(), WatchdogError> {
        let mut state = self.shared.lock();
        if state.config.take().is_none() {
            return Err(WatchdogError::NotEnabled);
        }
        drop(state);
        self.shared.wake.notify_all();
        tracing::debug!("task watchdog monitoring stopped");
        Ok(())
    }

    fn enable(&mut self, config: &WatchdogConfig) -> Result<(), WatchdogError> {
        config.validate()?;
        {
            let mut state = self.shared.lock();
            if state.config.is_some() {
                return Err(WatchdogError::AlreadyEnabled);
            }
            state.config = Some(*config);
            state.last_feed = [Instant::now(); MAX_CORES];
        }
        if let Err(e) = self.ensure_monitor() {
            self.shared.lock().config = None;
            return Err(e);
        }
        self.shared.wake.notify_all();
        tracing::debug!(config = %config, "task watchdog monitoring started");
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.shared.lock().config.is_some()
    }
}

impl Drop for TaskWatchdog {
    fn drop(&mut self) {
        self.shared.lock().shutdown = true;
        self.shared.wake.notify_all();
        if let Some(handle) = self.monitor.take() {
            if handle.join().is_err() {
                tracing::error!("task watchdog monitor thread panicked");
            }
        }
    }
}

impl std::fmt::Debug for TaskWatchdog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskWatchdog")
            .field("config", &self.config())
            .field("trips", &self.trip_count())
            .finish()
    }
}

fn monitor_loop(shared: &Shared) {
    let mut state = shared.lock();
    loop {
        if state.shutdown {
            break;
        }
        let Some(config) = state.config else {
            state = shared
                .wake
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            continue;
        };

        let poll = (config.timeout() / 4).max(Duration::from_millis(1));
        state = match shared.wake.wait_timeout(state, poll) {
            Ok((guard, _)) => guard,
            Err(poisoned) => poisoned.into_inner().0,
        };

        // Re-read: the watchdog may have been disabled or reconfigured
        // while we slept.
        if state.shutdown {
            break;
        }
        let Some(config) = state.config else {
            continue;
        };

        let now = Instant::now();
        for core in config.monitored_cores.iter() {
            let idle = now.saturating_duration_since(state.last_feed[core]);
            if idle <= config.timeout() {
                continue;
            }
            shared.trips.fetch_add(1, Ordering::Relaxed);
            tracing::error!(
                core,
                idle_ms = idle.as_millis() as u64,
                timeout_ms = config.timeout_ms,
                "task watchdog timeout: core was not fed"
            );
            if config.trigger_panic {
                tracing::error!("task watchdog aborting process");
                std::process::abort();
            }
            state.last_feed[core] = now;
        }
    }
}
