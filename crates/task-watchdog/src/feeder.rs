// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Idle-context feeding.
//!
//! On the device each core's idle task feeds the watchdog whenever it gets
//! to run. A long busy task pinned to a core starves that core's idle task,
//! and the watchdog trips. [`IdleFeeder`] reproduces this on the host: it
//! feeds every monitored core periodically, except cores held by a
//! [`CoreClaim`].

use crate::{CoreMask, FeedHandle, WatchdogError, MAX_CORES};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

struct FeederInner {
    claims: [AtomicUsize; MAX_CORES],
    stop: AtomicBool,
}

/// Marks a core as busy while alive. The feeder skips busy cores.
pub struct CoreClaim {
    inner: Arc<FeederInner>,
    core: usize,
}

impl CoreClaim {
    pub fn core(&self) -> usize {
        self.core
    }
}

impl Drop for CoreClaim {
    fn drop(&mut self) {
        self.inner.claims[self.core].fetch_sub(1, Ordering::AcqRel);
    }
}

/// Background thread feeding idle cores.
pub struct IdleFeeder {
    inner: Arc<FeederInner>,
    thread: Option<JoinHandle<()>>,
}

impl IdleFeeder {
    /// Starts feeding `cores` through `handle` every `period`.
    pub fn start(
        handle: FeedHandle,
        cores: CoreMask,
        period: Duration,
    ) -> Result<Self, WatchdogError> {
        let inner = Arc::new(FeederInner {
            claims: std::array::from_fn(|_| AtomicUsize::new(0)),
            stop: AtomicBool::new(false),
        });
        let shared = Arc::clone(&inner);
        let thread = thread::Builder::new()
            .name("idle-feeder".into())
            .spawn(move || feed_loop(&shared, &handle, cores, period))?;
        tracing::debug!(cores = %cores, period_ms = period.as_millis() as u64, "idle feeder started");
        Ok(Self {
            inner,
            thread: Some(thread),
        })
    }

    /// Marks `core` busy until the returned claim is dropped.
    pub fn claim(&self, core: usize) -> Result<CoreClaim, WatchdogError> {
        if core >= MAX_CORES {
            return Err(WatchdogError::InvalidConfig(format!(
                "core id {core} out of range"
            )));
        }
        self.inner.claims[core].fetch_add(1, Ordering::AcqRel);
        Ok(CoreClaim {
            inner: Arc::clone(&self.inner),
            core,
        })
    }

    pub fn is_claimed(&self, core: usize) -> bool {
        self.inner
            .claims
            .get(core)
            .is_some_and(|c| c.load(Ordering::Acquire) > 0)
    }

    /// Stops the feeder thread. Dropping does the same.
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for IdleFeeder {
    fn drop(&mut self) {
        self.inner.stop.store(true, Ordering::Release);
        if let Some(handle) = self.thread.take() {
            handle.thread().unpark();
            if handle.join().is_err() {
                tracing::error!("idle feeder thread panicked");
            }
        }
    }
}

fn feed_loop(inner: &FeederInner, handle: &FeedHandle, cores: CoreMask, period: Duration) {
    while !inner.stop.load(Ordering::Acquire) {
        for core in cores.iter() {
            if inner.claims[core].load(Ordering::Acquire) > 0 {
                continue;
            }
            match handle.feed(core) {
                Ok(()) | Err(WatchdogError::NotEnabled) => {}
                Err(e) => tracing::trace!(core, error = %e, "idle feed rejected"),
            }
        }
        thread::park_timeout(period);
    }
}
