// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # task-watchdog
//!
//! The process-wide liveness monitor a long blocking call has to step
//! around.
//!
//! # Key Components
//!
//! - [`Watchdog`]: the capability (`disable` / `enable(config)` /
//!   `is_enabled`) the benchmark runner is handed.
//! - [`WatchdogGuard`]: disables on construction and re-enables with the
//!   saved configuration on `restore()` or drop, so no exit path leaves
//!   the system unmonitored.
//! - [`TaskWatchdog`]: the host implementation, a monitor thread checking
//!   per-core feed times against [`WatchdogConfig::timeout_ms`].
//! - [`IdleFeeder`] and [`CoreClaim`]: periodic idle-context feeding, with
//!   busy cores skipped.
//!
//! # Example
//! ```
//! use task_watchdog::{TaskWatchdog, Watchdog, WatchdogConfig, WatchdogGuard};
//!
//! let cfg = WatchdogConfig { trigger_panic: false, ..Default::default() };
//! let mut wd = TaskWatchdog::start(&cfg).unwrap();
//!
//! let guard = WatchdogGuard::disable(&mut wd, cfg).unwrap();
//! // ... long blocking call ...
//! guard.restore().unwrap();
//! assert!(wd.is_enabled());
//! ```

mod config;
mod error;
mod feeder;
mod guard;
mod monitor;

pub use config::{CoreMask, WatchdogConfig, DEFAULT_TIMEOUT_MS, MAX_CORES};
pub use error::WatchdogError;
pub use feeder::{CoreClaim, IdleFeeder};
pub use guard::{Watchdog, WatchdogGuard};
pub use monitor::{FeedHandle, TaskWatchdog};
