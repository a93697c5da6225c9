// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the task watchdog.

/// Errors returned by [`crate::Watchdog`] implementations.
#[derive(Debug, thiserror::Error)]
pub enum WatchdogError {
    /// `disable` or `feed` on a watchdog that is not running.
    #[error("task watchdog is not enabled")]
    NotEnabled,

    /// `enable` on a watchdog that is already running.
    #[error("task watchdog is already enabled")]
    AlreadyEnabled,

    /// The configuration cannot be applied.
    #[error("invalid watchdog configuration: {0}")]
    InvalidConfig(String),

    /// A feed arrived for a core outside the monitored set.
    #[error("core {core} is not monitored (monitored: {monitored})")]
    CoreNotMonitored { core: usize, monitored: String },

    /// The monitor or feeder thread could not be started.
    #[error("failed to spawn watchdog thread: {0}")]
    Spawn(#[from] std::io::Error),
}
