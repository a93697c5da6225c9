// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Watchdog configuration.
//!
//! ```toml
//! [watchdog]
//! timeout_ms = 5000
//! monitored_cores = [0, 1]
//! trigger_panic = true
//! ```

use crate::WatchdogError;
use std::fmt;
use std::time::Duration;

/// Highest core id a [`CoreMask`] can hold, plus one.
pub const MAX_CORES: usize = 32;

/// Default timeout before an unfed core trips the watchdog.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// A set of core ids, stored as a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct CoreMask(u32);

impl CoreMask {
    /// Both cores of a dual-core SoC.
    pub const DUAL: CoreMask = CoreMask(0b11);

    /// Builds a mask from raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Builds a mask from core ids.
    pub fn from_cores(cores: &[usize]) -> Result<Self, WatchdogError> {
        cores.iter().try_fold(Self(0), |mask, &core| {
            if core >= MAX_CORES {
                return Err(WatchdogError::InvalidConfig(format!(
                    "core id {core} out of range (max {})",
                    MAX_CORES - 1
                )));
            }
            Ok(Self(mask.0 | (1 << core)))
        })
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub const fn contains(&self, core: usize) -> bool {
        core < MAX_CORES && self.0 & (1 << core) != 0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterates core ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..MAX_CORES).filter(move |&c| self.contains(c))
    }
}

impl TryFrom<Vec<usize>> for CoreMask {
    type Error = WatchdogError;

    fn try_from(cores: Vec<usize>) -> Result<Self, Self::Error> {
        Self::from_cores(&cores)
    }
}

impl From<CoreMask> for Vec<usize> {
    fn from(mask: CoreMask) -> Self {
        mask.iter().collect()
    }
}

impl fmt::Display for CoreMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cores: Vec<String> = self.iter().map(|c| c.to_string()).collect();
        write!(f, "{{{}}}", cores.join(","))
    }
}

/// How the watchdog is (re-)initialised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct WatchdogConfig {
    /// Time a monitored core may go unfed.
    pub timeout_ms: u64,
    /// Cores whose idle context must keep feeding.
    pub monitored_cores: CoreMask,
    /// Abort the process on timeout instead of logging.
    pub trigger_panic: bool,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            monitored_cores: CoreMask::DUAL,
            trigger_panic: true,
        }
    }
}

impl WatchdogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> Result<(), WatchdogError> {
        if self.timeout_ms == 0 {
            return Err(WatchdogError::InvalidConfig("timeout_ms must be > 0".into()));
        }
        if self.monitored_cores.is_empty() {
            return Err(WatchdogError::InvalidConfig(
                "monitored_cores must not be empty".into(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for WatchdogConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "timeout {} ms, cores {}, {}",
            self.timeout_ms,
            self.monitored_cores,
            if self.trigger_panic { "panic on timeout" } else { "log on timeout" }
        )
    }
}
