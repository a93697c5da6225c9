// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The [`Watchdog`] capability and its RAII disable guard.

use crate::{WatchdogConfig, WatchdogError};

/// A process-wide liveness monitor that can be switched off and back on.
///
/// The benchmark runner receives this as an injected `&mut W`, so tests
/// can substitute a recording fake and the runner is the only mutator for
/// its lifetime.
pub trait Watchdog {
    /// Stops monitoring. Fails with [`WatchdogError::NotEnabled`] if the
    /// watchdog is already off.
    fn disable(&mut self) -> Result<(), WatchdogError>;

    /// (Re-)initialises monitoring with `config`. Fails with
    /// [`WatchdogError::AlreadyEnabled`] if the watchdog is running.
    fn enable(&mut self, config: &WatchdogConfig) -> Result<(), WatchdogError>;

    /// Returns `true` while monitoring is active.
    fn is_enabled(&self) -> bool;
}

impl<W: Watchdog + ?Sized> Watchdog for &mut W {
    fn disable(&mut self) -> Result<(), WatchdogError> {
        (**self).disable()
    }

    fn enable(&mut self, config: &WatchdogConfig) -> Result<(), WatchdogError> {
        (**self).enable(config)
    }

    fn is_enabled(&self) -> bool {
        (**self).is_enabled()
    }
}

/// Keeps a watchdog disabled for as long as the guard lives.
///
/// ```text
/// WatchdogGuard::disable(wd, cfg)   ── wd.disable()
///       │
///       ├── restore()  ── wd.enable(cfg), error returned to caller
///       └── drop       ── wd.enable(cfg), error logged
/// ```
///
/// Exactly one `enable(cfg)` follows every successful `disable`, whether
/// the guarded section returns normally, returns early, or unwinds.
pub struct WatchdogGuard<'w, W: Watchdog + ?Sized> {
    watchdog: &'w mut W,
    restore_config: WatchdogConfig,
    restored: bool,
}

impl<'w, W: Watchdog + ?Sized> WatchdogGuard<'w, W> {
    /// Disables `watchdog` and arms a guard that re-enables it with
    /// `restore_config`.
    pub fn disable(
        watchdog: &'w mut W,
        restore_config: WatchdogConfig,
    ) -> Result<Self, WatchdogError> {
        watchdog.disable()?;
        tracing::info!("task watchdog disabled");
        Ok(Self {
            watchdog,
            restore_config,
            restored: false,
        })
    }

    /// Returns the configuration the guard will restore.
    pub fn restore_config(&self) -> &WatchdogConfig {
        &self.restore_config
    }

    /// Re-enables the watchdog now and reports the outcome.
    pub fn restore(mut self) -> Result<(), WatchdogError> {
        self.restored = true;
        self.watchdog.enable(&self.restore_config)?;
        tracing::info!(config = %self.restore_config, "task watchdog re-enabled");
        Ok(())
    }
}

impl<W: Watchdog + ?Sized> Drop for WatchdogGuard<'_, W> {
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        match self.watchdog.enable(&self.restore_config) {
            Ok(()) => tracing::warn!(
                config = %self.restore_config,
                "task watchdog re-enabled by guard drop"
            ),
            Err(e) => tracing::error!(error = %e, "failed to re-enable task watchdog"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recording {
        enabled: bool,
        calls: Vec<String>,
        enabled_with: Vec<WatchdogConfig>,
    }

    impl Watchdog for Recording {
        fn disable(&mut self) -> Result<(), WatchdogError> {
            self.calls.push("disable".into());
            if !self.enabled {
                return Err(WatchdogError::NotEnabled);
            }
            self.enabled = false;
            Ok(())
        }

        fn enable(&mut self, config: &WatchdogConfig) -> Result<(), WatchdogError> {
            self.calls.push("enable".into());
            if self.enabled {
                return Err(WatchdogError::AlreadyEnabled);
            }
            self.enabled = true;
            self.enabled_with.push(*config);
            Ok(())
        }

        fn is_enabled(&self) -> bool {
            self.enabled
        }
    }

    fn running() -> Recording {
        Recording {
            enabled: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_restore_reenables_once() {
        let mut wd = running();
        let guard = WatchdogGuard::disable(&mut wd, WatchdogConfig::default()).unwrap();
        guard.restore().unwrap();
        assert_eq!(wd.calls, ["disable", "enable"]);
        assert_eq!(wd.enabled_with, [WatchdogConfig::default()]);
        assert!(wd.is_enabled());
    }

    #[test]
    fn test_drop_reenables() {
        let mut wd = running();
        {
            let guard = WatchdogGuard::disable(&mut wd, WatchdogConfig::default()).unwrap();
            assert!(!guard.watchdog.is_enabled());
        }
        assert_eq!(wd.calls, ["disable", "enable"]);
        assert!(wd.is_enabled());
    }

    #[test]
    fn test_reenables_on_unwind() {
        let mut wd = running();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = WatchdogGuard::disable(&mut wd, WatchdogConfig::default()).unwrap();
            panic!("kernel blew up");
        }));
        assert!(result.is_err());
        assert_eq!(wd.calls, ["disable", "enable"]);
    }

    #[test]
    fn test_disable_when_off_fails() {
        let mut wd = Recording::default();
        let err = WatchdogGuard::disable(&mut wd, WatchdogConfig::default()).err();
        assert!(matches!(err, Some(WatchdogError::NotEnabled)));
        assert_eq!(wd.calls, ["disable"]);
    }

    #[test]
    fn test_restore_uses_given_config() {
        let mut wd = running();
        let cfg = WatchdogConfig {
            timeout_ms: 1234,
            trigger_panic: false,
            ..Default::default()
        };
        let guard = WatchdogGuard::disable(&mut wd, cfg).unwrap();
        assert_eq!(guard.restore_config().timeout_ms, 1234);
        guard.restore().unwrap();
        assert_eq!(wd.enabled_with, [cfg]);
    }

    #[test]
    fn test_restore_error_is_reported() {
        let mut wd = running();
        let mut guard = WatchdogGuard::disable(&mut wd, WatchdogConfig::default()).unwrap();
        guard.watchdog.enabled = true; // someone else re-enabled it
        assert!(matches!(guard.restore(), Err(WatchdogError::AlreadyEnabled)));
    }
}
