// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmark configuration.
//!
//! Every field defaults to a compile-time constant, so an empty file (or no
//! file at all) reproduces the device build. Host tooling may override any
//! of them from TOML.
//!
//! # TOML Format
//! ```toml
//! platform = "ESP32-S3"
//! arena_size = "700K"
//! external_pool_size = "8M"
//! planner = "greedy"
//! class_count = 5
//! iterations = 1
//!
//! [task]
//! name = "BenchmarkTask"
//! stack_size = 32768
//! priority = 5
//! core = 1
//!
//! [watchdog]
//! timeout_ms = 5000
//! monitored_cores = [0, 1]
//! trigger_panic = true
//! ```

use crate::RuntimeError;
use arena_planner::{planner_by_name, MemoryPlanner, PLANNER_NAMES};
use memory_manager::MemoryBudget;
use std::path::Path;
use task_watchdog::WatchdogConfig;

/// Scratch arena carved from external RAM for one session.
pub const DEFAULT_ARENA_SIZE: MemoryBudget = MemoryBudget::from_kb(700);
/// External RAM made available to the harness.
pub const DEFAULT_EXTERNAL_POOL_SIZE: MemoryBudget = MemoryBudget::from_mb(8);
/// Number of output classes scanned by the reduction.
pub const DEFAULT_CLASS_COUNT: usize = 5;
/// Benchmark task stack, in bytes.
pub const TASK_STACK_SIZE: usize = 32768;
pub const TASK_PRIORITY: u8 = 5;
/// Core the benchmark task is pinned to. Core 0 stays with system tasks.
pub const TASK_CORE: usize = 1;
pub const TASK_NAME: &str = "BenchmarkTask";
pub const DEFAULT_PLATFORM: &str = "ESP32-S3";
pub const DEFAULT_PLANNER: &str = "greedy";

/// Scheduling parameters of the benchmark task.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    pub name: String,
    pub stack_size: usize,
    pub priority: u8,
    pub core: usize,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            name: TASK_NAME.to_string(),
            stack_size: TASK_STACK_SIZE,
            priority: TASK_PRIORITY,
            core: TASK_CORE,
        }
    }
}

/// Configuration for one benchmark run.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    /// Platform label printed in the report.
    pub platform: String,
    /// Scratch arena size (human-readable, e.g. `"700K"`).
    pub arena_size: String,
    /// Capacity of the external memory pool the arena comes from.
    pub external_pool_size: String,
    /// Arena planner: `"greedy"` or `"linear"`.
    pub planner: String,
    /// Number of leading output scores the reduction scans.
    pub class_count: usize,
    /// Timed passes inside one watchdog window. The report uses the first.
    pub iterations: usize,
    pub task: TaskConfig,
    /// Configuration the watchdog is restored with after the timed pass.
    pub watchdog: WatchdogConfig,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            platform: DEFAULT_PLATFORM.to_string(),
            arena_size: "700K".to_string(),
            external_pool_size: "8M".to_string(),
            planner: DEFAULT_PLANNER.to_string(),
            class_count: DEFAULT_CLASS_COUNT,
            iterations: 1,
            task: TaskConfig::default(),
            watchdog: WatchdogConfig::default(),
        }
    }
}

impl BenchmarkConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, RuntimeError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RuntimeError::Config(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, RuntimeError> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| RuntimeError::Config(format!("TOML parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, RuntimeError> {
        toml::to_string_pretty(self)
            .map_err(|e| RuntimeError::Config(format!("TOML serialise error: {e}")))
    }

    /// Checks every field that can be checked without touching memory.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        self.parse_arena_size()?;
        self.parse_external_pool_size()?;
        self.create_planner()?;
        if self.class_count == 0 {
            return Err(RuntimeError::Config("class_count must be at least 1".into()));
        }
        if self.iterations == 0 {
            return Err(RuntimeError::Config("iterations must be at least 1".into()));
        }
        if self.task.stack_size == 0 {
            return Err(RuntimeError::Config("task stack_size must be > 0".into()));
        }
        self.watchdog
            .validate()
            .map_err(|e| RuntimeError::Config(e.to_string()))
    }

    pub fn parse_arena_size(&self) -> Result<MemoryBudget, RuntimeError> {
        MemoryBudget::parse(&self.arena_size)
            .map_err(|e| RuntimeError::Config(format!("invalid arena_size: {e}")))
    }

    pub fn parse_external_pool_size(&self) -> Result<MemoryBudget, RuntimeError> {
        MemoryBudget::parse(&self.external_pool_size)
            .map_err(|e| RuntimeError::Config(format!("invalid external_pool_size: {e}")))
    }

    /// Creates the arena planner named by this config.
    pub fn create_planner(&self) -> Result<Box<dyn MemoryPlanner>, RuntimeError> {
        planner_by_name(&self.planner).ok_or_else(|| {
            RuntimeError::Config(format!(
                "unknown planner '{}'; expected one of {PLANNER_NAMES:?}",
                self.planner
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_constants() {
        let c = BenchmarkConfig::default();
        assert_eq!(c.parse_arena_size().unwrap(), DEFAULT_ARENA_SIZE);
        assert_eq!(c.parse_external_pool_size().unwrap(), DEFAULT_EXTERNAL_POOL_SIZE);
        assert_eq!(c.class_count, 5);
        assert_eq!(c.iterations, 1);
        assert_eq!(c.task.stack_size, 32768);
        assert_eq!(c.task.priority, 5);
        assert_eq!(c.task.core, 1);
        assert_eq!(c.watchdog, WatchdogConfig::default());
        c.validate().unwrap();
    }

    #[test]
    fn test_from_toml_partial() {
        let c = BenchmarkConfig::from_toml(
            r#"
arena_size = "512K"
planner = "linear"

[task]
core = 0
"#,
        )
        .unwrap();
        assert_eq!(c.parse_arena_size().unwrap().as_kb(), 512);
        assert_eq!(c.create_planner().unwrap().name(), "linear");
        assert_eq!(c.task.core, 0);
        assert_eq!(c.task.name, TASK_NAME);
        assert_eq!(c.platform, DEFAULT_PLATFORM);
    }

    #[test]
    fn test_from_toml_watchdog_section() {
        let c = BenchmarkConfig::from_toml(
            r#"
[watchdog]
timeout_ms = 250
monitored_cores = [1]
trigger_panic = false
"#,
        )
        .unwrap();
        assert_eq!(c.watchdog.timeout_ms, 250);
        assert!(!c.watchdog.trigger_panic);
        assert!(c.watchdog.monitored_cores.contains(1));
        assert!(!c.watchdog.monitored_cores.contains(0));
    }

    #[test]
    fn test_to_toml_roundtrip() {
        let c = BenchmarkConfig::default();
        let back = BenchmarkConfig::from_toml(&c.to_toml().unwrap()).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_invalid_values() {
        for toml in [
            "arena_size = \"lots\"",
            "planner = \"speculative\"",
            "class_count = 0",
            "iterations = 0",
            "[watchdog]\ntimeout_ms = 0",
        ] {
            assert!(
                matches!(BenchmarkConfig::from_toml(toml), Err(RuntimeError::Config(_))),
                "accepted: {toml}"
            );
        }
    }

    #[test]
    fn test_from_missing_file() {
        let err = BenchmarkConfig::from_file(Path::new("/nonexistent/bench.toml")).unwrap_err();
        assert!(err.to_string().contains("cannot read config"));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bench.toml");
        std::fs::write(&path, "arena_size = \"64K\"\niterations = 3\n").unwrap();
        let config = BenchmarkConfig::from_file(&path).unwrap();
        assert_eq!(config.parse_arena_size().unwrap().as_bytes(), 64 * 1024);
        assert_eq!(config.iterations, 3);
        assert_eq!(config.platform, DEFAULT_PLATFORM);
    }
}
