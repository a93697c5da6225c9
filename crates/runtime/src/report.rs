// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmark result and the textual report.

use std::fmt;

/// Outcome of one benchmark run.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct InferenceResult {
    /// 1-based predicted class.
    pub predicted_class: usize,
    /// Score of the predicted class.
    pub confidence: f32,
    /// Duration of the first timed pass, in microseconds.
    pub elapsed_us: u64,
    /// Arena bytes occupied by the tensor layout.
    pub arena_used_bytes: usize,
    /// Every timed pass, in order.
    pub pass_durations_us: Vec<u64>,
}

impl InferenceResult {
    pub fn min_us(&self) -> u64 {
        self.pass_durations_us.iter().copied().min().unwrap_or(self.elapsed_us)
    }

    pub fn mean_us(&self) -> f64 {
        if self.pass_durations_us.is_empty() {
            return self.elapsed_us as f64;
        }
        self.pass_durations_us.iter().sum::<u64>() as f64 / self.pass_durations_us.len() as f64
    }
}

/// The report printed once per successful run.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct BenchmarkReport {
    pub platform: String,
    pub core: usize,
    pub arena_size_bytes: usize,
    pub result: InferenceResult,
}

impl fmt::Display for BenchmarkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = &self.result;
        writeln!(f, "--- OFFLINE BENCHMARK RESULT ---")?;
        writeln!(f, "Platform: {} (Core {})", self.platform, self.core)?;
        writeln!(
            f,
            "Predicted Action: {} (Confidence: {:.3})",
            r.predicted_class, r.confidence
        )?;
        writeln!(f, "PURE INFERENCE time: {} microseconds", r.elapsed_us)?;
        write!(
            f,
            "Arena: {} of {} bytes used",
            r.arena_used_bytes, self.arena_size_bytes
        )?;
        if r.pass_durations_us.len() > 1 {
            write!(
                f,
                "\nPasses: {} (min {} us, mean {:.1} us)",
                r.pass_durations_us.len(),
                r.min_us(),
                r.mean_us()
            )?;
        }
        Ok(())
    }
}
