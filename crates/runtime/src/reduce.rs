// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Output reduction: the arg-max over class scores.

/// The winning class of an output vector.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Prediction {
    /// 1-based class index.
    pub class: usize,
    /// Score of the winning class.
    pub confidence: f32,
}

/// Scans the first `class_count` scores and returns the highest.
///
/// Comparison is strict, so on a tie the earliest class wins. NaN scores
/// never win. Returns `None` for an empty scan or when every scanned score
/// is NaN.
///
/// ```
/// use runtime::reduce_scores;
///
/// let p = reduce_scores(&[0.1, 0.7, 0.05, 0.7, 0.05], 5).unwrap();
/// assert_eq!((p.class, p.confidence), (2, 0.7));
/// ```
pub fn reduce_scores(scores: &[f32], class_count: usize) -> Option<Prediction> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &score) in scores.iter().take(class_count).enumerate() {
        if score.is_nan() {
            continue;
        }
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((i, score));
        }
    }
    best.map(|(i, confidence)| Prediction {
        class: i + 1,
        confidence,
    })
}
