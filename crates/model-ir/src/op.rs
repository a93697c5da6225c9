// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The closed operator set.
//!
//! [`OpKind`] names a kernel; [`Operator`] is a kernel plus the parameters
//! and weight references one graph node needs. Both are closed enums, so
//! the interpreter dispatches with a plain `match` and a missing kernel is
//! a compile error rather than a lookup miss.

use tensor_core::{Activation, Conv2dParams, Padding, Pool2dParams};

/// The kind of computation a node performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum OpKind {
    #[serde(rename = "conv_2d")]
    Conv2d,
    #[serde(rename = "max_pool_2d")]
    MaxPool2d,
    #[serde(rename = "relu")]
    Relu,
    #[serde(rename = "fully_connected")]
    FullyConnected,
    #[serde(rename = "reshape")]
    Reshape,
    #[serde(rename = "softmax")]
    Softmax,
    #[serde(rename = "pad")]
    Pad,
    #[serde(rename = "transpose")]
    Transpose,
    #[serde(rename = "dequantize")]
    Dequantize,
}

impl OpKind {
    /// Returns the manifest tag for this operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conv2d => "conv_2d",
            Self::MaxPool2d => "max_pool_2d",
            Self::Relu => "relu",
            Self::FullyConnected => "fully_connected",
            Self::Reshape => "reshape",
            Self::Softmax => "softmax",
            Self::Pad => "pad",
            Self::Transpose => "transpose",
            Self::Dequantize => "dequantize",
        }
    }
}

impl std::fmt::Display for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn unit_stride() -> [usize; 2] {
    [1, 1]
}

fn unit_beta() -> f32 {
    1.0
}

/// One node's operator, parameters and weight references.
///
/// Serialized with an `"op"` tag next to the parameters:
///
/// ```json
/// { "op": "conv_2d", "filter": "conv1.w", "bias": "conv1.b", "padding": "same", "activation": "relu" }
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "op")]
pub enum Operator {
    /// 2-D convolution; `filter` is `[C_out, KH, KW, C_in]`.
    #[serde(rename = "conv_2d")]
    Conv2d {
        filter: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bias: Option<String>,
        #[serde(default = "unit_stride")]
        stride: [usize; 2],
        #[serde(default)]
        padding: Padding,
        #[serde(default)]
        activation: Activation,
    },
    /// 2-D max pooling.
    #[serde(rename = "max_pool_2d")]
    MaxPool2d {
        filter: [usize; 2],
        stride: [usize; 2],
        #[serde(default)]
        padding: Padding,
    },
    #[serde(rename = "relu")]
    Relu,
    /// Dense layer; `weights` is `[units, in_features]`.
    #[serde(rename = "fully_connected")]
    FullyConnected {
        weights: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bias: Option<String>,
        #[serde(default)]
        activation: Activation,
    },
    /// Target dimensions; one entry may be `-1`.
    #[serde(rename = "reshape")]
    Reshape { shape: Vec<i64> },
    #[serde(rename = "softmax")]
    Softmax {
        #[serde(default = "unit_beta")]
        beta: f32,
    },
    /// `[before, after]` per dimension.
    #[serde(rename = "pad")]
    Pad { paddings: Vec<[usize; 2]> },
    #[serde(rename = "transpose")]
    Transpose { perm: Vec<usize> },
    /// Affine int8 to f32.
    #[serde(rename = "dequantize")]
    Dequantize {
        scale: f32,
        #[serde(default)]
        zero_point: i32,
    },
}

impl Operator {
    /// Returns the kernel this operator runs on.
    pub fn kind(&self) -> OpKind {
        match self {
            Self::Conv2d { .. } => OpKind::Conv2d,
            Self::MaxPool2d { .. } => OpKind::MaxPool2d,
            Self::Relu => OpKind::Relu,
            Self::FullyConnected { .. } => OpKind::FullyConnected,
            Self::Reshape { .. } => OpKind::Reshape,
            Self::Softmax { .. } => OpKind::Softmax,
            Self::Pad { .. } => OpKind::Pad,
            Self::Transpose { .. } => OpKind::Transpose,
            Self::Dequantize { .. } => OpKind::Dequantize,
        }
    }

    /// Names of the weight tensors this operator reads from the blob.
    pub fn weight_names(&self) -> Vec<&str> {
        match self {
            Self::Conv2d { filter, bias, .. } => {
                std::iter::once(filter.as_str()).chain(bias.as_deref()).collect()
            }
            Self::FullyConnected { weights, bias, .. } => {
                std::iter::once(weights.as_str()).chain(bias.as_deref()).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Convolution geometry, if this is a convolution.
    pub fn conv2d_params(&self) -> Option<Conv2dParams> {
        match *self {
            Self::Conv2d {
                stride,
                padding,
                activation,
                ..
            } => Some(Conv2dParams {
                stride,
                padding,
                activation,
            }),
            _ => None,
        }
    }

    /// Pooling geometry, if this is a pooling node.
    pub fn pool2d_params(&self) -> Option<Pool2dParams> {
        match *self {
            Self::MaxPool2d {
                filter,
                stride,
                padding,
            } => Some(Pool2dParams {
                filter,
                stride,
                padding,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        assert_eq!(OpKind::Conv2d.as_str(), "conv_2d");
        assert_eq!(OpKind::MaxPool2d.to_string(), "max_pool_2d");
        assert_eq!(
            serde_json::to_string(&OpKind::FullyConnected).unwrap(),
            "\"fully_connected\""
        );
    }

    #[test]
    fn test_operator_from_json_defaults() {
        let op: Operator =
            serde_json::from_str(r#"{"op": "conv_2d", "filter": "c1.w"}"#).unwrap();
        assert_eq!(op.kind(), OpKind::Conv2d);
        assert_eq!(op.conv2d_params(), Some(Conv2dParams::default()));
        assert_eq!(op.weight_names(), vec!["c1.w"]);

        let op: Operator = serde_json::from_str(r#"{"op": "softmax"}"#).unwrap();
        assert_eq!(op, Operator::Softmax { beta: 1.0 });
    }

    #[test]
    fn test_operator_unknown_tag() {
        let result: Result<Operator, _> = serde_json::from_str(r#"{"op": "gelu"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_weight_names_with_bias() {
        let op = Operator::FullyConnected {
            weights: "fc.w".into(),
            bias: Some("fc.b".into()),
            activation: Activation::None,
        };
        assert_eq!(op.weight_names(), vec!["fc.w", "fc.b"]);
        assert!(Operator::Relu.weight_names().is_empty());
    }

    #[test]
    fn test_pool_params() {
        let op: Operator = serde_json::from_str(
            r#"{"op": "max_pool_2d", "filter": [2, 1], "stride": [2, 1], "padding": "valid"}"#,
        )
        .unwrap();
        let p = op.pool2d_params().unwrap();
        assert_eq!(p.filter, [2, 1]);
        assert_eq!(p.padding, Padding::Valid);
        assert!(op.conv2d_params().is_none());
    }
}
