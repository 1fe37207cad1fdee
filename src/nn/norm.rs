//! # RMS 归一化
//!
//! `y = x / (rms + eps) * scale (+ bias)`，其中
//! `rms = sqrt(mean(x[..k]²))`，`k = floor(coverage_fraction * dim)`。
//! `coverage_fraction = 1.0` 即完整 RMSNorm，小于 1 时只用前 `k` 个特征估计 RMS
//! （partial RMSNorm），但归一化作用于全部特征。
//!
//! ## 依赖关系
//! - 被 `nn/output.rs` 使用
//! - 使用 `nn/registry.rs` 的 `NormKind`

use crate::error::{MatsciError, Result};
use crate::nn::registry::NormKind;

use ndarray::{s, Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// RMSNorm 配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RmsNormConfig {
    pub eps: f64,
    /// 参与 RMS 估计的特征比例，取值 (0, 1]
    pub coverage_fraction: f64,
    pub bias: bool,
}

impl Default for RmsNormConfig {
    fn default() -> Self {
        Self {
            eps: 1e-8,
            coverage_fraction: 1.0,
            bias: false,
        }
    }
}

/// RMS 归一化层
#[derive(Debug, Clone, PartialEq)]
pub struct RmsNorm {
    dim: usize,
    partial_len: usize,
    eps: f64,
    scale: Array1<f64>,
    bias: Option<Array1<f64>>,
}

impl RmsNorm {
    pub fn new(dim: usize, config: &RmsNormConfig) -> Result<Self> {
        let fraction = config.coverage_fraction;
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(MatsciError::InvalidConfig(format!(
                "coverage_fraction must be in (0, 1], got {}",
                fraction
            )));
        }
        let partial_len = (fraction * dim as f64).floor() as usize;
        if partial_len == 0 {
            return Err(MatsciError::InvalidConfig(format!(
                "coverage_fraction {} covers no features of dimension {}",
                fraction, dim
            )));
        }
        if !(config.eps >= 0.0) {
            return Err(MatsciError::InvalidConfig(format!(
                "eps must be non-negative, got {}",
                config.eps
            )));
        }

        Ok(Self {
            dim,
            partial_len,
            eps: config.eps,
            scale: Array1::ones(dim),
            bias: config.bias.then(|| Array1::zeros(dim)),
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// 参与 RMS 估计的特征数
    pub fn partial_len(&self) -> usize {
        self.partial_len
    }

    pub fn scale_mut(&mut self) -> &mut Array1<f64> {
        &mut self.scale
    }

    pub fn forward(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.dim {
            return Err(MatsciError::DimensionMismatch {
                expected: self.dim,
                found: x.ncols(),
            });
        }

        let head = x.slice(s![.., ..self.partial_len]);
        let rms = head
            .mapv(|v| v * v)
            .mean_axis(Axis(1))
            .map(|m| m.mapv(f64::sqrt))
            .ok_or(MatsciError::EmptyBatch)?;

        let denom = (rms + self.eps).insert_axis(Axis(1));
        let mut y = x / &denom * &self.scale;
        if let Some(b) = &self.bias {
            y += b;
        }
        Ok(y)
    }
}

/// 块内归一化
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Norm {
    #[default]
    Identity,
    Rms(RmsNorm),
}

impl Norm {
    pub fn build(kind: NormKind, dim: usize, config: &RmsNormConfig) -> Result<Self> {
        match kind {
            NormKind::Identity => Ok(Norm::Identity),
            NormKind::RmsNorm => RmsNorm::new(dim, config).map(Norm::Rms),
        }
    }

    pub fn forward(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        match self {
            Norm::Identity => Ok(x.clone()),
            Norm::Rms(norm) => norm.forward(x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use ndarray::arr2;

    #[test]
    fn test_constant_row_normalizes_to_sign() {
        let norm = RmsNorm::new(4, &RmsNormConfig::default()).unwrap();
        let y = norm.forward(&arr2(&[[3.0, 3.0, 3.0, 3.0], [-2.0, -2.0, -2.0, -2.0]])).unwrap();
        for v in y.row(0) {
            assert!((v - 1.0).abs() < 1e-6);
        }
        for v in y.row(1) {
            assert!((v + 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_unit_rms_output() {
        let norm = RmsNorm::new(3, &RmsNormConfig::default()).unwrap();
        let y = norm.forward(&arr2(&[[1.0, -4.0, 8.0]])).unwrap();
        let rms = (y.mapv(|v| v * v).sum() / 3.0).sqrt();
        assert!((rms - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_partial_coverage_uses_leading_slice() {
        let config = RmsNormConfig {
            coverage_fraction: 0.5,
            ..RmsNormConfig::default()
        };
        let norm = RmsNorm::new(4, &config).unwrap();
        assert_eq!(norm.partial_len(), 2);

        // rms 只由前两个特征 (2, 2) 决定
        let y = norm.forward(&arr2(&[[2.0, 2.0, 100.0, -50.0]])).unwrap();
        assert!((y[[0, 0]] - 1.0).abs() < 1e-6);
        assert!((y[[0, 2]] - 50.0).abs() < 1e-5);
        assert!((y[[0, 3]] + 25.0).abs() < 1e-5);
    }

    #[test]
    fn test_bias_and_scale() {
        let config = RmsNormConfig {
            bias: true,
            ..RmsNormConfig::default()
        };
        let mut norm = RmsNorm::new(2, &config).unwrap();
        norm.scale_mut().fill(2.0);
        let y = norm.forward(&arr2(&[[1.0, 1.0]])).unwrap();
        assert!((y[[0, 1]] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_coverage() {
        for fraction in [0.0, 1.5, -0.2, f64::NAN] {
            let config = RmsNormConfig {
                coverage_fraction: fraction,
                ..RmsNormConfig::default()
            };
            assert_eq!(RmsNorm::new(8, &config).unwrap_err().kind(), ErrorKind::Config);
        }
        let tiny = RmsNormConfig {
            coverage_fraction: 0.1,
            ..RmsNormConfig::default()
        };
        assert!(RmsNorm::new(4, &tiny).is_err());
    }

    #[test]
    fn test_norm_identity_passthrough() {
        let norm = Norm::build(NormKind::Identity, 3, &RmsNormConfig::default()).unwrap();
        let x = arr2(&[[1.0, 2.0, 3.0]]);
        assert_eq!(norm.forward(&x).unwrap(), x);
    }
}
