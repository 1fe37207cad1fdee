//! # 全连接层
//!
//! `y = x Wᵀ + b`，输入按行排列 `[batch, in_dim]`。
//! 权重按 `U(-1/√in, 1/√in)` 初始化。
//!
//! ## 依赖关系
//! - 被 `nn/output.rs` 使用

use crate::error::{MatsciError, Result};

use ndarray::{Array1, Array2};
use rand::distributions::{Distribution, Uniform};
use rand::Rng;

/// 全连接层
#[derive(Debug, Clone, PartialEq)]
pub struct Linear {
    /// `[out_dim, in_dim]`
    weight: Array2<f64>,
    bias: Option<Array1<f64>>,
}

impl Linear {
    /// 随机初始化
    pub fn new<R: Rng + ?Sized>(in_dim: usize, out_dim: usize, bias: bool, rng: &mut R) -> Result<Self> {
        if in_dim == 0 || out_dim == 0 {
            return Err(MatsciError::InvalidConfig(format!(
                "linear layer dimensions must be positive, got {} -> {}",
                in_dim, out_dim
            )));
        }
        let bound = 1.0 / (in_dim as f64).sqrt();
        let dist = Uniform::new_inclusive(-bound, bound);
        let weight = Array2::from_shape_fn((out_dim, in_dim), |_| dist.sample(rng));
        let bias = bias.then(|| Array1::from_shape_fn(out_dim, |_| dist.sample(rng)));
        Ok(Self { weight, bias })
    }

    /// 由给定参数构造
    pub fn from_parts(weight: Array2<f64>, bias: Option<Array1<f64>>) -> Result<Self> {
        if let Some(b) = &bias {
            if b.len() != weight.nrows() {
                return Err(MatsciError::DimensionMismatch {
                    expected: weight.nrows(),
                    found: b.len(),
                });
            }
        }
        Ok(Self { weight, bias })
    }

    pub fn in_dim(&self) -> usize {
        self.weight.ncols()
    }

    pub fn out_dim(&self) -> usize {
        self.weight.nrows()
    }

    pub fn weight(&self) -> &Array2<f64> {
        &self.weight
    }

    pub fn bias(&self) -> Option<&Array1<f64>> {
        self.bias.as_ref()
    }

    pub fn forward(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.in_dim() {
            return Err(MatsciError::DimensionMismatch {
                expected: self.in_dim(),
                found: x.ncols(),
            });
        }
        let mut y = x.dot(&self.weight.t());
        if let Some(b) = &self.bias {
            y += b;
        }
        Ok(y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_forward_known_weights() {
        let layer = Linear::from_parts(arr2(&[[1.0, 2.0], [0.0, -1.0]]), Some(arr1(&[0.5, 0.0]))).unwrap();
        let y = layer.forward(&arr2(&[[1.0, 1.0], [2.0, 0.0]])).unwrap();
        assert_eq!(y, arr2(&[[3.5, -1.0], [2.5, 0.0]]));
    }

    #[test]
    fn test_init_bounds() {
        let mut rng = StdRng::seed_from_u64(0);
        let layer = Linear::new(16, 4, false, &mut rng).unwrap();
        assert_eq!(layer.weight().dim(), (4, 16));
        assert!(layer.bias().is_none());
        assert!(layer.weight().iter().all(|w| w.abs() <= 0.25));
    }

    #[test]
    fn test_input_width_checked() {
        let mut rng = StdRng::seed_from_u64(0);
        let layer = Linear::new(3, 2, true, &mut rng).unwrap();
        let err = layer.forward(&Array2::zeros((1, 4))).unwrap_err();
        assert!(matches!(err, MatsciError::DimensionMismatch { expected: 3, found: 4 }));
    }
}
