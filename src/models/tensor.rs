//! # 张量值
//!
//! 样本与批次中数值字段的统一表示：浮点、整数、布尔三种 n 维数组。
//! 底层使用 `ndarray::ArrayD`，这里只负责堆叠、拼接与零填充。
//!
//! ## 依赖关系
//! - 被 `models/sample.rs`, `models/graph.rs`, `collate/` 使用
//! - 使用 `ndarray`

use ndarray::{ArrayD, ArrayViewD, Axis, ErrorKind as ShapeErrorKind, IxDyn, ShapeError, Slice};
use std::fmt;

/// 元素类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DType {
    Float,
    Int,
    Bool,
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::Float => write!(f, "float"),
            DType::Int => write!(f, "int"),
            DType::Bool => write!(f, "bool"),
        }
    }
}

/// n 维数值数组
#[derive(Debug, Clone, PartialEq)]
pub enum Tensor {
    Float(ArrayD<f64>),
    Int(ArrayD<i64>),
    Bool(ArrayD<bool>),
}

impl Tensor {
    pub fn dtype(&self) -> DType {
        match self {
            Tensor::Float(_) => DType::Float,
            Tensor::Int(_) => DType::Int,
            Tensor::Bool(_) => DType::Bool,
        }
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            Tensor::Float(a) => a.shape(),
            Tensor::Int(a) => a.shape(),
            Tensor::Bool(a) => a.shape(),
        }
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// 第一维长度；标量返回 `None`
    pub fn leading_dim(&self) -> Option<usize> {
        self.shape().first().copied()
    }

    pub fn as_float(&self) -> Option<&ArrayD<f64>> {
        match self {
            Tensor::Float(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<&ArrayD<i64>> {
        match self {
            Tensor::Int(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<&ArrayD<bool>> {
        match self {
            Tensor::Bool(a) => Some(a),
            _ => None,
        }
    }

    /// 0 维浮点标量
    pub fn scalar(value: f64) -> Self {
        Tensor::Float(ArrayD::from_elem(IxDyn(&[]), value))
    }

    /// 沿第 0 维拼接同类型张量（图批处理时合并节点/边数据）
    pub fn concat(parts: &[&Tensor]) -> Option<Tensor> {
        let first = parts.first()?;
        match first {
            Tensor::Float(_) => {
                let arrays: Option<Vec<_>> = parts.iter().map(|t| t.as_float()).collect();
                concat_arrays(&arrays?).ok().map(Tensor::Float)
            }
            Tensor::Int(_) => {
                let arrays: Option<Vec<_>> = parts.iter().map(|t| t.as_int()).collect();
                concat_arrays(&arrays?).ok().map(Tensor::Int)
            }
            Tensor::Bool(_) => {
                let arrays: Option<Vec<_>> = parts.iter().map(|t| t.as_bool()).collect();
                concat_arrays(&arrays?).ok().map(Tensor::Bool)
            }
        }
    }
}

impl From<ArrayD<f64>> for Tensor {
    fn from(a: ArrayD<f64>) -> Self {
        Tensor::Float(a)
    }
}

impl From<ArrayD<i64>> for Tensor {
    fn from(a: ArrayD<i64>) -> Self {
        Tensor::Int(a)
    }
}

impl From<ArrayD<bool>> for Tensor {
    fn from(a: ArrayD<bool>) -> Self {
        Tensor::Bool(a)
    }
}

/// 沿新的第 0 维堆叠；形状必须完全一致
pub fn stack_arrays<T: Clone>(arrays: &[&ArrayD<T>]) -> Result<ArrayD<T>, ShapeError> {
    let views: Vec<ArrayViewD<'_, T>> = arrays.iter().map(|a| a.view()).collect();
    ndarray::stack(Axis(0), &views)
}

/// 沿已有第 0 维拼接
pub fn concat_arrays<T: Clone>(arrays: &[&ArrayD<T>]) -> Result<ArrayD<T>, ShapeError> {
    let views: Vec<ArrayViewD<'_, T>> = arrays.iter().map(|a| a.view()).collect();
    ndarray::concatenate(Axis(0), &views)
}

/// 将变长数组填充到 `(n, max_len, *trailing)`
///
/// 每个样本的数据写入其槽位的前缀 `[0, len_i)`，其余位置为 `fill`。
/// 秩为 0、尾部维度不一致或长度超过 `max_len` 时返回 `IncompatibleShape`。
pub fn pad_arrays<T: Clone>(
    arrays: &[&ArrayD<T>],
    max_len: usize,
    fill: T,
) -> Result<ArrayD<T>, ShapeError> {
    let trailing: &[usize] = arrays
        .first()
        .and_then(|a| a.shape().get(1..))
        .unwrap_or(&[]);
    let fits = |a: &&ArrayD<T>| {
        a.ndim() >= 1 && a.shape()[0] <= max_len && &a.shape()[1..] == trailing
    };
    if !arrays.iter().all(fits) {
        return Err(ShapeError::from_kind(ShapeErrorKind::IncompatibleShape));
    }

    let mut shape = Vec::with_capacity(trailing.len() + 2);
    shape.push(arrays.len());
    shape.push(max_len);
    shape.extend_from_slice(trailing);

    let mut out = ArrayD::from_elem(IxDyn(&shape), fill);
    for (i, array) in arrays.iter().enumerate() {
        let len = array.shape()[0];
        out.index_axis_mut(Axis(0), i)
            .slice_axis_mut(Axis(0), Slice::from(0..len))
            .assign(*array);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    #[test]
    fn test_pad_arrays_prefix_copy() {
        let a = arr2(&[[1.0, 2.0], [3.0, 4.0]]).into_dyn();
        let b = arr2(&[[5.0, 6.0]]).into_dyn();
        let padded = pad_arrays(&[&a, &b], 3, 0.0).unwrap();

        assert_eq!(padded.shape(), &[2, 3, 2]);
        assert_eq!(padded[[0, 1, 1]], 4.0);
        assert_eq!(padded[[1, 0, 0]], 5.0);
        assert_eq!(padded[[1, 1, 0]], 0.0);
        assert_eq!(padded[[0, 2, 0]], 0.0);
    }

    #[test]
    fn test_pad_arrays_rejects_bad_shapes() {
        let short = arr2(&[[1.0, 2.0]]).into_dyn();
        let wide = arr2(&[[1.0, 2.0, 3.0]]).into_dyn();
        assert!(pad_arrays(&[&short, &wide], 1, 0.0).is_err());
        assert!(pad_arrays(&[&short], 0, 0.0).is_err());

        let scalar = ArrayD::from_elem(IxDyn(&[]), 1.0);
        assert!(pad_arrays(&[&scalar], 1, 0.0).is_err());
    }

    #[test]
    fn test_stack_scalars_gives_vector() {
        let a = ArrayD::from_elem(IxDyn(&[]), 1.5);
        let b = ArrayD::from_elem(IxDyn(&[]), -2.0);
        let stacked = stack_arrays(&[&a, &b]).unwrap();
        assert_eq!(stacked.shape(), &[2]);
        assert_eq!(stacked[[1]], -2.0);
    }

    #[test]
    fn test_stack_rejects_shape_mismatch() {
        let a = arr1(&[1i64, 2, 3]).into_dyn();
        let b = arr1(&[1i64, 2]).into_dyn();
        assert!(stack_arrays(&[&a, &b]).is_err());
    }

    #[test]
    fn test_concat_mixed_dtype_is_none() {
        let a = Tensor::Float(arr1(&[1.0]).into_dyn());
        let b = Tensor::Int(arr1(&[1i64]).into_dyn());
        assert!(Tensor::concat(&[&a, &b]).is_none());
    }

    #[test]
    fn test_concat_along_leading_dim() {
        let a = Tensor::Int(arr1(&[1i64, 2]).into_dyn());
        let b = Tensor::Int(arr1(&[3i64]).into_dyn());
        let joined = Tensor::concat(&[&a, &b]).unwrap();
        assert_eq!(joined.shape(), &[3]);
        assert_eq!(joined.as_int().unwrap()[[2]], 3);
    }
}
