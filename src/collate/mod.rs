//! # 按键合并（collate）
//!
//! 把若干样本合并为一个批次：定长字段直接堆叠，变长字段零填充并生成掩码，
//! 图字段合并为批图，文本字段收集为列表。
//!
//! ## 算法
//! 1. 空输入报错；检查所有样本字段集合一致（在任何堆叠之前）
//! 2. 检查 `pad_keys` 均存在、掩码名未被占用、各字段取值种类一致
//! 3. 非填充张量沿新的第 0 维堆叠，形状必须一致
//! 4. 填充张量按第一维最大长度零填充到 `(B, max_len, *trailing)`，尾部维度必须一致
//! 5. 按每个样本的长度向量给填充键分组：包含键最多的组共享 `mask`，
//!    并列时优先含 `pos`/`atomic_numbers` 的组，再取含字典序最小键的组；
//!    其余组的每个键各自得到 `<key>_mask`
//!
//! 任一步失败都直接返回错误，不产生部分批次。
//!
//! ## 依赖关系
//! - 被 `datasets/dataset.rs`, `datasets/loader.rs` 调用
//! - 使用 `models/`
//! - 子模块: batch

pub mod batch;

pub use batch::{Batch, BatchValue};

use crate::error::{MatsciError, Result};
use crate::models::tensor::{pad_arrays, stack_arrays};
use crate::models::{Graph, GraphBatch, Sample, Tensor, Value, ValueKind};

use ndarray::{Array2, ArrayD};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// 共享掩码字段名
pub const MASK_KEY: &str = "mask";

/// 逐原子字段；并列时含这些键的组保留 `mask`
const ATOM_KEYS: [&str; 2] = ["pos", "atomic_numbers"];

/// 独立掩码字段名
pub fn mask_key_for(key: &str) -> String {
    format!("{}_{}", key, MASK_KEY)
}

/// collate 配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateOptions {
    /// 需要填充的变长字段
    pub pad_keys: BTreeSet<String>,
}

impl CollateOptions {
    pub fn with_pad_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CollateOptions {
            pad_keys: keys.into_iter().map(Into::into).collect(),
        }
    }
}

/// 按键合并器
#[derive(Debug, Clone, Default)]
pub struct Collator {
    pad_keys: BTreeSet<String>,
}

impl Collator {
    pub fn new<I, S>(pad_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Collator {
            pad_keys: pad_keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_options(options: &CollateOptions) -> Self {
        Collator {
            pad_keys: options.pad_keys.clone(),
        }
    }

    pub fn pad_keys(&self) -> &BTreeSet<String> {
        &self.pad_keys
    }

    /// 合并样本为批次
    pub fn concatenate(&self, samples: &[Sample]) -> Result<Batch> {
        let first = samples.first().ok_or(MatsciError::EmptyBatch)?;
        check_field_sets(samples)?;

        for key in &self.pad_keys {
            if !first.contains_key(key) {
                return Err(MatsciError::MissingField { key: key.clone() });
            }
        }
        if !self.pad_keys.is_empty() {
            let reserved = std::iter::once(MASK_KEY.to_string())
                .chain(self.pad_keys.iter().map(|k| mask_key_for(k)));
            for name in reserved {
                if first.contains_key(&name) {
                    return Err(MatsciError::ReservedField(name));
                }
            }
        }

        let columns: Vec<(&str, Column<'_>)> = first
            .keys()
            .map(|key| gather(key, samples).map(|c| (key, c)))
            .collect::<Result<_>>()?;

        let mut fields = BTreeMap::new();
        let mut padded_lengths: BTreeMap<&str, Vec<usize>> = BTreeMap::new();

        for (key, column) in columns {
            let value = if self.pad_keys.contains(key) {
                let (tensor, lengths) = pad_column(key, column)?;
                padded_lengths.insert(key, lengths);
                BatchValue::Tensor(tensor)
            } else {
                stack_column(key, column)?
            };
            fields.insert(key.to_string(), value);
        }

        for (name, mask) in build_masks(&padded_lengths) {
            fields.insert(name, BatchValue::Tensor(Tensor::Bool(mask)));
        }

        Ok(Batch::new(samples.len(), fields))
    }
}

/// 以给定填充键合并样本
pub fn concatenate<I, S>(samples: &[Sample], pad_keys: I) -> Result<Batch>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Collator::new(pad_keys).concatenate(samples)
}

/// 所有样本必须拥有相同的字段集合
fn check_field_sets(samples: &[Sample]) -> Result<()> {
    let Some(first) = samples.first() else {
        return Ok(());
    };

    for (i, sample) in samples.iter().enumerate().skip(1) {
        if let Some(key) = first.keys().find(|k| !sample.contains_key(k)) {
            return Err(MatsciError::InconsistentFields {
                key: key.to_string(),
                sample: i,
            });
        }
        if let Some(key) = sample.keys().find(|k| !first.contains_key(k)) {
            return Err(MatsciError::InconsistentFields {
                key: key.to_string(),
                sample: 0,
            });
        }
    }
    Ok(())
}

/// 同一字段在各样本中的取值，按种类分好
enum Column<'a> {
    Float(Vec<&'a ArrayD<f64>>),
    Int(Vec<&'a ArrayD<i64>>),
    Bool(Vec<&'a ArrayD<bool>>),
    Graph(Vec<&'a Graph>),
    Text(Vec<&'a str>),
}

fn gather<'a>(key: &str, samples: &'a [Sample]) -> Result<Column<'a>> {
    let kind = samples
        .first()
        .and_then(|s| s.get(key))
        .map(Value::kind)
        .ok_or_else(|| MatsciError::MissingField {
            key: key.to_string(),
        })?;

    let column = match kind {
        ValueKind::Float => Column::Float(pick(key, kind, samples, |v| match v {
            Value::Tensor(Tensor::Float(a)) => Some(a),
            _ => None,
        })?),
        ValueKind::Int => Column::Int(pick(key, kind, samples, |v| match v {
            Value::Tensor(Tensor::Int(a)) => Some(a),
            _ => None,
        })?),
        ValueKind::Bool => Column::Bool(pick(key, kind, samples, |v| match v {
            Value::Tensor(Tensor::Bool(a)) => Some(a),
            _ => None,
        })?),
        ValueKind::Graph => Column::Graph(pick(key, kind, samples, Value::as_graph)?),
        ValueKind::Text => Column::Text(pick(key, kind, samples, Value::as_text)?),
    };
    Ok(column)
}

fn pick<'a, T, F>(key: &str, kind: ValueKind, samples: &'a [Sample], extract: F) -> Result<Vec<T>>
where
    F: Fn(&'a Value) -> Option<T>,
{
    samples
        .iter()
        .enumerate()
        .map(|(i, sample)| {
            let value = sample.get(key).ok_or_else(|| MatsciError::InconsistentFields {
                key: key.to_string(),
                sample: i,
            })?;
            extract(value).ok_or_else(|| MatsciError::TypeMismatch {
                key: key.to_string(),
                expected: kind.to_string(),
                found: format!("{} in sample {}", value.kind(), i),
            })
        })
        .collect()
}

fn stack_column(key: &str, column: Column<'_>) -> Result<BatchValue> {
    let value = match column {
        Column::Float(arrays) => BatchValue::Tensor(Tensor::Float(stack_checked(key, &arrays)?)),
        Column::Int(arrays) => BatchValue::Tensor(Tensor::Int(stack_checked(key, &arrays)?)),
        Column::Bool(arrays) => BatchValue::Tensor(Tensor::Bool(stack_checked(key, &arrays)?)),
        Column::Graph(graphs) => BatchValue::Graph(GraphBatch::from_graphs(&graphs)?),
        Column::Text(texts) => BatchValue::Text(texts.into_iter().map(str::to_string).collect()),
    };
    Ok(value)
}

fn stack_checked<T: Clone>(key: &str, arrays: &[&ArrayD<T>]) -> Result<ArrayD<T>> {
    let expected = arrays.first().map(|a| a.shape()).unwrap_or(&[]);
    if let Some((i, found)) = arrays
        .iter()
        .enumerate()
        .find(|(_, a)| a.shape() != expected)
    {
        return Err(MatsciError::ShapeMismatch {
            key: key.to_string(),
            sample: i,
            expected: expected.to_vec(),
            found: found.shape().to_vec(),
        });
    }
    stack_arrays(arrays).map_err(|e| MatsciError::InvalidValue(format!("{}: {}", key, e)))
}

fn pad_column(key: &str, column: Column<'_>) -> Result<(Tensor, Vec<usize>)> {
    match column {
        Column::Float(arrays) => pad_checked(key, &arrays, 0.0).map(|(a, l)| (Tensor::Float(a), l)),
        Column::Int(arrays) => pad_checked(key, &arrays, 0).map(|(a, l)| (Tensor::Int(a), l)),
        Column::Bool(arrays) => pad_checked(key, &arrays, false).map(|(a, l)| (Tensor::Bool(a), l)),
        Column::Graph(_) | Column::Text(_) => Err(MatsciError::TypeMismatch {
            key: key.to_string(),
            expected: "tensor for padding".to_string(),
            found: "non-tensor field".to_string(),
        }),
    }
}

fn pad_checked<T: Clone>(key: &str, arrays: &[&ArrayD<T>], fill: T) -> Result<(ArrayD<T>, Vec<usize>)> {
    if let Some(i) = arrays.iter().position(|a| a.ndim() == 0) {
        return Err(MatsciError::InvalidValue(format!(
            "padded field '{}' is a scalar in sample {}",
            key, i
        )));
    }

    let trailing = arrays.first().map(|a| &a.shape()[1..]).unwrap_or(&[]);
    if let Some((i, found)) = arrays
        .iter()
        .enumerate()
        .find(|(_, a)| &a.shape()[1..] != trailing)
    {
        return Err(MatsciError::TrailingDimMismatch {
            key: key.to_string(),
            sample: i,
            expected: trailing.to_vec(),
            found: found.shape()[1..].to_vec(),
        });
    }

    let lengths: Vec<usize> = arrays.iter().map(|a| a.shape()[0]).collect();
    let max_len = lengths.iter().copied().max().unwrap_or(0);
    let padded = pad_arrays(arrays, max_len, fill)
        .map_err(|e| MatsciError::InvalidValue(format!("{}: {}", key, e)))?;
    Ok((padded, lengths))
}

/// 根据各填充键的长度向量生成掩码字段
fn build_masks(padded_lengths: &BTreeMap<&str, Vec<usize>>) -> Vec<(String, ArrayD<bool>)> {
    // 组按首个键的字典序创建
    let mut groups: Vec<(&Vec<usize>, Vec<&str>)> = Vec::new();
    for (key, lengths) in padded_lengths {
        match groups.iter_mut().find(|(l, _)| *l == lengths) {
            Some((_, keys)) => keys.push(*key),
            None => groups.push((lengths, vec![*key])),
        }
    }

    let rank = |keys: &[&str]| (keys.len(), keys.iter().any(|k| ATOM_KEYS.contains(k)));
    let mut dominant = 0;
    for (i, (_, keys)) in groups.iter().enumerate() {
        if rank(keys) > rank(&groups[dominant].1) {
            dominant = i;
        }
    }

    let mut masks = Vec::new();
    for (i, (lengths, keys)) in groups.iter().enumerate() {
        let mask = length_mask(lengths);
        if i == dominant {
            masks.push((MASK_KEY.to_string(), mask));
        } else {
            for key in keys {
                masks.push((mask_key_for(key), mask.clone()));
            }
        }
    }
    masks
}

/// `mask[i, j] = j < lengths[i]`
fn length_mask(lengths: &[usize]) -> ArrayD<bool> {
    let max_len = lengths.iter().copied().max().unwrap_or(0);
    Array2::from_shape_fn((lengths.len(), max_len), |(i, j)| j < lengths[i]).into_dyn()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use ndarray::{arr1, Array1, Array2};

    fn atoms(n: usize) -> Sample {
        let z: Vec<i64> = (1..=n as i64).collect();
        Sample::new()
            .with("atomic_numbers", Array1::from(z).into_dyn())
            .with("pos", Array2::<f64>::ones((n, 3)).into_dyn())
            .with("energy", Tensor::scalar(-(n as f64)))
    }

    #[test]
    fn test_stack_without_padding() {
        let samples = vec![atoms(2), atoms(2)];
        let batch = concatenate(&samples, Vec::<String>::new()).unwrap();
        assert_eq!(batch.batch_size(), 2);
        assert_eq!(batch.float("pos").unwrap().shape(), &[2, 2, 3]);
        assert_eq!(batch.float("energy").unwrap().shape(), &[2]);
        assert!(!batch.contains_key(MASK_KEY));
    }

    #[test]
    fn test_unpadded_shape_mismatch() {
        let samples = vec![atoms(2), atoms(3)];
        let err = concatenate(&samples, ["atomic_numbers"]).unwrap_err();
        assert!(matches!(err, MatsciError::ShapeMismatch { sample: 1, .. }));
        assert_eq!(err.kind(), ErrorKind::Value);
    }

    #[test]
    fn test_padding_fills_zero_and_masks() {
        let samples = vec![atoms(1), atoms(3)];
        let batch = concatenate(&samples, ["pos", "atomic_numbers"]).unwrap();

        let z = batch.int("atomic_numbers").unwrap();
        assert_eq!(z.shape(), &[2, 3]);
        assert_eq!(z[[0, 0]], 1);
        assert_eq!(z[[0, 1]], 0);
        assert_eq!(batch.float("pos").unwrap()[[0, 2, 1]], 0.0);

        let mask = batch.mask(MASK_KEY).unwrap();
        assert_eq!(mask.shape(), &[2, 3]);
        assert!(mask[[0, 0]] && !mask[[0, 1]]);
        assert!(mask[[1, 2]]);
    }

    #[test]
    fn test_trailing_dim_mismatch() {
        let a = atoms(2);
        let b = atoms(2).with("pos", Array2::<f64>::ones((2, 2)).into_dyn());
        let err = concatenate(&[a, b], ["pos"]).unwrap_err();
        assert!(matches!(err, MatsciError::TrailingDimMismatch { sample: 1, .. }));
    }

    #[test]
    fn test_distinct_length_groups_get_own_mask() {
        let a = atoms(2).with("neighbors", arr1(&[1i64, 2, 3, 4]).into_dyn());
        let b = atoms(3).with("neighbors", arr1(&[1i64]).into_dyn());
        let batch = concatenate(&[a, b], ["pos", "atomic_numbers", "neighbors"]).unwrap();

        assert_eq!(batch.mask(MASK_KEY).unwrap().shape(), &[2, 3]);
        let own = batch.mask("neighbors_mask").unwrap();
        assert_eq!(own.shape(), &[2, 4]);
        assert!(own[[0, 3]]);
        assert!(!own[[1, 1]]);
        assert!(batch.mask("pos_mask").is_none());
    }

    #[test]
    fn test_tied_groups_keep_atom_mask() {
        let a = atoms(2).with("neighbors", arr1(&[1i64, 2, 3, 4]).into_dyn());
        let b = atoms(3).with("neighbors", arr1(&[1i64]).into_dyn());
        let batch = concatenate(&[a, b], ["pos", "neighbors"]).unwrap();

        let mask = batch.mask(MASK_KEY).unwrap();
        assert_eq!(mask.shape(), &[2, 3]);
        assert!(mask[[1, 2]] && !mask[[0, 2]]);
        assert_eq!(batch.mask("neighbors_mask").unwrap().shape(), &[2, 4]);
        assert!(batch.mask("pos_mask").is_none());
    }

    #[test]
    fn test_tied_groups_fall_back_to_first_key() {
        let a = atoms(2)
            .with("charges", arr1(&[0.1, 0.2]).into_dyn())
            .with("neighbors", arr1(&[1i64, 2, 3, 4]).into_dyn());
        let b = atoms(3)
            .with("charges", arr1(&[0.1, 0.2, 0.3]).into_dyn())
            .with("neighbors", arr1(&[1i64]).into_dyn());
        let batch = concatenate(&[a, b], ["charges", "neighbors"]).unwrap();

        assert_eq!(batch.mask(MASK_KEY).unwrap().shape(), &[2, 3]);
        assert_eq!(batch.mask("neighbors_mask").unwrap().shape(), &[2, 4]);
        assert!(batch.mask("charges_mask").is_none());
    }

    #[test]
    fn test_type_mismatch_across_samples() {
        let a = atoms(2);
        let b = atoms(2).with("energy", "high");
        let err = concatenate(&[a, b], Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, MatsciError::TypeMismatch { .. }));
    }

    #[test]
    fn test_missing_pad_key_is_key_error() {
        let err = concatenate(&[atoms(2)], ["forces"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Key);
    }

    #[test]
    fn test_reserved_mask_name() {
        let sample = atoms(2).with(MASK_KEY, arr1(&[true, true]).into_dyn());
        let err = concatenate(&[sample], ["pos"]).unwrap_err();
        assert!(matches!(err, MatsciError::ReservedField(_)));
    }

    #[test]
    fn test_scalar_pad_key_rejected() {
        let err = concatenate(&[atoms(2), atoms(2)], ["energy"]).unwrap_err();
        assert!(matches!(err, MatsciError::InvalidValue(_)));
    }

    #[test]
    fn test_text_fields_collected() {
        let a = atoms(1).with("symmetry", "P1");
        let b = atoms(1).with("symmetry", "Fm-3m");
        let batch = concatenate(&[a, b], Vec::<String>::new()).unwrap();
        assert_eq!(batch.text("symmetry").unwrap(), &["P1".to_string(), "Fm-3m".to_string()]);
    }
}
