//! # 批次数据模型
//!
//! collate 的输出：字段名到批量取值的映射。
//! 所有字段的第一维都等于批大小；图字段合并为一张批图。
//!
//! ## 依赖关系
//! - 由 `collate/mod.rs` 构造
//! - 使用 `models/tensor.rs`, `models/graph.rs`

use crate::models::{GraphBatch, Tensor};

use ndarray::ArrayD;
use std::collections::btree_map;
use std::collections::BTreeMap;

/// 批内字段取值
#[derive(Debug, Clone, PartialEq)]
pub enum BatchValue {
    Tensor(Tensor),
    Graph(GraphBatch),
    Text(Vec<String>),
}

/// 批次
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    batch_size: usize,
    fields: BTreeMap<String, BatchValue>,
}

impl Batch {
    pub(crate) fn new(batch_size: usize, fields: BTreeMap<String, BatchValue>) -> Self {
        Batch { batch_size, fields }
    }

    /// 输入样本数
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn get(&self, key: &str) -> Option<&BatchValue> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, BatchValue> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn tensor(&self, key: &str) -> Option<&Tensor> {
        match self.fields.get(key) {
            Some(BatchValue::Tensor(t)) => Some(t),
            _ => None,
        }
    }

    pub fn float(&self, key: &str) -> Option<&ArrayD<f64>> {
        self.tensor(key).and_then(Tensor::as_float)
    }

    pub fn int(&self, key: &str) -> Option<&ArrayD<i64>> {
        self.tensor(key).and_then(Tensor::as_int)
    }

    /// 布尔字段，通常是 `mask` 或 `<key>_mask`
    pub fn mask(&self, key: &str) -> Option<&ArrayD<bool>> {
        self.tensor(key).and_then(Tensor::as_bool)
    }

    pub fn graph(&self, key: &str) -> Option<&GraphBatch> {
        match self.fields.get(key) {
            Some(BatchValue::Graph(g)) => Some(g),
            _ => None,
        }
    }

    pub fn text(&self, key: &str) -> Option<&[String]> {
        match self.fields.get(key) {
            Some(BatchValue::Text(t)) => Some(t),
            _ => None,
        }
    }

    /// 各字段的形状摘要，图字段给出节点/边总数
    pub fn describe(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .map(|(key, value)| {
                let summary = match value {
                    BatchValue::Tensor(t) => format!("{} {:?}", t.dtype(), t.shape()),
                    BatchValue::Graph(g) => format!(
                        "graph x{} ({} nodes, {} edges)",
                        g.batch_size(),
                        g.num_nodes(),
                        g.num_edges()
                    ),
                    BatchValue::Text(t) => format!("text [{}]", t.len()),
                };
                (key.clone(), summary)
            })
            .collect()
    }
}
