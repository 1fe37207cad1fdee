//! # 样本数据模型
//!
//! 一个样本是字段名到取值的有序映射。取值可以是数值张量、图或文本元数据。
//!
//! ## 常用字段
//! - `atomic_numbers`: 整数 `[N]`
//! - `pos`: 浮点 `[N, 3]`，笛卡尔坐标（Å）
//! - `energy`: 浮点标量
//! - `targets` / `target_types`: 回归目标及其名称
//! - `lattice_params`: 浮点 `[6]` = a, b, c, α, β, γ（仅晶体）
//! - `symmetry`: 空间群文本（仅晶体）
//! - `graph`: 图表示（经过 `PointCloudToGraph` 之后）
//!
//! ## 依赖关系
//! - 被 `datasets/`, `transforms/`, `collate/` 使用
//! - 使用 `models/tensor.rs`, `models/graph.rs`

use crate::models::{Graph, Tensor};

use ndarray::ArrayD;
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

/// 字段取值
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Tensor(Tensor),
    Graph(Graph),
    Text(String),
}

/// 字段取值的种类，用于批内一致性检查
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Float,
    Int,
    Bool,
    Graph,
    Text,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Float => write!(f, "float tensor"),
            ValueKind::Int => write!(f, "int tensor"),
            ValueKind::Bool => write!(f, "bool tensor"),
            ValueKind::Graph => write!(f, "graph"),
            ValueKind::Text => write!(f, "text"),
        }
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Tensor(Tensor::Float(_)) => ValueKind::Float,
            Value::Tensor(Tensor::Int(_)) => ValueKind::Int,
            Value::Tensor(Tensor::Bool(_)) => ValueKind::Bool,
            Value::Graph(_) => ValueKind::Graph,
            Value::Text(_) => ValueKind::Text,
        }
    }

    pub fn as_tensor(&self) -> Option<&Tensor> {
        match self {
            Value::Tensor(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_graph(&self) -> Option<&Graph> {
        match self {
            Value::Graph(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<Tensor> for Value {
    fn from(t: Tensor) -> Self {
        Value::Tensor(t)
    }
}

impl From<ArrayD<f64>> for Value {
    fn from(a: ArrayD<f64>) -> Self {
        Value::Tensor(Tensor::Float(a))
    }
}

impl From<ArrayD<i64>> for Value {
    fn from(a: ArrayD<i64>) -> Self {
        Value::Tensor(Tensor::Int(a))
    }
}

impl From<ArrayD<bool>> for Value {
    fn from(a: ArrayD<bool>) -> Self {
        Value::Tensor(Tensor::Bool(a))
    }
}

impl From<Graph> for Value {
    fn from(g: Graph) -> Self {
        Value::Graph(g)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

/// 单个数据集样本
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sample {
    fields: BTreeMap<String, Value>,
}

impl Sample {
    pub fn new() -> Self {
        Self::default()
    }

    /// 链式插入字段
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// 字段名（有序）
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn tensor(&self, key: &str) -> Option<&Tensor> {
        self.get(key).and_then(Value::as_tensor)
    }

    pub fn float(&self, key: &str) -> Option<&ArrayD<f64>> {
        self.tensor(key).and_then(Tensor::as_float)
    }

    pub fn int(&self, key: &str) -> Option<&ArrayD<i64>> {
        self.tensor(key).and_then(Tensor::as_int)
    }

    pub fn graph(&self, key: &str) -> Option<&Graph> {
        self.get(key).and_then(Value::as_graph)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_text)
    }

    /// 原子数：依次取 `atomic_numbers`、`pos` 的长度，最后取 `graph` 节点数
    pub fn num_atoms(&self) -> Option<usize> {
        self.tensor("atomic_numbers")
            .or_else(|| self.tensor("pos"))
            .and_then(Tensor::leading_dim)
            .or_else(|| self.graph("graph").map(Graph::num_nodes))
    }
}

impl IntoIterator for Sample {
    type Item = (String, Value);
    type IntoIter = btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl FromIterator<(String, Value)> for Sample {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Sample {
            fields: iter.into_iter().collect(),
        }
    }
}
