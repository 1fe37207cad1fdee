//! # 图 → 点云
//!
//! 从 `graph` 的节点数据恢复稠密的 `pos` 与 `pc_features`。
//! `atomic_numbers` 已编码在 one-hot 特征中，默认不输出；需要时用
//! [`GraphToPointCloud::keep_atomic_numbers`] 打开。
//! 节点顺序即原子顺序，因此与 [`PointCloudToGraph`](super::PointCloudToGraph)
//! 往返后坐标逐原子保持不变。
//!
//! `pc_features` 优先使用图中已有的节点特征，否则由原子序数生成 one-hot 编码。
//! 这里只处理单个样本，跨样本的填充由 collate 完成。
//!
//! ## 依赖关系
//! - 使用 `models/graph.rs`, `models/sample.rs`
//! - 使用 `transforms/to_graph.rs` 的坐标读取

use crate::error::{MatsciError, Result};
use crate::models::{Graph, Sample, Tensor, Value};
use crate::transforms::to_graph::positions_from;
use crate::transforms::Transform;

use ndarray::{Array1, Array2};

/// 默认 one-hot 宽度（覆盖 Z = 1..=100）
pub const DEFAULT_NUM_ELEMENTS: usize = 100;

/// 图到点云的变换
#[derive(Debug, Clone)]
pub struct GraphToPointCloud {
    num_elements: usize,
    keep_atomic_numbers: bool,
}

impl Default for GraphToPointCloud {
    fn default() -> Self {
        Self {
            num_elements: DEFAULT_NUM_ELEMENTS,
            keep_atomic_numbers: false,
        }
    }
}

impl GraphToPointCloud {
    pub fn new(num_elements: usize) -> Result<Self> {
        if num_elements == 0 {
            return Err(MatsciError::InvalidConfig(
                "num_elements must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            num_elements,
            ..Self::default()
        })
    }

    /// 同时输出变长的 `atomic_numbers`，collate 时需把它列入填充键
    pub fn keep_atomic_numbers(mut self, keep: bool) -> Self {
        self.keep_atomic_numbers = keep;
        self
    }

    pub fn num_elements(&self) -> usize {
        self.num_elements
    }

    fn one_hot(&self, numbers: &Tensor) -> Result<Array2<f64>> {
        let z = numbers.as_int().ok_or_else(|| MatsciError::TypeMismatch {
            key: "atomic_numbers".to_string(),
            expected: "int tensor".to_string(),
            found: numbers.dtype().to_string(),
        })?;

        let mut features = Array2::zeros((z.len(), self.num_elements));
        for (i, &number) in z.iter().enumerate() {
            let column = usize::try_from(number)
                .ok()
                .filter(|&n| (1..=self.num_elements).contains(&n))
                .ok_or_else(|| {
                    MatsciError::InvalidValue(format!(
                        "atomic number {} outside 1..={}",
                        number, self.num_elements
                    ))
                })?;
            features[[i, column - 1]] = 1.0;
        }
        Ok(features)
    }

    fn unpack(&self, graph: &Graph) -> Result<(Tensor, Tensor, Tensor)> {
        if graph.num_nodes() == 0 {
            return Err(MatsciError::EmptyGraph);
        }

        let pos = graph
            .node_data("pos")
            .ok_or_else(|| MatsciError::MissingField {
                key: "graph.pos".to_string(),
            })?;
        let positions = positions_from(pos)?;
        let mut dense = Array2::zeros((positions.len(), 3));
        for (mut row, p) in dense.rows_mut().into_iter().zip(&positions) {
            row.assign(&Array1::from(p.to_vec()));
        }

        let numbers = graph
            .node_data("atomic_numbers")
            .cloned()
            .ok_or_else(|| MatsciError::MissingField {
                key: "graph.atomic_numbers".to_string(),
            })?;

        let features = match graph.node_data("pc_features") {
            Some(existing) => existing.clone(),
            None => Tensor::Float(self.one_hot(&numbers)?.into_dyn()),
        };

        Ok((Tensor::Float(dense.into_dyn()), numbers, features))
    }
}

impl Transform for GraphToPointCloud {
    /// 已含 `pos` 且不含 `graph` 的样本原样返回
    fn apply(&self, mut sample: Sample) -> Result<Sample> {
        if sample.contains_key("pos") && !sample.contains_key("graph") {
            return Ok(sample);
        }

        let graph = match sample.remove("graph") {
            Some(Value::Graph(g)) => g,
            Some(other) => {
                return Err(MatsciError::TypeMismatch {
                    key: "graph".to_string(),
                    expected: "graph".to_string(),
                    found: other.kind().to_string(),
                })
            }
            None => {
                return Err(MatsciError::MissingField {
                    key: "graph".to_string(),
                })
            }
        };

        let (pos, numbers, features) = self.unpack(&graph)?;
        sample.insert("pos", pos);
        if self.keep_atomic_numbers {
            sample.insert("atomic_numbers", numbers);
        }
        sample.insert("pc_features", features);
        Ok(sample)
    }

    fn name(&self) -> &str {
        "graph_to_point_cloud"
    }
}
