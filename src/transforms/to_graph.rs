//! # 点云 → 图
//!
//! 把 `pos` / `atomic_numbers`（以及可选的 `pc_features`）移入图的节点数据，
//! 用 [`NeighborRule`] 建边，边数据 `r` 为原子间距离。
//! 其余字段（`targets`, `target_types`, `energy` 等）原样保留。
//!
//! ## 依赖关系
//! - 使用 `transforms/neighbors.rs`
//! - 使用 `models/graph.rs`, `models/sample.rs`

use crate::error::{MatsciError, Result};
use crate::models::{Graph, Sample, Tensor, Value};
use crate::transforms::neighbors::{find_neighbors, NeighborRule};
use crate::transforms::Transform;

use ndarray::{Array1, Ix1, Ix2};

/// 点云到图的变换
#[derive(Debug, Clone)]
pub struct PointCloudToGraph {
    rule: NeighborRule,
}

impl PointCloudToGraph {
    /// 使用给定近邻规则创建；规则参数非法时报配置错误
    pub fn new(rule: NeighborRule) -> Result<Self> {
        rule.validate()?;
        Ok(Self { rule })
    }

    pub fn rule(&self) -> &NeighborRule {
        &self.rule
    }

    fn build_graph(&self, sample: &mut Sample) -> Result<Graph> {
        let pos = take_tensor(sample, "pos")?;
        let numbers = take_tensor(sample, "atomic_numbers")?;
        let features = sample
            .remove("pc_features")
            .map(|v| match v {
                Value::Tensor(t) => Ok(t),
                other => Err(MatsciError::TypeMismatch {
                    key: "pc_features".to_string(),
                    expected: "tensor".to_string(),
                    found: other.kind().to_string(),
                }),
            })
            .transpose()?;

        let positions = positions_from(&pos)?;
        let n_numbers = numbers_len(&numbers)?;
        if positions.len() != n_numbers {
            return Err(MatsciError::LengthMismatch {
                pos: positions.len(),
                atomic_numbers: n_numbers,
            });
        }

        let edges = find_neighbors(&positions, &self.rule);
        let distance = Array1::from(edges.distance).into_dyn();
        let mut graph = Graph::new(positions.len(), edges.src, edges.dst)?;
        graph.set_edge_data("r", Tensor::Float(distance))?;
        graph.set_node_data("pos", pos)?;
        graph.set_node_data("atomic_numbers", numbers)?;
        if let Some(features) = features {
            if features.leading_dim() != Some(positions.len()) {
                return Err(MatsciError::ShapeMismatch {
                    key: "pc_features".to_string(),
                    sample: 0,
                    expected: vec![positions.len()],
                    found: features.shape().to_vec(),
                });
            }
            graph.set_node_data("pc_features", features)?;
        }

        Ok(graph)
    }
}

impl Transform for PointCloudToGraph {
    /// 已含 `graph` 且不含 `pos` 的样本原样返回
    fn apply(&self, mut sample: Sample) -> Result<Sample> {
        if sample.contains_key("graph") && !sample.contains_key("pos") {
            return Ok(sample);
        }
        let graph = self.build_graph(&mut sample)?;
        sample.insert("graph", graph);
        Ok(sample)
    }

    fn name(&self) -> &str {
        "point_cloud_to_graph"
    }
}

fn take_tensor(sample: &mut Sample, key: &str) -> Result<Tensor> {
    match sample.remove(key) {
        Some(Value::Tensor(t)) => Ok(t),
        Some(other) => Err(MatsciError::TypeMismatch {
            key: key.to_string(),
            expected: "tensor".to_string(),
            found: other.kind().to_string(),
        }),
        None => Err(MatsciError::MissingField {
            key: key.to_string(),
        }),
    }
}

/// 读取 `[N, 3]` 浮点坐标
pub(crate) fn positions_from(pos: &Tensor) -> Result<Vec<[f64; 3]>> {
    let shape_error = || MatsciError::ShapeMismatch {
        key: "pos".to_string(),
        sample: 0,
        expected: vec![pos.leading_dim().unwrap_or(0), 3],
        found: pos.shape().to_vec(),
    };
    let array = pos.as_float().ok_or_else(|| MatsciError::TypeMismatch {
        key: "pos".to_string(),
        expected: "float tensor".to_string(),
        found: pos.dtype().to_string(),
    })?;
    let view = array
        .view()
        .into_dimensionality::<Ix2>()
        .map_err(|_| shape_error())?;
    if view.ncols() != 3 {
        return Err(shape_error());
    }
    Ok(view.rows().into_iter().map(|r| [r[0], r[1], r[2]]).collect())
}

fn numbers_len(numbers: &Tensor) -> Result<usize> {
    let array = numbers.as_int().ok_or_else(|| MatsciError::TypeMismatch {
        key: "atomic_numbers".to_string(),
        expected: "int tensor".to_string(),
        found: numbers.dtype().to_string(),
    })?;
    let view = array
        .view()
        .into_dimensionality::<Ix1>()
        .map_err(|_| MatsciError::ShapeMismatch {
            key: "atomic_numbers".to_string(),
            sample: 0,
            expected: vec![array.len()],
            found: array.shape().to_vec(),
        })?;
    Ok(view.len())
}
