//! # 图表示
//!
//! 原子为节点、近邻关系为有向边的小图，以及把多个小图合并为一个大图的批处理结构。
//!
//! ## 约定
//! - 节点 i 对应样本中第 i 个原子
//! - 边 `src[e] -> dst[e]`，消息从近邻流向中心原子
//! - 节点/边数据的第一维分别等于节点数/边数
//!
//! ## 依赖关系
//! - 被 `transforms/`, `collate/` 使用
//! - 使用 `models/tensor.rs`

use crate::error::{MatsciError, Result};
use crate::models::Tensor;

use std::collections::BTreeMap;

/// 单个结构的图
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    num_nodes: usize,
    src: Vec<usize>,
    dst: Vec<usize>,
    node_data: BTreeMap<String, Tensor>,
    edge_data: BTreeMap<String, Tensor>,
}

impl Graph {
    /// 从边列表创建图
    pub fn new(num_nodes: usize, src: Vec<usize>, dst: Vec<usize>) -> Result<Self> {
        if src.len() != dst.len() {
            return Err(MatsciError::MalformedGraph(format!(
                "{} source ids but {} destination ids",
                src.len(),
                dst.len()
            )));
        }
        if let Some(&bad) = src.iter().chain(dst.iter()).find(|&&n| n >= num_nodes) {
            return Err(MatsciError::MalformedGraph(format!(
                "edge endpoint {} out of range for {} nodes",
                bad, num_nodes
            )));
        }
        Ok(Graph {
            num_nodes,
            src,
            dst,
            node_data: BTreeMap::new(),
            edge_data: BTreeMap::new(),
        })
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn num_edges(&self) -> usize {
        self.src.len()
    }

    pub fn src(&self) -> &[usize] {
        &self.src
    }

    pub fn dst(&self) -> &[usize] {
        &self.dst
    }

    /// 设置节点数据，第一维必须等于节点数
    pub fn set_node_data(&mut self, key: impl Into<String>, data: Tensor) -> Result<()> {
        let key = key.into();
        check_leading(&key, &data, self.num_nodes)?;
        self.node_data.insert(key, data);
        Ok(())
    }

    /// 设置边数据，第一维必须等于边数
    pub fn set_edge_data(&mut self, key: impl Into<String>, data: Tensor) -> Result<()> {
        let key = key.into();
        check_leading(&key, &data, self.num_edges())?;
        self.edge_data.insert(key, data);
        Ok(())
    }

    pub fn node_data(&self, key: &str) -> Option<&Tensor> {
        self.node_data.get(key)
    }

    pub fn edge_data(&self, key: &str) -> Option<&Tensor> {
        self.edge_data.get(key)
    }
}

fn check_leading(key: &str, data: &Tensor, expected: usize) -> Result<()> {
    match data.leading_dim() {
        Some(n) if n == expected => Ok(()),
        _ => Err(MatsciError::MalformedGraph(format!(
            "data '{}' has shape {:?}, expected leading dimension {}",
            key,
            data.shape(),
            expected
        ))),
    }
}

/// 多个图合并后的批图
///
/// 节点与边按输入顺序依次排列，边端点加上所属图的节点偏移。
#[derive(Debug, Clone, PartialEq)]
pub struct GraphBatch {
    graph: Graph,
    batch_num_nodes: Vec<usize>,
    batch_num_edges: Vec<usize>,
}

impl GraphBatch {
    /// 合并若干图；所有图必须携带相同的节点/边数据键
    pub fn from_graphs(graphs: &[&Graph]) -> Result<Self> {
        let first = graphs.first().ok_or(MatsciError::EmptyBatch)?;

        let total_nodes: usize = graphs.iter().map(|g| g.num_nodes).sum();
        let total_edges: usize = graphs.iter().map(|g| g.num_edges()).sum();
        let mut src = Vec::with_capacity(total_edges);
        let mut dst = Vec::with_capacity(total_edges);

        let mut offset = 0;
        for g in graphs {
            src.extend(g.src.iter().map(|s| s + offset));
            dst.extend(g.dst.iter().map(|d| d + offset));
            offset += g.num_nodes;
        }

        let mut merged = Graph::new(total_nodes, src, dst)?;
        merged.node_data = merge_data(graphs, |g| &g.node_data, &first.node_data)?;
        merged.edge_data = merge_data(graphs, |g| &g.edge_data, &first.edge_data)?;

        Ok(GraphBatch {
            graph: merged,
            batch_num_nodes: graphs.iter().map(|g| g.num_nodes).collect(),
            batch_num_edges: graphs.iter().map(|g| g.num_edges()).collect(),
        })
    }

    /// 批中图的数量
    pub fn batch_size(&self) -> usize {
        self.batch_num_nodes.len()
    }

    pub fn num_nodes(&self) -> usize {
        self.graph.num_nodes
    }

    pub fn num_edges(&self) -> usize {
        self.graph.num_edges()
    }

    pub fn batch_num_nodes(&self) -> &[usize] {
        &self.batch_num_nodes
    }

    pub fn batch_num_edges(&self) -> &[usize] {
        &self.batch_num_edges
    }

    /// 合并后的大图
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// 每个图第一个节点在大图中的下标
    pub fn node_offsets(&self) -> Vec<usize> {
        exclusive_prefix_sum(&self.batch_num_nodes)
    }

    /// 每个节点所属的图下标
    pub fn node_batch(&self) -> Vec<usize> {
        expand_counts(&self.batch_num_nodes)
    }

    /// 每条边所属的图下标
    pub fn edge_batch(&self) -> Vec<usize> {
        expand_counts(&self.batch_num_edges)
    }
}

fn merge_data<F>(
    graphs: &[&Graph],
    select: F,
    reference: &BTreeMap<String, Tensor>,
) -> Result<BTreeMap<String, Tensor>>
where
    F: Fn(&Graph) -> &BTreeMap<String, Tensor>,
{
    let mut merged = BTreeMap::new();

    for (i, g) in graphs.iter().enumerate() {
        let data = select(*g);
        if let Some(key) = reference
            .keys()
            .find(|k| !data.contains_key(*k))
            .or_else(|| data.keys().find(|k| !reference.contains_key(*k)))
        {
            return Err(MatsciError::InconsistentFields {
                key: key.clone(),
                sample: i,
            });
        }
    }

    for (key, first) in reference {
        let parts: Vec<&Tensor> = graphs
            .iter()
            .filter_map(|g| select(*g).get(key))
            .collect();
        let joined = Tensor::concat(&parts).ok_or_else(|| MatsciError::TypeMismatch {
            key: key.clone(),
            expected: format!("{} data with trailing shape {:?}", first.dtype(), &first.shape()[1..]),
            found: "incompatible graph data".to_string(),
        })?;
        merged.insert(key.clone(), joined);
    }

    Ok(merged)
}

fn exclusive_prefix_sum(counts: &[usize]) -> Vec<usize> {
    counts
        .iter()
        .scan(0, |acc, &n| {
            let start = *acc;
            *acc += n;
            Some(start)
        })
        .collect()
}

fn expand_counts(counts: &[usize]) -> Vec<usize> {
    counts
        .iter()
        .enumerate()
        .flat_map(|(i, &n)| std::iter::repeat(i).take(n))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    fn line_graph(n: usize) -> Graph {
        let src: Vec<usize> = (0..n.saturating_sub(1)).collect();
        let dst: Vec<usize> = (1..n).collect();
        let mut g = Graph::new(n, src, dst).unwrap();
        let z: Vec<i64> = (0..n as i64).map(|i| i + 1).collect();
        g.set_node_data("atomic_numbers", Tensor::Int(arr1(&z).into_dyn()))
            .unwrap();
        g
    }

    #[test]
    fn test_graph_rejects_out_of_range_edge() {
        let err = Graph::new(2, vec![0], vec![2]).unwrap_err();
        assert!(matches!(err, MatsciError::MalformedGraph(_)));
    }

    #[test]
    fn test_node_data_leading_dim_checked() {
        let mut g = Graph::new(3, vec![], vec![]).unwrap();
        let bad = Tensor::Float(arr2(&[[0.0, 0.0, 0.0]]).into_dyn());
        assert!(g.set_node_data("pos", bad).is_err());
    }

    #[test]
    fn test_batch_offsets_and_indices() {
        let a = line_graph(3);
        let b = line_graph(2);
        let batch = GraphBatch::from_graphs(&[&a, &b]).unwrap();

        assert_eq!(batch.batch_size(), 2);
        assert_eq!(batch.num_nodes(), 5);
        assert_eq!(batch.num_edges(), 3);
        assert_eq!(batch.node_offsets(), vec![0, 3]);
        assert_eq!(batch.node_batch(), vec![0, 0, 0, 1, 1]);
        assert_eq!(batch.edge_batch(), vec![0, 0, 1]);
        // 第二个图的边 0->1 平移为 3->4
        assert_eq!(batch.graph().src()[2], 3);
        assert_eq!(batch.graph().dst()[2], 4);

        let z = batch.graph().node_data("atomic_numbers").unwrap();
        assert_eq!(z.shape(), &[5]);
    }

    #[test]
    fn test_batch_rejects_mismatched_node_keys() {
        let a = line_graph(2);
        let b = Graph::new(2, vec![], vec![]).unwrap();
        let err = GraphBatch::from_graphs(&[&a, &b]).unwrap_err();
        assert!(matches!(err, MatsciError::InconsistentFields { sample: 1, .. }));
    }
}
