//! # 近邻搜索
//!
//! 根据原子坐标确定图的边集合。
//!
//! ## 规则
//! - `Cutoff`: 距离不超过截断半径的所有原子对，可选每个中心最多保留若干近邻
//! - `KNearest`: 每个中心原子取最近的 k 个原子
//! - `Complete`: 所有有序原子对（无自环）
//!
//! ## 排序与并列
//! 边按目标（中心）原子升序分组，组内按 (距离, 源原子下标) 升序排列。
//! 距离相等时下标小的原子优先，因此同一输入总是得到同一张图。
//! 距离为笛卡尔距离，不考虑周期性镜像。
//!
//! ## 依赖关系
//! - 被 `transforms/to_graph.rs` 使用
//! - 无外部模块依赖

use crate::error::{MatsciError, Result};

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// 近邻判定规则
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NeighborRule {
    /// 截断半径（Å）
    Cutoff {
        radius: f64,
        max_neighbors: Option<usize>,
    },
    /// k 近邻
    KNearest { k: usize },
    /// 完全图
    Complete,
}

impl NeighborRule {
    pub fn cutoff(radius: f64) -> Self {
        NeighborRule::Cutoff {
            radius,
            max_neighbors: None,
        }
    }

    pub fn k_nearest(k: usize) -> Self {
        NeighborRule::KNearest { k }
    }

    /// 检查参数合法性
    pub fn validate(&self) -> Result<()> {
        match *self {
            NeighborRule::Cutoff { radius, .. } if !(radius.is_finite() && radius > 0.0) => Err(
                MatsciError::InvalidConfig(format!("cutoff radius must be positive, got {}", radius)),
            ),
            NeighborRule::Cutoff {
                max_neighbors: Some(0),
                ..
            } => Err(MatsciError::InvalidConfig(
                "max_neighbors must be at least 1".to_string(),
            )),
            NeighborRule::KNearest { k: 0 } => Err(MatsciError::InvalidConfig(
                "k must be at least 1".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// 边列表
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeList {
    pub src: Vec<usize>,
    pub dst: Vec<usize>,
    pub distance: Vec<f64>,
}

impl EdgeList {
    pub fn len(&self) -> usize {
        self.src.len()
    }

    pub fn is_empty(&self) -> bool {
        self.src.is_empty()
    }
}

/// 按规则构建边
pub fn find_neighbors(positions: &[[f64; 3]], rule: &NeighborRule) -> EdgeList {
    let mut edges = EdgeList::default();

    for (center, p) in positions.iter().enumerate() {
        let mut candidates: Vec<(f64, usize)> = positions
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != center)
            .map(|(j, q)| (distance(p, q), j))
            .collect();
        candidates.sort_by(compare_candidates);

        let keep: Vec<(f64, usize)> = match *rule {
            NeighborRule::Cutoff {
                radius,
                max_neighbors,
            } => candidates
                .into_iter()
                .take_while(|&(d, _)| d <= radius)
                .take(max_neighbors.unwrap_or(usize::MAX))
                .collect(),
            NeighborRule::KNearest { k } => candidates.into_iter().take(k).collect(),
            NeighborRule::Complete => candidates,
        };

        for (d, j) in keep {
            edges.src.push(j);
            edges.dst.push(center);
            edges.distance.push(d);
        }
    }

    edges
}

fn compare_candidates(a: &(f64, usize), b: &(f64, usize)) -> Ordering {
    a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
}

fn distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> Vec<[f64; 3]> {
        vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [3.5, 0.0, 0.0],
        ]
    }

    #[test]
    fn test_cutoff_is_symmetric() {
        let edges = find_neighbors(&chain(), &NeighborRule::cutoff(1.2));
        let pairs: Vec<(usize, usize)> = edges.src.iter().copied().zip(edges.dst.iter().copied()).collect();
        assert_eq!(pairs, vec![(1, 0), (0, 1), (2, 1), (1, 2)]);
        assert!(edges.distance.iter().all(|&d| (d - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_tie_break_prefers_lower_index() {
        // 中心原子 1 到 0 和 2 的距离相同
        let edges = find_neighbors(&chain(), &NeighborRule::k_nearest(1));
        assert_eq!(edges.src[1], 0);
        assert_eq!(edges.dst[1], 1);
    }

    #[test]
    fn test_k_nearest_caps_at_available_atoms() {
        let positions = vec![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]];
        let edges = find_neighbors(&positions, &NeighborRule::k_nearest(5));
        assert_eq!(edges.len(), 2);
    }

    #[test]
    fn test_cutoff_max_neighbors() {
        let rule = NeighborRule::Cutoff {
            radius: 10.0,
            max_neighbors: Some(2),
        };
        let edges = find_neighbors(&chain(), &rule);
        assert_eq!(edges.len(), 8);
        // 原子 3 最近的两个是 2 和 1
        assert_eq!(&edges.src[6..], &[2, 1]);
    }

    #[test]
    fn test_complete_graph() {
        let edges = find_neighbors(&chain(), &NeighborRule::Complete);
        assert_eq!(edges.len(), 12);
        assert!(edges.src.iter().zip(&edges.dst).all(|(s, d)| s != d));
    }

    #[test]
    fn test_single_atom_has_no_edges() {
        let edges = find_neighbors(&[[0.0; 3]], &NeighborRule::Complete);
        assert!(edges.is_empty());
    }

    #[test]
    fn test_validate_rejects_bad_parameters() {
        assert!(NeighborRule::cutoff(0.0).validate().is_err());
        assert!(NeighborRule::cutoff(f64::NAN).validate().is_err());
        assert!(NeighborRule::k_nearest(0).validate().is_err());
        assert!(NeighborRule::Complete.validate().is_ok());
    }
}
