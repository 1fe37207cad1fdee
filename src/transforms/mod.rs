//! # 表示变换模块
//!
//! 在点云表示与图表示之间转换单个样本。
//!
//! ## 约定
//! - 变换是输入样本的纯函数，不持有跨调用的可变状态
//! - 实现 `Send + Sync`，可在多个工作线程中并发调用
//! - 输入已是目标表示时原样返回（见各实现的说明）
//!
//! ## 依赖关系
//! - 被 `datasets/dataset.rs` 调用
//! - 使用 `models/`
//! - 子模块: neighbors, to_graph, to_point_cloud

pub mod neighbors;
pub mod to_graph;
pub mod to_point_cloud;

pub use neighbors::{find_neighbors, EdgeList, NeighborRule};
pub use to_graph::PointCloudToGraph;
pub use to_point_cloud::GraphToPointCloud;

use crate::error::Result;
use crate::models::Sample;

/// 作用于单个样本的变换
pub trait Transform: Send + Sync {
    /// 变换样本，返回新的样本
    fn apply(&self, sample: Sample) -> Result<Sample>;

    /// 人类可读的名称
    fn name(&self) -> &str {
        "transform"
    }
}
