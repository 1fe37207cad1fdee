//! # 数据模型模块
//!
//! 定义结构记录、样本、张量与图等核心数据类型。
//!
//! ## 依赖关系
//! - 被 `parsers/`, `datasets/`, `transforms/`, `collate/` 使用
//! - 子模块: element, structure, tensor, graph, sample

pub mod element;
pub mod graph;
pub mod sample;
pub mod structure;
pub mod tensor;

pub use graph::{Graph, GraphBatch};
pub use sample::{Sample, Value, ValueKind};
pub use structure::{Lattice, StructureRecord};
pub use tensor::{DType, Tensor};
