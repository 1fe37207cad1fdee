//! # matsciml - 材料科学机器学习数据工具箱
//!
//! 为晶体/分子数据集提供样本读取、点云与图表示之间的变换、
//! 带填充与掩码的按键合并（collate），以及输出头等神经网络构件。
//!
//! ## 数据流
//! ```text
//! RecordStore ─▶ Dataset ─▶ Transform(s) ─▶ Collator ─▶ Batch
//!                   └── BatchLoader (rayon 并行取样)
//! ```
//!
//! ## 依赖关系
//! ```text
//! lib.rs
//!   ├── datasets/   (记录存储、数据集门面、批量加载)
//!   │     ├── parsers/    (.res / POSCAR 解析)
//!   │     ├── transforms/ (点云 ⇄ 图)
//!   │     └── collate/    (按键合并)
//!   ├── models/     (样本、张量、图、结构记录)
//!   ├── nn/         (输出头、RMSNorm、注册表)
//!   └── error.rs    (错误处理)
//! ```

pub mod collate;
pub mod datasets;
pub mod error;
pub mod models;
pub mod nn;
pub mod parsers;
pub mod transforms;

pub use collate::{concatenate, Batch, BatchValue, CollateOptions, Collator};
pub use datasets::{BatchLoader, Dataset, LoaderOptions, MemoryStore, RecordStore, StructureDirStore};
pub use error::{ErrorKind, MatsciError, Result};
pub use models::{Graph, GraphBatch, Sample, Tensor, Value};
pub use transforms::{GraphToPointCloud, NeighborRule, PointCloudToGraph, Transform};
