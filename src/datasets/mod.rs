//! # 数据集模块
//!
//! 从记录存储读取样本、应用变换、采样并按批加载。
//!
//! ## 功能
//! - `RecordStore` 抽象与内存/结构目录两种实现
//! - `Dataset` 门面：下标访问、采样、迭代、collate
//! - `BatchLoader`：并行分批加载
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `parsers/`, `transforms/`, `collate/`
//! - 子模块: collector, store, dataset, loader

pub mod collector;
pub mod dataset;
pub mod loader;
pub mod store;

pub use collector::FileCollector;
pub use dataset::Dataset;
pub use loader::{BatchLoader, LoaderOptions};
pub use store::{MemoryStore, RecordStore, StructureDirStore};
