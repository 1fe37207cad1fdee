//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `inspect`: 抽样查看结构目录数据集
//! - `collate`: 批量加载并合并数据集，报告批次形状
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: inspect, collate

pub mod collate;
pub mod inspect;

use clap::{Parser, Subcommand};

/// matsciml - 材料科学机器学习数据工具箱
#[derive(Parser)]
#[command(name = "matsciml")]
#[command(version)]
#[command(about = "Dataset, transform and collation toolkit for materials-science ML", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Draw samples from a structure directory and print a summary table
    Inspect(inspect::InspectArgs),

    /// Load a structure directory in batches and report collated shapes
    Collate(collate::CollateArgs),
}
