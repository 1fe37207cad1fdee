//! # collate 子命令 CLI 定义
//!
//! 按批加载结构目录，可选转换为图表示，并报告合并后的字段形状
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/collate.rs`

use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// 样本表示
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum GraphMode {
    /// Keep point clouds (pad variable-length fields)
    None,
    /// Edges between atoms closer than --radius
    Cutoff,
    /// Edges to the k nearest atoms
    Knn,
    /// Fully connected graph
    Complete,
}

impl std::fmt::Display for GraphMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphMode::None => write!(f, "point cloud"),
            GraphMode::Cutoff => write!(f, "cutoff graph"),
            GraphMode::Knn => write!(f, "k-nearest graph"),
            GraphMode::Complete => write!(f, "complete graph"),
        }
    }
}

/// collate 子命令参数
#[derive(Args, Debug)]
pub struct CollateArgs {
    /// Directory containing structure files of one format (.res or POSCAR/CONTCAR)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Samples per batch
    #[arg(short, long, default_value_t = 8)]
    pub batch_size: usize,

    /// Sample representation
    #[arg(short, long, value_enum, default_value = "none")]
    pub graph: GraphMode,

    /// Neighbor cutoff radius in Å (cutoff mode)
    #[arg(long, default_value_t = 5.0)]
    pub radius: f64,

    /// Keep at most this many neighbors per atom (cutoff mode)
    #[arg(long)]
    pub max_neighbors: Option<usize>,

    /// Number of neighbors per atom (knn mode)
    #[arg(short, long, default_value_t = 12)]
    pub k: usize,

    /// Comma-separated fields to pad (point-cloud mode)
    #[arg(long, value_delimiter = ',', default_value = "pos,atomic_numbers")]
    pub pad_keys: Vec<String>,

    /// Comma-separated glob patterns for input files
    #[arg(short, long, default_value = "*.res,POSCAR*,CONTCAR*,*.vasp")]
    pub pattern: String,

    /// Recurse into subdirectories
    #[arg(short, long, default_value_t = false)]
    pub recursive: bool,

    /// Shuffle sample order
    #[arg(long, default_value_t = false)]
    pub shuffle: bool,

    /// Seed for shuffling
    #[arg(long)]
    pub seed: Option<u64>,

    /// Drop the last incomplete batch
    #[arg(long, default_value_t = false)]
    pub drop_last: bool,

    /// Number of parallel jobs (0 = auto)
    #[arg(short, long, env = "MATSCIML_JOBS", default_value_t = 0)]
    pub jobs: usize,

    /// Print the field summary of every batch, not only the first
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}
