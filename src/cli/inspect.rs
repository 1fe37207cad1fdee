//! # inspect 子命令 CLI 定义
//!
//! 从结构目录中随机抽样并以表格展示
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/inspect.rs`

use clap::Args;
use std::path::PathBuf;

/// inspect 子命令参数
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Directory containing structure files of one format (.res or POSCAR/CONTCAR)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Number of samples to draw (with replacement if larger than the dataset)
    #[arg(short = 'n', long, default_value_t = 5)]
    pub num_samples: usize,

    /// Seed for reproducible sampling
    #[arg(long)]
    pub seed: Option<u64>,

    /// Comma-separated glob patterns for input files
    #[arg(short, long, default_value = "*.res,POSCAR*,CONTCAR*,*.vasp")]
    pub pattern: String,

    /// Recurse into subdirectories
    #[arg(short, long, default_value_t = false)]
    pub recursive: bool,

    /// Also write the table to a CSV file
    #[arg(long)]
    pub csv: Option<PathBuf>,
}
