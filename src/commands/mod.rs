//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `utils/` 与 `matsciml` 库
//! - 子模块: inspect, collate

pub mod collate;
pub mod inspect;

use crate::cli::Commands;
use matsciml::error::Result;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Inspect(args) => inspect::execute(args),
        Commands::Collate(args) => collate::execute(args),
    }
}
