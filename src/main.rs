//! # matsciml - 材料科学机器学习数据工具箱
//!
//! 命令行入口，基于 `matsciml` 库。
//!
//! ## 子命令
//! - `inspect` - 抽样查看结构目录数据集
//! - `collate` - 批量加载并合并数据集（点云填充或图表示）
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     └── matsciml::{datasets, transforms, collate}
//!   └── utils/      (输出、进度条)
//! ```

mod cli;
mod commands;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
