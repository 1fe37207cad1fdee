//! # 解析器模块
//!
//! 把结构文件解析为 [`StructureRecord`]，供结构目录数据集使用。
//!
//! ## 依赖关系
//! - 被 `datasets/store.rs` 使用
//! - 使用 `models/` 数据模型
//! - 子模块: res, poscar

pub mod poscar;
pub mod res;

use crate::error::{MatsciError, Result};
use crate::models::StructureRecord;
use std::fmt;
use std::path::Path;

/// 支持的结构文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StructureFormat {
    Res,
    Poscar,
}

impl StructureFormat {
    /// 由扩展名或文件名判断格式
    pub fn detect(path: &Path) -> Option<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();
        if ext == "res" {
            return Some(StructureFormat::Res);
        }

        // POSCAR/CONTCAR 通常没有扩展名，或以 .vasp 结尾
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if ext == "vasp" || name.starts_with("POSCAR") || name.starts_with("CONTCAR") {
            return Some(StructureFormat::Poscar);
        }
        None
    }
}

impl fmt::Display for StructureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructureFormat::Res => write!(f, "res"),
            StructureFormat::Poscar => write!(f, "poscar"),
        }
    }
}

/// 从文件路径推断格式并解析
pub fn parse_structure_file(path: &Path) -> Result<StructureRecord> {
    match StructureFormat::detect(path) {
        Some(StructureFormat::Res) => res::parse_res_file(path),
        Some(StructureFormat::Poscar) => poscar::parse_poscar_file(path),
        None => Err(MatsciError::UnsupportedFormat(format!(
            "Cannot determine format for: {}",
            path.display()
        ))),
    }
}
