//! # AIRSS .res 格式解析器
//!
//! 解析 AIRSS 结构搜索产生的 .res 文件为 [`StructureRecord`]。
//!
//! ## .res 格式说明
//! ```text
//! TITL name P V H |spin| spin n (sym) n
//! CELL 1.0 a b c alpha beta gamma
//! LATT -1
//! SFAC Element1 Element2 ...
//! Element1 1 x1 y1 z1 1.0
//! Element2 2 x2 y2 z2 1.0
//! ...
//! END
//! ```
//!
//! TITL 第 5 列（焓/能量，eV）作为样本的 `energy`，括号内为空间群。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 使用
//! - 使用 `models/structure.rs`
//! - 使用 `regex` 提取空间群

use crate::error::{MatsciError, Result};
use crate::models::{Lattice, StructureRecord};

use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

static SYMMETRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(([^)]+)\)").expect("static regex")
});

/// 解析 .res 文件
pub fn parse_res_file(path: &Path) -> Result<StructureRecord> {
    let content = fs::read_to_string(path).map_err(|e| MatsciError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_res_content(
        &content,
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown"),
    )
}

/// 从字符串内容解析 .res 格式
pub fn parse_res_content(content: &str, default_name: &str) -> Result<StructureRecord> {
    let mut name = default_name.to_string();
    let mut energy: Option<f64> = None;
    let mut space_group: Option<String> = None;

    let mut lattice: Option<Lattice> = None;
    let mut sfac_elements: Vec<String> = Vec::new();
    let mut atoms: Vec<(String, [f64; 3])> = Vec::new();

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(keyword) = parts.first() else {
            continue;
        };

        match keyword.to_uppercase().as_str() {
            "TITL" => {
                if let Some(n) = parts.get(1) {
                    name = n.to_string();
                }
                energy = parts.get(4).and_then(|s| s.parse().ok());
                space_group = SYMMETRY.captures(line).map(|c| c[1].trim().to_string());
            }
            "CELL" => {
                let params: Vec<f64> = parts
                    .iter()
                    .skip(2)
                    .take(6)
                    .filter_map(|s| s.parse().ok())
                    .collect();
                if let [a, b, c, alpha, beta, gamma] = params[..] {
                    lattice = Some(Lattice::from_parameters(a, b, c, alpha, beta, gamma));
                }
            }
            "SFAC" => {
                sfac_elements = parts[1..].iter().map(|s| s.to_string()).collect();
            }
            "LATT" | "ZERR" | "REM" => {}
            "END" => break,
            _ => {
                // 原子行: Element type x y z occ
                let known = sfac_elements.iter().any(|e| e.eq_ignore_ascii_case(keyword));
                if parts.len() >= 5 && known {
                    let coords: Option<Vec<f64>> =
                        parts[2..5].iter().map(|s| s.parse().ok()).collect();
                    if let Some(c) = coords {
                        atoms.push((keyword.to_string(), [c[0], c[1], c[2]]));
                    }
                }
            }
        }
    }

    let lattice = lattice.ok_or_else(|| MatsciError::ParseError {
        format: "res".to_string(),
        path: name.clone(),
        reason: "Missing CELL line".to_string(),
    })?;

    let mut record = StructureRecord::new(name, lattice);
    record.energy = energy;
    record.space_group = space_group;
    for (element, frac) in atoms {
        record.push_atom(element, frac);
    }

    Ok(record)
}
