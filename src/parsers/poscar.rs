//! # VASP POSCAR 格式解析器
//!
//! 解析 VASP POSCAR/CONTCAR 文件为 [`StructureRecord`]。
//!
//! ## POSCAR 格式说明
//! ```text
//! Comment line (structure name)
//! 1.0                    # scaling factor (负数表示目标体积)
//! a1 a2 a3               # lattice vector a
//! b1 b2 b3               # lattice vector b
//! c1 c2 c3               # lattice vector c
//! Element1 Element2 ...  # element symbols (VASP 5+)
//! n1 n2 ...              # number of atoms per element
//! Selective dynamics     # optional
//! Direct/Cartesian       # coordinate type
//! x1 y1 z1               # atom positions
//! ...
//! ```
//!
//! 数据集需要原子序数，因此不带元素行的 VASP 4 格式会被拒绝。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 使用
//! - 使用 `models/structure.rs`

use crate::error::{MatsciError, Result};
use crate::models::{Lattice, StructureRecord};
use std::fs;
use std::path::Path;

/// 解析 POSCAR/CONTCAR 文件
pub fn parse_poscar_file(path: &Path) -> Result<StructureRecord> {
    let content = fs::read_to_string(path).map_err(|e| MatsciError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_poscar_content(
        &content,
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown"),
    )
}

/// 从字符串内容解析 POSCAR 格式
pub fn parse_poscar_content(content: &str, default_name: &str) -> Result<StructureRecord> {
    let lines: Vec<&str> = content.lines().collect();
    let fail = |reason: String| MatsciError::ParseError {
        format: "poscar".to_string(),
        path: default_name.to_string(),
        reason,
    };

    if lines.len() < 8 {
        return Err(fail("File too short".to_string()));
    }

    let name = match lines[0].trim() {
        "" => default_name.to_string(),
        comment => comment.to_string(),
    };

    let scale: f64 = lines[1]
        .split_whitespace()
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| fail("Invalid scaling factor".to_string()))?;

    let mut matrix = [[0.0; 3]; 3];
    for (i, row) in matrix.iter_mut().enumerate() {
        let parts = parse_floats(lines[2 + i], 3)
            .ok_or_else(|| fail(format!("Invalid lattice vector at line {}", 3 + i)))?;
        row.copy_from_slice(&parts);
    }

    // 负的缩放因子表示晶胞体积
    let factor = if scale < 0.0 {
        let raw_volume = Lattice::from_vectors(matrix).volume().abs();
        (scale.abs() / raw_volume).cbrt()
    } else {
        scale
    };
    for row in matrix.iter_mut() {
        for v in row.iter_mut() {
            *v *= factor;
        }
    }
    let lattice = Lattice::from_vectors(matrix);

    let elements: Vec<&str> = lines[5].split_whitespace().collect();
    if elements.first().map_or(true, |s| s.parse::<usize>().is_ok()) {
        return Err(fail(
            "Missing element symbol line (VASP 4 format is not supported)".to_string(),
        ));
    }
    let counts: Vec<usize> = lines[6]
        .split_whitespace()
        .map(|s| s.parse())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| fail("Invalid atom count line".to_string()))?;
    if counts.len() != elements.len() {
        return Err(fail(format!(
            "{} element symbols but {} atom counts",
            elements.len(),
            counts.len()
        )));
    }

    let mut coord_line = 7;
    if lines
        .get(coord_line)
        .is_some_and(|l| l.trim().to_lowercase().starts_with('s'))
    {
        coord_line += 1;
    }
    let coord_type = lines
        .get(coord_line)
        .ok_or_else(|| fail("Missing coordinate type line".to_string()))?
        .trim()
        .to_lowercase();
    let is_cartesian = coord_type.starts_with('c') || coord_type.starts_with('k');

    let mut record = StructureRecord::new(name, lattice);
    let mut line_idx = coord_line + 1;

    for (element, &count) in elements.iter().zip(&counts) {
        for _ in 0..count {
            let coords = lines
                .get(line_idx)
                .and_then(|l| parse_floats(l, 3))
                .ok_or_else(|| fail(format!("Invalid or missing position at line {}", line_idx + 1)))?;
            let xyz = [coords[0], coords[1], coords[2]];
            let frac = if is_cartesian {
                record.lattice.to_fractional(&xyz.map(|v| v * factor))
            } else {
                xyz
            };
            record.push_atom(*element, frac);
            line_idx += 1;
        }
    }

    Ok(record)
}

/// 读取一行开头的 n 个浮点数
fn parse_floats(line: &str, n: usize) -> Option<Vec<f64>> {
    let values: Vec<f64> = line
        .split_whitespace()
        .take(n)
        .map(|s| s.parse().ok())
        .collect::<Option<_>>()?;
    (values.len() == n).then_some(values)
}
