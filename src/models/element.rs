//! # 元素周期表
//!
//! 元素符号与原子序数的双向查询。
//!
//! ## 依赖关系
//! - 被 `models/structure.rs` 调用
//! - 纯静态数据，无外部依赖

use std::collections::HashMap;
use std::sync::LazyLock;

/// 按原子序数排列的元素符号（下标 0 对应 H）
pub const ELEMENTS: [&str; 118] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl",
    "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As",
    "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In",
    "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb",
    "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl",
    "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk",
    "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn", "Nh",
    "Fl", "Mc", "Lv", "Ts", "Og",
];

static BY_SYMBOL: LazyLock<HashMap<&'static str, u8>> = LazyLock::new(|| {
    ELEMENTS
        .iter()
        .enumerate()
        .map(|(i, &sym)| (sym, (i + 1) as u8))
        .collect()
});

/// 查询原子序数
///
/// 容忍常见写法：大小写不规范（`FE`）、位点标签（`Fe1`）、POTCAR 后缀（`Fe_pv`）。
pub fn atomic_number(symbol: &str) -> Option<u8> {
    let base: String = symbol
        .split(|c: char| c == '_' || c == '/' || c == '.')
        .next()
        .unwrap_or("")
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();

    let mut chars = base.chars();
    let normalized = match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase(),
        None => return None,
    };

    BY_SYMBOL.get(normalized.as_str()).copied()
}

/// 由原子序数查询符号
pub fn symbol(z: u8) -> Option<&'static str> {
    ELEMENTS.get((z as usize).checked_sub(1)?).copied()
}
