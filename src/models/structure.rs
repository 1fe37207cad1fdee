//! # 晶体结构记录
//!
//! 结构文件解析后的统一中间表示，以及到数据集样本的转换。
//!
//! ## 依赖关系
//! - 被 `parsers/` 构造，被 `datasets/store.rs` 转换为 [`Sample`]
//! - 使用 `models/element.rs` 查询原子序数

use crate::error::{MatsciError, Result};
use crate::models::element;
use crate::models::{Sample, Tensor};

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 晶格参数表示
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lattice {
    /// 晶格向量矩阵 (3x3)，行向量表示 a, b, c
    pub matrix: [[f64; 3]; 3],
}

impl Lattice {
    /// 从晶格参数 (a, b, c, alpha, beta, gamma) 创建晶格
    /// 角度单位：度
    pub fn from_parameters(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Self {
        let (cos_alpha, cos_beta) = (alpha.to_radians().cos(), beta.to_radians().cos());
        let (sin_gamma, cos_gamma) = gamma.to_radians().sin_cos();

        let c1 = c * cos_beta;
        let c2 = c * (cos_alpha - cos_beta * cos_gamma) / sin_gamma;
        let c3 = (c * c - c1 * c1 - c2 * c2).sqrt();

        Lattice {
            matrix: [
                [a, 0.0, 0.0],
                [b * cos_gamma, b * sin_gamma, 0.0],
                [c1, c2, c3],
            ],
        }
    }

    pub fn from_vectors(matrix: [[f64; 3]; 3]) -> Self {
        Lattice { matrix }
    }

    /// 晶格参数 [a, b, c, alpha, beta, gamma]
    pub fn parameters(&self) -> [f64; 6] {
        let [va, vb, vc] = self.matrix;
        let (a, b, c) = (norm(&va), norm(&vb), norm(&vc));

        let alpha = (dot(&vb, &vc) / (b * c)).acos().to_degrees();
        let beta = (dot(&va, &vc) / (a * c)).acos().to_degrees();
        let gamma = (dot(&va, &vb) / (a * b)).acos().to_degrees();

        [a, b, c, alpha, beta, gamma]
    }

    /// 晶胞体积（带符号的行列式）
    pub fn volume(&self) -> f64 {
        let [a, b, c] = self.matrix;
        dot(&a, &cross(&b, &c))
    }

    /// 分数坐标转笛卡尔坐标
    pub fn to_cartesian(&self, frac: &[f64; 3]) -> [f64; 3] {
        let m = &self.matrix;
        [
            frac[0] * m[0][0] + frac[1] * m[1][0] + frac[2] * m[2][0],
            frac[0] * m[0][1] + frac[1] * m[1][1] + frac[2] * m[2][1],
            frac[0] * m[0][2] + frac[1] * m[1][2] + frac[2] * m[2][2],
        ]
    }

    /// 笛卡尔坐标转分数坐标；晶格退化时原样返回
    pub fn to_fractional(&self, cart: &[f64; 3]) -> [f64; 3] {
        let [a, b, c] = self.matrix;
        let det = self.volume();
        if det.abs() < 1e-10 {
            return *cart;
        }
        // 逆矩阵的列为倒格矢 / det
        let (bc, ca, ab) = (cross(&b, &c), cross(&c, &a), cross(&a, &b));
        [
            dot(cart, &bc) / det,
            dot(cart, &ca) / det,
            dot(cart, &ab) / det,
        ]
    }
}

fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn norm(v: &[f64; 3]) -> f64 {
    dot(v, v).sqrt()
}

/// 解析得到的结构记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureRecord {
    /// 结构名称
    pub name: String,

    pub lattice: Lattice,

    /// 元素符号，按原子顺序
    pub species: Vec<String>,

    /// 分数坐标，与 `species` 一一对应
    pub frac_coords: Vec<[f64; 3]>,

    /// 能量 (eV)
    pub energy: Option<f64>,

    /// 空间群
    pub space_group: Option<String>,
}

impl StructureRecord {
    pub fn new(name: impl Into<String>, lattice: Lattice) -> Self {
        StructureRecord {
            name: name.into(),
            lattice,
            species: Vec::new(),
            frac_coords: Vec::new(),
            energy: None,
            space_group: None,
        }
    }

    pub fn push_atom(&mut self, element: impl Into<String>, frac: [f64; 3]) {
        self.species.push(element.into());
        self.frac_coords.push(frac);
    }

    pub fn num_atoms(&self) -> usize {
        self.species.len()
    }

    /// 计算化学式（元素按字母序）
    pub fn formula(&self) -> String {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for el in &self.species {
            *counts.entry(el.as_str()).or_insert(0) += 1;
        }

        counts
            .into_iter()
            .map(|(el, count)| {
                if count == 1 {
                    el.to_string()
                } else {
                    format!("{}{}", el, count)
                }
            })
            .collect()
    }

    /// 原子序数列表；未知元素报错
    pub fn atomic_numbers(&self) -> Result<Vec<i64>> {
        self.species
            .iter()
            .map(|el| {
                element::atomic_number(el)
                    .map(i64::from)
                    .ok_or_else(|| MatsciError::UnknownElement(el.clone()))
            })
            .collect()
    }

    /// 笛卡尔坐标 `[N, 3]`
    pub fn cartesian_coords(&self) -> Array2<f64> {
        let mut pos = Array2::zeros((self.num_atoms(), 3));
        for (mut row, frac) in pos.rows_mut().into_iter().zip(&self.frac_coords) {
            let cart = self.lattice.to_cartesian(frac);
            row.assign(&Array1::from(cart.to_vec()));
        }
        pos
    }

    /// 转换为数据集样本
    ///
    /// 只输出文件中确实存在的信息：能量缺失时不产生 `energy`/`targets`，
    /// 空间群缺失时不产生 `symmetry`。
    pub fn to_sample(&self) -> Result<Sample> {
        let numbers = Array1::from(self.atomic_numbers()?);
        let lattice_params = Array1::from(self.lattice.parameters().to_vec());

        let mut sample = Sample::new()
            .with("atomic_numbers", numbers.into_dyn())
            .with("pos", self.cartesian_coords().into_dyn())
            .with("lattice_params", lattice_params.into_dyn());

        if let Some(energy) = self.energy {
            sample.insert("energy", Tensor::scalar(energy));
            sample.insert("targets", Array1::from(vec![energy]).into_dyn());
            sample.insert("target_types", "regression:energy");
        }
        if let Some(sg) = &self.space_group {
            sample.insert("symmetry", sg.as_str());
        }

        Ok(sample)
    }
}
