//! # 输出头
//!
//! `OutputBlock`: Linear → 激活 → 归一化 → dropout，可选残差连接。
//! `OutputHead`: 把编码器嵌入映射为目标值的块堆叠：
//!
//! ```text
//! input_dim ─▶ hidden_dim            (无残差)
//! hidden_dim ─▶ hidden_dim × num_hidden (可残差)
//! hidden_dim ─▶ output_dim           (act_last，无归一化、无残差、无 dropout)
//! ```
//!
//! 输入维度必须在构造时给定，前向时检查。
//!
//! ## 依赖关系
//! - 使用 `nn/linear.rs`, `nn/norm.rs`, `nn/registry.rs`
//! - 使用 `rand` 初始化权重和 dropout

use crate::error::{MatsciError, Result};
use crate::nn::linear::Linear;
use crate::nn::norm::{Norm, RmsNormConfig};
use crate::nn::registry::{Activation, NormKind};

use ndarray::Array2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// 单个输出块
#[derive(Debug, Clone, PartialEq)]
pub struct OutputBlock {
    linear: Linear,
    activation: Activation,
    norm: Norm,
    dropout: f64,
    residual: bool,
}

impl OutputBlock {
    pub fn new(
        linear: Linear,
        activation: Activation,
        norm: Norm,
        dropout: f64,
        residual: bool,
    ) -> Result<Self> {
        if !(0.0..1.0).contains(&dropout) {
            return Err(MatsciError::InvalidConfig(format!(
                "dropout must be in [0, 1), got {}",
                dropout
            )));
        }
        if residual && linear.in_dim() != linear.out_dim() {
            return Err(MatsciError::InvalidConfig(format!(
                "residual block needs equal input and output dims, got {} -> {}",
                linear.in_dim(),
                linear.out_dim()
            )));
        }
        Ok(Self {
            linear,
            activation,
            norm,
            dropout,
            residual,
        })
    }

    pub fn input_dim(&self) -> usize {
        self.linear.in_dim()
    }

    pub fn output_dim(&self) -> usize {
        self.linear.out_dim()
    }

    pub fn is_residual(&self) -> bool {
        self.residual
    }

    /// 推理前向（不做 dropout）
    pub fn forward(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let y = self.transform(x)?;
        Ok(self.add_residual(x, y))
    }

    /// 训练前向，按 `dropout` 概率置零并放大保留值
    pub fn forward_train<R: Rng + ?Sized>(&self, x: &Array2<f64>, rng: &mut R) -> Result<Array2<f64>> {
        let mut y = self.transform(x)?;
        if self.dropout > 0.0 {
            let keep = 1.0 - self.dropout;
            y.mapv_inplace(|v| if rng.gen::<f64>() < keep { v / keep } else { 0.0 });
        }
        Ok(self.add_residual(x, y))
    }

    fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let y = self.linear.forward(x)?;
        let y = self.activation.forward(&y);
        self.norm.forward(&y)
    }

    fn add_residual(&self, x: &Array2<f64>, y: Array2<f64>) -> Array2<f64> {
        if self.residual {
            y + x
        } else {
            y
        }
    }
}

/// 输出头配置；激活与归一化用注册表标签表示
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputHeadConfig {
    pub input_dim: usize,
    pub hidden_dim: usize,
    pub output_dim: usize,
    pub num_hidden: usize,
    pub activation: Option<String>,
    pub norm: Option<String>,
    pub act_last: Option<String>,
    pub bias: bool,
    pub dropout: f64,
    pub residual: bool,
    pub norm_config: RmsNormConfig,
}

impl Default for OutputHeadConfig {
    fn default() -> Self {
        Self {
            input_dim: 0,
            hidden_dim: 0,
            output_dim: 1,
            num_hidden: 1,
            activation: None,
            norm: None,
            act_last: None,
            bias: true,
            dropout: 0.0,
            residual: true,
            norm_config: RmsNormConfig::default(),
        }
    }
}

/// 输出头
#[derive(Debug, Clone, PartialEq)]
pub struct OutputHead {
    blocks: Vec<OutputBlock>,
}

impl OutputHead {
    pub fn from_config<R: Rng + ?Sized>(config: &OutputHeadConfig, rng: &mut R) -> Result<Self> {
        let activation = Activation::from_optional_tag(config.activation.as_deref())?;
        let act_last = Activation::from_optional_tag(config.act_last.as_deref())?;
        let norm_kind = NormKind::from_optional_tag(config.norm.as_deref())?;
        let hidden = config.hidden_dim;

        let mut blocks = Vec::with_capacity(config.num_hidden + 2);
        blocks.push(OutputBlock::new(
            Linear::new(config.input_dim, hidden, config.bias, rng)?,
            activation,
            Norm::build(norm_kind, hidden, &config.norm_config)?,
            config.dropout,
            false,
        )?);
        for _ in 0..config.num_hidden {
            blocks.push(OutputBlock::new(
                Linear::new(hidden, hidden, config.bias, rng)?,
                activation,
                Norm::build(norm_kind, hidden, &config.norm_config)?,
                config.dropout,
                config.residual,
            )?);
        }
        blocks.push(OutputBlock::new(
            Linear::new(hidden, config.output_dim, config.bias, rng)?,
            act_last,
            Norm::Identity,
            0.0,
            false,
        )?);

        Ok(Self { blocks })
    }

    /// 由已构造的块组成
    pub fn from_blocks(blocks: Vec<OutputBlock>) -> Result<Self> {
        if blocks.is_empty() {
            return Err(MatsciError::InvalidConfig(
                "output head needs at least one block".to_string(),
            ));
        }
        for pair in blocks.windows(2) {
            if pair[0].output_dim() != pair[1].input_dim() {
                return Err(MatsciError::InvalidConfig(format!(
                    "block output dim {} does not feed next block input dim {}",
                    pair[0].output_dim(),
                    pair[1].input_dim()
                )));
            }
        }
        Ok(Self { blocks })
    }

    pub fn blocks(&self) -> &[OutputBlock] {
        &self.blocks
    }

    pub fn input_dim(&self) -> usize {
        self.blocks[0].input_dim()
    }

    pub fn output_dim(&self) -> usize {
        self.blocks[self.blocks.len() - 1].output_dim()
    }

    pub fn forward(&self, embedding: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_input(embedding)?;
        self.blocks
            .iter()
            .try_fold(embedding.clone(), |x, block| block.forward(&x))
    }

    pub fn forward_train<R: Rng + ?Sized>(&self, embedding: &Array2<f64>, rng: &mut R) -> Result<Array2<f64>> {
        self.check_input(embedding)?;
        let mut x = embedding.clone();
        for block in &self.blocks {
            x = block.forward_train(&x, rng)?;
        }
        Ok(x)
    }

    fn check_input(&self, embedding: &Array2<f64>) -> Result<()> {
        if embedding.ncols() != self.input_dim() {
            return Err(MatsciError::DimensionMismatch {
                expected: self.input_dim(),
                found: embedding.ncols(),
            });
        }
        Ok(())
    }
}
