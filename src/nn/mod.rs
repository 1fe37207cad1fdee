//! # 神经网络构件
//!
//! 下游性质预测模型使用的输出头与归一化层，基于 `ndarray` 的前向计算。
//! 激活函数与归一化通过字符串标签在静态注册表中选择。
//!
//! ## 依赖关系
//! - 使用 `ndarray`, `rand`
//! - 子模块: registry, linear, norm, output

pub mod linear;
pub mod norm;
pub mod output;
pub mod registry;

pub use linear::Linear;
pub use norm::{Norm, RmsNorm, RmsNormConfig};
pub use output::{OutputBlock, OutputHead, OutputHeadConfig};
pub use registry::{Activation, NormKind};
