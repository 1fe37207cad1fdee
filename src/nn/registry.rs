//! # 激活函数与归一化注册表
//!
//! 配置中以字符串标签选择激活函数和归一化层。标签在静态注册表中查找，
//! 大小写不敏感；未注册的标签返回 `UnknownTag` 配置错误。
//! 缺省（不需要激活或归一化）用 `Identity` 变体表示。
//!
//! ## 依赖关系
//! - 被 `nn/output.rs` 使用
//! - 使用 `std::sync::LazyLock` 构建注册表

use crate::error::{MatsciError, Result};

use ndarray::Array2;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// LeakyReLU 负半轴斜率
const LEAKY_SLOPE: f64 = 0.01;

/// 逐元素激活函数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activation {
    #[default]
    Identity,
    Relu,
    Silu,
    Gelu,
    Tanh,
    Sigmoid,
    LeakyRelu,
}

static ACTIVATIONS: LazyLock<HashMap<&'static str, fn() -> Activation>> = LazyLock::new(|| {
    let mut m: HashMap<&'static str, fn() -> Activation> = HashMap::new();
    m.insert("identity", || Activation::Identity);
    m.insert("relu", || Activation::Relu);
    m.insert("silu", || Activation::Silu);
    m.insert("swish", || Activation::Silu);
    m.insert("gelu", || Activation::Gelu);
    m.insert("tanh", || Activation::Tanh);
    m.insert("sigmoid", || Activation::Sigmoid);
    m.insert("leakyrelu", || Activation::LeakyRelu);
    m.insert("leaky_relu", || Activation::LeakyRelu);
    m
});

/// 归一化层种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormKind {
    #[default]
    Identity,
    RmsNorm,
}

static NORMS: LazyLock<HashMap<&'static str, fn() -> NormKind>> = LazyLock::new(|| {
    let mut m: HashMap<&'static str, fn() -> NormKind> = HashMap::new();
    m.insert("identity", || NormKind::Identity);
    m.insert("rmsnorm", || NormKind::RmsNorm);
    m.insert("rms_norm", || NormKind::RmsNorm);
    m
});

fn lookup<T>(
    registry: &'static str,
    table: &HashMap<&'static str, fn() -> T>,
    tag: &str,
) -> Result<T> {
    let normalized = tag.trim().to_ascii_lowercase();
    match table.get(normalized.as_str()) {
        Some(ctor) => Ok(ctor()),
        None => {
            let mut known: Vec<&str> = table.keys().copied().collect();
            known.sort_unstable();
            Err(MatsciError::UnknownTag {
                registry: registry.to_string(),
                tag: tag.to_string(),
                known: known.join(", "),
            })
        }
    }
}

impl Activation {
    /// 按标签查找
    pub fn from_tag(tag: &str) -> Result<Self> {
        lookup("activation", &ACTIVATIONS, tag)
    }

    /// 可选标签：`None` 即 `Identity`
    pub fn from_optional_tag(tag: Option<&str>) -> Result<Self> {
        tag.map_or(Ok(Activation::Identity), Self::from_tag)
    }

    pub fn apply(&self, x: f64) -> f64 {
        match self {
            Activation::Identity => x,
            Activation::Relu => x.max(0.0),
            Activation::Silu => x * sigmoid(x),
            // tanh 近似
            Activation::Gelu => {
                let c = (2.0 / std::f64::consts::PI).sqrt();
                0.5 * x * (1.0 + (c * (x + 0.044715 * x.powi(3))).tanh())
            }
            Activation::Tanh => x.tanh(),
            Activation::Sigmoid => sigmoid(x),
            Activation::LeakyRelu => {
                if x >= 0.0 {
                    x
                } else {
                    LEAKY_SLOPE * x
                }
            }
        }
    }

    pub fn forward(&self, x: &Array2<f64>) -> Array2<f64> {
        match self {
            Activation::Identity => x.clone(),
            act => x.mapv(|v| act.apply(v)),
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Activation::Identity => "identity",
            Activation::Relu => "relu",
            Activation::Silu => "silu",
            Activation::Gelu => "gelu",
            Activation::Tanh => "tanh",
            Activation::Sigmoid => "sigmoid",
            Activation::LeakyRelu => "leakyrelu",
        };
        write!(f, "{}", name)
    }
}

impl NormKind {
    /// 按标签查找
    pub fn from_tag(tag: &str) -> Result<Self> {
        lookup("norm", &NORMS, tag)
    }

    /// 可选标签：`None` 即 `Identity`
    pub fn from_optional_tag(tag: Option<&str>) -> Result<Self> {
        tag.map_or(Ok(NormKind::Identity), Self::from_tag)
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(Activation::from_tag("SiLU").unwrap(), Activation::Silu);
        assert_eq!(Activation::from_tag(" relu ").unwrap(), Activation::Relu);
        assert_eq!(NormKind::from_tag("RMSNorm").unwrap(), NormKind::RmsNorm);
    }

    #[test]
    fn test_unknown_tag_is_config_error() {
        let err = Activation::from_tag("torch.nn.Softmax").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.to_string().contains("torch.nn.Softmax"));
        assert!(err.to_string().contains("silu"));

        assert_eq!(NormKind::from_tag("batchnorm").unwrap_err().kind(), ErrorKind::Config);
    }

    #[test]
    fn test_absent_tag_is_identity() {
        assert_eq!(Activation::from_optional_tag(None).unwrap(), Activation::Identity);
        assert_eq!(NormKind::from_optional_tag(None).unwrap(), NormKind::Identity);
    }

    #[test]
    fn test_activation_values() {
        assert_eq!(Activation::Relu.apply(-2.0), 0.0);
        assert_eq!(Activation::LeakyRelu.apply(-2.0), -0.02);
        assert!((Activation::Sigmoid.apply(0.0) - 0.5).abs() < 1e-12);
        assert!((Activation::Silu.apply(1.0) - 0.7310585786).abs() < 1e-9);
        assert!((Activation::Gelu.apply(1.0) - 0.8411919906).abs() < 1e-6);
        assert_eq!(Activation::Identity.apply(3.5), 3.5);
    }
}
