//! # 统一错误处理模块
//!
//! 定义 matsciml 的所有错误类型，使用 `thiserror` 派生。
//! 每个错误都能通过 [`MatsciError::kind`] 归入索引、键、取值、配置、I/O、解析六类。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// matsciml 统一错误类型
#[derive(Error, Debug)]
pub enum MatsciError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    #[error("Unknown element symbol: {0}")]
    UnknownElement(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    // ─────────────────────────────────────────────────────────────
    // 索引错误
    // ─────────────────────────────────────────────────────────────
    #[error("Index {index} out of range for dataset of {len} samples")]
    IndexOutOfRange { index: usize, len: usize },

    // ─────────────────────────────────────────────────────────────
    // 键错误
    // ─────────────────────────────────────────────────────────────
    #[error("Field '{key}' is present in some samples but missing from sample {sample}")]
    InconsistentFields { key: String, sample: usize },

    #[error("Required field '{key}' not found")]
    MissingField { key: String },

    // ─────────────────────────────────────────────────────────────
    // 取值错误（形状、类型、空输入）
    // ─────────────────────────────────────────────────────────────
    #[error("Cannot collate an empty list of samples")]
    EmptyBatch,

    #[error("Shape mismatch for '{key}' in sample {sample}: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        key: String,
        sample: usize,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("Trailing dimensions of padded field '{key}' differ in sample {sample}: expected {expected:?}, found {found:?}")]
    TrailingDimMismatch {
        key: String,
        sample: usize,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("Type mismatch for '{key}': expected {expected}, found {found}")]
    TypeMismatch {
        key: String,
        expected: String,
        found: String,
    },

    #[error("'pos' has {pos} atoms but 'atomic_numbers' has {atomic_numbers}")]
    LengthMismatch { pos: usize, atomic_numbers: usize },

    #[error("Graph has no nodes")]
    EmptyGraph,

    #[error("Malformed graph: {0}")]
    MalformedGraph(String),

    #[error("Expected input with {expected} features, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Field name '{0}' is reserved for collation masks")]
    ReservedField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    // ─────────────────────────────────────────────────────────────
    // 配置错误
    // ─────────────────────────────────────────────────────────────
    #[error("Unknown {registry} tag '{tag}' (known: {known})")]
    UnknownTag {
        registry: String,
        tag: String,
        known: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ─────────────────────────────────────────────────────────────
    // CSV 错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 越界的样本访问
    Index,
    /// 批次内字段集合不一致或缺失字段
    Key,
    /// 形状不符、空批次、非法图结构等
    Value,
    /// 未知注册标签、非法参数
    Config,
    Io,
    Parse,
}

impl MatsciError {
    /// 返回错误所属类别
    pub fn kind(&self) -> ErrorKind {
        match self {
            MatsciError::FileReadError { .. }
            | MatsciError::FileWriteError { .. }
            | MatsciError::DirectoryNotFound { .. }
            | MatsciError::CsvError(_) => ErrorKind::Io,

            MatsciError::ParseError { .. }
            | MatsciError::UnknownElement(_)
            | MatsciError::UnsupportedFormat(_) => ErrorKind::Parse,

            MatsciError::IndexOutOfRange { .. } => ErrorKind::Index,

            MatsciError::InconsistentFields { .. } | MatsciError::MissingField { .. } => {
                ErrorKind::Key
            }

            MatsciError::EmptyBatch
            | MatsciError::ShapeMismatch { .. }
            | MatsciError::TrailingDimMismatch { .. }
            | MatsciError::TypeMismatch { .. }
            | MatsciError::LengthMismatch { .. }
            | MatsciError::EmptyGraph
            | MatsciError::MalformedGraph(_)
            | MatsciError::DimensionMismatch { .. }
            | MatsciError::ReservedField(_)
            | MatsciError::InvalidValue(_) => ErrorKind::Value,

            MatsciError::UnknownTag { .. }
            | MatsciError::InvalidConfig(_)
            | MatsciError::InvalidArgument(_) => ErrorKind::Config,
        }
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, MatsciError>;
