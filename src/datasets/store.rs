//! # 记录存储
//!
//! 数据集背后的只读记录源。`RecordStore` 只负责按下标读出原始样本，
//! 变换与采样由 `Dataset` 处理。
//!
//! - `MemoryStore`: 内存中的样本列表，测试和小数据集用
//! - `StructureDirStore`: 结构文件目录，每次访问时解析（不缓存）。
//!   不同格式产生的字段集合不同，无法合并为同一批次，
//!   因此一个目录只允许一种格式。
//!
//! ## 依赖关系
//! - 被 `datasets/dataset.rs` 使用
//! - 使用 `datasets/collector.rs` 收集文件
//! - 使用 `parsers/` 解析结构文件

use crate::datasets::collector::FileCollector;
use crate::error::{MatsciError, Result};
use crate::models::Sample;
use crate::parsers::{self, StructureFormat};

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// 按下标读取原始样本的记录源
pub trait RecordStore: Send + Sync {
    /// 记录总数
    fn count(&self) -> usize;

    /// 读取第 `index` 条记录；调用方保证 `index < count()`
    fn read_record(&self, index: usize) -> Result<Sample>;
}

/// 内存样本存储
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    samples: Vec<Sample>,
}

impl MemoryStore {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }
}

impl From<Vec<Sample>> for MemoryStore {
    fn from(samples: Vec<Sample>) -> Self {
        Self::new(samples)
    }
}

impl RecordStore for MemoryStore {
    fn count(&self) -> usize {
        self.samples.len()
    }

    fn read_record(&self, index: usize) -> Result<Sample> {
        self.samples
            .get(index)
            .cloned()
            .ok_or(MatsciError::IndexOutOfRange {
                index,
                len: self.samples.len(),
            })
    }
}

/// 结构文件目录存储
#[derive(Debug, Clone)]
pub struct StructureDirStore {
    root: PathBuf,
    paths: Vec<PathBuf>,
}

impl StructureDirStore {
    /// 以默认模式扫描目录（不递归）
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        Self::scan(FileCollector::new(root.as_ref()), root.as_ref())
    }

    /// 以自定义模式扫描目录
    pub fn open_with(root: impl AsRef<Path>, pattern: &str, recursive: bool) -> Result<Self> {
        let collector = FileCollector::new(root.as_ref())
            .with_pattern(pattern)?
            .recursive(recursive);
        Self::scan(collector, root.as_ref())
    }

    fn scan(collector: FileCollector, root: &Path) -> Result<Self> {
        if !root.exists() {
            return Err(MatsciError::DirectoryNotFound {
                path: root.display().to_string(),
            });
        }
        let paths = collector.collect()?;

        let formats: BTreeSet<StructureFormat> =
            paths.iter().filter_map(|p| StructureFormat::detect(p)).collect();
        if formats.len() > 1 {
            let names: Vec<String> = formats.iter().map(ToString::to_string).collect();
            return Err(MatsciError::InvalidConfig(format!(
                "'{}' mixes structure formats ({}); narrow the file pattern to one format",
                root.display(),
                names.join(", ")
            )));
        }

        Ok(Self {
            root: root.to_path_buf(),
            paths,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 已排序的文件列表，下标即样本下标
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn path(&self, index: usize) -> Option<&Path> {
        self.paths.get(index).map(PathBuf::as_path)
    }
}

impl RecordStore for StructureDirStore {
    fn count(&self) -> usize {
        self.paths.len()
    }

    fn read_record(&self, index: usize) -> Result<Sample> {
        let path = self.paths.get(index).ok_or(MatsciError::IndexOutOfRange {
            index,
            len: self.paths.len(),
        })?;
        parsers::parse_structure_file(path)?.to_sample()
    }
}
