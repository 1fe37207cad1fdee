//! # 数据集门面
//!
//! 在 `RecordStore` 之上提供下标访问、随机采样、迭代与 collate。
//! 注册的变换在每次取样时按注册顺序依次执行。
//!
//! ## 依赖关系
//! - 使用 `datasets/store.rs` 读取原始记录
//! - 使用 `transforms/` 的 `Transform`
//! - 使用 `collate/` 组批
//! - 使用 `rand` 采样

use crate::collate::{Batch, CollateOptions, Collator};
use crate::datasets::store::RecordStore;
use crate::error::{MatsciError, Result};
use crate::models::Sample;
use crate::transforms::Transform;

use rand::seq::index;
use rand::Rng;

/// 数据集
pub struct Dataset<S: RecordStore> {
    store: S,
    transforms: Vec<Box<dyn Transform>>,
}

impl<S: RecordStore> Dataset<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            transforms: Vec::new(),
        }
    }

    /// 追加一个变换，取样时按注册顺序执行
    pub fn with_transform(mut self, transform: impl Transform + 'static) -> Self {
        self.transforms.push(Box::new(transform));
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// 已注册变换的名称
    pub fn transform_names(&self) -> Vec<&str> {
        self.transforms.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.store.count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 读取第 `index` 个样本并应用全部变换
    pub fn get(&self, index: usize) -> Result<Sample> {
        let len = self.len();
        if index >= len {
            return Err(MatsciError::IndexOutOfRange { index, len });
        }
        let raw = self.store.read_record(index)?;
        self.transforms
            .iter()
            .try_fold(raw, |sample, transform| transform.apply(sample))
    }

    /// 随机抽取 `n` 个样本（线程本地随机源）
    pub fn sample(&self, n: usize) -> Result<Vec<Sample>> {
        self.sample_with_rng(n, &mut rand::thread_rng())
    }

    /// 用给定随机源抽取 `n` 个样本
    pub fn sample_with_rng<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<Vec<Sample>> {
        self.sample_indices(n, rng)?
            .into_iter()
            .map(|i| self.get(i))
            .collect()
    }

    /// 采样下标：`n <= len` 时不放回，`n > len` 时有放回
    pub fn sample_indices<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<Vec<usize>> {
        let len = self.len();
        if n == 0 {
            return Ok(Vec::new());
        }
        if len == 0 {
            return Err(MatsciError::IndexOutOfRange { index: 0, len: 0 });
        }
        if n <= len {
            Ok(index::sample(rng, len, n).into_vec())
        } else {
            Ok((0..n).map(|_| rng.gen_range(0..len)).collect())
        }
    }

    /// 按下标顺序遍历全部样本
    pub fn iter(&self) -> impl Iterator<Item = Result<Sample>> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }

    /// 取出指定下标的样本并组批
    pub fn collate(&self, indices: &[usize], options: &CollateOptions) -> Result<Batch> {
        let samples = indices
            .iter()
            .map(|&i| self.get(i))
            .collect::<Result<Vec<_>>>()?;
        Collator::from_options(options).concatenate(&samples)
    }
}
