//! # 批量加载器
//!
//! 把数据集切分为批次并行读取。
//!
//! ## 功能
//! - 基于 rayon 线程池并行取样（`jobs == 0` 时使用全部 CPU）
//! - 可选的种子化打乱与 `drop_last`
//! - 每批样本按下标顺序交给 collate，结果与串行一致
//!
//! ## 依赖关系
//! - 被 `commands/collate.rs` 调用
//! - 使用 `datasets/dataset.rs` 取样
//! - 使用 `rayon` 进行并行计算

use crate::collate::{Batch, CollateOptions, Collator};
use crate::datasets::dataset::Dataset;
use crate::datasets::store::RecordStore;
use crate::error::{MatsciError, Result};
use crate::models::Sample;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// 加载器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderOptions {
    /// 每批样本数
    pub batch_size: usize,
    /// 是否打乱
    pub shuffle: bool,
    /// 打乱种子；`None` 时使用系统熵
    pub seed: Option<u64>,
    /// 丢弃最后不满的一批
    pub drop_last: bool,
    /// 并行作业数，0 表示自动
    pub jobs: usize,
    /// collate 配置
    pub collate: CollateOptions,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            batch_size: 8,
            shuffle: false,
            seed: None,
            drop_last: false,
            jobs: 0,
            collate: CollateOptions::default(),
        }
    }
}

/// 批量加载器
pub struct BatchLoader<'a, S: RecordStore> {
    dataset: &'a Dataset<S>,
    options: LoaderOptions,
    collator: Collator,
    pool: rayon::ThreadPool,
}

impl<'a, S: RecordStore> BatchLoader<'a, S> {
    /// 创建加载器并配置线程池
    pub fn new(dataset: &'a Dataset<S>, options: LoaderOptions) -> Result<Self> {
        if options.batch_size == 0 {
            return Err(MatsciError::InvalidConfig(
                "batch_size must be at least 1".to_string(),
            ));
        }

        let jobs = if options.jobs == 0 {
            num_cpus::get()
        } else {
            options.jobs
        };
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .map_err(|e| MatsciError::InvalidConfig(format!("thread pool: {}", e)))?;

        Ok(Self {
            dataset,
            collator: Collator::from_options(&options.collate),
            options,
            pool,
        })
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// 线程池中的线程数
    pub fn jobs(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// 批次数
    pub fn num_batches(&self) -> usize {
        let len = self.dataset.len();
        let size = self.options.batch_size;
        if self.options.drop_last {
            len / size
        } else {
            len.div_ceil(size)
        }
    }

    /// 一个 epoch 的下标划分
    pub fn batch_indices(&self) -> Vec<Vec<usize>> {
        let mut order: Vec<usize> = (0..self.dataset.len()).collect();
        if self.options.shuffle {
            let mut rng = match self.options.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            order.shuffle(&mut rng);
        }

        order
            .chunks(self.options.batch_size)
            .filter(|chunk| !self.options.drop_last || chunk.len() == self.options.batch_size)
            .map(<[usize]>::to_vec)
            .collect()
    }

    /// 并行读取一批样本并合并
    pub fn load_batch(&self, indices: &[usize]) -> Result<Batch> {
        let samples: Vec<Sample> = self.pool.install(|| {
            indices
                .par_iter()
                .map(|&i| self.dataset.get(i))
                .collect::<Result<Vec<_>>>()
        })?;
        self.collator.concatenate(&samples)
    }

    /// 按顺序产出一个 epoch 的全部批次
    pub fn iter(&self) -> impl Iterator<Item = Result<Batch>> + '_ {
        self.batch_indices()
            .into_iter()
            .map(move |indices| self.load_batch(&indices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::store::MemoryStore;
    use crate::error::ErrorKind;
    use ndarray::Array2;

    fn chains(lengths: &[usize]) -> Dataset<MemoryStore> {
        let samples = lengths
            .iter()
            .enumerate()
            .map(|(i, &n)| {
                Sample::new()
                    .with("pos", Array2::<f64>::from_elem((n, 3), i as f64).into_dyn())
                    .with("id", ndarray::arr1(&[i as i64]).into_dyn())
            })
            .collect();
        Dataset::new(MemoryStore::new(samples))
    }

    fn options(batch_size: usize) -> LoaderOptions {
        LoaderOptions {
            batch_size,
            jobs: 2,
            collate: CollateOptions::with_pad_keys(["pos"]),
            ..LoaderOptions::default()
        }
    }

    #[test]
    fn test_batch_partition() {
        let ds = chains(&[1, 2, 3, 4, 5]);
        let loader = BatchLoader::new(&ds, options(2)).unwrap();
        assert_eq!(loader.num_batches(), 3);
        assert_eq!(loader.batch_indices(), vec![vec![0, 1], vec![2, 3], vec![4]]);

        let dropping = BatchLoader::new(
            &ds,
            LoaderOptions {
                drop_last: true,
                ..options(2)
            },
        )
        .unwrap();
        assert_eq!(dropping.num_batches(), 2);
        assert_eq!(dropping.batch_indices().len(), 2);
    }

    #[test]
    fn test_parallel_load_preserves_order() {
        let ds = chains(&[3, 5, 2, 4]);
        let loader = BatchLoader::new(&ds, options(4)).unwrap();
        let batches: Vec<Batch> = loader.iter().collect::<Result<_>>().unwrap();
        assert_eq!(batches.len(), 1);

        let batch = &batches[0];
        assert_eq!(batch.tensor("pos").unwrap().shape(), &[4, 5, 3]);
        let ids = batch.int("id").unwrap();
        assert_eq!(ids.iter().copied().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        let mask = batch.mask("mask").unwrap();
        assert_eq!(mask.shape(), &[4, 5]);
        assert_eq!(mask.iter().filter(|&&m| m).count(), 14);
    }

    #[test]
    fn test_seeded_shuffle_is_reproducible() {
        let ds = chains(&[1; 12]);
        let shuffled = LoaderOptions {
            shuffle: true,
            seed: Some(3),
            ..options(4)
        };
        let a = BatchLoader::new(&ds, shuffled.clone()).unwrap().batch_indices();
        let b = BatchLoader::new(&ds, shuffled).unwrap().batch_indices();
        assert_eq!(a, b);

        let mut flat: Vec<usize> = a.into_iter().flatten().collect();
        flat.sort_unstable();
        assert_eq!(flat, (0..12).collect::<Vec<_>>());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let ds = chains(&[1]);
        let err = BatchLoader::new(&ds, options(0)).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
