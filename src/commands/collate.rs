//! # collate 命令实现
//!
//! 按批加载结构目录数据集并报告合并结果。
//!
//! ## 功能
//! - 可选点云 → 图变换（截断半径 / k 近邻 / 全连接）
//! - 点云模式下对变长字段填充并生成掩码
//! - 并行取样、进度条显示
//! - 失败批次汇总报告
//!
//! ## 依赖关系
//! - 使用 `cli/collate.rs` 定义的参数
//! - 使用 `matsciml::datasets::BatchLoader`
//! - 使用 `utils/output.rs`, `utils/progress.rs`

use crate::cli::collate::{CollateArgs, GraphMode};
use crate::utils::{output, progress};

use matsciml::collate::{Batch, CollateOptions, MASK_KEY};
use matsciml::datasets::{BatchLoader, Dataset, LoaderOptions, StructureDirStore};
use matsciml::error::Result;
use matsciml::transforms::{NeighborRule, PointCloudToGraph};

use tabled::{Table, Tabled};

/// 字段摘要行
#[derive(Debug, Clone, Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Batched value")]
    summary: String,
}

/// 单个 epoch 的统计
#[derive(Debug, Default)]
struct LoadSummary {
    batches: usize,
    samples: usize,
    atoms: usize,
    edges: usize,
    failures: Vec<(usize, String)>,
}

/// 执行 collate 命令
pub fn execute(args: CollateArgs) -> Result<()> {
    output::print_header("Collating Dataset");

    let store = StructureDirStore::open_with(&args.input, &args.pattern, args.recursive)?;
    let mut dataset = Dataset::new(store);

    let rule = neighbor_rule(&args);
    if let Some(rule) = rule {
        dataset = dataset.with_transform(PointCloudToGraph::new(rule)?);
    }

    output::print_info(&format!(
        "Found {} structure files in '{}' ({})",
        dataset.len(),
        args.input.display(),
        args.graph
    ));

    if dataset.is_empty() {
        output::print_warning("No structure files matched the pattern.");
        return Ok(());
    }

    // 图模式下坐标已移入图节点，无需填充
    let pad_keys: Vec<String> = match rule {
        Some(_) => Vec::new(),
        None => args.pad_keys.clone(),
    };
    if rule.is_none() {
        output::print_info(&format!("Padding fields: {}", pad_keys.join(", ")));
    }

    let options = LoaderOptions {
        batch_size: args.batch_size,
        shuffle: args.shuffle,
        seed: args.seed,
        drop_last: args.drop_last,
        jobs: args.jobs,
        collate: CollateOptions::with_pad_keys(pad_keys),
    };
    let loader = BatchLoader::new(&dataset, options)?;

    output::print_info(&format!(
        "Loading {} batches of up to {} samples with {} threads",
        loader.num_batches(),
        args.batch_size,
        loader.jobs()
    ));

    let batches = loader.batch_indices();
    let pb = progress::create_progress_bar(batches.len() as u64, "Collating");
    let mut summary = LoadSummary::default();

    for (i, indices) in batches.iter().enumerate() {
        match loader.load_batch(indices) {
            Ok(batch) => {
                if i == 0 || args.verbose {
                    pb.suspend(|| print_batch(i, &batch));
                }
                summary.record(&batch);
            }
            Err(e) => {
                pb.suspend(|| {
                    output::print_warning(&format!("Batch {} failed: {}", i, e));
                });
                summary.failures.push((i, e.to_string()));
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    print_summary(&summary);

    Ok(())
}

/// 由参数构造近邻规则；点云模式返回 `None`
fn neighbor_rule(args: &CollateArgs) -> Option<NeighborRule> {
    match args.graph {
        GraphMode::None => None,
        GraphMode::Cutoff => Some(NeighborRule::Cutoff {
            radius: args.radius,
            max_neighbors: args.max_neighbors,
        }),
        GraphMode::Knn => Some(NeighborRule::k_nearest(args.k)),
        GraphMode::Complete => Some(NeighborRule::Complete),
    }
}

impl LoadSummary {
    fn record(&mut self, batch: &Batch) {
        self.batches += 1;
        self.samples += batch.batch_size();

        if let Some(graph) = batch.graph("graph") {
            self.atoms += graph.num_nodes();
            self.edges += graph.num_edges();
        } else if let Some(mask) = batch.mask(MASK_KEY) {
            self.atoms += mask.iter().filter(|&&m| m).count();
        } else if let Some(numbers) = batch.tensor("atomic_numbers") {
            self.atoms += numbers.shape().iter().product::<usize>();
        }
    }
}

fn print_batch(index: usize, batch: &Batch) {
    output::print_info(&format!("Batch {} ({} samples)", index, batch.batch_size()));
    let rows: Vec<FieldRow> = batch
        .describe()
        .into_iter()
        .map(|(field, summary)| FieldRow { field, summary })
        .collect();
    println!("{}", Table::new(&rows));
}

fn print_summary(summary: &LoadSummary) {
    output::print_separator();
    output::print_info(&format!("Batches: {}", summary.batches));
    output::print_info(&format!("Samples: {}", summary.samples));
    output::print_info(&format!("Atoms:   {}", summary.atoms));
    if summary.edges > 0 {
        output::print_info(&format!("Edges:   {}", summary.edges));
    }

    if summary.failures.is_empty() {
        output::print_done(&format!("Collated {} batches", summary.batches));
    } else {
        output::print_warning(&format!("{} batches failed:", summary.failures.len()));
        for (index, err) in &summary.failures {
            output::print_error(&format!("  batch {}: {}", index, err));
        }
    }
}
