//! # inspect 命令实现
//!
//! 从结构目录数据集中抽样并以表格展示。
//!
//! ## 功能
//! - 按模式扫描结构文件
//! - 种子化抽样（样本数超过数据集时有放回）
//! - 生成终端表格和可选 CSV 输出
//!
//! ## 依赖关系
//! - 使用 `cli/inspect.rs` 定义的参数
//! - 使用 `matsciml::datasets`
//! - 使用 `utils/output.rs`

use crate::cli::inspect::InspectArgs;
use crate::utils::output;

use matsciml::datasets::{Dataset, StructureDirStore};
use matsciml::error::{MatsciError, Result};
use matsciml::models::element;
use matsciml::Sample;

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;
use tabled::{Table, Tabled};

/// 样本表格行
#[derive(Debug, Clone, Tabled)]
struct SampleRow {
    #[tabled(rename = "Index")]
    index: usize,
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Atoms")]
    atoms: usize,
    #[tabled(rename = "Formula")]
    formula: String,
    #[tabled(rename = "Energy (eV)")]
    energy: String,
    #[tabled(rename = "Symmetry")]
    symmetry: String,
    #[tabled(rename = "a (Å)")]
    a: String,
    #[tabled(rename = "b (Å)")]
    b: String,
    #[tabled(rename = "c (Å)")]
    c: String,
}

/// 执行 inspect 命令
pub fn execute(args: InspectArgs) -> Result<()> {
    output::print_header("Inspecting Dataset");

    let store = StructureDirStore::open_with(&args.input, &args.pattern, args.recursive)?;
    let dataset = Dataset::new(store);

    output::print_info(&format!(
        "Found {} structure files in '{}'",
        dataset.len(),
        args.input.display()
    ));

    if dataset.is_empty() {
        output::print_warning("No structure files matched the pattern.");
        return Ok(());
    }

    if args.num_samples > dataset.len() {
        output::print_warning(&format!(
            "Requested {} samples from {} records; sampling with replacement",
            args.num_samples,
            dataset.len()
        ));
    }

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let indices = dataset.sample_indices(args.num_samples, &mut rng)?;

    let mut rows = Vec::with_capacity(indices.len());
    for index in indices {
        let sample = dataset.get(index)?;
        let file = dataset
            .store()
            .path(index)
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        rows.push(summarize(index, file, &sample));
    }

    output::print_header(&format!("{} Sampled Structures", rows.len()));
    println!("{}", Table::new(&rows));

    if let Some(ref csv_path) = args.csv {
        save_rows_csv(&rows, csv_path)?;
        output::print_success(&format!("Table saved to '{}'", csv_path.display()));
    }

    Ok(())
}

fn summarize(index: usize, file: String, sample: &Sample) -> SampleRow {
    let numbers: Vec<i64> = sample
        .int("atomic_numbers")
        .map(|z| z.iter().copied().collect())
        .unwrap_or_default();
    let energy = sample
        .float("energy")
        .and_then(|e| e.iter().next().copied())
        .map(|e| format!("{:.6}", e))
        .unwrap_or_else(|| "-".to_string());
    let lattice: Vec<String> = sample
        .float("lattice_params")
        .map(|p| p.iter().take(3).map(|v| format!("{:.4}", v)).collect())
        .unwrap_or_else(|| vec!["-".to_string(); 3]);

    SampleRow {
        index,
        file,
        atoms: numbers.len(),
        formula: formula_from_numbers(&numbers),
        energy,
        symmetry: sample.text("symmetry").unwrap_or("-").to_string(),
        a: lattice[0].clone(),
        b: lattice[1].clone(),
        c: lattice[2].clone(),
    }
}

/// 按首次出现顺序拼接化学式
fn formula_from_numbers(numbers: &[i64]) -> String {
    let mut counts: Vec<(i64, usize)> = Vec::new();
    for &z in numbers {
        match counts.iter_mut().find(|(n, _)| *n == z) {
            Some((_, c)) => *c += 1,
            None => counts.push((z, 1)),
        }
    }

    counts
        .into_iter()
        .map(|(z, count)| {
            let sym = u8::try_from(z)
                .ok()
                .and_then(element::symbol)
                .unwrap_or("X");
            if count > 1 {
                format!("{}{}", sym, count)
            } else {
                sym.to_string()
            }
        })
        .collect()
}

/// 保存表格到 CSV
fn save_rows_csv(rows: &[SampleRow], output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    wtr.write_record(["index", "file", "atoms", "formula", "energy_eV", "symmetry", "a", "b", "c"])?;
    for r in rows {
        wtr.write_record([
            r.index.to_string(),
            r.file.clone(),
            r.atoms.to_string(),
            r.formula.clone(),
            r.energy.clone(),
            r.symmetry.clone(),
            r.a.clone(),
            r.b.clone(),
            r.c.clone(),
        ])?;
    }

    wtr.flush().map_err(|e| MatsciError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}
