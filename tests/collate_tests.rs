//! 端到端测试：数据集 → 变换 → collate

use matsciml::collate::{concatenate, CollateOptions, MASK_KEY};
use matsciml::datasets::{BatchLoader, Dataset, LoaderOptions, MemoryStore, StructureDirStore};
use matsciml::error::ErrorKind;
use matsciml::models::{Sample, Tensor};
use matsciml::transforms::{GraphToPointCloud, NeighborRule, PointCloudToGraph, Transform};

use ndarray::{arr1, Array1, Array2};
use std::fs;

const LENGTHS: [usize; 4] = [3, 5, 2, 4];

/// 沿 x 轴等距排列的 n 原子结构
fn chain(n: usize, energy: f64) -> Sample {
    let pos = Array2::from_shape_fn((n, 3), |(i, j)| if j == 0 { i as f64 * 1.1 } else { 0.0 });
    let numbers = Array1::from_shape_fn(n, |i| [6i64, 1, 8][i % 3]);
    Sample::new()
        .with("pos", pos.into_dyn())
        .with("atomic_numbers", numbers.into_dyn())
        .with("targets", arr1(&[energy]).into_dyn())
        .with("target_types", "regression:energy")
}

fn chain_dataset() -> Dataset<MemoryStore> {
    let samples = LENGTHS
        .iter()
        .enumerate()
        .map(|(i, &n)| chain(n, -(i as f64)))
        .collect();
    Dataset::new(MemoryStore::new(samples))
}

#[test]
fn point_cloud_batch_is_padded_and_masked() {
    let ds = chain_dataset().with_transform(
        // 往返一次得到 one-hot pc_features
        RoundTrip::new(),
    );
    let options = CollateOptions::with_pad_keys(["pos", "pc_features", "atomic_numbers"]);
    let batch = ds.collate(&[0, 1, 2, 3], &options).unwrap();

    assert_eq!(batch.batch_size(), 4);
    assert_eq!(batch.tensor("pos").unwrap().shape(), &[4, 5, 3]);
    assert_eq!(batch.tensor("pc_features").unwrap().shape(), &[4, 5, 100]);
    assert_eq!(batch.tensor("atomic_numbers").unwrap().shape(), &[4, 5]);
    assert_eq!(batch.tensor("targets").unwrap().shape(), &[4, 1]);
    assert_eq!(batch.text("target_types").unwrap().len(), 4);

    let mask = batch.mask(MASK_KEY).unwrap();
    assert_eq!(mask.shape(), &[4, 5]);
    let row: Vec<bool> = mask.index_axis(ndarray::Axis(0), 2).iter().copied().collect();
    assert_eq!(row, vec![true, true, false, false, false]);

    // 填充位置为零
    let pos = batch.float("pos").unwrap();
    assert_eq!(pos[[2, 3, 0]], 0.0);
    assert_eq!(pos[[1, 4, 0]], 4.0 * 1.1);
}

#[test]
fn mask_last_column_marks_longest_samples() {
    let samples: Vec<Sample> = LENGTHS.iter().map(|&n| chain(n, 0.0)).collect();
    let batch = concatenate(&samples, ["pos", "atomic_numbers"]).unwrap();
    let mask = batch.mask(MASK_KEY).unwrap();
    let max_len = *LENGTHS.iter().max().unwrap();
    for (i, &len) in LENGTHS.iter().enumerate() {
        assert_eq!(mask[[i, max_len - 1]], len == max_len);
        assert_eq!(
            mask.index_axis(ndarray::Axis(0), i).iter().filter(|&&m| m).count(),
            len
        );
    }
}

#[test]
fn graph_batch_keeps_targets() {
    let ds = chain_dataset()
        .with_transform(PointCloudToGraph::new(NeighborRule::cutoff(1.5)).unwrap());
    let batch = ds.collate(&[0, 1, 2, 3], &CollateOptions::default()).unwrap();

    let graph = batch.graph("graph").unwrap();
    assert_eq!(graph.batch_size(), 4);
    assert_eq!(graph.num_nodes(), LENGTHS.iter().sum::<usize>());
    assert_eq!(graph.batch_num_nodes(), &LENGTHS[..]);
    // 链上相邻原子双向成边
    let expected_edges: Vec<usize> = LENGTHS.iter().map(|&n| 2 * (n - 1)).collect();
    assert_eq!(graph.batch_num_edges(), &expected_edges[..]);

    assert!(batch.contains_key("targets"));
    assert!(batch.contains_key("target_types"));
    assert!(!batch.contains_key(MASK_KEY));
}

#[test]
fn graph_dataset_to_padded_point_cloud() {
    let to_graph = PointCloudToGraph::new(NeighborRule::Complete).unwrap();
    let graphs: Vec<Sample> = LENGTHS
        .iter()
        .map(|&n| to_graph.apply(chain(n, 1.0)).unwrap())
        .collect();
    let ds = Dataset::new(MemoryStore::new(graphs)).with_transform(GraphToPointCloud::default());

    let options = CollateOptions::with_pad_keys(["pos", "pc_features"]);
    let batch = ds.collate(&[0, 1, 2, 3], &options).unwrap();
    for key in ["pos", "pc_features", "mask", "targets", "target_types"] {
        assert!(batch.contains_key(key), "missing {}", key);
    }
    assert_eq!(batch.tensor("pos").unwrap().shape(), &[4, 5, 3]);
    assert_eq!(batch.tensor("pc_features").unwrap().shape(), &[4, 5, 100]);
    // 两个填充键长度一致，共享同一个掩码
    assert!(!batch.contains_key("pos_mask"));
    assert!(!batch.contains_key("atomic_numbers"));
    assert!(!batch.contains_key("graph"));
}

#[test]
fn kept_atomic_numbers_must_be_padded() {
    let to_graph = PointCloudToGraph::new(NeighborRule::Complete).unwrap();
    let to_pc = GraphToPointCloud::default().keep_atomic_numbers(true);
    let samples: Vec<Sample> = LENGTHS
        .iter()
        .map(|&n| to_pc.apply(to_graph.apply(chain(n, 1.0)).unwrap()).unwrap())
        .collect();

    let err = concatenate(&samples, ["pos", "pc_features"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Value);

    let batch = concatenate(&samples, ["pos", "pc_features", "atomic_numbers"]).unwrap();
    assert_eq!(batch.tensor("atomic_numbers").unwrap().shape(), &[4, 5]);
}

#[test]
fn field_set_mismatch_is_key_error() {
    let samples = vec![
        chain(2, 0.0),
        chain(2, 0.0).with("energy", Tensor::scalar(1.0)),
    ];
    let err = concatenate(&samples, ["pos"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Key);
}

#[test]
fn empty_input_is_value_error() {
    let err = concatenate(&[], ["pos"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Value);
}

#[test]
fn round_trip_preserves_per_atom_coordinates() {
    let to_graph = PointCloudToGraph::new(NeighborRule::k_nearest(2)).unwrap();
    let to_pc = GraphToPointCloud::default().keep_atomic_numbers(true);
    for &n in &LENGTHS {
        let original = chain(n, 0.0);
        let restored = to_pc.apply(to_graph.apply(original.clone()).unwrap()).unwrap();
        assert_eq!(restored.float("pos"), original.float("pos"));
        assert_eq!(restored.int("atomic_numbers"), original.int("atomic_numbers"));
        assert_eq!(restored.num_atoms(), Some(n));
    }
}

const RES_TEMPLATE: &str = "\
TITL {name} 0.00 {vol} {energy} 0 0 {n} (P1) n - 1
CELL 1.54180 6.0 6.0 6.0 90.0 90.0 90.0
LATT -1
SFAC C O
{atoms}END
";

fn write_res(dir: &std::path::Path, name: &str, n: usize, energy: f64) {
    let atoms: String = (0..n)
        .map(|i| {
            let (el, t) = if i % 2 == 0 { ("C", 1) } else { ("O", 2) };
            format!("{} {} {:.3} 0.0 0.0 1.0\n", el, t, i as f64 * 0.2)
        })
        .collect();
    let content = RES_TEMPLATE
        .replace("{name}", name)
        .replace("{vol}", "216.0")
        .replace("{energy}", &energy.to_string())
        .replace("{n}", &n.to_string())
        .replace("{atoms}", &atoms);
    fs::write(dir.join(format!("{}.res", name)), content).unwrap();
}

#[test]
fn structure_directory_loads_in_parallel_batches() {
    let dir = tempfile::tempdir().unwrap();
    for (i, &n) in LENGTHS.iter().enumerate() {
        write_res(dir.path(), &format!("s{}", i), n, -10.0 * (i as f64 + 1.0));
    }

    let ds = Dataset::new(StructureDirStore::open(dir.path()).unwrap());
    assert_eq!(ds.len(), 4);

    let options = LoaderOptions {
        batch_size: 3,
        jobs: 2,
        collate: CollateOptions::with_pad_keys(["pos", "atomic_numbers"]),
        ..LoaderOptions::default()
    };
    let loader = BatchLoader::new(&ds, options).unwrap();
    let batches: Vec<_> = loader.iter().collect::<Result<_, _>>().unwrap();
    assert_eq!(batches.len(), 2);

    let first = &batches[0];
    assert_eq!(first.batch_size(), 3);
    assert_eq!(first.tensor("pos").unwrap().shape(), &[3, 5, 3]);
    assert_eq!(first.tensor("lattice_params").unwrap().shape(), &[3, 6]);
    let energy = first.float("energy").unwrap();
    assert_eq!(energy.shape(), &[3]);
    assert!((energy[[1]] + 20.0).abs() < 1e-12);
    assert_eq!(first.text("symmetry").unwrap(), &["P1", "P1", "P1"]);

    assert_eq!(batches[1].batch_size(), 1);
    assert_eq!(batches[1].tensor("pos").unwrap().shape(), &[1, 4, 3]);
}

#[test]
fn sampling_respects_dataset_bounds() {
    let ds = chain_dataset();
    assert_eq!(ds.get(4).unwrap_err().kind(), ErrorKind::Index);
    assert_eq!(ds.sample(4).unwrap().len(), 4);
    assert_eq!(ds.sample(9).unwrap().len(), 9);
}

/// 点云 → 图 → 点云，补出 one-hot 特征
struct RoundTrip {
    to_graph: PointCloudToGraph,
    to_pc: GraphToPointCloud,
}

impl RoundTrip {
    fn new() -> Self {
        Self {
            to_graph: PointCloudToGraph::new(NeighborRule::Complete).unwrap(),
            to_pc: GraphToPointCloud::default().keep_atomic_numbers(true),
        }
    }
}

impl Transform for RoundTrip {
    fn apply(&self, sample: Sample) -> matsciml::Result<Sample> {
        self.to_pc.apply(self.to_graph.apply(sample)?)
    }
}
