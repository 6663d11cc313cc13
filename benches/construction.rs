use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use krkc_tree::{matrix::Matrix, ListMode, RelationList, ValueTree, ValuedPosition};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn sparse_matrix(side: usize, density: f64) -> Matrix<u32> {
  let mut rng = StdRng::seed_from_u64(0xbe9c);
  let mut mat = Matrix::filled(side, side, 0u32);
  for i in 0..side {
    for j in 0..side {
      if rng.gen_bool(density) {
        mat.set(i, j, rng.gen_range(1..100));
      }
    }
  }
  mat.set(side - 1, side - 1, 1);
  mat
}

fn to_lists(mat: &Matrix<u32>) -> Vec<RelationList<u32>> {
  (0..mat.num_rows)
    .map(|i| {
      (0..mat.num_cols)
        .filter_map(|j| mat.get(i, j).filter(|&v| v != 0).map(|v| (j, v)))
        .collect()
    })
    .collect()
}

fn to_pairs(mat: &Matrix<u32>) -> Vec<ValuedPosition<u32>> {
  let mut pairs = Vec::new();
  for i in 0..mat.num_rows {
    for j in 0..mat.num_cols {
      if let Some(v) = mat.get(i, j).filter(|&v| v != 0) {
        pairs.push(ValuedPosition::new(i, j, v));
      }
    }
  }
  pairs
}

/// Compare the five construction modes on the same relation.
fn bench_construction_modes(c: &mut Criterion) {
  let mut group = c.benchmark_group("construction");
  for side in [64, 256].iter() {
    let mat = sparse_matrix(*side, 0.05);
    let lists = to_lists(&mat);
    let pairs = to_pairs(&mat);

    group.bench_with_input(BenchmarkId::new("matrix", side), side, |b, _| {
      b.iter(|| black_box(ValueTree::from_matrix(&mat, 2, 2, 0).unwrap()));
    });
    group.bench_with_input(BenchmarkId::new("lists_recursive", side), side, |b, _| {
      b.iter(|| black_box(ValueTree::from_lists(&lists, 2, 2, ListMode::Recursive, 0).unwrap()));
    });
    group.bench_with_input(BenchmarkId::new("lists_temp_tree", side), side, |b, _| {
      b.iter(|| black_box(ValueTree::from_lists(&lists, 2, 2, ListMode::TempTree, 0).unwrap()));
    });
    group.bench_with_input(BenchmarkId::new("lists_dynamic", side), side, |b, _| {
      b.iter(|| black_box(ValueTree::from_lists(&lists, 2, 2, ListMode::DynamicBitmaps, 0).unwrap()));
    });
    group.bench_with_input(BenchmarkId::new("pairs", side), side, |b, _| {
      b.iter(|| {
        let mut scratch = pairs.clone();
        black_box(ValueTree::from_pairs(&mut scratch, 2, 2, 0).unwrap())
      });
    });
  }
  group.finish();
}

/// Row scans against full-matrix probing.
fn bench_row_queries(c: &mut Criterion) {
  let mut group = c.benchmark_group("row_queries");
  let mat = sparse_matrix(256, 0.05);
  let tree = ValueTree::from_matrix(&mat, 2, 2, 0).unwrap();
  group.bench_function("successor_positions", |b| {
    b.iter(|| {
      for i in 0..tree.num_rows {
        black_box(tree.successor_positions(black_box(i)));
      }
    });
  });
  group.bench_function("first_successor", |b| {
    b.iter(|| {
      for i in 0..tree.num_rows {
        black_box(tree.first_successor(black_box(i)));
      }
    });
  });
  group.bench_function("point_probes", |b| {
    b.iter(|| {
      for i in (0..tree.num_rows).step_by(7) {
        for j in (0..tree.num_cols).step_by(7) {
          black_box(tree.is_not_null(black_box(i), black_box(j)));
        }
      }
    });
  });
  group.finish();
}

criterion_group!(benches, bench_construction_modes, bench_row_queries);
criterion_main!(benches);
