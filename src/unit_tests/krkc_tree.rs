

/* Public interface tests: the concrete scenarios plus randomized
cross-checks against a naive dense reference. */

use crate::{
  error::KrKcTreeError,
  matrix::{BitMatrix, Matrix},
  BitTree, LeafStore, ListMode, Relation, RelationList, ValueTree, ValuedPosition,
};
use bitvec::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

type Result<T> = std::result::Result<T, KrKcTreeError>;

/* Input-shape conversions used throughout. */
fn matrix_to_lists(mat: &Matrix<u32>) -> Vec<RelationList<u32>> {
  (0..mat.num_rows)
    .map(|i| {
      (0..mat.num_cols)
        .filter_map(|j| {
          let val = mat.get(i, j).unwrap();
          if val != 0 { Some((j, val)) } else { None }
        })
        .collect()
    })
    .collect()
}
fn matrix_to_pairs(mat: &Matrix<u32>) -> Vec<ValuedPosition<u32>> {
  let mut pairs = Vec::new();
  for i in 0..mat.num_rows {
    for j in 0..mat.num_cols {
      let val = mat.get(i, j).unwrap();
      if val != 0 {
        pairs.push(ValuedPosition::new(i, j, val));
      }
    }
  }
  pairs
}
fn random_matrix(rng: &mut StdRng, rows: usize, cols: usize, density: f64) -> Matrix<u32> {
  let mut mat = Matrix::filled(rows, cols, 0u32);
  for i in 0..rows {
    for j in 0..cols {
      if rng.gen_bool(density) {
        mat.set(i, j, rng.gen_range(1..100));
      }
    }
  }
  /* Pin the extent so that every input shape infers the same height. */
  mat.set(rows - 1, cols - 1, 1);
  mat
}
fn leaf_bits(tree: &BitTree) -> Vec<bool> {
  (0..tree.leaves.len()).map(|pos| tree.leaves.value(pos)).collect()
}

/* Scenario A: tiny dense square relation, kr = kc = 2. */
mod scenario_a {
  use super::*;
  fn tree() -> BitTree {
    let mut mat = BitMatrix::with_dimensions(4, 4);
    mat.set(0, 0, true);
    mat.set(1, 3, true);
    mat.set(3, 2, true);
    BitTree::from_bit_matrix(&mat, 2, 2).unwrap()
  }
  #[test]
  fn encoding() {
    let tree = tree();
    assert_eq!(2, tree.height);
    assert_eq!(4, tree.num_rows);
    assert_eq!(4, tree.num_cols);
    assert_eq!(bitvec![1, 1, 0, 1], tree.stems);
    let expected = [
      true, false, false, false,  // rows 0-1 x cols 0-1
      false, false, false, true,  // rows 0-1 x cols 2-3
      false, false, true, false,  // rows 2-3 x cols 2-3
    ];
    assert_eq!(expected.to_vec(), leaf_bits(&tree));
  }
  #[test]
  fn navigation() {
    let tree = tree();
    assert_eq!(vec![3], tree.successor_positions(1));
    assert_eq!(vec![3], tree.predecessor_positions(2));
    assert_eq!(0, tree.first_successor(0));
    assert_eq!(tree.num_cols, tree.first_successor(2));
    assert_eq!(3, tree.count_elements());
  }
  #[test]
  fn relation_aliases_agree() {
    let tree = tree();
    assert!(tree.are_related(0, 0));
    assert_eq!(tree.successor_positions(1), tree.successors(1));
    assert_eq!(tree.predecessor_positions(2), tree.predecessors(2));
    assert_eq!(tree.positions_in_range(0, 3, 0, 3), tree.range(0, 3, 0, 3));
    assert_eq!(tree.count_elements(), tree.count_links());
    assert!(tree.contains_link(1, 1, 3, 3));
  }
}

/* Scenario B: rectangular arity, single-level tree. */
mod scenario_b {
  use super::*;
  #[test]
  fn stems_stay_empty() {
    let mut mat = BitMatrix::with_dimensions(2, 4);
    mat.set(0, 2, true);
    let tree = BitTree::from_bit_matrix(&mat, 2, 4).unwrap();
    assert_eq!(1, tree.height);
    assert_eq!(2, tree.num_rows);
    assert_eq!(4, tree.num_cols);
    assert!(tree.stems.is_empty());
    let expected = [false, false, true, false, false, false, false, false];
    assert_eq!(expected.to_vec(), leaf_bits(&tree));
    assert_eq!(vec![2], tree.successor_positions(0));
    assert_eq!(2, tree.first_successor(0));
    assert_eq!(vec![0], tree.predecessor_positions(2));
    assert!(tree.is_not_null(0, 2));
    assert!(!tree.is_not_null(1, 2));
  }
}

/* Scenario C: duplicate pairs, last write wins. */
mod scenario_c {
  use super::*;
  #[test]
  fn last_duplicate_wins() -> Result<()> {
    let mut pairs = vec![
      ValuedPosition::new(0, 0, 5u32),
      ValuedPosition::new(0, 0, 7),
      ValuedPosition::new(3, 3, 9),
    ];
    let tree = ValueTree::from_pairs(&mut pairs, 2, 2, 0)?;
    assert_eq!(7, tree.element(0, 0));
    assert_eq!(9, tree.element(3, 3));
    assert_eq!(2, tree.count_elements());
    Ok(())
  }
}

/* Scenario D: windowed construction from a 6x6 relation. */
mod scenario_d {
  use super::*;
  fn lists() -> Vec<RelationList<u32>> {
    vec![
      vec![],
      vec![(1, 9)],          // outside the window
      vec![(2, 5)],          // window (0, 0)
      vec![(0, 8), (5, 6)],  // (3, 0) outside; (3, 5) -> window (1, 3)
      vec![],
      vec![(4, 7)],          // window (3, 2)
    ]
  }
  #[test]
  fn window_remaps_coordinates() -> Result<()> {
    for mode in [ListMode::Recursive, ListMode::TempTree, ListMode::DynamicBitmaps] {
      let tree = ValueTree::from_lists_window(&lists(), 2, 2, 4, 4, 2, 2, mode, 0)?;
      assert_eq!(4, tree.num_rows);
      assert_eq!(4, tree.num_cols);
      assert_eq!(5, tree.element(0, 0), "mode {:?}", mode);
      assert_eq!(6, tree.element(1, 3), "mode {:?}", mode);
      assert_eq!(7, tree.element(3, 2), "mode {:?}", mode);
      assert!(!tree.is_not_null(1, 1));
      assert_eq!(3, tree.count_elements(), "mode {:?}", mode);
    }
    Ok(())
  }
  #[test]
  fn window_modes_match_matrix_window() -> Result<()> {
    let mut mat = Matrix::filled(6, 6, 0u32);
    mat.set(1, 1, 9);
    mat.set(2, 2, 5);
    mat.set(3, 0, 8);
    mat.set(3, 5, 6);
    mat.set(5, 4, 7);
    let from_mat = ValueTree::from_matrix_window(&mat, 2, 2, 4, 4, 2, 2, 0)?;
    for mode in [ListMode::Recursive, ListMode::TempTree, ListMode::DynamicBitmaps] {
      let tree = ValueTree::from_lists_window(&lists(), 2, 2, 4, 4, 2, 2, mode, 0)?;
      assert_eq!(from_mat, tree, "mode {:?}", mode);
    }
    Ok(())
  }
  #[test]
  fn window_pairs_slice() -> Result<()> {
    let mut pairs = vec![
      ValuedPosition::new(1, 1, 9u32), // outside the processed slice
      ValuedPosition::new(2, 2, 5),
      ValuedPosition::new(3, 5, 6),
      ValuedPosition::new(5, 4, 7),
      ValuedPosition::new(0, 0, 1), // outside the processed slice
    ];
    let tree = ValueTree::from_pairs_window(&mut pairs, 2, 2, 4, 4, 1, 4, 2, 2, 0)?;
    let mut mat = Matrix::filled(6, 6, 0u32);
    mat.set(2, 2, 5);
    mat.set(3, 5, 6);
    mat.set(5, 4, 7);
    let from_mat = ValueTree::from_matrix_window(&mat, 2, 2, 4, 4, 2, 2, 0)?;
    assert_eq!(from_mat, tree);
    Ok(())
  }
}

/* Scenario E: the contains-range shortcut goes stale after set_null. */
mod scenario_e {
  use super::*;
  #[test]
  fn whole_range_shortcut_survives_clearing() -> Result<()> {
    let mut pairs = vec![(0, 1), (2, 3), (3, 0)];
    pairs.sort_unstable();
    let mut tree = BitTree::from_positions(&pairs, 2, 2)?;
    let (rows, cols) = (tree.num_rows, tree.num_cols);
    assert!(tree.contains_element(0, rows - 1, 0, cols - 1));
    for &(i, j) in &pairs {
      tree.set_null(i, j);
    }
    assert_eq!(0, tree.count_elements());
    assert!(!tree.is_not_null(0, 1));
    /* The stem bits were not rewritten, so the whole-range shortcut
    still answers true. */
    assert!(tree.contains_element(0, rows - 1, 0, cols - 1));
    Ok(())
  }
}

/* Scenario F: empty relations. */
mod scenario_f {
  use super::*;
  #[test]
  fn from_all_null_matrix() -> Result<()> {
    let mat = Matrix::filled(5, 5, 0u32);
    let tree = ValueTree::from_matrix(&mat, 2, 2, 0)?;
    assert!(tree.stems.is_empty());
    assert!(tree.leaves.is_empty());
    assert!(tree.is_empty());
    assert_eq!(0, tree.element(3, 3));
    assert!(!tree.is_not_null(0, 0));
    assert!(tree.successor_positions(2).is_empty());
    assert!(tree.predecessor_positions(2).is_empty());
    assert_eq!(tree.num_cols, tree.first_successor(1));
    assert!(tree.all_positions().is_empty());
    assert!(!tree.contains_element(0, tree.num_rows - 1, 0, tree.num_cols - 1));
    assert_eq!(0, tree.count_elements());
    Ok(())
  }
  #[test]
  fn from_empty_pairs() -> Result<()> {
    let tree = BitTree::from_positions(&[], 2, 2)?;
    assert!(tree.stems.is_empty());
    assert!(tree.leaves.is_empty());
    assert_eq!(1, tree.height);
    assert_eq!(tree.num_cols, tree.first_successor(0));
    assert!(!tree.contains_element(0, 1, 0, 1));
    Ok(())
  }
  #[test]
  fn empty_list_modes_agree() -> Result<()> {
    let lists: Vec<RelationList<u32>> = vec![vec![], vec![]];
    for mode in [ListMode::Recursive, ListMode::TempTree, ListMode::DynamicBitmaps] {
      let tree = ValueTree::from_lists(&lists, 2, 2, mode, 0)?;
      assert!(tree.stems.is_empty(), "mode {:?}", mode);
      assert!(tree.leaves.is_empty(), "mode {:?}", mode);
    }
    Ok(())
  }
}

/* Every construction mode must produce the identical encoding. */
mod mode_equivalence {
  use super::*;
  fn all_modes(mat: &Matrix<u32>, kr: usize, kc: usize) -> Vec<(String, ValueTree<u32>)> {
    let lists = matrix_to_lists(mat);
    let mut pairs = matrix_to_pairs(mat);
    vec![
      ("matrix".into(), ValueTree::from_matrix(mat, kr, kc, 0).unwrap()),
      ("lists/recursive".into(), ValueTree::from_lists(&lists, kr, kc, ListMode::Recursive, 0).unwrap()),
      ("lists/tree".into(), ValueTree::from_lists(&lists, kr, kc, ListMode::TempTree, 0).unwrap()),
      ("lists/dynamic".into(), ValueTree::from_lists(&lists, kr, kc, ListMode::DynamicBitmaps, 0).unwrap()),
      ("pairs".into(), ValueTree::from_pairs(&mut pairs, kr, kc, 0).unwrap()),
    ]
  }
  #[test]
  fn across_arities_and_densities() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for &(kr, kc) in &[(2, 2), (2, 4), (3, 2), (4, 3)] {
      for &(rows, cols) in &[(5, 5), (13, 7), (9, 17)] {
        let mat = random_matrix(&mut rng, rows, cols, 0.15);
        let trees = all_modes(&mat, kr, kc);
        let (_, reference) = &trees[0];
        for (name, tree) in &trees[1..] {
          assert_eq!(reference, tree, "kr={} kc={} rows={} cols={} mode={}", kr, kc, rows, cols, name);
        }
      }
    }
  }
  #[test]
  fn shuffled_pairs_build_the_same_tree() {
    let mut rng = StdRng::seed_from_u64(42);
    let mat = random_matrix(&mut rng, 10, 10, 0.2);
    let reference = ValueTree::from_matrix(&mat, 2, 2, 0).unwrap();
    let mut pairs = matrix_to_pairs(&mat);
    for _ in 0..5 {
      /* Fisher-Yates, as the pair order must not matter. */
      for idx in (1..pairs.len()).rev() {
        pairs.swap(idx, rng.gen_range(0..=idx));
      }
      let tree = ValueTree::from_pairs(&mut pairs, 2, 2, 0).unwrap();
      assert_eq!(reference, tree);
    }
  }
}

/* Universal invariants, checked against the dense input. */
mod invariants {
  use super::*;
  #[test]
  fn queries_match_the_dense_reference() {
    let mut rng = StdRng::seed_from_u64(7);
    for &(kr, kc) in &[(2, 2), (2, 3), (3, 4)] {
      let mat = random_matrix(&mut rng, 14, 11, 0.12);
      let tree = ValueTree::from_matrix(&mat, kr, kc, 0).unwrap();
      for i in 0..tree.num_rows {
        for j in 0..tree.num_cols {
          let expected = mat.get(i, j).unwrap_or(0);
          assert_eq!(expected, tree.element(i, j), "({}, {})", i, j);
          assert_eq!(expected != 0, tree.is_not_null(i, j));
        }
      }
      for i in 0..tree.num_rows {
        let succs = tree.successor_positions(i);
        let expected: Vec<usize> =
          (0..tree.num_cols).filter(|&j| mat.get(i, j).unwrap_or(0) != 0).collect();
        assert_eq!(expected, succs, "row {}", i);
        assert!(succs.windows(2).all(|w| w[0] < w[1]));
        let first = succs.first().copied().unwrap_or(tree.num_cols);
        assert_eq!(first, tree.first_successor(i));
        let elems: Vec<u32> = succs.iter().map(|&j| tree.element(i, j)).collect();
        assert_eq!(elems, tree.successor_elements(i));
        let valued: Vec<ValuedPosition<u32>> =
          succs.iter().map(|&j| ValuedPosition::new(i, j, tree.element(i, j))).collect();
        assert_eq!(valued, tree.successor_valued_positions(i));
      }
      for j in 0..tree.num_cols {
        let preds = tree.predecessor_positions(j);
        let expected: Vec<usize> =
          (0..tree.num_rows).filter(|&i| mat.get(i, j).unwrap_or(0) != 0).collect();
        assert_eq!(expected, preds, "col {}", j);
        for &i in &preds {
          assert!(tree.successor_positions(i).contains(&j));
        }
      }
      assert_eq!(matrix_to_pairs(&mat).len(), tree.count_elements());
    }
  }
  #[test]
  fn range_queries_match_the_dense_reference() {
    let mut rng = StdRng::seed_from_u64(11);
    let mat = random_matrix(&mut rng, 16, 16, 0.1);
    let tree = ValueTree::from_matrix(&mat, 2, 2, 0).unwrap();
    for _ in 0..50 {
      let i1 = rng.gen_range(0..tree.num_rows);
      let i2 = rng.gen_range(i1..tree.num_rows);
      let j1 = rng.gen_range(0..tree.num_cols);
      let j2 = rng.gen_range(j1..tree.num_cols);
      let mut expected = Vec::new();
      for i in i1..=i2 {
        for j in j1..=j2 {
          if mat.get(i, j).unwrap_or(0) != 0 {
            expected.push((i, j));
          }
        }
      }
      let mut found = tree.positions_in_range(i1, i2, j1, j2);
      found.sort_unstable();
      assert_eq!(expected, found, "range ({}, {}, {}, {})", i1, i2, j1, j2);
      assert_eq!(!expected.is_empty(), tree.contains_element(i1, i2, j1, j2));
      let valued = tree.valued_positions_in_range(i1, i2, j1, j2);
      assert_eq!(found.len(), valued.len());
      for v in &valued {
        assert_eq!(mat.get(v.row, v.col).unwrap(), v.val);
      }
      assert_eq!(valued.len(), tree.elements_in_range(i1, i2, j1, j2).len());
    }
  }
  #[test]
  fn set_null_clears_single_cells() {
    let mut rng = StdRng::seed_from_u64(13);
    let mat = random_matrix(&mut rng, 8, 8, 0.3);
    let mut tree = ValueTree::from_matrix(&mat, 2, 2, 0).unwrap();
    let victims = tree.all_positions();
    let mut remaining = tree.count_elements();
    for (i, j) in victims {
      tree.set_null(i, j);
      remaining -= 1;
      assert!(!tree.is_not_null(i, j));
      assert_eq!(remaining, tree.count_elements());
    }
  }
}

/* Round-trip: the exported pairs rebuild the identical encoding. */
mod round_trip {
  use super::*;
  #[test]
  fn valued_positions_rebuild_value_tree() {
    let mut rng = StdRng::seed_from_u64(17);
    let mat = random_matrix(&mut rng, 12, 9, 0.2);
    let tree = ValueTree::from_matrix(&mat, 2, 2, 0).unwrap();
    let mut pairs = tree.all_valued_positions();
    let rebuilt = ValueTree::from_pairs(&mut pairs, 2, 2, 0).unwrap();
    assert_eq!(tree, rebuilt);
  }
  #[test]
  fn positions_rebuild_bit_tree() {
    let mut mat = BitMatrix::with_dimensions(9, 9);
    for &(i, j) in &[(0, 0), (2, 7), (5, 5), (8, 8), (8, 0)] {
      mat.set(i, j, true);
    }
    let tree = BitTree::from_bit_matrix(&mat, 3, 3).unwrap();
    let positions = tree.all_positions();
    let rebuilt = BitTree::from_positions(&positions, 3, 3).unwrap();
    assert_eq!(tree, rebuilt);
  }
}

/* Construction errors. */
mod errors {
  use super::*;
  #[test]
  fn window_mismatch_is_reported() {
    let lists: Vec<RelationList<u32>> = vec![vec![(0, 1)]];
    let err = ValueTree::from_lists_window(&lists, 0, 0, 6, 6, 2, 2, ListMode::Recursive, 0).unwrap_err();
    match err {
      KrKcTreeError::WindowMismatch { nr, nc, kr, kc, height, num_rows, num_cols } => {
        assert_eq!((6, 6, 2, 2), (nr, nc, kr, kc));
        assert_eq!(3, height);
        assert_eq!(8, num_rows);
        assert_eq!(8, num_cols);
      }
      other => panic!("expected WindowMismatch, got {:?}", other),
    }
  }
  #[test]
  fn matching_window_is_accepted() -> Result<()> {
    let lists: Vec<RelationList<u32>> = vec![vec![(0, 1)]];
    let tree = ValueTree::from_lists_window(&lists, 0, 0, 8, 8, 2, 2, ListMode::Recursive, 0)?;
    assert_eq!(8, tree.num_rows);
    assert_eq!(1, tree.element(0, 0));
    Ok(())
  }
  #[test]
  fn small_arities_are_rejected() {
    let mat = Matrix::filled(4, 4, 0u32);
    assert!(matches!(
      ValueTree::from_matrix(&mat, 1, 2, 0),
      Err(KrKcTreeError::SmallArity { kr: 1, kc: 2 })
    ));
    assert!(matches!(
      BitTree::from_positions(&[(0, 0)], 2, 0),
      Err(KrKcTreeError::SmallArity { kr: 2, kc: 0 })
    ));
  }
}

/* Misc: display, clone, send/sync. */
mod misc {
  use super::*;
  #[test]
  fn display_shows_both_sequences() -> Result<()> {
    let mut mat = BitMatrix::with_dimensions(4, 4);
    mat.set(0, 0, true);
    let tree = BitTree::from_bit_matrix(&mat, 2, 2)?;
    let text = format!("{}", tree);
    assert!(text.contains("h = 2"));
    assert!(text.contains("::"));
    assert!(text.contains("1000"));
    Ok(())
  }
  #[test]
  fn clones_answer_queries_independently() -> Result<()> {
    let mut pairs = vec![ValuedPosition::new(0, 0, 3u32), ValuedPosition::new(7, 7, 4)];
    let tree = ValueTree::from_pairs(&mut pairs, 2, 2, 0)?;
    let clone = tree.clone();
    drop(tree);
    /* The rank index is positional, so the clone stands alone. */
    assert_eq!(3, clone.element(0, 0));
    assert_eq!(4, clone.element(7, 7));
    assert_eq!(2, clone.count_elements());
    Ok(())
  }
  #[test]
  fn flood() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(0xf100d);
    let mut mat = BitMatrix::with_dimensions(512, 512);
    for _ in 0..500 {
      let i = rng.gen_range(0..512);
      let j = rng.gen_range(0..512);
      mat.set(i, j, true);
    }
    let tree = BitTree::from_bit_matrix(&mat, 2, 2)?;
    for _ in 0..200 {
      let i = rng.gen_range(0..512);
      let j = rng.gen_range(0..512);
      assert_eq!(mat.get(i, j).unwrap(), tree.is_not_null(i, j));
    }
    Ok(())
  }
  #[test]
  fn is_send_and_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<BitTree>();
    assert_sync::<BitTree>();
    assert_send::<ValueTree<u64>>();
    assert_sync::<ValueTree<u64>>();
  }
}
