/*!
The five construction algorithms.

Every mode produces the same `(stems, leaves)` encoding for the same
relation; they differ in the input shape they read and the intermediate
state they keep:

- matrix mode recurses depth-first and accumulates one bitmap buffer
  per internal level;
- list mode 0 shares that skeleton but draws leaf values from per-row
  cursors over sorted column lists;
- list mode 1 inserts every entry into a temporary arena tree and then
  emits it breadth-first;
- list mode 2 splices stem groups into a growing bitmap with a naive
  dynamic rank at its side;
- pair mode runs a breadth-first queue of subproblems over the pair
  slice, counting-sorting each slice in place.

The common invariant: no bit and no leaf group is ever emitted for an
all-null subtree.
*/

use {
  bitvec::{prelude::bitvec, vec::BitVec},
  std::collections::VecDeque,
  crate::rank::NaiveDynamicRank,
  crate::relation::{RelationList, ValuedPosition},
  crate::tree::datastore::KrKcTree,
  crate::tree::leaves::LeafStore,
};

/* Matrix mode */
impl<S: LeafStore> KrKcTree<S> {
  pub(crate) fn build_from_matrix(
    &mut self,
    src_rows: usize,
    src_cols: usize,
    cell: &impl Fn(usize, usize) -> S::Elem,
    x: usize,
    y: usize,
  ) {
    let mut levels = vec![BitVec::new(); self.height - 1];
    self.matrix_subtree(src_rows, src_cols, cell, &mut levels, 1, x, y);
    self.assemble_stems(levels);
  }
  fn matrix_subtree(
    &mut self,
    src_rows: usize,
    src_cols: usize,
    cell: &impl Fn(usize, usize) -> S::Elem,
    levels: &mut [BitVec],
    level: usize,
    p: usize,
    q: usize,
  ) -> bool {
    if level == self.height {
      let null = self.leaves.null();
      let mut group = Vec::with_capacity(self.group_len());
      for i in 0..self.kr {
        for j in 0..self.kc {
          group.push(if p + i < src_rows && q + j < src_cols {
            cell(p + i, q + j)
          } else {
            null.clone()
          });
        }
      }
      if is_all(&group, &null) {
        return false
      }
      for v in group {
        self.leaves.push(v);
      }
      true
    } else {
      /* Subtree extents at this level. */
      let sub_r = self.num_rows / self.kr.pow(level as u32);
      let sub_c = self.num_cols / self.kc.pow(level as u32);
      let mut group: BitVec = BitVec::with_capacity(self.group_len());
      for i in 0..self.kr {
        for j in 0..self.kc {
          let child = self.matrix_subtree(src_rows, src_cols, cell, levels, level + 1, p + i * sub_r, q + j * sub_c);
          group.push(child);
        }
      }
      if group.not_any() {
        return false
      }
      levels[level - 1].extend_from_bitslice(&group);
      true
    }
  }
  fn assemble_stems(&mut self, levels: Vec<BitVec>) {
    let total = levels.iter().map(|l| l.len()).sum();
    let mut stems = BitVec::with_capacity(total);
    for level in levels {
      stems.extend_from_bitslice(&level);
    }
    self.stems = stems;
  }
}

/* List mode 0: recursive with per-row cursors */
impl<S: LeafStore> KrKcTree<S> {
  pub(crate) fn build_from_lists_recursive(&mut self, lists: &[RelationList<S::Elem>], x: usize, y: usize) {
    let mut levels = vec![BitVec::new(); self.height - 1];
    /* Start every cursor at the first column inside the window. */
    let mut cursors: Vec<usize> = lists
      .iter()
      .map(|row| row.iter().position(|&(col, _)| col >= y).unwrap_or(row.len()))
      .collect();
    self.lists_subtree(lists, &mut cursors, &mut levels, 1, x, y);
    self.assemble_stems(levels);
  }
  fn lists_subtree(
    &mut self,
    lists: &[RelationList<S::Elem>],
    cursors: &mut [usize],
    levels: &mut [BitVec],
    level: usize,
    p: usize,
    q: usize,
  ) -> bool {
    if level == self.height {
      let null = self.leaves.null();
      let mut group = Vec::with_capacity(self.group_len());
      for i in 0..self.kr {
        let row = p + i;
        for j in 0..self.kc {
          let hit = row < lists.len()
            && cursors[row] < lists[row].len()
            && lists[row][cursors[row]].0 == q + j;
          if hit {
            group.push(lists[row][cursors[row]].1.clone());
            cursors[row] += 1;
          } else {
            group.push(null.clone());
          }
        }
      }
      if is_all(&group, &null) {
        return false
      }
      for v in group {
        self.leaves.push(v);
      }
      true
    } else {
      let sub_r = self.num_rows / self.kr.pow(level as u32);
      let sub_c = self.num_cols / self.kc.pow(level as u32);
      let mut group: BitVec = BitVec::with_capacity(self.group_len());
      for i in 0..self.kr {
        for j in 0..self.kc {
          let child = self.lists_subtree(lists, cursors, levels, level + 1, p + i * sub_r, q + j * sub_c);
          group.push(child);
        }
      }
      if group.not_any() {
        return false
      }
      levels[level - 1].extend_from_bitslice(&group);
      true
    }
  }
}

/* List mode 1: temporary arena tree */

const ROOT: usize = 0;

enum TempNode<E> {
  Leaf(E),
  Internal(Vec<Option<usize>>),
}

/// Arena-backed temporary tree: nodes are either a labelled leaf or an
/// internal node with `kr * kc` child slots, addressed by index.
struct TempTree<E> {
  nodes: Vec<TempNode<E>>,
  fanout: usize,
  null: E,
}
impl<E: Clone> TempTree<E> {
  fn new(null: E, fanout: usize) -> Self {
    TempTree {
      nodes: vec![TempNode::Leaf(null.clone())],
      fanout,
      null,
    }
  }
  fn is_leaf(&self, id: usize) -> bool {
    matches!(self.nodes[id], TempNode::Leaf(_))
  }
  /// Converts a leaf into an internal node. With `as_leaves` the child
  /// slots are pre-filled with null leaves (used at the bottom level),
  /// otherwise they start empty.
  fn turn_internal(&mut self, id: usize, as_leaves: bool) {
    let slots = if as_leaves {
      let mut slots = Vec::with_capacity(self.fanout);
      for _ in 0..self.fanout {
        self.nodes.push(TempNode::Leaf(self.null.clone()));
        slots.push(Some(self.nodes.len() - 1));
      }
      slots
    } else {
      vec![None; self.fanout]
    };
    self.nodes[id] = TempNode::Internal(slots);
  }
  fn child(&self, id: usize, slot: usize) -> Option<usize> {
    match &self.nodes[id] {
      TempNode::Internal(slots) => slots[slot],
      TempNode::Leaf(_) => None,
    }
  }
  /// Creates an empty (null-leaf) child in `slot` and returns its id.
  fn add_child(&mut self, id: usize, slot: usize) -> usize {
    self.nodes.push(TempNode::Leaf(self.null.clone()));
    let child = self.nodes.len() - 1;
    match &mut self.nodes[id] {
      TempNode::Internal(slots) => slots[slot] = Some(child),
      TempNode::Leaf(_) => unreachable!("children can only be added to internal nodes"),
    }
    child
  }
  /// Overwrites the label of the (existing) leaf child in `slot`.
  fn set_leaf_child(&mut self, id: usize, slot: usize, val: E) {
    let child = self.child(id, slot).expect("bottom-level slots are pre-filled");
    self.nodes[child] = TempNode::Leaf(val);
  }
  fn label(&self, id: usize) -> E {
    match &self.nodes[id] {
      TempNode::Leaf(val) => val.clone(),
      TempNode::Internal(_) => unreachable!("labels live on leaves"),
    }
  }
}

impl<S: LeafStore> KrKcTree<S> {
  pub(crate) fn build_from_lists_via_tree(&mut self, lists: &[RelationList<S::Elem>], x: usize, y: usize) {
    let mut arena = TempTree::new(self.leaves.null(), self.group_len());
    for i in x..(x + self.num_rows).min(lists.len()) {
      for &(col, ref val) in &lists[i] {
        if y <= col && col < y + self.num_cols {
          self.tree_insert(&mut arena, ROOT, self.num_rows, self.num_cols, i - x, col - y, val.clone());
        }
      }
    }
    if !arena.is_leaf(ROOT) {
      let mut stems = BitVec::new();
      let mut queue = VecDeque::new();
      queue.push_back(ROOT);
      while let Some(node) = queue.pop_front() {
        for slot in 0..self.group_len() {
          match arena.child(node, slot) {
            Some(child) if arena.is_leaf(child) => {
              let val = arena.label(child);
              self.leaves.push(val);
            }
            Some(child) => {
              stems.push(true);
              queue.push_back(child);
            }
            None => stems.push(false),
          }
        }
      }
      self.stems = stems;
    }
  }
  fn tree_insert(
    &self,
    arena: &mut TempTree<S::Elem>,
    node: usize,
    nr: usize,
    nc: usize,
    p: usize,
    q: usize,
    val: S::Elem,
  ) {
    if nr == self.kr {
      if arena.is_leaf(node) {
        arena.turn_internal(node, true);
      }
      arena.set_leaf_child(node, p * self.kc + q, val);
    } else {
      if arena.is_leaf(node) {
        arena.turn_internal(node, false);
      }
      let sub_r = nr / self.kr;
      let sub_c = nc / self.kc;
      let slot = (p / sub_r) * self.kc + q / sub_c;
      let child = match arena.child(node, slot) {
        Some(child) => child,
        None => arena.add_child(node, slot),
      };
      self.tree_insert(arena, child, sub_r, sub_c, p % sub_r, q % sub_c, val);
    }
  }
}

/* List mode 2: dynamic bitmaps */
impl<S: LeafStore> KrKcTree<S> {
  pub(crate) fn build_from_lists_dynamic(&mut self, lists: &[RelationList<S::Elem>], x: usize, y: usize) {
    if self.height == 1 {
      /* The whole tree is one leaf group; write into it directly. */
      self.leaves.push_nulls(self.group_len());
      for i in x..(x + self.num_rows).min(lists.len()) {
        for &(col, ref val) in &lists[i] {
          if y <= col && col < y + self.num_cols {
            self.leaves.write((i - x) * self.kc + (col - y), val.clone());
          }
        }
      }
      if self.leaves.all_null() {
        self.leaves.reset();
      }
    } else {
      let mut stems = BitVec::new();
      let mut rank = NaiveDynamicRank::new_zeros(0);
      let sub_r = self.num_rows / self.kr;
      let sub_c = self.num_cols / self.kc;
      for i in x..(x + self.num_rows).min(lists.len()) {
        for &(col, ref val) in &lists[i] {
          if y <= col && col < y + self.num_cols {
            if stems.is_empty() {
              stems = bitvec![0; self.group_len()];
              rank = NaiveDynamicRank::new_zeros(self.group_len());
            }
            let p = i - x;
            let q = col - y;
            let z = (p / sub_r) * self.kc + q / sub_c;
            self.dyn_insert(&mut stems, &mut rank, sub_r, sub_c, p % sub_r, q % sub_c, val.clone(), z, 1);
          }
        }
      }
      self.stems = stems;
    }
  }
  #[allow(clippy::too_many_arguments)]
  fn dyn_insert(
    &mut self,
    stems: &mut BitVec,
    rank: &mut NaiveDynamicRank,
    nr: usize,
    nc: usize,
    p: usize,
    q: usize,
    val: S::Elem,
    z: usize,
    level: usize,
  ) {
    let group = self.group_len();
    let sub_r = nr / self.kr;
    let sub_c = nc / self.kc;
    if !stems[z] {
      stems.set(z, true);
      rank.increase_from(z + 1);
      let child = rank.rank(z + 1) * group + (p / sub_r) * self.kc + q / sub_c;
      if level + 1 == self.height {
        /* Splice a fresh null group into the leaves and fill the cell. */
        let at = rank.rank(z + 1) * group - stems.len();
        self.leaves.splice_nulls(at, group);
        self.leaves.write(child - stems.len(), val);
      } else {
        /* Splice a fresh zero group into the stems and descend into it. */
        let at = rank.rank(z + 1) * group;
        for _ in 0..group {
          stems.insert(at, false);
        }
        rank.insert(at + 1, group);
        self.dyn_insert(stems, rank, sub_r, sub_c, p % sub_r, q % sub_c, val, child, level + 1);
      }
    } else {
      let child = rank.rank(z + 1) * group + (p / sub_r) * self.kc + q / sub_c;
      if level + 1 == self.height {
        self.leaves.write(child - stems.len(), val);
      } else {
        self.dyn_insert(stems, rank, sub_r, sub_c, p % sub_r, q % sub_c, val, child, level + 1);
      }
    }
  }
}

/* Pair mode: breadth-first over subproblems with in-place counting sort */

/// A contiguous slice `[left, right)` of the pairs array together with
/// the submatrix those pairs belong to (bounds inclusive).
struct Subproblem {
  first_row: usize,
  last_row: usize,
  first_col: usize,
  last_col: usize,
  left: usize,
  right: usize,
}

impl<S: LeafStore> KrKcTree<S> {
  #[allow(clippy::too_many_arguments)]
  pub(crate) fn build_from_pairs(
    &mut self,
    pairs: &mut [ValuedPosition<S::Elem>],
    first_row: usize,
    last_row: usize,
    first_col: usize,
    last_col: usize,
    left: usize,
    right: usize,
  ) {
    let group = self.group_len();
    let mut queue = VecDeque::new();
    let mut intervals = vec![(0usize, 0usize); group];
    let mut stems = BitVec::new();
    queue.push_back(Subproblem { first_row, last_row, first_col, last_col, left, right });
    while let Some(sp) = queue.pop_front() {
      let rows = sp.last_row - sp.first_row + 1;
      let cols = sp.last_col - sp.first_col + 1;
      if rows > self.kr {
        self.counting_sort(pairs, &mut intervals, &sp, rows / self.kr, cols / self.kc);
        for slot in 0..group {
          if intervals[slot].0 < intervals[slot].1 {
            stems.push(true);
            queue.push_back(Subproblem {
              first_row: sp.first_row + (slot / self.kc) * (rows / self.kr),
              last_row: sp.first_row + (slot / self.kc + 1) * (rows / self.kr) - 1,
              first_col: sp.first_col + (slot % self.kc) * (cols / self.kc),
              last_col: sp.first_col + (slot % self.kc + 1) * (cols / self.kc) - 1,
              left: sp.left + intervals[slot].0,
              right: sp.left + intervals[slot].1,
            });
          } else {
            stems.push(false);
          }
        }
      } else {
        /* Bottom-level subproblem: scatter the slice into one group.
        Later occurrences of the same cell overwrite earlier ones. */
        let mut scatter: Vec<S::Elem> = vec![self.leaves.null(); group];
        for idx in sp.left..sp.right {
          scatter[(pairs[idx].row - sp.first_row) * self.kc + (pairs[idx].col - sp.first_col)] = pairs[idx].val.clone();
        }
        for v in scatter {
          self.leaves.push(v);
        }
      }
    }
    self.stems = stems;
  }
  fn counting_sort(
    &self,
    pairs: &mut [ValuedPosition<S::Elem>],
    intervals: &mut [(usize, usize)],
    sp: &Subproblem,
    width_row: usize,
    width_col: usize,
  ) {
    let group = self.group_len();
    let key = |pair: &ValuedPosition<S::Elem>| {
      ((pair.row - sp.first_row) / width_row) * self.kc + (pair.col - sp.first_col) / width_col
    };
    let mut counts = vec![0usize; group];
    for idx in sp.left..sp.right {
      counts[key(&pairs[idx])] += 1;
    }
    let mut total = 0;
    for slot in 0..group {
      let count = counts[slot];
      counts[slot] = total;
      total += count;
      intervals[slot] = (counts[slot], total);
    }
    /* Stable reorder of the slice through a snapshot. */
    let snapshot: Vec<ValuedPosition<S::Elem>> = pairs[sp.left..sp.right].to_vec();
    for pair in snapshot {
      let slot = key(&pair);
      pairs[sp.left + counts[slot]] = pair;
      counts[slot] += 1;
    }
  }
}

fn is_all<E: PartialEq>(vals: &[E], wanted: &E) -> bool {
  vals.iter().all(|v| v == wanted)
}

#[cfg(test)]
mod util {
  use super::*;
  #[test]
  fn temp_tree_turn_internal_prefills_leaves() {
    let mut arena = TempTree::new(0u8, 4);
    assert!(arena.is_leaf(ROOT));
    arena.turn_internal(ROOT, true);
    assert!(!arena.is_leaf(ROOT));
    for slot in 0..4 {
      let child = arena.child(ROOT, slot).unwrap();
      assert!(arena.is_leaf(child));
      assert_eq!(0, arena.label(child));
    }
    arena.set_leaf_child(ROOT, 2, 9);
    assert_eq!(9, arena.label(arena.child(ROOT, 2).unwrap()));
  }
  #[test]
  fn temp_tree_internal_slots_start_empty() {
    let mut arena = TempTree::new(0u8, 4);
    arena.turn_internal(ROOT, false);
    for slot in 0..4 {
      assert!(arena.child(ROOT, slot).is_none());
    }
    let child = arena.add_child(ROOT, 1);
    assert_eq!(Some(child), arena.child(ROOT, 1));
  }
  #[test]
  fn is_all_detects_mixed_groups() {
    assert!(is_all(&[0, 0, 0], &0));
    assert!(!is_all(&[0, 1, 0], &0));
    assert!(is_all::<u8>(&[], &0));
  }
}
