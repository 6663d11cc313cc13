/*!
Query algorithms over the packed encoding.

Every routine follows the same dispatch: an absolute position `z` at or
beyond the stem length addresses a leaf cell; below it, a zero stem bit
means the whole subtree is empty, and a set bit leads to the child
group starting at `rank1(z + 1) * kr * kc` in the concatenation of
stems and leaves.

The row-successor and first-successor paths are iterative so that row
scans never recurse; the remaining walks recurse at most `height`
frames deep.
*/

use {
  std::collections::VecDeque,
  crate::relation::{Position, ValuedPosition},
  crate::tree::datastore::KrKcTree,
  crate::tree::leaves::LeafStore,
};

/* A subrow of the query row: its column offset and absolute position. */
struct SubrowInfo {
  dq: usize,
  z: usize,
}

/* One frame of the first-successor depth-first search. */
struct SubrowFrame {
  nr: usize,
  nc: usize,
  p: usize,
  dq: usize,
  z: usize,
  j: usize,
}

/* Point queries */
impl<S: LeafStore> KrKcTree<S> {
  /// Does cell `(i, j)` hold a non-null value?
  ///
  /// Coordinates at or beyond `num_rows`/`num_cols` are not validated.
  pub fn is_not_null(&self, i: usize, j: usize) -> bool {
    if self.leaves.is_empty() {
      return false
    }
    let sub_r = self.num_rows / self.kr;
    let sub_c = self.num_cols / self.kc;
    self.check_cell(sub_r, sub_c, i % sub_r, j % sub_c, (i / sub_r) * self.kc + j / sub_c)
  }
  fn check_cell(&self, nr: usize, nc: usize, p: usize, q: usize, z: usize) -> bool {
    if z >= self.stems.len() {
      !self.leaves.is_null_at(z - self.stems.len())
    } else if self.stems[z] {
      let sub_r = nr / self.kr;
      let sub_c = nc / self.kc;
      self.check_cell(
        sub_r,
        sub_c,
        p % sub_r,
        q % sub_c,
        self.child_base(z) + (p / sub_r) * self.kc + q / sub_c,
      )
    } else {
      false
    }
  }
  /// The value at `(i, j)`, null if the cell is absent.
  /// ```
  /// use krkc_tree::{ValueTree, ValuedPosition};
  /// let mut pairs = vec![ValuedPosition::new(1, 2, 4u8)];
  /// let tree = ValueTree::from_pairs(&mut pairs, 2, 2, 0)?;
  /// assert_eq!(4, tree.element(1, 2));
  /// assert_eq!(0, tree.element(2, 1));
  /// # Ok::<(), krkc_tree::error::KrKcTreeError>(())
  /// ```
  pub fn element(&self, i: usize, j: usize) -> S::Elem {
    if self.leaves.is_empty() {
      return self.leaves.null()
    }
    let sub_r = self.num_rows / self.kr;
    let sub_c = self.num_cols / self.kc;
    self.get_cell(sub_r, sub_c, i % sub_r, j % sub_c, (i / sub_r) * self.kc + j / sub_c)
  }
  fn get_cell(&self, nr: usize, nc: usize, p: usize, q: usize, z: usize) -> S::Elem {
    if z >= self.stems.len() {
      self.leaves.value(z - self.stems.len())
    } else if self.stems[z] {
      let sub_r = nr / self.kr;
      let sub_c = nc / self.kc;
      self.get_cell(
        sub_r,
        sub_c,
        p % sub_r,
        q % sub_c,
        self.child_base(z) + (p / sub_r) * self.kc + q / sub_c,
      )
    } else {
      self.leaves.null()
    }
  }
}

/* Row successors: iterative breadth-first scan over the row's
kc-wide subrow slices, one queue per level. */
impl<S: LeafStore> KrKcTree<S> {
  fn row_scan(&self, p: usize, mut emit: impl FnMut(usize, usize)) {
    if self.leaves.is_empty() {
      return
    }
    let len_t = self.stems.len();
    if len_t == 0 {
      /* Single-level tree: the row lives directly in the leaves. */
      let offset = p * self.num_cols;
      for j in 0..self.num_cols {
        if !self.leaves.is_null_at(offset + j) {
          emit(j, offset + j);
        }
      }
      return
    }
    let mut queue: VecDeque<SubrowInfo> = VecDeque::new();
    let mut next_level: VecDeque<SubrowInfo> = VecDeque::new();
    let mut nr = self.num_rows / self.kr;
    let mut nc = self.num_cols / self.kc;
    let mut rel_p = p;
    {
      let mut dq = 0;
      let mut z = self.kc * (rel_p / nr);
      for _ in 0..self.kc {
        queue.push_back(SubrowInfo { dq, z });
        dq += nc;
        z += 1;
      }
    }
    rel_p %= nr;
    nr /= self.kr;
    nc /= self.kc;
    while nr > 1 {
      while let Some(cur) = queue.pop_front() {
        if self.stems[cur.z] {
          let mut z = self.child_base(cur.z) + self.kc * (rel_p / nr);
          let mut dq = cur.dq;
          for _ in 0..self.kc {
            next_level.push_back(SubrowInfo { dq, z });
            dq += nc;
            z += 1;
          }
        }
      }
      std::mem::swap(&mut queue, &mut next_level);
      rel_p %= nr;
      nr /= self.kr;
      nc /= self.kc;
    }
    while let Some(cur) = queue.pop_front() {
      if self.stems[cur.z] {
        let mut pos = self.child_base(cur.z) + self.kc * (rel_p / nr) - len_t;
        let mut dq = cur.dq;
        for _ in 0..self.kc {
          if !self.leaves.is_null_at(pos) {
            emit(dq, pos);
          }
          dq += nc;
          pos += 1;
        }
      }
    }
  }
  /// Ascending columns of the non-null cells in row `i`.
  /// ```
  /// use krkc_tree::BitTree;
  /// let tree = BitTree::from_positions(&[(1, 0), (1, 5), (2, 3)], 2, 2)?;
  /// assert_eq!(vec![0, 5], tree.successor_positions(1));
  /// assert!(tree.successor_positions(0).is_empty());
  /// # Ok::<(), krkc_tree::error::KrKcTreeError>(())
  /// ```
  pub fn successor_positions(&self, i: usize) -> Vec<usize> {
    let mut succs = Vec::new();
    self.row_scan(i, |col, _| succs.push(col));
    succs
  }
  /// Values of the non-null cells in row `i`, in column order.
  pub fn successor_elements(&self, i: usize) -> Vec<S::Elem> {
    let mut succs = Vec::new();
    self.row_scan(i, |_, pos| succs.push(self.leaves.value(pos)));
    succs
  }
  /// Non-null cells of row `i` as `(row, column, value)` triples.
  pub fn successor_valued_positions(&self, i: usize) -> Vec<ValuedPosition<S::Elem>> {
    let mut succs = Vec::new();
    self.row_scan(i, |col, pos| succs.push(ValuedPosition::new(i, col, self.leaves.value(pos))));
    succs
  }
  /// The least column `j` with a non-null `(i, j)`, or `num_cols` when
  /// row `i` has none.
  ///
  /// Left-to-right depth-first search over the row's subrow stripes
  /// with an explicit stack.
  pub fn first_successor(&self, i: usize) -> usize {
    if self.leaves.is_empty() {
      return self.num_cols
    }
    let len_t = self.stems.len();
    if len_t == 0 {
      let offset = i * self.num_cols;
      for j in 0..self.num_cols {
        if !self.leaves.is_null_at(offset + j) {
          return j
        }
      }
      return self.num_cols
    }
    let nr = self.num_rows / self.kr;
    let nc = self.num_cols / self.kc;
    let mut stack = vec![SubrowFrame {
      nr,
      nc,
      p: i % nr,
      dq: 0,
      z: self.kc * (i / nr),
      j: 0,
    }];
    loop {
      let Some(cur) = stack.last_mut() else { break };
      if cur.j == self.kc {
        stack.pop();
        continue
      }
      let mut descend = None;
      if cur.z >= len_t {
        if !self.leaves.is_null_at(cur.z - len_t) {
          return cur.dq
        }
      } else if self.stems[cur.z] {
        let sub_r = cur.nr / self.kr;
        descend = Some(SubrowFrame {
          nr: sub_r,
          nc: cur.nc / self.kc,
          p: cur.p % sub_r,
          dq: cur.dq,
          z: self.child_base(cur.z) + self.kc * (cur.p / sub_r),
          j: 0,
        });
      }
      cur.dq += cur.nc;
      cur.z += 1;
      cur.j += 1;
      if let Some(frame) = descend {
        stack.push(frame);
      }
    }
    self.num_cols
  }
}

/* Column predecessors: recursive mirror of the successor walk. */
impl<S: LeafStore> KrKcTree<S> {
  fn column_scan(&self, q: usize, mut emit: impl FnMut(usize, usize)) {
    if self.leaves.is_empty() {
      return
    }
    let sub_r = self.num_rows / self.kr;
    let sub_c = self.num_cols / self.kc;
    let z = q / sub_c;
    for i in 0..self.kr {
      self.column_step(sub_r, sub_c, q % sub_c, sub_r * i, z + i * self.kc, &mut emit);
    }
  }
  fn column_step(
    &self,
    nr: usize,
    nc: usize,
    q: usize,
    p: usize,
    z: usize,
    emit: &mut impl FnMut(usize, usize),
  ) {
    if z >= self.stems.len() {
      let pos = z - self.stems.len();
      if !self.leaves.is_null_at(pos) {
        emit(p, pos);
      }
    } else if self.stems[z] {
      let sub_r = nr / self.kr;
      let sub_c = nc / self.kc;
      let base = self.child_base(z) + q / sub_c;
      for i in 0..self.kr {
        self.column_step(sub_r, sub_c, q % sub_c, p + sub_r * i, base + i * self.kc, emit);
      }
    }
  }
  /// Ascending rows of the non-null cells in column `j`.
  pub fn predecessor_positions(&self, j: usize) -> Vec<usize> {
    let mut preds = Vec::new();
    self.column_scan(j, |row, _| preds.push(row));
    preds
  }
  /// Values of the non-null cells in column `j`, in row order.
  pub fn predecessor_elements(&self, j: usize) -> Vec<S::Elem> {
    let mut preds = Vec::new();
    self.column_scan(j, |_, pos| preds.push(self.leaves.value(pos)));
    preds
  }
  /// Non-null cells of column `j` as `(row, column, value)` triples.
  pub fn predecessor_valued_positions(&self, j: usize) -> Vec<ValuedPosition<S::Elem>> {
    let mut preds = Vec::new();
    self.column_scan(j, |row, pos| preds.push(ValuedPosition::new(row, j, self.leaves.value(pos))));
    preds
  }
}

/* Rectangular ranges */
impl<S: LeafStore> KrKcTree<S> {
  fn range_scan(&self, p1: usize, p2: usize, q1: usize, q2: usize, mut emit: impl FnMut(usize, usize, usize)) {
    if self.leaves.is_empty() {
      return
    }
    let sub_r = self.num_rows / self.kr;
    let sub_c = self.num_cols / self.kc;
    for i in p1 / sub_r..=p2 / sub_r {
      let p1_clip = if i == p1 / sub_r { p1 % sub_r } else { 0 };
      let p2_clip = if i == p2 / sub_r { p2 % sub_r } else { sub_r - 1 };
      for j in q1 / sub_c..=q2 / sub_c {
        self.range_step(
          sub_r,
          sub_c,
          p1_clip,
          p2_clip,
          if j == q1 / sub_c { q1 % sub_c } else { 0 },
          if j == q2 / sub_c { q2 % sub_c } else { sub_c - 1 },
          sub_r * i,
          sub_c * j,
          self.kc * i + j,
          &mut emit,
        );
      }
    }
  }
  #[allow(clippy::too_many_arguments)]
  fn range_step(
    &self,
    nr: usize,
    nc: usize,
    p1: usize,
    p2: usize,
    q1: usize,
    q2: usize,
    dp: usize,
    dq: usize,
    z: usize,
    emit: &mut impl FnMut(usize, usize, usize),
  ) {
    if z >= self.stems.len() {
      let pos = z - self.stems.len();
      if !self.leaves.is_null_at(pos) {
        emit(dp, dq, pos);
      }
    } else if self.stems[z] {
      let base = self.child_base(z);
      let sub_r = nr / self.kr;
      let sub_c = nc / self.kc;
      for i in p1 / sub_r..=p2 / sub_r {
        let p1_clip = if i == p1 / sub_r { p1 % sub_r } else { 0 };
        let p2_clip = if i == p2 / sub_r { p2 % sub_r } else { sub_r - 1 };
        for j in q1 / sub_c..=q2 / sub_c {
          self.range_step(
            sub_r,
            sub_c,
            p1_clip,
            p2_clip,
            if j == q1 / sub_c { q1 % sub_c } else { 0 },
            if j == q2 / sub_c { q2 % sub_c } else { sub_c - 1 },
            dp + sub_r * i,
            dq + sub_c * j,
            base + self.kc * i + j,
            emit,
          );
        }
      }
    }
  }
  /// All non-null positions with `i1 <= i <= i2` and `j1 <= j <= j2`.
  pub fn positions_in_range(&self, i1: usize, i2: usize, j1: usize, j2: usize) -> Vec<Position> {
    let mut found = Vec::new();
    self.range_scan(i1, i2, j1, j2, |row, col, _| found.push((row, col)));
    found
  }
  /// Values of the non-null cells within the rectangle.
  pub fn elements_in_range(&self, i1: usize, i2: usize, j1: usize, j2: usize) -> Vec<S::Elem> {
    let mut found = Vec::new();
    self.range_scan(i1, i2, j1, j2, |_, _, pos| found.push(self.leaves.value(pos)));
    found
  }
  /// Non-null cells within the rectangle as `(row, column, value)`
  /// triples.
  pub fn valued_positions_in_range(&self, i1: usize, i2: usize, j1: usize, j2: usize) -> Vec<ValuedPosition<S::Elem>> {
    let mut found = Vec::new();
    self.range_scan(i1, i2, j1, j2, |row, col, pos| {
      found.push(ValuedPosition::new(row, col, self.leaves.value(pos)))
    });
    found
  }
  /// All non-null positions of the relation.
  pub fn all_positions(&self) -> Vec<Position> {
    self.positions_in_range(0, self.num_rows - 1, 0, self.num_cols - 1)
  }
  /// All non-null values of the relation.
  pub fn all_elements(&self) -> Vec<S::Elem> {
    self.elements_in_range(0, self.num_rows - 1, 0, self.num_cols - 1)
  }
  /// All non-null cells of the relation as triples.
  pub fn all_valued_positions(&self) -> Vec<ValuedPosition<S::Elem>> {
    self.valued_positions_in_range(0, self.num_rows - 1, 0, self.num_cols - 1)
  }
}

/* Containment, counting, local clearing */
impl<S: LeafStore> KrKcTree<S> {
  /// Does the rectangle `i1..=i2` x `j1..=j2` contain a non-null cell?
  ///
  /// When a queried rectangle covers the full extent of a subtree
  /// whose stem bit is set, the query returns `true` without
  /// descending further. [`set_null`](KrKcTree::set_null) does not
  /// restructure the tree, so after clearing cells this shortcut can
  /// report `true` for a rectangle that no longer contains one.
  pub fn contains_element(&self, i1: usize, i2: usize, j1: usize, j2: usize) -> bool {
    if self.leaves.is_empty() {
      return false
    }
    /* The extent compared here is the full matrix, not the extent
    divided by the arities: the subtree sizes of the children are not
    the size of the currently considered submatrix. */
    if i1 == 0 && j1 == 0 && i2 == self.num_rows - 1 && j2 == self.num_cols - 1 {
      return true
    }
    let sub_r = self.num_rows / self.kr;
    let sub_c = self.num_cols / self.kc;
    for i in i1 / sub_r..=i2 / sub_r {
      let p1_clip = if i == i1 / sub_r { i1 % sub_r } else { 0 };
      let p2_clip = if i == i2 / sub_r { i2 % sub_r } else { sub_r - 1 };
      for j in j1 / sub_c..=j2 / sub_c {
        let hit = self.contains_step(
          sub_r,
          sub_c,
          p1_clip,
          p2_clip,
          if j == j1 / sub_c { j1 % sub_c } else { 0 },
          if j == j2 / sub_c { j2 % sub_c } else { sub_c - 1 },
          self.kc * i + j,
        );
        if hit {
          return true
        }
      }
    }
    false
  }
  #[allow(clippy::too_many_arguments)]
  fn contains_step(&self, nr: usize, nc: usize, p1: usize, p2: usize, q1: usize, q2: usize, z: usize) -> bool {
    if z >= self.stems.len() {
      return !self.leaves.is_null_at(z - self.stems.len())
    }
    if !self.stems[z] {
      return false
    }
    if p1 == 0 && q1 == 0 && p2 == nr - 1 && q2 == nc - 1 {
      return true
    }
    let sub_r = nr / self.kr;
    let sub_c = nc / self.kc;
    for i in p1 / sub_r..=p2 / sub_r {
      let p1_clip = if i == p1 / sub_r { p1 % sub_r } else { 0 };
      let p2_clip = if i == p2 / sub_r { p2 % sub_r } else { sub_r - 1 };
      for j in q1 / sub_c..=q2 / sub_c {
        let hit = self.contains_step(
          sub_r,
          sub_c,
          p1_clip,
          p2_clip,
          if j == q1 / sub_c { q1 % sub_c } else { 0 },
          if j == q2 / sub_c { q2 % sub_c } else { sub_c - 1 },
          self.child_base(z) + self.kc * i + j,
        );
        if hit {
          return true
        }
      }
    }
    false
  }
  /// Number of non-null cells in the relation.
  pub fn count_elements(&self) -> usize {
    (0..self.leaves.len()).filter(|&pos| !self.leaves.is_null_at(pos)).count()
  }
  /// Clears the cell `(i, j)` in place.
  ///
  /// This is the only mutation the tree supports. It overwrites the
  /// leaf cell without restructuring, so stem bits above a group that
  /// becomes all-null stay set; see
  /// [`contains_element`](KrKcTree::contains_element).
  pub fn set_null(&mut self, i: usize, j: usize) {
    if self.leaves.is_empty() {
      return
    }
    let sub_r = self.num_rows / self.kr;
    let sub_c = self.num_cols / self.kc;
    self.clear_cell(sub_r, sub_c, i % sub_r, j % sub_c, (i / sub_r) * self.kc + j / sub_c);
  }
  fn clear_cell(&mut self, nr: usize, nc: usize, p: usize, q: usize, z: usize) {
    if z >= self.stems.len() {
      let pos = z - self.stems.len();
      self.leaves.clear_at(pos);
    } else if self.stems[z] {
      let sub_r = nr / self.kr;
      let sub_c = nc / self.kc;
      let next = self.child_base(z) + (p / sub_r) * self.kc + q / sub_c;
      self.clear_cell(sub_r, sub_c, p % sub_r, q % sub_c, next);
    }
  }
}
