use {
  bitvec::vec::BitVec,
  crate::error::KrKcTreeError as Error,
  crate::matrix::{BitMatrix, Matrix},
  crate::rank::RankIndex,
  crate::relation::{ListMode, Position, Relation, RelationList, ValuedPosition},
  crate::tree::dimensions,
  crate::tree::leaves::{BitLeaves, LeafStore, ValueLeaves},
};

type Result<T> = std::result::Result<T, Error>;

/// A rectangular K²-tree over leaf storage `S`.
///
/// The tree compresses a sparse two-dimensional relation with distinct
/// row and column arities `kr` and `kc`. It is built once by one of
/// the constructors and then answers navigational queries from two
/// packed sequences: `stems` holds one presence bit per child slot of
/// every retained internal node (level order, top level first), and
/// `leaves` holds the cell values of every retained bottom-level
/// group. A subtree containing only null cells is pruned: its parent
/// bit is 0 and it contributes nothing to either sequence.
///
/// The represented matrix is padded to `kr^h` x `kc^h`; cells beyond
/// the original input read as null.
///
/// ```
/// use krkc_tree::{BitTree, matrix::BitMatrix};
/// let mut m = BitMatrix::with_dimensions(4, 4);
/// m.set(0, 0, true);
/// m.set(1, 3, true);
/// m.set(3, 2, true);
/// let tree = BitTree::from_bit_matrix(&m, 2, 2)?;
/// assert_eq!(2, tree.height);
/// assert!(tree.is_not_null(1, 3));
/// assert_eq!(vec![3], tree.successor_positions(1));
/// # Ok::<(), krkc_tree::error::KrKcTreeError>(())
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KrKcTree<S: LeafStore> {
  /// Row arity: every internal node splits its rows `kr` ways.
  pub kr: usize,
  /// Column arity: every internal node splits its columns `kc` ways.
  pub kc: usize,
  /// Height of the tree; the root is level 0, leaves level `height`.
  pub height: usize,
  /// Padded row count `kr^height`.
  pub num_rows: usize,
  /// Padded column count `kc^height`.
  pub num_cols: usize,
  /// Internal-level bitmaps, concatenated in level order.
  pub stems: BitVec,
  /// Bottom-level cell values, one `kr * kc` group per retained node.
  pub leaves: S,
  pub(crate) stem_ranks: RankIndex,
}

/// A tree storing arbitrary element values at its leaves.
pub type ValueTree<E> = KrKcTree<ValueLeaves<E>>;

/// The boolean specialisation: leaves are packed presence bits and
/// null is `false`.
pub type BitTree = KrKcTree<BitLeaves>;

/* Construction plumbing shared by every mode */
impl<S: LeafStore> KrKcTree<S> {
  fn skeleton(kr: usize, kc: usize, height: usize, num_rows: usize, num_cols: usize, leaves: S) -> Self {
    let stems = BitVec::new();
    let stem_ranks = RankIndex::build(&stems);
    KrKcTree {
      kr,
      kc,
      height,
      num_rows,
      num_cols,
      stems,
      leaves,
      stem_ranks,
    }
  }
  pub(crate) fn rebuild_ranks(&mut self) {
    self.stem_ranks = RankIndex::build(&self.stems);
  }
  fn check_arities(kr: usize, kc: usize) -> Result<()> {
    if kr < 2 || kc < 2 {
      return Err(Error::SmallArity { kr, kc })
    }
    Ok(())
  }
  fn check_window(&self, nr: usize, nc: usize) -> Result<()> {
    if self.num_rows != nr || self.num_cols != nc {
      return Err(Error::WindowMismatch {
        nr,
        nc,
        kr: self.kr,
        kc: self.kc,
        height: self.height,
        num_rows: self.num_rows,
        num_cols: self.num_cols,
      })
    }
    Ok(())
  }
  fn build_lists_mode(&mut self, lists: &[RelationList<S::Elem>], x: usize, y: usize, mode: ListMode) {
    match mode {
      ListMode::Recursive => self.build_from_lists_recursive(lists, x, y),
      ListMode::TempTree => self.build_from_lists_via_tree(lists, x, y),
      ListMode::DynamicBitmaps => self.build_from_lists_dynamic(lists, x, y),
    }
    self.rebuild_ranks();
  }
}

/* Constructors over arbitrary element values */
impl<E: Clone + PartialEq> KrKcTree<ValueLeaves<E>> {
  /// Builds a tree from a dense matrix.
  ///
  /// Cells equal to `null` are treated as absent; the matrix is padded
  /// with nulls up to `kr^h` x `kc^h`.
  /// ```
  /// use krkc_tree::{ValueTree, matrix::Matrix};
  /// let mut m = Matrix::filled(4, 4, 0u32);
  /// m.set(0, 0, 5);
  /// m.set(3, 2, 9);
  /// let tree = ValueTree::from_matrix(&m, 2, 2, 0)?;
  /// assert_eq!(5, tree.element(0, 0));
  /// assert_eq!(0, tree.element(2, 2));
  /// assert_eq!(2, tree.count_elements());
  /// # Ok::<(), krkc_tree::error::KrKcTreeError>(())
  /// ```
  pub fn from_matrix(mat: &Matrix<E>, kr: usize, kc: usize, null: E) -> Result<Self> {
    Self::check_arities(kr, kc)?;
    let (height, num_rows, num_cols) = dimensions(mat.num_rows, mat.num_cols, kr, kc);
    let mut tree = Self::skeleton(kr, kc, height, num_rows, num_cols, ValueLeaves::with_null(null));
    tree.build_from_matrix(mat.num_rows, mat.num_cols, &|i, j| mat.cell(i, j), 0, 0);
    tree.rebuild_ranks();
    Ok(tree)
  }
  /// Builds a tree from the submatrix of `mat` starting at `(x, y)`
  /// with `nr` rows and `nc` columns.
  ///
  /// `(nr, nc)` must equal the padded dimensions `(kr^h, kc^h)` the
  /// constructor derives from them, otherwise a
  /// [`WindowMismatch`](crate::error::KrKcTreeError::WindowMismatch)
  /// error is returned.
  pub fn from_matrix_window(
    mat: &Matrix<E>,
    x: usize,
    y: usize,
    nr: usize,
    nc: usize,
    kr: usize,
    kc: usize,
    null: E,
  ) -> Result<Self> {
    Self::check_arities(kr, kc)?;
    let (height, num_rows, num_cols) = dimensions(nr, nc, kr, kc);
    let mut tree = Self::skeleton(kr, kc, height, num_rows, num_cols, ValueLeaves::with_null(null));
    tree.check_window(nr, nc)?;
    tree.build_from_matrix(mat.num_rows, mat.num_cols, &|i, j| mat.cell(i, j), x, y);
    tree.rebuild_ranks();
    Ok(tree)
  }
  /// Builds a tree from one sorted `(column, value)` list per row.
  ///
  /// The column extent is inferred from the largest column mentioned.
  /// All three [`ListMode`]s produce the same tree.
  pub fn from_lists(lists: &[RelationList<E>], kr: usize, kc: usize, mode: ListMode, null: E) -> Result<Self> {
    Self::check_arities(kr, kc)?;
    let max_col = lists
      .iter()
      .flat_map(|row| row.iter().map(|&(col, _)| col))
      .max()
      .unwrap_or(0);
    let (height, num_rows, num_cols) = dimensions(lists.len(), max_col + 1, kr, kc);
    let mut tree = Self::skeleton(kr, kc, height, num_rows, num_cols, ValueLeaves::with_null(null));
    tree.build_lists_mode(lists, 0, 0, mode);
    Ok(tree)
  }
  /// Builds a tree from the `nr` x `nc` window of `lists` starting at
  /// row `x`, column `y`. Entries outside the window are ignored.
  pub fn from_lists_window(
    lists: &[RelationList<E>],
    x: usize,
    y: usize,
    nr: usize,
    nc: usize,
    kr: usize,
    kc: usize,
    mode: ListMode,
    null: E,
  ) -> Result<Self> {
    Self::check_arities(kr, kc)?;
    let (height, num_rows, num_cols) = dimensions(nr, nc, kr, kc);
    let mut tree = Self::skeleton(kr, kc, height, num_rows, num_cols, ValueLeaves::with_null(null));
    tree.check_window(nr, nc)?;
    tree.build_lists_mode(lists, x, y, mode);
    Ok(tree)
  }
  /// Builds a tree from a flat list of `(row, column, value)` triples.
  ///
  /// The slice is reordered in place by the counting sorts. When the
  /// same cell occurs more than once, the last occurrence within the
  /// final sorted group wins.
  /// ```
  /// use krkc_tree::{ValueTree, ValuedPosition};
  /// let mut pairs = vec![
  ///   ValuedPosition::new(0, 0, 5u32),
  ///   ValuedPosition::new(0, 0, 7),
  ///   ValuedPosition::new(3, 3, 9),
  /// ];
  /// let tree = ValueTree::from_pairs(&mut pairs, 2, 2, 0)?;
  /// assert_eq!(7, tree.element(0, 0));
  /// assert_eq!(9, tree.element(3, 3));
  /// # Ok::<(), krkc_tree::error::KrKcTreeError>(())
  /// ```
  pub fn from_pairs(pairs: &mut [ValuedPosition<E>], kr: usize, kc: usize, null: E) -> Result<Self> {
    Self::check_arities(kr, kc)?;
    let (max_row, max_col) = pairs.iter().fold((0, 0), |(r, c), p| (r.max(p.row), c.max(p.col)));
    let (height, num_rows, num_cols) = dimensions(max_row + 1, max_col + 1, kr, kc);
    let mut tree = Self::skeleton(kr, kc, height, num_rows, num_cols, ValueLeaves::with_null(null));
    if !pairs.is_empty() {
      let len = pairs.len();
      tree.build_from_pairs(pairs, 0, tree.num_rows - 1, 0, tree.num_cols - 1, 0, len);
    }
    tree.rebuild_ranks();
    Ok(tree)
  }
  /// Builds a tree from the slice `pairs[left..right)`, restricted to
  /// the `nr` x `nc` window starting at `(x, y)`.
  ///
  /// Every triple in the slice must lie within the window.
  pub fn from_pairs_window(
    pairs: &mut [ValuedPosition<E>],
    x: usize,
    y: usize,
    nr: usize,
    nc: usize,
    left: usize,
    right: usize,
    kr: usize,
    kc: usize,
    null: E,
  ) -> Result<Self> {
    Self::check_arities(kr, kc)?;
    let (height, num_rows, num_cols) = dimensions(nr, nc, kr, kc);
    let mut tree = Self::skeleton(kr, kc, height, num_rows, num_cols, ValueLeaves::with_null(null));
    tree.check_window(nr, nc)?;
    if left != right {
      tree.build_from_pairs(pairs, x, x + nr - 1, y, y + nc - 1, left, right);
    }
    tree.rebuild_ranks();
    Ok(tree)
  }
}

/* Constructors for the boolean specialisation */
impl KrKcTree<BitLeaves> {
  /// Builds a boolean tree from a dense bit-matrix.
  /// ```
  /// use krkc_tree::{BitTree, Relation, matrix::BitMatrix};
  /// let m = BitMatrix::from_bits(2, 4, vec![
  ///   false, false, true, false,
  ///   false, false, false, false,
  /// ]);
  /// let tree = BitTree::from_bit_matrix(&m, 2, 4)?;
  /// assert_eq!(1, tree.height);
  /// assert!(tree.stems.is_empty());
  /// assert!(tree.are_related(0, 2));
  /// # Ok::<(), krkc_tree::error::KrKcTreeError>(())
  /// ```
  pub fn from_bit_matrix(mat: &BitMatrix, kr: usize, kc: usize) -> Result<Self> {
    Self::check_arities(kr, kc)?;
    let (height, num_rows, num_cols) = dimensions(mat.num_rows, mat.num_cols, kr, kc);
    let mut tree = Self::skeleton(kr, kc, height, num_rows, num_cols, BitLeaves::with_null(false));
    tree.build_from_matrix(mat.num_rows, mat.num_cols, &|i, j| mat.cell(i, j), 0, 0);
    tree.rebuild_ranks();
    Ok(tree)
  }
  /// Windowed variant of [`from_bit_matrix`](BitTree::from_bit_matrix).
  pub fn from_bit_matrix_window(
    mat: &BitMatrix,
    x: usize,
    y: usize,
    nr: usize,
    nc: usize,
    kr: usize,
    kc: usize,
  ) -> Result<Self> {
    Self::check_arities(kr, kc)?;
    let (height, num_rows, num_cols) = dimensions(nr, nc, kr, kc);
    let mut tree = Self::skeleton(kr, kc, height, num_rows, num_cols, BitLeaves::with_null(false));
    tree.check_window(nr, nc)?;
    tree.build_from_matrix(mat.num_rows, mat.num_cols, &|i, j| mat.cell(i, j), x, y);
    tree.rebuild_ranks();
    Ok(tree)
  }
  /// Builds a boolean tree from one sorted column list per row.
  pub fn from_adjacency_lists(lists: &[Vec<usize>], kr: usize, kc: usize, mode: ListMode) -> Result<Self> {
    Self::check_arities(kr, kc)?;
    let max_col = lists.iter().flat_map(|row| row.iter().copied()).max().unwrap_or(0);
    let (height, num_rows, num_cols) = dimensions(lists.len(), max_col + 1, kr, kc);
    let mut tree = Self::skeleton(kr, kc, height, num_rows, num_cols, BitLeaves::with_null(false));
    let valued = Self::adjacency_to_lists(lists);
    tree.build_lists_mode(&valued, 0, 0, mode);
    Ok(tree)
  }
  /// Windowed variant of
  /// [`from_adjacency_lists`](BitTree::from_adjacency_lists).
  pub fn from_adjacency_lists_window(
    lists: &[Vec<usize>],
    x: usize,
    y: usize,
    nr: usize,
    nc: usize,
    kr: usize,
    kc: usize,
    mode: ListMode,
  ) -> Result<Self> {
    Self::check_arities(kr, kc)?;
    let (height, num_rows, num_cols) = dimensions(nr, nc, kr, kc);
    let mut tree = Self::skeleton(kr, kc, height, num_rows, num_cols, BitLeaves::with_null(false));
    tree.check_window(nr, nc)?;
    let valued = Self::adjacency_to_lists(lists);
    tree.build_lists_mode(&valued, x, y, mode);
    Ok(tree)
  }
  /// Builds a boolean tree from a flat list of `(row, column)` pairs.
  pub fn from_positions(pairs: &[Position], kr: usize, kc: usize) -> Result<Self> {
    Self::check_arities(kr, kc)?;
    let (max_row, max_col) = pairs.iter().fold((0, 0), |(r, c), &(row, col)| (r.max(row), c.max(col)));
    let (height, num_rows, num_cols) = dimensions(max_row + 1, max_col + 1, kr, kc);
    let mut tree = Self::skeleton(kr, kc, height, num_rows, num_cols, BitLeaves::with_null(false));
    if !pairs.is_empty() {
      let mut valued: Vec<ValuedPosition<bool>> =
        pairs.iter().map(|&(row, col)| ValuedPosition::new(row, col, true)).collect();
      let len = valued.len();
      tree.build_from_pairs(&mut valued, 0, tree.num_rows - 1, 0, tree.num_cols - 1, 0, len);
    }
    tree.rebuild_ranks();
    Ok(tree)
  }
  /// Windowed variant of [`from_positions`](BitTree::from_positions):
  /// only `pairs[left..right)` is considered, and every pair in that
  /// slice must lie within the window.
  pub fn from_positions_window(
    pairs: &[Position],
    x: usize,
    y: usize,
    nr: usize,
    nc: usize,
    left: usize,
    right: usize,
    kr: usize,
    kc: usize,
  ) -> Result<Self> {
    Self::check_arities(kr, kc)?;
    let (height, num_rows, num_cols) = dimensions(nr, nc, kr, kc);
    let mut tree = Self::skeleton(kr, kc, height, num_rows, num_cols, BitLeaves::with_null(false));
    tree.check_window(nr, nc)?;
    if left != right {
      let mut valued: Vec<ValuedPosition<bool>> =
        pairs[left..right].iter().map(|&(row, col)| ValuedPosition::new(row, col, true)).collect();
      let len = valued.len();
      tree.build_from_pairs(&mut valued, x, x + nr - 1, y, y + nc - 1, 0, len);
    }
    tree.rebuild_ranks();
    Ok(tree)
  }
  fn adjacency_to_lists(lists: &[Vec<usize>]) -> Vec<RelationList<bool>> {
    lists
      .iter()
      .map(|row| row.iter().map(|&col| (col, true)).collect())
      .collect()
  }
}

/* Accessors */
impl<S: LeafStore> KrKcTree<S> {
  /// The null sentinel of this tree.
  pub fn null_value(&self) -> S::Elem {
    self.leaves.null()
  }
  /// Returns true if the relation contains no non-null cell.
  pub fn is_empty(&self) -> bool {
    self.leaves.is_empty()
  }
  pub(crate) fn group_len(&self) -> usize {
    self.kr * self.kc
  }
  pub(crate) fn child_base(&self, z: usize) -> usize {
    self.stem_ranks.rank1(&self.stems, z + 1) * self.group_len()
  }
}

/* Traits */
impl<S: LeafStore> PartialEq for KrKcTree<S> {
  fn eq(&self, other: &Self) -> bool {
    self.kr == other.kr
      && self.kc == other.kc
      && self.height == other.height
      && self.stems == other.stems
      && self.leaves == other.leaves
  }
}

impl<S: LeafStore> std::fmt::Display for KrKcTree<S>
where
  S::Elem: std::fmt::Display,
{
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "KrKcTree(h = {}, kr = {}, kc = {}, rows = {}, cols = {}, null = {}) [",
      self.height, self.kr, self.kc, self.num_rows, self.num_cols, self.leaves.null()
    )?;
    let group = self.group_len();
    for (pos, bit) in self.stems.iter().by_vals().enumerate() {
      if pos > 0 && pos % group == 0 {
        write!(f, ",")?;
      }
      write!(f, "{}", if bit { '1' } else { '0' })?;
    }
    write!(f, "::")?;
    for pos in 0..self.leaves.len() {
      if pos > 0 && pos % group == 0 {
        write!(f, ",")?;
      } else if pos > 0 {
        write!(f, " ")?;
      }
      write!(f, "{}", self.leaves.value(pos))?;
    }
    write!(f, "]")
  }
}

impl<S: LeafStore> Relation for KrKcTree<S> {
  type Elem = S::Elem;
  fn num_rows(&self) -> usize {
    self.num_rows
  }
  fn num_cols(&self) -> usize {
    self.num_cols
  }
  fn null_value(&self) -> S::Elem {
    KrKcTree::null_value(self)
  }
  fn is_not_null(&self, i: usize, j: usize) -> bool {
    KrKcTree::is_not_null(self, i, j)
  }
  fn element(&self, i: usize, j: usize) -> S::Elem {
    KrKcTree::element(self, i, j)
  }
  fn successor_positions(&self, i: usize) -> Vec<usize> {
    KrKcTree::successor_positions(self, i)
  }
  fn successor_elements(&self, i: usize) -> Vec<S::Elem> {
    KrKcTree::successor_elements(self, i)
  }
  fn successor_valued_positions(&self, i: usize) -> Vec<ValuedPosition<S::Elem>> {
    KrKcTree::successor_valued_positions(self, i)
  }
  fn predecessor_positions(&self, j: usize) -> Vec<usize> {
    KrKcTree::predecessor_positions(self, j)
  }
  fn predecessor_elements(&self, j: usize) -> Vec<S::Elem> {
    KrKcTree::predecessor_elements(self, j)
  }
  fn predecessor_valued_positions(&self, j: usize) -> Vec<ValuedPosition<S::Elem>> {
    KrKcTree::predecessor_valued_positions(self, j)
  }
  fn positions_in_range(&self, i1: usize, i2: usize, j1: usize, j2: usize) -> Vec<Position> {
    KrKcTree::positions_in_range(self, i1, i2, j1, j2)
  }
  fn elements_in_range(&self, i1: usize, i2: usize, j1: usize, j2: usize) -> Vec<S::Elem> {
    KrKcTree::elements_in_range(self, i1, i2, j1, j2)
  }
  fn valued_positions_in_range(&self, i1: usize, i2: usize, j1: usize, j2: usize) -> Vec<ValuedPosition<S::Elem>> {
    KrKcTree::valued_positions_in_range(self, i1, i2, j1, j2)
  }
  fn contains_element(&self, i1: usize, i2: usize, j1: usize, j2: usize) -> bool {
    KrKcTree::contains_element(self, i1, i2, j1, j2)
  }
  fn count_elements(&self) -> usize {
    KrKcTree::count_elements(self)
  }
  fn first_successor(&self, i: usize) -> usize {
    KrKcTree::first_successor(self, i)
  }
  fn set_null(&mut self, i: usize, j: usize) {
    KrKcTree::set_null(self, i, j)
  }
}
