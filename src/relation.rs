/*!
The uniform accessor interface for two-dimensional relations, plus the
vocabulary types shared by every constructor and query.

A relation is a matrix with a distinguished null value; a cell is "in"
the relation exactly when its value differs from null. The [`Relation`]
trait exposes both the matrix-flavoured queries (`element`,
`positions_in_range`, ...) and the relation-flavoured synonyms
(`are_related`, `successors`, ...) used when the structure represents
an adjacency matrix.
*/

/// A `(row, column)` coordinate of a relation cell.
pub type Position = (usize, usize);

/// One row of a list-of-lists relation: `(column, value)` entries
/// sorted by column.
pub type RelationList<E> = Vec<(usize, E)>;

/// A relation cell together with its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValuedPosition<E> {
  /// The row of the cell.
  pub row: usize,
  /// The column of the cell.
  pub col: usize,
  /// The value stored in the cell.
  pub val: E,
}
impl<E> ValuedPosition<E> {
  /// Bundles a coordinate and a value.
  pub fn new(row: usize, col: usize, val: E) -> Self {
    ValuedPosition { row, col, val }
  }
}

/// Selects the algorithm used by the list-of-lists constructors.
///
/// All three produce identical trees; they differ only in the shape of
/// their intermediate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
  /// Depth-first recursion with per-row cursors and per-level bitmap
  /// buffers.
  Recursive,
  /// Insertion into a temporary arena tree, then breadth-first
  /// emission.
  TempTree,
  /// Direct insertion into a growing stem buffer with dynamic rank.
  DynamicBitmaps,
}
impl From<usize> for ListMode {
  /// Maps the numeric mode selector: 0 is [`ListMode::Recursive`],
  /// 1 is [`ListMode::TempTree`], anything else falls back to
  /// [`ListMode::DynamicBitmaps`].
  fn from(mode: usize) -> Self {
    match mode {
      0 => ListMode::Recursive,
      1 => ListMode::TempTree,
      _ => ListMode::DynamicBitmaps,
    }
  }
}

/// Read access to a two-dimensional relation over elements of type
/// `Elem`, with a single local mutation (`set_null`).
///
/// Range bounds are inclusive on both ends. Coordinates at or beyond
/// `num_rows`/`num_cols` are not validated; the caller must clamp.
pub trait Relation {
  /// The element type of the relation; cells equal to
  /// [`null_value`](Relation::null_value) are absent.
  type Elem: Clone + PartialEq;

  /// Number of rows of the (padded) relation matrix.
  fn num_rows(&self) -> usize;
  /// Number of columns of the (padded) relation matrix.
  fn num_cols(&self) -> usize;
  /// The sentinel marking absent cells.
  fn null_value(&self) -> Self::Elem;

  /// Does cell `(i, j)` hold a non-null value?
  fn is_not_null(&self, i: usize, j: usize) -> bool;
  /// The value at `(i, j)`, null if the cell is absent.
  fn element(&self, i: usize, j: usize) -> Self::Elem;

  /// Ascending columns of the non-null cells in row `i`.
  fn successor_positions(&self, i: usize) -> Vec<usize>;
  /// Values of the non-null cells in row `i`, in column order.
  fn successor_elements(&self, i: usize) -> Vec<Self::Elem>;
  /// Non-null cells of row `i` as `(row, column, value)` triples.
  fn successor_valued_positions(&self, i: usize) -> Vec<ValuedPosition<Self::Elem>>;

  /// Ascending rows of the non-null cells in column `j`.
  fn predecessor_positions(&self, j: usize) -> Vec<usize>;
  /// Values of the non-null cells in column `j`, in row order.
  fn predecessor_elements(&self, j: usize) -> Vec<Self::Elem>;
  /// Non-null cells of column `j` as `(row, column, value)` triples.
  fn predecessor_valued_positions(&self, j: usize) -> Vec<ValuedPosition<Self::Elem>>;

  /// All non-null positions within rows `i1..=i2` and columns
  /// `j1..=j2`.
  fn positions_in_range(&self, i1: usize, i2: usize, j1: usize, j2: usize) -> Vec<Position>;
  /// Values of the non-null cells within the rectangle.
  fn elements_in_range(&self, i1: usize, i2: usize, j1: usize, j2: usize) -> Vec<Self::Elem>;
  /// Non-null cells within the rectangle as triples.
  fn valued_positions_in_range(&self, i1: usize, i2: usize, j1: usize, j2: usize) -> Vec<ValuedPosition<Self::Elem>>;

  /// All non-null positions of the relation.
  fn all_positions(&self) -> Vec<Position> {
    self.positions_in_range(0, self.num_rows() - 1, 0, self.num_cols() - 1)
  }
  /// All non-null values of the relation.
  fn all_elements(&self) -> Vec<Self::Elem> {
    self.elements_in_range(0, self.num_rows() - 1, 0, self.num_cols() - 1)
  }
  /// All non-null cells of the relation as triples.
  fn all_valued_positions(&self) -> Vec<ValuedPosition<Self::Elem>> {
    self.valued_positions_in_range(0, self.num_rows() - 1, 0, self.num_cols() - 1)
  }

  /// Does the rectangle contain at least one non-null cell?
  fn contains_element(&self, i1: usize, i2: usize, j1: usize, j2: usize) -> bool;
  /// Number of non-null cells in the relation.
  fn count_elements(&self) -> usize;
  /// The least column `j` with a non-null `(i, j)`, or
  /// [`num_cols`](Relation::num_cols) when row `i` is empty.
  fn first_successor(&self, i: usize) -> usize;
  /// Clears the cell `(i, j)` in place, without restructuring.
  fn set_null(&mut self, i: usize, j: usize);

  /* Method aliases using relation nomenclature. */

  /// Synonym of [`is_not_null`](Relation::is_not_null).
  fn are_related(&self, i: usize, j: usize) -> bool {
    self.is_not_null(i, j)
  }
  /// Synonym of [`successor_positions`](Relation::successor_positions).
  fn successors(&self, i: usize) -> Vec<usize> {
    self.successor_positions(i)
  }
  /// Synonym of [`predecessor_positions`](Relation::predecessor_positions).
  fn predecessors(&self, j: usize) -> Vec<usize> {
    self.predecessor_positions(j)
  }
  /// Synonym of [`positions_in_range`](Relation::positions_in_range).
  fn range(&self, i1: usize, i2: usize, j1: usize, j2: usize) -> Vec<Position> {
    self.positions_in_range(i1, i2, j1, j2)
  }
  /// Synonym of [`contains_element`](Relation::contains_element).
  fn contains_link(&self, i1: usize, i2: usize, j1: usize, j2: usize) -> bool {
    self.contains_element(i1, i2, j1, j2)
  }
  /// Synonym of [`count_elements`](Relation::count_elements).
  fn count_links(&self) -> usize {
    self.count_elements()
  }
}

#[cfg(test)]
mod api {
  use super::*;
  #[test]
  fn list_mode_fallback() {
    assert_eq!(ListMode::Recursive, ListMode::from(0));
    assert_eq!(ListMode::TempTree, ListMode::from(1));
    assert_eq!(ListMode::DynamicBitmaps, ListMode::from(2));
    assert_eq!(ListMode::DynamicBitmaps, ListMode::from(17));
  }
}
