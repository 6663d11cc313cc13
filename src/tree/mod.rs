/*!
The tree itself: data layout, construction, and navigation.
*/

mod build;
mod datastore;
mod leaves;
mod navigate;

pub use datastore::{BitTree, KrKcTree, ValueTree};
pub use leaves::{BitLeaves, LeafStore, ValueLeaves};

/* Common */

/// Smallest exponent `e` with `k^e >= n`.
pub(crate) fn log_k_ceil(n: usize, k: usize) -> usize {
  let mut e = 0;
  let mut pow: usize = 1;
  while pow < n {
    pow *= k;
    e += 1;
  }
  e
}

/// Tree height and padded extents for an input of `rows` x `cols`
/// cells under arities `(kr, kc)`.
pub(crate) fn dimensions(rows: usize, cols: usize, kr: usize, kc: usize) -> (usize, usize, usize) {
  let height = std::cmp::max(1, std::cmp::max(log_k_ceil(rows, kr), log_k_ceil(cols, kc)));
  (height, kr.pow(height as u32), kc.pow(height as u32))
}

/* Tests */
#[cfg(test)]
mod util {
  use super::*;
  #[test]
  fn log_k_ceil_edges() {
    assert_eq!(0, log_k_ceil(0, 2));
    assert_eq!(0, log_k_ceil(1, 2));
    assert_eq!(1, log_k_ceil(2, 2));
    assert_eq!(2, log_k_ceil(3, 2));
    assert_eq!(2, log_k_ceil(4, 2));
    assert_eq!(3, log_k_ceil(5, 2));
    assert_eq!(1, log_k_ceil(4, 4));
    assert_eq!(2, log_k_ceil(5, 4));
  }
  #[test]
  fn dimensions_rectangular() {
    /* 2x4 input under (2, 4) pads to a single-level 2x4 tree. */
    assert_eq!((1, 2, 4), dimensions(2, 4, 2, 4));
    /* 6x6 input under (2, 2) needs height 3. */
    assert_eq!((3, 8, 8), dimensions(6, 6, 2, 2));
    /* Empty input still gets height 1. */
    assert_eq!((1, 2, 2), dimensions(0, 0, 2, 2));
  }
}
