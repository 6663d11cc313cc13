/*!
Custom errors produced by this library.

All construction errors are reported before a usable tree exists; a
failed constructor never leaves a partially-built value behind.
Queries on a built tree do not produce errors (out-of-range
coordinates are the caller's responsibility).
*/

/// Errors produced while constructing a `KrKcTree`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KrKcTreeError {
  /// Produced when a user attempts to create a tree with an arity below 2.
  SmallArity {
    /// The requested row arity.
    kr: usize,
    /// The requested column arity.
    kc: usize,
  },
  /// Produced when a windowed constructor is given submatrix dimensions
  /// that are not the powers of `kr` resp. `kc` implied by the derived
  /// height.
  WindowMismatch {
    /// The requested number of window rows.
    nr: usize,
    /// The requested number of window columns.
    nc: usize,
    /// The requested row arity.
    kr: usize,
    /// The requested column arity.
    kc: usize,
    /// The height derived from `(nr, nc, kr, kc)`.
    height: usize,
    /// The row count `kr^height` the window would have to match.
    num_rows: usize,
    /// The column count `kc^height` the window would have to match.
    num_cols: usize,
  },
}
impl std::error::Error for KrKcTreeError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    None
  }
}
impl std::fmt::Display for KrKcTreeError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    use KrKcTreeError::*;
    match self {
      SmallArity{kr, kc} => write!(f, "Attempt to create a KrKcTree with arities kr = {} and kc = {}, which are less than the minimum of 2.", kr, kc),
      WindowMismatch{nr, nc, kr, kc, height, num_rows, num_cols} => write!(
        f,
        "Unsuitable parameters! The numbers of rows (nr) and columns (nc) have to be powers of kr resp. kc (using the same exponent h). But you gave me: nr = {}, nc = {}, kr = {} and kc = {} leading to h = {} and {} rows resp. {} columns.",
        nr, nc, kr, kc, height, num_rows, num_cols
      ),
    }
  }
}

#[cfg(test)]
mod api {
  use super::*;
  #[test]
  fn window_mismatch_carries_all_fields() {
    let err = KrKcTreeError::WindowMismatch {
      nr: 6, nc: 6, kr: 2, kc: 2, height: 3, num_rows: 8, num_cols: 8,
    };
    let msg = err.to_string();
    for needle in ["nr = 6", "nc = 6", "kr = 2", "kc = 2", "h = 3", "8 rows", "8 columns"] {
      assert!(msg.contains(needle), "missing {:?} in {:?}", needle, msg);
    }
  }
  #[test]
  fn small_arity_display() {
    let err = KrKcTreeError::SmallArity { kr: 1, kc: 4 };
    assert!(err.to_string().contains("kr = 1"));
  }
}
