#![warn(missing_debug_implementations, rust_2018_idioms, missing_docs)]

/*!
Static rectangular K²-trees for compactly representing sparse
two-dimensional relations.

A relation is a matrix with a distinguished null value (equivalently, a
binary adjacency matrix). The tree recursively splits the matrix into
`kr * kc` submatrices, emits one presence bit per submatrix, and prunes
every submatrix that contains only nulls. What remains is a pair of
packed sequences plus a small rank index, over which point lookups, row
and column scans, and rectangular range queries run without the tree
ever being materialised.

**Note:** this library relies upon [bitvec](https://docs.rs/bitvec) to
store its packed sequences. Always try to compile with optimisations;
bit addressing is very slow without them!
*/

/*!
# How it works

## Original matrix (kr = kc = 2)

```ignore
10|00
00|01
-----
00|00
00|10
```

The 4x4 matrix is split into four 2x2 quadrants. The root emits one bit
per quadrant, 1 when the quadrant holds at least one non-null cell:

```ignore
stems:  1101        (bottom-left quadrant is all null)
leaves: 1000,0001,0010   (the three retained quadrants, row-major)
```

Both sequences are stored level by level, top level first, so the
children of the stem bit at position `z` start at bit
`rank1(z + 1) * kr * kc` of the concatenation `stems ++ leaves` — the
tree exists only in that arithmetic.

Distinct row and column arities are supported: with `kr = 2, kc = 4`
every node splits its rows two ways and its columns four ways, which
suits relations that are much wider than tall.
*/

/*!
# Choosing a constructor

The same encoding can be built from three input shapes:

- a dense matrix ([`ValueTree::from_matrix`],
  [`BitTree::from_bit_matrix`]),
- one sorted column list per row ([`ValueTree::from_lists`],
  [`BitTree::from_adjacency_lists`]), with three interchangeable
  algorithms selected by [`ListMode`],
- a flat list of pairs ([`ValueTree::from_pairs`],
  [`BitTree::from_positions`]), sorted in place level by level.

Every constructor has a windowed variant restricting it to a submatrix
of the input.
*/

pub mod error;
pub mod matrix;
pub mod rank;
pub mod relation;
pub mod tree;

pub use relation::{ListMode, Position, Relation, RelationList, ValuedPosition};
pub use tree::{BitLeaves, BitTree, KrKcTree, LeafStore, ValueLeaves, ValueTree};

#[cfg(test)]
mod unit_tests {
  mod krkc_tree;
}
