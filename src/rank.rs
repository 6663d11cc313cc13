/*!
Rank support for navigating the packed stem bitmap.

Navigation turns a stem-bit position into the start of its child group
with `rank1(z + 1) * kr * kc`, so nearly every query goes through
[`RankIndex`]. The index stores one running count per 64-bit block and
finishes the query with a popcount over the block tail; it never holds
a reference into the bitmap itself, which keeps clones and moves of the
owning tree trivially sound.

[`NaiveDynamicRank`] exists only to support construction from lists via
dynamic bitmaps, where stem groups are spliced into a growing buffer
and the ranks have to move with them.
*/

use bitvec::slice::BitSlice;

const BLOCK_BITS: usize = 64;

/// Static rank-1 index over a packed bit sequence.
///
/// `counts[b]` is the number of 1-bits in the first `b * 64` positions
/// of the indexed sequence. The sequence is passed back in at query
/// time; the caller is responsible for querying with the same bits the
/// index was built from.
/// ```
/// use bitvec::prelude::{bitvec, Lsb0};
/// use krkc_tree::rank::RankIndex;
/// let bits = bitvec![1,0,1,1,0,0,0,1];
/// let rank = RankIndex::build(&bits);
/// assert_eq!(0, rank.rank1(&bits, 0));
/// assert_eq!(2, rank.rank1(&bits, 3));
/// assert_eq!(4, rank.rank1(&bits, 8));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankIndex {
  counts: Vec<usize>,
}
impl RankIndex {
  /// Builds the block counts for `bits`.
  pub fn build(bits: &BitSlice) -> Self {
    let mut counts = Vec::with_capacity(bits.len() / BLOCK_BITS + 1);
    let mut total = 0;
    counts.push(0);
    for block in bits.chunks(BLOCK_BITS) {
      total += block.count_ones();
      counts.push(total);
    }
    /* The final entry covers a partial block; drop it so that
    counts[b] always refers to a whole-block prefix. */
    if bits.len() % BLOCK_BITS != 0 {
      counts.pop();
    }
    RankIndex { counts }
  }
  /// Returns the number of 1-bits in `bits[0..pos)`.
  pub fn rank1(&self, bits: &BitSlice, pos: usize) -> usize {
    let block = pos / BLOCK_BITS;
    self.counts[block] + bits[block * BLOCK_BITS..pos].count_ones()
  }
}

/// Naive dynamic rank over a growing zero-initialised bit buffer.
///
/// Keeps the full prefix-count array explicitly, so every update is
/// linear in the buffer length. That is acceptable here: the structure
/// lives only for the duration of one list-based construction and is
/// dropped before the constructor returns.
#[derive(Clone, Debug)]
pub struct NaiveDynamicRank {
  /* ranks[i] = number of 1-bits among the first i bits. */
  ranks: Vec<usize>,
}
impl NaiveDynamicRank {
  /// Rank support for a buffer of `len` zero bits.
  pub fn new_zeros(len: usize) -> Self {
    NaiveDynamicRank {
      ranks: vec![0; len + 1],
    }
  }
  /// Returns the number of 1-bits in the first `pos` positions.
  pub fn rank(&self, pos: usize) -> usize {
    self.ranks[pos]
  }
  /// Registers that the bit at `pos - 1` flipped from 0 to 1: all
  /// prefix counts at and beyond `pos` grow by one.
  pub fn increase_from(&mut self, pos: usize) {
    for r in &mut self.ranks[pos..] {
      *r += 1;
    }
  }
  /// Registers that `count` zero bits were spliced into the buffer
  /// just before prefix position `pos`.
  pub fn insert(&mut self, pos: usize, count: usize) {
    let carried = self.ranks[pos - 1];
    self.ranks.splice(pos..pos, std::iter::repeat(carried).take(count));
  }
}

#[cfg(test)]
mod util {
  use super::*;
  use bitvec::prelude::*;

  #[test]
  fn rank_index_small() {
    let bits = bitvec![0,1,1,1, 1,1,0,1, 1,0,0,0, 1,0,0,0];
    let rank = RankIndex::build(&bits);
    let mut expected = 0;
    for pos in 0..=bits.len() {
      assert_eq!(expected, rank.rank1(&bits, pos), "pos {}", pos);
      if pos < bits.len() && bits[pos] { expected += 1; }
    }
  }
  #[test]
  fn rank_index_crosses_blocks() {
    let mut bits = BitVec::new();
    for i in 0..300 { bits.push(i % 3 == 0); }
    let rank = RankIndex::build(&bits);
    let mut expected = 0;
    for pos in 0..=bits.len() {
      assert_eq!(expected, rank.rank1(&bits, pos), "pos {}", pos);
      if pos < bits.len() && bits[pos] { expected += 1; }
    }
  }
  #[test]
  fn rank_index_empty() {
    let bits = BitVec::new();
    let rank = RankIndex::build(&bits);
    assert_eq!(0, rank.rank1(&bits, 0));
  }
  #[test]
  fn dynamic_rank_tracks_flips() {
    /* Mirror of the splice pattern used during the dynamic-bitmap
    build: flip a bit, then splice a fresh zero group behind it. */
    let mut rank = NaiveDynamicRank::new_zeros(4);
    assert_eq!(0, rank.rank(4));
    rank.increase_from(3); // bit 2 becomes 1
    assert_eq!(0, rank.rank(2));
    assert_eq!(1, rank.rank(3));
    assert_eq!(1, rank.rank(4));
    rank.insert(5, 4); // four zero bits appended at position 4
    assert_eq!(1, rank.rank(8));
    rank.increase_from(5); // bit 4 becomes 1
    assert_eq!(1, rank.rank(4));
    assert_eq!(2, rank.rank(8));
  }
}
