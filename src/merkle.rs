//! Bitcoin merkle tree over transaction ids
//!
//! Leaves and the returned root are display-order ids. Pair hashing runs on
//! wire order: `hash_pair(a, b) = reverse(SHA256d(reverse(a) || reverse(b)))`.
//! An odd level duplicates its last node.

use crate::error::{MinerError, Result};
use crate::hashes::{reverse, sha256d};
use crate::types::Hash;

/// Hash two display-order nodes into their display-order parent
pub fn hash_pair(left: &Hash, right: &Hash) -> Hash {
    reverse(&hash_pair_wire(&reverse(left), &reverse(right)))
}

/// Reduce display-order leaves to the display-order merkle root
///
/// A single leaf is its own root. The reduction is level by level, so stack
/// depth does not grow with the leaf count.
pub fn merkle_root(leaves: &[Hash]) -> Result<Hash> {
    if leaves.is_empty() {
        return Err(MinerError::EmptyMerkleTree);
    }

    let mut level: Vec<Hash> = leaves.iter().map(reverse).collect();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| match pair {
                [left, right] => hash_pair_wire(left, right),
                [last] => hash_pair_wire(last, last),
                _ => unreachable!("chunks(2) yields one or two nodes"),
            })
            .collect();
    }

    Ok(reverse(&level[0]))
}

fn hash_pair_wire(left: &Hash, right: &Hash) -> Hash {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(left);
    buf[32..].copy_from_slice(right);
    sha256d(&buf)
}
