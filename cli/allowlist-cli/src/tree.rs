//! Binary Merkle tree with sorted-pair hashing.
//!
//! Leaves are paired by position (`[0, 1], [2, 3], ...`). Each pair is hashed as
//! `keccak256(min(a, b) || max(a, b))`, so a proof step never needs a direction bit.
//! When a level has an odd number of nodes the last one is carried to the next level
//! unchanged and contributes no sibling to the proofs passing through it. This matches
//! OpenZeppelin's `MerkleProof.verify` on the contract side.

use log::{debug, trace};
use std::fmt;

use crate::common::{hex_encode, keccak256_hash, Hash};
use crate::error::{AllowlistError, Result};

const LOG_TARGET: &str = "allowlist::tree";

/// Hashes two nodes in ascending byte order.
pub fn combine(a: &Hash, b: &Hash) -> Hash {
    if a <= b {
        keccak256_hash(a, b)
    } else {
        keccak256_hash(b, a)
    }
}

/// Recomputes the root from `leaf` and its sibling path and compares it with `root`.
#[must_use = "Must use the result of the proof verification"]
pub fn verify_proof(leaf: &Hash, proof: &[Hash], root: &Hash) -> bool {
    let computed = proof
        .iter()
        .fold(*leaf, |running, sibling| combine(&running, sibling));
    computed == *root
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowlistTree {
    /// `layers[0]` holds the leaves, the last layer holds only the root.
    layers: Vec<Vec<Hash>>,
}

impl AllowlistTree {
    pub fn build(leaves: Vec<Hash>) -> Result<Self> {
        if leaves.is_empty() {
            return Err(AllowlistError::EmptyAllowlist);
        }

        let mut layers = vec![leaves];
        while let Some(level) = layers.last().filter(|level| level.len() > 1) {
            let next_level: Vec<Hash> = level
                .chunks(2)
                .map(|chunk| match chunk {
                    [left, right] => combine(left, right),
                    [odd] => *odd,
                    _ => unreachable!("chunks(2) yields one or two nodes"),
                })
                .collect();
            trace!(
                target: LOG_TARGET,
                "Reduced level {} ({} nodes) to {} nodes",
                layers.len() - 1,
                level.len(),
                next_level.len()
            );
            layers.push(next_level);
        }

        let tree = Self { layers };
        debug!(
            target: LOG_TARGET,
            "Built tree with {} leaves, depth {}, root {}",
            tree.leaf_count(),
            tree.depth(),
            hex_encode(tree.root())
        );
        Ok(tree)
    }

    pub fn root(&self) -> Hash {
        // `build` guarantees at least one layer ending in a single node
        self.layers[self.layers.len() - 1][0]
    }

    pub fn leaves(&self) -> &[Hash] {
        &self.layers[0]
    }

    pub fn leaf_count(&self) -> usize {
        self.layers[0].len()
    }

    /// Number of levels above the leaves. A single-leaf tree has depth 0.
    pub fn depth(&self) -> usize {
        self.layers.len() - 1
    }

    pub fn layers(&self) -> &[Vec<Hash>] {
        &self.layers
    }

    /// Position of the first occurrence of `leaf`.
    pub fn leaf_index(&self, leaf: &Hash) -> Option<usize> {
        self.layers[0].iter().position(|candidate| candidate == leaf)
    }

    /// Sibling path from the leaf at `leaf_index` up to the root.
    pub fn proof(&self, leaf_index: usize) -> Result<Vec<Hash>> {
        if leaf_index >= self.leaf_count() {
            return Err(AllowlistError::LeafIndexOutOfBounds {
                index: leaf_index,
                leaves: self.leaf_count(),
            });
        }

        let mut proof = Vec::with_capacity(self.depth());
        let mut index = leaf_index;
        for level in &self.layers[..self.layers.len() - 1] {
            let sibling_index = index ^ 1;
            // A missing sibling means this node was promoted unchanged.
            if let Some(sibling) = level.get(sibling_index) {
                proof.push(*sibling);
            }
            index /= 2;
        }

        Ok(proof)
    }

    pub fn proof_for_leaf(&self, leaf: &Hash) -> Option<Vec<Hash>> {
        let index = self.leaf_index(leaf)?;
        self.proof(index).ok()
    }

    #[must_use = "Must use the result of the proof verification"]
    pub fn verify(&self, leaf: &Hash, proof: &[Hash]) -> bool {
        verify_proof(leaf, proof, &self.root())
    }

    fn render_node(
        &self,
        f: &mut fmt::Formatter<'_>,
        level: usize,
        index: usize,
        prefix: &str,
        is_last: bool,
    ) -> fmt::Result {
        let connector = if is_last { "└─ " } else { "├─ " };
        writeln!(
            f,
            "{}{}{}",
            prefix,
            connector,
            hex_encode(self.layers[level][index])
        )?;
        if level == 0 {
            return Ok(());
        }

        let child_prefix = format!("{}{}", prefix, if is_last { "   " } else { "│  " });
        let below = &self.layers[level - 1];
        let first = index * 2;
        let children: Vec<usize> = (first..below.len().min(first + 2)).collect();
        for (position, child) in children.iter().enumerate() {
            self.render_node(
                f,
                level - 1,
                *child,
                &child_prefix,
                position + 1 == children.len(),
            )?;
        }
        Ok(())
    }
}

/// Renders the tree top-down, one node per line.
impl fmt::Display for AllowlistTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render_node(f, self.depth(), 0, "", true)
    }
}
