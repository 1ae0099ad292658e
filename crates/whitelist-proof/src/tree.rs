//! Sorted-Pair Keccak Merkle Tree
//!
//! Builds the whitelist tree that the mint contract checks presale proofs
//! against.
//!
//! # Construction
//! - Leaves are `keccak256(address)` over the 20 raw address bytes, which is
//!   what the contract computes from `abi.encodePacked(msg.sender)`.
//! - Leaves are sorted ascending, so the root depends only on the set of
//!   addresses and not on the order they were listed in.
//! - Each parent is `keccak256(min(a, b) || max(a, b))`.
//! - A lone node at the end of a level is paired with itself.
//!
//! Because every pair is sorted before hashing, proofs carry no left/right
//! position bits and can be checked with [`verify`] by anyone who holds only
//! the root.

use crate::types::{Address, Hash, WhitelistError};
use alloy_primitives::{keccak256, Keccak256};
use tracing::debug;

/// Hash a whitelisted address into its leaf.
#[must_use]
pub fn leaf_hash(address: &Address) -> Hash {
    keccak256(address.as_slice())
}

/// Keccak-256 of two nodes, smaller one first.
#[must_use]
pub fn hash_pair(a: &Hash, b: &Hash) -> Hash {
    let (left, right) = if a <= b { (a, b) } else { (b, a) };
    let mut hasher = Keccak256::new();
    hasher.update(left.as_slice());
    hasher.update(right.as_slice());
    hasher.finalize()
}

/// Recompute the root from `leaf` and its sibling path and compare.
///
/// Proof elements are applied bottom to top. No tree instance is needed, so
/// this mirrors what the contract does on-chain.
#[must_use]
pub fn verify(root: &Hash, leaf: &Hash, proof: &[Hash]) -> bool {
    proof
        .iter()
        .fold(*leaf, |node, sibling| hash_pair(&node, sibling))
        == *root
}

/// Convenience wrapper over [`verify`] that hashes the address first.
#[must_use]
pub fn verify_address(root: &Hash, address: &Address, proof: &[Hash]) -> bool {
    verify(root, &leaf_hash(address), proof)
}

/// An immutable Merkle tree over whitelisted addresses.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhitelistTree {
    /// `layers[0]` holds the sorted leaves, the last layer holds only the root.
    layers: Vec<Vec<Hash>>,
    root: Hash,
}

impl WhitelistTree {
    /// Build the tree from a list of addresses.
    ///
    /// Duplicate addresses are kept as duplicate leaves.
    ///
    /// # Errors
    /// Returns `EmptyInput` if `addresses` is empty.
    pub fn build(addresses: &[Address]) -> Result<Self, WhitelistError> {
        if addresses.is_empty() {
            return Err(WhitelistError::EmptyInput);
        }

        let mut leaves: Vec<Hash> = addresses.iter().map(leaf_hash).collect();
        leaves.sort_unstable();

        let tree = Self::from_sorted_leaves(leaves);
        debug!(
            leaves = tree.len(),
            depth = tree.depth(),
            root = %tree.root,
            "Built whitelist tree"
        );
        Ok(tree)
    }

    /// Fold sorted, non-empty leaves upward to the root.
    fn from_sorted_leaves(leaves: Vec<Hash>) -> Self {
        let mut layers = vec![leaves];

        while let Some(level) = layers.last().filter(|level| level.len() > 1) {
            let next: Vec<Hash> = level
                .chunks(2)
                .map(|pair| {
                    let left = &pair[0];
                    let right = pair.get(1).unwrap_or(left);
                    hash_pair(left, right)
                })
                .collect();
            layers.push(next);
        }

        let root = layers
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or_default();

        Self { layers, root }
    }

    /// The root hash published to the contract.
    #[must_use]
    pub fn root(&self) -> Hash {
        self.root
    }

    /// Sorted leaf hashes.
    #[must_use]
    pub fn leaves(&self) -> &[Hash] {
        &self.layers[0]
    }

    /// Number of leaves, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.leaves().len()
    }

    /// Always false: an empty tree cannot be built.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.leaves().is_empty()
    }

    /// Number of hashing levels, which is also the length of every proof.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.layers.len() - 1
    }

    /// Whether `address` has a leaf in this tree.
    #[must_use]
    pub fn contains(&self, address: &Address) -> bool {
        self.leaf_index(&leaf_hash(address)).is_some()
    }

    fn leaf_index(&self, leaf: &Hash) -> Option<usize> {
        self.leaves().binary_search(leaf).ok()
    }

    /// Generate the inclusion proof for `address`, bottom to top.
    ///
    /// # Errors
    /// Returns `NotFound` if the address is not whitelisted.
    pub fn proof(&self, address: &Address) -> Result<Vec<Hash>, WhitelistError> {
        let index = self
            .leaf_index(&leaf_hash(address))
            .ok_or(WhitelistError::NotFound(*address))?;
        Ok(self.proof_at(index))
    }

    fn proof_at(&self, mut index: usize) -> Vec<Hash> {
        let mut proof = Vec::with_capacity(self.depth());

        for level in &self.layers[..self.depth()] {
            // A lone trailing node is its own sibling.
            let sibling = level.get(index ^ 1).unwrap_or(&level[index]);
            proof.push(*sibling);
            index /= 2;
        }

        proof
    }
}
