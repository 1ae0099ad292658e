//! # Whitelist Proof Library
//!
//! Core logic for presale whitelist mints:
//! - a sorted-pair Keccak Merkle tree over whitelisted addresses
//! - inclusion proofs and root-only verification
//! - sale phase gating that turns contract state into a mint plan

pub mod sale;
pub mod tree;
pub mod types;
pub mod whitelist;

pub use sale::{plan_mint, MintContext, MintPlan, MintRejection, SalePhase, SaleTerms};
pub use tree::{hash_pair, leaf_hash, verify, verify_address, WhitelistTree};
pub use types::*;
pub use whitelist::{Whitelist, WhitelistLoadError};
