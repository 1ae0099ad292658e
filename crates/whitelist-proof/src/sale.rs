//! Sale Phase Gating
//!
//! Decides whether a wallet may mint right now, and with which proof and
//! payment, from contract state read elsewhere. Nothing here touches the
//! network.

use crate::tree::WhitelistTree;
use crate::types::{Address, Hash, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum tokens a wallet may mint during presale.
pub const PRESALE_WALLET_LIMIT: u64 = 2;

/// Maximum tokens per mint transaction.
pub const MAX_MINT_PER_TX: u64 = 2;

/// Collection size.
pub const MAX_SUPPLY: u64 = 569;

/// Active minting phase.
///
/// The contract exposes `saleState` as a raw integer: `0` means the sale has
/// not started, `1` is presale, anything above is the public sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalePhase {
    /// Whitelisted wallets only, proof required.
    Presale,
    /// Open to everyone, no proof.
    PublicSale,
}

impl SalePhase {
    /// Raw `saleState` value before any minting is open.
    pub const NOT_STARTED: u8 = 0;

    /// Raw `saleState` value for the presale.
    pub const PRESALE: u8 = 1;

    /// Map the contract's raw sale state, `None` while the sale is closed.
    #[must_use]
    pub const fn from_sale_state(raw: u8) -> Option<Self> {
        match raw {
            Self::NOT_STARTED => None,
            Self::PRESALE => Some(Self::Presale),
            _ => Some(Self::PublicSale),
        }
    }

    /// Whether minting in this phase needs a whitelist proof.
    #[must_use]
    pub const fn requires_proof(self) -> bool {
        matches!(self, Self::Presale)
    }
}

/// Prices and limits of the sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleTerms {
    /// Presale price per token in wei
    pub presale_price: U256,
    /// Public sale price per token in wei
    pub public_price: U256,
    /// Tokens a wallet may hold from presale mints
    pub presale_wallet_limit: u64,
    /// Tokens per transaction
    pub max_per_tx: u64,
    /// Total collection size
    pub max_supply: u64,
}

impl SaleTerms {
    /// Terms with the given prices and the collection's default limits.
    #[must_use]
    pub const fn new(presale_price: U256, public_price: U256) -> Self {
        Self {
            presale_price,
            public_price,
            presale_wallet_limit: PRESALE_WALLET_LIMIT,
            max_per_tx: MAX_MINT_PER_TX,
            max_supply: MAX_SUPPLY,
        }
    }

    /// Unit price for `phase`.
    #[must_use]
    pub const fn price(&self, phase: SalePhase) -> U256 {
        match phase {
            SalePhase::Presale => self.presale_price,
            SalePhase::PublicSale => self.public_price,
        }
    }
}

/// Chain state observed for one mint attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintContext {
    /// Raw `saleState` from the contract
    pub sale_state: u8,
    /// Wallet that will send the mint
    pub wallet: Address,
    /// Tokens this wallet has already minted
    pub wallet_minted: u64,
    /// Tokens minted across all wallets
    pub total_minted: u64,
    /// Wallet balance in wei
    pub balance: U256,
}

/// An allowed mint: the exact arguments for `mint(proof, amount)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MintPlan {
    pub phase: SalePhase,
    pub amount: u64,
    /// Whitelist proof, empty during the public sale
    pub proof: Vec<Hash>,
    /// Wei to attach to the transaction
    pub value: U256,
}

/// Reasons a mint is refused before any transaction is sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MintRejection {
    #[error("Mint amount {amount} must be between 1 and {max}")]
    InvalidAmount { amount: u64, max: u64 },

    #[error("Sale is not started")]
    SaleNotStarted,

    #[error("Exceeds max supply: {total_minted} of {max_supply} minted, {requested} requested")]
    SoldOut {
        total_minted: u64,
        requested: u64,
        max_supply: u64,
    },

    #[error("Address {0} is not a whitelist member")]
    NotWhitelisted(Address),

    #[error("Exceeds max amount in presale: {already_minted} minted, {requested} requested, limit {limit}")]
    ExceedsPresaleLimit {
        already_minted: u64,
        requested: u64,
        limit: u64,
    },

    #[error("Insufficient funds: {required} wei required, balance {available} wei")]
    InsufficientFunds { required: U256, available: U256 },
}

/// Check a mint attempt against the sale rules and build its transaction plan.
///
/// During presale the proof comes from `tree`; an address without a leaf is
/// refused with `NotWhitelisted`. During the public sale the proof is empty.
///
/// # Errors
/// Returns the first rule the attempt breaks.
pub fn plan_mint(
    tree: &WhitelistTree,
    terms: &SaleTerms,
    context: &MintContext,
    amount: u64,
) -> Result<MintPlan, MintRejection> {
    if amount == 0 || amount > terms.max_per_tx {
        return Err(MintRejection::InvalidAmount {
            amount,
            max: terms.max_per_tx,
        });
    }

    let phase =
        SalePhase::from_sale_state(context.sale_state).ok_or(MintRejection::SaleNotStarted)?;

    if context.total_minted.saturating_add(amount) > terms.max_supply {
        return Err(MintRejection::SoldOut {
            total_minted: context.total_minted,
            requested: amount,
            max_supply: terms.max_supply,
        });
    }

    let proof = if phase.requires_proof() {
        // `proof` only fails for addresses without a leaf.
        let proof = tree
            .proof(&context.wallet)
            .map_err(|_| MintRejection::NotWhitelisted(context.wallet))?;

        if context.wallet_minted.saturating_add(amount) > terms.presale_wallet_limit {
            return Err(MintRejection::ExceedsPresaleLimit {
                already_minted: context.wallet_minted,
                requested: amount,
                limit: terms.presale_wallet_limit,
            });
        }
        proof
    } else {
        Vec::new()
    };

    let value = terms.price(phase).saturating_mul(U256::from(amount));
    if context.balance < value {
        return Err(MintRejection::InsufficientFunds {
            required: value,
            available: context.balance,
        });
    }

    Ok(MintPlan {
        phase,
        amount,
        proof,
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::verify_address;

    const GWEI: u64 = 1_000_000_000;

    fn member() -> Address {
        Address::repeat_byte(0x11)
    }

    fn outsider() -> Address {
        Address::repeat_byte(0x99)
    }

    fn tree() -> WhitelistTree {
        WhitelistTree::build(&[
            member(),
            Address::repeat_byte(0x22),
            Address::repeat_byte(0x33),
        ])
        .unwrap()
    }

    fn terms() -> SaleTerms {
        SaleTerms::new(U256::from(50 * GWEI), U256::from(80 * GWEI))
    }

    fn context(sale_state: u8, wallet: Address) -> MintContext {
        MintContext {
            sale_state,
            wallet,
            wallet_minted: 0,
            total_minted: 100,
            balance: U256::from(1_000 * GWEI),
        }
    }

    #[test]
    fn test_phase_from_sale_state() {
        assert_eq!(SalePhase::from_sale_state(0), None);
        assert_eq!(SalePhase::from_sale_state(1), Some(SalePhase::Presale));
        assert_eq!(SalePhase::from_sale_state(2), Some(SalePhase::PublicSale));
        assert_eq!(SalePhase::from_sale_state(7), Some(SalePhase::PublicSale));
    }

    #[test]
    fn test_only_presale_requires_proof() {
        assert!(SalePhase::Presale.requires_proof());
        assert!(!SalePhase::PublicSale.requires_proof());
    }

    #[test]
    fn test_phase_serde() {
        let json = serde_json::to_string(&SalePhase::PublicSale).unwrap();
        assert_eq!(json, "\"public_sale\"");
    }

    #[test]
    fn test_presale_member_gets_proof() {
        let tree = tree();
        let plan = plan_mint(&tree, &terms(), &context(1, member()), 2).unwrap();

        assert_eq!(plan.phase, SalePhase::Presale);
        assert_eq!(plan.value, U256::from(100 * GWEI));
        assert!(verify_address(&tree.root(), &member(), &plan.proof));
    }

    #[test]
    fn test_presale_outsider_rejected() {
        let err = plan_mint(&tree(), &terms(), &context(1, outsider()), 1).unwrap_err();
        assert_eq!(err, MintRejection::NotWhitelisted(outsider()));
    }

    #[test]
    fn test_presale_wallet_limit() {
        let mut ctx = context(1, member());
        ctx.wallet_minted = 1;

        assert!(plan_mint(&tree(), &terms(), &ctx, 1).is_ok());
        let err = plan_mint(&tree(), &terms(), &ctx, 2).unwrap_err();
        assert!(matches!(err, MintRejection::ExceedsPresaleLimit { limit: 2, .. }));
    }

    #[test]
    fn test_public_sale_needs_no_proof() {
        let plan = plan_mint(&tree(), &terms(), &context(2, outsider()), 2).unwrap();
        assert_eq!(plan.phase, SalePhase::PublicSale);
        assert!(plan.proof.is_empty());
        assert_eq!(plan.value, U256::from(160 * GWEI));
    }

    #[test]
    fn test_public_sale_ignores_presale_limit() {
        let mut ctx = context(2, member());
        ctx.wallet_minted = 10;
        assert!(plan_mint(&tree(), &terms(), &ctx, 2).is_ok());
    }

    #[test]
    fn test_sale_not_started() {
        let err = plan_mint(&tree(), &terms(), &context(0, member()), 1).unwrap_err();
        assert_eq!(err, MintRejection::SaleNotStarted);
    }

    #[test]
    fn test_invalid_amounts() {
        for amount in [0, 3] {
            let err = plan_mint(&tree(), &terms(), &context(2, member()), amount).unwrap_err();
            assert_eq!(err, MintRejection::InvalidAmount { amount, max: 2 });
        }
    }

    #[test]
    fn test_sold_out() {
        let mut ctx = context(2, member());
        ctx.total_minted = MAX_SUPPLY - 1;

        assert!(plan_mint(&tree(), &terms(), &ctx, 1).is_ok());
        let err = plan_mint(&tree(), &terms(), &ctx, 2).unwrap_err();
        assert!(matches!(err, MintRejection::SoldOut { .. }));
    }

    #[test]
    fn test_insufficient_funds() {
        let mut ctx = context(1, member());
        ctx.balance = U256::from(99 * GWEI);

        let err = plan_mint(&tree(), &terms(), &ctx, 2).unwrap_err();
        assert_eq!(
            err,
            MintRejection::InsufficientFunds {
                required: U256::from(100 * GWEI),
                available: U256::from(99 * GWEI),
            }
        );
    }

    #[test]
    fn test_price_overflow_is_unaffordable() {
        let terms = SaleTerms::new(U256::MAX, U256::MAX);
        let err = plan_mint(&tree(), &terms, &context(2, member()), 2).unwrap_err();
        assert_eq!(
            err,
            MintRejection::InsufficientFunds {
                required: U256::MAX,
                available: U256::from(1_000 * GWEI),
            }
        );
    }
}
