//! Mint Submitter
//!
//! Sends `mint(proof, amount)` from the service wallet after the sale rules
//! allow it.

use crate::contract::{ContractReader, MoonMint};
use crate::state::{AppState, MintRecord, MintStatus};
use alloy::{
    network::EthereumWallet,
    primitives::{Address, U256},
    providers::{Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
};
use anyhow::{Context, Result};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use whitelist_proof::{plan_mint, MintContext, MintRejection};

/// Errors from a mint attempt
#[derive(Debug, Error)]
pub enum MintError {
    /// Refused by the sale rules, nothing was sent
    #[error(transparent)]
    Rejected(#[from] MintRejection),

    /// RPC or transaction failure
    #[error(transparent)]
    Chain(#[from] anyhow::Error),
}

/// Minter configuration
#[derive(Debug, Clone)]
pub struct MinterConfig {
    /// Private key for signing transactions (hex, with or without 0x prefix)
    pub private_key: String,
    /// Max gas price in Gwei
    pub max_gas_price_gwei: u64,
    /// Wait for confirmations (0 = don't wait)
    pub confirmations: u64,
}

/// Transaction submitter for mints
pub struct Minter {
    config: MinterConfig,
    reader: ContractReader,
    signer: PrivateKeySigner,
    state: AppState,
    /// Held from the chain reads through the receipt, one mint at a time
    in_flight: Mutex<()>,
}

impl Minter {
    /// Create a minter signing with the configured key
    pub fn new(config: MinterConfig, reader: ContractReader, state: AppState) -> Result<Self> {
        let key_bytes = config
            .private_key
            .strip_prefix("0x")
            .unwrap_or(&config.private_key);
        let signer: PrivateKeySigner = key_bytes.parse().context("Invalid private key")?;

        info!(
            address = %signer.address(),
            "Minter initialized with signer"
        );

        Ok(Self {
            config,
            reader,
            signer,
            state,
            in_flight: Mutex::new(()),
        })
    }

    /// Address the mints are sent from
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Check the sale rules and send a mint for `amount` tokens
    ///
    /// Concurrent calls queue up, so each one plans against the chain state
    /// left by the previous mint.
    ///
    /// # Errors
    /// Returns `Rejected` if the sale rules refuse the mint, or `Chain` if:
    /// - contract state cannot be read
    /// - gas price exceeds configured maximum
    /// - transaction fails to send
    #[instrument(skip(self), fields(wallet = %self.address()))]
    pub async fn mint(&self, amount: u64) -> Result<MintRecord, MintError> {
        let _guard = self.in_flight.lock().await;
        let wallet = self.address();

        let snapshot = self.reader.snapshot().await?;
        self.state.set_snapshot(snapshot.clone());

        let context = MintContext {
            sale_state: snapshot.sale_state,
            wallet,
            wallet_minted: self.reader.wallet_minted(wallet).await?,
            total_minted: snapshot.total_minted,
            balance: self.reader.balance(wallet).await?,
        };

        let plan = match plan_mint(self.state.tree(), &snapshot.terms(), &context, amount) {
            Ok(plan) => plan,
            Err(rejection) => {
                warn!(%rejection, "Mint refused");
                metrics::counter!("mint_submissions_total", "outcome" => "rejected").increment(1);
                return Err(rejection.into());
            }
        };

        // Build provider with wallet
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(self.signer.clone()))
            .connect_http(self.reader.rpc_url().clone());

        // Check current gas price
        let gas_price = provider.get_gas_price().await.context("Failed to get gas price")?;
        let max_gas_price_wei =
            U256::from(self.config.max_gas_price_gwei) * U256::from(1_000_000_000);
        if U256::from(gas_price) > max_gas_price_wei {
            return Err(anyhow::anyhow!(
                "Gas price {} gwei exceeds maximum {} gwei",
                gas_price / 1_000_000_000,
                self.config.max_gas_price_gwei
            )
            .into());
        }

        let contract = MoonMint::new(self.reader.contract_address(), &provider);

        info!(
            phase = ?plan.phase,
            amount = plan.amount,
            value = %plan.value,
            proof_len = plan.proof.len(),
            "Submitting mint"
        );

        let pending_tx = contract
            .mint(plan.proof.clone(), U256::from(plan.amount))
            .value(plan.value)
            .send()
            .await
            .context("Failed to send transaction")?;
        let tx_hash = *pending_tx.tx_hash();

        info!(tx_hash = %tx_hash, "Transaction submitted");
        metrics::counter!("mint_submissions_total", "outcome" => "submitted").increment(1);

        let mut record = MintRecord {
            tx_hash,
            wallet,
            phase: plan.phase,
            amount: plan.amount,
            value: plan.value,
            status: MintStatus::Submitted,
            error: None,
        };
        self.state.upsert_mint(record.clone());

        // Wait for confirmations if configured
        if self.config.confirmations > 0 {
            debug!(
                confirmations = self.config.confirmations,
                "Waiting for confirmations"
            );
            match pending_tx
                .with_required_confirmations(self.config.confirmations)
                .get_receipt()
                .await
            {
                Ok(receipt) if receipt.status() => {
                    info!(
                        tx_hash = %tx_hash,
                        gas_used = receipt.gas_used,
                        "Mint confirmed"
                    );
                    record.status = MintStatus::Confirmed;
                }
                Ok(_) => {
                    warn!(tx_hash = %tx_hash, "Mint reverted");
                    record.status = MintStatus::Failed;
                    record.error = Some("Transaction reverted".to_string());
                }
                Err(e) => {
                    warn!(tx_hash = %tx_hash, error = %e, "Failed to get receipt");
                    record.status = MintStatus::Failed;
                    record.error = Some(e.to_string());
                }
            }
            self.state.upsert_mint(record.clone());
        }

        Ok(record)
    }
}
