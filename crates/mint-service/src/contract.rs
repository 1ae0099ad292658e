//! Mint Contract Reader
//!
//! Read-only access to the sale state of the deployed NFT contract.

use alloy::{
    primitives::{Address, U256},
    providers::{Provider, ProviderBuilder},
    sol,
};
use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, instrument};
use whitelist_proof::{SalePhase, SaleTerms};

// Generate contract bindings from ABI
sol! {
    #[sol(rpc)]
    contract MoonMint {
        function totalMinted() external view returns (uint256);
        function saleState() external view returns (uint8);
        function PRESALE_PRICE() external view returns (uint256);
        function PUBSALE_PRICE() external view returns (uint256);
        function minted(address owner) external view returns (uint256);
        function mint(bytes32[] calldata proof, uint256 amount) external payable;
    }
}

/// Sale state read from the contract in one poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleSnapshot {
    /// Raw `saleState` value
    pub sale_state: u8,
    /// Tokens minted so far
    pub total_minted: u64,
    /// Presale price per token in wei
    #[serde(with = "wei_string")]
    pub presale_price: U256,
    /// Public sale price per token in wei
    #[serde(with = "wei_string")]
    pub public_price: U256,
}

impl SaleSnapshot {
    /// Current phase, `None` before the sale opens.
    #[must_use]
    pub fn phase(&self) -> Option<SalePhase> {
        SalePhase::from_sale_state(self.sale_state)
    }

    /// Prices from this snapshot with the collection limits.
    #[must_use]
    pub fn terms(&self) -> SaleTerms {
        SaleTerms::new(self.presale_price, self.public_price)
    }
}

/// Read-only contract client
#[derive(Debug, Clone)]
pub struct ContractReader {
    rpc_url: reqwest::Url,
    contract_address: Address,
}

impl ContractReader {
    /// Create a reader for the contract at `contract_address`.
    ///
    /// # Errors
    /// Returns an error if the RPC URL or contract address cannot be parsed.
    pub fn new(rpc_url: &str, contract_address: &str) -> Result<Self> {
        let rpc_url: reqwest::Url = rpc_url.parse().context("Invalid RPC URL")?;
        let contract_address: Address = contract_address
            .parse()
            .context("Invalid contract address")?;

        Ok(Self {
            rpc_url,
            contract_address,
        })
    }

    #[must_use]
    pub fn contract_address(&self) -> Address {
        self.contract_address
    }

    #[must_use]
    pub fn rpc_url(&self) -> &reqwest::Url {
        &self.rpc_url
    }

    /// Fetch sale state, total minted and both prices.
    #[instrument(skip(self))]
    pub async fn snapshot(&self) -> Result<SaleSnapshot> {
        let provider = ProviderBuilder::new().connect_http(self.rpc_url.clone());
        let contract = MoonMint::new(self.contract_address, &provider);

        let sale_state: u8 = contract
            .saleState()
            .call()
            .await
            .context("saleState() call failed")?;
        let total_minted: U256 = contract
            .totalMinted()
            .call()
            .await
            .context("totalMinted() call failed")?;
        let presale_price: U256 = contract
            .PRESALE_PRICE()
            .call()
            .await
            .context("PRESALE_PRICE() call failed")?;
        let public_price: U256 = contract
            .PUBSALE_PRICE()
            .call()
            .await
            .context("PUBSALE_PRICE() call failed")?;

        let snapshot = SaleSnapshot {
            sale_state,
            total_minted: total_minted.saturating_to(),
            presale_price,
            public_price,
        };
        debug!(?snapshot, "Read sale snapshot");
        Ok(snapshot)
    }

    /// Tokens already minted by `wallet`.
    #[instrument(skip(self))]
    pub async fn wallet_minted(&self, wallet: Address) -> Result<u64> {
        let provider = ProviderBuilder::new().connect_http(self.rpc_url.clone());
        let contract = MoonMint::new(self.contract_address, &provider);

        let minted: U256 = contract
            .minted(wallet)
            .call()
            .await
            .context("minted() call failed")?;
        Ok(minted.saturating_to())
    }

    /// Native balance of `wallet` in wei.
    #[instrument(skip(self))]
    pub async fn balance(&self, wallet: Address) -> Result<U256> {
        let provider = ProviderBuilder::new().connect_http(self.rpc_url.clone());
        provider
            .get_balance(wallet)
            .await
            .context("eth_getBalance failed")
    }
}

/// Wei amounts as decimal strings, since JSON numbers cannot hold a `uint256`.
pub(crate) mod wei_string {
    use alloy::primitives::U256;
    use serde::Serializer;

    pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }
}
