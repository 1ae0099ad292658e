//! Shared Application State
//!
//! Thread-safe state for the whitelist tree, the latest sale snapshot and
//! submitted mints.

use crate::contract::{wei_string, SaleSnapshot};
use alloy::primitives::{Address, B256, U256};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use whitelist_proof::{SalePhase, WhitelistTree};

/// Status of a mint transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MintStatus {
    /// Transaction sent
    Submitted,
    /// Transaction mined with success status
    Confirmed,
    /// Transaction reverted or receipt lookup failed
    Failed,
}

/// Record for a mint sent by this service
#[derive(Debug, Clone, Serialize)]
pub struct MintRecord {
    /// Transaction hash
    pub tx_hash: B256,
    /// Sending wallet
    pub wallet: Address,
    /// Phase the mint was planned for
    pub phase: SalePhase,
    /// Tokens requested
    pub amount: u64,
    /// Wei attached
    #[serde(with = "wei_string")]
    pub value: U256,
    /// Current status
    pub status: MintStatus,
    /// Error message if failed
    pub error: Option<String>,
}

/// Shared application state
#[derive(Debug, Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

#[derive(Debug)]
struct AppStateInner {
    /// Whitelist tree, built once at startup
    tree: Arc<WhitelistTree>,
    /// Latest contract snapshot
    snapshot: RwLock<Option<SaleSnapshot>>,
    /// When the snapshot was last refreshed
    last_sync: RwLock<Option<Instant>>,
    /// Oldest acceptable snapshot; `None` when no contract is watched
    max_sync_age: Option<Duration>,
    /// Submitted mints by transaction hash
    mints: DashMap<B256, MintRecord>,
    /// Service start time
    start_time: Instant,
    /// Last error message
    last_error: RwLock<Option<String>>,
}

impl AppState {
    /// Create new application state around a built tree.
    #[must_use]
    pub fn new(tree: Arc<WhitelistTree>, max_sync_age: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                tree,
                snapshot: RwLock::new(None),
                last_sync: RwLock::new(None),
                max_sync_age,
                mints: DashMap::new(),
                start_time: Instant::now(),
                last_error: RwLock::new(None),
            }),
        }
    }

    /// The whitelist tree
    #[must_use]
    pub fn tree(&self) -> &WhitelistTree {
        &self.inner.tree
    }

    /// Store a fresh contract snapshot, clearing any earlier read error
    pub fn set_snapshot(&self, snapshot: SaleSnapshot) {
        *self.inner.snapshot.write() = Some(snapshot);
        *self.inner.last_sync.write() = Some(Instant::now());
        *self.inner.last_error.write() = None;
    }

    /// Latest contract snapshot, if any poll has succeeded
    #[must_use]
    pub fn snapshot(&self) -> Option<SaleSnapshot> {
        self.inner.snapshot.read().clone()
    }

    /// Current sale phase from the latest snapshot
    #[must_use]
    pub fn phase(&self) -> Option<SalePhase> {
        self.inner.snapshot.read().as_ref().and_then(SaleSnapshot::phase)
    }

    /// Seconds since the last successful poll
    #[must_use]
    pub fn sync_age_secs(&self) -> Option<u64> {
        let last_sync = *self.inner.last_sync.read();
        last_sync.map(|synced| synced.elapsed().as_secs())
    }

    /// Check if the snapshot is fresh enough (always true without a contract)
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        let Some(max_age) = self.inner.max_sync_age else {
            return true;
        };
        let last_sync = *self.inner.last_sync.read();
        last_sync.is_some_and(|synced| synced.elapsed() <= max_age)
    }

    /// Get uptime in seconds
    #[must_use]
    pub fn uptime_secs(&self) -> u64 {
        self.inner.start_time.elapsed().as_secs()
    }

    /// Add or update a mint record
    pub fn upsert_mint(&self, record: MintRecord) {
        self.inner.mints.insert(record.tx_hash, record);
    }

    /// Get mint by transaction hash
    #[must_use]
    pub fn get_mint(&self, tx_hash: &B256) -> Option<MintRecord> {
        self.inner.mints.get(tx_hash).map(|r| r.clone())
    }

    /// Get all mints
    #[must_use]
    pub fn all_mints(&self) -> Vec<MintRecord> {
        self.inner
            .mints
            .iter()
            .map(|r| r.value().clone())
            .collect()
    }

    /// Get mint counts by status
    #[must_use]
    pub fn status_counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for entry in self.inner.mints.iter() {
            match entry.status {
                MintStatus::Submitted => counts.submitted += 1,
                MintStatus::Confirmed => counts.confirmed += 1,
                MintStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }

    /// Set last error
    pub fn set_error(&self, error: Option<String>) {
        *self.inner.last_error.write() = error;
    }

    /// Get last error
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.inner.last_error.read().clone()
    }
}

/// Counts of mints by status
#[derive(Debug, Default, Clone, Serialize)]
pub struct StatusCounts {
    pub submitted: usize,
    pub confirmed: usize,
    pub failed: usize,
}
