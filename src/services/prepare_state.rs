use crate::{
    error::{AppError, Result},
    integrations::bridge::{BridgeProvider, EverWallet, TransferProvider},
    models::{Address, PrepareState, PrepareStatus},
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{sleep, Duration};

const DEFAULT_POLL_ATTEMPTS: usize = 20;
const DEFAULT_POLL_INTERVAL_MS: u64 = 1_500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrepareOutcome {
    /// Transfer page, or another attempt is already pending.
    Skipped,
    Completed,
    Failed,
    TimedOut,
}

/// What the prepare step should offer the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PrepareAction {
    /// Wallet is still initializing; offer nothing.
    None,
    ConnectWallet { disabled: bool },
    Prepare { disabled: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrepareView {
    pub status: PrepareStatus,
    pub is_confirmed: bool,
    pub is_pending: bool,
    pub waiting_wallet: bool,
    pub is_transfer_page: bool,
    pub is_deploying: bool,
    pub network_label: Option<String>,
    pub tx_hash: Option<String>,
    pub action: PrepareAction,
}

/// Drives the "prepare Everscale → EVM" step of a transfer.
///
/// On a transfer page (the transfer already has an on-chain contract) the
/// machine is a read-through view of the transfer's own prepare state and never
/// starts a preparation. Otherwise it keeps a local status that moves
/// `disabled → pending → disabled`, with at most one attempt in flight.
pub struct PrepareStateMachine {
    bridge: Arc<dyn BridgeProvider>,
    transfer: Arc<dyn TransferProvider>,
    local: watch::Sender<PrepareStatus>,
    timeout: Option<Duration>,
    poll_attempts: usize,
    poll_interval: Duration,
}

impl PrepareStateMachine {
    pub fn new(bridge: Arc<dyn BridgeProvider>, transfer: Arc<dyn TransferProvider>) -> Self {
        let (local, _) = watch::channel(PrepareStatus::Disabled);
        Self {
            bridge,
            transfer,
            local,
            timeout: None,
            poll_attempts: DEFAULT_POLL_ATTEMPTS,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_polling(mut self, attempts: usize, interval: Duration) -> Self {
        self.poll_attempts = attempts.max(1);
        self.poll_interval = interval;
        self
    }

    /// Receives every change of the local status.
    pub fn subscribe(&self) -> watch::Receiver<PrepareStatus> {
        self.local.subscribe()
    }

    pub fn is_transfer_page(&self) -> bool {
        self.transfer
            .contract_address()
            .map(|address| Address::is_valid(&address))
            .unwrap_or(false)
    }

    pub fn local_status(&self) -> PrepareStatus {
        *self.local.borrow()
    }

    pub fn status(&self) -> PrepareStatus {
        self.status_for(self.is_transfer_page())
    }

    // Internal helper that supports `status_for` operations.
    fn status_for(&self, is_transfer_page: bool) -> PrepareStatus {
        if is_transfer_page {
            return self
                .transfer
                .prepare_state()
                .map(|state| state.status)
                .unwrap_or_default();
        }
        self.local_status()
    }

    // Internal helper that supports `active_wallet` operations.
    fn active_wallet(&self, is_transfer_page: bool) -> Arc<dyn EverWallet> {
        if is_transfer_page {
            self.transfer.ever_wallet()
        } else {
            self.bridge.ever_wallet()
        }
    }

    pub fn view(&self) -> PrepareView {
        let is_transfer_page = self.is_transfer_page();
        let status = self.status_for(is_transfer_page);
        let wallet = self.active_wallet(is_transfer_page).readiness();
        let left_network = if is_transfer_page {
            self.transfer.left_network()
        } else {
            self.bridge.left_network()
        };
        let tx_hash = self.transfer.contract_address();

        let is_confirmed = status == PrepareStatus::Confirmed;
        let is_pending = status == PrepareStatus::Pending;
        let waiting_wallet = !wallet.is_ready && !is_confirmed;

        let action = if wallet.is_initializing {
            PrepareAction::None
        } else if waiting_wallet {
            PrepareAction::ConnectWallet {
                disabled: wallet.is_connecting || wallet.is_connected,
            }
        } else {
            PrepareAction::Prepare {
                disabled: is_transfer_page || !wallet.is_ready || is_pending || is_confirmed,
            }
        };

        PrepareView {
            status,
            is_confirmed,
            is_pending,
            waiting_wallet,
            is_transfer_page,
            is_deploying: tx_hash.is_none() && is_pending,
            network_label: left_network.map(|network| network.label),
            tx_hash,
            action,
        }
    }

    /// Starts preparing the Everscale-side contract.
    ///
    /// # Returns
    /// * `PrepareOutcome::Skipped` on a transfer page or while an attempt is pending.
    /// * `Completed`, `Failed` or `TimedOut` otherwise; the local status is back
    ///   to `disabled` in every case so the action can be retried.
    pub async fn start_preparation(&self) -> PrepareOutcome {
        if self.is_transfer_page() {
            tracing::debug!("Prepare skipped: transfer already has a contract");
            return PrepareOutcome::Skipped;
        }

        // Check-and-set with no await in between.
        let started = self.local.send_if_modified(|status| {
            if *status == PrepareStatus::Pending {
                return false;
            }
            *status = PrepareStatus::Pending;
            true
        });
        if !started {
            tracing::debug!("Prepare skipped: another attempt is pending");
            return PrepareOutcome::Skipped;
        }

        let prepare = self.bridge.prepare_everscale_to_evm();
        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, prepare).await {
                Ok(result) => result.map(|_| PrepareOutcome::Completed),
                Err(_) => {
                    tracing::warn!("Everscale prepare timed out after {}ms", limit.as_millis());
                    Ok(PrepareOutcome::TimedOut)
                }
            },
            None => prepare.await.map(|_| PrepareOutcome::Completed),
        };

        self.local.send_replace(PrepareStatus::Disabled);

        match result {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!("Everscale prepare failed: {}", err);
                PrepareOutcome::Failed
            }
        }
    }

    /// Connects the active EVER wallet when the view is waiting for it.
    ///
    /// Returns whether a connection attempt was made.
    pub async fn connect_wallet(&self) -> Result<bool> {
        let view = self.view();
        if !matches!(view.action, PrepareAction::ConnectWallet { disabled: false }) {
            return Ok(false);
        }
        self.active_wallet(view.is_transfer_page).connect().await?;
        Ok(true)
    }

    /// Polls the transfer until it reports a confirmed prepare state.
    pub async fn wait_for_confirmation(&self) -> Result<PrepareState> {
        for attempt in 0..self.poll_attempts {
            if let Some(state) = self.confirmed_state() {
                return Ok(state);
            }
            if attempt + 1 < self.poll_attempts {
                sleep(self.poll_interval).await;
            }
        }

        Err(AppError::BlockchainRPC(format!(
            "transfer contract not confirmed after {} polls",
            self.poll_attempts
        )))
    }

    // Internal helper that supports `confirmed_state` operations.
    fn confirmed_state(&self) -> Option<PrepareState> {
        let reported = self.transfer.prepare_state().unwrap_or_default();
        let contract_address = reported.contract_address.clone().or_else(|| {
            self.transfer
                .contract_address()
                .and_then(|raw| Address::parse(&raw).ok())
        });

        match contract_address {
            Some(address) => Some(PrepareState::confirmed(address)),
            None if reported.is_confirmed() => Some(reported),
            None => None,
        }
    }
}
