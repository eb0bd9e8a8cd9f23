use crate::{
    config::Config,
    constants::{
        ABI_TOKEN_ROOT, ABI_TOKEN_WALLET, ANSWER_ID, METHOD_BALANCE, METHOD_DECIMALS,
        METHOD_GET_DETAILS, METHOD_GET_WALLET_ADDRESS, METHOD_SYMBOL,
        WALLET_PUBLIC_KEY_PLACEHOLDER,
    },
    error::{AppError, Result},
    models::{Address, CustomToken, TokenDetails},
    rpc::{ContractCall, ContractRpc, ContractState, JrpcClient},
};
use std::sync::Arc;

use super::state_cache::{ContractStateCache, StateCache};
use super::token_codec::{
    decode_address, decode_base64_text, decode_decimals, decode_string, decode_token_details,
    decode_uint_text, named_or_value0, value0,
};

/// Which token wallet a balance read targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceRequest {
    /// The token wallet address is already known.
    Direct { wallet: String },
    /// Derive the wallet of `owner` from the token `root` first.
    ByOwner { root: String, owner: String },
}

impl BalanceRequest {
    pub fn direct(wallet: impl Into<String>) -> Self {
        Self::Direct {
            wallet: wallet.into(),
        }
    }

    pub fn by_owner(root: impl Into<String>, owner: impl Into<String>) -> Self {
        Self::ByOwner {
            root: root.into(),
            owner: owner.into(),
        }
    }
}

/// TIP-3 token wallet reader: wallet derivation, balances and root metadata.
///
/// Contract states are never kept between calls. Wallet addresses are derived
/// deterministically and stay cached for the life of the reader.
pub struct TokenWallet {
    rpc: Arc<dyn ContractRpc>,
    wallet_addresses: StateCache<(Address, Address), Address>,
    trace: bool,
}

impl TokenWallet {
    pub fn new(rpc: Arc<dyn ContractRpc>) -> Self {
        Self {
            rpc,
            wallet_addresses: StateCache::new(),
            trace: true,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = JrpcClient::from_config(config)?;
        Ok(Self::new(Arc::new(client)).with_trace(config.token_wallet_trace))
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub async fn cached_wallet_addresses(&self) -> usize {
        self.wallet_addresses.len().await
    }

    /// Returns the snapshot of `address` held by `states`, fetching it on first use.
    ///
    /// `states` lives for one logical operation, so sequential reads of the same
    /// contract share a single fetch.
    pub async fn full_state(
        &self,
        states: &ContractStateCache,
        address: &Address,
    ) -> Result<Option<Arc<ContractState>>> {
        let rpc = &self.rpc;
        states
            .get_or_fetch(address, move || rpc.get_full_contract_state(address))
            .await
    }

    // Internal helper that supports `fetch_state` operations.
    async fn fetch_state(&self, address: &Address) -> Result<Option<ContractState>> {
        self.rpc.get_full_contract_state(address).await
    }

    /// Derives the token wallet address of `owner` for the token `root`.
    ///
    /// # Arguments
    /// * `state` - optional snapshot of `root` to run the getter against.
    ///
    /// # Returns
    /// * `Ok(Address)` of the deterministic wallet; cached per `(root, owner)`.
    /// * `Err(AppError::InvalidAddress)` before any call when an input is malformed.
    pub async fn wallet_address(
        &self,
        root: &str,
        owner: &str,
        state: Option<&ContractState>,
    ) -> Result<Address> {
        let root = Address::parse(root)?;
        let owner = Address::parse(owner)?;
        let key = (root.clone(), owner.clone());
        let (root, owner) = (&root, &owner);

        let resolved = self
            .wallet_addresses
            .get_or_fetch(&key, move || async move {
                let call = ContractCall::new(
                    ABI_TOKEN_ROOT,
                    METHOD_GET_WALLET_ADDRESS,
                    serde_json::json!({
                        "owner_address_": owner.as_str(),
                        "wallet_public_key_": WALLET_PUBLIC_KEY_PLACEHOLDER,
                        "_answer_id": ANSWER_ID,
                    }),
                );
                let output = self.rpc.run_local(root, call, state).await?;
                let wallet = decode_address(
                    value0(&output, METHOD_GET_WALLET_ADDRESS)?,
                    "getWalletAddress.value0",
                )?;

                if self.trace {
                    tracing::debug!(
                        "Token Wallet: request wallet {} address in token {}, found {}",
                        owner,
                        root,
                        wallet
                    );
                }
                Ok(Some(wallet))
            })
            .await?;

        resolved
            .map(|wallet| wallet.as_ref().clone())
            .ok_or_else(|| AppError::Internal("wallet address resolution yielded nothing".into()))
    }

    /// Reads the raw token balance of a wallet as decimal text.
    ///
    /// # Arguments
    /// * `request` - the wallet itself, or a `(root, owner)` pair to derive it from.
    /// * `state` - optional snapshot of the token wallet (not the root).
    ///
    /// # Returns
    /// * `Ok(String)` with the balance exactly as the contract reports it.
    /// * `Err(AppError::NotDeployed)` when the wallet has no deployed state.
    pub async fn balance(
        &self,
        request: &BalanceRequest,
        state: Option<&ContractState>,
    ) -> Result<String> {
        let wallet = match request {
            BalanceRequest::Direct { wallet } => Address::parse(wallet)?,
            BalanceRequest::ByOwner { root, owner } => {
                Address::parse(root)?;
                Address::parse(owner)?;
                self.wallet_address(root, owner, None).await?
            }
        };

        let fresh = match state {
            Some(_) => None,
            None => self.fetch_state(&wallet).await?,
        };
        let state = match (state, fresh.as_ref()) {
            (Some(state), _) | (None, Some(state)) => state,
            (None, None) => {
                return Err(AppError::NotDeployed(format!(
                    "token wallet {wallet} has no state"
                )))
            }
        };
        if !state.is_deployed {
            return Err(AppError::NotDeployed(format!(
                "token wallet {wallet} is not deployed"
            )));
        }

        let call = ContractCall::new(
            ABI_TOKEN_WALLET,
            METHOD_BALANCE,
            serde_json::json!({ "_answer_id": ANSWER_ID }),
        );
        let output = self.rpc.run_local(&wallet, call, Some(state)).await?;
        let balance = decode_uint_text(value0(&output, METHOD_BALANCE)?, "balance.value0")?;

        if self.trace {
            tracing::debug!(
                "Token Wallet: request token wallet {} balance, result {}",
                wallet,
                balance
            );
        }
        Ok(balance)
    }

    pub async fn get_details(
        &self,
        root: &Address,
        state: Option<&ContractState>,
    ) -> Result<TokenDetails> {
        let call = ContractCall::new(
            ABI_TOKEN_ROOT,
            METHOD_GET_DETAILS,
            serde_json::json!({ "_answer_id": ANSWER_ID }),
        );
        let output = self.rpc.run_local(root, call, state).await?;
        decode_token_details(value0(&output, METHOD_GET_DETAILS)?)
    }

    /// Reads root metadata for `root` against a freshly fetched state.
    ///
    /// # Returns
    /// * `Ok(None)` when the root has no state or is not deployed.
    /// * `Err(AppError::Decode)` when the details payload is malformed.
    pub async fn token_data(&self, root: &str) -> Result<Option<CustomToken>> {
        let address = Address::parse(root)?;

        let Some(state) = self.fetch_state(&address).await? else {
            return Ok(None);
        };
        if !state.is_deployed {
            return Ok(None);
        }

        let details = self.get_details(&address, Some(&state)).await?;
        Ok(Some(CustomToken::from_details(address, details)))
    }

    /// Reads root metadata together with the wallet and balance of `owner`.
    ///
    /// The root state is fetched once and shared by the details read and the
    /// wallet derivation. An owner wallet without deployed state yields a token
    /// with no balance rather than an error.
    ///
    /// # Returns
    /// * `Ok(None)` when the root has no state or is not deployed.
    pub async fn token_with_balance(&self, root: &str, owner: &str) -> Result<Option<CustomToken>> {
        let root_address = Address::parse(root)?;
        Address::parse(owner)?;

        let states = ContractStateCache::new();
        let Some(root_state) = self.full_state(&states, &root_address).await? else {
            return Ok(None);
        };
        if !root_state.is_deployed {
            return Ok(None);
        }

        let (details, owner_balance) = futures_util::join!(
            self.get_details(&root_address, Some(root_state.as_ref())),
            self.owner_balance(&states, root, owner, &root_state)
        );
        let mut token = CustomToken::from_details(root_address, details?);

        token.begin_wallet_update();
        token.begin_update();
        let (wallet, balance) = owner_balance?;
        token.finish_wallet_update(Some(wallet));
        token.finish_update(balance);

        Ok(Some(token))
    }

    // Internal helper that supports `owner_balance` operations.
    async fn owner_balance(
        &self,
        states: &ContractStateCache,
        root: &str,
        owner: &str,
        root_state: &ContractState,
    ) -> Result<(Address, Option<String>)> {
        let wallet = self.wallet_address(root, owner, Some(root_state)).await?;
        let Some(state) = self.full_state(states, &wallet).await? else {
            return Ok((wallet, None));
        };

        let request = BalanceRequest::direct(wallet.as_str());
        match self.balance(&request, Some(state.as_ref())).await {
            Ok(balance) => Ok((wallet, Some(balance))),
            Err(AppError::NotDeployed(reason)) => {
                tracing::debug!("Token balance unavailable: {}", reason);
                Ok((wallet, None))
            }
            Err(err) => Err(err),
        }
    }

    pub async fn decimals(&self, root: &str, state: Option<&ContractState>) -> Result<u8> {
        let root = Address::parse(root)?;
        let call = ContractCall::new(ABI_TOKEN_ROOT, METHOD_DECIMALS, serde_json::json!({}));
        let output = self.rpc.run_local(&root, call, state).await?;
        decode_decimals(named_or_value0(&output, "decimals", METHOD_DECIMALS)?)
    }

    pub async fn symbol(&self, root: &str, state: Option<&ContractState>) -> Result<String> {
        let root = Address::parse(root)?;
        let call = ContractCall::new(ABI_TOKEN_ROOT, METHOD_SYMBOL, serde_json::json!({}));
        let output = self.rpc.run_local(&root, call, state).await?;
        let raw = decode_string(named_or_value0(&output, "symbol", METHOD_SYMBOL)?, "symbol")?;
        decode_base64_text(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::testing::{address, deployed_state, undeployed_state, StubRpc};
    use crate::services::token_codec::encode_base64_text;
    use std::sync::atomic::Ordering;

    fn details_output(name: &str, symbol: &str) -> serde_json::Value {
        serde_json::json!({
            "value0": {
                "name": encode_base64_text(name),
                "symbol": encode_base64_text(symbol),
                "decimals": "6",
                "total_supply": "1000000000000",
                "root_owner_address": address('c').as_str(),
                "root_public_key": "0x0"
            }
        })
    }

    fn wallet_setup(balance_output: serde_json::Value) -> (Arc<StubRpc>, TokenWallet) {
        let (root, wallet) = (address('1'), address('3'));
        let rpc = Arc::new(
            StubRpc::new()
                .with_output(
                    &root,
                    METHOD_GET_WALLET_ADDRESS,
                    serde_json::json!({ "value0": wallet.as_str() }),
                )
                .with_state(&wallet, deployed_state("0"))
                .with_output(&wallet, METHOD_BALANCE, balance_output),
        );
        (rpc.clone(), TokenWallet::new(rpc))
    }

    #[tokio::test]
    async fn wallet_address_is_idempotent_and_cached() {
        let (rpc, service) = wallet_setup(serde_json::json!({ "value0": "0" }));
        let root = address('1');
        let owner = address('2');

        let first = service.wallet_address(root.as_str(), owner.as_str(), None).await.unwrap();
        let second = service
            .wallet_address(&format!("  {root} "), owner.as_str(), None)
            .await
            .unwrap();

        assert_eq!(first, address('3'));
        assert_eq!(first, second);
        assert_eq!(rpc.run_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn malformed_addresses_fail_before_any_call() {
        let (rpc, service) = wallet_setup(serde_json::json!({ "value0": "0" }));
        let good = address('1');
        let bad = "0:not-an-address";

        let results = vec![
            service.wallet_address(bad, good.as_str(), None).await.map(|_| ()),
            service.wallet_address(good.as_str(), bad, None).await.map(|_| ()),
            service.balance(&BalanceRequest::direct(bad), None).await.map(|_| ()),
            service.balance(&BalanceRequest::by_owner(good.as_str(), bad), None).await.map(|_| ()),
            service.balance(&BalanceRequest::by_owner(bad, good.as_str()), None).await.map(|_| ()),
            service.token_data(bad).await.map(|_| ()),
            service.decimals(bad, None).await.map(|_| ()),
            service.symbol(bad, None).await.map(|_| ()),
        ];

        for result in results {
            assert!(matches!(result, Err(AppError::InvalidAddress(_))));
        }
        assert_eq!(rpc.total_calls(), 0);
    }

    #[tokio::test]
    async fn balance_by_owner_returns_raw_text() {
        let (rpc, service) = wallet_setup(serde_json::json!({ "value0": "1000000000" }));

        let balance = service
            .balance(&BalanceRequest::by_owner(address('1').as_str(), address('2').as_str()), None)
            .await
            .unwrap();

        assert_eq!(balance, "1000000000");
        let log = rpc.run_log.lock().unwrap().clone();
        assert_eq!(
            log,
            vec![(address('1'), METHOD_GET_WALLET_ADDRESS), (address('3'), METHOD_BALANCE)]
        );
        assert_eq!(rpc.runs_with_cached_state.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn direct_balance_reads_fetch_fresh_state_and_retain_nothing() {
        let rpc = Arc::new(StubRpc::new());
        for fill in ['a', 'b', 'c', 'd'] {
            let wallet = address(fill);
            rpc.set_state(&wallet, deployed_state("0"));
            rpc.set_output(&wallet, METHOD_BALANCE, serde_json::json!({ "value0": "1" }));
        }
        let service = TokenWallet::new(rpc.clone());

        for fill in ['a', 'b', 'c', 'd'] {
            let balance = service
                .balance(&BalanceRequest::direct(address(fill).as_str()), None)
                .await
                .unwrap();
            assert_eq!(balance, "1");
        }

        rpc.set_output(&address('a'), METHOD_BALANCE, serde_json::json!({ "value0": "2" }));
        let updated = service
            .balance(&BalanceRequest::direct(address('a').as_str()), None)
            .await
            .unwrap();

        assert_eq!(updated, "2");
        assert_eq!(rpc.state_calls.load(Ordering::SeqCst), 5);
        assert_eq!(service.cached_wallet_addresses().await, 0);
    }

    #[tokio::test]
    async fn wallet_address_runs_against_given_root_state() {
        let (rpc, service) = wallet_setup(serde_json::json!({ "value0": "0" }));
        let root_state = deployed_state("0");

        let wallet = service
            .wallet_address(address('1').as_str(), address('2').as_str(), Some(&root_state))
            .await
            .unwrap();

        assert_eq!(wallet, address('3'));
        assert_eq!(rpc.runs_with_cached_state.load(Ordering::SeqCst), 1);
        assert_eq!(rpc.state_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn balance_beyond_u64_is_not_truncated() {
        let huge = "340282366920938463463374607431768211455";
        let (_, service) = wallet_setup(serde_json::json!({ "value0": huge }));

        let balance = service
            .balance(&BalanceRequest::direct(address('3').as_str()), None)
            .await
            .unwrap();
        assert_eq!(balance, huge);
    }

    #[tokio::test]
    async fn balance_with_cached_state_skips_state_fetch() {
        let (rpc, service) = wallet_setup(serde_json::json!({ "value0": "5" }));
        let state = deployed_state("0");

        let balance = service
            .balance(&BalanceRequest::direct(address('3').as_str()), Some(&state))
            .await
            .unwrap();

        assert_eq!(balance, "5");
        assert_eq!(rpc.state_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn balance_of_undeployed_wallet_is_not_deployed_error() {
        let wallet = address('4');
        let rpc = Arc::new(StubRpc::new().with_state(&wallet, undeployed_state()));
        let service = TokenWallet::new(rpc.clone());

        let undeployed = service.balance(&BalanceRequest::direct(wallet.as_str()), None).await;
        assert!(matches!(undeployed, Err(AppError::NotDeployed(_))));

        let missing = service
            .balance(&BalanceRequest::direct(address('5').as_str()), None)
            .await;
        assert!(matches!(missing, Err(AppError::NotDeployed(_))));
        assert_eq!(rpc.run_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn token_data_absent_or_undeployed_root_is_none() {
        let undeployed_root = address('6');
        let rpc = Arc::new(StubRpc::new().with_state(&undeployed_root, undeployed_state()));
        let service = TokenWallet::new(rpc.clone());

        assert!(service.token_data(address('7').as_str()).await.unwrap().is_none());
        assert!(service.token_data(undeployed_root.as_str()).await.unwrap().is_none());
        assert_eq!(rpc.run_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn token_data_decodes_multi_byte_metadata() {
        let root = address('8');
        let rpc = Arc::new(
            StubRpc::new()
                .with_state(&root, deployed_state("0"))
                .with_output(&root, METHOD_GET_DETAILS, details_output("Эверскейл токен", "ЭВР")),
        );
        let service = TokenWallet::new(rpc.clone());

        let token = service.token_data(root.as_str()).await.unwrap().expect("token");
        assert_eq!(token.name, "Эверскейл токен");
        assert_eq!(token.symbol, "ЭВР");
        assert_eq!(token.decimals, 6);
        assert_eq!(token.root, root);
        assert_eq!(token.root_owner_address, address('c'));
        assert!(!token.is_updating && !token.is_updating_wallet_address);
        assert_eq!(rpc.runs_with_cached_state.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn token_data_sees_supply_changes_between_reads() {
        let root = address('8');
        let rpc = Arc::new(
            StubRpc::new()
                .with_state(&root, deployed_state("0"))
                .with_output(&root, METHOD_GET_DETAILS, details_output("USD Coin", "USDC")),
        );
        let service = TokenWallet::new(rpc.clone());

        let before = service.token_data(root.as_str()).await.unwrap().expect("token");
        assert_eq!(before.total_supply, "1000000000000");

        let mut minted = details_output("USD Coin", "USDC");
        minted["value0"]["total_supply"] = serde_json::json!("1000000500000");
        rpc.set_output(&root, METHOD_GET_DETAILS, minted);
        rpc.set_state(&root, deployed_state("7"));

        let after = service.token_data(root.as_str()).await.unwrap().expect("token");
        assert_eq!(after.total_supply, "1000000500000");
        assert_eq!(rpc.state_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn token_data_with_bad_payload_is_decode_error() {
        let root = address('9');
        let rpc = Arc::new(
            StubRpc::new()
                .with_state(&root, deployed_state("0"))
                .with_output(
                    &root,
                    METHOD_GET_DETAILS,
                    serde_json::json!({ "value0": { "name": "%%%" } }),
                ),
        );
        let service = TokenWallet::new(rpc);

        let result = service.token_data(root.as_str()).await;
        assert!(matches!(result, Err(AppError::Decode(_))));
    }

    #[tokio::test]
    async fn malformed_wallet_output_is_decode_error() {
        let root = address('1');
        let rpc = Arc::new(StubRpc::new().with_output(
            &root,
            METHOD_GET_WALLET_ADDRESS,
            serde_json::json!({ "value0": 42 }),
        ));
        let service = TokenWallet::new(rpc);

        let result = service.wallet_address(root.as_str(), address('2').as_str(), None).await;
        assert!(matches!(result, Err(AppError::Decode(_))));
    }

    #[tokio::test]
    async fn rpc_failures_propagate_and_are_not_cached() {
        let rpc = Arc::new(StubRpc::new().failing("node unreachable"));
        let service = TokenWallet::new(rpc.clone());
        let root = address('1');

        let first = service.wallet_address(root.as_str(), address('2').as_str(), None).await;
        let second = service.token_data(root.as_str()).await;

        assert!(matches!(first, Err(AppError::BlockchainRPC(_))));
        assert!(matches!(second, Err(AppError::BlockchainRPC(_))));
        assert!(service.wallet_addresses.is_empty().await);
    }

    #[tokio::test]
    async fn single_field_readers_accept_named_outputs() {
        let root = address('1');
        let rpc = Arc::new(
            StubRpc::new()
                .with_output(&root, METHOD_DECIMALS, serde_json::json!({ "decimals": 18 }))
                .with_output(
                    &root,
                    METHOD_SYMBOL,
                    serde_json::json!({ "value0": encode_base64_text("WΞTH") }),
                ),
        );
        let service = TokenWallet::new(rpc);

        assert_eq!(service.decimals(root.as_str(), None).await.unwrap(), 18);
        assert_eq!(service.symbol(root.as_str(), None).await.unwrap(), "WΞTH");
    }

    #[tokio::test]
    async fn metadata_and_balance_reads_can_run_concurrently() {
        let root = address('1');
        let wallet = address('3');
        let rpc = Arc::new(
            StubRpc::new()
                .with_state(&root, deployed_state("0"))
                .with_output(&root, METHOD_GET_DETAILS, details_output("USD Coin", "USDC"))
                .with_state(&wallet, deployed_state("0"))
                .with_output(&wallet, METHOD_BALANCE, serde_json::json!({ "value0": "77" })),
        );
        let service = TokenWallet::new(rpc);
        let request = BalanceRequest::direct(wallet.as_str());

        let (token, balance) = futures_util::join!(
            service.token_data(root.as_str()),
            service.balance(&request, None)
        );

        assert_eq!(token.unwrap().unwrap().symbol, "USDC");
        assert_eq!(balance.unwrap(), "77");
    }

    #[tokio::test]
    async fn token_with_balance_shares_root_state_within_one_read() {
        let (root, wallet) = (address('1'), address('3'));
        let rpc = Arc::new(
            StubRpc::new()
                .with_state(&root, deployed_state("0"))
                .with_output(&root, METHOD_GET_DETAILS, details_output("USD Coin", "USDC"))
                .with_output(
                    &root,
                    METHOD_GET_WALLET_ADDRESS,
                    serde_json::json!({ "value0": wallet.as_str() }),
                )
                .with_state(&wallet, deployed_state("0"))
                .with_output(&wallet, METHOD_BALANCE, serde_json::json!({ "value0": "250" })),
        );
        let service = TokenWallet::new(rpc.clone());

        let token = service
            .token_with_balance(root.as_str(), address('2').as_str())
            .await
            .unwrap()
            .expect("token");

        assert_eq!(token.symbol, "USDC");
        assert_eq!(token.wallet, Some(wallet));
        assert_eq!(token.balance.as_deref(), Some("250"));
        assert!(!token.is_updating && !token.is_updating_wallet_address);
        assert_eq!(rpc.state_calls.load(Ordering::SeqCst), 2);
        assert_eq!(rpc.runs_with_cached_state.load(Ordering::SeqCst), 3);

        service
            .token_with_balance(root.as_str(), address('2').as_str())
            .await
            .unwrap();
        assert_eq!(rpc.state_calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn token_with_balance_of_undeployed_root_is_none() {
        let root = address('6');
        let rpc = Arc::new(StubRpc::new().with_state(&root, undeployed_state()));
        let service = TokenWallet::new(rpc.clone());

        let token = service
            .token_with_balance(root.as_str(), address('2').as_str())
            .await
            .unwrap();
        assert!(token.is_none());
        assert_eq!(rpc.run_calls.load(Ordering::SeqCst), 0);
    }
}
