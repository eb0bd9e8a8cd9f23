// Call-counting `ContractRpc` double shared by unit tests.

use super::{ContractCall, ContractRpc, ContractState, GenTimings};
use crate::{
    error::{AppError, Result},
    models::Address,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn address(fill: char) -> Address {
    Address::parse(&format!("0:{}", fill.to_string().repeat(64))).expect("test address")
}

pub fn deployed_state(balance: &str) -> ContractState {
    ContractState {
        balance: balance.to_string(),
        gen_timings: GenTimings {
            gen_lt: "100".to_string(),
            gen_utime: 1_700_000_000,
        },
        last_transaction_id: None,
        is_deployed: true,
        boc: "te6ccgEBAQEAAgAAAA==".to_string(),
    }
}

pub fn undeployed_state() -> ContractState {
    ContractState {
        is_deployed: false,
        ..deployed_state("0")
    }
}

#[derive(Default)]
pub struct StubRpc {
    states: Mutex<HashMap<Address, ContractState>>,
    outputs: Mutex<HashMap<(Address, &'static str), Value>>,
    failure: Mutex<Option<String>>,
    pub state_calls: AtomicUsize,
    pub run_calls: AtomicUsize,
    pub runs_with_cached_state: AtomicUsize,
    pub run_log: Mutex<Vec<(Address, &'static str)>>,
}

impl StubRpc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(self, address: &Address, state: ContractState) -> Self {
        self.set_state(address, state);
        self
    }

    pub fn with_output(self, address: &Address, method: &'static str, output: Value) -> Self {
        self.set_output(address, method, output);
        self
    }

    pub fn set_state(&self, address: &Address, state: ContractState) {
        self.states
            .lock()
            .expect("stub lock")
            .insert(address.clone(), state);
    }

    pub fn set_output(&self, address: &Address, method: &'static str, output: Value) {
        self.outputs
            .lock()
            .expect("stub lock")
            .insert((address.clone(), method), output);
    }

    pub fn failing(self, message: &str) -> Self {
        *self.failure.lock().expect("stub lock") = Some(message.to_string());
        self
    }

    pub fn total_calls(&self) -> usize {
        self.state_calls.load(Ordering::SeqCst) + self.run_calls.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> Result<()> {
        match self.failure.lock().expect("stub lock").clone() {
            Some(message) => Err(AppError::BlockchainRPC(message)),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl ContractRpc for StubRpc {
    async fn get_full_contract_state(&self, address: &Address) -> Result<Option<ContractState>> {
        self.state_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.check_failure()?;
        Ok(self.states.lock().expect("stub lock").get(address).cloned())
    }

    async fn run_local(
        &self,
        address: &Address,
        call: ContractCall,
        cached_state: Option<&ContractState>,
    ) -> Result<Value> {
        self.run_calls.fetch_add(1, Ordering::SeqCst);
        if cached_state.is_some() {
            self.runs_with_cached_state.fetch_add(1, Ordering::SeqCst);
        }
        self.run_log
            .lock()
            .expect("stub lock")
            .push((address.clone(), call.method));
        tokio::task::yield_now().await;
        self.check_failure()?;
        self.outputs
            .lock()
            .expect("stub lock")
            .get(&(address.clone(), call.method))
            .cloned()
            .ok_or_else(|| {
                AppError::BlockchainRPC(format!("no stubbed output for {}", call.method))
            })
    }
}
