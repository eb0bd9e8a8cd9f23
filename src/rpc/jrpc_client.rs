use super::{ContractCall, ContractRpc, ContractState};
use crate::{
    config::Config,
    error::{AppError, Result},
    models::Address,
};
use serde::{de::DeserializeOwned, Deserialize};

fn rpc_request(method: &str, params: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
        "id": 1
    })
}

fn run_local_params(
    address: &Address,
    call: &ContractCall,
    cached_state: Option<&ContractState>,
) -> serde_json::Value {
    serde_json::json!({
        "address": address.as_str(),
        "cachedState": cached_state,
        "responsible": call.params.get("_answer_id").is_some(),
        "functionCall": {
            "abi": call.abi,
            "method": call.method,
            "params": call.params
        }
    })
}

// Internal helper that maps transport failures into `AppError::BlockchainRPC`.
fn transport_error(method: &str, err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        return AppError::BlockchainRPC(format!("{method} timed out: {err}"));
    }
    AppError::BlockchainRPC(format!("{method} failed: {err}"))
}

/// Everscale JRPC client
pub struct JrpcClient {
    rpc_url: String,
    client: reqwest::Client,
}

impl JrpcClient {
    pub fn new(rpc_url: String) -> Self {
        Self {
            rpc_url,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.rpc_timeout())
            .build()
            .map_err(|e| AppError::Internal(format!("HTTP client error: {}", e)))?;
        Ok(Self {
            rpc_url: config.ever_rpc_url.clone(),
            client,
        })
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T> {
        let request = rpc_request(method, params);

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(method, e))?
            .error_for_status()
            .map_err(|e| transport_error(method, e))?;

        let body: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| transport_error(method, e))?;

        body.into_result(method)
    }
}

#[async_trait::async_trait]
impl ContractRpc for JrpcClient {
    async fn get_full_contract_state(&self, address: &Address) -> Result<Option<ContractState>> {
        let result: FullContractStateResponse = self
            .request(
                "getFullContractState",
                serde_json::json!({ "address": address.as_str() }),
            )
            .await?;
        Ok(result.state)
    }

    async fn run_local(
        &self,
        address: &Address,
        call: ContractCall,
        cached_state: Option<&ContractState>,
    ) -> Result<serde_json::Value> {
        let params = run_local_params(address, &call, cached_state);
        let result: RunLocalResponse = self.request("runLocal", params).await?;
        if result.code != 0 {
            return Err(AppError::BlockchainRPC(format!(
                "{}.{} exited with code {}",
                call.abi, call.method, result.code
            )));
        }
        result.output.ok_or_else(|| {
            AppError::Decode(format!("{}.{} returned no output", call.abi, call.method))
        })
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

impl<T> RpcResponse<T> {
    fn into_result(self, method: &str) -> Result<T> {
        if let Some(error) = self.error {
            return Err(AppError::BlockchainRPC(format!(
                "{method} rejected ({}): {}",
                error.code, error.message
            )));
        }
        self.result
            .ok_or_else(|| AppError::BlockchainRPC(format!("{method} returned empty result")))
    }
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct FullContractStateResponse {
    state: Option<ContractState>,
}

#[derive(Debug, Deserialize)]
struct RunLocalResponse {
    output: Option<serde_json::Value>,
    #[serde(default)]
    code: i32,
}
