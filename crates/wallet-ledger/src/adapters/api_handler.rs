//! # API Gateway Handler
//!
//! Answers wallet queries forwarded by the API gateway.
//!
//! ```text
//! Client → API Gateway → ApiQuery event → ApiGatewayHandler → WalletLedgerApi
//! ```

use crate::domain::{LedgerError, DEFAULT_LIST_COUNT};
use crate::ipc::{EntryPayload, LedgerStatsPayload, ListTransactionsParams, TransactionPayload};
use crate::ports::WalletLedgerApi;
use serde::{Deserialize, Serialize};
use shared_types::{parse_hash, TxId};
use std::sync::Arc;

/// Error from API query handling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiQueryError {
    pub code: i32,
    pub message: String,
}

impl ApiQueryError {
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: format!("Method not found: {}", method),
        }
    }

    pub fn invalid_params(msg: &str) -> Self {
        Self {
            code: -32602,
            message: msg.to_string(),
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            code: -32603,
            message: msg.to_string(),
        }
    }

    /// Wallet error for an unknown transaction id.
    pub fn invalid_address_or_key(msg: &str) -> Self {
        Self {
            code: -5,
            message: msg.to_string(),
        }
    }
}

impl From<LedgerError> for ApiQueryError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::TransactionNotFound { .. } => {
                Self::invalid_address_or_key("Invalid or non-wallet transaction id")
            }
            LedgerError::InvalidRequest(msg) => Self::invalid_params(&msg),
            other => Self::internal(&other.to_string()),
        }
    }
}

impl std::fmt::Display for ApiQueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiQueryError {}

/// API Gateway handler for the wallet ledger.
pub struct ApiGatewayHandler {
    service: Arc<dyn WalletLedgerApi>,
    default_list_count: usize,
}

impl ApiGatewayHandler {
    pub fn new(service: Arc<dyn WalletLedgerApi>) -> Self {
        Self::with_default_count(service, DEFAULT_LIST_COUNT)
    }

    pub fn with_default_count(service: Arc<dyn WalletLedgerApi>, default_list_count: usize) -> Self {
        Self {
            service,
            default_list_count,
        }
    }

    /// Handle ping request (health check).
    pub fn handle_ping(&self) -> serde_json::Value {
        serde_json::json!({
            "status": "ok",
            "subsystem": "wallet-ledger"
        })
    }

    pub fn handle_list_transactions(
        &self,
        params: ListTransactionsParams,
    ) -> Result<serde_json::Value, ApiQueryError> {
        let request = params.into_request(self.default_list_count);
        let rows = self.service.list_transactions(&request)?;
        let payload: Vec<EntryPayload> = rows.iter().map(EntryPayload::from).collect();
        to_json(&payload)
    }

    pub fn handle_get_transaction(&self, txid: TxId) -> Result<serde_json::Value, ApiQueryError> {
        let view = self.service.get_transaction(&txid)?;
        to_json(&TransactionPayload::from(&view))
    }

    pub fn handle_get_stats(&self) -> Result<serde_json::Value, ApiQueryError> {
        to_json(&LedgerStatsPayload::from(&self.service.stats()))
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, ApiQueryError> {
    serde_json::to_value(value).map_err(|e| ApiQueryError::internal(&e.to_string()))
}

/// Handle an API query from the gateway.
///
/// ## Supported Methods
///
/// - `ping`: Health check
/// - `listtransactions`: `{account, count, skip}` or `[account, count, skip]`
/// - `gettransaction`: `{txid}` or `[txid]`
/// - `getledgerstats`: Ledger counters
pub fn handle_api_query(
    handler: &ApiGatewayHandler,
    method: &str,
    params: &serde_json::Value,
) -> Result<serde_json::Value, ApiQueryError> {
    match method {
        "ping" => Ok(handler.handle_ping()),
        "listtransactions" => handler.handle_list_transactions(parse_list_params(params)?),
        "gettransaction" => {
            let txid = parse_hash_param(params, "txid")?;
            handler.handle_get_transaction(txid)
        }
        "getledgerstats" => handler.handle_get_stats(),
        _ => Err(ApiQueryError::method_not_found(method)),
    }
}

fn parse_list_params(params: &serde_json::Value) -> Result<ListTransactionsParams, ApiQueryError> {
    match params {
        serde_json::Value::Null => Ok(ListTransactionsParams {
            account: None,
            count: None,
            skip: None,
        }),
        serde_json::Value::Array(values) => {
            let account = match values.first() {
                None | Some(serde_json::Value::Null) => None,
                Some(v) => Some(
                    v.as_str()
                        .ok_or_else(|| ApiQueryError::invalid_params("account must be a string"))?
                        .to_string(),
                ),
            };
            Ok(ListTransactionsParams {
                account,
                count: positional_count(values.get(1), "count")?,
                skip: positional_count(values.get(2), "skip")?,
            })
        }
        serde_json::Value::Object(_) => serde_json::from_value(params.clone())
            .map_err(|e| ApiQueryError::invalid_params(&e.to_string())),
        _ => Err(ApiQueryError::invalid_params("Expected object or array params")),
    }
}

fn positional_count(
    value: Option<&serde_json::Value>,
    name: &str,
) -> Result<Option<usize>, ApiQueryError> {
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| {
                ApiQueryError::invalid_params(&format!("{} must be a non-negative integer", name))
            }),
    }
}

/// Parse a hash parameter from named or positional JSON params.
fn parse_hash_param(params: &serde_json::Value, name: &str) -> Result<TxId, ApiQueryError> {
    let hex_str = params
        .get(name)
        .or_else(|| params.get(0))
        .and_then(|v| v.as_str())
        .ok_or_else(|| ApiQueryError::invalid_params(&format!("Missing {} parameter", name)))?;

    parse_hash(hex_str.trim_start_matches("0x"))
        .map_err(|e| ApiQueryError::invalid_params(&e.to_string()))
}
