use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::RpcError;
use crate::rpc::models::{JsonRpcRequest, JsonRpcResponse, SignatureRecord, TransactionDetail};

const SIGNATURES_METHOD: &str = "getSignaturesForAddress";
const TRANSACTION_METHOD: &str = "getTransaction";

/// Read-only view of the chain used by the tracker
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Most recent signatures for `address`, newest first
    async fn list_signatures(&self, address: &str, limit: usize) -> Result<Vec<String>, RpcError>;

    async fn get_transaction(&self, signature: &str) -> Result<TransactionDetail, RpcError>;
}

pub struct SolanaRpcClient {
    rpc_url: String,
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl SolanaRpcClient {
    pub fn new(rpc_url: impl Into<String>, timeout: Duration) -> Result<Self, RpcError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            rpc_url: rpc_url.into(),
            client,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self.client.post(&self.rpc_url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            debug!("RPC {} returned HTTP {}", method, status);
            return Err(RpcError::Http { status: status.as_u16() });
        }

        let body = response.bytes().await?;
        decode_response(method, &body)
    }
}

/// Maps a 2xx JSON-RPC body onto the call result
fn decode_response<T: DeserializeOwned>(method: &str, body: &[u8]) -> Result<T, RpcError> {
    let body: JsonRpcResponse<T> = serde_json::from_slice(body)
        .map_err(|e| RpcError::Decode(format!("{}: {}", method, e)))?;

    if let Some(err) = body.error {
        return Err(RpcError::JsonRpc {
            code: err.code,
            message: err.message,
        });
    }

    body.result.ok_or_else(|| RpcError::NullResult {
        method: method.to_string(),
    })
}

fn signatures_params(address: &str, limit: usize) -> Value {
    json!([address, { "limit": limit }])
}

fn transaction_params(signature: &str) -> Value {
    json!([
        signature,
        { "encoding": "jsonParsed", "maxSupportedTransactionVersion": 0 }
    ])
}

#[async_trait]
impl ChainRpc for SolanaRpcClient {
    async fn list_signatures(&self, address: &str, limit: usize) -> Result<Vec<String>, RpcError> {
        let records: Vec<SignatureRecord> = self
            .call(SIGNATURES_METHOD, signatures_params(address, limit))
            .await?;

        Ok(records.into_iter().map(|r| r.signature).collect())
    }

    async fn get_transaction(&self, signature: &str) -> Result<TransactionDetail, RpcError> {
        self.call(TRANSACTION_METHOD, transaction_params(signature)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signatures_request_shape() {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: 7,
            method: SIGNATURES_METHOD,
            params: signatures_params("Addr", 10),
        };

        let encoded = serde_json::to_value(&request).unwrap();
        assert_eq!(
            encoded,
            json!({
                "jsonrpc": "2.0",
                "id": 7,
                "method": "getSignaturesForAddress",
                "params": ["Addr", { "limit": 10 }]
            })
        );
    }

    #[test]
    fn test_transaction_params_request_parsed_encoding() {
        let params = transaction_params("sig");
        assert_eq!(params[0], "sig");
        assert_eq!(params[1]["encoding"], "jsonParsed");
        assert_eq!(params[1]["maxSupportedTransactionVersion"], 0);
    }

    #[test]
    fn test_decode_result() {
        let body = br#"{"jsonrpc":"2.0","id":1,"result":[{"signature":"s1"},{"signature":"s2"}]}"#;
        let records: Vec<SignatureRecord> = decode_response(SIGNATURES_METHOD, body).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].signature, "s2");
    }

    #[test]
    fn test_decode_null_result() {
        let body = br#"{"jsonrpc":"2.0","id":1,"result":null}"#;
        let err = decode_response::<TransactionDetail>(TRANSACTION_METHOD, body).unwrap_err();
        assert!(matches!(err, RpcError::NullResult { ref method } if method == "getTransaction"));
    }

    #[test]
    fn test_decode_error_object() {
        let body = br#"{"jsonrpc":"2.0","id":1,"error":{"code":-32005,"message":"Node is behind"}}"#;
        let err = decode_response::<Vec<SignatureRecord>>(SIGNATURES_METHOD, body).unwrap_err();
        assert!(matches!(err, RpcError::JsonRpc { code: -32005, .. }));
        assert_eq!(err.diagnostic(), "Error: RPC code '-32005'");
    }

    #[test]
    fn test_decode_garbage_body() {
        let err = decode_response::<Vec<SignatureRecord>>(SIGNATURES_METHOD, b"<html>").unwrap_err();
        assert!(matches!(err, RpcError::Decode(_)));
    }

    #[tokio::test]
    async fn test_non_success_status_maps_to_http_error() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(b"HTTP/1.1 503 Service Unavailable\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
                .await
                .unwrap();
        });

        let client = SolanaRpcClient::new(url, Duration::from_secs(5)).unwrap();
        let err = client.list_signatures("Addr", 10).await.unwrap_err();
        assert!(matches!(err, RpcError::Http { status: 503 }));
        assert_eq!(err.diagnostic(), "Error: '503'");
    }

    #[test]
    fn test_client_creation() {
        let client = SolanaRpcClient::new("http://localhost:8899", Duration::from_secs(5)).unwrap();
        assert_eq!(client.rpc_url(), "http://localhost:8899");
    }
}
