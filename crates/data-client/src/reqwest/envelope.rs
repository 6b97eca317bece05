use crate::FetchError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;


#[derive(Serialize, Debug)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
    pub params: Value,
    pub id: u64,
}


impl<'a> RpcRequest<'a> {
    pub fn new(method: &'a str, params: Value, id: u64) -> Self {
        Self {
            jsonrpc: "2.0",
            method,
            params,
            id
        }
    }
}


#[derive(Deserialize, Debug)]
pub struct RpcErrorObject {
    pub code: i64,
    #[serde(default)]
    pub message: String,
}


#[derive(Deserialize, Debug)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct RpcResponse<T> {
    #[serde(default)]
    pub result: Option<T>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
    #[serde(default)]
    pub id: Option<Value>,
}


/// Decodes a JSON-RPC response body into the result type expected for the call.
///
/// `Ok(None)` means the node answered with `"result": null`.
pub fn decode_response<T: DeserializeOwned>(body: &[u8]) -> Result<Option<T>, FetchError> {
    let response: RpcResponse<T> = serde_json::from_slice(body).map_err(FetchError::Decode)?;
    if let Some(err) = response.error {
        return Err(FetchError::Rpc {
            code: err.code,
            message: err.message
        })
    }
    Ok(response.result)
}


#[cfg(test)]
mod tests {
    use super::*;
    use stg_primitives::TransactionReceipt;


    #[test]
    fn request_shape() {
        let req = RpcRequest::new("eth_getCode", serde_json::json!(["0xa", "latest"]), 7);
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value, serde_json::json!({
            "jsonrpc": "2.0",
            "method": "eth_getCode",
            "params": ["0xa", "latest"],
            "id": 7
        }));
    }

    #[test]
    fn result() {
        let body = br#"{"jsonrpc":"2.0","id":1,"result":"0x6080"}"#;
        let code: Option<String> = decode_response(body).unwrap();
        assert_eq!(code.as_deref(), Some("0x6080"));
    }

    #[test]
    fn null_result() {
        let body = br#"{"jsonrpc":"2.0","id":1,"result":null}"#;
        let receipt: Option<TransactionReceipt> = decode_response(body).unwrap();
        assert!(receipt.is_none());
    }

    #[test]
    fn rpc_error() {
        let body = br#"{"jsonrpc":"2.0","id":1,"error":{"code":-32602,"message":"invalid argument"}}"#;
        let err = decode_response::<String>(body).unwrap_err();
        assert!(matches!(err, FetchError::Rpc { code: -32602, .. }));
        assert_eq!(err.to_string(), "RPC error -32602: invalid argument");
    }

    #[test]
    fn malformed_result() {
        let body = br#"{"jsonrpc":"2.0","id":1,"result":{"from":"0xb"}}"#;
        let err = decode_response::<TransactionReceipt>(body).unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }
}
