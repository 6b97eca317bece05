use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use stg_data_client::reqwest::RpcDataSource;
use stg_data_client::{DataSource, FetchError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;


#[derive(Default)]
struct Node {
    requests: AtomicUsize,
    unavailable_first: usize,
}


async fn handle(State(node): State<Arc<Node>>, Json(req): Json<Value>) -> Response {
    let n = node.requests.fetch_add(1, Ordering::SeqCst);
    if n < node.unavailable_first {
        return (StatusCode::SERVICE_UNAVAILABLE, "try later").into_response()
    }

    assert_eq!(req["jsonrpc"], "2.0");

    let result = match req["method"].as_str().unwrap() {
        "eth_getBlockByNumber" => match req["params"][0].as_str().unwrap() {
            "0x2a" => {
                assert_eq!(req["params"][1], true);
                json!({
                    "number": "0x2a",
                    "hash": "0xblock",
                    "parentHash": "0xparent",
                    "transactions": [{"hash": "0xt1"}, {"hash": "0xt2"}]
                })
            },
            _ => Value::Null
        },
        "eth_getTransactionReceipt" => json!({
            "transactionHash": req["params"][0],
            "from": "0xfrom",
            "to": null
        }),
        "eth_getCode" => {
            assert_eq!(req["params"][1], "latest");
            json!("0x6080")
        },
        _ => {
            return Json(json!({
                "jsonrpc": "2.0",
                "id": req["id"],
                "error": {"code": -32601, "message": "method not found"}
            })).into_response()
        }
    };

    Json(json!({
        "jsonrpc": "2.0",
        "id": req["id"],
        "result": result
    })).into_response()
}


async fn start_node(node: Arc<Node>) -> String {
    let app = Router::new()
        .route("/", post(handle))
        .with_state(node);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/", addr)
}


#[tokio::test]
async fn fetches_typed_entities() {
    let url = start_node(Arc::new(Node::default())).await;
    let client = RpcDataSource::from_url(url.as_str()).unwrap();

    let block = client.get_block(42).await.unwrap();
    assert_eq!(block.block_number(), Some(42));
    assert_eq!(block.transactions.len(), 2);

    let receipt = client.get_transaction_receipt("0xt1").await.unwrap();
    assert_eq!(receipt.transaction_hash, "0xt1");
    assert_eq!(receipt.to, None);

    let code = client.get_address_code("0xfrom").await.unwrap();
    assert_eq!(code.address, "0xfrom");
    assert_eq!(code.address_code, "0x6080");
}


#[tokio::test]
async fn missing_block_is_not_found() {
    let url = start_node(Arc::new(Node::default())).await;
    let client = RpcDataSource::from_url(url.as_str()).unwrap();

    let err = client.get_block(7).await.unwrap_err();
    assert!(err.is_not_found(), "{}", err);
}


#[tokio::test]
async fn retries_unavailable_node() {
    let node = Arc::new(Node {
        unavailable_first: 2,
        ..Node::default()
    });
    let url = start_node(node.clone()).await;
    let client = RpcDataSource::from_url(url.as_str()).unwrap().with_max_attempts(3);

    client.get_address_code("0xa").await.unwrap();
    assert_eq!(node.requests.load(Ordering::SeqCst), 3);
}


#[tokio::test]
async fn gives_up_after_max_attempts() {
    let node = Arc::new(Node {
        unavailable_first: usize::MAX,
        ..Node::default()
    });
    let url = start_node(node.clone()).await;
    let client = RpcDataSource::from_url(url.as_str()).unwrap().with_max_attempts(2);

    let err = client.get_address_code("0xa").await.unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)));
    assert_eq!(node.requests.load(Ordering::SeqCst), 2);
}
