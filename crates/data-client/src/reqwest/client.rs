use crate::reqwest::envelope::{decode_response, RpcRequest};
use crate::{DataSource, FetchError};
use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::{Client, IntoUrl, Request, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use stg_primitives::{to_quantity, AddressCode, Block, BlockNumber, TransactionReceipt};
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{instrument, warn};


const RETRY_SCHEDULE: [u64; 6] = [0, 100, 200, 500, 1000, 2000];


pub fn default_http_client() -> reqwest::Result<Client> {
    Client::builder()
        .read_timeout(Duration::from_secs(20))
        .connect_timeout(Duration::from_secs(20))
        .gzip(true)
        .build()
}


/// JSON-RPC 2.0 client of an EVM node.
pub struct RpcDataSource {
    http: Client,
    url: Url,
    next_id: AtomicU64,
    max_attempts: usize,
}


impl Debug for RpcDataSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcDataSource")
            .field("url", &self.url.as_str())
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}


impl RpcDataSource {
    pub fn from_url(url: impl IntoUrl) -> reqwest::Result<Self> {
        let http = default_http_client()?;
        Self::new(http, url)
    }

    pub fn new(http: Client, url: impl IntoUrl) -> reqwest::Result<Self> {
        Ok(Self {
            http,
            url: url.into_url()?,
            next_id: AtomicU64::new(1),
            max_attempts: 3
        })
    }

    /// Number of attempts made for transient HTTP failures (429, 5xx gateway errors, timeouts).
    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    #[instrument(level = "debug", skip_all, err(Display), fields(method = method))]
    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: Value
    ) -> Result<Option<T>, FetchError>
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let http_req = self.http
            .post(self.url.clone())
            .json(&RpcRequest::new(method, params, id))
            .build()
            .map_err(FetchError::transport)?;

        let res = self.execute(&http_req).await?;
        let body = res.bytes().await.map_err(FetchError::transport)?;
        decode_response(&body)
    }

    async fn execute(&self, req: &Request) -> Result<Response, FetchError> {
        let mut attempt = 0;
        loop {
            let http_req = req.try_clone().ok_or_else(|| {
                FetchError::Transport(anyhow!("request body can not be replayed"))
            })?;

            let retry_error = match self.http.execute(http_req).await {
                Ok(res) => match res.status().as_u16() {
                    429 | 502 | 503 | 504 | 524 => response_error(res).await,
                    status if status < 300 => return Ok(res),
                    _ => return Err(FetchError::Transport(response_error(res).await))
                },
                Err(err) if err.is_timeout() || err.is_connect() || err.is_request() => {
                    anyhow!(err)
                },
                Err(err) => return Err(FetchError::transport(err))
            };

            let pause = retry_pause(attempt);
            attempt += 1;
            if attempt >= self.max_attempts {
                return Err(FetchError::Transport(retry_error))
            }

            warn!(
                url = %req.url().as_str(),
                body = %body_str(req).unwrap_or("None"),
                error = ?retry_error,
                "rpc request failed, will retry in {} ms",
                pause
            );

            tokio::time::sleep(Duration::from_millis(pause)).await;
        }
    }
}


async fn response_error(response: Response) -> anyhow::Error {
    let status = response.status().as_u16();
    if let Ok(text) = response.text().await {
        anyhow!("got HTTP {}: {}", status, text)
    } else {
        anyhow!("got HTTP {}", status)
    }
}


/// Pause before the retry following the failed attempt number `attempt` (0-based).
fn retry_pause(attempt: usize) -> u64 {
    RETRY_SCHEDULE[std::cmp::min(attempt, RETRY_SCHEDULE.len() - 1)]
}


fn body_str(req: &Request) -> Option<&str> {
    req.body()
        .and_then(|body| body.as_bytes())
        .map(|bytes| {
            std::str::from_utf8(bytes).unwrap_or("<binary>")
        })
}


#[async_trait]
impl DataSource for RpcDataSource {
    async fn get_block(&self, number: BlockNumber) -> Result<Block, FetchError> {
        let method = "eth_getBlockByNumber";
        let quantity = to_quantity(number);
        self.call(method, json!([quantity, true]))
            .await?
            .ok_or(FetchError::NotFound {
                method,
                key: quantity
            })
    }

    async fn get_transaction_receipt(&self, tx_hash: &str) -> Result<TransactionReceipt, FetchError> {
        let method = "eth_getTransactionReceipt";
        self.call(method, json!([tx_hash]))
            .await?
            .ok_or_else(|| FetchError::NotFound {
                method,
                key: tx_hash.to_string()
            })
    }

    async fn get_address_code(&self, address: &str) -> Result<AddressCode, FetchError> {
        let code: Option<String> = self.call("eth_getCode", json!([address, "latest"])).await?;
        Ok(AddressCode {
            address: address.to_string(),
            address_code: code.unwrap_or_default()
        })
    }
}
