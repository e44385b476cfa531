// File: engine/src/client/v3.rs
use anyhow::Result;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::http::{decode_json, request_failed, unexpected_status};
use super::{KeyNode, KeyStore};
use crate::errors::{ConnectivityError, EngineError, VersionError};

/// Gateway prefixes in the order etcd releases introduced them, newest first
const GATEWAY_PREFIXES: [&str; 3] = ["v3", "v3beta", "v3alpha"];

#[derive(Debug, Serialize)]
struct RangeRequest {
    key: String,
    range_end: String,
    limit: i64,
}

#[derive(Debug, Deserialize)]
struct RangeResponse {
    #[serde(default)]
    kvs: Vec<KeyValue>,
}

#[derive(Debug, Deserialize)]
struct KeyValue {
    key: String,
    #[serde(default)]
    value: Option<String>,
}

/// Smallest key greater than every key starting with `prefix`
pub fn prefix_end(prefix: &[u8]) -> Vec<u8> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < 0xff {
            end.push(last + 1);
            return end;
        }
    }
    // Every byte was 0xff: range to the end of the keyspace.
    vec![0]
}

fn decode(url: &str, field: &str) -> Result<String> {
    let bytes = BASE64.decode(field).map_err(|e| {
        EngineError::from(ConnectivityError::DecodeFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// etcd v3 client speaking the JSON gRPC gateway
pub struct V3Client {
    http: Client,
    endpoint: Url,
}

impl V3Client {
    pub fn new(endpoint: &str, http: Client) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            EngineError::from(ConnectivityError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })
        })?;
        Ok(Self { http, endpoint })
    }

    fn range_url(&self, gateway: &str) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| {
                EngineError::from(ConnectivityError::InvalidEndpoint {
                    endpoint: self.endpoint.to_string(),
                    reason: "cannot be a base URL".to_string(),
                })
            })?
            .pop_if_empty()
            .extend([gateway, "kv", "range"]);
        Ok(url)
    }

    fn unsupported(&self, operation: &str) -> anyhow::Error {
        EngineError::from(VersionError::Unsupported {
            endpoint: self.endpoint.to_string(),
            version: format!("3.x ({})", operation),
        })
        .into()
    }

    async fn range(&self, request: &RangeRequest) -> Result<RangeResponse> {
        let mut last_url = String::new();
        for gateway in GATEWAY_PREFIXES {
            let url = self.range_url(gateway)?;
            let url_str = url.to_string();

            let response = self
                .http
                .post(url)
                .json(request)
                .send()
                .await
                .map_err(|e| request_failed(&url_str, e))?;

            if response.status() == StatusCode::NOT_FOUND {
                debug!("No gateway at {}, trying older prefix", url_str);
                last_url = url_str;
                continue;
            }
            if !response.status().is_success() {
                return Err(unexpected_status(&url_str, response).await);
            }
            return decode_json(&url_str, response).await;
        }

        Err(EngineError::from(ConnectivityError::UnexpectedStatus {
            url: last_url,
            status: StatusCode::NOT_FOUND.as_u16(),
            body: "no v3 JSON gateway found".to_string(),
        })
        .into())
    }
}

#[async_trait]
impl KeyStore for V3Client {
    async fn list(&self) -> Result<KeyNode> {
        Err(self.unsupported("listing"))
    }

    /// Protocol-3 keys are flat, so `key` is read as a prefix: the first key
    /// under it is returned.
    async fn get(&self, key: &str) -> Result<Option<KeyNode>> {
        let request = RangeRequest {
            key: BASE64.encode(key),
            range_end: BASE64.encode(prefix_end(key.as_bytes())),
            limit: 1,
        };

        let response = self.range(&request).await?;
        let url = self.endpoint.to_string();

        match response.kvs.into_iter().next() {
            Some(kv) => {
                let found = decode(&url, &kv.key)?;
                let value = match kv.value {
                    Some(value) => decode(&url, &value)?,
                    None => String::new(),
                };
                Ok(Some(KeyNode::leaf(found, value)))
            }
            None => {
                debug!("No key under prefix {}", key);
                Ok(None)
            }
        }
    }

    async fn create_if_absent(&self, _key: &str, _value: &str) -> Result<()> {
        Err(self.unsupported("writes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_end_increments_last_byte() {
        assert_eq!(prefix_end(b"/registry"), b"/registrz".to_vec());
    }

    #[test]
    fn test_prefix_end_carries_over_ff() {
        assert_eq!(prefix_end(&[b'a', 0xff]), vec![b'b']);
        assert_eq!(prefix_end(&[0xff, 0xff]), vec![0]);
    }

    #[test]
    fn test_range_url_per_gateway() {
        let client = V3Client::new("https://10.0.0.1:2379", Client::new()).unwrap();
        assert_eq!(
            client.range_url("v3").unwrap().as_str(),
            "https://10.0.0.1:2379/v3/kv/range"
        );
        assert_eq!(
            client.range_url("v3alpha").unwrap().as_str(),
            "https://10.0.0.1:2379/v3alpha/kv/range"
        );
    }

    #[tokio::test]
    async fn test_writes_are_unsupported() {
        let client = V3Client::new("http://localhost:2379", Client::new()).unwrap();
        let err = client.create_if_absent("/foo", "bar").await.unwrap_err();
        let engine = crate::errors::engine_error(&err).unwrap();
        assert!(engine.is_unsupported_version());
    }
}
