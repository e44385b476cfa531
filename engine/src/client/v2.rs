// File: engine/src/client/v2.rs
use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

use super::http::{decode_json, request_failed, unexpected_status};
use super::{KeyNode, KeyStore};
use crate::constants::etcd::V2_NODE_EXIST;
use crate::errors::{ConnectivityError, EngineError, KeyError};

#[derive(Debug, Deserialize)]
struct V2Response {
    node: V2Node,
}

#[derive(Debug, Deserialize)]
struct V2Node {
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    dir: bool,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    nodes: Vec<V2Node>,
}

#[derive(Debug, Deserialize)]
struct V2Error {
    #[serde(rename = "errorCode")]
    error_code: u64,
}

impl From<V2Node> for KeyNode {
    fn from(node: V2Node) -> Self {
        KeyNode {
            key: node.key.unwrap_or_else(|| "/".to_string()),
            dir: node.dir,
            value: node.value,
            children: node.nodes.into_iter().map(KeyNode::from).collect(),
        }
    }
}

/// etcd v2 keys API client
pub struct V2Client {
    http: Client,
    endpoint: Url,
}

impl V2Client {
    pub fn new(endpoint: &str, http: Client) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            EngineError::from(ConnectivityError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })
        })?;
        Ok(Self { http, endpoint })
    }

    fn keys_url(&self, key: &str) -> Result<Url> {
        let mut url = self.endpoint.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                EngineError::from(ConnectivityError::InvalidEndpoint {
                    endpoint: self.endpoint.to_string(),
                    reason: "cannot be a base URL".to_string(),
                })
            })?;
            path.pop_if_empty().push("v2").push("keys");

            let segments: Vec<&str> = key.split('/').filter(|s| !s.is_empty()).collect();
            if segments.is_empty() {
                path.push("");
            } else {
                path.extend(segments);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl KeyStore for V2Client {
    async fn list(&self) -> Result<KeyNode> {
        let url = self.keys_url("/")?;
        let url_str = url.to_string();

        let response = self
            .http
            .get(url)
            .query(&[("recursive", "true"), ("sorted", "true")])
            .send()
            .await
            .map_err(|e| request_failed(&url_str, e))?;

        if !response.status().is_success() {
            return Err(unexpected_status(&url_str, response).await);
        }

        let body: V2Response = decode_json(&url_str, response).await?;
        Ok(KeyNode::from(body.node))
    }

    async fn get(&self, key: &str) -> Result<Option<KeyNode>> {
        let url = self.keys_url(key)?;
        let url_str = url.to_string();

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| request_failed(&url_str, e))?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("Key {} not present", key);
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(unexpected_status(&url_str, response).await);
        }

        let body: V2Response = decode_json(&url_str, response).await?;
        Ok(Some(KeyNode::from(body.node)))
    }

    async fn create_if_absent(&self, key: &str, value: &str) -> Result<()> {
        let url = self.keys_url(key)?;
        let url_str = url.to_string();

        let response = self
            .http
            .put(url)
            .query(&[("prevExist", "false")])
            .form(&[("value", value)])
            .send()
            .await
            .map_err(|e| request_failed(&url_str, e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let error_code = serde_json::from_str::<V2Error>(&body)
            .map(|e| e.error_code)
            .ok();

        if status == StatusCode::PRECONDITION_FAILED || error_code == Some(V2_NODE_EXIST) {
            return Err(EngineError::from(KeyError::KeyExists {
                key: key.to_string(),
            })
            .into());
        }
        Err(EngineError::from(ConnectivityError::UnexpectedStatus {
            url: url_str,
            status: status.as_u16(),
            body,
        })
        .into())
    }
}
