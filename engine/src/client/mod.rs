//! Key-store clients for the two etcd protocol families
//!
//! Backup, restore and classification only need three operations, so both
//! protocol families sit behind [`KeyStore`]. The family is picked once per
//! call from the probed version by [`open_client`].

pub mod http;
pub mod v2;
pub mod v3;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::TlsConfig;
use crate::discovery::EtcdApi;

pub use v2::V2Client;
pub use v3::V3Client;

/// A node of the keyspace tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyNode {
    pub key: String,
    pub dir: bool,
    pub value: Option<String>,
    pub children: Vec<KeyNode>,
}

impl KeyNode {
    pub fn leaf(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            dir: false,
            value: Some(value.into()),
            children: Vec::new(),
        }
    }

    pub fn dir(key: impl Into<String>, children: Vec<KeyNode>) -> Self {
        Self {
            key: key.into(),
            dir: true,
            value: None,
            children,
        }
    }

    pub fn is_root(&self) -> bool {
        self.key.is_empty() || self.key == "/"
    }

    /// All leaf keys and values below this node, depth first
    pub fn leaves(&self) -> Vec<(&str, &str)> {
        let mut found = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.dir {
                stack.extend(node.children.iter().rev());
            } else {
                found.push((node.key.as_str(), node.value.as_deref().unwrap_or_default()));
            }
        }
        found
    }
}

#[async_trait]
pub trait KeyStore: Send + Sync {
    /// Whole keyspace, rooted at `/`
    async fn list(&self) -> Result<KeyNode>;

    /// Node stored at `key`, `None` when absent
    async fn get(&self, key: &str) -> Result<Option<KeyNode>>;

    /// Writes `key` only if it does not exist yet
    async fn create_if_absent(&self, key: &str, value: &str) -> Result<()>;
}

/// Opens the client matching the endpoint's protocol family
pub async fn open_client(
    endpoint: &str,
    api: EtcdApi,
    secure: bool,
    tls: &TlsConfig,
) -> Result<Box<dyn KeyStore>> {
    let http = http::build_http_client(secure, tls).await?;
    Ok(match api {
        EtcdApi::V2 => Box::new(V2Client::new(endpoint, http)?),
        EtcdApi::V3 => Box::new(V3Client::new(endpoint, http)?),
    })
}
