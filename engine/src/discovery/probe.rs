// File: engine/src/discovery/probe.rs
use anyhow::Result;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

use crate::client::http::{build_http_client, decode_json, request_failed, unexpected_status};
use crate::config::TlsConfig;
use crate::constants::etcd::VERSION_PATH;
use crate::errors::{ConnectivityError, EngineError};

/// Protocol family of an etcd member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EtcdApi {
    V2,
    V3,
}

/// Version string as reported by `/version`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtocolVersion(String);

impl ProtocolVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Segment before the first `.`
    pub fn major(&self) -> &str {
        self.0.split('.').next().unwrap_or_default()
    }

    pub fn api(&self) -> Option<EtcdApi> {
        match self.major() {
            "2" => Some(EtcdApi::V2),
            "3" => Some(EtcdApi::V3),
            _ => None,
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a probe learned about an endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Probe {
    pub version: ProtocolVersion,
    /// Whether the TLS transport was used, not whether it was verified
    pub secure: bool,
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    #[serde(rename = "etcdserver")]
    etcd_server: String,
    #[serde(rename = "etcdcluster", default)]
    etcd_cluster: Option<String>,
}

pub fn version_url(endpoint: &str) -> Result<Url> {
    let raw = format!("{}{}", endpoint.trim_end_matches('/'), VERSION_PATH);
    Url::parse(&raw).map_err(|e| {
        EngineError::from(ConnectivityError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })
        .into()
    })
}

/// Queries `<endpoint>/version` once. The URL scheme alone selects the
/// transport: `https` presents the client certificate from `tls`,
/// anything else is plain HTTP.
pub async fn probe_etcd(endpoint: &str, tls: &TlsConfig) -> Result<Probe> {
    let url = version_url(endpoint)?;
    let secure = url.scheme() == "https";
    let url_str = url.to_string();

    debug!("Probing {} (secure: {})", url_str, secure);

    let client = build_http_client(secure, tls).await?;
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| request_failed(&url_str, e))?;

    if !response.status().is_success() {
        return Err(unexpected_status(&url_str, response).await);
    }

    let body: VersionResponse = decode_json(&url_str, response).await?;
    info!(
        "etcd at {} reports server {} (cluster {})",
        endpoint,
        body.etcd_server,
        body.etcd_cluster.as_deref().unwrap_or("unknown")
    );

    Ok(Probe {
        version: ProtocolVersion::new(body.etcd_server),
        secure,
    })
}
