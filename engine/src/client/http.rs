// File: engine/src/client/http.rs
use anyhow::Result;
use reqwest::{Client, Identity, Response};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::debug;

use crate::config::TlsConfig;
use crate::constants::http::{CONNECT_TIMEOUT, REQUEST_TIMEOUT};
use crate::errors::{ConnectivityError, EngineError};

/// Builds the transport for one call: plain HTTP, or TLS presenting the
/// client certificate without verifying the server chain.
pub async fn build_http_client(secure: bool, tls: &TlsConfig) -> Result<Client> {
    let builder = Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT);

    if !secure {
        return Ok(builder.build()?);
    }

    let (cert_path, key_path) = tls.paths()?;
    let identity = load_identity(cert_path, key_path).await?;
    debug!("Using client certificate {}", cert_path.display());

    let client = builder
        .use_rustls_tls()
        .identity(identity)
        .danger_accept_invalid_certs(true)
        .build()?;
    Ok(client)
}

async fn read_pem(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|e| {
        EngineError::from(ConnectivityError::TlsIdentity {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
        .into()
    })
}

async fn load_identity(cert_path: &Path, key_path: &Path) -> Result<Identity> {
    let mut pem = read_pem(key_path).await?;
    pem.push(b'\n');
    pem.extend(read_pem(cert_path).await?);

    Identity::from_pem(&pem).map_err(|e| {
        EngineError::from(ConnectivityError::TlsIdentity {
            path: format!("{} + {}", cert_path.display(), key_path.display()),
            reason: e.to_string(),
        })
        .into()
    })
}

pub(crate) fn request_failed(url: &str, err: reqwest::Error) -> anyhow::Error {
    EngineError::from(ConnectivityError::RequestFailed {
        url: url.to_string(),
        reason: err.to_string(),
    })
    .into()
}

pub(crate) async fn unexpected_status(url: &str, response: Response) -> anyhow::Error {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    EngineError::from(ConnectivityError::UnexpectedStatus {
        url: url.to_string(),
        status,
        body,
    })
    .into()
}

/// Decodes a JSON body, naming the URL on failure
pub(crate) async fn decode_json<T: DeserializeOwned>(url: &str, response: Response) -> Result<T> {
    response.json::<T>().await.map_err(|e| {
        EngineError::from(ConnectivityError::DecodeFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })
        .into()
    })
}
