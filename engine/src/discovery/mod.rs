//! Endpoint discovery
//!
//! Learns which etcd protocol an endpoint speaks and which Kubernetes
//! distribution, if any, keeps its state there. Classification reads two
//! reserved prefixes:
//!
//! - `/registry` present: a Kubernetes control plane lives here
//! - `/openshift.io` present as well: the distribution is OpenShift
//!
//! Absence of a prefix is a classification result, not an error. Only an
//! unreachable endpoint or an unrecognized version fails the call.

pub mod probe;

pub use probe::{probe_etcd, EtcdApi, Probe, ProtocolVersion};

use anyhow::Result;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info};

use crate::client::open_client;
use crate::config::TlsConfig;
use crate::constants::etcd::{KUBERNETES_PREFIX, OPENSHIFT_PREFIX};
use crate::errors::{ClassificationError, EngineError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Distro {
    NotADistro,
    Vanilla,
    #[serde(rename = "openshift")]
    OpenShift,
}

impl fmt::Display for Distro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Distro::NotADistro => write!(f, "Not a Kubernetes distro"),
            Distro::Vanilla => write!(f, "Vanilla Kubernetes"),
            Distro::OpenShift => write!(f, "OpenShift"),
        }
    }
}

/// Probe and classification of one endpoint
#[derive(Debug, Clone, Serialize)]
pub struct Exploration {
    pub endpoint: String,
    pub version: ProtocolVersion,
    pub secure: bool,
    pub distro: Distro,
}

/// Classifies the distribution behind `endpoint`. An error means the
/// endpoint is not a distro for the reason carried by the error.
pub async fn classify(endpoint: &str, tls: &TlsConfig) -> Result<Distro> {
    Ok(explore(endpoint, tls).await?.distro)
}

pub async fn explore(endpoint: &str, tls: &TlsConfig) -> Result<Exploration> {
    let probe = probe_etcd(endpoint, tls).await?;

    let api = probe.version.api().ok_or_else(|| {
        EngineError::from(ClassificationError::CannotDetermineDistro {
            endpoint: endpoint.to_string(),
            version: probe.version.to_string(),
        })
    })?;

    let distro = {
        let client = open_client(endpoint, api, probe.secure, tls).await?;

        match client.get(KUBERNETES_PREFIX).await {
            Ok(Some(_)) => match client.get(OPENSHIFT_PREFIX).await {
                Ok(Some(_)) => Distro::OpenShift,
                Ok(None) => Distro::Vanilla,
                Err(e) => {
                    debug!("Reading {} on {} failed: {}", OPENSHIFT_PREFIX, endpoint, e);
                    Distro::Vanilla
                }
            },
            Ok(None) => Distro::NotADistro,
            Err(e) => {
                debug!("Reading {} on {} failed: {}", KUBERNETES_PREFIX, endpoint, e);
                Distro::NotADistro
            }
        }
    };

    info!(
        "{} runs etcd {} ({:?} API): {}",
        endpoint, probe.version, api, distro
    );

    Ok(Exploration {
        endpoint: endpoint.to_string(),
        version: probe.version,
        secure: probe.secure,
        distro,
    })
}
