//! Restore: unpack a backup archive and replay it into an etcd v2 keyspace
//!
//! Writes are insert-only: a key that already exists keeps its value and is
//! reported as skipped. Protocol-3 endpoints are refused before any write.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info};
use walkdir::WalkDir;

use crate::archive;
use crate::client::{open_client, KeyStore};
use crate::codec;
use crate::config::TlsConfig;
use crate::constants::mirror::{ARCHIVE_EXTENSION, CONTENT_FILE};
use crate::discovery::{probe_etcd, EtcdApi};
use crate::errors::{EngineError, StructuralError, VersionError};
use crate::report::WalkReport;

/// Restores `<target>/<basename>.zip` into `endpoint` and returns the
/// number of keys written.
pub async fn restore(
    basename: &str,
    target: &Path,
    endpoint: &str,
    tls: &TlsConfig,
) -> Result<usize> {
    Ok(restore_with_report(basename, target, endpoint, tls)
        .await?
        .written)
}

pub async fn restore_with_report(
    basename: &str,
    target: &Path,
    endpoint: &str,
    tls: &TlsConfig,
) -> Result<WalkReport> {
    let archive_file = target.join(format!("{}.{}", basename, ARCHIVE_EXTENSION));
    info!("Restoring {} into {}", archive_file.display(), endpoint);

    let mirror = archive::unseal(&archive_file, target).await?;

    let probe = probe_etcd(endpoint, tls).await?;
    match probe.version.api() {
        Some(EtcdApi::V2) => {}
        Some(EtcdApi::V3) => {
            error!("Refusing to restore into etcd {} at {}", probe.version, endpoint);
            return Err(EngineError::from(VersionError::Unsupported {
                endpoint: endpoint.to_string(),
                version: probe.version.to_string(),
            })
            .into());
        }
        None => {
            return Err(EngineError::from(VersionError::Unrecognized {
                endpoint: endpoint.to_string(),
                version: probe.version.to_string(),
            })
            .into());
        }
    }

    let client = open_client(endpoint, EtcdApi::V2, probe.secure, tls).await?;
    debug!("Operating in mirror: {}", mirror.display());

    let report = replay_mirror(&mirror, client.as_ref()).await?;
    info!(
        "✓ Restored {} keys into {} ({} skipped)",
        report.written,
        endpoint,
        report.failed()
    );

    Ok(report)
}

/// All content files below `mirror`. Any traversal error is fatal.
pub async fn content_files(mirror: &Path) -> Result<Vec<PathBuf>> {
    let root = mirror.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let mut found = Vec::new();
        for entry in WalkDir::new(&root).sort_by_file_name() {
            let entry = entry.map_err(|e| traversal_failed(&root, e))?;
            if entry.file_type().is_file() && entry.file_name() == CONTENT_FILE {
                found.push(entry.into_path());
            }
        }
        Ok::<_, anyhow::Error>(found)
    })
    .await
    .map_err(|e| traversal_failed(mirror, e))?
}

fn traversal_failed(path: &Path, reason: impl ToString) -> anyhow::Error {
    EngineError::from(StructuralError::TraversalFailed {
        path: path.display().to_string(),
        reason: reason.to_string(),
    })
    .into()
}

/// Creates one key per content file in `mirror`, skipping the keys that
/// cannot be read or written.
pub async fn replay_mirror(mirror: &Path, store: &dyn KeyStore) -> Result<WalkReport> {
    let mut report = WalkReport::default();

    for path in content_files(mirror).await? {
        let label = path.display().to_string();

        let key = match path.parent().map(|dir| codec::to_key(mirror, dir)) {
            Some(Ok(key)) => key,
            Some(Err(e)) => {
                report.record_failure(&label, e);
                continue;
            }
            None => continue,
        };

        let value = match fs::read(&path).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                report.record_failure(&key, format!("Can't read content file {}: {}", label, e));
                continue;
            }
        };

        match store.create_if_absent(&key, &value).await {
            Ok(()) => {
                debug!("Restored key {} from {}", key, label);
                report.record_written();
            }
            Err(e) => report.record_failure(&key, e),
        }
    }

    Ok(report)
}
