//! Backup: mirror an etcd v2 keyspace onto disk and seal it
//!
//! 1. Probe the endpoint (protocol 2 only)
//! 2. List the keyspace recursively from `/`
//! 3. Create a directory per key, and a `content` file per leaf value
//! 4. Seal `<target>/<basename>/` into `<target>/<basename>.zip`
//! 5. Remove the mirror directory
//!
//! A key that cannot be written is logged and skipped; the walk goes on.

use anyhow::Result;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info};

use crate::archive;
use crate::client::{open_client, KeyNode};
use crate::codec;
use crate::config::TlsConfig;
use crate::discovery::{probe_etcd, EtcdApi};
use crate::errors::{EngineError, StructuralError, VersionError};
use crate::report::WalkReport;

/// What a finished backup produced
#[derive(Debug, Clone)]
pub struct BackupOutcome {
    pub basename: String,
    pub archive: PathBuf,
    pub report: WalkReport,
}

/// Writes `value` as the content of `key` in the mirror at `base` and
/// returns the path of the content file. Nothing is written for an invalid
/// key.
pub async fn store(base: &Path, key: &str, value: &str) -> Result<PathBuf> {
    let content = codec::content_path(base, key)?;
    if let Some(dir) = content.parent() {
        fs::create_dir_all(dir).await?;
    }

    fs::write(&content, value).await?;
    debug!("Stored key {} in {}", key, content.display());

    Ok(content)
}

/// Creates the mirror directory of an internal key
async fn store_dir(base: &Path, key: &str) -> Result<PathBuf> {
    let dir = codec::to_path(base, key)?;
    fs::create_dir_all(&dir).await?;
    Ok(dir)
}

/// Mirrors every node under `root` into `base`
pub async fn mirror_tree(base: &Path, root: &KeyNode) -> WalkReport {
    let mut report = WalkReport::default();
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        if node.dir {
            if !node.is_root() {
                if let Err(e) = store_dir(base, &node.key).await {
                    let reason = e.to_string();
                    // Every leaf below is lost with its directory.
                    for (key, _) in node.leaves() {
                        report.record_failure(
                            key,
                            format!("parent {} not mirrored: {}", node.key, reason),
                        );
                    }
                    report.record_failure(&node.key, reason);
                    continue;
                }
            }
            stack.extend(node.children.iter().rev());
            continue;
        }

        let value = node.value.as_deref().unwrap_or_default();
        match store(base, &node.key, value).await {
            Ok(_) => report.record_written(),
            Err(e) => report.record_failure(&node.key, e),
        }
    }

    report
}

/// An unreadable location counts as taken
async fn path_taken(path: &Path) -> bool {
    fs::try_exists(path).await.unwrap_or(true)
}

/// Backs up `endpoint` into `<target>/<unix timestamp>.zip`
pub async fn backup(endpoint: &str, tls: &TlsConfig, target: &Path) -> Result<BackupOutcome> {
    let basename = Utc::now().timestamp().to_string();
    backup_named(endpoint, tls, target, &basename).await
}

pub async fn backup_named(
    endpoint: &str,
    tls: &TlsConfig,
    target: &Path,
    basename: &str,
) -> Result<BackupOutcome> {
    info!("Starting backup of {} as {}", endpoint, basename);

    let mirror = target.join(basename);
    let archive_file = archive::archive_path(&mirror);
    if path_taken(&mirror).await {
        return Err(EngineError::from(StructuralError::MirrorFailed {
            path: mirror.display().to_string(),
            reason: "mirror directory already exists".to_string(),
        })
        .into());
    }
    if path_taken(&archive_file).await {
        return Err(EngineError::from(StructuralError::ArchiveFailed {
            path: archive_file.display().to_string(),
            reason: "archive already exists".to_string(),
        })
        .into());
    }

    let probe = probe_etcd(endpoint, tls).await?;
    match probe.version.api() {
        Some(EtcdApi::V2) => {}
        Some(EtcdApi::V3) => {
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
    let root = client.list().await.map_err(|e| {
        error!("Can't list keyspace of {}: {}", endpoint, e);
        e
    })?;

    fs::create_dir_all(&mirror).await.map_err(|e| {
        EngineError::from(StructuralError::MirrorFailed {
            path: mirror.display().to_string(),
            reason: e.to_string(),
        })
    })?;

    let report = mirror_tree(&mirror, &root).await;
    info!(
        "Mirrored {} keys of {} into {} ({} skipped)",
        report.written,
        endpoint,
        mirror.display(),
        report.failed()
    );

    let sealed = archive::seal(&mirror).await;

    if let Err(e) = fs::remove_dir_all(&mirror).await {
        debug!("Leaving mirror {} in place: {}", mirror.display(), e);
    }
    let archive = sealed?;

    info!("✓ Backup {} written to {}", basename, archive.display());

    Ok(BackupOutcome {
        basename: basename.to_string(),
        archive,
        report,
    })
}
