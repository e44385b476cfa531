//! Sealing a mirror directory into `<basename>.zip` and unpacking it again
//!
//! Entries are rooted at `<basename>/` and written in file-name order, so
//! the same mirror always yields the same entry list. Directory entries are
//! kept to preserve keys that are empty directories.

use anyhow::Result;
use std::ffi::OsString;
use std::fmt::Display;
use std::fs::File;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::constants::mirror::ARCHIVE_EXTENSION;
use crate::errors::{EngineError, StructuralError};

fn archive_failed(path: &Path, reason: impl Display) -> anyhow::Error {
    EngineError::from(StructuralError::ArchiveFailed {
        path: path.display().to_string(),
        reason: reason.to_string(),
    })
    .into()
}

fn unpack_failed(path: &Path, reason: impl Display) -> anyhow::Error {
    EngineError::from(StructuralError::UnpackFailed {
        path: path.display().to_string(),
        reason: reason.to_string(),
    })
    .into()
}

/// `<dir>/<basename>.zip` for the mirror at `<dir>/<basename>`
pub fn archive_path(mirror: &Path) -> PathBuf {
    let mut name = OsString::from(mirror.as_os_str());
    name.push(".");
    name.push(ARCHIVE_EXTENSION);
    PathBuf::from(name)
}

/// Zip entry name for `relative` inside the mirror named `basename`
fn entry_name(basename: &str, relative: &Path) -> Option<String> {
    let mut name = basename.to_string();
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                name.push('/');
                name.push_str(part.to_str()?);
            }
            _ => return None,
        }
    }
    Some(name)
}

pub async fn seal(mirror: &Path) -> Result<PathBuf> {
    let mirror = mirror.to_path_buf();
    let join_path = mirror.clone();
    tokio::task::spawn_blocking(move || seal_blocking(&mirror))
        .await
        .map_err(|e| archive_failed(&join_path, e))?
}

pub async fn unseal(archive: &Path, target: &Path) -> Result<PathBuf> {
    let archive = archive.to_path_buf();
    let target = target.to_path_buf();
    let join_path = archive.clone();
    tokio::task::spawn_blocking(move || unseal_blocking(&archive, &target))
        .await
        .map_err(|e| unpack_failed(&join_path, e))?
}

fn seal_blocking(mirror: &Path) -> Result<PathBuf> {
    let basename = mirror
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| archive_failed(mirror, "mirror has no UTF-8 base name"))?;
    let archive = archive_path(mirror);

    info!("Archiving {} into {}", mirror.display(), archive.display());

    // Never overwrite an earlier backup
    let file = File::create_new(&archive).map_err(|e| archive_failed(&archive, e))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut entries = 0usize;
    for entry in WalkDir::new(mirror).sort_by_file_name() {
        let entry = entry.map_err(|e| archive_failed(mirror, e))?;
        let relative = entry
            .path()
            .strip_prefix(mirror)
            .map_err(|e| archive_failed(entry.path(), e))?;
        let name = entry_name(basename, relative)
            .ok_or_else(|| archive_failed(entry.path(), "path is not valid UTF-8"))?;

        if entry.file_type().is_dir() {
            zip.add_directory(format!("{}/", name), options)
                .map_err(|e| archive_failed(entry.path(), e))?;
        } else if entry.file_type().is_file() {
            zip.start_file(name.as_str(), options)
                .map_err(|e| archive_failed(entry.path(), e))?;
            let mut source = File::open(entry.path()).map_err(|e| archive_failed(entry.path(), e))?;
            io::copy(&mut source, &mut zip).map_err(|e| archive_failed(entry.path(), e))?;
        } else {
            debug!("Skipping {}: not a file or directory", entry.path().display());
            continue;
        }
        debug!("{}", name);
        entries += 1;
    }

    zip.finish().map_err(|e| archive_failed(&archive, e))?;
    info!("Archive {} written with {} entries", archive.display(), entries);

    Ok(archive)
}

fn unseal_blocking(archive: &Path, target: &Path) -> Result<PathBuf> {
    debug!("Unpacking {} into {}", archive.display(), target.display());

    let stem = archive
        .file_stem()
        .ok_or_else(|| unpack_failed(archive, "archive has no file name"))?;

    let file = File::open(archive).map_err(|e| unpack_failed(archive, e))?;
    let mut zip = ZipArchive::new(file).map_err(|e| unpack_failed(archive, e))?;

    let mirror = target.join(stem);
    if mirror.exists() {
        debug!("Removing earlier mirror {}", mirror.display());
        std::fs::remove_dir_all(&mirror).map_err(|e| unpack_failed(archive, e))?;
    }

    zip.extract(target).map_err(|e| unpack_failed(archive, e))?;
    if !mirror.is_dir() {
        return Err(unpack_failed(
            archive,
            format!("archive holds no {}/ directory", stem.to_string_lossy()),
        ));
    }

    info!("Unpacked {} entries into {}", zip.len(), mirror.display());
    Ok(mirror)
}
