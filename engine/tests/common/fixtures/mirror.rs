//! Helpers for inspecting archives and building mirrors on disk

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

/// Entry names of a zip archive, in archive order
pub fn archive_entries(archive: &Path) -> Vec<String> {
    let file = File::open(archive).unwrap();
    let mut zip = ZipArchive::new(file).unwrap();
    (0..zip.len())
        .map(|i| zip.by_index(i).unwrap().name().to_string())
        .collect()
}

/// Contents of one archive entry
pub fn archive_entry(archive: &Path, name: &str) -> String {
    let file = File::open(archive).unwrap();
    let mut zip = ZipArchive::new(file).unwrap();
    let mut entry = zip.by_name(name).unwrap();
    let mut contents = String::new();
    entry.read_to_string(&mut contents).unwrap();
    contents
}

/// Writes `(relative path, contents)` pairs below `base`
pub fn write_mirror(base: &Path, entries: &[(&str, &str)]) {
    for (relative, contents) in entries {
        let path = base.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }
}
