//! Gzipped-tarball extraction into a scratch directory.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;

use super::ProviderError;

/// Unpacks a gzipped tar stream under `dest`. Entries that would escape
/// the destination are skipped rather than written.
pub fn extract_tarball(bytes: &[u8], dest: &Path) -> Result<(), ProviderError> {
    let decoder = GzDecoder::new(Cursor::new(bytes));
    let mut archive = Archive::new(decoder);
    let entries = archive.entries().map_err(|err| ProviderError::Artifact {
        message: format!("unreadable tarball: {err}"),
    })?;

    for entry in entries {
        let mut entry = entry.map_err(|err| ProviderError::Artifact {
            message: format!("corrupt tarball entry: {err}"),
        })?;
        entry.unpack_in(dest).map_err(|err| ProviderError::Artifact {
            message: format!("failed to unpack tarball entry: {err}"),
        })?;
    }
    Ok(())
}

/// Registry tarballs nest everything under `package/`; repository
/// tarballs use a `{owner}-{repo}-{sha}/` prefix. Returns that single
/// top-level directory when present, the extract root otherwise.
pub fn locate_artifact_root(dest: &Path) -> PathBuf {
    let package_dir = dest.join("package");
    if package_dir.is_dir() {
        return package_dir;
    }

    let mut directories = Vec::new();
    let mut has_files = false;
    if let Ok(entries) = fs::read_dir(dest) {
        for entry in entries.flatten() {
            match entry.file_type() {
                Ok(file_type) if file_type.is_dir() => directories.push(entry.path()),
                Ok(_) => has_files = true,
                Err(_) => {}
            }
        }
    }
    if !has_files && directories.len() == 1 {
        return directories.remove(0);
    }
    dest.to_path_buf()
}
