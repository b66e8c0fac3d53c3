//! Zip archives of artifact directories, used on the wire by the remote
//! cache.

use std::fs::{self, File};
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use zip::{write::FileOptions, CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{Error, Result};

fn archive_error(path: &Path, err: impl std::fmt::Display) -> Error {
    Error::Archive {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

/// Zips `paths` (files or directory trees). Each path is stored under its
/// own file name at the archive root.
pub fn archive(paths: &[PathBuf]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for path in paths {
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.map_err(|e| archive_error(path, e))?;
            let relative = entry
                .path()
                .strip_prefix(base)
                .map_err(|e| archive_error(entry.path(), e))?;
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            if entry.file_type().is_dir() {
                zip.add_directory(format!("{}/", name), options)
                    .map_err(|e| archive_error(entry.path(), e))?;
            } else {
                let mut data = Vec::new();
                File::open(entry.path())?.read_to_end(&mut data)?;
                zip.start_file(name, options)
                    .map_err(|e| archive_error(entry.path(), e))?;
                zip.write_all(&data)?;
            }
        }
    }

    let cursor = zip
        .finish()
        .map_err(|e| archive_error(Path::new("<memory>"), e))?;
    Ok(cursor.into_inner())
}

/// Unpacks a zip archive into `destination`. Entries that would escape the
/// destination are skipped.
pub fn extract(bytes: &[u8], destination: &Path) -> Result<()> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| archive_error(destination, e))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| archive_error(destination, e))?;
        let Some(enclosed) = entry.enclosed_name().map(|p| destination.join(p)) else {
            continue;
        };
        if entry.name().ends_with('/') || entry.is_dir() {
            fs::create_dir_all(&enclosed)?;
            continue;
        }
        if let Some(parent) = enclosed.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut outfile = File::create(&enclosed)?;
        io::copy(&mut entry, &mut outfile)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                fs::set_permissions(&enclosed, fs::Permissions::from_mode(mode))?;
            }
        }
    }
    Ok(())
}
