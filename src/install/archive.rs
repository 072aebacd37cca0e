//! Release archive extraction.

use std::path::{Component, Path, PathBuf};

use tracing::warn;

use crate::error::{Result, SetupError};

/// Where an archive entry lands under `dest_dir`.
///
/// Only plain relative names are accepted; absolute paths, `..` and
/// anything carrying a NUL are rejected.
pub fn entry_destination(dest_dir: &Path, entry: &Path) -> Option<PathBuf> {
    if entry.as_os_str().to_string_lossy().contains('\0') {
        return None;
    }
    let mut out = dest_dir.to_path_buf();
    for component in entry.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(out)
}

/// Unpack the directories and regular files of a release tarball.
///
/// Links and special entries are skipped: the release only ships the agent
/// executable and its docs.
fn unpack_release<R: std::io::Read>(archive: &mut tar::Archive<R>, dest_dir: &Path) -> Result<()> {
    for entry in archive.entries()? {
        let mut entry = entry?;
        let name = entry.path()?.into_owned();
        let Some(target) = entry_destination(dest_dir, &name) else {
            return Err(SetupError::Archive(format!(
                "refusing to unpack {} outside {}",
                name.display(),
                dest_dir.display()
            )));
        };

        let kind = entry.header().entry_type();
        if kind.is_dir() {
            std::fs::create_dir_all(&target)?;
        } else if kind.is_file() {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::io::copy(&mut entry, &mut std::fs::File::create(&target)?)?;

            #[cfg(unix)]
            if let Ok(mode) = entry.header().mode() {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(&target, std::fs::Permissions::from_mode(mode))?;
            }
        } else {
            warn!("Skipping {:?} entry {} in release archive", kind, name.display());
        }
    }
    Ok(())
}

/// Extract a `.tar.gz` archive into `dest_dir` on the blocking pool.
pub async fn extract_tar_gz(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    let archive_path = archive_path.to_path_buf();
    let dest_dir = dest_dir.to_path_buf();

    tokio::task::spawn_blocking(move || {
        let file = std::fs::File::open(&archive_path)?;
        let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(file));
        unpack_release(&mut archive, &dest_dir).map_err(|e| match e {
            SetupError::Io(e) => SetupError::Archive(e.to_string()),
            other => other,
        })
    })
    .await
    .map_err(|e| SetupError::Archive(format!("Join error: {}", e)))?
}

/// Find a regular file named `binary_name` anywhere under `dir`.
pub fn find_binary(dir: &Path, binary_name: &str) -> Result<Option<PathBuf>> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            if let Some(found) = find_binary(&path, binary_name)? {
                return Ok(Some(found));
            }
        } else if path.file_name().and_then(|n| n.to_str()) == Some(binary_name) {
            return Ok(Some(path));
        }
    }
    Ok(None)
}

/// Build a gzipped tarball of regular files, for tests.
#[cfg(test)]
pub(crate) fn write_tar_gz(path: &Path, files: &[(&str, &[u8])]) {
    use std::io::Write;

    let file = std::fs::File::create(path).unwrap();
    let gz = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    let mut builder = tar::Builder::new(gz);
    for (name, data) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o755);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_cksum();
        builder.append_data(&mut header, name, *data).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap().flush().unwrap();
}
