//! Agent binary acquisition.
//!
//! [`ReleaseInstaller`] downloads the bouheki release tarball, unpacks it in
//! a scratch directory and copies the executable into place with
//! [`PrivilegedExec`]. An existing binary at the destination is left alone.

pub mod archive;

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::error::{Result, SetupError};
use crate::exec::PrivilegedExec;

pub const USER_AGENT: &str = concat!("bouheki-setup/", env!("CARGO_PKG_VERSION"));

pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Substitute `{version}` in a release URL template.
pub fn release_url(template: &str, version: &str) -> String {
    template.replace("{version}", version)
}

/// Makes sure the agent executable exists at a given path.
#[allow(async_fn_in_trait)]
pub trait BinaryProvider {
    /// Install `version` at `dest` unless something is already there, and
    /// return the path of the installed binary.
    async fn ensure_binary_installed(&self, version: &str, dest: &Path) -> Result<PathBuf>;
}

/// Installs the agent from its GitHub release archive.
pub struct ReleaseInstaller<E> {
    client: Client,
    exec: E,
    url_template: String,
    binary_name: String,
}

impl<E: PrivilegedExec> ReleaseInstaller<E> {
    pub fn new(
        exec: E,
        url_template: impl Into<String>,
        binary_name: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(DOWNLOAD_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            exec,
            url_template: url_template.into(),
            binary_name: binary_name.into(),
        })
    }

    /// Fetch `url` into `path`.
    async fn download(&self, url: &str, path: &Path) -> Result<()> {
        let mut response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(SetupError::Download(format!(
                "GET {} returned {}",
                url,
                response.status()
            )));
        }

        let mut file = tokio::fs::File::create(path).await?;
        let mut downloaded: u64 = 0;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
        }
        file.flush().await?;

        info!("Downloaded {} ({} bytes)", url, downloaded);
        Ok(())
    }

    /// Unpack a release archive and install its executable at `dest`.
    pub async fn install_from_archive(&self, archive_path: &Path, dest: &Path) -> Result<PathBuf> {
        let unpack_dir = tempfile::tempdir()?;
        archive::extract_tar_gz(archive_path, unpack_dir.path()).await?;

        let binary = archive::find_binary(unpack_dir.path(), &self.binary_name)?.ok_or_else(|| {
            SetupError::Archive(format!(
                "'{}' not found in {}",
                self.binary_name,
                archive_path.display()
            ))
        })?;

        let src = binary.to_string_lossy().to_string();
        let dst = dest.to_string_lossy().to_string();
        self.exec.run("cp", &[&src, &dst])?;
        self.exec.run("chmod", &["+x", &dst])?;

        info!("Installed {} to {}", self.binary_name, dest.display());
        Ok(dest.to_path_buf())
    }
}

impl<E: PrivilegedExec> BinaryProvider for ReleaseInstaller<E> {
    async fn ensure_binary_installed(&self, version: &str, dest: &Path) -> Result<PathBuf> {
        if dest.exists() {
            info!("{} already installed, skipping download", dest.display());
            return Ok(dest.to_path_buf());
        }

        let url = release_url(&self.url_template, version);
        info!("Downloading {} {} from {}", self.binary_name, version, url);

        let download_dir = tempfile::tempdir()?;
        let archive_path = download_dir.path().join(format!("{}.tar.gz", self.binary_name));
        self.download(&url, &archive_path).await?;

        self.install_from_archive(&archive_path, dest).await
    }
}
