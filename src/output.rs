use std::path::Path;

use tracing::debug;

use crate::error::Result;

/// Persists rendered files.
pub trait FileWriter {
    fn write_file(&self, path: &Path, bytes: &[u8]) -> Result<()>;
}

impl<T: FileWriter + ?Sized> FileWriter for &T {
    fn write_file(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        (**self).write_file(path, bytes)
    }
}

/// Writes to the local filesystem, creating parent directories as needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileWriter;

impl FileWriter for LocalFileWriter {
    fn write_file(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, bytes)?;
        debug!("wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }
}
