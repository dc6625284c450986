// Image staging: the downloaded comic lives in one local file between the
// download and upload steps. `StagedFile` owns that file; it is removed by
// `cleanup` exactly once, or by `Drop` if cleanup was never reached.

use crate::error::{PublishError, PublishResult};
use crate::transport::Transport;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    bytes: u64,
    removed: bool,
}

impl StagedFile {
    /// Download `url` into `path`. A partially written file is removed
    /// before the error is returned.
    pub fn download<T: Transport>(transport: &T, url: &str, path: &Path) -> PublishResult<Self> {
        let file = File::create(path)?;
        let mut staged = StagedFile {
            path: path.to_path_buf(),
            bytes: 0,
            removed: false,
        };

        let mut writer = BufWriter::new(file);
        let written = transport.download(url, &mut writer).and_then(|n| {
            writer.flush()?;
            Ok(n)
        });
        drop(writer);

        match written {
            Ok(n) => {
                staged.bytes = n;
                if staged.is_empty() {
                    // Nothing worth uploading; the guard removes the empty file.
                    return Err(PublishError::transport(url, "empty response body"));
                }
                log::debug!("staged {} bytes at {}", n, staged.path.display());
                Ok(staged)
            }
            Err(e) => {
                if let Err(cleanup_err) = staged.remove() {
                    log::warn!(
                        "failed to remove partial download {}: {}",
                        staged.path.display(),
                        cleanup_err
                    );
                }
                Err(e)
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> u64 {
        self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes == 0
    }

    /// Delete the staged file. Consumes the handle so it can only run once.
    pub fn cleanup(mut self) -> PublishResult<()> {
        self.remove().map_err(PublishError::from)
    }

    fn remove(&mut self) -> io::Result<()> {
        if self.removed {
            return Ok(());
        }
        self.removed = true;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.removed {
            if let Err(e) = self.remove() {
                log::warn!("failed to remove staged file {}: {}", self.path.display(), e);
            }
        }
    }
}
