//! Transient storage for uploaded request bodies.
//!
//! Each upload is staged to a uniquely-named file under the OS temp
//! directory so decoding reads from disk; the file is removed when the
//! guard drops, whatever the request outcome.

use std::path::{Path, PathBuf};

/// A request-scoped temp file. Removal failures are ignored.
pub struct TempUpload {
    path: PathBuf,
}

impl TempUpload {
    /// Stage `bytes` under a name like `frame_server_photo_<random>.png`.
    /// Random suffixes keep concurrent requests collision-free.
    pub async fn write(kind: &str, extension: &str, bytes: &[u8]) -> std::io::Result<Self> {
        let path = std::env::temp_dir().join(format!(
            "frame_server_{}_{}.{}",
            kind,
            rand::random::<u64>(),
            extension
        ));
        tokio::fs::write(&path, bytes).await?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}
