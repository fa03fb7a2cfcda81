//! Local filesystem adapter.
//!
//! Implements the `FileSystem` trait from `nocturne-core` through `tokio::fs`.

use std::path::Path;

use nocturne_core::fs::FileSystem;

/// Local filesystem implementation of the `FileSystem` trait.
pub struct LocalFileSystem;

impl LocalFileSystem {
    /// Create a new LocalFileSystem adapter.
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for LocalFileSystem {
    async fn read_file(&self, path: &Path) -> Result<String, std::io::Error> {
        tokio::fs::read_to_string(path).await
    }
}
