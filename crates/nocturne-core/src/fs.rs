//! FileSystem trait for abstracting file reads.
//!
//! Defined in nocturne-core so the dispatcher and notifier can read the
//! instructions and summary files without depending on a specific
//! filesystem implementation. The `LocalFileSystem` adapter lives in
//! nocturne-infra.

use std::path::Path;

/// Abstraction over filesystem reads.
pub trait FileSystem: Send + Sync {
    /// Read a file's content as a string.
    fn read_file(
        &self,
        path: &Path,
    ) -> impl std::future::Future<Output = Result<String, std::io::Error>> + Send;
}
