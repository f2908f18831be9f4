//! Fingerprints of tracked source files.
//!
//! A fingerprint hashes each existing file's path, modification time (in
//! nanoseconds since the Unix epoch) and size. Touching, editing or
//! resizing any tracked file changes it; missing files are skipped.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::UNIX_EPOCH;

/// Hex MD5 over `"{path}:{mtime_nanos}:{size}:"` for each existing file,
/// in the given order.
#[must_use]
pub fn fingerprint(files: &[PathBuf]) -> String {
    let mut content = String::new();

    for path in files {
        let metadata = match std::fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(_) => continue,
        };

        let mtime_nanos = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map_or(0, |d| d.as_nanos());

        let _ = write!(
            content,
            "{}:{mtime_nanos}:{}:",
            path.display(),
            metadata.len()
        );
    }

    format!("{:x}", md5::compute(content.as_bytes()))
}
