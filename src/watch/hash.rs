// src/watch/hash.rs

//! Content hashing for `use_hash`.

use std::path::Path;

use anyhow::{Context, Result};
use blake3::Hasher;

use crate::fs::FileSystem;

/// Hex digest of `bytes`.
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.finalize().to_hex().to_string()
}

/// Compute the hash of a single file.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let bytes = fs
        .read(path)
        .with_context(|| format!("reading file for hashing: {:?}", path))?;
    Ok(hash_bytes(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn same_content_same_hash() {
        let fs = MockFileSystem::new();
        fs.add_file("/a.less", "a{}");
        fs.add_file("/b.less", "a{}");
        fs.add_file("/c.less", "c{}");

        let a = compute_file_hash(&fs, Path::new("/a.less")).unwrap();
        assert_eq!(a, compute_file_hash(&fs, Path::new("/b.less")).unwrap());
        assert_ne!(a, compute_file_hash(&fs, Path::new("/c.less")).unwrap());
        assert!(compute_file_hash(&fs, Path::new("/missing.less")).is_err());
    }
}
