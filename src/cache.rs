//! Persistent cache of built mnemonic indexes.
//!
//! One JSON file per document under the cache root, named after the document
//! identity. The identity is a hash of the document's absolute path, not of its
//! contents: editing a PDF in place keeps serving the old index until it is
//! rebuilt explicitly, and large PDFs are never hashed on startup.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::index::MnemonicIndex;

pub fn document_identity(document: &Path) -> String {
    let absolute = std::path::absolute(document).unwrap_or_else(|_| document.to_path_buf());
    let mut hasher = Sha256::new();
    hasher.update(absolute.to_string_lossy().as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone)]
pub struct IndexCache {
    root: PathBuf,
}

impl IndexCache {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entry_path(&self, identity: &str) -> PathBuf {
        self.root.join(format!("{identity}.json"))
    }

    /// Replaces the entry for `identity`. The file is written next to its final
    /// location and renamed into place.
    pub fn save(&self, identity: &str, index: &MnemonicIndex) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;

        let path = self.entry_path(identity);
        let mut tmp_os = path.as_os_str().to_os_string();
        tmp_os.push(format!(".{}.tmp", std::process::id()));
        let tmp = PathBuf::from(tmp_os);

        let json = serde_json::to_vec(index)?;
        std::fs::write(&tmp, json)?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    /// Missing, unreadable and corrupt entries are all treated as a miss.
    pub fn load(&self, identity: &str) -> Option<MnemonicIndex> {
        let path = self.entry_path(identity);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                log::warn!("cannot read cache entry {}: {e}", path.display());
                return None;
            }
        };

        match serde_json::from_slice::<MnemonicIndex>(&bytes) {
            Ok(index) if index.is_consistent() => Some(index),
            Ok(_) => {
                log::warn!("discarding inconsistent cache entry {}", path.display());
                None
            }
            Err(e) => {
                log::warn!("discarding corrupt cache entry {}: {e}", path.display());
                None
            }
        }
    }

    /// Returns whether an entry existed.
    pub fn remove(&self, identity: &str) -> Result<bool> {
        let path = self.entry_path(identity);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::build_index;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "x86_lookup_cache_test_{}_{}_{}",
            std::process::id(),
            nanos,
            name
        ))
    }

    fn sample_index() -> MnemonicIndex {
        build_index(&[
            "INSTRUCTION SET REFERENCE, A-L\n\nADD/ADC—Add\n".to_string(),
            "body".to_string(),
            "INSTRUCTION SET REFERENCE, A-L\n\nJcc—Jump\n".to_string(),
        ])
    }

    #[test]
    fn save_then_load_reconstructs_index() -> anyhow::Result<()> {
        let base = temp_dir("roundtrip");
        let cache = IndexCache::new(base.join("nested").join("cache"));
        let index = sample_index();

        cache.save("doc", &index)?;
        let loaded = cache.load("doc").expect("entry should exist");
        assert_eq!(loaded, index);
        assert_eq!(loaded.page("jnz"), Some(3));

        let _ = std::fs::remove_dir_all(base);
        Ok(())
    }

    #[test]
    fn load_of_missing_entry_is_none() {
        let cache = IndexCache::new(temp_dir("missing"));
        assert!(cache.load("nothing-here").is_none());
    }

    #[test]
    fn corrupt_entry_is_treated_as_miss() -> anyhow::Result<()> {
        let root = temp_dir("corrupt");
        std::fs::create_dir_all(&root)?;
        let cache = IndexCache::new(root.clone());
        std::fs::write(cache.entry_path("doc"), b"{not json")?;
        assert!(cache.load("doc").is_none());

        std::fs::write(
            cache.entry_path("doc"),
            br#"{"page_count":2,"entries":{"add":9}}"#,
        )?;
        assert!(cache.load("doc").is_none());

        let _ = std::fs::remove_dir_all(root);
        Ok(())
    }

    #[test]
    fn save_replaces_previous_entry_wholesale() -> anyhow::Result<()> {
        let base = temp_dir("replace");
        let cache = IndexCache::new(base.clone());
        cache.save("doc", &sample_index())?;

        let replacement = build_index(&["INSTRUCTION SET REFERENCE, M-U\n\nMOV—Move\n"]);
        cache.save("doc", &replacement)?;

        let loaded = cache.load("doc").expect("entry should exist");
        assert_eq!(loaded, replacement);
        assert_eq!(loaded.page("mov"), Some(1));
        assert_eq!(loaded.page("add"), None);
        assert_eq!(loaded.page("jnz"), None);
        assert_eq!(loaded.page_count(), 1);

        let _ = std::fs::remove_dir_all(base);
        Ok(())
    }

    #[test]
    fn remove_reports_whether_entry_existed() -> anyhow::Result<()> {
        let root = temp_dir("remove");
        let cache = IndexCache::new(root.clone());
        cache.save("doc", &sample_index())?;
        assert!(cache.remove("doc")?);
        assert!(!cache.remove("doc")?);
        let _ = std::fs::remove_dir_all(root);
        Ok(())
    }

    #[test]
    fn identity_depends_on_path_only() {
        let a = document_identity(Path::new("/docs/sdm.pdf"));
        let b = document_identity(Path::new("/docs/sdm.pdf"));
        let c = document_identity(Path::new("/docs/renamed.pdf"));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
