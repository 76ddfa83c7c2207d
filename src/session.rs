//! Lookup session: owns the configured document, the cache and the in-memory
//! index for the lifetime of one caller.

use std::path::{Path, PathBuf};

use crate::cache::{IndexCache, document_identity};
use crate::error::{LookupError, Result};
use crate::extract::TextExtractor;
use crate::index::{MnemonicIndex, build_index};

pub struct LookupSession<E: TextExtractor> {
    document: Option<PathBuf>,
    cache: IndexCache,
    extractor: E,
    index: Option<MnemonicIndex>,
}

/// Where the index held by a session came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexSource {
    Memory,
    Cache,
    Built,
}

impl<E: TextExtractor> LookupSession<E> {
    pub fn new(document: Option<PathBuf>, cache: IndexCache, extractor: E) -> Self {
        Self {
            document,
            cache,
            extractor,
            index: None,
        }
    }

    pub fn document(&self) -> Option<&Path> {
        self.document.as_deref()
    }

    pub fn cache(&self) -> &IndexCache {
        &self.cache
    }

    pub fn is_loaded(&self) -> bool {
        self.index.is_some()
    }

    pub fn ensure_index(&mut self) -> Result<&MnemonicIndex> {
        self.ensure_index_from().map(|(index, _)| index)
    }

    /// Like [`ensure_index`](Self::ensure_index), also reporting where the
    /// index came from.
    pub fn ensure_index_from(&mut self) -> Result<(&MnemonicIndex, IndexSource)> {
        if self.index.is_some() {
            return Ok((self.loaded()?, IndexSource::Memory));
        }

        let document = self.checked_document()?;
        let identity = document_identity(&document);
        if let Some(index) = self.cache.load(&identity) {
            log::info!(
                "loaded {} mnemonics for {} from cache",
                index.len(),
                document.display()
            );
            self.index = Some(index);
            return Ok((self.loaded()?, IndexSource::Cache));
        }

        self.rebuild(&document, &identity)?;
        Ok((self.loaded()?, IndexSource::Built))
    }

    /// Drops the in-memory index and rebuilds it from the document, replacing
    /// the cache entry.
    pub fn reload(&mut self) -> Result<&MnemonicIndex> {
        self.reset();
        let document = self.checked_document()?;
        let identity = document_identity(&document);
        self.rebuild(&document, &identity)?;
        self.loaded()
    }

    pub fn reset(&mut self) {
        self.index = None;
    }

    pub fn resolve(&mut self, mnemonic: &str) -> Result<u32> {
        let key = normalize_mnemonic(mnemonic);
        self.ensure_index()?
            .page(&key)
            .ok_or_else(|| LookupError::NotFound(key))
    }

    /// Non-failing variant of [`resolve`](Self::resolve) for completion and
    /// suggestion lists: absent mnemonics are `None`, index errors still
    /// propagate.
    pub fn lookup(&mut self, mnemonic: &str) -> Result<Option<u32>> {
        match self.resolve(mnemonic) {
            Ok(page) => Ok(Some(page)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn mnemonics(&mut self) -> Result<Vec<&str>> {
        Ok(self.ensure_index()?.mnemonics().collect())
    }

    fn rebuild(&mut self, document: &Path, identity: &str) -> Result<()> {
        log::info!("building mnemonic index for {}", document.display());
        let pages = self.extractor.extract_pages(document)?;
        let index = build_index(&pages);
        log::info!(
            "indexed {} mnemonics across {} pages",
            index.len(),
            index.page_count()
        );

        if let Err(e) = self.cache.save(identity, &index) {
            log::warn!(
                "failed to write cache entry {}: {e}",
                self.cache.entry_path(identity).display()
            );
        }
        self.index = Some(index);
        Ok(())
    }

    fn loaded(&self) -> Result<&MnemonicIndex> {
        self.index
            .as_ref()
            .ok_or_else(|| LookupError::Config("mnemonic index is not loaded".to_string()))
    }

    fn checked_document(&self) -> Result<PathBuf> {
        let document = self.document.as_ref().ok_or_else(|| {
            LookupError::Config(
                "no PDF configured (use --pdf or set X86_LOOKUP_PDF)".to_string(),
            )
        })?;
        if !document.is_file() {
            return Err(LookupError::Config(format!(
                "PDF not found: {}",
                document.display()
            )));
        }
        Ok(document.clone())
    }
}

pub fn normalize_mnemonic(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::time::{SystemTime, UNIX_EPOCH};

    struct FakeExtractor {
        pages: RefCell<Vec<String>>,
        calls: Cell<usize>,
    }

    impl FakeExtractor {
        fn new(pages: Vec<String>) -> Self {
            Self {
                pages: RefCell::new(pages),
                calls: Cell::new(0),
            }
        }

        fn replace_pages(&self, pages: Vec<String>) {
            *self.pages.borrow_mut() = pages;
        }
    }

    impl TextExtractor for &FakeExtractor {
        fn extract_pages(&self, _document: &Path) -> Result<Vec<String>> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.pages.borrow().clone())
        }
    }

    struct FailingExtractor;

    impl TextExtractor for FailingExtractor {
        fn extract_pages(&self, _document: &Path) -> Result<Vec<String>> {
            Err(LookupError::ToolMissing {
                tool: "pdftotext".to_string(),
            })
        }
    }

    fn temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "x86_lookup_session_test_{}_{}_{}",
            std::process::id(),
            nanos,
            name
        ))
    }

    fn fixture(name: &str) -> (PathBuf, PathBuf) {
        let base = temp_dir(name);
        std::fs::create_dir_all(&base).unwrap();
        let pdf = base.join("sdm.pdf");
        std::fs::write(&pdf, b"%PDF-1.4").unwrap();
        (base, pdf)
    }

    fn manual_pages() -> Vec<String> {
        vec![
            "Intel 64 and IA-32 Architectures".to_string(),
            "INSTRUCTION SET REFERENCE, A-L\n\nADD—Add\n".to_string(),
            "INSTRUCTION SET REFERENCE, M-U\n\nMOV—Move\n".to_string(),
        ]
    }

    #[test]
    fn resolve_returns_stored_page_and_not_found_for_absent_key() {
        let (base, pdf) = fixture("resolve");
        let extractor = FakeExtractor::new(manual_pages());
        let mut session =
            LookupSession::new(Some(pdf), IndexCache::new(base.join("cache")), &extractor);

        assert_eq!(session.resolve("MOV").unwrap(), 3);
        assert_eq!(session.resolve(" add ").unwrap(), 2);
        assert!(session.resolve("zzz").unwrap_err().is_not_found());
        assert_eq!(session.lookup("zzz").unwrap(), None);

        let _ = std::fs::remove_dir_all(base);
    }

    #[test]
    fn ensure_index_is_memoized_and_cached() {
        let (base, pdf) = fixture("memo");
        let cache = IndexCache::new(base.join("cache"));
        let extractor = FakeExtractor::new(manual_pages());

        let mut session = LookupSession::new(Some(pdf.clone()), cache.clone(), &extractor);
        assert_eq!(session.ensure_index_from().unwrap().1, IndexSource::Built);
        assert_eq!(session.ensure_index_from().unwrap().1, IndexSource::Memory);
        assert_eq!(extractor.calls.get(), 1);

        let mut fresh = LookupSession::new(Some(pdf), cache, &extractor);
        assert_eq!(fresh.ensure_index_from().unwrap().1, IndexSource::Cache);
        assert_eq!(extractor.calls.get(), 1);

        fresh.reset();
        assert!(!fresh.is_loaded());
        fresh.reload().unwrap();
        assert_eq!(extractor.calls.get(), 2);

        let _ = std::fs::remove_dir_all(base);
    }

    #[test]
    fn reload_replaces_memory_and_cached_index() {
        let (base, pdf) = fixture("reload");
        let cache = IndexCache::new(base.join("cache"));
        let extractor = FakeExtractor::new(manual_pages());

        let mut session = LookupSession::new(Some(pdf.clone()), cache.clone(), &extractor);
        assert_eq!(session.resolve("add").unwrap(), 2);

        extractor.replace_pages(vec![
            "INSTRUCTION SET REFERENCE, M-U\nfiller".to_string(),
            "INSTRUCTION SET REFERENCE, M-U\n\nNOP—No Operation\n".to_string(),
        ]);
        let reloaded = session.reload().unwrap().clone();
        assert_eq!(reloaded.page("nop"), Some(2));
        assert_eq!(reloaded.page_count(), 2);

        assert!(session.resolve("add").unwrap_err().is_not_found());
        assert!(session.resolve("mov").unwrap_err().is_not_found());
        assert_eq!(session.resolve("NOP").unwrap(), 2);

        let stored = cache.load(&document_identity(&pdf)).expect("entry rewritten");
        assert_eq!(stored, reloaded);
        assert_eq!(stored.page("add"), None);

        let mut fresh = LookupSession::new(Some(pdf), cache, &extractor);
        assert_eq!(fresh.ensure_index_from().unwrap().1, IndexSource::Cache);
        assert_eq!(fresh.mnemonics().unwrap(), vec!["nop"]);
        assert_eq!(extractor.calls.get(), 2);

        let _ = std::fs::remove_dir_all(base);
    }

    #[test]
    fn missing_configuration_is_a_config_error() {
        let base = temp_dir("config");
        let cache = IndexCache::new(base.join("cache"));

        let mut unset = LookupSession::new(None, cache.clone(), FailingExtractor);
        assert!(matches!(
            unset.ensure_index().unwrap_err(),
            LookupError::Config(_)
        ));

        let mut absent = LookupSession::new(Some(base.join("gone.pdf")), cache, FailingExtractor);
        assert!(matches!(
            absent.resolve("add").unwrap_err(),
            LookupError::Config(_)
        ));
    }

    #[test]
    fn extraction_failure_is_not_an_empty_index() {
        let (base, pdf) = fixture("toolmissing");
        let mut session =
            LookupSession::new(Some(pdf), IndexCache::new(base.join("cache")), FailingExtractor);
        assert!(matches!(
            session.ensure_index().unwrap_err(),
            LookupError::ToolMissing { .. }
        ));
        assert!(!session.is_loaded());
        let _ = std::fs::remove_dir_all(base);
    }

    #[test]
    fn mnemonics_are_sorted() {
        let (base, pdf) = fixture("list");
        let extractor = FakeExtractor::new(manual_pages());
        let mut session =
            LookupSession::new(Some(pdf), IndexCache::new(base.join("cache")), &extractor);
        assert_eq!(session.mnemonics().unwrap(), vec!["add", "mov"]);
        let _ = std::fs::remove_dir_all(base);
    }
}
