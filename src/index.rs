//! Mnemonic index construction.
//!
//! Pages are scanned for an instruction reference heading; matching headings
//! are expanded into concrete mnemonics. When a mnemonic shows up on several
//! pages, the last page in document order wins.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::expand::expand;
use crate::parse::heading_group;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MnemonicIndex {
    page_count: u32,
    entries: BTreeMap<String, u32>,
}

impl MnemonicIndex {
    pub fn page(&self, mnemonic: &str) -> Option<u32> {
        self.entries.get(mnemonic).copied()
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in mnemonic order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn mnemonics(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Checks the structural invariants. Used on indexes read back from disk.
    pub fn is_consistent(&self) -> bool {
        self.entries
            .iter()
            .all(|(k, &p)| !k.is_empty() && p >= 1 && p <= self.page_count)
    }
}

pub fn build_index<S: AsRef<str>>(pages: &[S]) -> MnemonicIndex {
    let page_count = u32::try_from(pages.len()).unwrap_or(u32::MAX);

    let mut entries = BTreeMap::new();
    for (i, text) in pages.iter().enumerate() {
        let page = u32::try_from(i + 1).unwrap_or(u32::MAX);
        let Some(group) = heading_group(text.as_ref()) else {
            continue;
        };
        for (mnemonic, page) in expand(group, page) {
            if mnemonic.is_empty() || page > page_count {
                continue;
            }
            entries.insert(mnemonic, page);
        }
    }

    MnemonicIndex {
        page_count,
        entries,
    }
}
