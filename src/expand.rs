//! Expansion of compact mnemonic groups into individual lookup keys.
//!
//! A heading such as `CMOVcc` or `LOOP/LOOPcc` names many concrete mnemonics.
//! Each `/`-separated spelling is matched against an ordered rule table; the
//! first rule whose pattern matches the end of the spelling decides which
//! suffixes replace the matched part.

use regex::Regex;
use std::sync::OnceLock;

use crate::error::{LookupError, Result};

const CONDITION_CODES: &[&str] = &[
    "a", "ae", "b", "be", "c", "e", "g", "ge", "l", "le", "na", "nae", "nb", "nbe", "nc", "ne",
    "ng", "nge", "nl", "nle", "no", "np", "ns", "nz", "o", "p", "pe", "po", "s", "z",
];

/// The Jcc page also documents the counter-register jumps.
const JUMP_CONDITIONS: &[&str] = &[
    "ja", "jae", "jb", "jbe", "jc", "jcxz", "je", "jecxz", "jg", "jge", "jl", "jle", "jna",
    "jnae", "jnb", "jnbe", "jnc", "jne", "jng", "jnge", "jnl", "jnle", "jno", "jnp", "jns",
    "jnz", "jo", "jp", "jpe", "jpo", "jrcxz", "js", "jz",
];

const DEFAULT_RULES: &[(&str, &[&str])] = &[
    (
        "^FCMOVcc$",
        &[
            "fcmovb", "fcmove", "fcmovbe", "fcmovu", "fcmovnb", "fcmovne", "fcmovnbe", "fcmovnu",
        ],
    ),
    ("^Jcc$", JUMP_CONDITIONS),
    ("^LOOPcc$", &["loope", "loopne", "loopz", "loopnz"]),
    (
        "^PREFETCHh$",
        &["prefetcht0", "prefetcht1", "prefetcht2", "prefetchnta"],
    ),
    ("cc$", CONDITION_CODES),
    ("$", &[""]),
];

#[derive(Debug, Clone)]
pub struct ExpansionRule {
    pattern: Regex,
    suffixes: Vec<String>,
}

impl ExpansionRule {
    /// The pattern must be anchored at the end (`...$`) so that it always
    /// describes a suffix of the spelling.
    pub fn new(pattern: &str, suffixes: &[&str]) -> Result<Self> {
        if !pattern.ends_with('$') || pattern.ends_with("\\$") {
            return Err(LookupError::InvalidRule {
                pattern: pattern.to_string(),
                reason: "pattern must be anchored with a trailing `$`".to_string(),
            });
        }
        if suffixes.is_empty() {
            return Err(LookupError::InvalidRule {
                pattern: pattern.to_string(),
                reason: "suffix list is empty".to_string(),
            });
        }
        let pattern = Regex::new(pattern).map_err(|e| LookupError::InvalidRule {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            pattern,
            suffixes: suffixes.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Catch-all terminal rule: identity expansion.
    pub fn identity() -> Self {
        Self {
            pattern: Regex::new("$").expect("static pattern"),
            suffixes: vec![String::new()],
        }
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    /// Byte offset where the matched suffix starts, if the rule applies.
    fn match_start(&self, spelling: &str) -> Option<usize> {
        self.pattern
            .find_iter(spelling)
            .find(|m| m.end() == spelling.len())
            .map(|m| m.start())
    }
}

pub fn default_rules() -> &'static [ExpansionRule] {
    static RULES: OnceLock<Vec<ExpansionRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        DEFAULT_RULES
            .iter()
            .map(|(pattern, suffixes)| {
                ExpansionRule::new(pattern, suffixes).expect("built-in expansion rule is valid")
            })
            .collect()
    })
}

pub fn expand(raw_group: &str, page: u32) -> Vec<(String, u32)> {
    expand_with(default_rules(), raw_group, page)
}

/// Expands with a caller-supplied table. If no rule matches a spelling it is
/// emitted unchanged (lower-cased), as if the table ended with
/// [`ExpansionRule::identity`].
pub fn expand_with(rules: &[ExpansionRule], raw_group: &str, page: u32) -> Vec<(String, u32)> {
    let mut out = Vec::new();
    for spelling in raw_group.split('/') {
        let spelling = spelling.trim();
        if spelling.is_empty() {
            continue;
        }

        let matched = rules
            .iter()
            .find_map(|rule| rule.match_start(spelling).map(|start| (rule, start)));

        match matched {
            Some((rule, start)) => {
                let stem = spelling[..start].to_lowercase();
                for suffix in rule.suffixes() {
                    out.push((format!("{stem}{suffix}"), page));
                }
            }
            None => out.push((spelling.to_lowercase(), page)),
        }
    }
    out
}
