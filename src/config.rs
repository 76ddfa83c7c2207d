use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Cli;
use crate::extract::{DEFAULT_TIMEOUT, DEFAULT_TOOL};

pub const PDF_ENV: &str = "X86_LOOKUP_PDF";
pub const CACHE_DIR_ENV: &str = "X86_LOOKUP_CACHE_DIR";
pub const PDFTOTEXT_ENV: &str = "X86_LOOKUP_PDFTOTEXT";
pub const TIMEOUT_ENV: &str = "X86_LOOKUP_TIMEOUT";
pub const VIEWER_ENV: &str = "X86_LOOKUP_VIEWER";

/// Absence is not an error here; the session reports it when the index is
/// first needed.
pub fn resolve_pdf_path(cli: &Cli) -> Option<PathBuf> {
    if let Some(p) = cli.pdf.clone() {
        return Some(p);
    }
    env_path(PDF_ENV)
}

pub fn resolve_cache_dir(cli: &Cli) -> Result<PathBuf> {
    if let Some(p) = cli.cache_dir.clone() {
        return Ok(p);
    }

    if let Some(p) = env_path(CACHE_DIR_ENV) {
        return Ok(p);
    }

    let base = dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .ok_or_else(|| anyhow::anyhow!("Failed to resolve cache directory"))?;
    Ok(base.join("x86-lookup"))
}

pub fn resolve_pdftotext(cli: &Cli) -> PathBuf {
    if let Some(p) = cli.pdftotext.clone() {
        return p;
    }
    env_path(PDFTOTEXT_ENV).unwrap_or_else(|| PathBuf::from(DEFAULT_TOOL))
}

pub fn resolve_timeout(cli: &Cli) -> Result<Duration> {
    if let Some(secs) = cli.timeout {
        return Ok(Duration::from_secs(secs));
    }

    match env::var(TIMEOUT_ENV) {
        Ok(raw) if !raw.trim().is_empty() => {
            let secs = raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{TIMEOUT_ENV} is not a number of seconds: {raw}"))?;
            Ok(Duration::from_secs(secs))
        }
        _ => Ok(DEFAULT_TIMEOUT),
    }
}

/// `None` means the default try-in-order list.
pub fn resolve_viewer(cli: &Cli) -> Option<String> {
    cli.viewer
        .clone()
        .or_else(|| env::var(VIEWER_ENV).ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
