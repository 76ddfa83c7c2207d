//! # x86-lookup
//!
//! Jump from an x86 instruction mnemonic to the page of the Intel Software
//! Developer's Manual that documents it.
//!
//! ## Architecture
//!
//! - **expand**: Mnemonic group expansion (`Jcc` → `ja`, `jae`, ...)
//! - **parse**: Page splitting and instruction reference heading detection
//! - **index**: Mnemonic-to-page index construction
//! - **extract**: `pdftotext` integration
//! - **cache**: Persistent per-document index cache
//! - **session**: Build-or-load lookup session
//! - **viewer**: PDF viewer dispatch
//! - **config**: Settings from flags, environment and platform defaults
//! - **error**: Error taxonomy

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod expand;
pub mod extract;
pub mod index;
pub mod parse;
pub mod session;
pub mod viewer;
