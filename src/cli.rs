use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "x86-lookup")]
#[command(about = "Open the Intel SDM at the page documenting an x86 instruction")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Intel SDM PDF (default: $X86_LOOKUP_PDF)
    #[arg(long, value_name = "FILE")]
    pub pdf: Option<PathBuf>,

    /// Index cache directory (default: $X86_LOOKUP_CACHE_DIR, then the platform cache dir)
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// pdftotext executable (default: $X86_LOOKUP_PDFTOTEXT, then `pdftotext`)
    #[arg(long, value_name = "FILE")]
    pub pdftotext: Option<PathBuf>,

    /// Text extraction timeout in seconds (default: $X86_LOOKUP_TIMEOUT, then 120)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Use only this viewer instead of trying each known viewer in turn
    #[arg(long, value_name = "NAME")]
    pub viewer: Option<String>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Open the manual at the mnemonic's page
    Open { mnemonic: String },
    /// Print the mnemonic's page number
    Page { mnemonic: String },
    /// Print every indexed mnemonic
    List {
        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Rebuild the index from the PDF, ignoring the cache
    Rebuild,
    /// Remove the cached index for the PDF
    Clear,
    /// Show the configured PDF, cache entry and index size
    Info,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}
