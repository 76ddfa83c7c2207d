use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;
use x86_lookup::cache::{IndexCache, document_identity};
use x86_lookup::cli::{Cli, Commands, OutputFormat};
use x86_lookup::config::{
    resolve_cache_dir, resolve_pdf_path, resolve_pdftotext, resolve_timeout, resolve_viewer,
};
use x86_lookup::error::LookupError;
use x86_lookup::extract::Pdftotext;
use x86_lookup::session::{IndexSource, LookupSession, normalize_mnemonic};
use x86_lookup::viewer::ViewerDispatcher;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = parse_cli()?;
    match run(&cli) {
        Ok(()) => Ok(()),
        Err(err) => {
            if let Some(e) = err.downcast_ref::<LookupError>()
                && e.is_not_found()
            {
                eprintln!("x86-lookup: {e}");
                std::process::exit(1);
            }
            Err(err)
        }
    }
}

fn parse_cli() -> Result<Cli> {
    let args: Vec<String> = std::env::args().collect();
    Ok(Cli::parse_from(rewrite_args_for_implicit_open(args)))
}

fn rewrite_args_for_implicit_open(mut args: Vec<String>) -> Vec<String> {
    if args.len() <= 1 {
        return args;
    }

    let subcommands = ["open", "page", "list", "rebuild", "clear", "info", "help"];
    let valued = ["--pdf", "--cache-dir", "--pdftotext", "--timeout", "--viewer"];

    let mut idx = 1usize;
    while idx < args.len() {
        let a = args[idx].as_str();
        if a == "--" {
            // Everything after `--` is a mnemonic, so `open` goes in front of it.
            if idx + 1 < args.len() {
                args.insert(idx, "open".to_string());
            }
            return args;
        }

        if valued.contains(&a) {
            idx += 2;
            continue;
        }

        if a.starts_with('-') {
            idx += 1;
            continue;
        }

        break;
    }

    if idx < args.len() {
        let token = args[idx].as_str();
        if !subcommands.contains(&token) {
            args.insert(idx, "open".to_string());
        }
    }

    args
}

fn open_session(cli: &Cli) -> Result<LookupSession<Pdftotext>> {
    let extractor = Pdftotext::new(resolve_pdftotext(cli), resolve_timeout(cli)?);
    let cache = IndexCache::new(resolve_cache_dir(cli)?);
    Ok(LookupSession::new(resolve_pdf_path(cli), cache, extractor))
}

fn run(cli: &Cli) -> Result<()> {
    match cli.command.clone() {
        Commands::Open { mnemonic } => {
            let dispatcher = match resolve_viewer(cli) {
                Some(name) => ViewerDispatcher::from_names(&[name])?,
                None => ViewerDispatcher::default(),
            };
            let mut session = open_session(cli)?;
            let page = session.resolve(&mnemonic)?;
            let document = session
                .document()
                .context("no PDF configured")?
                .to_path_buf();
            let viewer = dispatcher.open(&document, page)?;
            log::info!("opened {} at page {page} with {viewer}", document.display());
            println!("{}: page {page}", normalize_mnemonic(&mnemonic));
        }
        Commands::Page { mnemonic } => {
            let mut session = open_session(cli)?;
            println!("{}", session.resolve(&mnemonic)?);
        }
        Commands::List { format } => {
            let mut session = open_session(cli)?;
            let index = session.ensure_index()?;
            match format {
                OutputFormat::Json => {
                    let entries: BTreeMap<&str, u32> = index.iter().collect();
                    println!("{}", serde_json::to_string_pretty(&entries)?);
                }
                OutputFormat::Text => {
                    let mut out = String::new();
                    for (mnemonic, page) in index.iter() {
                        out.push_str(&format!("{mnemonic}\t{page}\n"));
                    }
                    print!("{out}");
                }
            }
        }
        Commands::Rebuild => {
            let mut session = open_session(cli)?;
            let start = Instant::now();
            let index = session.reload()?;
            let summary = BuildSummary {
                mnemonics: index.len(),
                page_count: index.page_count(),
                source: IndexSource::Built,
                duration_ms: start.elapsed().as_millis() as u64,
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Clear => {
            let session = open_session(cli)?;
            let document = session
                .document()
                .context("no PDF configured (use --pdf or set X86_LOOKUP_PDF)")?;
            let identity = document_identity(document);
            let removed = session.cache().remove(&identity).with_context(|| {
                format!(
                    "Failed to remove cache entry: {}",
                    session.cache().entry_path(&identity).display()
                )
            })?;
            let out = ClearResult {
                cache_entry: session.cache().entry_path(&identity).display().to_string(),
                removed,
            };
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Commands::Info => {
            let session = open_session(cli)?;
            let info = info(&session)?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
    }

    Ok(())
}

#[derive(Debug, Serialize)]
struct BuildSummary {
    mnemonics: usize,
    page_count: u32,
    source: IndexSource,
    duration_ms: u64,
}

#[derive(Debug, Serialize)]
struct ClearResult {
    cache_entry: String,
    removed: bool,
}

#[derive(Debug, Serialize)]
struct Info {
    pdf: Option<String>,
    pdf_exists: bool,
    cache_dir: String,
    cache_entry: Option<String>,
    cached_mnemonics: Option<usize>,
    cached_page_count: Option<u32>,
}

fn info(session: &LookupSession<Pdftotext>) -> Result<Info> {
    let cache = session.cache();
    let document = session.document();
    let identity = document.map(document_identity);
    let cached = identity.as_deref().and_then(|id| cache.load(id));

    Ok(Info {
        pdf: document.map(|p| p.display().to_string()),
        pdf_exists: document.is_some_and(Path::is_file),
        cache_dir: cache.root().display().to_string(),
        cache_entry: identity
            .as_deref()
            .map(|id| cache.entry_path(id).display().to_string()),
        cached_mnemonics: cached.as_ref().map(|i| i.len()),
        cached_page_count: cached.as_ref().map(|i| i.page_count()),
    })
}
