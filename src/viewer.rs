//! PDF viewer dispatch.
//!
//! Each backend knows how to open a document at a page. The dispatcher tries
//! its backends in order and stops at the first one that launches.

use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{LookupError, Result};

pub trait ViewerBackend {
    fn name(&self) -> &str;
    fn launch(&self, document: &Path, page: u32) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageArg {
    /// `<program> <flag> <page> <document>`
    Flag(&'static str),
    /// `<program> <document> <page>`
    Trailing,
    /// `<program> file://<document>#page=<page>`
    Url,
}

/// A viewer started as an external program.
#[derive(Debug, Clone)]
pub struct CommandViewer {
    name: &'static str,
    program: OsString,
    page_arg: PageArg,
}

impl CommandViewer {
    fn new(name: &'static str, program: &str, page_arg: PageArg) -> Self {
        Self {
            name,
            program: OsString::from(program),
            page_arg,
        }
    }

    /// Overrides the executable, keeping the argument convention.
    pub fn with_program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }

    fn command(&self, document: &Path, page: u32) -> Command {
        let mut cmd = Command::new(&self.program);
        match self.page_arg {
            PageArg::Flag(flag) => {
                cmd.arg(flag).arg(page.to_string()).arg(document);
            }
            PageArg::Trailing => {
                cmd.arg(document).arg(page.to_string());
            }
            PageArg::Url => {
                let absolute =
                    std::path::absolute(document).unwrap_or_else(|_| document.to_path_buf());
                cmd.arg(format!("file://{}#page={page}", absolute.display()));
            }
        }
        cmd
    }
}

impl ViewerBackend for CommandViewer {
    fn name(&self) -> &str {
        self.name
    }

    fn launch(&self, document: &Path, page: u32) -> Result<()> {
        self.command(document, page)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        Ok(())
    }
}

pub const DEFAULT_ORDER: &[&str] = &["zathura", "evince", "okular", "mupdf", "xpdf", "browser"];

pub fn backend(name: &str) -> Option<CommandViewer> {
    let viewer = match name {
        "zathura" => CommandViewer::new("zathura", "zathura", PageArg::Flag("-P")),
        "evince" => CommandViewer::new("evince", "evince", PageArg::Flag("-i")),
        "okular" => CommandViewer::new("okular", "okular", PageArg::Flag("-p")),
        "mupdf" => CommandViewer::new("mupdf", "mupdf", PageArg::Trailing),
        "xpdf" => CommandViewer::new("xpdf", "xpdf", PageArg::Trailing),
        "browser" => CommandViewer::new("browser", browser_opener(), PageArg::Url),
        _ => return None,
    };
    Some(viewer)
}

fn browser_opener() -> &'static str {
    if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    }
}

pub struct ViewerDispatcher {
    backends: Vec<Box<dyn ViewerBackend>>,
}

impl ViewerDispatcher {
    pub fn new(backends: Vec<Box<dyn ViewerBackend>>) -> Self {
        Self { backends }
    }

    /// Builds a dispatcher from backend names, in the given order.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let mut backends: Vec<Box<dyn ViewerBackend>> = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let viewer = backend(name).ok_or_else(|| {
                LookupError::Config(format!(
                    "unknown viewer `{name}` (known: {})",
                    DEFAULT_ORDER.join(", ")
                ))
            })?;
            backends.push(Box::new(viewer));
        }
        Ok(Self::new(backends))
    }

    pub fn names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Returns the name of the backend that launched.
    pub fn open(&self, document: &Path, page: u32) -> Result<&str> {
        let mut attempted = Vec::with_capacity(self.backends.len());
        for backend in &self.backends {
            match backend.launch(document, page) {
                Ok(()) => return Ok(backend.name()),
                Err(e) => {
                    log::debug!("viewer {} failed: {e}", backend.name());
                    attempted.push(backend.name().to_string());
                }
            }
        }
        Err(LookupError::ViewerUnavailable { attempted })
    }
}

impl Default for ViewerDispatcher {
    fn default() -> Self {
        Self::new(
            DEFAULT_ORDER
                .iter()
                .filter_map(|name| backend(name))
                .map(|v| Box::new(v) as Box<dyn ViewerBackend>)
                .collect(),
        )
    }
}
