use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::error::{LookupError, Result};
use crate::parse::split_pages;

pub const DEFAULT_TOOL: &str = "pdftotext";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Source of page-delimited document text.
pub trait TextExtractor {
    fn extract_pages(&self, document: &Path) -> Result<Vec<String>>;
}

/// Runs `pdftotext <document> -` and splits its output on form feeds.
#[derive(Debug, Clone)]
pub struct Pdftotext {
    tool: PathBuf,
    timeout: Duration,
}

impl Pdftotext {
    pub fn new(tool: PathBuf, timeout: Duration) -> Self {
        Self { tool, timeout }
    }

    pub fn tool(&self) -> &Path {
        &self.tool
    }

    pub fn extract_text(&self, document: &Path) -> Result<String> {
        let tool_name = self.tool.to_string_lossy().to_string();
        let mut child = Command::new(&self.tool)
            .arg("-enc")
            .arg("UTF-8")
            .arg(document)
            .arg("-")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => LookupError::ToolMissing {
                    tool: tool_name.clone(),
                },
                _ => LookupError::Io(e),
            })?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match wait_with_timeout(&mut child, self.timeout)? {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(LookupError::ToolTimeout {
                    tool: tool_name,
                    timeout: self.timeout,
                });
            }
        };

        let stdout = join_drain(stdout);
        let stderr = join_drain(stderr);

        if !status.success() {
            return Err(LookupError::ToolFailed {
                tool: tool_name,
                status: status.to_string(),
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&stdout).to_string())
    }
}

impl Default for Pdftotext {
    fn default() -> Self {
        Self::new(PathBuf::from(DEFAULT_TOOL), DEFAULT_TIMEOUT)
    }
}

impl TextExtractor for Pdftotext {
    fn extract_pages(&self, document: &Path) -> Result<Vec<String>> {
        log::info!(
            "extracting text from {} with {}",
            document.display(),
            self.tool.display()
        );
        let text = self.extract_text(document)?;
        Ok(split_pages(&text))
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    })
}

fn join_drain(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

/// A timeout too large to represent as an `Instant` means no deadline.
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<Option<ExitStatus>> {
    let deadline = Instant::now().checked_add(timeout);
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            return Ok(None);
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}
