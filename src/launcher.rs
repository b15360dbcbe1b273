use std::io::Write;
use std::process::Command;

use tracing::debug;

use crate::error::{BbError, Result};

pub const EMPTY_LOG: &str = "No log output returned for this step.";

/// Open `url` in the system browser.
pub fn open_url(url: &str) -> Result<()> {
    open::that(url).map_err(|e| BbError::Launcher(format!("{}: {}", url, e)))
}

/// Detect the viewer for logs and diffs.
/// Checks BBTUI_VIEWER -> nvim on PATH -> PAGER -> "less"
pub fn detect_viewer() -> String {
    choose_viewer(
        std::env::var("BBTUI_VIEWER").ok(),
        which::which("nvim").is_ok(),
        std::env::var("PAGER").ok(),
    )
}

fn choose_viewer(explicit: Option<String>, has_nvim: bool, pager: Option<String>) -> String {
    if let Some(viewer) = explicit.filter(|v| !v.trim().is_empty()) {
        return viewer;
    }
    if has_nvim {
        return "nvim -R".to_string();
    }
    if let Some(pager) = pager.filter(|p| !p.trim().is_empty()) {
        return pager;
    }
    "less".to_string()
}

/// Write `text` to a temp file and block until the detected viewer exits.
/// The terminal must already be released by the caller.
pub fn open_in_viewer(text: &str, title: &str) -> Result<()> {
    run_viewer(text, title, &detect_viewer())
}

fn run_viewer(text: &str, title: &str, viewer: &str) -> Result<()> {
    let mut file = tempfile::Builder::new()
        .prefix(&format!("bb-{}-", file_stem(title)))
        .suffix(".log")
        .tempfile()?;
    file.write_all(viewer_content(text).as_bytes())?;
    file.flush()?;

    let path = file.path().to_string_lossy().into_owned();
    debug!(viewer, %path, "opening viewer");

    // The path is passed as $1 so it never needs shell quoting.
    let status = Command::new("sh")
        .args(["-c", &format!("{} \"$1\"", viewer), "bbtui", &path])
        .status()
        .map_err(|e| BbError::Launcher(format!("{}: {}", viewer, e)))?;

    if status.success() {
        Ok(())
    } else {
        Err(BbError::Launcher(format!("{} exited with {}", viewer, status)))
    }
}

fn viewer_content(text: &str) -> &str {
    if text.trim().is_empty() {
        EMPTY_LOG
    } else {
        text
    }
}

/// Title turned into something safe for a file name.
fn file_stem(title: &str) -> String {
    let stem: String = title
        .trim()
        .chars()
        .map(|c| {
            if c.is_whitespace() || c == '/' || c == '\\' {
                '-'
            } else {
                c
            }
        })
        .collect();
    let stem = stem.trim_matches('-');
    if stem.is_empty() {
        "log".to_string()
    } else {
        stem.to_string()
    }
}
