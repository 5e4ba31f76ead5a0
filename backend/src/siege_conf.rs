//! Reconciliation of `~/.siege/siege.conf`.
//!
//! The file is created once (from a literal template or by `siege.config`)
//! and then patched on every run. Patching is exact-line: a line is rewritten
//! only when its trimmed content equals a known `before` string, so lines
//! already holding the desired value, or formatted differently, are left
//! alone. Every write goes through a sibling temp file and a rename.

use crate::external::{CommandRunner, ToolCommand};
use crate::types::OpsError;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Initial siege.conf written when the file is absent and no bootstrap tool is used.
pub const DEFAULT_TEMPLATE: &str = "limit = 255\n\
gmethod = HEAD\n\
protocol = HTTP/1.1\n\
concurrent = 1000\n\
benchmark = true\n\
connection = close\n";

/// A single exact-line replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinePatch {
    pub before: &'static str,
    pub after: &'static str,
}

impl LinePatch {
    pub const fn new(before: &'static str, after: &'static str) -> Self {
        Self { before, after }
    }

    /// The setting name this patch targets (text left of `=`).
    pub fn key(&self) -> &'static str {
        self.before.split('=').next().unwrap_or(self.before).trim()
    }
}

/// Replacements applied on top of the config generated by `siege.config`.
pub const TUNING_PATCHES: [LinePatch; 5] = [
    LinePatch::new("gmethod = HEAD", "gmethod = GET"),
    LinePatch::new("verbose = false", "verbose = true"),
    LinePatch::new("chunked = true", "chunked = false"),
    LinePatch::new("concurrent = 25", "concurrent = 255"),
    LinePatch::new("benchmark = false", "benchmark = true"),
];

/// How to produce siege.conf when it does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bootstrap {
    /// Write this literal content.
    Template(String),
    /// Run a tool that writes the file itself.
    Command(ToolCommand),
}

/// One `key = value` line of a siege.conf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfEntry {
    pub key: String,
    pub value: String,
    pub raw: String,
}

/// What a reconciliation pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: bool,
    pub replaced: usize,
    /// Keys targeted by a patch that do not appear in the file at all.
    pub missing_keys: Vec<String>,
}

/// Creates `dir` and any missing ancestors. Succeeds silently if it already exists.
pub fn ensure_dir(dir: &Path) -> Result<(), OpsError> {
    if dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|e| OpsError::io(dir, e))?;
    info!(path = %dir.display(), "created config directory");
    Ok(())
}

fn split_terminator(segment: &[u8]) -> (&[u8], &[u8]) {
    if let Some(body) = segment.strip_suffix(b"\r\n") {
        (body, &b"\r\n"[..])
    } else if let Some(body) = segment.strip_suffix(b"\n") {
        (body, &b"\n"[..])
    } else {
        (segment, &b""[..])
    }
}

/// Applies `patches` line by line and returns the new bytes plus the number of
/// lines rewritten. Leading indentation and line terminators are preserved.
/// Lines that are not valid UTF-8 never match and are copied through as-is.
pub fn apply_patches(text: &[u8], patches: &[LinePatch]) -> (Vec<u8>, usize) {
    let mut out = Vec::with_capacity(text.len());
    let mut replaced = 0;

    for segment in text.split_inclusive(|b| *b == b'\n') {
        let (body, terminator) = split_terminator(segment);
        let patch = std::str::from_utf8(body)
            .ok()
            .and_then(|line| patches.iter().find(|p| p.before == line.trim()).map(|p| (line, p)));
        match patch {
            Some((line, patch)) => {
                let indent = &line[..line.len() - line.trim_start().len()];
                out.extend_from_slice(indent.as_bytes());
                out.extend_from_slice(patch.after.as_bytes());
                out.extend_from_slice(terminator);
                replaced += 1;
            }
            None => out.extend_from_slice(segment),
        }
    }

    (out, replaced)
}

/// Parses `key = value` lines, skipping blanks, comments and lines without `=`.
pub fn parse_entries(text: &str) -> Vec<ConfEntry> {
    text.lines()
        .filter_map(|raw| {
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                return None;
            }
            let (key, value) = trimmed.split_once('=')?;
            Some(ConfEntry {
                key: key.trim().to_string(),
                value: value.trim().to_string(),
                raw: raw.to_string(),
            })
        })
        .collect()
}

fn missing_keys(text: &str, patches: &[LinePatch]) -> Vec<String> {
    let entries = parse_entries(text);
    let mut missing: Vec<String> = Vec::new();
    for patch in patches {
        let key = patch.key();
        if !entries.iter().any(|e| e.key == key) && !missing.iter().any(|m| m == key) {
            missing.push(key.to_string());
        }
    }
    missing
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "siege.conf".to_string());
    path.with_file_name(format!(".{}.tmp-{}", name, std::process::id()))
}

/// Follows symlinks so the rename lands on the real file, not the link.
fn resolve_target(path: &Path) -> Result<PathBuf, OpsError> {
    match fs::canonicalize(path) {
        Ok(target) => Ok(target),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(path.to_path_buf()),
        Err(e) => Err(OpsError::io(path, e)),
    }
}

/// Replaces `path` with `contents` via a sibling temp file and a rename, so
/// readers see either the old file or the new one. A symlinked `path` keeps
/// its link and the target is replaced; an existing file keeps its mode.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), OpsError> {
    let target = resolve_target(path)?;
    let tmp = temp_path_for(&target);
    let mut tmp_created = false;

    let result = (|| -> std::io::Result<()> {
        let mut file = File::create(&tmp)?;
        tmp_created = true;
        file.write_all(contents)?;
        if let Ok(meta) = fs::metadata(&target) {
            fs::set_permissions(&tmp, meta.permissions())?;
        }
        file.sync_all()?;
        fs::rename(&tmp, &target)
    })();

    result.map_err(|e| {
        if tmp_created {
            let _ = fs::remove_file(&tmp);
        }
        OpsError::io(&target, e)
    })
}

fn create(path: &Path, bootstrap: &Bootstrap, runner: &dyn CommandRunner) -> Result<(), OpsError> {
    info!("create siege config file at: {}", path.display());
    match bootstrap {
        Bootstrap::Template(content) => write_atomic(path, content.as_bytes()),
        Bootstrap::Command(cmd) => {
            let output = runner.run(cmd)?;
            if !output.success() {
                return Err(OpsError::ExternalTool {
                    tool: cmd.program.clone(),
                    reason: format!("{}: {}", output.describe_exit(), output.stderr.trim()),
                });
            }
            if !path.is_file() {
                return Err(OpsError::ExternalTool {
                    tool: cmd.program.clone(),
                    reason: format!("did not create {}", path.display()),
                });
            }
            Ok(())
        }
    }
}

/// Makes sure `path` exists and carries every patch's `after` line in place of
/// its `before` line. Unrelated lines and their order are untouched, and an
/// unchanged file is not rewritten.
pub fn reconcile(
    path: &Path,
    bootstrap: &Bootstrap,
    patches: &[LinePatch],
    runner: &dyn CommandRunner,
) -> Result<ReconcileReport, OpsError> {
    let mut report = ReconcileReport::default();

    if let Some(dir) = path.parent() {
        ensure_dir(dir)?;
    }

    if !path.exists() {
        create(path, bootstrap, runner)?;
        report.created = true;
    }

    let original = fs::read(path).map_err(|e| OpsError::io(path, e))?;
    let (patched, replaced) = apply_patches(&original, patches);
    report.replaced = replaced;

    if replaced > 0 {
        write_atomic(path, &patched)?;
        info!(path = %path.display(), replaced, "patched siege config");
    } else {
        debug!(path = %path.display(), "siege config already up to date");
    }

    report.missing_keys = missing_keys(&String::from_utf8_lossy(&patched), patches);
    for key in &report.missing_keys {
        warn!(key = key.as_str(), path = %path.display(), "expected setting is absent from siege config");
    }

    Ok(report)
}
