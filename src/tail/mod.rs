//! Incremental ingestion of a monitored log file.
//!
//! A [`Document`] owns the read cursor for one source, detects growth,
//! truncation and replacement between polls, and keeps the append-only store
//! of decoded lines that the filter and render layers consume.

mod decode;
mod fingerprint;
mod split;

pub use decode::{decode_chunk, sniff, Decoded, Encoding};
pub use fingerprint::{Fingerprint, FINGERPRINT_WINDOW};
pub use split::LineSplitter;

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};
use tracing::debug;

/// Outcome of one polling pass over the monitored file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollResult {
    /// Nothing to do; the common case.
    NoChange,
    /// New bytes were ingested; iterate from the first new line.
    Grow,
    /// The file was truncated, replaced or removed. The document is frozen;
    /// the caller starts over (typically by re-attaching the path).
    Replaced,
}

/// A monitored log source and its decoded line store.
///
/// Single-threaded by design: `poll()` is driven by an external timer and
/// runs to completion; nothing here suspends or locks.
#[derive(Debug)]
pub struct Document {
    path: Option<PathBuf>,
    read_cursor: u64,
    last_size: u64,
    last_mtime: Option<SystemTime>,
    fingerprint: Option<Fingerprint>,
    fingerprint_window: u64,
    encoding: Encoding,
    splitter: LineSplitter,
    lines: Vec<String>,
    first_new_line: usize,
    frozen: bool,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            path: None,
            read_cursor: 0,
            last_size: 0,
            last_mtime: None,
            fingerprint: None,
            fingerprint_window: FINGERPRINT_WINDOW,
            encoding: Encoding::Utf8,
            splitter: LineSplitter::new(),
            lines: Vec::new(),
            first_new_line: 0,
            frozen: false,
        }
    }
}

impl Document {
    /// An empty document with no source attached.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty document with a custom fingerprint window size.
    pub fn with_fingerprint_window(window: u64) -> Self {
        Self {
            fingerprint_window: window,
            ..Self::default()
        }
    }

    /// Attach a file path to monitor. Resets all carried state; no read
    /// happens until the next `poll()`.
    pub fn attach_file(&mut self, path: impl Into<PathBuf>) {
        self.path = Some(path.into());
        self.reset_store();
        self.frozen = false;
    }

    /// Attach a byte buffer directly, bypassing file monitoring. The buffer
    /// is decoded and split as a one-shot, non-growing source (the trailing
    /// unterminated fragment becomes a final line) and the document is
    /// frozen against further polling.
    pub fn attach_text(&mut self, bytes: &[u8]) {
        self.path = None;
        self.reset_store();
        self.frozen = true;

        self.encoding = sniff(bytes);
        let body = &bytes[self.encoding.bom_len().min(bytes.len())..];
        let decoded = decode_chunk(body, self.encoding, true);
        self.splitter.push(&decoded.text, &mut self.lines);
        self.splitter.finish(&mut self.lines);
    }

    fn reset_store(&mut self) {
        self.read_cursor = 0;
        self.last_size = 0;
        self.last_mtime = None;
        self.fingerprint = None;
        self.encoding = Encoding::Utf8;
        self.splitter.clear();
        self.lines.clear();
        self.first_new_line = 0;
    }

    /// Check the monitored file for changes and ingest any appended bytes.
    ///
    /// Transient open/read failures surface as `NoChange` and are retried on
    /// the next poll; a vanished, truncated or replaced file surfaces as
    /// `Replaced` exactly once, after which the document is frozen.
    pub fn poll(&mut self) -> PollResult {
        if self.frozen {
            return PollResult::NoChange;
        }
        let Some(path) = self.path.clone() else {
            return PollResult::NoChange;
        };

        let meta = match std::fs::metadata(&path) {
            Ok(meta) => meta,
            Err(err) => {
                if self.read_cursor > 0 {
                    debug!(file = %path.display(), error = %err, "monitored file vanished");
                    self.frozen = true;
                    return PollResult::Replaced;
                }
                return PollResult::NoChange;
            }
        };

        let size = meta.len();
        let mtime = meta.modified().ok();
        if size == self.last_size && mtime == self.last_mtime {
            return PollResult::NoChange;
        }

        if size < self.read_cursor {
            debug!(
                file = %path.display(),
                size,
                cursor = self.read_cursor,
                "file truncated below read cursor"
            );
            self.frozen = true;
            return PollResult::Replaced;
        }

        match self.ingest(&path, size) {
            Ok(true) => {
                self.frozen = true;
                PollResult::Replaced
            }
            Ok(false) => {
                self.last_size = size;
                self.last_mtime = mtime;
                PollResult::Grow
            }
            Err(err) => {
                // Stat results are not committed, so the next poll retries.
                debug!(file = %path.display(), error = %err, "read failed, will retry");
                PollResult::NoChange
            }
        }
    }

    /// Read and decode the delta. Returns `Ok(true)` when the leading-window
    /// fingerprint proves the path now holds a different file.
    fn ingest(&mut self, path: &Path, size: u64) -> std::io::Result<bool> {
        let mut file = File::open(path)?;

        match self.fingerprint {
            Some(fp) => {
                if fp.covered() > 0 {
                    let mut leading = vec![0u8; fp.covered() as usize];
                    file.read_exact(&mut leading)?;
                    if !fp.matches(&leading) {
                        debug!(file = %path.display(), "leading-window fingerprint mismatch");
                        return Ok(true);
                    }
                }
                // Extend coverage toward the window cap while possible.
                if !fp.is_full(self.fingerprint_window) && size > fp.covered() {
                    self.fingerprint = Some(self.read_fingerprint(&mut file, size)?);
                }
            }
            None => {
                // First successful check: establish, don't compare.
                self.fingerprint = Some(self.read_fingerprint(&mut file, size)?);
            }
        }

        if self.read_cursor == 0 {
            let mut head = [0u8; 4];
            file.seek(SeekFrom::Start(0))?;
            let got = file.read(&mut head)?;
            self.encoding = sniff(&head[..got]);
            debug!(file = %path.display(), encoding = ?self.encoding, "detected encoding");
            self.read_cursor = self.encoding.bom_len() as u64;
        }

        let mut raw = Vec::with_capacity((size - self.read_cursor) as usize);
        file.seek(SeekFrom::Start(self.read_cursor))?;
        file.take(size - self.read_cursor).read_to_end(&mut raw)?;

        let decoded = decode_chunk(&raw, self.encoding, false);
        self.read_cursor += decoded.consumed as u64;
        self.first_new_line = self.lines.len();
        self.splitter.push(&decoded.text, &mut self.lines);
        Ok(false)
    }

    fn read_fingerprint(&self, file: &mut File, size: u64) -> std::io::Result<Fingerprint> {
        let want = self.fingerprint_window.min(size) as usize;
        let mut leading = vec![0u8; want];
        file.seek(SeekFrom::Start(0))?;
        file.read_exact(&mut leading)?;
        Ok(Fingerprint::of(&leading))
    }

    /// Visit lines in order. With `restart_from_beginning` every line is
    /// visited from index 0; otherwise only lines appended by the most
    /// recent `Grow`. The visitor's return value ("accepted for display")
    /// is for the caller's own bookkeeping; the store is never mutated.
    pub fn iterate_lines<F>(&self, restart_from_beginning: bool, mut visit: F)
    where
        F: FnMut(&str, usize) -> bool,
    {
        let start = if restart_from_beginning {
            0
        } else {
            self.first_new_line
        };
        for (index, line) in self.lines.iter().enumerate().skip(start) {
            let _ = visit(line, index);
        }
    }

    /// Freeze the document against future polls. Used when a document is
    /// being retired so stale timer ticks can't interfere.
    pub fn stop_updates(&mut self) {
        self.frozen = true;
    }

    /// Whether polling has been stopped (explicitly, by `attach_text`, or
    /// by a `Replaced` outcome).
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    /// Index of the first line appended by the most recent `Grow`.
    pub fn first_new_line(&self) -> usize {
        self.first_new_line
    }

    /// Full path of the monitored file; empty when text was attached
    /// directly.
    pub fn file_name(&self) -> &str {
        self.path
            .as_deref()
            .and_then(Path::to_str)
            .unwrap_or_default()
    }

    /// Basename of the monitored file, splitting on both `/` and `\`.
    pub fn short_file_name(&self) -> &str {
        let full = self.file_name();
        full.rsplit(['/', '\\']).next().unwrap_or(full)
    }

    /// Last observed modification time, formatted as a local date string.
    pub fn last_modified(&self) -> Option<String> {
        self.last_mtime
            .map(|t| DateTime::<Local>::from(t).format("%Y-%m-%d %H:%M:%S").to_string())
    }
}
