//! Incremental line splitting with partial-line carry.

use memchr::memchr2;

/// Splits decoded text into lines across chunk boundaries.
///
/// Terminators are recognized in precedence order `\r\n`, `\n\r`, bare `\n`
/// at each position; a lone `\r` is content. Text after the last terminator
/// is carried as a pending fragment and prepended to the next chunk, so a
/// line split across reads comes out whole. The pending fragment never
/// contains a newline.
#[derive(Debug, Default)]
pub struct LineSplitter {
    pending: String,
    /// The previous chunk ended exactly at a `\n`. A `\r` at the head of
    /// the next chunk is then the second half of an `\n\r` terminator.
    swallow_cr: bool,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split `chunk` into completed lines, appending them to `lines`.
    pub fn push(&mut self, chunk: &str, lines: &mut Vec<String>) {
        if chunk.is_empty() {
            // Keep the swallow flag armed across empty reads.
            return;
        }
        let mut chunk = chunk;
        if self.swallow_cr {
            self.swallow_cr = false;
            if let Some(rest) = chunk.strip_prefix('\r') {
                chunk = rest;
            }
        }

        let mut buf = std::mem::take(&mut self.pending);
        buf.push_str(chunk);

        let bytes = buf.as_bytes();
        let mut start = 0;
        let mut pos = 0;
        while let Some(offset) = memchr2(b'\r', b'\n', &bytes[pos..]) {
            let i = pos + offset;
            if bytes[i] == b'\r' {
                if bytes.get(i + 1) == Some(&b'\n') {
                    lines.push(buf[start..i].to_string());
                    start = i + 2;
                    pos = start;
                } else if i + 1 == bytes.len() {
                    // Trailing CR: may be the first half of `\r\n`, keep it
                    // pending until the next chunk decides.
                    break;
                } else {
                    // Lone CR inside a line is content.
                    pos = i + 1;
                }
            } else {
                lines.push(buf[start..i].to_string());
                if bytes.get(i + 1) == Some(&b'\r') {
                    start = i + 2;
                } else {
                    if i + 1 == bytes.len() {
                        self.swallow_cr = true;
                    }
                    start = i + 1;
                }
                pos = start;
            }
        }

        self.pending = buf[start..].to_string();
        debug_assert!(!self.pending.contains('\n'));
    }

    /// Flush the pending fragment as a final line. Only meaningful for
    /// one-shot sources where no more bytes will arrive.
    pub fn finish(&mut self, lines: &mut Vec<String>) {
        self.swallow_cr = false;
        if !self.pending.is_empty() {
            lines.push(std::mem::take(&mut self.pending));
        }
    }

    /// Drop all carried state.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.swallow_cr = false;
    }

    /// The unterminated fragment carried so far.
    pub fn pending(&self) -> &str {
        &self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split_all(chunks: &[&str]) -> (Vec<String>, String) {
        let mut splitter = LineSplitter::new();
        let mut lines = Vec::new();
        for chunk in chunks {
            splitter.push(chunk, &mut lines);
        }
        (lines, splitter.pending().to_string())
    }

    #[test]
    fn test_unix_endings() {
        let (lines, pending) = split_all(&["one\ntwo\nthree\n"]);
        assert_eq!(lines, vec!["one", "two", "three"]);
        assert!(pending.is_empty());
    }

    #[test]
    fn test_windows_endings() {
        let (lines, _) = split_all(&["one\r\ntwo\r\n"]);
        assert_eq!(lines, vec!["one", "two"]);
    }

    #[test]
    fn test_nl_cr_endings() {
        let (lines, _) = split_all(&["one\n\rtwo\n\r"]);
        assert_eq!(lines, vec!["one", "two"]);
    }

    #[test]
    fn test_all_conventions_equivalent() {
        let unix = split_all(&["a\nb\nc\n"]).0;
        let windows = split_all(&["a\r\nb\r\nc\r\n"]).0;
        let nl_cr = split_all(&["a\n\rb\n\rc\n\r"]).0;
        assert_eq!(unix, windows);
        assert_eq!(unix, nl_cr);
    }

    #[test]
    fn test_unterminated_tail_stays_pending() {
        let (lines, pending) = split_all(&["complete\npartial"]);
        assert_eq!(lines, vec!["complete"]);
        assert_eq!(pending, "partial");
    }

    #[test]
    fn test_partial_line_carry() {
        let (lines, pending) = split_all(&["hello wor", "ld\n"]);
        assert_eq!(lines, vec!["hello world"]);
        assert!(pending.is_empty());
    }

    #[test]
    fn test_crlf_split_across_chunks() {
        let (lines, pending) = split_all(&["one\r", "\ntwo\n"]);
        assert_eq!(lines, vec!["one", "two"]);
        assert!(pending.is_empty());
    }

    #[test]
    fn test_nl_cr_split_across_chunks() {
        let (lines, pending) = split_all(&["one\n", "\rtwo\n"]);
        assert_eq!(lines, vec!["one", "two"]);
        assert!(pending.is_empty());
    }

    #[test]
    fn test_swallow_flag_survives_empty_chunks() {
        let (lines, pending) = split_all(&["one\n", "", "\rtwo\n"]);
        assert_eq!(lines, vec!["one", "two"]);
        assert!(pending.is_empty());
    }

    #[test]
    fn test_swallow_flag_is_one_shot() {
        // Only a `\r` directly after the chunk-final `\n` is swallowed.
        let (lines, pending) = split_all(&["one\n", "two\r"]);
        assert_eq!(lines, vec!["one"]);
        assert_eq!(pending, "two\r");
    }

    #[test]
    fn test_lone_cr_is_content() {
        let (lines, _) = split_all(&["col1\rcol2\n"]);
        assert_eq!(lines, vec!["col1\rcol2"]);
    }

    #[test]
    fn test_empty_lines() {
        let (lines, _) = split_all(&["\n\nx\n"]);
        assert_eq!(lines, vec!["", "", "x"]);
    }

    #[test]
    fn test_finish_flushes_pending() {
        let mut splitter = LineSplitter::new();
        let mut lines = Vec::new();
        splitter.push("no newline here", &mut lines);
        splitter.finish(&mut lines);
        assert_eq!(lines, vec!["no newline here"]);
        assert!(splitter.pending().is_empty());
    }

    #[test]
    fn test_finish_on_empty_pending_adds_nothing() {
        let mut splitter = LineSplitter::new();
        let mut lines = Vec::new();
        splitter.push("done\n", &mut lines);
        splitter.finish(&mut lines);
        assert_eq!(lines, vec!["done"]);
    }

    #[test]
    fn test_unicode_content_preserved() {
        let (lines, _) = split_all(&["日本語: こんにちは\n", "🎉 done\n"]);
        assert_eq!(lines, vec!["日本語: こんにちは", "🎉 done"]);
    }
}
