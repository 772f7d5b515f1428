use xxhash_rust::xxh3::xxh3_64;

/// Default number of leading bytes covered by a fully-grown fingerprint.
pub const FINGERPRINT_WINDOW: u64 = 4096;

/// Content checksum over a file's leading bytes.
///
/// Tells "the same file grew" apart from "a different file now occupies the
/// same path". Files smaller than the window hash fewer bytes, so the
/// covered length is stored alongside the hash: a comparison is only valid
/// over the exact range that was originally hashed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint {
    hash: u64,
    covered: u64,
}

impl Fingerprint {
    /// Fingerprint the given leading bytes (already capped by the caller).
    pub fn of(leading: &[u8]) -> Self {
        Self {
            hash: xxh3_64(leading),
            covered: leading.len() as u64,
        }
    }

    /// Number of leading bytes this fingerprint spans.
    pub fn covered(&self) -> u64 {
        self.covered
    }

    /// Whether coverage has reached the given window target, i.e. growing
    /// the file further cannot extend it.
    pub fn is_full(&self, window: u64) -> bool {
        self.covered >= window
    }

    /// Compare against a fresh read of the same leading range.
    pub fn matches(&self, leading: &[u8]) -> bool {
        leading.len() as u64 == self.covered && xxh3_64(leading) == self.hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_content_matches() {
        let fp = Fingerprint::of(b"2024-01-01 service started");
        assert!(fp.matches(b"2024-01-01 service started"));
    }

    #[test]
    fn test_different_content_mismatch() {
        let fp = Fingerprint::of(b"2024-01-01 service started");
        assert!(!fp.matches(b"2024-01-02 service stopped!"));
    }

    #[test]
    fn test_length_mismatch_is_not_a_match() {
        let fp = Fingerprint::of(b"abc");
        assert!(!fp.matches(b"abcd"));
        assert!(!fp.matches(b"ab"));
    }

    #[test]
    fn test_empty_window() {
        let fp = Fingerprint::of(b"");
        assert_eq!(fp.covered(), 0);
        assert!(fp.matches(b""));
    }

    #[test]
    fn test_is_full() {
        let fp = Fingerprint::of(&vec![0u8; 100]);
        assert!(!fp.is_full(4096));
        assert!(fp.is_full(100));
        assert!(fp.is_full(50));
    }
}
