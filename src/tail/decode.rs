//! Byte-to-text decoding for monitored files.
//!
//! Files arrive in one of three encodings, sniffed from a byte-order mark.
//! Decoding is incremental: a chunk may end in the middle of a multi-byte
//! sequence, so the decoder reports how many input bytes it actually
//! consumed and the caller re-presents the remainder once more data arrives.
//! Decoding never fails; malformed input degrades to substitute characters.

/// Text encoding of a monitored file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// ASCII or UTF-8, the no-BOM default.
    #[default]
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl Encoding {
    /// Byte length of the byte-order mark for this encoding.
    pub fn bom_len(self) -> usize {
        match self {
            Encoding::Utf8 => 0,
            Encoding::Utf16Le | Encoding::Utf16Be => 2,
        }
    }
}

/// Sniff the encoding from a file's first bytes.
///
/// UTF-16 LE BOM is `FF FE`, BE is `FE FF`; anything else is treated as
/// UTF-8. BOM markers only, no statistical charset detection.
pub fn sniff(bytes: &[u8]) -> Encoding {
    match bytes {
        [0xFF, 0xFE, ..] => Encoding::Utf16Le,
        [0xFE, 0xFF, ..] => Encoding::Utf16Be,
        _ => Encoding::Utf8,
    }
}

/// One decoded chunk: the text produced and how many input bytes were
/// consumed. Bytes past `consumed` belong to an incomplete sequence.
#[derive(Debug)]
pub struct Decoded {
    pub text: String,
    pub consumed: usize,
}

/// Decode a chunk of raw bytes (BOM already stripped by the caller).
///
/// With `last` set, no further bytes will ever arrive: incomplete trailing
/// sequences are substituted instead of held back, and `consumed` always
/// equals the input length.
pub fn decode_chunk(bytes: &[u8], encoding: Encoding, last: bool) -> Decoded {
    match encoding {
        Encoding::Utf8 => decode_utf8(bytes, last),
        Encoding::Utf16Le => decode_utf16(bytes, false, last),
        Encoding::Utf16Be => decode_utf16(bytes, true, last),
    }
}

/// Validate UTF-8, replacing each invalid sequence with a single space and
/// resuming after it. An incomplete sequence at the end of the chunk is a
/// split read, not bad data, so it is held back unless this is the last
/// chunk.
fn decode_utf8(bytes: &[u8], last: bool) -> Decoded {
    let mut text = String::with_capacity(bytes.len());
    let mut pos = 0;

    while pos < bytes.len() {
        match std::str::from_utf8(&bytes[pos..]) {
            Ok(valid) => {
                text.push_str(valid);
                pos = bytes.len();
            }
            Err(err) => {
                let valid_up_to = err.valid_up_to();
                // Borrow is lossless here: the range is known-valid.
                text.push_str(&String::from_utf8_lossy(&bytes[pos..pos + valid_up_to]));
                pos += valid_up_to;
                match err.error_len() {
                    Some(len) => {
                        text.push(' ');
                        pos += len;
                    }
                    None => {
                        // Truncated sequence at the chunk end.
                        if last {
                            text.push(' ');
                            pos = bytes.len();
                        } else {
                            return Decoded {
                                text,
                                consumed: pos,
                            };
                        }
                    }
                }
            }
        }
    }

    Decoded {
        text,
        consumed: bytes.len(),
    }
}

/// Transcode UTF-16 to UTF-8. A trailing odd byte and a trailing unpaired
/// high surrogate are held back so code units and surrogate pairs split
/// across two reads reassemble once completed.
fn decode_utf16(bytes: &[u8], big_endian: bool, last: bool) -> Decoded {
    let mut usable = bytes.len() & !1;
    let mut units: Vec<u16> = bytes[..usable]
        .chunks_exact(2)
        .map(|pair| {
            if big_endian {
                u16::from_be_bytes([pair[0], pair[1]])
            } else {
                u16::from_le_bytes([pair[0], pair[1]])
            }
        })
        .collect();

    if !last {
        if let Some(&unit) = units.last() {
            if (0xD800..0xDC00).contains(&unit) {
                units.pop();
                usable -= 2;
            }
        }
    }

    let mut text = String::from_utf16_lossy(&units);
    if last && bytes.len() != usable {
        // Dangling odd byte with nothing left to pair it with.
        text.push('\u{FFFD}');
    }

    Decoded {
        text,
        consumed: if last { bytes.len() } else { usable },
    }
}
