//! Streaming UTF-8 decoding.
//!
//! Network reads split the body at arbitrary byte offsets, so a multi-byte
//! character can straddle two chunks. [`Utf8Decoder`] keeps the incomplete
//! tail of one chunk and completes it with the head of the next instead of
//! emitting replacement characters. A byte order mark at the very start of
//! the body is dropped.

/// Stateful byte-to-text decoder.
///
/// Invalid sequences decode to U+FFFD; decoding never fails.
///
/// # Example
/// ```
/// use genstream::decode::Utf8Decoder;
///
/// let mut decoder = Utf8Decoder::new();
/// let bytes = "héllo".as_bytes();
///
/// // Split inside the two-byte 'é'
/// let mut text = decoder.decode(&bytes[..2]);
/// text.push_str(&decoder.decode(&bytes[2..]));
/// text.push_str(&decoder.finish());
///
/// assert_eq!(text, "héllo");
/// ```
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    // Incomplete trailing sequence from the previous chunk (at most 3 bytes).
    pending: Vec<u8>,
    // Set once the first character of the body has been seen.
    bom_checked: bool,
}

const BOM: char = '\u{FEFF}';

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk, carrying an incomplete trailing sequence over
    /// to the next call.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let text = if self.pending.is_empty() {
            self.decode_bytes(chunk)
        } else {
            let mut joined = std::mem::take(&mut self.pending);
            joined.extend_from_slice(chunk);
            self.decode_bytes(&joined)
        };

        self.strip_bom(text)
    }

    /// Flush at end of stream. A truncated sequence becomes one U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            char::REPLACEMENT_CHARACTER.to_string()
        }
    }

    /// Whether bytes of an incomplete character are being held back.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    // A BOM split across chunks is held back as pending bytes, so the first
    // non-empty output always starts with the whole character.
    fn strip_bom(&mut self, mut text: String) -> String {
        if !self.bom_checked && !text.is_empty() {
            self.bom_checked = true;
            if text.starts_with(BOM) {
                text.drain(..BOM.len_utf8());
            }
        }
        text
    }

    fn decode_bytes(&mut self, bytes: &[u8]) -> String {
        let mut out = String::with_capacity(bytes.len());
        let mut rest = bytes;

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    // `valid` is well-formed, so this borrows without replacing anything
                    out.push_str(&String::from_utf8_lossy(valid));

                    match e.error_len() {
                        Some(invalid) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[invalid..];
                        }
                        None => {
                            // Unexpected end of input: a character cut by the chunk boundary
                            self.pending.extend_from_slice(after);
                            break;
                        }
                    }
                }
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_split(bytes: &[u8], at: usize) -> String {
        let mut decoder = Utf8Decoder::new();
        let mut text = decoder.decode(&bytes[..at]);
        text.push_str(&decoder.decode(&bytes[at..]));
        text.push_str(&decoder.finish());
        text
    }

    #[test]
    fn test_ascii_passthrough() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"data: hi\n"), "data: hi\n");
        assert!(!decoder.has_pending());
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_every_split_of_multibyte_text() {
        let text = "tïtle → 日本語 🚀!";
        let bytes = text.as_bytes();
        for at in 0..=bytes.len() {
            assert_eq!(decode_split(bytes, at), text, "split at byte {}", at);
        }
    }

    #[test]
    fn test_split_holds_back_partial_character() {
        let mut decoder = Utf8Decoder::new();
        let rocket = "🚀".as_bytes();

        assert_eq!(decoder.decode(&rocket[..1]), "");
        assert_eq!(decoder.decode(&rocket[1..3]), "");
        assert!(decoder.has_pending());
        assert_eq!(decoder.decode(&rocket[3..]), "🚀");
        assert!(!decoder.has_pending());
    }

    #[test]
    fn test_invalid_bytes_become_replacement() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"a\xffb"), "a\u{FFFD}b");
    }

    #[test]
    fn test_broken_sequence_across_chunks() {
        // Lead byte of a 3-byte sequence followed by ASCII in the next chunk
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"x\xe2"), "x");
        assert_eq!(decoder.decode(b"A"), "\u{FFFD}A");
    }

    #[test]
    fn test_leading_bom_is_dropped_at_every_split() {
        let bytes = "\u{FEFF}event: post\n".as_bytes();
        for at in 0..=bytes.len() {
            assert_eq!(decode_split(bytes, at), "event: post\n", "split at byte {}", at);
        }
    }

    #[test]
    fn test_bom_dropped_byte_by_byte() {
        let mut decoder = Utf8Decoder::new();
        let mut text = String::new();
        for byte in "\u{FEFF}ok".as_bytes() {
            text.push_str(&decoder.decode(std::slice::from_ref(byte)));
        }
        assert_eq!(text, "ok");
    }

    #[test]
    fn test_only_first_bom_is_dropped() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b""), "");
        assert_eq!(decoder.decode("\u{FEFF}\u{FEFF}a".as_bytes()), "\u{FEFF}a");
        assert_eq!(decoder.decode("\u{FEFF}b".as_bytes()), "\u{FEFF}b");
    }

    #[test]
    fn test_bom_after_text_is_kept() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"a"), "a");
        assert_eq!(decoder.decode("\u{FEFF}b".as_bytes()), "\u{FEFF}b");
    }

    #[test]
    fn test_truncated_at_end_of_stream() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(&"é".as_bytes()[..1]), "");
        assert_eq!(decoder.finish(), "\u{FFFD}");
        assert_eq!(decoder.finish(), "");
    }
}
