//! Character-set detection for arbitrary input files.
//!
//! Detection order: byte-order mark, UTF-16 without BOM (NUL-byte pattern),
//! strict UTF-8, and finally windows-1252, which maps every byte and
//! therefore always succeeds.

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};
use tracing::{debug, info, warn};

/// How many leading bytes are inspected for the UTF-16 heuristic.
const SNIFF_LEN: usize = 4096;

#[derive(Debug, Clone)]
pub struct DecodedText {
    pub text: String,
    pub encoding: &'static Encoding,
    /// True when malformed sequences were replaced with U+FFFD.
    pub had_errors: bool,
}

pub fn detect_encoding(bytes: &[u8]) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        debug!("Byte-order mark found: {}", encoding.name());
        return encoding;
    }

    if let Some(encoding) = sniff_utf16(bytes) {
        return encoding;
    }

    if std::str::from_utf8(bytes).is_ok() {
        return UTF_8;
    }

    WINDOWS_1252
}

/// UTF-16 text that is mostly ASCII has a zero byte in every other position.
fn sniff_utf16(bytes: &[u8]) -> Option<&'static Encoding> {
    let sample = &bytes[..bytes.len().min(SNIFF_LEN)];
    let pairs = sample.len() / 2;
    if pairs < 2 {
        return None;
    }

    let (mut even_zeros, mut odd_zeros) = (0usize, 0usize);
    for pair in sample.chunks_exact(2) {
        if pair[0] == 0 {
            even_zeros += 1;
        }
        if pair[1] == 0 {
            odd_zeros += 1;
        }
    }

    let mostly = |n: usize| n * 10 >= pairs * 4;
    let rarely = |n: usize| n * 20 <= pairs;

    if mostly(odd_zeros) && rarely(even_zeros) {
        Some(UTF_16LE)
    } else if mostly(even_zeros) && rarely(odd_zeros) {
        Some(UTF_16BE)
    } else {
        None
    }
}

/// Detect the encoding of `bytes` and transcode them to UTF-8.
pub fn decode(bytes: &[u8]) -> DecodedText {
    let encoding = detect_encoding(bytes);
    let body = match Encoding::for_bom(bytes) {
        Some((bom_encoding, bom_len)) if bom_encoding == encoding => &bytes[bom_len..],
        _ => bytes,
    };

    let (text, had_errors) = encoding.decode_without_bom_handling(body);
    info!("Detected input encoding: {}", encoding.name());
    if had_errors {
        warn!(
            "Input is not clean {}: malformed sequences were replaced",
            encoding.name()
        );
    }

    DecodedText {
        text: text.into_owned(),
        encoding,
        had_errors,
    }
}
