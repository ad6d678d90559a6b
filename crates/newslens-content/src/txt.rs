//! Plain-text decoding

use crate::ContentError;
use tracing::warn;

const UTF8_BOM: &str = "\u{feff}";

/// Decode as UTF-8, falling back to Latin-1 (ISO-8859-1)
pub(crate) fn decode(filename: &str, bytes: &[u8]) -> Result<String, ContentError> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Ok(text.strip_prefix(UTF8_BOM).unwrap_or(text).to_string()),
        Err(utf8_error) => {
            warn!(
                "Decoding '{}' as UTF-8 failed ({}), trying Latin-1",
                filename, utf8_error
            );
            decode_latin1(bytes).ok_or_else(|| ContentError::Decode {
                filename: filename.to_string(),
                reason: format!(
                    "Not valid UTF-8 ({}), and it contains bytes in 0x80-0x9F, which Latin-1 \
                     reserves for control characters. Windows-1252 text (e.g. curly quotes) \
                     is not accepted; save the file as UTF-8.",
                    utf8_error
                ),
            })
        }
    }
}

/// Every Latin-1 byte maps to the code point of the same value. The C1
/// range 0x80..=0x9F has no printable meaning, so text containing it is
/// almost certainly some other 8-bit encoding and is rejected.
fn decode_latin1(bytes: &[u8]) -> Option<String> {
    if bytes.iter().any(|b| (0x80..=0x9F).contains(b)) {
        return None;
    }
    Some(bytes.iter().map(|&b| char::from(b)).collect())
}
