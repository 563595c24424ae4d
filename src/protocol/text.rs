//! Windows-1252 transcoding for command and message text.
//!
//! The remote endpoint is not UTF-8 aware; everything crossing the wire is
//! a single-byte Windows-1252 string. Characters outside that code page
//! degrade lossily on encode, which the protocol accepts.

use encoding_rs::WINDOWS_1252;

/// Encode outbound text into the wire code page.
pub fn to_wire(text: &str) -> Vec<u8> {
    let (bytes, _, _) = WINDOWS_1252.encode(text);
    bytes.into_owned()
}

/// Decode inbound wire bytes back into native text.
pub fn from_wire(bytes: &[u8]) -> String {
    let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_passes_through() {
        assert_eq!(to_wire("say -1 hello"), b"say -1 hello");
        assert_eq!(from_wire(b"say -1 hello"), "say -1 hello");
    }

    #[test]
    fn latin_supplement_roundtrip() {
        let encoded = to_wire("caf\u{e9}");
        assert_eq!(encoded, [0x63, 0x61, 0x66, 0xE9]);
        assert_eq!(from_wire(&encoded), "caf\u{e9}");
    }

    #[test]
    fn unmappable_characters_degrade_without_error() {
        // U+3042 has no Windows-1252 mapping; the encoder substitutes
        // rather than failing.
        let encoded = to_wire("\u{3042}");
        assert!(!encoded.is_empty());
    }
}
