//! Base64 payload normalization and decoding.

use base64::{
    Engine as _, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};

use super::types::DecodeError;

/// Standard alphabet, canonical padding required, non-zero trailing bits tolerated.
const DOCUMENT_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::RequireCanonical),
);

/// Append `=` until the length is a multiple of four. Existing content is never altered.
pub fn pad_base64(encoded: &str) -> String {
    let remainder = encoded.len() % 4;
    let mut padded = String::with_capacity(encoded.len() + 3);
    padded.push_str(encoded);
    if remainder > 0 {
        padded.extend(std::iter::repeat_n('=', 4 - remainder));
    }
    padded
}

/// Decode a request payload into raw document bytes.
///
/// ASCII whitespace (MIME line wrapping) is dropped before padding; anything else outside the
/// standard alphabet is rejected.
pub fn decode_document(encoded: &str) -> Result<Vec<u8>, DecodeError> {
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let padded = pad_base64(&compact);
    Ok(DOCUMENT_ENGINE.decode(padded)?)
}

/// Lossy UTF-8 rendering of the first `limit` bytes, for debug logs.
pub fn preview(bytes: &[u8], limit: usize) -> String {
    let end = bytes.len().min(limit);
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;

    #[test]
    fn pads_every_remainder_to_multiple_of_four() {
        for (input, expected) in [
            ("", ""),
            ("QUJD", "QUJD"),
            ("QUJDRA", "QUJDRA=="),
            ("QUJDREU", "QUJDREU="),
            ("QUJDR", "QUJDR==="),
        ] {
            let padded = pad_base64(input);
            assert_eq!(padded, expected);
            assert_eq!(padded.len() % 4, 0);
            assert!(padded.starts_with(input));
            assert_eq!(padded.len() - input.len(), (4 - input.len() % 4) % 4);
        }
    }

    #[test]
    fn decodes_unpadded_payloads() {
        for document in [&b"A"[..], b"AB", b"ABC", b"Quarterly report\n\nRevenue rose."] {
            let encoded = STANDARD.encode(document);
            assert_eq!(decode_document(&encoded).expect("padded"), document);
            assert_eq!(
                decode_document(encoded.trim_end_matches('=')).expect("unpadded"),
                document
            );
        }
    }

    #[test]
    fn round_trips_binary_data_of_every_length() {
        let bytes: Vec<u8> = (0..=255u8).collect();
        for len in 0..8 {
            let sample = &bytes[..len + 240];
            let encoded = STANDARD.encode(sample);
            assert_eq!(
                decode_document(encoded.trim_end_matches('=')).expect("decode"),
                sample
            );
        }
    }

    #[test]
    fn ignores_mime_line_wrapping() {
        let decoded = decode_document("SGVs\r\nbG8g\nV29y bGQ=").expect("decode");
        assert_eq!(decoded, b"Hello World");
    }

    #[test]
    fn rejects_characters_outside_alphabet() {
        assert!(decode_document("not*base64!").is_err());
        assert!(decode_document("SGVsbG8_").is_err());
    }

    #[test]
    fn rejects_impossible_length() {
        assert!(decode_document("QUJDR").is_err());
    }

    #[test]
    fn rejects_surplus_padding() {
        assert_eq!(decode_document("QUJD").expect("canonical"), b"ABC");
        assert!(decode_document("QUJD=").is_err());
        assert!(decode_document("QUI==").is_err());
    }

    #[test]
    fn empty_payload_decodes_to_empty_document() {
        assert!(decode_document("").expect("decode").is_empty());
    }

    #[test]
    fn preview_truncates_and_tolerates_binary() {
        assert_eq!(preview(b"abcdef", 3), "abc");
        assert_eq!(preview(&[0x66, 0xff], 100), "f\u{fffd}");
    }
}
