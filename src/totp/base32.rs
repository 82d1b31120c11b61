//! RFC 4648 Base32 codec for shared secrets.
//!
//! Encoding always pads with `=` to a multiple of eight characters. Decoding
//! is lenient: case is ignored, trailing padding is stripped and any
//! character outside the alphabet is skipped, so secrets typed with spaces or
//! dashes still decode.

use base32::Alphabet;

/// Encode bytes as padded Base32.
pub fn encode(data: &[u8]) -> String {
    base32::encode(Alphabet::Rfc4648 { padding: true }, data)
}

/// Decode a Base32 string, skipping anything outside the alphabet.
pub fn decode(input: &str) -> Vec<u8> {
    let clean: String = input
        .to_ascii_uppercase()
        .trim_end_matches('=')
        .chars()
        .filter(|c| c.is_ascii_uppercase() || ('2'..='7').contains(c))
        .collect();

    base32::decode(Alphabet::Rfc4648 { padding: false }, &clean).unwrap_or_default()
}
