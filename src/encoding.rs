//! String encodings for [`crate::io::InputSource::String`] and
//! [`crate::io::OutputSink::Collect`]'s string representation.

/// Out of scope per the spec beyond these two: no general-purpose
/// string-encoding helper lives here, only enough to bridge bytes to/from
/// `String`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Encoding {
    Utf8,
    Utf16,
}

impl Encoding {
    pub(crate) fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Encoding::Utf8 => text.as_bytes().to_vec(),
            Encoding::Utf16 => {
                let mut out = Vec::with_capacity(text.len() * 2);
                for unit in text.encode_utf16() {
                    out.extend_from_slice(&unit.to_le_bytes());
                }
                out
            }
        }
    }

    /// Decodes bytes captured from a child. Invalid sequences yield `None`
    /// rather than lossily-substituted text, per §4.4.
    pub(crate) fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            Encoding::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_owned),
            Encoding::Utf16 => {
                if bytes.len() % 2 != 0 {
                    return None;
                }
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16(&units).ok()
            }
        }
    }
}
