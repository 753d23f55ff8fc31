/// Status payload encoding
///
/// `"<name>:<bool>,<name>:<bool>,...,"`: every entry is followed by a comma,
/// so an empty map encodes as a single `,`.
use std::collections::BTreeMap;
use std::fmt::Write as _;

pub fn format_status(status: &BTreeMap<String, bool>) -> String {
    let mut text = status
        .iter()
        .map(|(name, recognized)| format!("{}:{}", name, recognized))
        .collect::<Vec<_>>()
        .join(",");
    text.push(',');
    text
}

/// One byte per character: the low byte of each code point
pub fn encode_status(text: &str) -> Vec<u8> {
    text.chars().map(|c| (c as u32 & 0xFF) as u8).collect()
}

/// Human-readable form for logs
pub fn describe_payload(payload: &[u8]) -> String {
    let mut out = String::with_capacity(payload.len());
    for byte in payload {
        if byte.is_ascii_graphic() || *byte == b' ' {
            out.push(*byte as char);
        } else {
            let _ = write!(out, "\\x{:02x}", byte);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(entries: &[(&str, bool)]) -> BTreeMap<String, bool> {
        entries.iter().map(|(n, b)| (n.to_string(), *b)).collect()
    }

    #[test]
    fn test_format_status() {
        assert_eq!(
            format_status(&status(&[("fist", true), ("wave", false)])),
            "fist:true,wave:false,"
        );
        assert_eq!(format_status(&status(&[("ok", false)])), "ok:false,");
    }

    #[test]
    fn test_format_empty_status() {
        assert_eq!(format_status(&BTreeMap::new()), ",");
    }

    #[test]
    fn test_encode_ascii() {
        assert_eq!(encode_status("a:true,"), b"a:true,".to_vec());
    }

    #[test]
    fn test_encode_keeps_low_byte() {
        // U+00E9 -> 0xE9, U+0416 -> 0x16
        assert_eq!(encode_status("é:Ж"), vec![0xE9, b':', 0x16]);
    }

    #[test]
    fn test_describe_payload() {
        assert_eq!(describe_payload(&[b'a', b':', 0xE9]), "a:\\xe9");
    }
}
