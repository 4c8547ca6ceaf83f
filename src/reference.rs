// Scene documents cross-reference by URL: "#fragment" points into the same
// document, "/path/to/other.duf#fragment" into an external one. Fragments are
// percent-encoded.

pub fn resolve_reference(reference: &str) -> String {
    let fragment = if let Some(rest) = reference.strip_prefix('#') {
        rest
    } else if let Some(pos) = reference.rfind('#') {
        &reference[pos + 1..]
    } else {
        reference
    };
    decode_percent(fragment)
}

pub fn is_external_reference(reference: &str) -> bool {
    reference.starts_with('/') || reference.starts_with('\\')
}

// Strict decode; any malformed escape means the text was not encoded to begin
// with, so it comes back untouched.
pub fn decode_percent(input: &str) -> String {
    match try_decode_percent(input) {
        Some(decoded) => decoded,
        None => input.to_string(),
    }
}

fn try_decode_percent(input: &str) -> Option<String> {
    if !input.contains('%') {
        return Some(input.to_string());
    }
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if i + 2 >= bytes.len() {
                return None;
            }
            let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) else {
                return None;
            };
            out.push((hi << 4) | lo);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
