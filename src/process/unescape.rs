// src/process/unescape.rs

use std::borrow::Cow;

/// Undo COPY text-format backslash escaping.
///
/// Fields without a backslash are borrowed unchanged. Recognised sequences:
/// `\b \f \n \r \t \v \\ \' \"`, one to three octal digits, `\x` with one or
/// two hex digits, and `\uXXXX`. Any other escaped character stands for
/// itself. A dangling backslash at the end of the field is an error.
pub fn unescape(raw: &str) -> Result<Cow<'_, str>, String> {
    if !raw.contains('\\') {
        return Ok(Cow::Borrowed(raw));
    }

    let bytes = raw.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if b != b'\\' {
            out.push(b);
            i += 1;
            continue;
        }

        let Some(&next) = bytes.get(i + 1) else {
            return Err("dangling backslash at end of field".to_string());
        };
        i += 2;

        match next {
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'v' => out.push(0x0b),
            b'0'..=b'7' => {
                let mut value = u32::from(next - b'0');
                let mut taken = 0;
                while taken < 2 {
                    match bytes.get(i) {
                        Some(&d @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(d - b'0');
                            i += 1;
                            taken += 1;
                        }
                        _ => break,
                    }
                }
                // `\777` overflows a byte; keep the low eight bits like the server does
                out.push((value & 0xff) as u8);
            }
            b'x' => {
                let mut value = 0u32;
                let mut taken = 0;
                while taken < 2 {
                    match bytes.get(i).and_then(|d| (*d as char).to_digit(16)) {
                        Some(d) => {
                            value = value * 16 + d;
                            i += 1;
                            taken += 1;
                        }
                        None => break,
                    }
                }
                if taken == 0 {
                    out.push(b'x');
                } else {
                    out.push(value as u8);
                }
            }
            b'u' => {
                let hex = raw
                    .get(i..i + 4)
                    .filter(|h| h.bytes().all(|c| c.is_ascii_hexdigit()))
                    .ok_or_else(|| format!("truncated unicode escape at byte {}", i - 2))?;
                let code = u32::from_str_radix(hex, 16).map_err(|e| e.to_string())?;
                let ch = char::from_u32(code)
                    .ok_or_else(|| format!("invalid unicode scalar \\u{}", hex))?;
                let mut buf = [0u8; 4];
                out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                i += 4;
            }
            other => out.push(other),
        }
    }

    String::from_utf8(out)
        .map(Cow::Owned)
        .map_err(|e| format!("escaped bytes are not valid UTF-8: {}", e))
}
