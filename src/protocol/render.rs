//! Console rendering of notification payloads

/// Carriage return as sent by the peripheral
const CR: u8 = b'\r';
/// Line break written to the console
const LF: u8 = b'\n';

/// Append `payload` to `out`, rendering every carriage return as a line
/// break. All other bytes, existing line breaks included, pass through.
pub fn render_payload(payload: &[u8], out: &mut Vec<u8>) {
    out.reserve(payload.len());
    out.extend(payload.iter().map(|&b| if b == CR { LF } else { b }));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        render_payload(payload, &mut out);
        out
    }

    #[test]
    fn test_cr_becomes_line_break() {
        assert_eq!(render(b"OK\r"), b"OK\n".to_vec());
    }

    #[test]
    fn test_existing_lf_untouched() {
        assert_eq!(render(b"hi\r\nbye"), b"hi\n\nbye".to_vec());
    }

    #[test]
    fn test_other_bytes_pass_through() {
        let payload: Vec<u8> = (0u8..=255).filter(|&b| b != CR).collect();
        assert_eq!(render(&payload), payload);
    }

    #[test]
    fn test_appends() {
        let mut out = b"ab".to_vec();
        render_payload(b"\rc", &mut out);
        assert_eq!(out, b"ab\nc".to_vec());
    }
}
