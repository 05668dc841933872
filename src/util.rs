//! Byte-level utility functions shared by the PDU codec, the AT dialogue layer and the
//! forwarding state machine.
use num::FromPrimitive;
use crate::errors::{HuaweiResult, HuaweiError};
use crate::at::AtValue;

pub trait HuaweiFromPrimitive where Self: Sized {
    fn from_integer(i: u32) -> HuaweiResult<Self>;
}
impl<T> HuaweiFromPrimitive for T where T: FromPrimitive {
    fn from_integer(i: u32) -> HuaweiResult<T> {
        if let Some(s) = T::from_u32(i) {
            Ok(s)
        }
        else {
            Err(HuaweiError::ValueOutOfRange(AtValue::Integer(i)))
        }
    }
}

/// Decode a hex-ASCII string into raw bytes. Stops at the first non-hex-digit character, mirroring
/// `hex2bin`'s behaviour of quietly truncating on garbage rather than failing.
pub fn hex_to_bin(s: &str) -> Vec<u8> {
    let digits: Vec<u8> = s.bytes()
        .take_while(|b| b.is_ascii_hexdigit())
        .collect();
    digits.chunks(2)
        .filter(|c| c.len() == 2)
        .map(|c| {
            let hi = (c[0] as char).to_digit(16).unwrap_or(0);
            let lo = (c[1] as char).to_digit(16).unwrap_or(0);
            ((hi << 4) | lo) as u8
        })
        .collect()
}

/// Encode raw bytes as an upper-case hex-ASCII string.
pub fn bin_to_hex(data: &[u8]) -> String {
    let mut ret = String::with_capacity(data.len() * 2);
    for b in data {
        ret.push_str(&format!("{:02X}", b));
    }
    ret
}

/// Return the next `\n`-terminated line starting at `pos`, and the offset of the line following it
/// (or `None` if `pos` is already at or past the end of `buf`).
///
/// This is the Rust-idiomatic equivalent of `smsf_util.c`'s `read_line`, which signals "no more
/// lines" with a `-1` sentinel; an `Option` expresses the same thing without a magic number.
pub fn read_line(buf: &str, pos: usize) -> Option<(&str, usize)> {
    if pos >= buf.len() {
        return None;
    }
    let rest = &buf[pos..];
    match rest.find('\n') {
        Some(idx) => Some((&rest[..idx], pos + idx + 1)),
        None => Some((rest, buf.len()))
    }
}

/// Extract the first double-quoted field from `src`, returning the field's contents (without the
/// quotes) and the number of bytes of `src` consumed (including both quote characters).
pub fn copy_quoted(src: &str) -> Option<(String, usize)> {
    let bytes = src.as_bytes();
    let start = src.find('"')?;
    let rest = &src[start + 1..];
    let end = rest.find('"')?;
    let consumed = start + 1 + end + 1;
    let _ = bytes;
    Some((rest[..end].to_string(), consumed))
}

/// CRC-16/CCITT (polynomial 0x1021, initial value 0xFFFF, no input/output reflection, no final
/// XOR). Used by the forwarding state machine to content-address messages; this is a checksum, not
/// a cryptographic hash.
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            }
            else {
                crc <<= 1;
            }
        }
    }
    crc
}

/// Parse the `YYYY-MM-DDTHH:MM:SS` prefix of an ISO-8601-ish timestamp into a Unix epoch second.
/// Any trailing timezone suffix (`Z`, `+01:00`, ...) is ignored, matching `iso2time`'s C behaviour
/// of treating the decoded timestamp as already being in the caller's reference frame.
pub fn iso2time(s: &str) -> HuaweiResult<i64> {
    use chrono::NaiveDateTime;

    let prefix: String = s.chars().take(19).collect();
    NaiveDateTime::parse_from_str(&prefix, "%Y-%m-%dT%H:%M:%S")
        .map(|dt| dt.timestamp())
        .map_err(|_| HuaweiError::InvalidPdu("malformed timestamp"))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hex_roundtrip() {
        assert_eq!(bin_to_hex(&[0xDE, 0xAD, 0xBE, 0xEF]), "DEADBEEF");
        assert_eq!(hex_to_bin("DEADBEEF"), vec![0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(hex_to_bin("deadbeef"), vec![0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn hex_stops_at_garbage() {
        assert_eq!(hex_to_bin("DEAD!!garbage"), vec![0xDE, 0xAD]);
    }

    #[test]
    fn crc16_known_vector() {
        assert_eq!(crc16(b"123456789"), 0x29B1);
    }

    #[test]
    fn read_line_splits_on_newline() {
        let buf = "first\nsecond\nthird";
        let (l1, p1) = read_line(buf, 0).unwrap();
        assert_eq!(l1, "first");
        let (l2, p2) = read_line(buf, p1).unwrap();
        assert_eq!(l2, "second");
        let (l3, p3) = read_line(buf, p2).unwrap();
        assert_eq!(l3, "third");
        assert!(read_line(buf, p3).is_none());
    }

    #[test]
    fn copy_quoted_extracts_field() {
        let (val, consumed) = copy_quoted("\"PRIMARY NUMBER\",129").unwrap();
        assert_eq!(val, "PRIMARY NUMBER");
        assert_eq!(&"\"PRIMARY NUMBER\",129"[consumed..], ",129");
    }

    #[test]
    fn iso2time_parses_prefix() {
        let t = iso2time("2024-01-02T03:04:05Z").unwrap();
        assert_eq!(t, 1704164645);
    }
}
