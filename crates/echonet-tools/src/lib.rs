use echonet_core::types::Eoj;
use std::fmt;

/// Error returned by the argument parsers below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseArgError(String);

impl fmt::Display for ParseArgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ParseArgError {}

/// Parses an object identifier given as six hex digits (`013001`), with
/// optional `-`, `:` or `.` separators (`01-30-01`).
pub fn parse_eoj(s: &str) -> Result<Eoj, ParseArgError> {
    let bytes = parse_hex_bytes(s)?;
    match bytes.as_slice() {
        [group, class, instance] => Ok(Eoj::new(*group, *class, *instance)),
        _ => Err(ParseArgError(format!(
            "object identifier must be 3 bytes, got {}",
            bytes.len()
        ))),
    }
}

/// Parses a property code such as `80` or `0x80`.
pub fn parse_epc(s: &str) -> Result<u8, ParseArgError> {
    let digits = s.trim_start_matches("0x").trim_start_matches("0X");
    u8::from_str_radix(digits, 16)
        .map_err(|e| ParseArgError(format!("invalid property code {s:?}: {e}")))
}

/// Parses hex data (`30`, `0x0102`, `01:02`). An empty string is an empty
/// EDT.
pub fn parse_hex_bytes(s: &str) -> Result<Vec<u8>, ParseArgError> {
    let s = s.trim();
    let s = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    let digits: Vec<char> = s
        .chars()
        .filter(|c| !matches!(c, '-' | ':' | '.' | ' '))
        .collect();
    if digits.len() % 2 != 0 {
        return Err(ParseArgError(format!("odd number of hex digits in {s:?}")));
    }
    digits
        .chunks(2)
        .map(|pair| {
            let byte: String = pair.iter().collect();
            u8::from_str_radix(&byte, 16)
                .map_err(|_| ParseArgError(format!("invalid hex byte {byte:?}")))
        })
        .collect()
}

/// Parses `EPC=EDT` pairs used by the set tool, e.g. `80=30`.
pub fn parse_assignment(s: &str) -> Result<(u8, Vec<u8>), ParseArgError> {
    let (epc, edt) = s
        .split_once('=')
        .ok_or_else(|| ParseArgError(format!("expected EPC=EDT, got {s:?}")))?;
    Ok((parse_epc(epc)?, parse_hex_bytes(edt)?))
}

/// Formats bytes as contiguous lowercase hex.
pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::{hex, parse_assignment, parse_eoj, parse_epc, parse_hex_bytes};
    use echonet_core::types::Eoj;

    #[test]
    fn eoj_forms() {
        assert_eq!(parse_eoj("013001").unwrap(), Eoj::new(0x01, 0x30, 0x01));
        assert_eq!(parse_eoj("0e-f0-01").unwrap(), Eoj::NODE_PROFILE);
        assert_eq!(parse_eoj("05:FF:01").unwrap(), Eoj::CONTROLLER);
        assert!(parse_eoj("0130").is_err());
        assert!(parse_eoj("01300102").is_err());
    }

    #[test]
    fn epc_forms() {
        assert_eq!(parse_epc("80").unwrap(), 0x80);
        assert_eq!(parse_epc("0x9F").unwrap(), 0x9F);
        assert!(parse_epc("100").is_err());
        assert!(parse_epc("zz").is_err());
    }

    #[test]
    fn hex_data() {
        assert_eq!(parse_hex_bytes("").unwrap(), Vec::<u8>::new());
        assert_eq!(parse_hex_bytes("0x0102").unwrap(), vec![1, 2]);
        assert_eq!(parse_hex_bytes("fe:00:00:0b").unwrap(), vec![0xFE, 0, 0, 0x0B]);
        assert!(parse_hex_bytes("123").is_err());
        assert!(parse_hex_bytes("gg").is_err());
        assert_eq!(hex(&[0x00, 0x00, 0x0B]), "00000b");
    }

    #[test]
    fn assignments() {
        assert_eq!(parse_assignment("80=30").unwrap(), (0x80, vec![0x30]));
        assert_eq!(parse_assignment("0xB0=41").unwrap(), (0xB0, vec![0x41]));
        assert!(parse_assignment("80").is_err());
    }
}
