//! Hex address parsing for command arguments.

use anyhow::{Result, bail};

/// Parse an address written in hex, with or without a `0x` prefix.
pub fn parse_hex_address(s: &str) -> Result<u64> {
    let digits = s
        .trim()
        .trim_start_matches("0x")
        .trim_start_matches("0X")
        .replace('_', "");
    if digits.is_empty() {
        bail!("Empty address");
    }
    u64::from_str_radix(&digits, 16).map_err(|e| anyhow::anyhow!("Invalid hex address {:?}: {}", s, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_and_without_prefix() {
        assert_eq!(parse_hex_address("0x1000").unwrap(), 0x1000);
        assert_eq!(parse_hex_address("0X1000").unwrap(), 0x1000);
        assert_eq!(parse_hex_address("DEADBEEF").unwrap(), 0xDEADBEEF);
    }

    #[test]
    fn test_parse_with_separators() {
        assert_eq!(parse_hex_address("0x7FF6_1000").unwrap(), 0x7FF6_1000);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_hex_address("").is_err());
        assert!(parse_hex_address("0x").is_err());
        assert!(parse_hex_address("0xZZZ").is_err());
    }
}
