//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::str::FromStr;

use serde_with::{DeserializeFromStr, SerializeDisplay};

// 48-bit MAC address (IEEE EUI-48 format).
//
// Serialized using its textual form, which is how both the DUT and the
// traffic generator report neighbor entries.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(DeserializeFromStr, SerializeDisplay)]
pub struct MacAddr([u8; 6]);

/// Error type for MAC address parsing.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseMacAddrError(String);

// ===== impl MacAddr =====

impl MacAddr {
    pub const LENGTH: usize = 6;
}

impl From<[u8; 6]> for MacAddr {
    fn from(bytes: [u8; 6]) -> Self {
        MacAddr(bytes)
    }
}

impl std::fmt::Display for MacAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!(
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5],
        ))
    }
}

impl FromStr for MacAddr {
    type Err = ParseMacAddrError;

    /// Parse a MAC address from a string.
    ///
    /// Accepts formats:
    /// - Colon-separated: "aa:bb:cc:dd:ee:ff"
    /// - Hyphen-separated: "aa-bb-cc-dd-ee-ff"
    ///
    /// Hex digits are case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = || ParseMacAddrError(s.to_owned());
        let separator = if s.contains(':') {
            ':'
        } else if s.contains('-') {
            '-'
        } else {
            return Err(error());
        };

        let parts = s.split(separator).collect::<Vec<_>>();
        if parts.len() != MacAddr::LENGTH {
            return Err(error());
        }

        let mut bytes = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_hexdigit())
            {
                return Err(error());
            }
            bytes[i] = u8::from_str_radix(part, 16).map_err(|_| error())?;
        }

        Ok(MacAddr(bytes))
    }
}

// ===== impl ParseMacAddrError =====

impl std::fmt::Display for ParseMacAddrError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid MAC address: {}", self.0)
    }
}

impl std::error::Error for ParseMacAddrError {}

// ===== unit tests =====

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_separators() {
        let colon = "00:11:22:AA:bb:cc".parse::<MacAddr>().unwrap();
        let hyphen = "00-11-22-aa-bb-cc".parse::<MacAddr>().unwrap();
        assert_eq!(colon, hyphen);
        assert_eq!(colon.to_string(), "00:11:22:aa:bb:cc");
    }

    #[test]
    fn parse_invalid() {
        assert!("001122aabbcc".parse::<MacAddr>().is_err());
        assert!("00:11:22:aa:bb".parse::<MacAddr>().is_err());
        assert!("00:11:22:aa:bb:zz".parse::<MacAddr>().is_err());
        assert!("0:11:22:aa:bb:cc".parse::<MacAddr>().is_err());
        assert!("+0:11:22:aa:bb:cc".parse::<MacAddr>().is_err());
    }

    #[test]
    fn serde_string_form() {
        let mac = MacAddr::from([0x00, 0x00, 0x01, 0x01, 0x01, 0x01]);
        let json = serde_json::to_string(&mac).unwrap();
        assert_eq!(json, "\"00:00:01:01:01:01\"");
        assert_eq!(serde_json::from_str::<MacAddr>(&json).unwrap(), mac);
    }
}
