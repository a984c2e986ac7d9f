//! Correlation of scanned rows with later UPDATE/DELETE statements.
//!
//! Firebird identifies a row within a transaction by `RDB$DB_KEY`, an opaque
//! 8-byte value. The scan splits it into two 32-bit halves stored in carrier
//! slots of the produced row; the modify path asks for those slots back under
//! fixed names, reassembles the key and binds it as the final parameter of
//! `WHERE rdb$db_key = ?`.
//!
//! A row identity is only meaningful inside one statement's scan/modify
//! pipeline. Never persist it or compare it across transactions.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;

/// Remote pseudo-column holding the row identity
pub const ROW_IDENTITY_COLUMN: &str = "rdb$db_key";

/// Synthetic column carrying the high half of the row identity
pub const HIGH_CARRIER_COLUMN: &str = "db_key_ctidpart";

/// Synthetic column carrying the low half of the row identity
pub const LOW_CARRIER_COLUMN: &str = "db_key_oidpart";

/// Both carrier column names, in the order the modify path requests them
pub const CARRIER_COLUMNS: [&str; 2] = [HIGH_CARRIER_COLUMN, LOW_CARRIER_COLUMN];

/// Split an 8-byte key into its big-endian high and low halves
pub fn split(key: [u8; 8]) -> (u32, u32) {
    let [a, b, c, d, e, f, g, h] = key;
    (
        u32::from_be_bytes([a, b, c, d]),
        u32::from_be_bytes([e, f, g, h]),
    )
}

/// Inverse of [`split`]
pub fn reassemble(high: u32, low: u32) -> [u8; 8] {
    let mut key = [0u8; 8];
    key[..4].copy_from_slice(&high.to_be_bytes());
    key[4..].copy_from_slice(&low.to_be_bytes());
    key
}

/// Opaque per-row identifier of a Firebird row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowIdentity([u8; 8]);

impl RowIdentity {
    pub const LEN: usize = 8;

    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    /// Build from the raw column value read from the remote cursor
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let key: [u8; 8] = bytes.try_into().map_err(|_| {
            Error::internal(format!(
                "{ROW_IDENTITY_COLUMN} must be {} bytes, got {}",
                Self::LEN,
                bytes.len()
            ))
        })?;
        Ok(Self(key))
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    /// High and low carrier values for this identity
    pub fn halves(&self) -> (u32, u32) {
        split(self.0)
    }

    pub fn from_halves(high: u32, low: u32) -> Self {
        Self(reassemble(high, low))
    }

    /// Parameter text sent to the remote engine: sixteen lower-case hex digits
    pub fn to_hex(&self) -> String {
        self.to_string()
    }

    /// Parse the sixteen-digit form produced by [`to_hex`](Self::to_hex)
    pub fn parse_hex(text: &str) -> Result<Self> {
        if text.len() != 16 || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::internal(format!(
                "invalid {ROW_IDENTITY_COLUMN} value \"{text}\""
            )));
        }
        let parse = |digits: &str| {
            u32::from_str_radix(digits, 16)
                .map_err(|e| Error::internal(format!("invalid {ROW_IDENTITY_COLUMN} value: {e}")))
        };
        Ok(Self::from_halves(parse(&text[..8])?, parse(&text[8..])?))
    }
}

impl fmt::Display for RowIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (high, low) = self.halves();
        write!(f, "{high:08x}{low:08x}")
    }
}

/// Source of carrier values on the modify path, keyed by carrier column name.
/// `None` means the slot is absent or NULL.
pub trait CarrierSource {
    fn carrier(&self, column: &str) -> Option<u32>;
}

impl CarrierSource for HashMap<String, u32> {
    fn carrier(&self, column: &str) -> Option<u32> {
        self.get(column).copied()
    }
}

impl CarrierSource for HashMap<&str, u32> {
    fn carrier(&self, column: &str) -> Option<u32> {
        self.get(column).copied()
    }
}

/// The two carrier slots of a scanned row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Carriers {
    pub high: Option<u32>,
    pub low: Option<u32>,
}

impl Carriers {
    /// Fill both slots from an identity read during the scan
    pub fn from_identity(identity: RowIdentity) -> Self {
        let (high, low) = identity.halves();
        Self {
            high: Some(high),
            low: Some(low),
        }
    }

    /// Reassemble the identity, failing if either slot is empty
    pub fn identity(&self) -> Result<RowIdentity> {
        extract(self)
    }
}

impl CarrierSource for Carriers {
    fn carrier(&self, column: &str) -> Option<u32> {
        match column {
            HIGH_CARRIER_COLUMN => self.high,
            LOW_CARRIER_COLUMN => self.low,
            _ => None,
        }
    }
}

/// Read both carrier slots and reassemble the row identity.
///
/// A missing or NULL slot means the planner did not project the carriers for
/// an updatable relation, which is an internal error.
pub fn extract(source: &dyn CarrierSource) -> Result<RowIdentity> {
    let high = source
        .carrier(HIGH_CARRIER_COLUMN)
        .ok_or_else(|| Error::internal("db_key (CTID part) is NULL"))?;
    let low = source
        .carrier(LOW_CARRIER_COLUMN)
        .ok_or_else(|| Error::internal("db_key (OID part) is NULL"))?;
    Ok(RowIdentity::from_halves(high, low))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 8] = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];

    #[test]
    fn test_split_and_reassemble() {
        assert_eq!(split(KEY), (0x0102_0304, 0x0506_0708));
        assert_eq!(reassemble(0x0102_0304, 0x0506_0708), KEY);
        assert_eq!(reassemble(u32::MAX, 0), [0xff, 0xff, 0xff, 0xff, 0, 0, 0, 0]);
    }

    #[test]
    fn test_hex_form() {
        let id = RowIdentity::from_bytes(KEY);
        assert_eq!(id.to_hex(), "0102030405060708");
        assert_eq!(RowIdentity::from_halves(0x8a, 0x1).to_hex(), "0000008a00000001");
        assert_eq!(RowIdentity::parse_hex("0102030405060708").unwrap(), id);
        assert_eq!(
            RowIdentity::parse_hex("DEADBEEF00000001").unwrap().halves(),
            (0xdead_beef, 1)
        );
        for bad in ["", "0102", "01020304050607089", "01020304zz060708", "+102030405060708"] {
            assert!(RowIdentity::parse_hex(bad).unwrap_err().is_internal(), "{bad}");
        }
    }

    #[test]
    fn test_from_slice_length() {
        assert_eq!(RowIdentity::from_slice(&KEY).unwrap().as_bytes(), &KEY);
        assert!(RowIdentity::from_slice(&KEY[..7]).unwrap_err().is_internal());
    }

    #[test]
    fn test_carriers_round_trip() {
        let id = RowIdentity::from_bytes(KEY);
        let carriers = Carriers::from_identity(id);
        assert_eq!(carriers.high, Some(0x0102_0304));
        assert_eq!(carriers.identity().unwrap(), id);
    }

    #[test]
    fn test_missing_carrier_is_internal() {
        let err = extract(&Carriers {
            high: None,
            low: Some(1),
        })
        .unwrap_err();
        assert!(err.is_internal());
        assert_eq!(err.to_string(), "Internal error: db_key (CTID part) is NULL");

        let mut named: HashMap<&str, u32> = HashMap::new();
        named.insert(HIGH_CARRIER_COLUMN, 7);
        let err = extract(&named).unwrap_err();
        assert_eq!(err.to_string(), "Internal error: db_key (OID part) is NULL");

        named.insert(LOW_CARRIER_COLUMN, 9);
        assert_eq!(extract(&named).unwrap().halves(), (7, 9));
    }
}
