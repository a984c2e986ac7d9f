//! Remote engine version.
//!
//! Firebird versions are encoded as a single integer,
//! `major * 10000 + minor * 100 + patch`, so 2.5.9 becomes `20509`. Capability
//! tiers compare against these values.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteVersion(u32);

impl RemoteVersion {
    pub const V1_5: RemoteVersion = RemoteVersion(10500);
    pub const V2_0: RemoteVersion = RemoteVersion(20000);
    pub const V2_1: RemoteVersion = RemoteVersion(20100);
    pub const V2_5: RemoteVersion = RemoteVersion(20500);
    pub const V3_0: RemoteVersion = RemoteVersion(30000);
    pub const V4_0: RemoteVersion = RemoteVersion(40000);

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        RemoteVersion(major * 10000 + minor * 100 + patch)
    }

    /// Like [`RemoteVersion::new`], but `None` when the encoding does not fit
    pub const fn checked_new(major: u32, minor: u32, patch: u32) -> Option<Self> {
        if minor > 99 || patch > 99 {
            return None;
        }
        match major.checked_mul(10000) {
            Some(high) => match high.checked_add(minor * 100 + patch) {
                Some(value) => Some(RemoteVersion(value)),
                None => None,
            },
            None => None,
        }
    }

    pub const fn from_encoded(value: u32) -> Self {
        RemoteVersion(value)
    }

    pub const fn encoded(self) -> u32 {
        self.0
    }

    pub const fn major(self) -> u32 {
        self.0 / 10000
    }

    pub const fn minor(self) -> u32 {
        (self.0 / 100) % 100
    }

    pub const fn patch(self) -> u32 {
        self.0 % 100
    }

    /// Firebird gained a native BOOLEAN type in 3.0
    pub fn has_native_boolean(self) -> bool {
        self >= Self::V3_0
    }

    /// Parse a version from `"3.0.7"`, the encoded `"30007"`, or a server
    /// version banner such as `"WI-V3.0.7.33374 Firebird 3.0"`.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return trimmed
                .parse::<u32>()
                .map(RemoteVersion)
                .map_err(|_| Error::invalid_version(input));
        }

        let bytes = trimmed.as_bytes();
        let mut start = 0;
        while start < bytes.len() {
            if !bytes[start].is_ascii_digit() {
                start += 1;
                continue;
            }
            let mut end = start;
            while end < bytes.len() && (bytes[end].is_ascii_digit() || bytes[end] == b'.') {
                end += 1;
            }
            if let Some(version) = Self::from_dotted(&trimmed[start..end]) {
                return Ok(version);
            }
            start = end;
        }

        Err(Error::invalid_version(input))
    }

    fn from_dotted(text: &str) -> Option<Self> {
        let mut parts = text.split('.').filter(|p| !p.is_empty());
        let major: u32 = parts.next()?.parse().ok()?;
        let minor: u32 = parts.next()?.parse().ok()?;
        let patch: u32 = match parts.next() {
            Some(p) => p.parse().ok()?,
            None => 0,
        };
        Self::checked_new(major, minor, patch)
    }
}

impl fmt::Display for RemoteVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major(), self.minor(), self.patch())
    }
}

impl FromStr for RemoteVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
