//! Hardware Address Type
//!
//! Link layer addresses of any length: 6 byte Ethernet MAC addresses, as well as whatever
//! hardware address length an ARP packet declares.

use core::fmt;

use serde::{Serialize, Serializer};

#[derive(Default, Clone, PartialEq, Eq, Hash)]
pub struct HardwareAddress(Vec<u8>);

impl HardwareAddress {
    /// Returns a slice containing the entire address.
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for HardwareAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl From<&'_ [u8]> for HardwareAddress {
    fn from(slice: &[u8]) -> Self {
        Self(slice.to_vec())
    }
}

impl From<[u8; 6]> for HardwareAddress {
    fn from(value: [u8; 6]) -> Self {
        Self(value.to_vec())
    }
}

/// Upper case hex octets separated by colons, `00:07:0D:AF:F4:54`.
impl fmt::Display for HardwareAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, octet) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:02X}", octet)?;
        }
        Ok(())
    }
}

impl fmt::Debug for HardwareAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
