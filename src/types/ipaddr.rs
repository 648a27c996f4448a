//! Definition of IP Address Types
//!
//! [`IPv4Address`] and [`IPv6Address`] are plain byte arrays. IPv4 formats through
//! `std::net::Ipv4Addr`; IPv6 is always written as RFC 5952 colon separated hex. [`ProtocolAddress`] picks between them by length, for ARP where the
//! protocol address length is carried in the packet.

use core::convert::TryFrom;
use core::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use serde::{Serialize, Serializer};

use crate::errors::Error as CrateError;
use crate::types::HardwareAddress;

#[derive(Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IPv4Address([u8; 4]);

impl IPv4Address {
    pub const fn octets(&self) -> [u8; 4] {
        self.0
    }
}

impl From<[u8; 4]> for IPv4Address {
    fn from(value: [u8; 4]) -> Self {
        Self(value)
    }
}

impl From<IPv4Address> for Ipv4Addr {
    fn from(value: IPv4Address) -> Self {
        Ipv4Addr::from(value.0)
    }
}

impl TryFrom<&'_ [u8]> for IPv4Address {
    type Error = CrateError;

    fn try_from(slice: &'_ [u8]) -> Result<Self, Self::Error> {
        <[u8; 4]>::try_from(slice)
            .map(Self)
            .map_err(|_| CrateError::ParseError(format!("IPv4Address: {}", hex::encode(slice))))
    }
}

impl fmt::Display for IPv4Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&Ipv4Addr::from(self.0), f)
    }
}

impl fmt::Debug for IPv4Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Serialize for IPv4Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

#[derive(Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IPv6Address([u8; 16]);

impl IPv6Address {
    pub const fn octets(&self) -> [u8; 16] {
        self.0
    }
}

impl From<[u8; 16]> for IPv6Address {
    fn from(value: [u8; 16]) -> Self {
        Self(value)
    }
}

impl From<IPv6Address> for Ipv6Addr {
    fn from(value: IPv6Address) -> Self {
        Ipv6Addr::from(value.0)
    }
}

impl TryFrom<&'_ [u8]> for IPv6Address {
    type Error = CrateError;

    fn try_from(slice: &'_ [u8]) -> Result<Self, Self::Error> {
        <[u8; 16]>::try_from(slice)
            .map(Self)
            .map_err(|_| CrateError::ParseError(format!("IPv6Address: {}", hex::encode(slice))))
    }
}

impl IPv6Address {
    fn segments(&self) -> [u16; 8] {
        let mut segments = [0_u16; 8];
        for (segment, pair) in segments.iter_mut().zip(self.0.chunks_exact(2)) {
            *segment = u16::from_be_bytes([pair[0], pair[1]]);
        }
        segments
    }
}

/// RFC 5952 text form, `2404:6800:4003:c04::1b`.
///
/// Always colon separated hex, IPv4 mapped and compatible addresses included
/// (`::ffff:0:0`, not `::ffff:0.0.0.0`).
impl fmt::Display for IPv6Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let segments = self.segments();

        // Longest run of two or more zero segments, the first one on a tie.
        let mut longest = (0, 0);
        let mut run = (0, 0);
        for (i, segment) in segments.iter().enumerate() {
            if *segment == 0 {
                if run.1 == 0 {
                    run.0 = i;
                }
                run.1 += 1;
                if run.1 > longest.1 {
                    longest = run;
                }
            } else {
                run.1 = 0;
            }
        }

        if longest.1 < 2 {
            return write_segments(f, &segments);
        }

        let (start, len) = longest;
        write_segments(f, &segments[..start])?;
        f.write_str("::")?;
        write_segments(f, &segments[start + len..])
    }
}

fn write_segments(f: &mut fmt::Formatter<'_>, segments: &[u16]) -> fmt::Result {
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            f.write_str(":")?;
        }
        write!(f, "{:x}", segment)?;
    }
    Ok(())
}

impl fmt::Debug for IPv6Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Serialize for IPv6Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// A network address whose family is implied by its length.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum ProtocolAddress {
    V4(IPv4Address),
    V6(IPv6Address),
    /// Neither 4 nor 16 bytes long, shown as colon separated hex.
    Other(HardwareAddress),
}

impl From<&'_ [u8]> for ProtocolAddress {
    fn from(slice: &[u8]) -> Self {
        if let Ok(octets) = <[u8; 4]>::try_from(slice) {
            ProtocolAddress::V4(octets.into())
        } else if let Ok(octets) = <[u8; 16]>::try_from(slice) {
            ProtocolAddress::V6(octets.into())
        } else {
            ProtocolAddress::Other(slice.into())
        }
    }
}

impl fmt::Display for ProtocolAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolAddress::V4(address) => fmt::Display::fmt(address, f),
            ProtocolAddress::V6(address) => fmt::Display::fmt(address, f),
            ProtocolAddress::Other(address) => fmt::Display::fmt(address, f),
        }
    }
}

impl fmt::Debug for ProtocolAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Serialize for ProtocolAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {

    use core::convert::TryInto;

    use super::*;

    wasm_tests! {
        #[test]
        fn ipv4_addr_display() {
            let ip: IPv4Address = [24, 166, 172, 1].into();
            assert_eq!(ip.to_string(), "24.166.172.1");

            let ip: Result<IPv4Address, _> = [0xc0_u8, 0xa8, 0x01][..].try_into();
            assert_eq!(
                ip,
                Err(CrateError::ParseError("IPv4Address: c0a801".to_string()))
            );
        }

        #[test]
        fn ipv6_addr_tests() {
            let test_cases = vec![
                "fe80::1",
                "::",
                "::1",
                "::ffff:0:0",
                "64:ff9b::",
                "2a03:2880:f12f:183:face:b00c:0:25de",
                "1:0:1:0:1:0:1:0",
                "2404:6800:4003:c04::1b",
                "::ffff:c0a8:1",
                "::c0a8:1",
                "1::1:0:0:1",
                "1:0:0:1::1",
                "fe80::",
            ];

            for input in test_cases {
                let octets = input.parse::<Ipv6Addr>().unwrap().octets();
                let ipv6: Result<IPv6Address, _> = octets[..].try_into();
                assert!(ipv6.is_ok(), "{}", input);
                assert_eq!(input, format!("{}", ipv6.unwrap()));
            }

            let ipv6: Result<IPv6Address, _> = [0_u8; 15][..].try_into();
            assert!(ipv6.is_err());
        }

        #[test]
        fn protocol_address_by_length() {
            let v4 = ProtocolAddress::from(&[0x18_u8, 0xa6, 0xad, 0x9f][..]);
            assert_eq!(v4, ProtocolAddress::V4([24, 166, 173, 159].into()));
            assert_eq!(v4.to_string(), "24.166.173.159");

            let mut octets = [0_u8; 16];
            octets[0] = 0xfe;
            octets[1] = 0x80;
            octets[15] = 0x01;
            let v6 = ProtocolAddress::from(&octets[..]);
            assert_eq!(v6.to_string(), "fe80::1");

            let other = ProtocolAddress::from(&[0x01_u8, 0x02][..]);
            assert_eq!(other.to_string(), "01:02");
            assert_eq!(
                serde_json::to_value(&other).unwrap(),
                serde_json::json!("01:02")
            );
        }
    }
}
