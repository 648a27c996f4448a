//! Packet Structure
//!
//! A [`Packet`] is the decoded form of one captured frame. The link type of the capture selects
//! the outermost decoder through [`get_encap_types_map`]; every following layer is chosen by the
//! layer before it.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::Serialize;

use crate::cursor::Cursor;
use crate::errors::Error;
use crate::layers::ethernet::Ethernet;
use crate::layers::ipv4::IPv4;
use crate::layers::ipv6::IPv6;
use crate::types::{EncapType, ENCAP_TYPE_ETH, ENCAP_TYPE_NULL, ENCAP_TYPE_RAW};
use crate::Layer;

/// Length of the address family word that precedes the IP header on BSD loopback captures.
pub const NULL_HEADER_LEN: usize = 4_usize;

/// Dissector for a whole captured frame of one link type.
pub type PacketDissectFn = fn(&[u8]) -> Result<Packet, Error>;

/// A Map maintaining EncapType -> dissectors of the outermost layer.
pub fn get_encap_types_map() -> &'static HashMap<EncapType, PacketDissectFn> {
    static ENCAP_TYPES_MAP: OnceLock<HashMap<EncapType, PacketDissectFn>> = OnceLock::new();
    ENCAP_TYPES_MAP.get_or_init(|| {
        let mut map: HashMap<EncapType, PacketDissectFn> = HashMap::new();
        map.insert(ENCAP_TYPE_NULL, dissect_null);
        map.insert(ENCAP_TYPE_ETH, dissect_ethernet);
        map.insert(ENCAP_TYPE_RAW, dissect_raw);
        map
    })
}

fn dissect_ethernet(bytes: &[u8]) -> Result<Packet, Error> {
    let mut cursor = Cursor::new(bytes);
    Ethernet::dissect(&mut cursor).map(Packet::Ethernet)
}

fn dissect_null(bytes: &[u8]) -> Result<Packet, Error> {
    // The family word is in host byte order, so the IP version decides instead.
    dissect_ip(bytes, NULL_HEADER_LEN)
}

fn dissect_raw(bytes: &[u8]) -> Result<Packet, Error> {
    dissect_ip(bytes, 0)
}

/// Decodes an IPv4 or IPv6 packet starting at `offset`, by the version in its first nibble.
fn dissect_ip(bytes: &[u8], offset: usize) -> Result<Packet, Error> {
    let mut cursor = Cursor::new(bytes);
    cursor.skip(offset)?;

    let version = cursor.peek().map(|first| first >> 4);
    match version {
        Some(4) => IPv4::dissect(&mut cursor).map(Packet::IPv4),
        Some(6) => IPv6::dissect(&mut cursor).map(Packet::IPv6),
        Some(version) => Err(Error::UnsupportedIPVersion(version)),
        None => Err(Error::TooShort {
            offset,
            required: 1,
            available: 0,
            data: String::new(),
        }),
    }
}

/// A decoded packet, by its outermost layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Packet {
    Ethernet(Ethernet),
    IPv4(IPv4),
    IPv6(IPv6),
}

impl Packet {
    /// Create a Packet from a u8 buffer.
    ///
    /// This is the main API function. An application would typically call `Packet::from_bytes`
    /// and then on the returned packet, can walk its `layers` or format it as Json.
    pub fn from_bytes(bytes: &[u8], encap: EncapType) -> Result<Self, Error> {
        if bytes.is_empty() {
            return Err(Error::Empty);
        }

        match get_encap_types_map().get(&encap) {
            Some(dissect) => dissect(bytes),
            None => {
                log_debug!("no dissector for encapsulation type {}", encap);
                Err(Error::UnsupportedEncap(encap))
            }
        }
    }

    /// The outermost layer.
    pub fn as_layer(&self) -> &dyn Layer {
        match self {
            Packet::Ethernet(ethernet) => ethernet,
            Packet::IPv4(ipv4) => ipv4,
            Packet::IPv6(ipv6) => ipv6,
        }
    }

    /// Every decoded layer, outermost first.
    ///
    /// The packet quoted in an ICMP or ICMPv6 error message follows the message itself.
    pub fn layers(&self) -> Vec<&dyn Layer> {
        let mut layers = Vec::new();
        let mut next = Some(self.as_layer());
        while let Some(layer) = next {
            layers.push(layer);
            next = layer.next_layer();
        }
        layers
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::layers::L4;
    use crate::types::Label;

    wasm_tests! {
        #[test]
        fn from_bytes_fail_empty() {
            let p = Packet::from_bytes(&[], ENCAP_TYPE_ETH);
            assert_eq!(p, Err(Error::Empty));
        }

        #[test]
        fn from_bytes_fail_unsupported_encap() {
            let p = Packet::from_bytes(&[0; 20], 42);
            assert_eq!(p, Err(Error::UnsupportedEncap(42)));
        }

        #[test]
        fn from_bytes_fail_ip_version() {
            let p = Packet::from_bytes(&[0x55, 0x00, 0x00, 0x14], ENCAP_TYPE_RAW);
            assert_eq!(p, Err(Error::UnsupportedIPVersion(5)));

            let p = Packet::from_bytes(&[0x02, 0x00, 0x00, 0x00, 0x00], ENCAP_TYPE_NULL);
            assert_eq!(p, Err(Error::UnsupportedIPVersion(0)));

            let p = Packet::from_bytes(&[0x02, 0x00, 0x00, 0x00], ENCAP_TYPE_NULL);
            assert!(matches!(p, Err(Error::TooShort { offset: 4, .. })), "{:?}", p);
        }

        #[test]
        fn from_bytes_success_eth_hdr_size() {
            let p = Packet::from_bytes(&[0; 14], ENCAP_TYPE_ETH);
            assert!(p.is_ok(), "{:?}", p.err());

            let p = p.unwrap();
            assert_eq!(p.layers().len(), 1);
            let value = serde_json::to_value(&p).unwrap();
            assert_eq!(value.get("type"), Some(&json!("ethernet")));
            assert_eq!(value.get("ether_type"), Some(&json!("length")));
            assert_eq!(value.get("length"), Some(&json!(0)));
            assert_eq!(value.get("data"), Some(&json!("")));
        }

        #[test]
        fn null_encapsulation() {
            let array = hex::decode("020000004500001c0001000040110000c0a80001c0a8000204d2162e00080000").unwrap();
            let p = Packet::from_bytes(&array, ENCAP_TYPE_NULL);
            assert!(p.is_ok(), "{:?}", p.err());

            let p = p.unwrap();
            let names: Vec<_> = p.layers().iter().map(|l| l.short_name()).collect();
            assert_eq!(names, ["ip", "udp"]);
            match p {
                Packet::IPv4(ip) => {
                    assert_eq!(ip.src.map(|a| a.to_string()).as_deref(), Some("192.168.0.1"));
                    assert_eq!(ip.protocol, Some(Label::Name("udp")));
                }
                other => panic!("expected IPv4, got {:?}", other),
            }
        }

        #[test]
        fn parse_valid_ipv6_packet() {
            let array = hex::decode("000573a007d168a3c4f949f686dd600000000020064020010470e5bfdead49572174e82c48872607f8b0400c0c03000000000000001af9c7001903a088300000000080022000da4700000204058c0103030801010402");
            assert!(array.is_ok());
            let array = array.unwrap();

            let p = Packet::from_bytes(&array, ENCAP_TYPE_ETH);
            assert!(p.is_ok(), "{:?}", p.err());

            let p = p.unwrap();
            let names: Vec<_> = p.layers().iter().map(|l| l.name()).collect();
            assert_eq!(names, ["Ethernet", "IPv6", "TCP"]);

            let tcp = match &p {
                Packet::Ethernet(Ethernet {
                    data: Some(crate::layers::L3::IPv6(IPv6 { data: Some(L4::Tcp(tcp)), .. })),
                    ..
                }) => tcp,
                other => panic!("expected Ethernet/IPv6/TCP, got {:?}", other),
            };
            assert_eq!(tcp.src_port, Some(0xf9c7));
            assert_eq!(tcp.dest_port, Some(25));
            assert_eq!(tcp.flags, Some(crate::types::FlagSet::from(["SYN"])));
            assert_eq!(tcp.offset, Some(8));
            assert_eq!(tcp.opts.as_ref().map(Vec::len), Some(3));
            assert_eq!(tcp.data.as_ref().map(|d| d.len()), Some(0));
        }

        #[test]
        fn decoding_is_deterministic() {
            let array = hex::decode("45000038a22200004001217ec0a80105c0a801640303fd15000000004500002800004000ff11225ec0a80164c0a80105007b0035001470e1").unwrap();

            let first = Packet::from_bytes(&array, ENCAP_TYPE_RAW);
            let second = Packet::from_bytes(&array, ENCAP_TYPE_RAW);
            assert!(first.is_ok(), "{:?}", first.err());
            assert_eq!(first, second);
            assert_eq!(
                serde_json::to_string(&first.unwrap()).unwrap(),
                serde_json::to_string(&second.unwrap()).unwrap()
            );
        }
    }
}
