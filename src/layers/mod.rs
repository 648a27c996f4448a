//! Incision Layers
//!
//! One module per protocol decoder. Decoders are chained through dispatch tables: the
//! [`ethernet`] layer picks the network layer decoder by EtherType, and [`ipv4`] and [`ipv6`]
//! pick the transport decoder by IP protocol number through [`get_protocols_map`]. A code with
//! no registered decoder is not an error; the rest of the packet is kept as
//! [`RawBytes`][`crate::types::RawBytes`].
//!
//! Every table is built on first use and never changes afterwards.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::Serialize;

use crate::cursor::Cursor;
use crate::errors::Error;
use crate::types::{RawBytes, IPPROTO_ICMP, IPPROTO_ICMPV6, IPPROTO_TCP, IPPROTO_UDP};
use crate::Layer;

pub mod arp;
pub mod ethernet;
pub mod icmp;
pub mod icmpv6;
pub mod ipv4;
pub mod ipv6;
pub mod tcp;
pub mod udp;

/// Network layer carried by a link layer frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum L3 {
    Arp(arp::ARP),
    IPv4(ipv4::IPv4),
    IPv6(ipv6::IPv6),
    Raw(RawBytes),
}

impl L3 {
    pub fn as_layer(&self) -> Option<&dyn Layer> {
        match self {
            L3::Arp(arp) => Some(arp),
            L3::IPv4(ipv4) => Some(ipv4),
            L3::IPv6(ipv6) => Some(ipv6),
            L3::Raw(_) => None,
        }
    }
}

/// Transport layer carried by an IP packet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum L4 {
    Tcp(tcp::TCP),
    Udp(udp::UDP),
    Icmp(icmp::ICMP),
    Icmpv6(icmpv6::ICMPv6),
    Raw(RawBytes),
}

impl L4 {
    pub fn as_layer(&self) -> Option<&dyn Layer> {
        match self {
            L4::Tcp(tcp) => Some(tcp),
            L4::Udp(udp) => Some(udp),
            L4::Icmp(icmp) => Some(icmp),
            L4::Icmpv6(icmpv6) => Some(icmpv6),
            L4::Raw(_) => None,
        }
    }
}

/// Dissector for the payload of an IP packet.
pub type L4DissectFn = fn(&mut Cursor<'_>) -> Result<L4, Error>;

/// IP protocol number -> transport layer dissectors, shared by IPv4 and IPv6.
pub fn get_protocols_map() -> &'static HashMap<u8, L4DissectFn> {
    static PROTOCOLS_MAP: OnceLock<HashMap<u8, L4DissectFn>> = OnceLock::new();
    PROTOCOLS_MAP.get_or_init(|| {
        let mut map: HashMap<u8, L4DissectFn> = HashMap::new();
        map.insert(IPPROTO_ICMP, icmp::dissect_l4);
        map.insert(IPPROTO_TCP, tcp::dissect_l4);
        map.insert(IPPROTO_UDP, udp::dissect_l4);
        map.insert(IPPROTO_ICMPV6, icmpv6::dissect_l4);
        map
    })
}

/// Decodes an IP payload with the dissector registered for `protocol`, or keeps it as raw
/// bytes.
pub(crate) fn dissect_transport(
    cursor: &mut Cursor<'_>,
    protocol: Option<u8>,
) -> Result<L4, Error> {
    match protocol.and_then(|protocol| get_protocols_map().get(&protocol)) {
        Some(dissect) => dissect(cursor),
        None => {
            log_debug!("no dissector for IP protocol {:?}", protocol);
            Ok(L4::Raw(cursor.unused().into()))
        }
    }
}

/// Builds every dispatch table up front.
///
/// Decoding builds them on first use as well. Calling this first keeps that one time cost out
/// of the first decode, e.g. when timing it.
pub fn register_defaults() {
    ethernet::get_ethertypes_map();
    get_protocols_map();
    icmpv6::get_messages_map();
    crate::packet::get_encap_types_map();
}
