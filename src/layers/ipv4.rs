//! IPv4 Layer

use serde::Serialize;

use crate::cursor::Cursor;
use crate::dissector::{BitRange, Dissector, FlagTable};
use crate::errors::Error;
use crate::layers::{dissect_transport, L3, L4};
use crate::types::{FlagSet, IPv4Address, Label, IP_PROTOCOLS};
use crate::Layer;

/// Basic Length of the IPv4 Header when no options are present, in 32 bit words
pub const IPV4_BASE_HEADER_WORDS: usize = 5_usize;

/// Flags in the flags and fragment offset word.
pub static IPV4_FLAGS: &FlagTable = &[("R", 15), ("DF", 14), ("MF", 13)];

pub(crate) fn dissect_l3(cursor: &mut Cursor<'_>) -> Result<L3, Error> {
    IPv4::dissect(cursor).map(L3::IPv4)
}

/// Decodes an IPv4 packet that may be cut short, such as the original datagram quoted in an ICMP
/// error. Missing fields are left out instead of failing.
pub(crate) fn dissect_truncated(cursor: &mut Cursor<'_>) -> Result<IPv4, Error> {
    cursor.allow_truncation();
    IPv4::dissect(cursor)
}

#[derive(Default)]
struct IPv4Temp {
    version_ihl: Option<u8>,
    dscp_ecn: Option<u8>,
    flags_offset: Option<u16>,
    protocol: Option<u8>,
}

/// Structure representing the IPv4 Header
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ipv4")]
pub struct IPv4 {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ihl: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dscp: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ecn: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<FlagSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frag_offset: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Label<u8>>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "crate::types::hex::serialize_lower_hex_u16"
    )]
    pub checksum: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<IPv4Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest: Option<IPv4Address>,
    /// Option words, not interpreted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opts: Option<Vec<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<L4>,
}

impl IPv4 {
    pub fn dissect(cursor: &mut Cursor<'_>) -> Result<Self, Error> {
        let mut d = Dissector::<IPv4, IPv4Temp>::new(cursor);
        d.temp(|t| &mut t.version_ihl)?
            .bits(|t| t.version_ihl, BitRange::new(7, 4), |p| &mut p.version)
            .bits(|t| t.version_ihl, BitRange::new(3, 0), |p| &mut p.ihl)
            .temp(|t| &mut t.dscp_ecn)?
            .bits(|t| t.dscp_ecn, BitRange::new(7, 2), |p| &mut p.dscp)
            .bits(|t| t.dscp_ecn, BitRange::new(1, 0), |p| &mut p.ecn)
            .scalar(|p| &mut p.length)?
            .scalar(|p| &mut p.id)?
            .temp(|t| &mut t.flags_offset)?
            .flags(|t| t.flags_offset, IPV4_FLAGS, |p| &mut p.flags)
            .bits(|t| t.flags_offset, BitRange::new(12, 0), |p| &mut p.frag_offset)
            .scalar(|p| &mut p.ttl)?
            .temp(|t| &mut t.protocol)?
            .scalar(|p| &mut p.checksum)?
            .bytes_try(|p| &mut p.src, 4, IPv4Address::try_from)?
            .bytes_try(|p| &mut p.dest, 4, IPv4Address::try_from)?;

        let option_words = d
            .packet()
            .ihl
            .map_or(0, |ihl| usize::from(ihl).saturating_sub(IPV4_BASE_HEADER_WORDS));
        d.times(|p| &mut p.opts, option_words, |c| c.u32())?;

        let protocol = d.scratch().protocol;
        if let Some(protocol) = protocol {
            d.constant(|p| &mut p.protocol, Label::lookup(IP_PROTOCOLS, protocol));
        }
        d.nested(|p| &mut p.data, |c| dissect_transport(c, protocol))?;

        Ok(d.finish())
    }
}

impl Layer for IPv4 {
    fn name(&self) -> &'static str {
        "IPv4"
    }

    fn short_name(&self) -> &'static str {
        "ip"
    }

    fn next_layer(&self) -> Option<&dyn Layer> {
        self.data.as_ref().and_then(L4::as_layer)
    }
}
