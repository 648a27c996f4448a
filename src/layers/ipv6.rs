//! IPv6 Layer

use serde::Serialize;

use crate::cursor::Cursor;
use crate::dissector::{BitRange, Dissector};
use crate::errors::Error;
use crate::layers::{dissect_transport, get_protocols_map, L3, L4};
use crate::types::{
    IPv6Address, Label, RawBytes, IPPROTO_AH, IPPROTO_DSTOPTS, IPPROTO_ESP, IPPROTO_EXPERIMENT1,
    IPPROTO_EXPERIMENT2, IPPROTO_FRAGMENT, IPPROTO_HIP, IPPROTO_HOPOPTS, IPPROTO_MOBILITY,
    IPPROTO_NONE, IPPROTO_ROUTING, IPPROTO_SHIM6, IP_PROTOCOLS,
};
use crate::Layer;

/// Next header values that introduce an extension header.
pub const IPV6_EXTENSION_HEADERS: [u8; 11] = [
    IPPROTO_HOPOPTS,
    IPPROTO_ROUTING,
    IPPROTO_FRAGMENT,
    IPPROTO_ESP,
    IPPROTO_AH,
    IPPROTO_DSTOPTS,
    IPPROTO_MOBILITY,
    IPPROTO_HIP,
    IPPROTO_SHIM6,
    IPPROTO_EXPERIMENT1,
    IPPROTO_EXPERIMENT2,
];

pub(crate) fn dissect_l3(cursor: &mut Cursor<'_>) -> Result<L3, Error> {
    IPv6::dissect(cursor).map(L3::IPv6)
}

/// Decodes an IPv6 packet that may be cut short, such as the original packet quoted in an ICMPv6
/// error. Missing fields are left out instead of failing.
pub(crate) fn dissect_truncated(cursor: &mut Cursor<'_>) -> Result<IPv6, Error> {
    cursor.allow_truncation();
    IPv6::dissect(cursor)
}

/// Skips extension headers until a next header value that is not one.
///
/// Returns the final next header value, or `None` if the chain was cut short.
fn skip_extension_headers(
    cursor: &mut Cursor<'_>,
    mut next: Option<u8>,
) -> Result<Option<u8>, Error> {
    while let Some(header) = next {
        if header == IPPROTO_NONE
            || get_protocols_map().contains_key(&header)
            || !IPV6_EXTENSION_HEADERS.contains(&header)
        {
            break;
        }

        next = cursor.u8()?;
        match cursor.u8()? {
            // Length is in 8 byte units, not counting the first 8 bytes.
            Some(len) => cursor.skip(8 * (usize::from(len) + 1) - 2)?,
            None => return Ok(None),
        }
        log_trace!("skipped IPv6 extension header {}", header);
    }

    Ok(next.filter(|_| !cursor.is_truncated()))
}

#[derive(Default)]
struct IPv6Temp {
    version_class_flow: Option<u32>,
    next_header: Option<u8>,
}

/// Structure representing the IPv6 Header
///
/// `protocol` is the next header value that ends the extension header chain; the extension
/// headers themselves are skipped.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ipv6")]
pub struct IPv6 {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Label<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hop_limit: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<IPv6Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest: Option<IPv6Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<L4>,
}

impl IPv6 {
    pub fn dissect(cursor: &mut Cursor<'_>) -> Result<Self, Error> {
        let mut d = Dissector::<IPv6, IPv6Temp>::new(cursor);
        d.temp(|t| &mut t.version_class_flow)?
            .bits(|t| t.version_class_flow, BitRange::new(31, 28), |p| &mut p.version)
            .bits(|t| t.version_class_flow, BitRange::new(27, 20), |p| &mut p.class)
            .bits(|t| t.version_class_flow, BitRange::new(19, 0), |p| &mut p.flow)
            .scalar(|p| &mut p.length)?
            .temp(|t| &mut t.next_header)?
            .scalar(|p| &mut p.hop_limit)?
            .bytes_try(|p| &mut p.src, 16, IPv6Address::try_from)?
            .bytes_try(|p| &mut p.dest, 16, IPv6Address::try_from)?;

        let first = d.scratch().next_header;
        let next = skip_extension_headers(d.cursor(), first)?;
        if let Some(protocol) = next {
            d.constant(|p| &mut p.protocol, Label::lookup(IP_PROTOCOLS, protocol));
        }

        if next == Some(IPPROTO_NONE) {
            d.constant(|p| &mut p.data, L4::Raw(RawBytes::default()));
        } else {
            d.nested(|p| &mut p.data, |c| dissect_transport(c, next))?;
        }

        Ok(d.finish())
    }
}

impl Layer for IPv6 {
    fn name(&self) -> &'static str {
        "IPv6"
    }

    fn short_name(&self) -> &'static str {
        "ip6"
    }

    fn next_layer(&self) -> Option<&dyn Layer> {
        self.data.as_ref().and_then(L4::as_layer)
    }
}
