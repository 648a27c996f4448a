//! TCP Layer

use serde::Serialize;

use crate::cursor::Cursor;
use crate::dissector::{BitRange, Dissector, FlagTable};
use crate::errors::Error;
use crate::layers::L4;
use crate::types::{FlagSet, RawBytes};
use crate::Layer;

/// TCP header length when no options are present, in 32 bit words
pub const TCP_BASE_HEADER_WORDS: usize = 5_usize;

/// Flags of the flags byte. CWR (bit 7) is not reported.
pub static TCP_FLAGS: &FlagTable = &[
    ("ECE", 6),
    ("URG", 5),
    ("ACK", 4),
    ("PSH", 3),
    ("RST", 2),
    ("SYN", 1),
    ("FIN", 0),
];

pub(crate) fn dissect_l4(cursor: &mut Cursor<'_>) -> Result<L4, Error> {
    TCP::dissect(cursor).map(L4::Tcp)
}

#[derive(Default)]
struct TCPTemp {
    offset_byte: Option<u8>,
    flags: Option<u8>,
}

/// Structure representing the TCP Header and its payload.
///
/// `offset` is the header length in 32 bit words. Options are kept as raw words.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "tcp")]
pub struct TCP {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seq: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ack: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<FlagSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<u16>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "crate::types::hex::serialize_lower_hex_u16"
    )]
    pub checksum: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgent: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opts: Option<Vec<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<RawBytes>,
}

impl TCP {
    pub fn dissect(cursor: &mut Cursor<'_>) -> Result<Self, Error> {
        let mut d = Dissector::<TCP, TCPTemp>::new(cursor);
        d.scalar(|p| &mut p.src_port)?
            .scalar(|p| &mut p.dest_port)?
            .scalar(|p| &mut p.seq)?
            .scalar(|p| &mut p.ack)?
            .temp(|t| &mut t.offset_byte)?
            .bits(|t| t.offset_byte, BitRange::new(7, 4), |p| &mut p.offset)
            .temp(|t| &mut t.flags)?
            .flags(|t| t.flags, TCP_FLAGS, |p| &mut p.flags)
            .scalar(|p| &mut p.window)?
            .scalar(|p| &mut p.checksum)?
            .scalar(|p| &mut p.urgent)?;

        let option_words = d
            .packet()
            .offset
            .map_or(0, |offset| usize::from(offset).saturating_sub(TCP_BASE_HEADER_WORDS));
        d.times(|p| &mut p.opts, option_words, |c| c.u32())?
            .remainder(|p| &mut p.data);

        Ok(d.finish())
    }
}

impl Layer for TCP {
    fn name(&self) -> &'static str {
        "TCP"
    }

    fn short_name(&self) -> &'static str {
        "tcp"
    }
}
