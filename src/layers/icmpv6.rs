//! ICMPv6 Layer
//!
//! The message body is decoded by the dissector registered for the message type in
//! [`get_messages_map`]. Types without one keep their body as raw bytes.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::Serialize;

use crate::cursor::Cursor;
use crate::dissector::{BitRange, Dissector, FlagTable};
use crate::errors::Error;
use crate::layers::{ipv6, L4};
use crate::types::{CodeTables, FlagSet, IPv6Address, Label, NameTable, RawBytes};
use crate::Layer;

pub const ICMPV6_DEST_UNREACHABLE: u8 = 1;
pub const ICMPV6_PACKET_TOO_BIG: u8 = 2;
pub const ICMPV6_TIME_EXCEEDED: u8 = 3;
pub const ICMPV6_PARAMETER_PROBLEM: u8 = 4;
pub const ICMPV6_ECHO_REQUEST: u8 = 128;
pub const ICMPV6_ECHO_REPLY: u8 = 129;
pub const ICMPV6_NEIGHBOR_SOLICITATION: u8 = 135;
pub const ICMPV6_NEIGHBOR_ADVERTISEMENT: u8 = 136;

pub static ICMPV6_MESSAGE_TYPES: &NameTable<u8> = &[
    (0, "Reserved 0"),
    (1, "Destination Unreachable"),
    (2, "Packet Too Big"),
    (3, "Time Exceeded"),
    (4, "Parameter Problem"),
    (100, "Private experimentation"),
    (101, "Private experimentation"),
    (127, "Reserved for expansion of ICMPv6 error messages"),
    (128, "Echo Request"),
    (129, "Echo Reply"),
    (130, "Multicast Listener Query"),
    (131, "Multicast Listener Report"),
    (132, "Multicast Listener Done"),
    (133, "Router Solicitation"),
    (134, "Router Advertisement"),
    (135, "Neighbor Solicitation"),
    (136, "Neighbor Advertisement"),
    (137, "Redirect Message"),
    (138, "Router Renumbering"),
    (139, "ICMP Node Information Query"),
    (140, "ICMP Node Information Response"),
    (141, "Inverse Neighbor Discovery Solicitation Message"),
    (142, "Inverse Neighbor Discovery Advertisement Message"),
    (143, "Version 2 Multicast Listener Report"),
    (144, "Home Agent Address Discovery Request Message"),
    (145, "Home Agent Address Discovery Reply Message"),
    (146, "Mobile Prefix Solicitation"),
    (147, "Mobile Prefix Advertisement"),
    (148, "Certification Path Solicitation Message"),
    (149, "Certification Path Advertisement Message"),
    (
        150,
        "ICMP messages utilized by experimental mobility protocols such as Seamoby",
    ),
    (151, "Multicast Router Advertisement"),
    (152, "Multicast Router Solicitation"),
    (153, "Multicast Router Termination"),
    (154, "FMIPv6 Messages"),
    (155, "RPL Control Message"),
    (156, "ILNPv6 Locator Update Message"),
    (157, "Duplicate Address Request"),
    (158, "Duplicate Address Confirmation"),
    (159, "MPL Control Message"),
    (160, "Extended Echo Request"),
    (161, "Extended Echo Reply"),
    (200, "Private experimentation"),
    (201, "Private experimentation"),
    (255, "Reserved for expansion of ICMPv6 informational messages"),
];

static DEST_UNREACHABLE_CODES: &NameTable<u8> = &[
    (0, "no route to destination"),
    (1, "communication with destination administratively prohibited"),
    (2, "beyond scope of source address"),
    (3, "address unreachable"),
    (4, "port unreachable"),
    (5, "source address failed ingress/egress policy"),
    (6, "reject route to destination"),
    (7, "Error in Source Routing Header"),
    (8, "Headers too long"),
    (9, "Error in P-Route"),
];

static TIME_EXCEEDED_CODES: &NameTable<u8> = &[
    (0, "hop limit exceeded in transit"),
    (1, "fragment reassembly time exceeded"),
];

static PARAMETER_PROBLEM_CODES: &NameTable<u8> = &[
    (0, "erroneous header field encountered"),
    (1, "unrecognized Next Header type encountered"),
    (2, "unrecognized IPv6 option encountered"),
    (3, "IPv6 First Fragment has incomplete IPv6 Header Chain"),
    (4, "SR Upper-layer Header Error"),
    (5, "Unrecognized Next Header type encountered by intermediate node"),
    (6, "Extension header too big"),
    (7, "Extension header chain too long"),
    (8, "Too many extension headers"),
    (9, "Too many options in extension header"),
    (10, "Option too big"),
];

static ROUTER_RENUMBERING_CODES: &NameTable<u8> = &[
    (0, "Router Renumbering Command"),
    (1, "Router Renumbering Result"),
    (255, "Sequence Number Reset"),
];

static NODE_INFORMATION_QUERY_CODES: &NameTable<u8> = &[
    (
        0,
        "The Data field contains an IPv6 address which is the Subject of this Query.",
    ),
    (
        1,
        "The Data field contains a name which is the Subject of this Query, or is empty, as in the case of a NOOP.",
    ),
    (
        2,
        "The Data field contains an IPv4 address which is the Subject of this Query.",
    ),
];

static NODE_INFORMATION_RESPONSE_CODES: &NameTable<u8> = &[
    (
        0,
        "A successful reply. The Reply Data field may or may not be empty.",
    ),
    (
        1,
        "The Responder refuses to supply the answer. The Reply Data field will be empty.",
    ),
    (
        2,
        "The Qtype of the Query is unknown to the Responder. The Reply Data field will be empty.",
    ),
];

static DUPLICATE_ADDRESS_REQUEST_CODES: &NameTable<u8> = &[
    (0, "DAR message"),
    (1, "EDAR message with 64-bit ROVR field"),
    (2, "EDAR message with 128-bit ROVR field"),
    (3, "EDAR message with 192-bit ROVR field"),
    (4, "EDAR message with 256-bit ROVR field"),
];

static DUPLICATE_ADDRESS_CONFIRMATION_CODES: &NameTable<u8> = &[
    (0, "DAC message"),
    (1, "EDAC message with 64-bit ROVR field"),
    (2, "EDAC message with 128-bit ROVR field"),
    (3, "EDAC message with 192-bit ROVR field"),
    (4, "EDAC message with 256-bit ROVR field"),
];

static EXTENDED_ECHO_REQUEST_CODES: &NameTable<u8> = &[(0, "No Error")];

static EXTENDED_ECHO_REPLY_CODES: &NameTable<u8> = &[
    (0, "No Error"),
    (1, "Malformed Query"),
    (2, "No Such Interface"),
    (3, "No Such Table Entry"),
    (4, "Multiple Interfaces Satisfy Query"),
];

/// Code names by message type.
pub static ICMPV6_CODES: &CodeTables<u8, u8> = &[
    (1, DEST_UNREACHABLE_CODES),
    (3, TIME_EXCEEDED_CODES),
    (4, PARAMETER_PROBLEM_CODES),
    (138, ROUTER_RENUMBERING_CODES),
    (139, NODE_INFORMATION_QUERY_CODES),
    (140, NODE_INFORMATION_RESPONSE_CODES),
    (157, DUPLICATE_ADDRESS_REQUEST_CODES),
    (158, DUPLICATE_ADDRESS_CONFIRMATION_CODES),
    (160, EXTENDED_ECHO_REQUEST_CODES),
    (161, EXTENDED_ECHO_REPLY_CODES),
];

/// Neighbor Discovery option types.
pub static ND_OPTIONS: &NameTable<u8> = &[
    (1, "Source Link-layer Address"),
    (2, "Target Link-layer Address"),
    (3, "Prefix Information"),
    (4, "Redirected Header"),
    (5, "MTU"),
    (6, "NBMA Shortcut Limit Option"),
    (7, "Advertisement Interval Option"),
    (8, "Home Agent Information Option"),
    (9, "Source Address List"),
    (10, "Target Address List"),
    (11, "CGA option"),
    (12, "RSA Signature option"),
    (13, "Timestamp option"),
    (14, "Nonce option"),
    (15, "Trust Anchor option"),
    (16, "Certificate option"),
    (17, "IP Address/Prefix Option"),
    (18, "New Router Prefix Information Option"),
    (19, "Link-layer Address Option"),
    (20, "Neighbor Advertisement Acknowledgment Option"),
    (21, "PvD ID Router Advertisement Option"),
    (23, "MAP Option"),
    (24, "Route Information Option"),
    (25, "Recursive DNS Server Option"),
    (26, "RA Flags Extension Option"),
    (27, "Handover Key Request Option"),
    (28, "Handover Key Reply Option"),
    (29, "Handover Assist Information Option"),
    (30, "Mobile Node Identifier Option"),
    (31, "DNS Search List Option"),
    (32, "Proxy Signature (PS)"),
    (33, "Address Registration Option"),
    (34, "6LoWPAN Context Option"),
    (35, "Authoritative Border Router Option"),
    (36, "6LoWPAN Capability Indication Option (6CIO)"),
    (37, "DHCP Captive-Portal"),
    (38, "PREF64 option"),
    (39, "Crypto-ID Parameters Option (CIPO)"),
    (40, "NDP Signature Option (NDPSO)"),
    (41, "Resource Directory Address Option"),
    (42, "Consistent Uptime Option"),
    (138, "CARD Request option"),
    (139, "CARD Reply option"),
    (144, "Encrypted DNS Option"),
    (253, "RFC3692-style Experiment 1"),
    (254, "RFC3692-style Experiment 2"),
];

/// Router, Solicited and Override flags of a neighbor advertisement.
pub static NA_FLAGS: &FlagTable = &[("R", 15), ("S", 14), ("O", 13)];

/// Dissector for the body of an ICMPv6 message.
pub type MessageDissectFn = fn(&mut Cursor<'_>) -> Result<Icmpv6Message, Error>;

pub fn get_messages_map() -> &'static HashMap<u8, MessageDissectFn> {
    /// A Map maintaining message type -> dissectors of the message body.
    static MESSAGES_MAP: OnceLock<HashMap<u8, MessageDissectFn>> = OnceLock::new();
    MESSAGES_MAP.get_or_init(|| {
        let mut map: HashMap<u8, MessageDissectFn> = HashMap::new();
        map.insert(ICMPV6_DEST_UNREACHABLE, IPv6WithLength::dissect_message);
        map.insert(ICMPV6_PACKET_TOO_BIG, MtuAndIPv6::dissect_message);
        map.insert(ICMPV6_TIME_EXCEEDED, IPv6WithLength::dissect_message);
        map.insert(ICMPV6_PARAMETER_PROBLEM, PointerAndIPv6::dissect_message);
        map.insert(ICMPV6_ECHO_REQUEST, Echo::dissect_message);
        map.insert(ICMPV6_ECHO_REPLY, Echo::dissect_message);
        map.insert(
            ICMPV6_NEIGHBOR_SOLICITATION,
            NeighborSolicitation::dissect_message,
        );
        map.insert(
            ICMPV6_NEIGHBOR_ADVERTISEMENT,
            NeighborAdvertisement::dissect_message,
        );
        map
    })
}

fn dissect_message(
    cursor: &mut Cursor<'_>,
    message_type: Option<u8>,
) -> Result<Icmpv6Message, Error> {
    match message_type.and_then(|message_type| get_messages_map().get(&message_type)) {
        Some(dissect) => dissect(cursor),
        None => {
            log_debug!("no dissector for ICMPv6 message type {:?}", message_type);
            Ok(Icmpv6Message::Raw(cursor.unused().into()))
        }
    }
}

fn dissect_quoted(cursor: &mut Cursor<'_>) -> Result<Box<ipv6::IPv6>, Error> {
    ipv6::dissect_truncated(cursor).map(Box::new)
}

pub(crate) fn dissect_l4(cursor: &mut Cursor<'_>) -> Result<L4, Error> {
    ICMPv6::dissect(cursor).map(L4::Icmpv6)
}

/// Body of an ICMPv6 message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Icmpv6Message {
    /// Destination unreachable and time exceeded.
    WithLength(IPv6WithLength),
    TooBig(MtuAndIPv6),
    ParameterProblem(PointerAndIPv6),
    Echo(Echo),
    NeighborSolicitation(NeighborSolicitation),
    NeighborAdvertisement(NeighborAdvertisement),
    Raw(RawBytes),
}

impl Icmpv6Message {
    /// The packet quoted by an error message.
    pub fn quoted(&self) -> Option<&ipv6::IPv6> {
        match self {
            Icmpv6Message::WithLength(m) => m.ipv6.as_deref(),
            Icmpv6Message::TooBig(m) => m.ipv6.as_deref(),
            Icmpv6Message::ParameterProblem(m) => m.ipv6.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct IPv6WithLength {
    /// Length of the quoted packet in 64 bit words.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_length: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<Box<ipv6::IPv6>>,
}

impl IPv6WithLength {
    fn dissect_message(cursor: &mut Cursor<'_>) -> Result<Icmpv6Message, Error> {
        let mut d = Dissector::<IPv6WithLength>::new(cursor);
        d.scalar(|p| &mut p.original_length)?
            .skip(3)?
            .nested(|p| &mut p.ipv6, dissect_quoted)?;
        Ok(Icmpv6Message::WithLength(d.finish()))
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct MtuAndIPv6 {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<Box<ipv6::IPv6>>,
}

impl MtuAndIPv6 {
    fn dissect_message(cursor: &mut Cursor<'_>) -> Result<Icmpv6Message, Error> {
        let mut d = Dissector::<MtuAndIPv6>::new(cursor);
        d.skip(4)?
            .scalar(|p| &mut p.mtu)?
            .nested(|p| &mut p.ipv6, dissect_quoted)?;
        Ok(Icmpv6Message::TooBig(d.finish()))
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct PointerAndIPv6 {
    /// Offset of the offending byte in the quoted packet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pointer: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<Box<ipv6::IPv6>>,
}

impl PointerAndIPv6 {
    fn dissect_message(cursor: &mut Cursor<'_>) -> Result<Icmpv6Message, Error> {
        let mut d = Dissector::<PointerAndIPv6>::new(cursor);
        d.scalar(|p| &mut p.pointer)?
            .nested(|p| &mut p.ipv6, dissect_quoted)?;
        Ok(Icmpv6Message::ParameterProblem(d.finish()))
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "echo")]
pub struct Echo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seq: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<RawBytes>,
}

impl Echo {
    fn dissect_message(cursor: &mut Cursor<'_>) -> Result<Icmpv6Message, Error> {
        let mut d = Dissector::<Echo>::new(cursor);
        d.scalar(|p| &mut p.id)?
            .scalar(|p| &mut p.seq)?
            .remainder(|p| &mut p.data);
        Ok(Icmpv6Message::Echo(d.finish()))
    }
}

/// Neighbor Discovery option. `length` is in bytes and counts the two byte option header.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct NdOption {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub option_type: Option<Label<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<RawBytes>,
}

impl NdOption {
    pub fn dissect(cursor: &mut Cursor<'_>) -> Result<Self, Error> {
        let mut d = Dissector::<NdOption>::new(cursor);
        d.scalar_with(|p| &mut p.option_type, |v: u8| Label::lookup(ND_OPTIONS, v))?
            .scalar_with(|p| &mut p.length, |units: u8| u16::from(units) * 8)?;

        let data_len = d
            .packet()
            .length
            .map_or(0, |length| usize::from(length).saturating_sub(2));
        d.bytes(|p| &mut p.data, data_len)?;
        Ok(d.finish())
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "NeighborSolicitation")]
pub struct NeighborSolicitation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<IPv6Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<NdOption>>,
}

impl NeighborSolicitation {
    fn dissect_message(cursor: &mut Cursor<'_>) -> Result<Icmpv6Message, Error> {
        let mut d = Dissector::<NeighborSolicitation>::new(cursor);
        d.skip(4)?
            .bytes_try(|p| &mut p.target, 16, IPv6Address::try_from)?
            .repeat_while(
                |p| &mut p.options,
                |c, _| c.remaining() > 0,
                |c, _| {
                    let option = NdOption::dissect(c)?;
                    Ok(Some(option).filter(|_| !c.is_truncated()))
                },
            )?;
        Ok(Icmpv6Message::NeighborSolicitation(d.finish()))
    }
}

#[derive(Default)]
struct NeighborAdvertisementTemp {
    reserved: Option<u16>,
}

/// Neighbor advertisement: a two byte flag word, then the target address.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "NeighborAdvertisement")]
pub struct NeighborAdvertisement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<FlagSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<IPv6Address>,
}

impl NeighborAdvertisement {
    fn dissect_message(cursor: &mut Cursor<'_>) -> Result<Icmpv6Message, Error> {
        let mut d = Dissector::<NeighborAdvertisement, NeighborAdvertisementTemp>::new(cursor);
        d.temp(|t| &mut t.reserved)?
            .flags(|t| t.reserved, NA_FLAGS, |p| &mut p.flags)
            .bytes_try(|p| &mut p.target, 16, IPv6Address::try_from)?;
        Ok(Icmpv6Message::NeighborAdvertisement(d.finish()))
    }
}

#[derive(Default)]
struct ICMPv6Temp {
    message_type: Option<u8>,
}

/// Structure representing an ICMPv6 message (RFC 4443).
///
/// `error` is set when the top bit of the type byte is clear, which is how RFC 4443 splits
/// error and informational types. The private experimentation types 100 and 101 are
/// informational yet come out as errors.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ipv6_icmp")]
pub struct ICMPv6 {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_type: Option<Label<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<Label<u8>>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "crate::types::hex::serialize_lower_hex_u16"
    )]
    pub checksum: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Icmpv6Message>,
}

impl ICMPv6 {
    pub fn dissect(cursor: &mut Cursor<'_>) -> Result<Self, Error> {
        let mut d = Dissector::<ICMPv6, ICMPv6Temp>::new(cursor);
        d.temp(|t| &mut t.message_type)?
            .bits_with(
                |t| t.message_type,
                BitRange::new(7, 0),
                |p| &mut p.message_type,
                |v| Label::lookup(ICMPV6_MESSAGE_TYPES, v as u8),
            )
            .bits_with(
                |t| t.message_type,
                BitRange::bit(7),
                |p| &mut p.error,
                |bit| bit == 0,
            );

        let message_type = d.scratch().message_type;
        if let Some(message_type) = message_type {
            d.scalar_with(|p| &mut p.code, |code: u8| {
                Label::lookup_keyed(ICMPV6_CODES, message_type, code)
            })?;
        }
        d.scalar(|p| &mut p.checksum)?
            .nested(|p| &mut p.data, |c| dissect_message(c, message_type))?;

        Ok(d.finish())
    }
}

impl Layer for ICMPv6 {
    fn name(&self) -> &'static str {
        "ICMPv6"
    }

    fn short_name(&self) -> &'static str {
        "icmp6"
    }

    fn next_layer(&self) -> Option<&dyn Layer> {
        self.data
            .as_ref()
            .and_then(Icmpv6Message::quoted)
            .map(|ipv6| ipv6 as &dyn Layer)
    }
}
