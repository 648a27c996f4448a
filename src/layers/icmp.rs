//! ICMP Layer
//!
//! The body of an ICMP message depends on its type. Error messages (destination unreachable,
//! source quench, redirect, time exceeded, parameter problem) quote the start of the datagram
//! that caused them, which is decoded as an IPv4 packet that may be cut short.

use chrono::NaiveTime;
use serde::Serialize;

use crate::cursor::Cursor;
use crate::dissector::Dissector;
use crate::errors::Error;
use crate::layers::{ipv4, L4};
use crate::types::{CodeTables, IPv4Address, Label, NameTable, RawBytes};
use crate::Layer;

pub const ICMP_ECHO_REPLY: u8 = 0;
pub const ICMP_DEST_UNREACHABLE: u8 = 3;
pub const ICMP_SOURCE_QUENCH: u8 = 4;
pub const ICMP_REDIRECT: u8 = 5;
pub const ICMP_ECHO: u8 = 8;
pub const ICMP_TIME_EXCEEDED: u8 = 11;
pub const ICMP_PARAMETER_PROBLEM: u8 = 12;
pub const ICMP_TIMESTAMP: u8 = 13;
pub const ICMP_TIMESTAMP_REPLY: u8 = 14;
pub const ICMP_ADDRESS_MASK_REQUEST: u8 = 17;
pub const ICMP_ADDRESS_MASK_REPLY: u8 = 18;

const MS_PER_DAY: u32 = 86_400_000;

pub static ICMP_TYPES: &NameTable<u8> = &[
    (0, "Echo Reply"),
    (1, "Unassigned"),
    (2, "Unassigned"),
    (3, "Destination Unreachable"),
    (4, "Source Quench"),
    (5, "Redirect"),
    (6, "Alternate Host Address"),
    (7, "Unassigned"),
    (8, "Echo"),
    (9, "Router Advertisement"),
    (10, "Router Solicitation"),
    (11, "Time Exceeded"),
    (12, "Parameter Problem"),
    (13, "Timestamp"),
    (14, "Timestamp Reply"),
    (15, "Information Request"),
    (16, "Information Reply"),
    (17, "Address Mask Request"),
    (18, "Address Mask Reply"),
    (19, "Reserved (for Security)"),
    (30, "Traceroute"),
    (31, "Datagram Conversion Error"),
    (32, "Mobile Host Redirect"),
    (33, "IPv6 Where-Are-You"),
    (34, "IPv6 I-Am-Here"),
    (35, "Mobile Registration Request"),
    (36, "Mobile Registration Reply"),
    (37, "Domain Name Request"),
    (38, "Domain Name Reply"),
    (39, "SKIP"),
    (40, "Photuris"),
    (41, "Seamoby"),
    (42, "Extended Echo Request"),
    (43, "Extended Echo Reply"),
    (253, "RFC3692-style Experiment 1"),
    (254, "RFC3692-style Experiment 2"),
    (255, "Reserved 255"),
];

static DEST_UNREACHABLE_CODES: &NameTable<u8> = &[
    (0, "Net Unreachable"),
    (1, "Host Unreachable"),
    (2, "Protocol Unreachable"),
    (3, "Port Unreachable"),
    (4, "Fragmentation Needed and Don't Fragment was Set"),
    (5, "Source Route Failed"),
    (6, "Destination Network Unknown"),
    (7, "Destination Host Unknown"),
    (8, "Source Host Isolated"),
    (
        9,
        "Communication with Destination Network is Administratively Prohibited",
    ),
    (
        10,
        "Communication with Destination Host is Administratively Prohibited",
    ),
    (11, "Destination Network Unreachable for Type of Service"),
    (12, "Destination Host Unreachable for Type of Service"),
    (13, "Communication Administratively Prohibited"),
    (14, "Host Precedence Violation"),
    (15, "Precedence cutoff in effect"),
];

static REDIRECT_CODES: &NameTable<u8> = &[
    (0, "Redirect Datagram for the Network (or subnet)"),
    (1, "Redirect Datagram for the Host"),
    (2, "Redirect Datagram for the Type of Service and Network"),
    (3, "Redirect Datagram for the Type of Service and Host"),
];

static ALTERNATE_ADDRESS_CODES: &NameTable<u8> = &[(0, "Alternate Address for Host")];

static ROUTER_ADVERTISEMENT_CODES: &NameTable<u8> = &[
    (0, "Normal router advertisement"),
    (16, "Does not route common traffic"),
];

static TIME_EXCEEDED_CODES: &NameTable<u8> = &[
    (0, "Time to Live exceeded in Transit"),
    (1, "Fragment Reassembly Time Exceeded"),
];

static PARAMETER_PROBLEM_CODES: &NameTable<u8> = &[
    (0, "Pointer indicates the error"),
    (1, "Missing a Required Option"),
    (2, "Bad Length"),
];

static PHOTURIS_CODES: &NameTable<u8> = &[
    (0, "Bad SPI"),
    (1, "Authentication Failed"),
    (2, "Decompression Failed"),
    (3, "Decryption Failed"),
    (4, "Need Authentication"),
    (5, "Need Authorization"),
];

static EXTENDED_ECHO_REPLY_CODES: &NameTable<u8> = &[
    (0, "No Error"),
    (1, "Malformed Query"),
    (2, "No Such Interface"),
    (3, "No Such Table Entry"),
    (4, "Multiple Interfaces Satisfy Query"),
];

/// Code names by ICMP type.
pub static ICMP_CODES: &CodeTables<u8, u8> = &[
    (3, DEST_UNREACHABLE_CODES),
    (5, REDIRECT_CODES),
    (6, ALTERNATE_ADDRESS_CODES),
    (9, ROUTER_ADVERTISEMENT_CODES),
    (11, TIME_EXCEEDED_CODES),
    (12, PARAMETER_PROBLEM_CODES),
    (40, PHOTURIS_CODES),
    (43, EXTENDED_ECHO_REPLY_CODES),
];

pub(crate) fn dissect_l4(cursor: &mut Cursor<'_>) -> Result<L4, Error> {
    ICMP::dissect(cursor).map(L4::Icmp)
}

/// Time of day from milliseconds since midnight UT, wrapping at a full day.
fn time_of_day(ms: u32) -> NaiveTime {
    let ms = ms % MS_PER_DAY;
    NaiveTime::from_num_seconds_from_midnight_opt(ms / 1000, (ms % 1000) * 1_000_000)
        .unwrap_or_default()
}

#[derive(Default)]
struct ICMPTemp {
    itype: Option<u8>,
}

/// Structure representing an ICMP message (RFC 792).
///
/// Only the fields of the message's type are present. `original_length` is in bytes for
/// destination unreachable and echo reply, and in 32 bit words otherwise.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "icmp")]
pub struct ICMP {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub itype: Option<Label<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<Label<u8>>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "crate::types::hex::serialize_lower_hex_u16"
    )]
    pub checksum: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_length: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_hop_mtu: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pointer: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<IPv4Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seq: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub originate: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receive: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transmit: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask: Option<IPv4Address>,
    /// The datagram quoted by an error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<Box<ipv4::IPv4>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<RawBytes>,
}

fn dissect_quoted(cursor: &mut Cursor<'_>) -> Result<Box<ipv4::IPv4>, Error> {
    ipv4::dissect_truncated(cursor).map(Box::new)
}

impl ICMP {
    pub fn dissect(cursor: &mut Cursor<'_>) -> Result<Self, Error> {
        let mut d = Dissector::<ICMP, ICMPTemp>::new(cursor);
        d.temp(|t| &mut t.itype)?;

        let Some(itype) = d.scratch().itype else {
            return Ok(d.finish());
        };
        d.constant(|p| &mut p.itype, Label::lookup(ICMP_TYPES, itype))
            .scalar_with(|p| &mut p.code, |code: u8| {
                Label::lookup_keyed(ICMP_CODES, itype, code)
            })?
            .scalar(|p| &mut p.checksum)?;

        match itype {
            ICMP_ECHO_REPLY | ICMP_DEST_UNREACHABLE => {
                d.skip(1)?
                    .scalar_with(|p| &mut p.original_length, |words: u8| u16::from(words) * 4)?
                    .scalar(|p| &mut p.next_hop_mtu)?
                    .nested(|p| &mut p.ipv4, dissect_quoted)?;
            }
            ICMP_SOURCE_QUENCH => {
                d.skip(4)?.nested(|p| &mut p.ipv4, dissect_quoted)?;
            }
            ICMP_REDIRECT => {
                d.bytes_try(|p| &mut p.redirect_to, 4, IPv4Address::try_from)?
                    .nested(|p| &mut p.ipv4, dissect_quoted)?;
            }
            ICMP_ECHO => {
                d.scalar(|p| &mut p.id)?.scalar(|p| &mut p.seq)?;
            }
            ICMP_TIME_EXCEEDED => {
                d.skip(1)?
                    .scalar_with(|p| &mut p.original_length, |words: u8| u16::from(words))?
                    .skip(2)?
                    .nested(|p| &mut p.ipv4, dissect_quoted)?;
            }
            ICMP_PARAMETER_PROBLEM => {
                d.scalar(|p| &mut p.pointer)?
                    .scalar_with(|p| &mut p.original_length, |words: u8| u16::from(words))?
                    .skip(2)?
                    .nested(|p| &mut p.ipv4, dissect_quoted)?;
            }
            ICMP_TIMESTAMP | ICMP_TIMESTAMP_REPLY => {
                d.scalar(|p| &mut p.id)?
                    .scalar(|p| &mut p.seq)?
                    .scalar_with(|p| &mut p.originate, time_of_day)?
                    .scalar_with(|p| &mut p.receive, time_of_day)?
                    .scalar_with(|p| &mut p.transmit, time_of_day)?;
            }
            ICMP_ADDRESS_MASK_REQUEST | ICMP_ADDRESS_MASK_REPLY => {
                d.scalar(|p| &mut p.id)?
                    .scalar(|p| &mut p.seq)?
                    .bytes_try(|p| &mut p.mask, 4, IPv4Address::try_from)?;
            }
            _ => {
                log_debug!("no body dissector for ICMP type {}", itype);
            }
        }

        if d.remaining() > 0 {
            d.remainder(|p| &mut p.data);
        }
        Ok(d.finish())
    }
}

impl Layer for ICMP {
    fn name(&self) -> &'static str {
        "ICMP"
    }

    fn short_name(&self) -> &'static str {
        "icmp"
    }

    fn next_layer(&self) -> Option<&dyn Layer> {
        self.ipv4.as_deref().map(|ipv4| ipv4 as &dyn Layer)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::packet::Packet;
    use crate::types::ENCAP_TYPE_RAW;

    /// Outer IPv4 header from 192.168.1.5 to 192.168.1.100, protocol ICMP.
    const OUTER: &str = "45000038a2220000400121 7ec0a80105c0a80164";

    fn dissect_raw(icmp: &str) -> (Packet, ICMP) {
        let array = hex::decode(format!("{}{}", OUTER, icmp).replace(' ', ""));
        assert!(array.is_ok());
        let array = array.unwrap();

        let p = Packet::from_bytes(&array, ENCAP_TYPE_RAW);
        assert!(p.is_ok(), "{:?}", p.err());
        let p = p.unwrap();
        let icmp = match &p {
            Packet::IPv4(ip) => match &ip.data {
                Some(L4::Icmp(icmp)) => icmp.clone(),
                other => panic!("expected ICMP, got {:?}", other),
            },
            other => panic!("expected IPv4, got {:?}", other),
        };
        (p, icmp)
    }

    wasm_tests! {
        #[test]
        fn destination_unreachable() {
            let (p, icmp) = dissect_raw(
                "0303fd1500000000\
                 4500002800004000ff11225ec0a80164c0a80105\
                 007b0035001470e1",
            );

            assert_eq!(icmp.data, None);
            let names: Vec<_> = p.layers().iter().map(|l| l.short_name()).collect();
            assert_eq!(names, ["ip", "icmp", "ip", "udp"]);

            let value = serde_json::to_value(&p).unwrap();
            assert_eq!(
                value,
                json!({
                    "type": "ipv4",
                    "version": 4,
                    "ihl": 5,
                    "dscp": 0,
                    "ecn": 0,
                    "length": 56,
                    "id": 41506,
                    "flags": [],
                    "frag_offset": 0,
                    "ttl": 64,
                    "protocol": "icmp",
                    "checksum": "0x217e",
                    "src": "192.168.1.5",
                    "dest": "192.168.1.100",
                    "opts": [],
                    "data": {
                        "type": "icmp",
                        "itype": "Destination Unreachable",
                        "code": "Port Unreachable",
                        "checksum": "0xfd15",
                        "original_length": 0,
                        "next_hop_mtu": 0,
                        "ipv4": {
                            "type": "ipv4",
                            "version": 4,
                            "ihl": 5,
                            "dscp": 0,
                            "ecn": 0,
                            "length": 40,
                            "id": 0,
                            "flags": ["DF"],
                            "frag_offset": 0,
                            "ttl": 255,
                            "protocol": "udp",
                            "checksum": "0x225e",
                            "src": "192.168.1.100",
                            "dest": "192.168.1.5",
                            "opts": [],
                            "data": {
                                "type": "udp",
                                "src_port": 123,
                                "dest_port": 53,
                                "length": 20,
                                "checksum": "0x70e1",
                            },
                        },
                    },
                })
            );
        }

        #[test]
        fn quoted_header_cut_short() {
            let (_, icmp) = dissect_raw("0301fd1500020000 4500002800004000");

            assert_eq!(icmp.code, Some(Label::Name("Host Unreachable")));
            assert_eq!(icmp.original_length, Some(8));
            let inner = icmp.ipv4.unwrap();
            assert_eq!(inner.version, Some(4));
            assert_eq!(inner.length, Some(40));
            assert_eq!(inner.ttl, None);
            assert_eq!(inner.src, None);

            let value = serde_json::to_value(&inner).unwrap();
            assert_eq!(value.get("type"), Some(&json!("ipv4")));
            assert_eq!(value.get("ttl"), None);
        }

        #[test]
        fn source_quench() {
            let (_, icmp) = dissect_raw(
                "0400fd1500000000\
                 4500002800004000ff11225ec0a80164c0a80105\
                 007b0035001470e1",
            );
            assert_eq!(icmp.itype, Some(Label::Name("Source Quench")));
            assert_eq!(icmp.code, Some(Label::Code(0)));
            assert_eq!(icmp.ipv4.and_then(|ip| ip.protocol), Some(Label::Name("udp")));
        }

        #[test]
        fn redirect() {
            let (_, icmp) = dissect_raw(
                "0501fd15c0a801fe\
                 4500002800004000ff06225ec0a801640a000001\
                 007b0035001470e1",
            );
            assert_eq!(icmp.itype, Some(Label::Name("Redirect")));
            assert_eq!(icmp.code, Some(Label::Name("Redirect Datagram for the Host")));
            assert_eq!(
                icmp.redirect_to.map(|a| a.to_string()).as_deref(),
                Some("192.168.1.254")
            );

            // The quoted TCP header is only 8 bytes long.
            let tcp = match icmp.ipv4.and_then(|ip| ip.data) {
                Some(L4::Tcp(tcp)) => tcp,
                other => panic!("expected TCP, got {:?}", other),
            };
            assert_eq!(tcp.src_port, Some(123));
            assert_eq!(tcp.seq, Some(0x0014_70e1));
            assert_eq!(tcp.ack, None);
            assert_eq!(tcp.data, None);
        }

        #[test]
        fn time_exceeded_and_parameter_problem() {
            let quoted = "4500002800004000010622 5ec0a801640a000001007b0035001470e1";

            let (_, icmp) = dissect_raw(&format!("0b00fd1500050000{}", quoted));
            assert_eq!(icmp.itype, Some(Label::Name("Time Exceeded")));
            assert_eq!(icmp.code, Some(Label::Name("Time to Live exceeded in Transit")));
            assert_eq!(icmp.original_length, Some(5));
            assert_eq!(icmp.ipv4.and_then(|ip| ip.ttl), Some(1));

            let (_, icmp) = dissect_raw(&format!("0c00fd1508000000{}", quoted));
            assert_eq!(icmp.itype, Some(Label::Name("Parameter Problem")));
            assert_eq!(icmp.pointer, Some(8));
            assert_eq!(icmp.original_length, Some(0));
            assert!(icmp.ipv4.is_some());
        }

        #[test]
        fn echo_with_payload() {
            let (_, icmp) = dissect_raw("0800fd15000100056162636465");
            assert_eq!(icmp.itype, Some(Label::Name("Echo")));
            assert_eq!(icmp.id, Some(1));
            assert_eq!(icmp.seq, Some(5));
            assert_eq!(icmp.data, Some(RawBytes::from(&b"abcde"[..])));
            assert_eq!(icmp.ipv4, None);
        }

        #[test]
        fn timestamps() {
            let (_, icmp) = dissect_raw("0e00fd1500010005041945480419454904194550");
            assert_eq!(icmp.itype, Some(Label::Name("Timestamp Reply")));
            assert_eq!(icmp.originate, NaiveTime::from_hms_opt(19, 6, 5));
            assert_eq!(icmp.receive, NaiveTime::from_hms_milli_opt(19, 6, 5, 1));
            assert_eq!(icmp.transmit, NaiveTime::from_hms_milli_opt(19, 6, 5, 8));
            assert_eq!(icmp.data, None);

            let value = serde_json::to_value(&icmp).unwrap();
            assert_eq!(value.get("originate"), Some(&json!("19:06:05")));
            assert_eq!(value.get("transmit"), Some(&json!("19:06:05.008")));

            let (_, icmp) = dissect_raw("0d00fd150001000504196e1804196e1804196e18");
            assert_eq!(icmp.itype, Some(Label::Name("Timestamp")));
            assert_eq!(icmp.originate, NaiveTime::from_hms_milli_opt(19, 6, 15, 448));
        }

        #[test]
        fn timestamps_wrap_at_midnight() {
            assert_eq!(time_of_day(MS_PER_DAY), NaiveTime::from_hms_opt(0, 0, 0).unwrap());
            assert_eq!(
                time_of_day(MS_PER_DAY + 1_500),
                NaiveTime::from_hms_milli_opt(0, 0, 1, 500).unwrap()
            );
            assert_eq!(
                time_of_day(u32::MAX),
                NaiveTime::from_hms_milli_opt(17, 2, 47, 295).unwrap()
            );
        }

        #[test]
        fn address_mask() {
            let (_, icmp) = dissect_raw("1200fd1500010005ffffff00");
            assert_eq!(icmp.itype, Some(Label::Name("Address Mask Reply")));
            assert_eq!(icmp.mask.map(|a| a.to_string()).as_deref(), Some("255.255.255.0"));
            assert_eq!(icmp.data, None);
        }

        #[test]
        fn unknown_type_keeps_body() {
            let (_, icmp) = dissect_raw("fa07fd15aabb");
            assert_eq!(icmp.itype, Some(Label::Code(250)));
            assert_eq!(icmp.code, Some(Label::Code(7)));
            assert_eq!(icmp.data, Some(RawBytes::from(&[0xaa_u8, 0xbb][..])));
        }

        #[test]
        fn every_type_and_code_name() {
            let icmp = |itype: u8, code: u8| -> ICMP {
                let array = [itype, code, 0x00, 0x00];
                let mut cursor = Cursor::new(&array);
                cursor.allow_truncation();
                let icmp = ICMP::dissect(&mut cursor);
                assert!(icmp.is_ok(), "{}/{}: {:?}", itype, code, icmp.err());
                icmp.unwrap()
            };

            for &(itype, name) in ICMP_TYPES {
                assert_eq!(icmp(itype, 0).itype, Some(Label::Name(name)), "{}", itype);
            }
            for &(itype, codes) in ICMP_CODES {
                for &(code, name) in codes {
                    assert_eq!(icmp(itype, code).code, Some(Label::Name(name)), "{}/{}", itype, code);
                }
            }

            let unnamed = icmp(ICMP_DEST_UNREACHABLE, 200);
            assert_eq!(unnamed.itype, Some(Label::Name("Destination Unreachable")));
            assert_eq!(unnamed.code, Some(Label::Code(200)));
            // Echo has no code table.
            assert_eq!(icmp(ICMP_ECHO, 3).code, Some(Label::Code(3)));
        }
    }
}
