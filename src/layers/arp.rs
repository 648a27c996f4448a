//! ARP Datagram

use serde::Serialize;

use crate::cursor::Cursor;
use crate::dissector::Dissector;
use crate::errors::Error;
use crate::layers::L3;
use crate::types::{HardwareAddress, Label, NameTable, ProtocolAddress};
use crate::Layer;

pub const ARP_REQUEST: u16 = 1_u16;
pub const ARP_REPLY: u16 = 2_u16;

pub static ARP_OPCODES: &NameTable<u16> = &[
    (0, "Reserved 0"),
    (1, "REQUEST"),
    (2, "REPLY"),
    (3, "request Reverse"),
    (4, "reply Reverse"),
    (5, "DRARP-Request"),
    (6, "DRARP-Reply"),
    (7, "DRARP-Error"),
    (8, "InARP-Request"),
    (9, "InARP-Reply"),
    (10, "ARP-NAK"),
    (11, "MARS-Request"),
    (12, "MARS-Multi"),
    (13, "MARS-MServ"),
    (14, "MARS-Join"),
    (15, "MARS-Leave"),
    (16, "MARS-NAK"),
    (17, "MARS-Unserv"),
    (18, "MARS-SJoin"),
    (19, "MARS-SLeave"),
    (20, "MARS-Grouplist-Request"),
    (21, "MARS-Grouplist-Reply"),
    (22, "MARS-Redirect-Map"),
    (23, "MAPOS-UNARP"),
    (24, "OP_EXP1"),
    (25, "OP_EXP2"),
    (65535, "Reserved 65535"),
];

pub static ARP_HARDWARE: &NameTable<u16> = &[
    (0, "Reserved 0"),
    (1, "Ethernet (10Mb)"),
    (2, "Experimental Ethernet (3Mb)"),
    (3, "Amateur Radio AX.25"),
    (4, "Proteon ProNET Token Ring"),
    (5, "Chaos"),
    (6, "IEEE 802 Networks"),
    (7, "ARCNET"),
    (8, "Hyperchannel"),
    (9, "Lanstar"),
    (10, "Autonet Short Address"),
    (11, "LocalTalk"),
    (12, "LocalNet (IBM PCNet or SYTEK LocalNET)"),
    (13, "Ultra link"),
    (14, "SMDS"),
    (15, "Frame Relay"),
    (16, "Asynchronous Transmission Mode (ATM)"),
    (17, "HDLC"),
    (18, "Fibre Channel"),
    (19, "Asynchronous Transmission Mode (ATM)"),
    (20, "Serial Line"),
    (21, "Asynchronous Transmission Mode (ATM)"),
    (22, "MIL-STD-188-220"),
    (23, "Metricom"),
    (24, "IEEE 1394.1995"),
    (25, "MAPOS"),
    (26, "Twinaxial"),
    (27, "EUI-64"),
    (28, "HIPARP"),
    (29, "IP and ARP over ISO 7816-3"),
    (30, "ARPSec"),
    (31, "IPsec tunnel"),
    (32, "InfiniBand (TM)"),
    (33, "TIA-102 Project 25 Common Air Interface (CAI)"),
    (34, "Wiegand Interface"),
    (35, "Pure IP"),
    (36, "HW_EXP1"),
    (37, "HFI"),
    (38, "Unified Bus (UB)"),
    (256, "HW_EXP2"),
    (257, "AEthernet"),
    (65535, "Reserved 65535"),
];

pub(crate) fn dissect_l3(cursor: &mut Cursor<'_>) -> Result<L3, Error> {
    ARP::dissect(cursor).map(L3::Arp)
}

#[derive(Default)]
struct ARPTemp {
    hardware_len: Option<u8>,
    protocol_len: Option<u8>,
}

/// Structure representing an ARP packet (RFC 826).
///
/// Address lengths come from the packet itself. Protocol addresses of 4 and 16 bytes are shown
/// as IPv4 and IPv6 addresses.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "arp")]
pub struct ARP {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hardware: Option<Label<u16>>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "crate::types::hex::serialize_upper_hex_u16"
    )]
    pub protocol: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub op: Option<Label<u16>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_hardware: Option<HardwareAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_protocol: Option<ProtocolAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_hardware: Option<HardwareAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_protocol: Option<ProtocolAddress>,
}

impl ARP {
    pub fn dissect(cursor: &mut Cursor<'_>) -> Result<Self, Error> {
        let mut d = Dissector::<ARP, ARPTemp>::new(cursor);
        d.scalar_with(|p| &mut p.hardware, |v: u16| Label::lookup(ARP_HARDWARE, v))?
            .scalar(|p| &mut p.protocol)?
            .temp(|t| &mut t.hardware_len)?
            .temp(|t| &mut t.protocol_len)?
            .scalar_with(|p| &mut p.op, |v: u16| Label::lookup(ARP_OPCODES, v))?;

        let hardware_len = usize::from(d.scratch().hardware_len.unwrap_or_default());
        let protocol_len = usize::from(d.scratch().protocol_len.unwrap_or_default());
        d.bytes_with(|p| &mut p.sender_hardware, hardware_len, HardwareAddress::from)?
            .bytes_with(|p| &mut p.sender_protocol, protocol_len, ProtocolAddress::from)?
            .bytes_with(|p| &mut p.target_hardware, hardware_len, HardwareAddress::from)?
            .bytes_with(|p| &mut p.target_protocol, protocol_len, ProtocolAddress::from)?;

        Ok(d.finish())
    }
}

impl Layer for ARP {
    fn name(&self) -> &'static str {
        "ARP"
    }

    fn short_name(&self) -> &'static str {
        "arp"
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::layers::ethernet::Ethernet;
    use crate::packet::Packet;
    use crate::types::ENCAP_TYPE_ETH;

    wasm_tests! {
        #[test]
        fn parse_arp_simple() {
            let array = hex::decode("c402326b0000c4013258000008060001080006040001c401325800000a000001c402326b00000a000002000000000000000000000000000000000000");
            assert!(array.is_ok());
            let array = array.unwrap();

            let p = Packet::from_bytes(&array, ENCAP_TYPE_ETH);
            assert!(p.is_ok(), "{:?}", p.err());

            let p = p.unwrap();
            assert!(p.layers().len() == 2, "{:?}", p);

            let arp = serde_json::to_value(p.layers()[1]).unwrap();
            assert_eq!(arp.get("type"), Some(&json!("arp")));
            assert_eq!(arp.get("hardware"), Some(&json!("Ethernet (10Mb)")));
            assert_eq!(arp.get("protocol"), Some(&json!("0x0800")));
            assert_eq!(arp.get("op"), Some(&json!("REQUEST")));
            assert_eq!(arp.get("sender_hardware"), Some(&json!("C4:01:32:58:00:00")));
            assert_eq!(arp.get("sender_protocol"), Some(&json!("10.0.0.1")));
            assert_eq!(arp.get("target_protocol"), Some(&json!("10.0.0.2")));
        }

        #[test]
        fn parse_arp_unnamed_codes() {
            let array = hex::decode("ffffffffffff00070daff4540806fff008000604fff000070daff45418a6ac0100000000000018a6ad9f").unwrap();
            let mut cursor = Cursor::new(&array);
            let ethernet = Ethernet::dissect(&mut cursor);
            assert!(ethernet.is_ok(), "{:?}", ethernet.err());
            let ethernet = ethernet.unwrap();

            assert_eq!(ethernet.ether_type, Some(Label::Name("ARP")));
            assert_eq!(ethernet.tags, Some(vec![]));

            let arp = match ethernet.data {
                Some(L3::Arp(arp)) => arp,
                other => panic!("expected ARP, got {:?}", other),
            };
            assert_eq!(arp.hardware, Some(Label::Code(65520)));
            assert_eq!(arp.protocol, Some(0x0800));
            assert_eq!(arp.op, Some(Label::Code(65520)));
            assert_eq!(
                arp.sender_hardware.as_ref().map(|a| a.to_string()).as_deref(),
                Some("00:07:0D:AF:F4:54")
            );
            assert_eq!(
                arp.sender_protocol.as_ref().map(|a| a.to_string()).as_deref(),
                Some("24.166.172.1")
            );
            assert_eq!(
                arp.target_hardware.as_ref().map(|a| a.to_string()).as_deref(),
                Some("00:00:00:00:00:00")
            );
            assert_eq!(
                arp.target_protocol.as_ref().map(|a| a.to_string()).as_deref(),
                Some("24.166.173.159")
            );

            let value = serde_json::to_value(&arp).unwrap();
            assert_eq!(value.get("hardware"), Some(&json!(65520)));
            assert_eq!(value.get("op"), Some(&json!(65520)));
        }

        #[test]
        fn arp_reply_and_ipv6_addresses() {
            // Hardware length 2, protocol length 16.
            let array = hex::decode(
                "000186dd021000020a0bfe800000000000000000000000000001\
                 0c0dfe800000000000000000000000000002",
            )
            .unwrap();
            let mut cursor = Cursor::new(&array);
            let arp = ARP::dissect(&mut cursor);
            assert!(arp.is_ok(), "{:?}", arp.err());
            let arp = arp.unwrap();

            assert_eq!(arp.op, Some(Label::Name("REPLY")));
            assert_eq!(arp.protocol, Some(0x86dd));
            assert_eq!(
                arp.sender_hardware.map(|a| a.to_string()).as_deref(),
                Some("0A:0B")
            );
            assert_eq!(
                arp.sender_protocol.map(|a| a.to_string()).as_deref(),
                Some("fe80::1")
            );
            assert_eq!(
                arp.target_protocol.map(|a| a.to_string()).as_deref(),
                Some("fe80::2")
            );
            assert_eq!(cursor.remaining(), 0);
        }

        #[test]
        fn every_hardware_and_opcode_name() {
            // No addresses: both address lengths are zero.
            let arp = |hardware: u16, op: u16| -> ARP {
                let mut array = hardware.to_be_bytes().to_vec();
                array.extend_from_slice(&[0x08, 0x00, 0x00, 0x00]);
                array.extend_from_slice(&op.to_be_bytes());
                let mut cursor = Cursor::new(&array);
                let arp = ARP::dissect(&mut cursor);
                assert!(arp.is_ok(), "{:?}", arp.err());
                arp.unwrap()
            };

            for &(code, name) in ARP_HARDWARE {
                assert_eq!(arp(code, ARP_REQUEST).hardware, Some(Label::Name(name)), "{}", code);
            }
            for &(code, name) in ARP_OPCODES {
                assert_eq!(arp(1, code).op, Some(Label::Name(name)), "{}", code);
            }

            assert_eq!(arp(1, ARP_REQUEST).op, Some(Label::Name("REQUEST")));
            assert_eq!(arp(1, ARP_REPLY).op, Some(Label::Name("REPLY")));

            let unnamed = arp(1000, 1000);
            assert_eq!(unnamed.hardware, Some(Label::Code(1000)));
            assert_eq!(unnamed.op, Some(Label::Code(1000)));
        }
    }
}
