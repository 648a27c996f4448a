//! Ethernet Layer

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::Serialize;

use crate::cursor::Cursor;
use crate::dissector::Dissector;
use crate::errors::Error;
use crate::layers::{arp, ipv4, ipv6, L3};
use crate::types::{
    EtherType, HardwareAddress, Label, ETHERTYPES, ETHERTYPE_ARP, ETHERTYPE_DOT1Q, ETHERTYPE_IP,
    ETHERTYPE_IP6, ETHERTYPE_MIN, ETHERTYPE_QINQ,
};
use crate::Layer;

pub const MAC_ADDRESS_LENGTH: usize = 6_usize;

/// Dissector for the payload of an Ethernet frame.
pub type L3DissectFn = fn(&mut Cursor<'_>) -> Result<L3, Error>;

pub fn get_ethertypes_map() -> &'static HashMap<EtherType, L3DissectFn> {
    /// A Map maintaining EtherType -> dissectors of L3 Layers.
    static ETHERTYPES_MAP: OnceLock<HashMap<EtherType, L3DissectFn>> = OnceLock::new();
    ETHERTYPES_MAP.get_or_init(|| {
        let mut map: HashMap<EtherType, L3DissectFn> = HashMap::new();
        map.insert(ETHERTYPE_ARP, arp::dissect_l3);
        map.insert(ETHERTYPE_IP, ipv4::dissect_l3);
        map.insert(ETHERTYPE_IP6, ipv6::dissect_l3);
        map
    })
}

pub(crate) fn dissect_network(
    cursor: &mut Cursor<'_>,
    ether_type: Option<EtherType>,
) -> Result<L3, Error> {
    match ether_type.and_then(|ether_type| get_ethertypes_map().get(&ether_type)) {
        Some(dissect) => dissect(cursor),
        None => {
            log_debug!("no dissector for ether_type {:04x?}", ether_type);
            Ok(L3::Raw(cursor.unused().into()))
        }
    }
}

#[derive(Default)]
struct EthernetTemp {
    ether_type: Option<EtherType>,
}

/// Structure representing the Ethernet Header of a Packet.
///
/// `ether_type` is the EtherType after any VLAN tags, by name when it has one. Values below
/// 0x0600 are 802.3 frame lengths: `ether_type` then reads `"length"` and the value goes to
/// `length`.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ethernet")]
pub struct Ethernet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest: Option<HardwareAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<HardwareAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ether_type: Option<Label<EtherType>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<u16>,
    /// 802.1Q / 802.1ad tag control words, outermost first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<u16>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<L3>,
}

impl Ethernet {
    pub fn dissect(cursor: &mut Cursor<'_>) -> Result<Self, Error> {
        let mut d = Dissector::<Ethernet, EthernetTemp>::new(cursor);
        d.bytes_with(|p| &mut p.dest, MAC_ADDRESS_LENGTH, HardwareAddress::from)?
            .bytes_with(|p| &mut p.src, MAC_ADDRESS_LENGTH, HardwareAddress::from)?
            .temp(|t| &mut t.ether_type)?
            .repeat_while(
                |p| &mut p.tags,
                |_, t| matches!(t.ether_type, Some(ETHERTYPE_DOT1Q | ETHERTYPE_QINQ)),
                |c, t| {
                    let tag = c.u16()?;
                    t.ether_type = c.u16()?;
                    Ok(tag)
                },
            )?;

        let ether_type = d.scratch().ether_type;
        if let Some(ether_type) = ether_type {
            match Label::lookup(ETHERTYPES, ether_type) {
                Label::Code(length) if length < ETHERTYPE_MIN => {
                    d.constant(|p| &mut p.ether_type, Label::Name("length"))
                        .constant(|p| &mut p.length, length);
                }
                label => {
                    d.constant(|p| &mut p.ether_type, label);
                }
            }
        }

        d.nested(|p| &mut p.data, |c| dissect_network(c, ether_type))?;
        Ok(d.finish())
    }
}

impl Layer for Ethernet {
    fn name(&self) -> &'static str {
        "Ethernet"
    }

    fn short_name(&self) -> &'static str {
        "eth"
    }

    fn next_layer(&self) -> Option<&dyn Layer> {
        self.data.as_ref().and_then(L3::as_layer)
    }
}
