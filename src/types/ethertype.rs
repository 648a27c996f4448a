//! EtherType definitions and the names of well known EtherTypes

use crate::types::NameTable;

pub type EtherType = u16;

pub const ETHERTYPE_IP: EtherType = 0x0800;
pub const ETHERTYPE_ARP: EtherType = 0x0806;
pub const ETHERTYPE_IP6: EtherType = 0x86DD;

/// Customer VLAN tag (802.1Q).
pub const ETHERTYPE_DOT1Q: EtherType = 0x8100;
/// Service VLAN tag (802.1ad).
pub const ETHERTYPE_QINQ: EtherType = 0x88A8;

/// Smallest value read as an EtherType. Anything below is an 802.3 frame length.
pub const ETHERTYPE_MIN: EtherType = 0x0600;

pub static ETHERTYPES: &NameTable<EtherType> = &[
    (0x0800, "IPv4"),
    (0x0806, "ARP"),
    (0x0842, "Wake-on-LAN"),
    (0x22F0, "AVTP"),
    (0x22F3, "TRILL"),
    (0x22EA, "SRP"),
    (0x6002, "DEC MOP RC"),
    (0x6003, "DECnet Phase IV"),
    (0x6004, "DEC LAT"),
    (0x8035, "RARP"),
    (0x809B, "AppleTalk"),
    (0x80F3, "AARP"),
    (0x8100, "802.1Q"),
    (0x8102, "SLPP"),
    (0x8103, "VLACP"),
    (0x8137, "IPX"),
    (0x8204, "QNX Qnet"),
    (0x86DD, "IPv6"),
    (0x8808, "Ethernet flow control"),
    (0x8809, "Slow Protocols"),
    (0x8819, "CobraNet"),
    (0x8847, "MPLS unicast"),
    (0x8848, "MPLS multicast"),
    (0x8863, "PPPoE Discovery"),
    (0x8864, "PPPoE Session"),
    (0x887B, "HomePlug 1.0 MME"),
    (0x888E, "EAPOL"),
    (0x8892, "PROFINET"),
    (0x889A, "HyperSCSI"),
    (0x88A2, "ATA over Ethernet"),
    (0x88A4, "EtherCAT"),
    (0x88A8, "802.1ad"),
    (0x88AB, "Ethernet Powerlink"),
    (0x88B8, "GOOSE"),
    (0x88B9, "GSE"),
    (0x88BA, "SV"),
    (0x88BF, "MikroTik RoMON"),
    (0x88CC, "LLDP"),
    (0x88CD, "SERCOS III"),
    (0x88E1, "HomePlug Green PHY"),
    (0x88E3, "MRP"),
    (0x88E5, "MACsec"),
    (0x88E7, "PBB"),
    (0x88F7, "PTP"),
    (0x88F8, "NC-SI"),
    (0x88FB, "PRP"),
    (0x8902, "CFM"),
    (0x8906, "FCoE"),
    (0x8914, "FIP"),
    (0x8915, "RoCE"),
    (0x891D, "TTE"),
    (0x892F, "HSR"),
    (0x893A, "IEEE 1905.1"),
    (0x9000, "Loopback"),
    (0xF1C1, "802.1CB"),
];
