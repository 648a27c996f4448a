//! All types that we are supporting

mod hwaddr;
pub use hwaddr::*;

mod ethertype;
pub use ethertype::*;

mod ipaddr;
pub use ipaddr::*;

mod ipproto;
pub use ipproto::*;

mod label;
pub use label::*;

pub mod hex;
pub use self::hex::RawBytes;

/// Packet Encapsulation Type
///
/// This value is same as the link types supported by [libpcap][libpcap]
///
/// [libpcap]: https://www.tcpdump.org/linktypes.html
pub type EncapType = u32;

/// BSD loopback, a 4 byte host order address family precedes the IP header.
pub const ENCAP_TYPE_NULL: EncapType = 0;
pub const ENCAP_TYPE_ETH: EncapType = 1;
/// Raw IPv4 or IPv6, no link layer header.
pub const ENCAP_TYPE_RAW: EncapType = 101;
