//! 'Layer' trait
//!
//! [`Layer`] trait is central to [`incision`][`crate`]. Every protocol record that can sit in a
//! packet's chain of headers (Ethernet, ARP, IPv4, IPv6, ICMP, ICMPv6, TCP, UDP) implements it,
//! which lets a decoded [`Packet`][`crate::Packet`] be walked and serialized layer by layer
//! without knowing the concrete record types.

use core::fmt::Debug;

use erased_serde::serialize_trait_object;

/// `Layer` Trait defines a 'Layer' in a Packet
///
/// Typically a Layer will correspond to Data Link Layer, Network Layer or Transport Layer.
pub trait Layer: Send + Debug + erased_serde::Serialize {
    /// Name for the given layer.
    fn name(&self) -> &'static str;

    /// Short name for the given layer.
    fn short_name(&self) -> &'static str;

    /// The decoded layer carried as this layer's payload, if any.
    ///
    /// For ICMP and ICMPv6 error messages this is the copy of the offending packet embedded in
    /// the message body. Payloads that were captured as raw bytes are not layers.
    fn next_layer(&self) -> Option<&dyn Layer> {
        None
    }
}

serialize_trait_object!(Layer);
