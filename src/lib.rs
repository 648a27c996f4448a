//! Incision: A crate for decoding captured Packets into typed records.
//!
//! A Basic unit in incision is a [`Packet`], the decoded form of a frame captured from the wire.
//! It is built from the raw bytes and the capture's link type:
//!
//! ```
//! let bytes = hex::decode("45000020000040004011b6e4c0a80001c0a8000204d2003500080000").unwrap();
//! let packet = incision::decode(&bytes, incision::ENCAP_TYPE_RAW)?;
//!
//! let names: Vec<_> = packet.layers().iter().map(|l| l.short_name()).collect();
//! assert_eq!(names, ["ip", "udp"]);
//! # Ok::<(), incision::Error>(())
//! ```
//!
//! A packet is a chain of records, one per protocol header, each a struct implementing the
//! [`Layer`] trait. Records serialize with `serde`; every one carries a `type` tag and leaves
//! out the fields it could not read. Layers nobody knows how to decode are kept as raw bytes.
//!
//! Decoders read through a [`Cursor`] and assemble their records with a
//! [`Dissector`][`dissector::Dissector`]; both are public for decoding further protocols the
//! same way.

#![recursion_limit = "256"]

#[macro_use]
mod cfg_macros;

pub mod cursor;
pub mod dissector;
pub mod errors;
pub mod layer;
pub mod layers;
pub mod packet;
pub mod types;

#[doc(inline)]
pub use cursor::Cursor;

#[doc(inline)]
pub use errors::Error;

#[doc(inline)]
pub use layer::Layer;

#[doc(inline)]
pub use layers::register_defaults;

#[doc(inline)]
pub use packet::Packet;

#[doc(inline)]
pub use types::{EncapType, ENCAP_TYPE_ETH, ENCAP_TYPE_NULL, ENCAP_TYPE_RAW};

/// Decodes a captured frame of link type `encap`.
///
/// Same as [`Packet::from_bytes`].
pub fn decode(bytes: &[u8], encap: EncapType) -> Result<Packet, Error> {
    Packet::from_bytes(bytes, encap)
}

cfg_wasm! {
    use wasm_bindgen::prelude::*;

    /// Decodes a hex encoded frame and returns the packet as pretty printed Json.
    #[wasm_bindgen]
    pub fn dissect_packet(encap_type: EncapType, packet: String) -> Result<String, JsValue> {
        let bytes = hex::decode(packet).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let p = Packet::from_bytes(&bytes, encap_type)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        serde_json::to_string_pretty(&p).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}
