//! UDP Layer

use serde::Serialize;

use crate::cursor::Cursor;
use crate::dissector::Dissector;
use crate::errors::Error;
use crate::layers::L4;
use crate::types::RawBytes;
use crate::Layer;

/// UDP header length
pub const UDP_HDR_LEN: usize = 8_usize;

pub(crate) fn dissect_l4(cursor: &mut Cursor<'_>) -> Result<L4, Error> {
    UDP::dissect(cursor).map(L4::Udp)
}

/// Structure representing the UDP Header and its payload.
///
/// The payload is `length - 8` bytes as declared in the header. Bytes after it are left unread.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "udp")]
pub struct UDP {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<u16>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "crate::types::hex::serialize_lower_hex_u16"
    )]
    pub checksum: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<RawBytes>,
}

impl UDP {
    pub fn dissect(cursor: &mut Cursor<'_>) -> Result<Self, Error> {
        let mut d = Dissector::<UDP>::new(cursor);
        d.scalar(|p| &mut p.src_port)?
            .scalar(|p| &mut p.dest_port)?
            .scalar(|p| &mut p.length)?
            .scalar(|p| &mut p.checksum)?;

        let payload_len = d
            .packet()
            .length
            .map_or(0, |length| usize::from(length).saturating_sub(UDP_HDR_LEN));
        d.bytes(|p| &mut p.data, payload_len)?;

        Ok(d.finish())
    }
}

impl Layer for UDP {
    fn name(&self) -> &'static str {
        "UDP"
    }

    fn short_name(&self) -> &'static str {
        "udp"
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::packet::Packet;
    use crate::types::ENCAP_TYPE_RAW;

    wasm_tests! {
        #[test]
        fn payload_follows_declared_length() {
            // Declared length 12: four payload bytes, two trailing bytes ignored.
            let array = hex::decode("0035c350000c1234deadbeefcafe").unwrap();
            let mut cursor = Cursor::new(&array);
            let udp = UDP::dissect(&mut cursor);
            assert!(udp.is_ok(), "{:?}", udp.err());
            let udp = udp.unwrap();

            assert_eq!(udp.src_port, Some(53));
            assert_eq!(udp.dest_port, Some(50000));
            assert_eq!(udp.length, Some(12));
            assert_eq!(udp.data, Some(RawBytes::from(&[0xde_u8, 0xad, 0xbe, 0xef][..])));
            assert_eq!(cursor.remaining(), 2);

            let value = serde_json::to_value(&udp).unwrap();
            assert_eq!(
                value,
                json!({
                    "type": "udp",
                    "src_port": 53,
                    "dest_port": 50000,
                    "length": 12,
                    "checksum": "0x1234",
                    "data": "deadbeef",
                })
            );
        }

        #[test]
        fn length_below_header_size() {
            let array = hex::decode("003500350004ffff").unwrap();
            let mut cursor = Cursor::new(&array);
            let udp = UDP::dissect(&mut cursor).unwrap();
            assert_eq!(udp.data, Some(RawBytes::default()));
        }

        #[test]
        fn declared_length_beyond_buffer_fails() {
            let array = hex::decode("4500001c000000004011000001020304050607080035003500200000aabb").unwrap();
            let p = Packet::from_bytes(&array, ENCAP_TYPE_RAW);
            assert!(
                matches!(p, Err(Error::TooShort { offset: 28, required: 24, available: 2, .. })),
                "{:?}",
                p
            );
        }
    }
}
