//! Hex output for decoded values.
//!
//! Checksums and a few protocol codes read better as hex than as integers, so records route
//! those fields through the `serialize_*_hex_*` functions below. Opaque payloads are carried as
//! [`RawBytes`], which displays and serializes as a plain hex string.

use core::fmt;
use core::ops::Deref;

use serde::{Serialize, Serializer};

macro_rules! generate_serialize_hex_fns {
    (($fn:ident, $ty:ty, $format:literal)) => {
        pub fn $fn<S>(value: &Option<$ty>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(value) => serializer.serialize_str(format!($format, value).as_str()),
                None => serializer.serialize_none(),
            }
        }
    };

    ($($tt:tt,)*) => {
        $(
            generate_serialize_hex_fns!($tt);
        )+
    };
}

// Generate functions that can be used to Serialize an optional value to Hex
generate_serialize_hex_fns! {
    (serialize_lower_hex_u16, u16, "0x{:04x}"),
    (serialize_upper_hex_u16, u16, "0x{:04X}"),
}

/// Bytes left undecoded: payloads, option data and layers nothing knows how to decode.
#[derive(Default, Clone, PartialEq, Eq, Hash)]
pub struct RawBytes(Vec<u8>);

impl RawBytes {
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl Deref for RawBytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<&'_ [u8]> for RawBytes {
    fn from(slice: &[u8]) -> Self {
        Self(slice.to_vec())
    }
}

impl From<Vec<u8>> for RawBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for RawBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl fmt::Debug for RawBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Serialize for RawBytes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        hex::serde::serialize(&self.0, serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Header {
        #[serde(
            skip_serializing_if = "Option::is_none",
            serialize_with = "serialize_lower_hex_u16"
        )]
        checksum: Option<u16>,
        #[serde(serialize_with = "serialize_upper_hex_u16")]
        protocol: Option<u16>,
        payload: RawBytes,
    }

    wasm_tests! {
        #[test]
        fn hex_fields() {
            let header = Header {
                checksum: Some(0xad62),
                protocol: Some(0x0800),
                payload: RawBytes::from(vec![0xde, 0xad, 0xbe, 0xef]),
            };
            assert_eq!(
                serde_json::to_value(&header).unwrap(),
                serde_json::json!({"checksum": "0xad62", "protocol": "0x0800", "payload": "deadbeef"})
            );

            let header = Header {
                checksum: None,
                protocol: None,
                payload: RawBytes::default(),
            };
            assert_eq!(
                serde_json::to_value(&header).unwrap(),
                serde_json::json!({"protocol": null, "payload": ""})
            );
        }

        #[test]
        fn raw_bytes_slices() {
            let raw = RawBytes::from(&b"Hello!\n\0"[..]);
            assert_eq!(raw.len(), 8);
            assert_eq!(&raw[..6], b"Hello!");
            assert_eq!(raw.to_string(), "48656c6c6f210a00");
        }
    }
}
