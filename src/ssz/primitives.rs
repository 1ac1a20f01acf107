use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ssz::{Decode, DecodeError as SszDecodeError, Encode};
use tree_hash::{PackedEncoding, TreeHash, TreeHashType};

/// A 32-byte Merkle root or block root.
pub type Hash256 = ethereum_types::H256;

/// Beacon chain slot number.
pub type Slot = u64;

/// Beacon chain epoch number.
pub type Epoch = u64;

macro_rules! impl_fixed_bytes {
    ($name:ident, $len:expr) => {
        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&format!("0x{}", hex::encode(self.0)))
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                let bytes =
                    hex::decode(s.strip_prefix("0x").unwrap_or(&s)).map_err(DeError::custom)?;
                if bytes.len() != $len {
                    return Err(DeError::custom(format!(
                        "expected {} bytes, got {}",
                        $len,
                        bytes.len()
                    )));
                }
                let mut arr = [0u8; $len];
                arr.copy_from_slice(&bytes);
                Ok($name(arr))
            }
        }

        impl Encode for $name {
            fn is_ssz_fixed_len() -> bool {
                true
            }

            fn ssz_fixed_len() -> usize {
                $len
            }

            fn ssz_bytes_len(&self) -> usize {
                $len
            }

            fn ssz_append(&self, buf: &mut Vec<u8>) {
                buf.extend_from_slice(&self.0);
            }
        }

        impl Decode for $name {
            fn is_ssz_fixed_len() -> bool {
                true
            }

            fn ssz_fixed_len() -> usize {
                $len
            }

            fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, SszDecodeError> {
                if bytes.len() != $len {
                    return Err(SszDecodeError::InvalidByteLength {
                        len: bytes.len(),
                        expected: $len,
                    });
                }
                let mut arr = [0u8; $len];
                arr.copy_from_slice(bytes);
                Ok($name(arr))
            }
        }

        impl TreeHash for $name {
            fn tree_hash_type() -> TreeHashType {
                <[u8; $len] as TreeHash>::tree_hash_type()
            }

            fn tree_hash_packed_encoding(&self) -> PackedEncoding {
                self.0.tree_hash_packed_encoding()
            }

            fn tree_hash_packing_factor() -> usize {
                <[u8; $len] as TreeHash>::tree_hash_packing_factor()
            }

            fn tree_hash_root(&self) -> Hash256 {
                self.0.tree_hash_root()
            }
        }
    };
}

/// A compressed BLS12-381 public key (48 bytes). Never deserialized into a
/// curve point by this crate — signatures and pubkeys are opaque bytes here,
/// since signature verification is the downstream verifier's job (see
/// `spec.md` Non-goals).
///
/// The beacon API encodes this as a `0x`-prefixed hex string, not a JSON byte
/// array, and `serde`'s blanket `[T; N]` impls only cover `N <= 32` anyway —
/// so this carries its own `Serialize`/`Deserialize`, with SSZ encode/decode
/// and tree-hash delegating straight through to the inner array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlsPubkey(pub [u8; 48]);

/// A compressed BLS12-381 signature (96 bytes), likewise opaque and hex-wired.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlsSignature(pub [u8; 96]);

impl_fixed_bytes!(BlsPubkey, 48);
impl_fixed_bytes!(BlsSignature, 96);
