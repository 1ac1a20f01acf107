use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::typenum::{U1048576, U1073741824, U16, U32};
use ssz_types::VariableList;
use tree_hash::TreeHash;
use tree_hash_derive::TreeHash;

use super::primitives::Hash256;

/// Capella execution payload header, field index 9 of `BeaconBlockBodyCapella`
/// (generalized index 25 — `crate::config::EXECUTION_PAYLOAD_GENERALIZED_INDEX`).
///
/// Field order is load-bearing: it fixes `hash_tree_root`. Do not reorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct ExecutionPayloadHeaderCapella {
    pub parent_hash: Hash256,
    pub fee_recipient: [u8; 20],
    pub state_root: Hash256,
    pub receipts_root: Hash256,
    pub logs_bloom: ssz_types::FixedVector<u8, ssz_types::typenum::U256>,
    pub prev_randao: Hash256,
    #[serde(with = "quoted_u64")]
    pub block_number: u64,
    #[serde(with = "quoted_u64")]
    pub gas_limit: u64,
    #[serde(with = "quoted_u64")]
    pub gas_used: u64,
    #[serde(with = "quoted_u64")]
    pub timestamp: u64,
    pub extra_data: VariableList<u8, U32>,
    #[serde(with = "quoted_u256")]
    pub base_fee_per_gas: ethereum_types::U256,
    pub block_hash: Hash256,
    pub transactions_root: Hash256,
    pub withdrawals_root: Hash256,
}

/// Capella execution payload, field index 9 of `BeaconBlockBodyCapella`
/// (generalized index `crate::config::EXECUTION_PAYLOAD_GENERALIZED_INDEX`).
/// This is the full in-block form with inline `transactions`/`withdrawals`
/// lists — what `/eth/v2/beacon/blocks/{id}` actually returns. Not to be
/// confused with `ExecutionPayloadHeaderCapella`, the roots-only form the
/// *state* carries at `latest_execution_payload_header`; [`Self::to_header`]
/// converts between the two.
///
/// Field order is load-bearing: it fixes `hash_tree_root`. Do not reorder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct ExecutionPayloadCapella {
    pub parent_hash: Hash256,
    pub fee_recipient: [u8; 20],
    pub state_root: Hash256,
    pub receipts_root: Hash256,
    pub logs_bloom: ssz_types::FixedVector<u8, ssz_types::typenum::U256>,
    pub prev_randao: Hash256,
    #[serde(with = "quoted_u64")]
    pub block_number: u64,
    #[serde(with = "quoted_u64")]
    pub gas_limit: u64,
    #[serde(with = "quoted_u64")]
    pub gas_used: u64,
    #[serde(with = "quoted_u64")]
    pub timestamp: u64,
    pub extra_data: VariableList<u8, U32>,
    #[serde(with = "quoted_u256")]
    pub base_fee_per_gas: ethereum_types::U256,
    pub block_hash: Hash256,
    pub transactions: VariableList<VariableList<u8, U1073741824>, U1048576>,
    pub withdrawals: VariableList<Withdrawal, U16>,
}

impl ExecutionPayloadCapella {
    /// Collapses `transactions`/`withdrawals` to their SSZ list roots,
    /// producing the wire header form the downstream verifier and
    /// `BeaconStateCapella::latest_execution_payload_header` both use.
    /// Matches the original `api.CapellaExecutionPayloadToScale` conversion.
    pub fn to_header(&self) -> ExecutionPayloadHeaderCapella {
        ExecutionPayloadHeaderCapella {
            parent_hash: self.parent_hash,
            fee_recipient: self.fee_recipient,
            state_root: self.state_root,
            receipts_root: self.receipts_root,
            logs_bloom: self.logs_bloom.clone(),
            prev_randao: self.prev_randao,
            block_number: self.block_number,
            gas_limit: self.gas_limit,
            gas_used: self.gas_used,
            timestamp: self.timestamp,
            extra_data: self.extra_data.clone(),
            base_fee_per_gas: self.base_fee_per_gas,
            block_hash: self.block_hash,
            transactions_root: self.transactions.tree_hash_root(),
            withdrawals_root: self.withdrawals.tree_hash_root(),
        }
    }
}

/// A validator withdrawal processed in this payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct Withdrawal {
    #[serde(with = "quoted_u64")]
    pub index: u64,
    #[serde(with = "quoted_u64")]
    pub validator_index: u64,
    pub address: [u8; 20],
    #[serde(with = "quoted_u64")]
    pub amount: u64,
}

mod quoted_u64 {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<u64>().map_err(D::Error::custom)
    }
}

mod quoted_u256 {
    use ethereum_types::U256;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let s = String::deserialize(deserializer)?;
        U256::from_dec_str(&s).map_err(D::Error::custom)
    }
}
