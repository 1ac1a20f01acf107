//! Canonical encoding: maps assembled `BeaconCheckpoint`,
//! `Update`, and `HeaderUpdate` records to the wire form consumed by the
//! downstream on-chain verifier, and back.
//!
//! Integers are fixed-width little-endian; hashes are the raw 32 bytes;
//! branches are length-prefixed (`u64` count, then each hash); `Option<T>`
//! fields encode as a `has_value` byte followed by the value only when
//! present. Hand-rolled rather than pulled from a generic framing crate —
//! the shape is small and fixed, and the downstream verifier consumes this
//! exact byte layout directly.
//!
//! The decode side returns `Decoded*` records rather than the assembler's own
//! `BeaconCheckpoint`/`Update`/`HeaderUpdate` — those carry fields that never
//! reach the wire (`Update::block_roots_tree`, `BeaconCheckpoint`'s pubkey
//! list), so a faithful round trip can only promise bit-identical *wire
//! content*, not a rebuilt in-memory handle to data that was never encoded.

use ssz::{Decode, Encode};

use crate::assembler::{BeaconCheckpoint, HeaderUpdate, NextSyncCommitteeUpdate, Update};
use crate::error::DecodeError;
use crate::ssz::{
    BeaconHeader, BlsPubkey, BlsSignature, ExecutionPayloadHeaderCapella, Hash256, Slot,
};

fn put_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    put_u64(buf, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

fn put_pubkeys(buf: &mut Vec<u8>, pubkeys: &[BlsPubkey]) {
    put_u64(buf, pubkeys.len() as u64);
    for pk in pubkeys {
        buf.extend_from_slice(&pk.0);
    }
}

fn put_u64(buf: &mut Vec<u8>, value: u64) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn put_hash(buf: &mut Vec<u8>, hash: Hash256) {
    buf.extend_from_slice(hash.as_bytes());
}

fn put_branch(buf: &mut Vec<u8>, branch: &[Hash256]) {
    put_u64(buf, branch.len() as u64);
    for hash in branch {
        put_hash(buf, *hash);
    }
}

fn put_option<T>(buf: &mut Vec<u8>, value: &Option<T>, encode_value: impl FnOnce(&mut Vec<u8>, &T)) {
    match value {
        Some(v) => {
            buf.push(1);
            encode_value(buf, v);
        }
        None => buf.push(0),
    }
}

/// A read cursor over canonical-encoding bytes, mirroring the `put_*`
/// helpers one for one.
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .pos
            .checked_add(len)
            .ok_or_else(|| DecodeError::Wire("length overflow".into()))?;
        let slice = self
            .bytes
            .get(self.pos..end)
            .ok_or_else(|| DecodeError::Wire("unexpected end of input".into()))?;
        self.pos = end;
        Ok(slice)
    }

    /// Errors if any bytes remain — a round trip must consume exactly what
    /// `encode_*` wrote, no more and no less.
    fn finish(self) -> Result<(), DecodeError> {
        if self.pos == self.bytes.len() {
            Ok(())
        } else {
            Err(DecodeError::Wire(format!(
                "{} trailing byte(s) after decoding",
                self.bytes.len() - self.pos
            )))
        }
    }
}

fn get_u64(cursor: &mut Cursor) -> Result<u64, DecodeError> {
    let bytes: [u8; 8] = cursor.take(8)?.try_into().expect("length checked above");
    Ok(u64::from_le_bytes(bytes))
}

fn get_hash(cursor: &mut Cursor) -> Result<Hash256, DecodeError> {
    Ok(Hash256::from_slice(cursor.take(32)?))
}

fn get_bytes(cursor: &mut Cursor) -> Result<Vec<u8>, DecodeError> {
    let len = get_u64(cursor)? as usize;
    Ok(cursor.take(len)?.to_vec())
}

fn get_branch(cursor: &mut Cursor) -> Result<Vec<Hash256>, DecodeError> {
    let len = get_u64(cursor)? as usize;
    (0..len).map(|_| get_hash(cursor)).collect()
}

fn get_pubkeys(cursor: &mut Cursor) -> Result<Vec<BlsPubkey>, DecodeError> {
    let len = get_u64(cursor)? as usize;
    (0..len)
        .map(|_| {
            let bytes: [u8; 48] = cursor.take(48)?.try_into().expect("length checked above");
            Ok(BlsPubkey(bytes))
        })
        .collect()
}

fn get_option<T>(
    cursor: &mut Cursor,
    decode_value: impl FnOnce(&mut Cursor) -> Result<T, DecodeError>,
) -> Result<Option<T>, DecodeError> {
    match cursor.take(1)?[0] {
        0 => Ok(None),
        1 => Ok(Some(decode_value(cursor)?)),
        other => Err(DecodeError::Wire(format!("invalid option flag {other}"))),
    }
}

/// Encodes a `BeaconCheckpoint` for submission as a light-client bootstrap.
pub fn encode_checkpoint(checkpoint: &BeaconCheckpoint) -> Vec<u8> {
    let mut buf = Vec::new();
    put_u64(&mut buf, checkpoint.header.slot);
    put_u64(&mut buf, checkpoint.header.proposer_index);
    put_hash(&mut buf, checkpoint.header.parent_root);
    put_hash(&mut buf, checkpoint.header.state_root);
    put_hash(&mut buf, checkpoint.header.body_root);
    put_branch(&mut buf, &checkpoint.current_sync_committee_branch);
    put_hash(&mut buf, checkpoint.validators_root);
    put_hash(&mut buf, checkpoint.block_roots_root);
    put_branch(&mut buf, &checkpoint.block_roots_branch);
    buf
}

/// The wire content of a `BeaconCheckpoint` — everything `encode_checkpoint`
/// actually writes (the committee pubkey list never reaches the wire; the
/// branch that authenticates it does).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedCheckpoint {
    pub header: BeaconHeader,
    pub current_sync_committee_branch: Vec<Hash256>,
    pub validators_root: Hash256,
    pub block_roots_root: Hash256,
    pub block_roots_branch: Vec<Hash256>,
}

/// Decodes a `BeaconCheckpoint` encoded by [`encode_checkpoint`].
pub fn decode_checkpoint(bytes: &[u8]) -> Result<DecodedCheckpoint, DecodeError> {
    let mut cursor = Cursor::new(bytes);
    let header = BeaconHeader {
        slot: get_u64(&mut cursor)?,
        proposer_index: get_u64(&mut cursor)?,
        parent_root: get_hash(&mut cursor)?,
        state_root: get_hash(&mut cursor)?,
        body_root: get_hash(&mut cursor)?,
    };
    let current_sync_committee_branch = get_branch(&mut cursor)?;
    let validators_root = get_hash(&mut cursor)?;
    let block_roots_root = get_hash(&mut cursor)?;
    let block_roots_branch = get_branch(&mut cursor)?;
    cursor.finish()?;
    Ok(DecodedCheckpoint {
        header,
        current_sync_committee_branch,
        validators_root,
        block_roots_root,
        block_roots_branch,
    })
}

/// Encodes the execution payload header into the downstream-expected form.
/// The shape here is fixed across spec variants (the execution layer has no
/// mainnet/minimal split).
fn put_execution_header(buf: &mut Vec<u8>, header: &ExecutionPayloadHeaderCapella) {
    put_hash(buf, header.parent_hash);
    buf.extend_from_slice(&header.fee_recipient);
    put_hash(buf, header.state_root);
    put_hash(buf, header.receipts_root);
    buf.extend_from_slice(&header.logs_bloom.as_ssz_bytes());
    put_hash(buf, header.prev_randao);
    put_u64(buf, header.block_number);
    put_u64(buf, header.gas_limit);
    put_u64(buf, header.gas_used);
    put_u64(buf, header.timestamp);
    put_bytes(buf, &header.extra_data.as_ssz_bytes());
    let mut base_fee_bytes = [0u8; 32];
    header.base_fee_per_gas.to_little_endian(&mut base_fee_bytes);
    buf.extend_from_slice(&base_fee_bytes);
    put_hash(buf, header.block_hash);
    put_hash(buf, header.transactions_root);
    put_hash(buf, header.withdrawals_root);
}

/// Decodes the form [`put_execution_header`] writes.
fn get_execution_header(cursor: &mut Cursor) -> Result<ExecutionPayloadHeaderCapella, DecodeError> {
    let parent_hash = get_hash(cursor)?;
    let fee_recipient: [u8; 20] = cursor.take(20)?.try_into().expect("length checked above");
    let state_root = get_hash(cursor)?;
    let receipts_root = get_hash(cursor)?;
    let logs_bloom = Decode::from_ssz_bytes(cursor.take(256)?)
        .map_err(|e| DecodeError::Wire(format!("logs_bloom: {e:?}")))?;
    let prev_randao = get_hash(cursor)?;
    let block_number = get_u64(cursor)?;
    let gas_limit = get_u64(cursor)?;
    let gas_used = get_u64(cursor)?;
    let timestamp = get_u64(cursor)?;
    let extra_data_bytes = get_bytes(cursor)?;
    let extra_data = Decode::from_ssz_bytes(&extra_data_bytes)
        .map_err(|e| DecodeError::Wire(format!("extra_data: {e:?}")))?;
    let base_fee_per_gas = ethereum_types::U256::from_little_endian(cursor.take(32)?);
    let block_hash = get_hash(cursor)?;
    let transactions_root = get_hash(cursor)?;
    let withdrawals_root = get_hash(cursor)?;
    Ok(ExecutionPayloadHeaderCapella {
        parent_hash,
        fee_recipient,
        state_root,
        receipts_root,
        logs_bloom,
        prev_randao,
        block_number,
        gas_limit,
        gas_used,
        timestamp,
        extra_data,
        base_fee_per_gas,
        block_hash,
        transactions_root,
        withdrawals_root,
    })
}

fn put_next_sync_committee_update(buf: &mut Vec<u8>, update: &NextSyncCommitteeUpdate) {
    put_pubkeys(buf, &update.committee.pubkeys);
    buf.extend_from_slice(&update.committee.aggregate_pubkey.0);
    put_branch(buf, &update.branch);
}

/// The wire content of a `NextSyncCommitteeUpdate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedNextSyncCommitteeUpdate {
    pub pubkeys: Vec<BlsPubkey>,
    pub aggregate_pubkey: BlsPubkey,
    pub branch: Vec<Hash256>,
}

fn get_next_sync_committee_update(
    cursor: &mut Cursor,
) -> Result<DecodedNextSyncCommitteeUpdate, DecodeError> {
    let pubkeys = get_pubkeys(cursor)?;
    let aggregate_pubkey = BlsPubkey(cursor.take(48)?.try_into().expect("length checked above"));
    let branch = get_branch(cursor)?;
    Ok(DecodedNextSyncCommitteeUpdate {
        pubkeys,
        aggregate_pubkey,
        branch,
    })
}

/// Encodes a sync-committee-period or finality-only `Update`.
pub fn encode_update(update: &Update) -> Vec<u8> {
    let mut buf = Vec::new();
    put_u64(&mut buf, update.attested_header.slot);
    put_hash(&mut buf, update.attested_header.state_root);
    put_hash(&mut buf, update.attested_header.body_root);
    put_bytes(&mut buf, &update.sync_committee_bits);
    buf.extend_from_slice(&update.sync_committee_signature.0);
    put_u64(&mut buf, update.signature_slot);

    put_option(&mut buf, &update.next_sync_committee_update, |buf, next| {
        put_next_sync_committee_update(buf, next);
    });

    put_u64(&mut buf, update.finalized_header.slot);
    put_hash(&mut buf, update.finalized_header.parent_root);
    put_hash(&mut buf, update.finalized_header.state_root);
    put_hash(&mut buf, update.finalized_header.body_root);
    put_branch(&mut buf, &update.finality_branch);

    put_hash(&mut buf, update.block_roots_root);
    put_branch(&mut buf, &update.block_roots_branch);
    buf
}

/// The wire content of an `Update`. Field names spell out which header each
/// value belongs to since, unlike `HeaderUpdate`, neither header is encoded
/// in full here (`attested_header` omits `proposer_index`/`parent_root`;
/// `finalized_header` omits `proposer_index`) — see [`encode_update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedUpdate {
    pub attested_header_slot: Slot,
    pub attested_header_state_root: Hash256,
    pub attested_header_body_root: Hash256,
    pub sync_committee_bits: Vec<u8>,
    pub sync_committee_signature: BlsSignature,
    pub signature_slot: Slot,
    pub next_sync_committee_update: Option<DecodedNextSyncCommitteeUpdate>,
    pub finalized_header_slot: Slot,
    pub finalized_header_parent_root: Hash256,
    pub finalized_header_state_root: Hash256,
    pub finalized_header_body_root: Hash256,
    pub finality_branch: Vec<Hash256>,
    pub block_roots_root: Hash256,
    pub block_roots_branch: Vec<Hash256>,
}

/// Decodes an `Update` encoded by [`encode_update`].
pub fn decode_update(bytes: &[u8]) -> Result<DecodedUpdate, DecodeError> {
    let mut cursor = Cursor::new(bytes);
    let attested_header_slot = get_u64(&mut cursor)?;
    let attested_header_state_root = get_hash(&mut cursor)?;
    let attested_header_body_root = get_hash(&mut cursor)?;
    let sync_committee_bits = get_bytes(&mut cursor)?;
    let sync_committee_signature =
        BlsSignature(cursor.take(96)?.try_into().expect("length checked above"));
    let signature_slot = get_u64(&mut cursor)?;

    let next_sync_committee_update = get_option(&mut cursor, get_next_sync_committee_update)?;

    let finalized_header_slot = get_u64(&mut cursor)?;
    let finalized_header_parent_root = get_hash(&mut cursor)?;
    let finalized_header_state_root = get_hash(&mut cursor)?;
    let finalized_header_body_root = get_hash(&mut cursor)?;
    let finality_branch = get_branch(&mut cursor)?;

    let block_roots_root = get_hash(&mut cursor)?;
    let block_roots_branch = get_branch(&mut cursor)?;
    cursor.finish()?;

    Ok(DecodedUpdate {
        attested_header_slot,
        attested_header_state_root,
        attested_header_body_root,
        sync_committee_bits,
        sync_committee_signature,
        signature_slot,
        next_sync_committee_update,
        finalized_header_slot,
        finalized_header_parent_root,
        finalized_header_state_root,
        finalized_header_body_root,
        finality_branch,
        block_roots_root,
        block_roots_branch,
    })
}

/// Encodes a header-ancestry `HeaderUpdate`.
pub fn encode_header_update(update: &HeaderUpdate) -> Vec<u8> {
    let mut buf = Vec::new();
    put_u64(&mut buf, update.header.slot);
    put_u64(&mut buf, update.header.proposer_index);
    put_hash(&mut buf, update.header.parent_root);
    put_hash(&mut buf, update.header.state_root);
    put_hash(&mut buf, update.header.body_root);

    put_option(&mut buf, &update.ancestry_proof, |buf, proof| {
        put_branch(buf, &proof.header_branch);
        put_hash(buf, proof.finalized_block_root);
    });

    put_execution_header(&mut buf, &update.execution_header);
    put_hash(&mut buf, update.execution_payload_root);
    put_branch(&mut buf, &update.execution_branch);
    put_bytes(&mut buf, &update.next_sync_aggregate_bits);
    buf.extend_from_slice(&update.next_sync_aggregate_signature.0);
    buf
}

/// An ancestry proof's wire content, present on a `DecodedHeaderUpdate`
/// exactly when `HeaderUpdate::ancestry_proof` was `Some`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAncestryProof {
    pub header_branch: Vec<Hash256>,
    pub finalized_block_root: Hash256,
}

/// The wire content of a `HeaderUpdate`.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedHeaderUpdate {
    pub header: BeaconHeader,
    pub ancestry_proof: Option<DecodedAncestryProof>,
    pub execution_header: ExecutionPayloadHeaderCapella,
    pub execution_payload_root: Hash256,
    pub execution_branch: Vec<Hash256>,
    pub next_sync_aggregate_bits: Vec<u8>,
    pub next_sync_aggregate_signature: BlsSignature,
}

/// Decodes a `HeaderUpdate` encoded by [`encode_header_update`].
pub fn decode_header_update(bytes: &[u8]) -> Result<DecodedHeaderUpdate, DecodeError> {
    let mut cursor = Cursor::new(bytes);
    let header = BeaconHeader {
        slot: get_u64(&mut cursor)?,
        proposer_index: get_u64(&mut cursor)?,
        parent_root: get_hash(&mut cursor)?,
        state_root: get_hash(&mut cursor)?,
        body_root: get_hash(&mut cursor)?,
    };

    let ancestry_proof = get_option(&mut cursor, |cursor| {
        let header_branch = get_branch(cursor)?;
        let finalized_block_root = get_hash(cursor)?;
        Ok(DecodedAncestryProof {
            header_branch,
            finalized_block_root,
        })
    })?;

    let execution_header = get_execution_header(&mut cursor)?;
    let execution_payload_root = get_hash(&mut cursor)?;
    let execution_branch = get_branch(&mut cursor)?;
    let next_sync_aggregate_bits = get_bytes(&mut cursor)?;
    let next_sync_aggregate_signature =
        BlsSignature(cursor.take(96)?.try_into().expect("length checked above"));
    cursor.finish()?;

    Ok(DecodedHeaderUpdate {
        header,
        ancestry_proof,
        execution_header,
        execution_payload_root,
        execution_branch,
        next_sync_aggregate_bits,
        next_sync_aggregate_signature,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::AncestryProof;
    use crate::ssz::{BeaconHeader, BlsSignature, ExecutionPayloadHeaderCapella};
    use ssz_types::{FixedVector, VariableList};

    fn sample_header(slot: u64) -> BeaconHeader {
        BeaconHeader {
            slot,
            proposer_index: 1,
            parent_root: Hash256::repeat_byte(1),
            state_root: Hash256::repeat_byte(2),
            body_root: Hash256::repeat_byte(3),
        }
    }

    fn sample_execution_header() -> ExecutionPayloadHeaderCapella {
        ExecutionPayloadHeaderCapella {
            parent_hash: Hash256::zero(),
            fee_recipient: [0u8; 20],
            state_root: Hash256::zero(),
            receipts_root: Hash256::zero(),
            logs_bloom: FixedVector::from_elem(0),
            prev_randao: Hash256::zero(),
            block_number: 1,
            gas_limit: 30_000_000,
            gas_used: 0,
            timestamp: 1_700_000_000,
            extra_data: VariableList::empty(),
            base_fee_per_gas: ethereum_types::U256::zero(),
            block_hash: Hash256::zero(),
            transactions_root: Hash256::zero(),
            withdrawals_root: Hash256::zero(),
        }
    }

    #[test]
    fn header_update_without_ancestry_proof_encodes_zero_flag() {
        let update = HeaderUpdate {
            header: sample_header(100),
            ancestry_proof: None,
            execution_header: sample_execution_header(),
            execution_payload_root: Hash256::repeat_byte(4),
            execution_branch: vec![Hash256::repeat_byte(5); 4],
            next_sync_aggregate_bits: vec![0xff; 64],
            next_sync_aggregate_signature: BlsSignature([0u8; 96]),
        };
        let bytes = encode_header_update(&update);
        // slot(8) + proposer_index(8) + 3*32 hashes = 112 bytes before the option flag.
        assert_eq!(bytes[112], 0);
    }

    #[test]
    fn header_update_with_ancestry_proof_encodes_branch_length() {
        let branch = vec![Hash256::repeat_byte(7); 13];
        let update = HeaderUpdate {
            header: sample_header(100),
            ancestry_proof: Some(AncestryProof {
                header_branch: branch.clone(),
                finalized_block_root: Hash256::repeat_byte(9),
            }),
            execution_header: sample_execution_header(),
            execution_payload_root: Hash256::repeat_byte(4),
            execution_branch: vec![],
            next_sync_aggregate_bits: vec![0xff; 64],
            next_sync_aggregate_signature: BlsSignature([0u8; 96]),
        };
        let bytes = encode_header_update(&update);
        assert_eq!(bytes[112], 1);
        let len_bytes: [u8; 8] = bytes[113..121].try_into().unwrap();
        assert_eq!(u64::from_le_bytes(len_bytes), branch.len() as u64);
    }

    #[test]
    fn header_update_round_trips_without_ancestry_proof() {
        let update = HeaderUpdate {
            header: sample_header(100),
            ancestry_proof: None,
            execution_header: sample_execution_header(),
            execution_payload_root: Hash256::repeat_byte(4),
            execution_branch: vec![Hash256::repeat_byte(5); 4],
            next_sync_aggregate_bits: vec![0xff; 64],
            next_sync_aggregate_signature: BlsSignature([0xab; 96]),
        };
        let bytes = encode_header_update(&update);
        let decoded = decode_header_update(&bytes).expect("round trip should decode cleanly");
        assert_eq!(decoded.header, update.header);
        assert!(decoded.ancestry_proof.is_none());
        assert_eq!(decoded.execution_header, update.execution_header);
        assert_eq!(decoded.execution_payload_root, update.execution_payload_root);
        assert_eq!(decoded.execution_branch, update.execution_branch);
        assert_eq!(decoded.next_sync_aggregate_bits, update.next_sync_aggregate_bits);
        assert_eq!(decoded.next_sync_aggregate_signature, update.next_sync_aggregate_signature);
        assert_eq!(encode_header_update(&update), bytes);
    }

    #[test]
    fn header_update_round_trips_with_ancestry_proof() {
        let update = HeaderUpdate {
            header: sample_header(200),
            ancestry_proof: Some(AncestryProof {
                header_branch: vec![Hash256::repeat_byte(6); 6],
                finalized_block_root: Hash256::repeat_byte(9),
            }),
            execution_header: sample_execution_header(),
            execution_payload_root: Hash256::repeat_byte(4),
            execution_branch: vec![],
            next_sync_aggregate_bits: vec![0x00, 0xff, 0x0f],
            next_sync_aggregate_signature: BlsSignature([0xcd; 96]),
        };
        let bytes = encode_header_update(&update);
        let decoded = decode_header_update(&bytes).expect("round trip should decode cleanly");
        let proof = decoded.ancestry_proof.expect("ancestry proof should survive the round trip");
        let expected_proof = update.ancestry_proof.as_ref().unwrap();
        assert_eq!(proof.header_branch, expected_proof.header_branch);
        assert_eq!(proof.finalized_block_root, expected_proof.finalized_block_root);
    }

    #[test]
    fn checkpoint_round_trips() {
        let checkpoint = BeaconCheckpoint {
            header: sample_header(50),
            current_sync_committee: crate::assembler::SyncCommitteeSnapshot {
                pubkeys: vec![BlsPubkey([0x11; 48]); 2],
                aggregate_pubkey: BlsPubkey([0x22; 48]),
            },
            current_sync_committee_branch: vec![Hash256::repeat_byte(1); 5],
            validators_root: Hash256::repeat_byte(2),
            block_roots_root: Hash256::repeat_byte(3),
            block_roots_branch: vec![Hash256::repeat_byte(4); 6],
        };
        let bytes = encode_checkpoint(&checkpoint);
        let decoded = decode_checkpoint(&bytes).expect("round trip should decode cleanly");
        assert_eq!(decoded.header, checkpoint.header);
        assert_eq!(
            decoded.current_sync_committee_branch,
            checkpoint.current_sync_committee_branch
        );
        assert_eq!(decoded.validators_root, checkpoint.validators_root);
        assert_eq!(decoded.block_roots_root, checkpoint.block_roots_root);
        assert_eq!(decoded.block_roots_branch, checkpoint.block_roots_branch);
    }

    #[test]
    fn update_round_trips_with_next_sync_committee() {
        let update = Update {
            attested_header: sample_header(64),
            sync_committee_bits: vec![0xff; 8],
            sync_committee_signature: BlsSignature([0x33; 96]),
            signature_slot: 66,
            next_sync_committee_update: Some(NextSyncCommitteeUpdate {
                committee: crate::assembler::SyncCommitteeSnapshot {
                    pubkeys: vec![BlsPubkey([0x44; 48]); 4],
                    aggregate_pubkey: BlsPubkey([0x55; 48]),
                },
                branch: vec![Hash256::repeat_byte(7); 5],
            }),
            finalized_header: sample_header(63),
            finality_branch: vec![Hash256::repeat_byte(8); 6],
            block_roots_root: Hash256::repeat_byte(9),
            block_roots_branch: vec![Hash256::repeat_byte(10); 6],
            finalized_header_block_root: Hash256::repeat_byte(11),
            block_roots_tree: std::sync::Arc::new(merkle_proof::MerkleTree::create(&[Hash256::zero(); 8], 3)),
        };
        let bytes = encode_update(&update);
        let decoded = decode_update(&bytes).expect("round trip should decode cleanly");
        assert_eq!(decoded.attested_header_slot, update.attested_header.slot);
        assert_eq!(decoded.attested_header_state_root, update.attested_header.state_root);
        assert_eq!(decoded.attested_header_body_root, update.attested_header.body_root);
        assert_eq!(decoded.sync_committee_bits, update.sync_committee_bits);
        assert_eq!(decoded.sync_committee_signature, update.sync_committee_signature);
        assert_eq!(decoded.signature_slot, update.signature_slot);
        let next = decoded.next_sync_committee_update.expect("next sync committee should survive");
        let expected_next = update.next_sync_committee_update.as_ref().unwrap();
        assert_eq!(next.pubkeys, expected_next.committee.pubkeys);
        assert_eq!(next.aggregate_pubkey, expected_next.committee.aggregate_pubkey);
        assert_eq!(next.branch, expected_next.branch);
        assert_eq!(decoded.finalized_header_slot, update.finalized_header.slot);
        assert_eq!(decoded.finalized_header_parent_root, update.finalized_header.parent_root);
        assert_eq!(decoded.finalized_header_state_root, update.finalized_header.state_root);
        assert_eq!(decoded.finalized_header_body_root, update.finalized_header.body_root);
        assert_eq!(decoded.finality_branch, update.finality_branch);
        assert_eq!(decoded.block_roots_root, update.block_roots_root);
        assert_eq!(decoded.block_roots_branch, update.block_roots_branch);
    }

    #[test]
    fn update_round_trips_without_next_sync_committee() {
        let update = Update {
            attested_header: sample_header(64),
            sync_committee_bits: vec![0xaa; 8],
            sync_committee_signature: BlsSignature([0x66; 96]),
            signature_slot: 66,
            next_sync_committee_update: None,
            finalized_header: sample_header(63),
            finality_branch: vec![Hash256::repeat_byte(8); 6],
            block_roots_root: Hash256::repeat_byte(9),
            block_roots_branch: vec![Hash256::repeat_byte(10); 6],
            finalized_header_block_root: Hash256::repeat_byte(11),
            block_roots_tree: std::sync::Arc::new(merkle_proof::MerkleTree::create(&[Hash256::zero(); 8], 3)),
        };
        let bytes = encode_update(&update);
        let decoded = decode_update(&bytes).expect("round trip should decode cleanly");
        assert!(decoded.next_sync_committee_update.is_none());
        assert_eq!(decoded.sync_committee_bits, update.sync_committee_bits);
        assert_eq!(decoded.sync_committee_signature, update.sync_committee_signature);
    }

    #[test]
    fn decode_rejects_trailing_bytes() {
        let checkpoint = BeaconCheckpoint {
            header: sample_header(50),
            current_sync_committee: crate::assembler::SyncCommitteeSnapshot {
                pubkeys: vec![],
                aggregate_pubkey: BlsPubkey([0u8; 48]),
            },
            current_sync_committee_branch: vec![],
            validators_root: Hash256::zero(),
            block_roots_root: Hash256::zero(),
            block_roots_branch: vec![],
        };
        let mut bytes = encode_checkpoint(&checkpoint);
        bytes.push(0);
        assert!(decode_checkpoint(&bytes).is_err());
    }
}
