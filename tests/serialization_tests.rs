//! Codec tests against independently computed vectors

use mempool_miner::segwit::{calculate_base_size, calculate_transaction_weight, calculate_vsize, calculate_witness_size};
use mempool_miner::serialization::transaction::{serialize_legacy, serialize_witness, txid, wtxid};
use mempool_miner::serialization::varint::{decode_varint, encode_varint};
use mempool_miner::*;

#[test]
fn test_varint_boundaries() {
    let cases: [(u64, usize); 8] = [
        (0, 1),
        (0xfc, 1),
        (0xfd, 3),
        (0xffff, 3),
        (0x10000, 5),
        (0xffff_ffff, 5),
        (0x1_0000_0000, 9),
        (u64::MAX, 9),
    ];
    for (value, len) in cases {
        let encoded = encode_varint(value);
        assert_eq!(encoded.len(), len, "length of {value:#x}");
        assert_eq!(decode_varint(&encoded).unwrap(), (value, len));
    }
    assert_eq!(encode_varint(0xfd), vec![0xfd, 0xfd, 0x00]);
    assert_eq!(encode_varint(0x10000), vec![0xfe, 0x00, 0x00, 0x01, 0x00]);
}

#[test]
fn test_varint_short_buffer() {
    assert!(matches!(
        decode_varint(&[0xfe, 0x01, 0x02]),
        Err(MinerError::MalformedLength { .. })
    ));
    assert!(matches!(decode_varint(&[]), Err(MinerError::MalformedLength { .. })));
}

/// Two inputs, one with a two-item witness and one nested-segwit style
/// script_sig with no witness; two outputs
fn create_mixed_transaction() -> Transaction {
    let mut first_prev = [0u8; 32];
    for (i, b) in first_prev.iter_mut().enumerate() {
        *b = i as u8;
    }
    Transaction {
        version: 2,
        inputs: vec![
            TransactionInput {
                prevout: OutPoint { txid: first_prev, index: 1 },
                script_sig: vec![],
                sequence: 0xfffffffd,
                witness: vec![vec![0x30; 71], vec![0x02; 33]],
                spent_output: None,
            },
            TransactionInput {
                prevout: OutPoint { txid: [0xee; 32], index: 0 },
                script_sig: [vec![0x16, 0x00, 0x14], vec![0xab; 20]].concat(),
                sequence: 0xffffffff,
                witness: vec![],
                spent_output: None,
            },
        ],
        outputs: vec![
            TransactionOutput {
                value: 12_345,
                script_pubkey: [vec![0x00, 0x14], vec![0xcd; 20]].concat(),
            },
            TransactionOutput {
                value: 0,
                script_pubkey: vec![0x6a, 0x04, 0x01, 0x02, 0x03, 0x04],
            },
        ],
        lock_time: 400_000,
    }
}

#[test]
fn test_mixed_transaction_ids() {
    let tx = create_mixed_transaction();
    assert_eq!(serialize_legacy(&tx).len(), 161);
    assert_eq!(serialize_witness(&tx).len(), 271);
    assert_eq!(
        hex::encode(txid(&tx)),
        "e0ee1989158c9d32449c580af241ad94b7b232fbb5c7943b72cfb90f4f9da6b7"
    );
    assert_eq!(
        hex::encode(wtxid(&tx)),
        "2f09428b10f124b76b52dec40d4d02b99964d80b6203fb8413308c9a65589018"
    );
}

#[test]
fn test_mixed_transaction_weight() {
    let tx = create_mixed_transaction();
    // 8 + (41 + 0) + (41 + 23) + (9 + 22) + (9 + 6)
    assert_eq!(calculate_base_size(&tx), 159);
    // 2 + (1 + 71) + (1 + 33)
    assert_eq!(calculate_witness_size(&tx), 108);
    assert_eq!(calculate_transaction_weight(&tx), 744);
    assert_eq!(calculate_vsize(&tx), 186);
}

#[test]
fn test_witness_form_wraps_legacy_form() {
    let tx = create_mixed_transaction();
    let legacy = serialize_legacy(&tx);
    let witness = serialize_witness(&tx);
    assert_eq!(&witness[..4], &legacy[..4]);
    assert_eq!(&witness[4..6], &[0x00, 0x01]);
    assert_eq!(&witness[witness.len() - 4..], &legacy[legacy.len() - 4..]);
    // The second input contributes an empty stack just before the lock time
    assert_eq!(witness[witness.len() - 5], 0x00);
}
