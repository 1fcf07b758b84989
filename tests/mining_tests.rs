//! Nonce search regression tests on fixed headers

use mempool_miner::pow::{check_proof_of_work, mine, mine_parallel, CancelToken, MiningResult};
use mempool_miner::*;
use std::thread;
use std::time::Duration;

fn fixed_header() -> BlockHeader {
    BlockHeader {
        version: 4,
        prev_block_hash: [0x11; 32],
        merkle_root: [0x22; 32],
        timestamp: 1_700_000_000,
        bits: DEFAULT_BITS,
        nonce: 0,
    }
}

#[test]
fn test_default_target_converges_reproducibly() {
    for _ in 0..2 {
        let result = mine(fixed_header(), &CancelToken::new(), DEFAULT_CANCEL_CHECK_INTERVAL).unwrap();
        match result {
            MiningResult::Found { header, hash, attempts } => {
                assert_eq!(header.nonce, 36_078);
                assert_eq!(header.timestamp, 1_700_000_000);
                assert_eq!(attempts, 36_079);
                assert_eq!(
                    hex::encode(hash),
                    "0000a536079deb58d8ff03348a52565e2a9063db123f8f6058f00f6728a78448"
                );
            }
            other => panic!("expected a solution, got {other:?}"),
        }
    }
}

#[test]
fn test_nonce_rollover_bumps_timestamp() {
    let header = BlockHeader {
        version: 4,
        prev_block_hash: [0; 32],
        merkle_root: [7; 32],
        timestamp: 1_700_000_000,
        bits: 0x207fffff,
        nonce: u32::MAX - 1,
    };
    let result = mine(header, &CancelToken::new(), 1).unwrap();
    match result {
        MiningResult::Found { header, hash, attempts } => {
            // Both remaining nonces miss; the fourth nonce after the wrap hits
            assert_eq!(header.timestamp, 1_700_000_001);
            assert_eq!(header.nonce, 3);
            assert_eq!(attempts, 6);
            assert_eq!(
                hex::encode(hash),
                "6da3808caca28aa9b5ee0e99a866491247670c0788fb5f74085368fb6ff33863"
            );
            assert!(check_proof_of_work(&header).unwrap());
        }
        other => panic!("expected a solution, got {other:?}"),
    }
}

#[test]
fn test_cancel_from_another_thread() {
    let mut header = fixed_header();
    // Only an all-zero hash would do
    header.bits = 0x03000001;
    let cancel = CancelToken::new();
    let remote = cancel.clone();
    let handle = thread::spawn(move || mine(header, &remote, 1_024));

    thread::sleep(Duration::from_millis(50));
    cancel.cancel();
    let result = handle.join().unwrap().unwrap();
    match result {
        MiningResult::Cancelled { attempts, header } => {
            assert!(attempts > 0);
            assert_eq!(attempts % 1_024, 0);
            assert_eq!(header.nonce as u64, attempts);
        }
        other => panic!("expected cancellation, got {other:?}"),
    }
}

#[test]
fn test_parallel_search_meets_target() {
    let result = mine_parallel(fixed_header(), 4, &CancelToken::new(), 256).unwrap();
    match result {
        MiningResult::Found { header, .. } => {
            assert!(check_proof_of_work(&header).unwrap());
            assert_eq!(header.merkle_root, [0x22; 32]);
        }
        other => panic!("expected a solution, got {other:?}"),
    }
}
