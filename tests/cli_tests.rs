//! Runs the `mempool-miner` binary against a directory of records

use mempool_miner::pow::check_proof_of_work;
use mempool_miner::serialization::block::deserialize_block_header;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

fn record(prev: u8, fee: i64) -> String {
    format!(
        r#"{{"version": 2, "locktime": 0,
            "vin": [{{"txid": "{}", "vout": 0, "scriptsig": "", "sequence": 4294967295,
                     "witness": ["01"],
                     "prevout": {{"value": 50000, "scriptpubkey_type": "v1_p2tr"}}}}],
            "vout": [{{"value": {}, "scriptpubkey": "5120{}"}}]}}"#,
        hex::encode([prev; 32]),
        50_000 - fee,
        hex::encode([prev; 32])
    )
}

#[test]
fn test_binary_writes_mined_block() {
    let temp_dir = tempdir().unwrap();
    let mempool_dir = temp_dir.path().join("mempool");
    fs::create_dir(&mempool_dir).unwrap();
    fs::write(mempool_dir.join("a.json"), record(1, 1_000)).unwrap();
    fs::write(mempool_dir.join("b.json"), record(2, 2_000)).unwrap();
    fs::write(mempool_dir.join("broken.json"), "{").unwrap();
    fs::write(mempool_dir.join("notes.txt"), "ignored").unwrap();

    let config_path = temp_dir.path().join("config.json");
    fs::write(&config_path, r#"{"bits": "207fffff", "block_height": 2}"#).unwrap();
    let output_path = temp_dir.path().join("out.txt");

    let status = Command::new(env!("CARGO_BIN_EXE_mempool-miner"))
        .arg("--mempool")
        .arg(&mempool_dir)
        .arg("--config")
        .arg(&config_path)
        .arg("--output")
        .arg(&output_path)
        .arg("--timestamp")
        .arg("1700000000")
        .status()
        .unwrap();
    assert!(status.success());

    let text = fs::read_to_string(&output_path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);

    let header = deserialize_block_header(&hex::decode(lines[0]).unwrap()).unwrap();
    assert_eq!(header.timestamp, 1_700_000_000);
    assert_eq!(header.bits, 0x207fffff);
    assert!(check_proof_of_work(&header).unwrap());
    assert!(lines[1].starts_with("010000000001"));
    for txid in &lines[2..] {
        assert_eq!(txid.len(), 64);
    }
}

#[test]
fn test_binary_skips_non_utf8_record() {
    let temp_dir = tempdir().unwrap();
    let mempool_dir = temp_dir.path().join("mempool");
    fs::create_dir(&mempool_dir).unwrap();
    fs::write(mempool_dir.join("a.json"), record(1, 1_000)).unwrap();
    fs::write(mempool_dir.join("bad.json"), [0xff, 0xfe, 0x7b]).unwrap();

    let config_path = temp_dir.path().join("config.json");
    fs::write(&config_path, r#"{"bits": "207fffff", "block_height": 2}"#).unwrap();
    let output_path = temp_dir.path().join("out.txt");

    let status = Command::new(env!("CARGO_BIN_EXE_mempool-miner"))
        .arg("--mempool")
        .arg(&mempool_dir)
        .arg("--config")
        .arg(&config_path)
        .arg("--output")
        .arg(&output_path)
        .arg("--timestamp")
        .arg("1700000000")
        .status()
        .unwrap();
    assert!(status.success());

    let text = fs::read_to_string(&output_path).unwrap();
    assert_eq!(text.lines().count(), 3);
}

#[test]
fn test_binary_rejects_bad_config() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.json");
    fs::write(&config_path, r#"{"bits": "1d800001"}"#).unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_mempool-miner"))
        .arg("--mempool")
        .arg(temp_dir.path())
        .arg("--config")
        .arg(&config_path)
        .arg("--output")
        .arg(temp_dir.path().join("out.txt"))
        .status()
        .unwrap();
    assert!(!status.success());
    assert!(!temp_dir.path().join("out.txt").exists());
}
