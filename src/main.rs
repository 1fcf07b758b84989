use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};
use mempool_miner::config::MinerConfig;
use mempool_miner::mempool::Mempool;
use mempool_miner::pow::CancelToken;
use mempool_miner::MempoolMiner;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Parser)]
#[command(name = "mempool-miner", about = "Assemble and mine a block from a directory of pool transactions")]
struct Opt {
    #[arg(long, help = "Directory of JSON transaction records")]
    mempool: PathBuf,
    #[arg(long, help = "JSON configuration file; defaults apply when omitted")]
    config: Option<PathBuf>,
    #[arg(long, default_value = "output.txt", help = "Where to write the mined block")]
    output: PathBuf,
    #[arg(long, help = "Header timestamp in unix seconds; overrides the configuration")]
    timestamp: Option<u32>,
    #[arg(long, help = "Give up the nonce search after this many seconds")]
    timeout: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let opt = Opt::parse();

    let mut config = match &opt.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            MinerConfig::from_json(&json).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => MinerConfig::default(),
    };
    if let Some(timestamp) = opt.timestamp {
        config.base_timestamp = timestamp;
    }
    if config.base_timestamp == 0 {
        config.base_timestamp = u32::try_from(unix_now()?.as_secs()).context("clock past 2106")?;
    }
    if config.coinbase.extra_nonce == 0 {
        config.coinbase.extra_nonce = unix_now()?.subsec_nanos() as u64;
    }

    let miner = MempoolMiner::new(config).context("invalid configuration")?;
    let pool = load_mempool(&opt.mempool)?;

    let cancel = CancelToken::new();
    if let Some(secs) = opt.timeout {
        let timer = cancel.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_secs(secs));
            timer.cancel();
        });
    }

    let Some(block) = miner.build_block(pool.into_transactions(), &cancel)? else {
        bail!("nonce search cancelled before a solution was found");
    };

    fs::write(&opt.output, block.to_string())
        .with_context(|| format!("writing {}", opt.output.display()))?;
    info!("wrote block to {}", opt.output.display());
    Ok(())
}

fn unix_now() -> Result<Duration> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock before 1970")
}

/// Every `*.json` file in `dir`, in file-name order
///
/// An unreadable file is counted as a malformed record and skipped.
fn load_mempool(dir: &Path) -> Result<Mempool> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut pool = Mempool::new();
    let mut records = Vec::with_capacity(paths.len());
    for path in &paths {
        match fs::read(path) {
            Ok(bytes) => records.push(bytes),
            Err(e) => {
                warn!("skipping {}: {e}", path.display());
                pool.record_unreadable(&e.to_string());
            }
        }
    }

    pool.extend_bytes(records.iter().map(Vec::as_slice));
    Ok(pool)
}
