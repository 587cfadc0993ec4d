use std::process::ExitCode;
use std::time::Instant;

use log::{error, info};

use smooth_bkw::lwe::LweInstance;
use smooth_bkw::params::presets::toy_n10_q101;
use smooth_bkw::params::ReductionConfigBuilder;
use smooth_bkw::reduction::{Pipeline, ReductionContext};
use smooth_bkw::solve::{error_rate, solve_fwht};

type AppResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Positions left out of the transform.
const ZERO_POSITIONS: usize = 0;

struct Args {
    seed: u64,
    threads: usize,
}

fn parse_args() -> AppResult<Args> {
    let mut args = std::env::args().skip(1);
    let seed = match args.next() {
        Some(s) => s.parse()?,
        None => 1,
    };
    let threads = match args.next() {
        Some(t) => t.parse()?,
        None => std::thread::available_parallelism().map_or(1, |n| n.get()),
    };
    Ok(Args { seed, threads })
}

fn run() -> AppResult<()> {
    let args = parse_args()?;
    let preset = toy_n10_q101()?;
    let start = Instant::now();

    info!(
        "LWE parameters: n = {}, q = {}, sigma = {}*q, {} initial samples, seed {}",
        preset.n, preset.q, preset.alpha, preset.initial_samples, args.seed
    );
    let mut lwe = LweInstance::new(preset.n, preset.q, preset.alpha, args.seed)?;
    let samples = lwe.generate_samples(preset.initial_samples)?;

    let config = ReductionConfigBuilder::new().threads(args.threads).build()?;
    let ctx = ReductionContext::new(preset.n, preset.q, config)?;
    let out = Pipeline::new(&ctx, &preset.schedule)?.run(&samples, preset.final_samples)?;
    drop(samples);

    let failures = lwe.verify_list(&out.pool);
    if failures > 0 {
        return Err(format!("{failures} reduced samples fail the oracle check").into());
    }
    info!("error rate: {:.4}", error_rate(&lwe, &out.pool, ZERO_POSITIONS));

    let fwht_positions = preset.n - ZERO_POSITIONS;
    let found = solve_fwht(&out.pool, preset.q, ZERO_POSITIONS, fwht_positions)?;
    let secret = lwe.binary_secret();
    let expected = &secret[ZERO_POSITIONS..];

    println!("stage samples: {:?}", out.reports.iter().map(|r| r.stored).collect::<Vec<_>>());
    println!("found solution    {found:?}");
    println!("expected solution {expected:?}");
    println!("{} in {:.2?}", if found == expected { "recovered" } else { "mismatch" }, start.elapsed());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
