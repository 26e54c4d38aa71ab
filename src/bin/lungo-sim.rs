use clap::Parser;
use lungo::config::{CacheConfig, PolicyConfig, TraceFormat};
use lungo::policy::PolicyKind;
use lungo::sim::{Report, Simulator};
use lungo::Result;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser, PartialEq)]
#[clap(author, version, about = "Replay a request trace through a cache replacement policy", long_about = None)]
struct Args {
    #[clap(short = 't', long, help = "Path to the delimited trace file")]
    trace: PathBuf,
    #[clap(short = 'c', long, help = "Cache capacity in bytes (in objects with --ignore-size)")]
    capacity: u64,
    #[clap(
        short = 'p',
        long,
        default_value = "hybrid",
        help = "Replacement policy (hybrid|lru|lfu)"
    )]
    policy: PolicyKind,
    #[clap(long, help = "Ticks of residency per doubling of hit count (hybrid only)")]
    half_life: Option<f64>,
    #[clap(long, help = "Count every object as size 1")]
    ignore_size: bool,
    #[clap(long, default_value_t = 0, help = "0-based column of the object key")]
    key_col: usize,
    #[clap(long, default_value_t = 1, help = "0-based column of the object size")]
    size_col: usize,
    #[clap(long, help = "Skip the first line of the trace")]
    has_header: bool,
    #[clap(short = 'd', long, default_value = ",", help = "Column delimiter")]
    delimiter: String,
    #[clap(
        long,
        value_delimiter = ',',
        value_name = "HALF_LIVES",
        help = "Try each half-life and report them best first"
    )]
    sweep: Vec<f64>,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("lungo-sim: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let format = TraceFormat {
        path: args.trace,
        key_col: args.key_col,
        size_col: args.size_col,
        has_header: args.has_header,
        delimiter: args.delimiter,
    };
    let config = CacheConfig::new(args.capacity, !args.ignore_size, format)?;
    let simulator = Simulator::new(&config)?;
    println!(
        "trace: {} requests, {} unique keys, capacity {}",
        simulator.trace().len(),
        simulator.trace().unique_keys(),
        config.capacity
    );

    if !args.sweep.is_empty() {
        for report in simulator.sweep(args.policy, &args.sweep)? {
            print_report(&report);
        }
        return Ok(());
    }

    let mut policy = PolicyConfig::new(args.policy);
    if let Some(half_life) = args.half_life {
        policy = policy.with_half_life(half_life)?;
    }
    print_report(&simulator.run(&policy)?);
    Ok(())
}

fn print_report(report: &Report) {
    let m = &report.metrics;
    println!(
        "{:<7} half-life {:>8.2}  miss ratio {:.4}  hits {:>9}  misses {:>9}  evictions {:>9}  ({} ms)",
        report.policy.kind.to_string(),
        report.policy.half_life,
        report.miss_ratio(),
        m.hits,
        m.misses,
        m.evictions,
        report.elapsed.as_millis()
    );
}
