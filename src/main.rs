use anyhow::{Context, Result};
use clap::Parser;
use wavedb::{Time, Trace};

/// Query signal values from a waveform dump file.
#[derive(Parser)]
struct Opts {
    /// Input dump file (.vcd built in; other formats via registered loaders)
    input: String,

    /// Signal name to query, may be given multiple times
    #[clap(short, long)]
    signal: Vec<String>,

    /// Time to query each signal at, may be given multiple times
    #[clap(short = 't', long = "at")]
    at: Vec<Time>,

    /// How many directory entries to list
    #[clap(long, default_value = "20")]
    list: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let opts = Opts::parse();

    let mut trace = Trace::open(&opts.input)
        .with_context(|| format!("failed to open '{}'", opts.input))?;
    trace
        .import_all()
        .with_context(|| format!("failed to import '{}'", opts.input))?;
    if trace.needs_alias_pass() {
        trace.import_all().context("alias-completion pass failed")?;
    }

    if let Some(range) = trace.time_range() {
        println!(
            "Time range: {} to {} (timescale {})",
            range.start(),
            range.end(),
            trace.timescale()
        );
    }

    println!("{} signals", trace.num_symbols());
    for sym in trace.symbols().take(opts.list) {
        let node = trace.node(sym.node);
        println!(
            "  {} [{}:{}] {} transitions",
            sym.name,
            node.msb(),
            node.lsb(),
            node.num_hist()
        );
    }

    for name in &opts.signal {
        for &t in &opts.at {
            let value = trace.value_at(name, t)?;
            match value.to_integer() {
                Some(int) => println!("{} @ {} = {} ({})", name, t, value, int),
                None => println!("{} @ {} = {}", name, t, value),
            }
        }
    }

    Ok(())
}
