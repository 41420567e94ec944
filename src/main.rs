use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::{path::PathBuf, time::Duration};

use msufsort::loader::{read_text, wide_symbols, InputFormat};
use msufsort::{sort, InductionStrategy, InverseSuffixArray, SortConfig, SortStats, Symbol};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the text to sort
    #[arg(short, long)]
    path: PathBuf,

    /// Input format: plain, gzip or zstd. Inferred from the extension when omitted
    #[arg(short, long)]
    format: Option<InputFormat>,

    /// Treat the input as little-endian 16-bit symbols
    #[arg(short, long)]
    wide: bool,

    /// Induction strategy: enhanced or plain
    #[arg(short, long, default_value = "enhanced")]
    strategy: InductionStrategy,

    /// Only sort the first N symbols
    #[arg(short, long)]
    limit: Option<usize>,

    /// Check the result against direct suffix comparisons
    #[arg(long)]
    verify: bool,

    /// Print statistics as JSON
    #[arg(long)]
    json: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn run<S: Symbol>(text: &[S], args: &Args) -> Result<()> {
    let config = SortConfig::default()
        .with_induction(args.strategy)
        .with_verbose(args.verbose);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg} [{elapsed_precise}]")?);
    spinner.set_message(format!("Sorting {} suffixes", text.len()));
    spinner.enable_steady_tick(Duration::from_millis(100));
    let result = sort(text, &config);
    spinner.finish_and_clear();
    let isa = result.context("sort failed")?;

    let verified = if args.verify {
        if args.verbose {
            println!("Verifying...");
        }
        Some(isa.verify())
    } else {
        None
    };
    report(&isa, verified, args.json)?;

    if verified == Some(false) {
        anyhow::bail!("verification failed");
    }
    Ok(())
}

fn report<S: Symbol>(isa: &InverseSuffixArray<'_, S>, verified: Option<bool>, json: bool) -> Result<()> {
    let stats: &SortStats = isa.stats();
    if json {
        let mut value = serde_json::to_value(stats)?;
        if let Some(ok) = verified {
            value["verified"] = serde_json::Value::Bool(ok);
        }
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Suffixes:          {}", stats.length);
    println!("Time elapsed:      {:?}", isa.elapsed());
    println!("Memory:            {} bytes", isa.memory_usage());
    println!("Chains:            {} ({} singletons)", stats.chains, stats.singletons);
    println!("Induced:           {}", stats.induced);
    println!("Enhanced induced:  {}", stats.enhanced_induced);
    println!(
        "Tandem repeats:    {} walked, {} deferred (depth {})",
        stats.tandem_resolved, stats.tandem_deferred, stats.max_tandem_depth
    );
    if let Some(ok) = verified {
        println!("Verified:          {}", ok);
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let format = args.format.unwrap_or_else(|| InputFormat::infer(&args.path));
    let symbol_size = if args.wide { 2 } else { 1 };
    let bytes = read_text(&args.path, format, args.limit.map(|n| n * symbol_size))?;
    if args.verbose {
        println!("Read {} bytes from {}", bytes.len(), args.path.display());
    }

    if args.wide {
        let symbols = wide_symbols(&bytes)?;
        run(symbols.as_slice(), &args)
    } else {
        run(bytes.as_slice(), &args)
    }
}
