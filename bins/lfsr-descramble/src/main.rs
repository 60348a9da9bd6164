use std::fs::{self, File};
use std::io::{BufReader, IsTerminal, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use scramble_core::{Correlator, Descrambler, HitAggregator, PolyLibrary};
use tracing_subscriber::EnvFilter;

const CANDIDATES_DIR: &str = "candidates";
const DESCRAMBLED_DIR: &str = "descrambled";
const INPUT_LOG: &str = "input.log";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "LFSR scrambler polynomial/phase recovery and descrambler",
    long_about = "Identifies the LFSR scrambler polynomial and phase that best explains one \
                  or more captured bit files, then writes descrambled copies of each file."
)]
struct Args {
    /// Path to the polynomial database (see the format described in the
    /// project README).
    #[arg(long = "poly-db", default_value = "all-irredpoly.txt")]
    poly_db: PathBuf,

    /// Captured bit files (one byte per bit, '0'/'1', other bytes ignored).
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info").add_directive("scramble_core::correlator=debug".parse().unwrap())
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> ExitCode {
    init_logging();
    let args = Args::parse();

    let library = match load_library(&args.poly_db) {
        Ok(lib) => lib,
        Err(msg) => {
            eprintln!("lfsr-descramble: {msg}");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!("loaded {} polynomials from database", library.len());

    let mut hits = HitAggregator::new();
    let mut correlated_count = 0u32;

    for path in &args.files {
        match process_file(path, &library, &mut hits) {
            Ok(()) => correlated_count += 1,
            Err(msg) => eprintln!("lfsr-descramble: {msg}"),
        }
    }

    let winner = match hits.winner() {
        Some(w) => w,
        None => {
            println!("lfsr-descramble: no candidate polynomials found. Shame :(");
            return ExitCode::FAILURE;
        }
    };

    print_hit_table(&hits, correlated_count);

    let best_offset = winner.best_offset().expect("winner always has a best offset");
    print_bold(&format!(
        "BEST MATCH: [{}] WITH {}/{} HITS",
        winner.desc.poly_string(),
        winner.total_hits,
        correlated_count
    ));
    print_bold(&format!(
        "BEST OFFSET: {best_offset} WITH {}/{} HITS",
        winner.max_offset_hits, winner.total_hits
    ));

    let descrambled = descramble_all(&args.files, winner.desc, best_offset as u64);
    print_bold(&format!("DESCRAMBLED {descrambled} FILES UNDER {DESCRAMBLED_DIR}"));

    ExitCode::SUCCESS
}

fn load_library(path: &PathBuf) -> Result<PolyLibrary, String> {
    let file = File::open(path).map_err(|e| format!("cannot open polynomial database {}: {e}", path.display()))?;
    PolyLibrary::parse(BufReader::new(file)).map_err(|e| e.to_string())
}

/// Reads one captured bit file, runs it through the correlator, dumps
/// diagnostic candidate files, and records hits. Returns `Err` (never
/// fatal to the overall run) if the file was empty, unreadable, or
/// otherwise couldn't be correlated.
fn process_file<'lib>(
    path: &PathBuf,
    library: &'lib PolyLibrary,
    hits: &mut HitAggregator<'lib>,
) -> Result<(), String> {
    let mut raw = Vec::new();
    File::open(path)
        .and_then(|mut f| f.read_to_end(&mut raw))
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;

    let frame: Vec<u8> = raw.iter().filter_map(|&b| (b == b'0' || b == b'1').then_some(b - b'0')).collect();
    if frame.is_empty() {
        return Err(format!("file {} is empty, skipping...", path.display()));
    }

    attempt_save(INPUT_LOG, &frame);

    let mut corr = Correlator::new(&frame).map_err(|e| format!("cannot correlate {}: {e}", path.display()))?;
    let candidates = corr.run(library);

    if !candidates.is_empty() {
        fs::create_dir_all(CANDIDATES_DIR).ok();
    }

    for candidate in &candidates {
        let diff = corr.candidate_diff(&frame, candidate);
        let poly_slug = candidate.desc.poly_string().replace(' ', "");
        let diag_path = format!("{CANDIDATES_DIR}/unscrambled-off{}-{poly_slug}.log", candidate.offset);
        attempt_save(&diag_path, &diff);

        hits.record(candidate.desc, candidate.phase);
    }

    Ok(())
}

fn attempt_save(path: &str, bits: &[u8]) {
    if let Ok(mut f) = File::create(path) {
        let bytes: Vec<u8> = bits.iter().map(|&b| b'0' + b).collect();
        let _ = f.write_all(&bytes);
    }
}

fn print_hit_table(hits: &HitAggregator, correlated_count: u32) {
    for hit in hits.hits() {
        if correlated_count == 1 || hit.total_hits > 1 {
            println!("{:3}/{correlated_count} hits: {}", hit.total_hits, hit.desc.poly_string());
            for offset in &hit.offsets {
                println!("      Offset {:4} with {:3} hits", offset.offset, offset.hit_count);
            }
            println!();
        }
    }
}

fn descramble_all(files: &[PathBuf], desc: &scramble_core::LfsrDescriptor, base_offset: u64) -> u32 {
    if fs::create_dir_all(DESCRAMBLED_DIR).is_err() {
        eprintln!("lfsr-descramble: failed to create output directory {DESCRAMBLED_DIR}");
        return 0;
    }

    let mut count = 0u32;
    for (i, path) in files.iter().enumerate() {
        let index = i + 1;
        let out_path = format!("{DESCRAMBLED_DIR}/descrambled-{index:06}.log");

        let result = (|| -> std::io::Result<()> {
            let reader = File::open(path)?;
            let writer = File::create(&out_path)?;
            let mut descrambler = Descrambler::new(desc, base_offset);
            descrambler.transform(reader, writer)
        })();

        match result {
            Ok(()) => count += 1,
            Err(e) => eprintln!("lfsr-descramble: failed to descramble {}: {e}", path.display()),
        }
    }
    count
}

fn print_bold(line: &str) {
    if std::io::stdout().is_terminal() {
        println!("\x1b[1m{line}\x1b[0m");
    } else {
        println!("{line}");
    }
}
