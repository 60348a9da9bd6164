use std::io::{self, Read, Write};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use viterbi_core::{DecodedBlockSink, Viterbi, TRELLIS_WINDOW};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Viterbi decoder for rate 1/n convolutional codes",
    long_about = "Reads fixed-width codewords ('0'/'1' bytes, MSB first) from stdin and \
                  writes the maximum-likelihood decoded bitstream to stdout."
)]
struct Args {
    /// Constraint length (at most 10).
    k: usize,

    /// One or more generator polynomials (K-bit masks, MSB = current input
    /// bit, LSB = oldest retained bit). The count sets the code rate 1/n.
    #[arg(required = true)]
    polynomials: Vec<u32>,
}

/// Writes decoded bits to stdout and tracks how many traceback windows were
/// too corrupted to trust.
struct StdoutSink {
    out: io::Stdout,
    total_windows: u32,
    failed_windows: u32,
}

impl DecodedBlockSink for StdoutSink {
    fn on_data(&mut self, bits: &[u8], errors: u32) -> bool {
        let threshold = (bits.len() as u32) / (TRELLIS_WINDOW as u32 - 1);
        if errors >= threshold {
            eprintln!("viterbi-decode: stream is extremely corrupted here! ({errors} errors)");
            self.failed_windows += 1;
        } else if errors > 0 {
            eprintln!("viterbi-decode: warning: {errors} unexplainable bits in {} codewords", bits.len());
        }

        let mut lock = self.out.lock();
        let rendered: Vec<u8> = bits.iter().map(|&b| b'0' + b).collect();
        if lock.write_all(&rendered).is_err() {
            return false;
        }

        self.total_windows += 1;
        true
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn main() -> ExitCode {
    init_logging();
    let args = Args::parse();

    let mut decoder = match Viterbi::new(args.k, &args.polynomials) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("viterbi-decode: {e}");
            return ExitCode::FAILURE;
        }
    };

    let n = args.polynomials.len();
    let mut sink = StdoutSink { out: io::stdout(), total_windows: 0, failed_windows: 0 };
    let mut stdin = io::stdin().lock();
    let mut codeword_buf = vec![0u8; n];

    loop {
        match stdin.read_exact(&mut codeword_buf) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => {
                eprintln!("viterbi-decode: failed to read codeword: {e}");
                return ExitCode::FAILURE;
            }
        }

        let mut codeword = 0u32;
        for (i, &byte) in codeword_buf.iter().enumerate() {
            match byte {
                b'1' => codeword |= 1 << (n - i - 1),
                b'0' => {}
                other => {
                    eprintln!("viterbi-decode: invalid character {other:#o} in input");
                    return ExitCode::FAILURE;
                }
            }
        }

        if decoder.feed(codeword, &mut sink).is_err() {
            eprintln!("viterbi-decode: decoder refused to continue");
            return ExitCode::FAILURE;
        }
    }

    if sink.total_windows == sink.failed_windows {
        eprintln!("viterbi-decode: all tracebacks failed. Decoding failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
