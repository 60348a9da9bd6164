use crate::error::Result;
use crate::lfsr::LfsrCore;

/// Number of zero-input bits flushed through a freshly reset LFSR before any
/// output is kept, so that the warm-up region (which depends only on the
/// all-ones seed, not on the taps) never leaks into the generated sequence.
const WARMUP_BITS: usize = 64;

/// An LFSR together with the tap list that built it.
///
/// Owns one [`LfsrCore`] and a copy of its taps, and knows how to
/// materialize N consecutive bits of its free-running sequence.
#[derive(Clone, Debug)]
pub struct LfsrDescriptor {
    lfsr: LfsrCore,
    taps: Vec<u32>,
}

impl LfsrDescriptor {
    pub fn new(taps: &[u32]) -> Result<Self> {
        let lfsr = LfsrCore::new(taps)?;
        Ok(LfsrDescriptor {
            lfsr,
            taps: taps.to_vec(),
        })
    }

    pub fn taps(&self) -> &[u32] {
        &self.taps
    }

    pub fn cycle_length(&self) -> u64 {
        self.lfsr.cycle_length()
    }

    pub fn poly_string(&self) -> String {
        self.lfsr.poly_string()
    }

    /// Generate `len` successive bits of this polynomial's free-running
    /// sequence: reset, flush [`WARMUP_BITS`] zero inputs through the
    /// register to clear the warm-up region, then emit `len` scramble(0)
    /// outputs. Two calls with the same taps always produce byte-identical
    /// output.
    pub fn generate(&self, len: usize) -> Vec<u8> {
        let mut lfsr = self.lfsr.clone();
        lfsr.reset();
        for _ in 0..WARMUP_BITS {
            lfsr.scramble(0);
        }

        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            out.push(lfsr.scramble(0));
        }
        out
    }
}
