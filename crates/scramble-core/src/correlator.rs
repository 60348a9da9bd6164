use std::sync::Arc;

use num_complex::Complex32;
use rustfft::{Fft, FftPlanner};

use crate::descriptor::LfsrDescriptor;
use crate::error::{Error, Result};
use crate::library::PolyLibrary;

/// A polynomial that raised the running best score for one input frame,
/// together with the offset its peak occurred at.
///
/// Borrows its descriptor from the [`PolyLibrary`] it was found in; it never
/// owns the polynomial it names.
pub struct Candidate<'lib> {
    pub desc: &'lib LfsrDescriptor,
    pub offset: usize,
    pub phase: u64,
    pub score: f32,
    /// The polynomial's free-running sequence at the time this candidate
    /// was recorded, kept for diagnostic dumps (`candidates/*.log`).
    pub seq: Vec<u8>,
}

/// FFT-based circular cross-correlator for one captured bit frame against a
/// library of candidate LFSR polynomials.
///
/// Construction computes the frame's DFT once; [`run`](Self::run) then
/// walks a [`PolyLibrary`] in order, reusing scratch buffers across
/// polynomials.
pub struct Correlator {
    frame_len: usize,
    data_freq: Vec<Complex32>,
    fft_fwd: Arc<dyn Fft<f32>>,
    fft_inv: Arc<dyn Fft<f32>>,
    best_score: f32,
}

impl Correlator {
    /// Build a correlator for a captured bit frame (`0`/`1` values). Fails
    /// on an empty frame.
    pub fn new(frame: &[u8]) -> Result<Self> {
        let n = frame.len();
        if n == 0 {
            return Err(Error::EmptyFrame);
        }

        let mut planner = FftPlanner::new();
        let fft_fwd = planner.plan_fft_forward(n);
        let fft_inv = planner.plan_fft_inverse(n);

        let mut data_freq = bits_to_signal(frame);
        fft_fwd.process(&mut data_freq);

        Ok(Correlator {
            frame_len: n,
            data_freq,
            fft_fwd,
            fft_inv,
            best_score: 0.0,
        })
    }

    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    /// Best squared-amplitude score seen across all polynomials run so far.
    pub fn best_score(&self) -> f32 {
        self.best_score
    }

    /// Run every polynomial in `library`, in library order, against this
    /// frame. Returns the candidate list: every polynomial that raised the
    /// running best score, in the (strictly increasing) order it did so.
    pub fn run<'lib>(&mut self, library: &'lib PolyLibrary) -> Vec<Candidate<'lib>> {
        let n = self.frame_len;
        let mut seq_freq = vec![Complex32::new(0.0, 0.0); n];
        let mut xcorr = vec![Complex32::new(0.0, 0.0); n];
        let mut candidates = Vec::new();

        for desc in library.descriptors() {
            let seq = desc.generate(n);

            seq_freq.copy_from_slice(&bits_to_signal(&seq));
            self.fft_fwd.process(&mut seq_freq);

            for (s, d) in seq_freq.iter_mut().zip(self.data_freq.iter()) {
                *s *= d.conj();
            }

            xcorr.copy_from_slice(&seq_freq);
            self.fft_inv.process(&mut xcorr);

            let mut max = 0.0f32;
            let mut max_j = 0usize;
            for (j, c) in xcorr.iter().enumerate() {
                let amp = c.norm_sqr();
                if amp > max {
                    max = amp;
                    max_j = j;
                }
            }

            if max > self.best_score {
                self.best_score = max;
                let phase = max_j as u64 % desc.cycle_length();
                tracing::debug!(
                    "new best score {} at offset {} for polynomial [{}]",
                    max,
                    max_j,
                    desc.poly_string()
                );
                candidates.push(Candidate {
                    desc,
                    offset: max_j,
                    phase,
                    score: max,
                    seq,
                });
            }
        }

        candidates
    }

    /// The per-bit XOR of `candidate`'s sequence (rotated by its offset)
    /// against this frame, for diagnostic dumps: ground truth would be all
    /// zeros for the true polynomial and alignment.
    pub fn candidate_diff(&self, frame: &[u8], candidate: &Candidate<'_>) -> Vec<u8> {
        let n = self.frame_len;
        (0..n)
            .map(|i| candidate.seq[(i + candidate.offset) % n] ^ frame[i])
            .collect()
    }
}

/// Map a `0`/`1` bit frame to the signed, normalized real signal the
/// correlator's DFTs operate on: bit -> {-1/N, +1/N} (doubled for historical
/// parity with the reference implementation; the constant scale factor does
/// not move the argmax).
fn bits_to_signal(bits: &[u8]) -> Vec<Complex32> {
    let k = 1.0f32 / bits.len() as f32;
    bits.iter()
        .map(|&b| Complex32::new(2.0 * k * (b as f32 - 0.5), 0.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::LfsrDescriptor;

    fn rotate_left(bits: &[u8], by: usize) -> Vec<u8> {
        let n = bits.len();
        (0..n).map(|i| bits[(i + by) % n]).collect()
    }

    #[test]
    fn rejects_empty_frame() {
        assert!(matches!(Correlator::new(&[]), Err(Error::EmptyFrame)));
    }

    #[test]
    fn self_match_picks_true_polynomial_at_phase_zero() {
        let target = LfsrDescriptor::new(&[10, 3, 1]).unwrap();
        let frame = target.generate(1023);

        let text = "7,6,1\n10,3,1\n15,1\n";
        let lib = crate::library::PolyLibrary::parse(std::io::Cursor::new(text)).unwrap();

        let mut corr = Correlator::new(&frame).unwrap();
        let candidates = corr.run(&lib);

        let best = candidates.last().expect("at least one candidate");
        assert_eq!(best.desc.poly_string(), "x^10 + x^3 + x^1 + 1");
        assert_eq!(best.offset, 0);
    }

    #[test]
    fn rotated_frame_reports_rotation_as_offset() {
        let target = LfsrDescriptor::new(&[10, 3, 1]).unwrap();
        let frame = rotate_left(&target.generate(1023), 137);

        let text = "7,6,1\n10,3,1\n";
        let lib = crate::library::PolyLibrary::parse(std::io::Cursor::new(text)).unwrap();

        let mut corr = Correlator::new(&frame).unwrap();
        let candidates = corr.run(&lib);
        let best = candidates.last().unwrap();

        assert_eq!(best.offset, 137);
    }

    #[test]
    fn candidate_scores_strictly_increase() {
        let target = LfsrDescriptor::new(&[10, 3, 1]).unwrap();
        let frame = target.generate(1023);
        let text = "7,6,1\n10,3,1\n15,1\n";
        let lib = crate::library::PolyLibrary::parse(std::io::Cursor::new(text)).unwrap();

        let mut corr = Correlator::new(&frame).unwrap();
        let candidates = corr.run(&lib);

        for pair in candidates.windows(2) {
            assert!(pair[1].score > pair[0].score);
        }
    }
}
