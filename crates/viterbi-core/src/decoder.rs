use crate::error::{Error, Result};

/// Largest constraint length this decoder supports.
pub const MAX_K: usize = 10;
/// Largest number of output polynomials (rate 1/n, n up to this).
pub const MAX_N: usize = 16;
/// Trellis depth, in constraint lengths, between successive tracebacks.
pub const TRELLIS_WINDOW: usize = 5;
/// Sentinel path distance representing an unreachable state.
pub const INFINITY: u32 = u32::MAX;

#[derive(Clone, Copy, Debug)]
struct Node {
    prev: u32,
    path_dist: u32,
}

/// Receives one decoded block every time the sliding trellis window fills.
///
/// Returning `false` aborts decoding: [`Viterbi::feed`] then returns
/// [`Error::DecoderAborted`].
pub trait DecodedBlockSink {
    fn on_data(&mut self, bits: &[u8], errors: u32) -> bool;
}

/// Streaming maximum-likelihood decoder for a rate-1/n convolutional code,
/// using hard-decision Hamming distance as the branch metric and a
/// bounded-memory sliding-window traceback.
///
/// Polynomial notation: each `poly[j]` is a `K`-bit mask with the MSB the
/// current input bit and the LSB the oldest bit still in the encoder's
/// shift register.
pub struct Viterbi {
    k: usize,
    n: usize,
    state_count: usize,
    trellis_length: usize,
    code_mask: u32,
    constraint_mask: usize,
    code_dict: Vec<u32>,
    trellis: Vec<Vec<Node>>,
    sequence: Vec<u8>,
    p: usize,
    best: usize,
}

impl Viterbi {
    pub fn new(k: usize, poly: &[u32]) -> Result<Self> {
        if k == 0 {
            return Err(Error::ConstraintLengthTooSmall);
        }
        if k > MAX_K {
            return Err(Error::ConstraintLengthTooLarge { k });
        }
        if poly.is_empty() {
            return Err(Error::EmptyPolynomialList);
        }
        if poly.len() > MAX_N {
            return Err(Error::OutputCountTooLarge { n: poly.len() });
        }

        let n = poly.len();
        let state_count = 1usize << (k - 1);
        let code_mask = (1u32 << n) - 1;
        let constraint_mask = state_count - 1;
        let trellis_length = k * TRELLIS_WINDOW;

        let mut code_dict = vec![0u32; 2 * state_count];
        for (s, entry) in code_dict.iter_mut().enumerate() {
            let s = s as u32;
            let mut code = 0u32;
            for (j, &p) in poly.iter().enumerate() {
                let bit = (p & s).count_ones() & 1;
                code |= bit << (n - 1 - j);
            }
            *entry = code;
        }

        let mut trellis = vec![vec![Node { prev: 0, path_dist: INFINITY }; trellis_length]; state_count];
        for (i, row) in trellis.iter_mut().enumerate() {
            row[0].path_dist = if i == 0 { 0 } else { INFINITY };
        }

        tracing::debug!(
            "constructed Viterbi decoder: k={} n={} states={} trellis_length={}",
            k,
            n,
            state_count,
            trellis_length
        );

        Ok(Viterbi {
            k,
            n,
            state_count,
            trellis_length,
            code_mask,
            constraint_mask,
            code_dict,
            trellis,
            sequence: vec![0u8; trellis_length],
            p: 0,
            best: 0,
        })
    }

    pub fn constraint_length(&self) -> usize {
        self.k
    }

    pub fn output_count(&self) -> usize {
        self.n
    }

    /// Feed one codeword (the low `n` bits are used; higher bits are
    /// masked off). Advances the sliding window and, every
    /// `trellis_length` codewords, performs a traceback and invokes
    /// `sink.on_data` with the emitted block.
    pub fn feed<S: DecodedBlockSink>(&mut self, codeword: u32, sink: &mut S) -> Result<()> {
        let codeword = codeword & self.code_mask;

        self.p += 1;
        if self.p == self.trellis_length {
            self.traceback_and_emit(sink)?;
        }

        self.add_compare_select(codeword);

        Ok(())
    }

    fn traceback_and_emit<S: DecodedBlockSink>(&mut self, sink: &mut S) -> Result<()> {
        let mut prev = self.best as u32;
        let mut t = self.p;
        loop {
            t -= 1;
            prev = self.trellis[prev as usize & self.constraint_mask][t].prev;
            self.sequence[t] = ((prev >> (self.k - 1)) & 1) as u8;
            if t == 0 {
                break;
            }
        }

        for (i, row) in self.trellis.iter_mut().enumerate() {
            row[0].path_dist = if i == self.best { 0 } else { INFINITY };
        }
        self.trellis[self.best][0].prev = self.trellis[self.best][self.trellis_length - 1].prev;

        let errors = self.trellis[self.best][self.trellis_length - 1].path_dist;
        let emitted = &self.sequence[0..self.trellis_length - 1];

        tracing::trace!("traceback emitted {} bits with {} errors", emitted.len(), errors);

        if !sink.on_data(emitted, errors) {
            return Err(Error::DecoderAborted);
        }

        self.p = 1;
        Ok(())
    }

    fn add_compare_select(&mut self, codeword: u32) {
        let mut min_path_dist = INFINITY;
        let mut best = self.best;

        for i in 0..self.state_count {
            let prev0 = (i << 1) as u32;
            let prev1 = prev0 | 1;

            let d0 = (self.code_dict[prev0 as usize] ^ codeword).count_ones();
            let pd0_prior = self.trellis[prev0 as usize & self.constraint_mask][self.p - 1].path_dist;
            let pd0 = if pd0_prior == INFINITY { INFINITY } else { pd0_prior + d0 };

            let d1 = (self.code_dict[prev1 as usize] ^ codeword).count_ones();
            let pd1_prior = self.trellis[prev1 as usize & self.constraint_mask][self.p - 1].path_dist;
            let pd1 = if pd1_prior == INFINITY { INFINITY } else { pd1_prior + d1 };

            // On a tie the branch from prev1 wins.
            let (path_dist, prev) = if pd1 <= pd0 { (pd1, prev1) } else { (pd0, prev0) };

            self.trellis[i][self.p].path_dist = path_dist;
            self.trellis[i][self.p].prev = prev;

            if path_dist < min_path_dist {
                min_path_dist = path_dist;
                best = i;
            }
        }

        self.best = best;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Collector {
        bits: Vec<u8>,
        errors: Vec<u32>,
    }

    impl Collector {
        fn new() -> Self {
            Collector { bits: Vec::new(), errors: Vec::new() }
        }
    }

    impl DecodedBlockSink for Collector {
        fn on_data(&mut self, bits: &[u8], errors: u32) -> bool {
            self.bits.extend_from_slice(bits);
            self.errors.push(errors);
            true
        }
    }

    /// Reference encoder for a rate-1/n code with the same "MSB = current
    /// input bit, LSB = oldest bit" register convention the decoder's
    /// `code_dict` assumes: at each step the augmented K-bit register is
    /// `(bit << (K-1)) | state`, and the new state drops the oldest bit by
    /// shifting right.
    fn encode(poly: &[u32], k: usize, bits: &[u8]) -> Vec<u32> {
        let mut state = 0u32;
        bits.iter()
            .map(|&b| {
                let aug = ((b as u32) << (k - 1)) | state;
                let mut code = 0u32;
                for (j, &p) in poly.iter().enumerate() {
                    let bit = (p & aug).count_ones() & 1;
                    code |= bit << (poly.len() - 1 - j);
                }
                state = aug >> 1;
                code
            })
            .collect()
    }

    #[test]
    fn rejects_oversized_constraint_length() {
        assert_eq!(
            Viterbi::new(11, &[7, 5]).unwrap_err(),
            Error::ConstraintLengthTooLarge { k: 11 }
        );
    }

    #[test]
    fn rejects_too_many_outputs() {
        let poly: Vec<u32> = (0..17).collect();
        assert_eq!(
            Viterbi::new(3, &poly).unwrap_err(),
            Error::OutputCountTooLarge { n: 17 }
        );
    }

    #[test]
    fn identity_decode_with_no_noise() {
        let poly = [0b111u32, 0b101u32];
        let k = 3;
        let input = [1u8, 0, 1, 1, 0, 0, 0];
        let codewords = encode(&poly, k, &input);

        let mut decoder = Viterbi::new(k, &poly).unwrap();
        let mut sink = Collector::new();
        for &cw in &codewords {
            decoder.feed(cw, &mut sink).unwrap();
        }

        // Trellis flushes at K*5 = 15 codewords; this stream is shorter, so
        // nothing has emitted yet, exercising the "no terminal state" rule.
        assert!(sink.bits.is_empty());
    }

    #[test]
    fn full_window_round_trip_with_no_errors() {
        let poly = [0b111u32, 0b101u32];
        let k = 3;
        let trellis_length = k * TRELLIS_WINDOW;

        use rand::Rng;
        let mut rng = rand::rng();
        let input: Vec<u8> = (0..trellis_length * 2).map(|_| rng.random_range(0..=1u8)).collect();
        let codewords = encode(&poly, k, &input);

        let mut decoder = Viterbi::new(k, &poly).unwrap();
        let mut sink = Collector::new();
        for &cw in &codewords {
            decoder.feed(cw, &mut sink).unwrap();
        }

        assert!(!sink.bits.is_empty());
        assert_eq!(sink.errors[0], 0);
        assert_eq!(&sink.bits[0..trellis_length - 1], &input[0..trellis_length - 1]);
    }

    #[test]
    fn single_bit_flip_is_corrected_with_errors_one() {
        let poly = [0b111u32, 0b101u32];
        let k = 3;
        let trellis_length = k * TRELLIS_WINDOW;
        let input: Vec<u8> = vec![1, 0, 1, 1, 0, 1, 0, 0, 1, 1, 0, 0, 1, 0, 1, 1, 0, 1, 0, 0];
        let mut codewords = encode(&poly, k, &input);

        // Flip one bit of codeword index 3, leaving its neighbors intact.
        codewords[3] ^= 0b01;

        let mut decoder = Viterbi::new(k, &poly).unwrap();
        let mut sink = Collector::new();
        for &cw in &codewords {
            decoder.feed(cw, &mut sink).unwrap();
        }

        assert_eq!(sink.errors[0], 1);
        assert_eq!(&sink.bits[0..trellis_length - 1], &input[0..trellis_length - 1]);
    }

    #[test]
    fn abort_from_sink_propagates_as_error() {
        struct Refuser;
        impl DecodedBlockSink for Refuser {
            fn on_data(&mut self, _bits: &[u8], _errors: u32) -> bool {
                false
            }
        }

        let poly = [0b111u32, 0b101u32];
        let k = 3;
        let trellis_length = k * TRELLIS_WINDOW;
        let input: Vec<u8> = (0..trellis_length).map(|i| (i % 2) as u8).collect();
        let codewords = encode(&poly, k, &input);

        let mut decoder = Viterbi::new(k, &poly).unwrap();
        let mut sink = Refuser;
        let mut result = Ok(());
        for &cw in &codewords {
            result = decoder.feed(cw, &mut sink);
            if result.is_err() {
                break;
            }
        }

        assert_eq!(result, Err(Error::DecoderAborted));
    }
}
