use crate::descriptor::LfsrDescriptor;

/// Hit count for one offset of one polynomial.
#[derive(Clone, Copy, Debug)]
pub struct OffsetHit {
    pub offset: usize,
    pub hit_count: u32,
}

/// All hits recorded so far for one polynomial, across every frame
/// processed.
pub struct LfsrHit<'lib> {
    pub desc: &'lib LfsrDescriptor,
    pub total_hits: u32,
    pub offsets: Vec<OffsetHit>,
    pub max_offset_hits: u32,
}

impl<'lib> LfsrHit<'lib> {
    /// First offset (in the order it was first observed) whose hit count
    /// equals this polynomial's maximum — the tie-break this repo uses
    /// when several offsets are equally likely.
    pub fn best_offset(&self) -> Option<usize> {
        self.offsets
            .iter()
            .find(|o| o.hit_count == self.max_offset_hits)
            .map(|o| o.offset)
    }
}

/// Accumulates per-polynomial, per-offset hit counts across multiple
/// correlator frames and selects a winning polynomial and offset.
///
/// Polynomials are compared by identity (the same [`LfsrDescriptor`]
/// reference, borrowed from the library), never by value, so two distinct
/// descriptors that happen to share taps are tracked separately.
#[derive(Default)]
pub struct HitAggregator<'lib> {
    hits: Vec<LfsrHit<'lib>>,
}

impl<'lib> HitAggregator<'lib> {
    pub fn new() -> Self {
        HitAggregator { hits: Vec::new() }
    }

    /// Record one hit for `desc` at `phase`, unless the polynomial's cycle
    /// is too short (< 16) to be a meaningful scrambler candidate.
    pub fn record(&mut self, desc: &'lib LfsrDescriptor, phase: u64) {
        if desc.cycle_length() < 16 {
            return;
        }

        let offset = phase as usize;
        let hit = match self.hits.iter_mut().position(|h| std::ptr::eq(h.desc, desc)) {
            Some(idx) => &mut self.hits[idx],
            None => {
                self.hits.push(LfsrHit {
                    desc,
                    total_hits: 0,
                    offsets: Vec::new(),
                    max_offset_hits: 0,
                });
                self.hits.last_mut().unwrap()
            }
        };

        match hit.offsets.iter_mut().find(|o| o.offset == offset) {
            Some(o) => o.hit_count += 1,
            None => hit.offsets.push(OffsetHit { offset, hit_count: 1 }),
        }

        hit.total_hits += 1;
        let count = hit.offsets.iter().find(|o| o.offset == offset).unwrap().hit_count;
        if count > hit.max_offset_hits {
            hit.max_offset_hits = count;
        }
    }

    /// All polynomials that ever received a hit, in first-seen order.
    pub fn hits(&self) -> &[LfsrHit<'lib>] {
        &self.hits
    }

    /// The polynomial with the greatest `max_offset_hits`; ties broken by
    /// earliest insertion order.
    pub fn winner(&self) -> Option<&LfsrHit<'lib>> {
        let mut best: Option<&LfsrHit<'lib>> = None;
        for hit in &self.hits {
            let replace = match best {
                None => true,
                Some(b) => hit.max_offset_hits > b.max_offset_hits,
            };
            if replace {
                best = Some(hit);
            }
        }
        best
    }
}
