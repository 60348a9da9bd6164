//! LFSR sequence generation, FFT-based circular cross-correlation, polynomial
//! recovery and scrambler/descrambler bit transforms.

mod correlator;
mod descrambler;
mod descriptor;
mod error;
mod hits;
mod lfsr;
mod library;

pub use correlator::{Candidate, Correlator};
pub use descrambler::Descrambler;
pub use descriptor::LfsrDescriptor;
pub use error::{Error, Result};
pub use hits::{HitAggregator, LfsrHit, OffsetHit};
pub use lfsr::{LfsrCore, MAX_TAP};
pub use library::PolyLibrary;
