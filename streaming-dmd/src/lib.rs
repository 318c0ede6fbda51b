//! # streaming-dmd
//!
//! Dynamic Mode Decomposition of snapshot sequences, in batch and
//! streaming form.
//!
//! - **Batch DMD** ([`dmd()`]): truncated SVD of X, reduced operator
//!   Ã = Uᵀ Y V Σ⁻¹, exact or projected modes
//! - **Streaming DMD** ([`StreamingDmd`]): one snapshot pair per update with
//!   memory bounded by the basis rank; modes and eigenvalues on demand
//! - **Analysis** ([`dmd_spectrum`], [`compare_spectra`]): frequencies,
//!   growth rates, mode power, spectrum comparison
//! - **Prediction** ([`predict_modes`]): forward evolution from an initial state
//! - **Signals** ([`Oscillator`]): seeded two-frequency test system
//!
//! ## Quick Start
//!
//! ```rust
//! use streaming_dmd::{compare_spectra, dmd, signals, DmdConfig, Oscillator, StreamingConfig, StreamingDmd};
//!
//! // Batch
//! let (x, y) = signals::collect_pairs(Oscillator::new(50, 0.01, 0).snapshots(101, 0.0)).unwrap();
//! let batch = dmd(&x, &y, &DmdConfig::default()).unwrap();
//!
//! // Streaming, same data
//! let mut sdmd = StreamingDmd::new(StreamingConfig::default());
//! for (x, y) in signals::pairs(Oscillator::new(50, 0.01, 0).snapshots(101, 0.0)) {
//!     sdmd.update(&x, &y).unwrap();
//! }
//! let streaming = sdmd.compute_modes().unwrap();
//!
//! assert_eq!(batch.rank, 4);
//! assert!(compare_spectra(&batch.eigenvalues, &streaming.eigenvalues, 1e-6).all_close);
//! ```
//!
//! ## References
//!
//! - Schmid (2010), *J. Fluid Mech.*, 656, 5-28
//! - Tu et al. (2014), *J. Comput. Dyn.*, 1(2), 391-421
//! - Hemati, Williams & Rowley (2014), *Phys. Fluids*, 26, 111701

pub mod types;

pub mod analysis;
pub mod dmd;
pub mod predict;
pub mod signals;
pub mod streaming;
pub mod utils;

pub use analysis::{
    compare_spectra, dmd_dominant_modes, dmd_spectrum, dmd_stability, mode_powers,
    sort_eigenvalues, DEFAULT_STABILITY_TOL,
};
pub use dmd::{dmd, dmd_basis, dmd_snapshots};
pub use predict::{dmd_amplitudes, predict_modes};
pub use signals::Oscillator;
pub use streaming::{StreamingConfig, StreamingDmd, MAX_GRAM_PASSES};
pub use types::{
    DmdConfig, DmdError, DmdResult, ModeInfo, RankSelection, SpectrumComparison, Stability,
    StabilityResult, C64,
};
