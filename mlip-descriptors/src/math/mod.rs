//! Basis functions used to build single-bond descriptors: radial basis,
//! smooth cutoff functions and real spherical harmonics.

mod cutoff;
pub use self::cutoff::CutoffFunction;

mod radial;
pub use self::radial::RadialBasis;

mod spherical_harmonics;
pub use self::spherical_harmonics::{SphericalHarmonics, lm_index};
