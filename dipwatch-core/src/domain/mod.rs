//! Domain types for DipWatch

pub mod bar;
pub mod signal;

pub use bar::{normalize_series, Bar};
pub use signal::{Decision, Headline, Recommendation, SignalBundle};

/// Symbol type alias
pub type Symbol = String;
