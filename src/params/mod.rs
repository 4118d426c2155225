//! Parameter definitions with physical units and documented semantics.
//!
//! Every tunable number lives here with:
//! - Physical units (meters, seconds, m/s)
//! - Documented ranges and meanings
//! - `Default` values matching the reference ocean setup

mod export;
mod ocean;

// Re-export all types
pub use export::ExportConfig;
pub use ocean::{FoamParameters, SpectrumKey, SpectrumParameters, GRAVITY_M_PER_S2};
