//! Swellfft library - Tessendorf ocean surface synthesis over a 2D FFT

pub mod cache;
pub mod clock;
pub mod dispatch;
pub mod error;
pub mod evolve;
pub mod fft;
pub mod grid;
pub mod inversion;
pub mod noise;
pub mod params;
pub mod pipeline;
pub mod present;
pub mod spectrum;
pub mod surface;
pub mod worker;

pub use cache::SpectrumCache;
pub use error::{OceanError, Result};
pub use grid::Resolution;
pub use params::{ExportConfig, FoamParameters, SpectrumParameters};
pub use pipeline::{DisplacementField, OceanPipeline, PipelineStage};
pub use worker::{PendingDisplacement, PipelineWorker};
