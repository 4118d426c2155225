//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;
use glam::Vec2;

use swellfft::{ExportConfig, FoamParameters, SpectrumParameters};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "swellfft")]
#[command(about = "Render tileable FFT ocean frames to PNG maps", long_about = None)]
pub struct Args {
    /// Grid resolution N (power of two)
    #[arg(long, value_name = "N", default_value_t = 256)]
    pub resolution: usize,

    /// Number of frames to simulate and export
    #[arg(long, default_value_t = 1)]
    pub frames: usize,

    /// Output directory for height/normal/foam maps
    #[arg(long, value_name = "DIR", default_value = "ocean_frames")]
    pub output: PathBuf,

    /// Patch side length (meters)
    #[arg(long, value_name = "METERS", default_value_t = 1000.0)]
    pub patch_length: f32,

    /// Phillips amplitude scalar
    #[arg(long, default_value_t = 4.0)]
    pub amplitude: f32,

    /// Wind direction X component
    #[arg(long, default_value_t = 1.0, allow_hyphen_values = true)]
    pub wind_x: f32,

    /// Wind direction Z component
    #[arg(long, default_value_t = 1.0, allow_hyphen_values = true)]
    pub wind_z: f32,

    /// Wind speed (m/s)
    #[arg(long, value_name = "M_PER_S", default_value_t = 40.0)]
    pub wind_speed: f32,

    /// Horizontal displacement scale
    #[arg(long, default_value_t = 1.0)]
    pub choppiness: f32,

    /// Noise seed for spectrum phases
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Simulation time per frame (seconds)
    #[arg(long, value_name = "SECONDS", default_value_t = 0.003)]
    pub time_step: f32,

    /// Foam gain applied to normal divergence
    #[arg(long, default_value_t = 10.0)]
    pub foam_intensity: f32,

    /// Run kernels on the calling thread instead of the rayon pool
    #[arg(long)]
    pub serial: bool,
}

impl Args {
    pub fn spectrum_parameters(&self) -> SpectrumParameters {
        SpectrumParameters {
            resolution: self.resolution,
            patch_length_m: self.patch_length,
            amplitude: self.amplitude,
            wind_direction: Vec2::new(self.wind_x, self.wind_z),
            wind_speed_m_per_s: self.wind_speed,
            choppiness: self.choppiness,
            small_wave_cutoff_m: self.patch_length / 2000.0,
            noise_seed: self.seed,
        }
    }

    pub fn foam_parameters(&self) -> FoamParameters {
        FoamParameters {
            intensity: self.foam_intensity,
            ..Default::default()
        }
    }

    pub fn export_config(&self) -> ExportConfig {
        ExportConfig {
            time_step_s: self.time_step,
            ..ExportConfig::new(&self.output, self.frames)
        }
    }
}
