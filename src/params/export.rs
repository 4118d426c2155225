//! Frame export and simulation clock configuration.

use std::path::PathBuf;

/// Offline export configuration (frames written as PNG maps)
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Output directory for frame maps
    pub output_dir: PathBuf,

    /// Number of frames to simulate and export
    pub frames: usize,

    /// Simulation time advanced per frame (seconds)
    pub time_step_s: f32,
}

impl ExportConfig {
    pub fn new(output_dir: impl Into<PathBuf>, frames: usize) -> Self {
        Self {
            output_dir: output_dir.into(),
            frames,
            time_step_s: 0.003,
        }
    }

    /// File path for one map of one frame, e.g. `out/height_0003.png`
    pub fn frame_path(&self, map: &str, frame: usize) -> PathBuf {
        self.output_dir.join(format!("{}_{:04}.png", map, frame))
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self::new("ocean_frames", 1)
    }
}
