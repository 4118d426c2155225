//! Handing finished displacement fields to presentation targets.

use std::fs;

use image::{GrayImage, Luma, Rgb, RgbImage};

use crate::error::Result;
use crate::grid::RealGrid;
use crate::params::ExportConfig;
use crate::pipeline::DisplacementField;

/// Destination for finished frames (texture upload, file export, ...)
pub trait PresentationTarget {
    fn present(&mut self, field: &DisplacementField) -> Result<()>;
}

/// Keeps the latest frame as packed RGBA32F texels, ready for upload
#[derive(Debug, Default)]
pub struct TexelTarget {
    displacement: Vec<[f32; 4]>,
    normals: Vec<[f32; 4]>,
    frames: usize,
}

impl TexelTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// (X, Y, Z, foam) per cell
    pub fn displacement(&self) -> &[[f32; 4]] {
        &self.displacement
    }

    pub fn normals(&self) -> &[[f32; 4]] {
        &self.normals
    }

    /// Raw bytes of the displacement texels (16 bytes per cell)
    pub fn displacement_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.displacement)
    }

    pub fn normal_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.normals)
    }

    /// Frames presented so far
    pub fn frames(&self) -> usize {
        self.frames
    }
}

impl PresentationTarget for TexelTarget {
    fn present(&mut self, field: &DisplacementField) -> Result<()> {
        self.displacement = field.packed_displacement();
        self.normals = field.packed_normals();
        self.frames += 1;
        Ok(())
    }
}

/// Writes height, normal and foam maps as PNGs, one set per frame
pub struct PngExporter {
    config: ExportConfig,
    frame: usize,
}

impl PngExporter {
    /// Create the exporter, making the output directory if needed
    pub fn new(config: ExportConfig) -> Result<Self> {
        fs::create_dir_all(&config.output_dir)?;
        Ok(Self { config, frame: 0 })
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Index the next presented frame will be written under
    pub fn frame(&self) -> usize {
        self.frame
    }
}

/// Map a real grid linearly onto 0..=255 using its own range
fn grayscale(grid: &RealGrid) -> GrayImage {
    let n = grid.n() as u32;
    let (min, max) = grid.range();
    let span = max - min;
    GrayImage::from_fn(n, n, |x, y| {
        let value = *grid.get(x as usize, y as usize);
        let t = if span > f32::EPSILON {
            (value - min) / span
        } else {
            0.5
        };
        Luma([(t * 255.0).clamp(0.0, 255.0) as u8])
    })
}

impl PresentationTarget for PngExporter {
    fn present(&mut self, field: &DisplacementField) -> Result<()> {
        let n = field.resolution.n() as u32;

        grayscale(&field.y).save(self.config.frame_path("height", self.frame))?;

        // Map normal components from [-1, 1] to [0, 255]
        let normals = RgbImage::from_fn(n, n, |x, y| {
            let normal = field.normal(x as usize, y as usize);
            let channel = |c: f32| ((c + 1.0) * 127.5).clamp(0.0, 255.0) as u8;
            Rgb([channel(normal.x), channel(normal.y), channel(normal.z)])
        });
        normals.save(self.config.frame_path("normals", self.frame))?;

        let foam = GrayImage::from_fn(n, n, |x, y| {
            let value = *field.foam.get(x as usize, y as usize);
            Luma([(value * 255.0).clamp(0.0, 255.0) as u8])
        });
        foam.save(self.config.frame_path("foam", self.frame))?;

        log::debug!(
            "exported frame {} to {}",
            self.frame,
            self.config.output_dir.display()
        );
        self.frame += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::SpectrumCache;
    use crate::dispatch::SerialDispatcher;
    use crate::grid::Resolution;
    use crate::params::SpectrumParameters;
    use crate::pipeline::OceanPipeline;
    use std::sync::Arc;

    fn field(n: usize) -> DisplacementField {
        let params = SpectrumParameters {
            resolution: n,
            patch_length_m: 100.0,
            ..Default::default()
        };
        OceanPipeline::new(Arc::new(SpectrumCache::new(SerialDispatcher)))
            .compute_displacement(&params, 0.0)
            .unwrap()
    }

    #[test]
    fn test_texel_target_packs_bytes() {
        let mut target = TexelTarget::new();
        target.present(&field(8)).unwrap();
        assert_eq!(target.frames(), 1);
        assert_eq!(target.displacement().len(), 64);
        assert_eq!(target.displacement_bytes().len(), 64 * 16);
        assert_eq!(target.normal_bytes().len(), 64 * 16);
    }

    #[test]
    fn test_grayscale_spans_full_range() {
        let grid = RealGrid::from_fn(Resolution::new(4).unwrap(), |x, _| x as f32);
        let img = grayscale(&grid);
        assert_eq!(img.get_pixel(0, 0)[0], 0);
        assert_eq!(img.get_pixel(3, 0)[0], 255);

        let flat = RealGrid::filled(Resolution::new(4).unwrap(), 2.0);
        assert_eq!(grayscale(&flat).get_pixel(1, 1)[0], 127);
    }

    #[test]
    fn test_png_exporter_writes_maps() {
        let dir = std::env::temp_dir().join(format!("swellfft_export_{}", std::process::id()));
        let mut exporter = PngExporter::new(ExportConfig::new(&dir, 1)).unwrap();
        exporter.present(&field(4)).unwrap();

        for map in ["height", "normals", "foam"] {
            assert!(exporter.config().frame_path(map, 0).exists());
        }
        assert_eq!(exporter.frame(), 1);
        let _ = fs::remove_dir_all(&dir);
    }
}
