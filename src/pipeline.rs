//! Per-frame orchestration of the ocean pipeline.
//!
//! One run walks a fixed sequence of stages. Each stage consumes only
//! values the previous stage returned, and every transition is checked
//! against [`PipelineStage::next`], so a downstream stage cannot start on
//! missing inputs.

use std::sync::Arc;

use glam::Vec3;

use crate::cache::SpectrumCache;
use crate::dispatch::{DefaultDispatcher, Dispatcher};
use crate::error::{OceanError, Result};
use crate::evolve::TimeEvolver;
use crate::fft::FftEngine;
use crate::grid::{NormalGrid, RealGrid, Resolution};
use crate::inversion::Inversion;
use crate::params::{FoamParameters, SpectrumParameters};
use crate::surface::{compute_foam, compute_normals};

/// Stage of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    BuildingTables,
    EvolvingSpectrum,
    RunningFft,
    Inverting,
    ComputingDerived,
    Done,
}

impl PipelineStage {
    pub fn name(self) -> &'static str {
        match self {
            PipelineStage::Idle => "Idle",
            PipelineStage::BuildingTables => "BuildingTables",
            PipelineStage::EvolvingSpectrum => "EvolvingSpectrum",
            PipelineStage::RunningFft => "RunningFft",
            PipelineStage::Inverting => "Inverting",
            PipelineStage::ComputingDerived => "ComputingDerived",
            PipelineStage::Done => "Done",
        }
    }

    /// The only stage allowed to follow this one
    pub fn next(self) -> PipelineStage {
        match self {
            PipelineStage::Idle => PipelineStage::BuildingTables,
            PipelineStage::BuildingTables => PipelineStage::EvolvingSpectrum,
            PipelineStage::EvolvingSpectrum => PipelineStage::RunningFft,
            PipelineStage::RunningFft => PipelineStage::Inverting,
            PipelineStage::Inverting => PipelineStage::ComputingDerived,
            PipelineStage::ComputingDerived => PipelineStage::Done,
            PipelineStage::Done => PipelineStage::Idle,
        }
    }

    /// Move to `to`, failing if it is not the successor of `self`
    pub fn advance(&mut self, to: PipelineStage) -> Result<()> {
        let expected = self.next();
        if to != expected {
            return Err(OceanError::PipelineOrdering {
                expected: expected.name(),
                found: to.name(),
            });
        }
        log::debug!("pipeline: {} -> {}", self.name(), to.name());
        *self = to;
        Ok(())
    }
}

/// Spatial output of one pipeline run
///
/// Ownership passes to the caller; nothing here is retained by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplacementField {
    pub resolution: Resolution,
    pub x: RealGrid,
    pub y: RealGrid,
    pub z: RealGrid,
    pub normals: NormalGrid,
    pub foam: RealGrid,
    pub time_s: f32,
}

impl DisplacementField {
    /// RGBA32F layout: (X, Y, Z, foam) per cell
    pub fn packed_displacement(&self) -> Vec<[f32; 4]> {
        self.x
            .iter()
            .zip(self.y.iter())
            .zip(self.z.iter())
            .zip(self.foam.iter())
            .map(|(((&x, &y), &z), &foam)| [x, y, z, foam])
            .collect()
    }

    /// RGBA32F layout: (nx, ny, nz, 0) per cell
    pub fn packed_normals(&self) -> Vec<[f32; 4]> {
        self.normals
            .iter()
            .map(|n| n.extend(0.0).to_array())
            .collect()
    }

    pub fn normal(&self, x: usize, y: usize) -> Vec3 {
        *self.normals.get(x, y)
    }

    /// No NaN or infinity in any grid
    pub fn is_finite(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.z.is_finite()
            && self.normals.is_finite()
            && self.foam.is_finite()
    }
}

/// Explicitly owned ocean pipeline
///
/// The cache is shared through an `Arc`, so several pipelines (or a worker
/// thread and the caller) can reuse the same tables.
pub struct OceanPipeline<D: Dispatcher = DefaultDispatcher> {
    cache: Arc<SpectrumCache<D>>,
    foam: FoamParameters,
    stage: PipelineStage,
}

impl Default for OceanPipeline<DefaultDispatcher> {
    fn default() -> Self {
        Self::new(Arc::new(SpectrumCache::default()))
    }
}

impl<D: Dispatcher> OceanPipeline<D> {
    pub fn new(cache: Arc<SpectrumCache<D>>) -> Self {
        Self {
            cache,
            foam: FoamParameters::default(),
            stage: PipelineStage::Idle,
        }
    }

    pub fn with_foam(mut self, foam: FoamParameters) -> Self {
        self.foam = foam;
        self
    }

    pub fn cache(&self) -> &Arc<SpectrumCache<D>> {
        &self.cache
    }

    pub fn foam(&self) -> &FoamParameters {
        &self.foam
    }

    /// Stage reached by the last run (`Done` after success, `Idle` after an error)
    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    /// Run the full chain for `params` at time `t`
    ///
    /// Parameters are validated before any table or buffer is allocated.
    pub fn compute_displacement(
        &mut self,
        params: &SpectrumParameters,
        t: f32,
    ) -> Result<DisplacementField> {
        let result = self.run(params, t);
        if result.is_err() {
            self.stage = PipelineStage::Idle;
        }
        result
    }

    fn run(&mut self, params: &SpectrumParameters, t: f32) -> Result<DisplacementField> {
        let resolution = params.validate()?;
        if !t.is_finite() {
            return Err(OceanError::InvalidParameter {
                name: "time_s",
                value: t,
            });
        }
        if self.stage == PipelineStage::Done {
            self.stage.advance(PipelineStage::Idle)?;
        }

        let dispatcher = self.cache.dispatcher();

        self.stage.advance(PipelineStage::BuildingTables)?;
        let butterflies = self.cache.get_or_build_butterfly(resolution.n())?;
        let spectrum = self.cache.get_or_build_spectrum(params)?;

        self.stage.advance(PipelineStage::EvolvingSpectrum)?;
        let components = TimeEvolver::new(dispatcher).evolve(&spectrum, params, t)?;

        self.stage.advance(PipelineStage::RunningFft)?;
        let engine = FftEngine::new(dispatcher);
        let [fx, fy, fz] = components.into_components();
        let fx = engine.inverse_fft_2d(fx, &butterflies)?;
        let fy = engine.inverse_fft_2d(fy, &butterflies)?;
        let fz = engine.inverse_fft_2d(fz, &butterflies)?;

        self.stage.advance(PipelineStage::Inverting)?;
        let inversion = Inversion::new(dispatcher);
        let x = inversion.invert(&fx, resolution)?;
        let y = inversion.invert(&fy, resolution)?;
        let z = inversion.invert(&fz, resolution)?;

        self.stage.advance(PipelineStage::ComputingDerived)?;
        let cell_size_m = params.patch_length_m / resolution.n() as f32;
        let normals = compute_normals(dispatcher, &x, &z, cell_size_m)?;
        let foam = compute_foam(dispatcher, &normals, &self.foam);

        self.stage.advance(PipelineStage::Done)?;
        log::debug!("computed {}x{} displacement at t={:.3}s", resolution, resolution, t);

        Ok(DisplacementField {
            resolution,
            x,
            y,
            z,
            normals,
            foam,
            time_s: t,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::SerialDispatcher;
    use glam::Vec2;

    fn pipeline() -> OceanPipeline<SerialDispatcher> {
        OceanPipeline::new(Arc::new(SpectrumCache::new(SerialDispatcher)))
    }

    fn params(n: usize) -> SpectrumParameters {
        SpectrumParameters {
            resolution: n,
            patch_length_m: 100.0,
            amplitude: 1.0,
            wind_direction: Vec2::new(1.0, 0.0),
            wind_speed_m_per_s: 10.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_stage_order() {
        let mut stage = PipelineStage::Idle;
        for next in [
            PipelineStage::BuildingTables,
            PipelineStage::EvolvingSpectrum,
            PipelineStage::RunningFft,
            PipelineStage::Inverting,
            PipelineStage::ComputingDerived,
            PipelineStage::Done,
        ] {
            stage.advance(next).unwrap();
        }
        assert_eq!(stage, PipelineStage::Done);
    }

    #[test]
    fn test_skipping_a_stage_is_rejected() {
        let mut stage = PipelineStage::BuildingTables;
        let err = stage.advance(PipelineStage::RunningFft).unwrap_err();
        assert!(matches!(
            err,
            OceanError::PipelineOrdering {
                expected: "EvolvingSpectrum",
                found: "RunningFft"
            }
        ));
        assert_eq!(stage, PipelineStage::BuildingTables);
    }

    #[test]
    fn test_compute_reaches_done() {
        let mut pipeline = pipeline();
        let field = pipeline.compute_displacement(&params(8), 0.0).unwrap();
        assert_eq!(pipeline.stage(), PipelineStage::Done);
        assert_eq!(field.resolution.n(), 8);
        assert!(field.is_finite());

        // a second run starts over from Idle
        pipeline.compute_displacement(&params(8), 0.5).unwrap();
        assert_eq!(pipeline.stage(), PipelineStage::Done);
    }

    #[test]
    fn test_error_resets_to_idle() {
        let mut pipeline = pipeline();
        pipeline.compute_displacement(&params(8), 0.0).unwrap();
        assert!(pipeline.compute_displacement(&params(8), f32::INFINITY).is_err());
        assert_eq!(pipeline.stage(), PipelineStage::Idle);
    }

    #[test]
    fn test_height_is_zero_mean() {
        let mut pipeline = pipeline();
        let field = pipeline.compute_displacement(&params(16), 2.0).unwrap();
        let (low, high) = field.y.range();
        let scale = 1.0 + low.abs().max(high.abs());
        assert!(field.y.mean().abs() < 1e-4 * scale);
    }

    #[test]
    fn test_normals_come_from_horizontal_displacement() {
        let mut pipeline = pipeline();
        let params = params(8);
        let field = pipeline.compute_displacement(&params, 0.4).unwrap();
        let cell_size = params.patch_length_m / 8.0;
        let expected = compute_normals(&SerialDispatcher, &field.x, &field.z, cell_size).unwrap();
        assert_eq!(field.normals, expected);

        let foam = compute_foam(&SerialDispatcher, &expected, pipeline.foam());
        assert_eq!(field.foam, foam);
    }

    #[test]
    fn test_packed_layouts() {
        let mut pipeline = pipeline();
        let field = pipeline.compute_displacement(&params(4), 0.25).unwrap();

        let texels = field.packed_displacement();
        assert_eq!(texels.len(), 16);
        assert_eq!(texels[5], [
            *field.x.get(1, 1),
            *field.y.get(1, 1),
            *field.z.get(1, 1),
            *field.foam.get(1, 1),
        ]);

        let normals = field.packed_normals();
        let n = field.normal(2, 3);
        assert_eq!(normals[3 * 4 + 2], [n.x, n.y, n.z, 0.0]);
    }
}
