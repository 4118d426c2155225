//! Ocean spectrum parameters and derived-field tuning.

use glam::Vec2;

use crate::error::{OceanError, Result};
use crate::grid::Resolution;

/// Gravitational acceleration used by the Phillips envelope and the
/// deep-water dispersion relation (m/s²)
pub const GRAVITY_M_PER_S2: f32 = 9.81;

/// Statistical ocean-spectrum parameters
///
/// Any change to these fields invalidates the cached initial spectrum.
/// Only a change of `resolution` invalidates the cached butterfly table.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumParameters {
    /// Grid resolution N (cells per side, power of two >= 2)
    pub resolution: usize,

    /// Side length of the tileable ocean patch (meters)
    pub patch_length_m: f32,

    /// Phillips amplitude scalar A (dimensionless)
    pub amplitude: f32,

    /// Wind direction in the XZ plane (normalized internally)
    pub wind_direction: Vec2,

    /// Wind speed (meters per second), sets the largest wave L = V²/g
    pub wind_speed_m_per_s: f32,

    /// Horizontal displacement scale λ (0 = pure height field)
    pub choppiness: f32,

    /// Waves shorter than this are damped by exp(-k²ℓ²) (meters)
    pub small_wave_cutoff_m: f32,

    /// Seed for the noise grid that randomizes spectrum phases
    pub noise_seed: u64,
}

impl Default for SpectrumParameters {
    fn default() -> Self {
        Self {
            resolution: 256,
            patch_length_m: 1000.0,
            amplitude: 4.0,
            wind_direction: Vec2::new(1.0, 1.0),
            wind_speed_m_per_s: 40.0,
            choppiness: 1.0,
            small_wave_cutoff_m: 0.5, // patch_length / 2000
            noise_seed: 42,
        }
    }
}

impl SpectrumParameters {
    /// Validated resolution (fails fast before any table is built)
    pub fn resolution(&self) -> Result<Resolution> {
        Resolution::new(self.resolution)
    }

    /// Wind direction as a unit vector (zero if the input is degenerate)
    pub fn wind_unit(&self) -> Vec2 {
        self.wind_direction.normalize_or_zero()
    }

    /// Largest wave produced by a continuous wind of this speed (meters)
    pub fn largest_wave_m(&self) -> f32 {
        self.wind_speed_m_per_s * self.wind_speed_m_per_s / GRAVITY_M_PER_S2
    }

    /// Check every field, returning the validated resolution
    pub fn validate(&self) -> Result<Resolution> {
        let resolution = self.resolution()?;

        if !self.patch_length_m.is_finite() || self.patch_length_m <= 0.0 {
            return Err(OceanError::InvalidParameter {
                name: "patch_length_m",
                value: self.patch_length_m,
            });
        }
        if !self.amplitude.is_finite() || self.amplitude < 0.0 {
            return Err(OceanError::InvalidParameter {
                name: "amplitude",
                value: self.amplitude,
            });
        }
        if !self.wind_speed_m_per_s.is_finite() || self.wind_speed_m_per_s < 0.0 {
            return Err(OceanError::InvalidParameter {
                name: "wind_speed_m_per_s",
                value: self.wind_speed_m_per_s,
            });
        }
        if !self.wind_direction.is_finite() {
            return Err(OceanError::InvalidParameter {
                name: "wind_direction",
                value: self.wind_direction.length(),
            });
        }
        if !self.choppiness.is_finite() {
            return Err(OceanError::InvalidParameter {
                name: "choppiness",
                value: self.choppiness,
            });
        }
        if !self.small_wave_cutoff_m.is_finite() || self.small_wave_cutoff_m < 0.0 {
            return Err(OceanError::InvalidParameter {
                name: "small_wave_cutoff_m",
                value: self.small_wave_cutoff_m,
            });
        }

        if self.wind_unit() == Vec2::ZERO {
            log::warn!("wind direction is zero; the spectrum will be flat");
        }

        Ok(resolution)
    }

    /// Bit-exact key for the spectrum cache
    pub fn cache_key(&self) -> SpectrumKey {
        SpectrumKey {
            resolution: self.resolution,
            bits: [
                self.patch_length_m.to_bits(),
                self.amplitude.to_bits(),
                self.wind_direction.x.to_bits(),
                self.wind_direction.y.to_bits(),
                self.wind_speed_m_per_s.to_bits(),
                self.small_wave_cutoff_m.to_bits(),
            ],
            noise_seed: self.noise_seed,
        }
    }
}

/// Hashable identity of everything the initial spectrum depends on
///
/// Choppiness is applied during time evolution, so it is not part of the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpectrumKey {
    pub resolution: usize,
    bits: [u32; 6],
    pub noise_seed: u64,
}

/// Tuning for the foam proxy derived from the normal field
#[derive(Debug, Clone, PartialEq)]
pub struct FoamParameters {
    /// Gain applied to normal-field divergence above the threshold
    pub intensity: f32,

    /// Divergence below this produces no foam
    pub threshold: f32,
}

impl Default for FoamParameters {
    fn default() -> Self {
        Self {
            intensity: 10.0,
            threshold: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_parameters_validate() {
        let params = SpectrumParameters::default();
        let resolution = params.validate().unwrap();
        assert_eq!(resolution.n(), 256);
        assert_eq!(resolution.log2(), 8);
    }

    #[test]
    fn test_rejects_non_power_of_two() {
        let params = SpectrumParameters {
            resolution: 3,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(OceanError::InvalidResolution(3))
        ));
    }

    #[test]
    fn test_rejects_bad_patch_length() {
        let params = SpectrumParameters {
            patch_length_m: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(OceanError::InvalidParameter {
                name: "patch_length_m",
                ..
            })
        ));
    }

    #[test]
    fn test_largest_wave() {
        let params = SpectrumParameters {
            wind_speed_m_per_s: 10.0,
            ..Default::default()
        };
        assert!((params.largest_wave_m() - 100.0 / GRAVITY_M_PER_S2).abs() < 1e-4);
    }

    #[test]
    fn test_cache_key_ignores_choppiness() {
        let a = SpectrumParameters::default();
        let b = SpectrumParameters {
            choppiness: 2.5,
            ..Default::default()
        };
        let c = SpectrumParameters {
            amplitude: 5.0,
            ..Default::default()
        };
        assert_eq!(a.cache_key(), b.cache_key());
        assert_ne!(a.cache_key(), c.cache_key());
    }
}
