//! Square grids of per-cell values and the validated resolution they share.

use glam::Vec3;
use rustfft::num_complex::Complex32;

use crate::error::{OceanError, Result};

/// Grid resolution N (cells per side)
///
/// Construction enforces that N is a power of two and at least 2, so
/// `log2()` is always an exact stage count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Resolution(usize);

impl Resolution {
    pub fn new(n: usize) -> Result<Self> {
        if n < 2 || !n.is_power_of_two() {
            return Err(OceanError::InvalidResolution(n));
        }
        Ok(Self(n))
    }

    #[inline]
    pub fn n(self) -> usize {
        self.0
    }

    /// Number of radix-2 stages per axis
    #[inline]
    pub fn log2(self) -> usize {
        self.0.trailing_zeros() as usize
    }

    /// Total cells in an N×N grid
    #[inline]
    pub fn cells(self) -> usize {
        self.0 * self.0
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Row-major N×N grid (`index = y * N + x`)
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    resolution: Resolution,
    cells: Vec<T>,
}

/// Complex spectrum or FFT intermediate
pub type ComplexGrid = Grid<Complex32>;

/// Real-valued spatial grid (displacement, foam)
pub type RealGrid = Grid<f32>;

/// Per-cell unit surface normals
pub type NormalGrid = Grid<Vec3>;

/// Four independent uniform channels per cell
pub type NoiseGrid = Grid<[f32; 4]>;

impl<T: Copy> Grid<T> {
    /// Grid with every cell set to `value`
    pub fn filled(resolution: Resolution, value: T) -> Self {
        Self {
            resolution,
            cells: vec![value; resolution.cells()],
        }
    }
}

impl<T> Grid<T> {
    /// Build a grid by evaluating `f(x, y)` for every cell
    pub fn from_fn(resolution: Resolution, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let n = resolution.n();
        let mut cells = Vec::with_capacity(resolution.cells());
        for y in 0..n {
            for x in 0..n {
                cells.push(f(x, y));
            }
        }
        Self { resolution, cells }
    }

    /// Wrap an existing row-major buffer
    pub fn from_vec(resolution: Resolution, cells: Vec<T>) -> Result<Self> {
        if cells.len() != resolution.cells() {
            return Err(OceanError::GridShape {
                expected: resolution.n(),
                found: (cells.len() as f64).sqrt() as usize,
            });
        }
        Ok(Self { resolution, cells })
    }

    #[inline]
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    #[inline]
    pub fn n(&self) -> usize {
        self.resolution.n()
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.resolution.n() + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.cells[self.index(x, y)]
    }

    /// Cell lookup with toroidal wraparound on both axes
    #[inline]
    pub fn get_wrapped(&self, x: isize, y: isize) -> &T {
        let n = self.resolution.n() as isize;
        let xi = x.rem_euclid(n) as usize;
        let yi = y.rem_euclid(n) as usize;
        self.get(xi, yi)
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let idx = self.index(x, y);
        self.cells[idx] = value;
    }

    pub fn as_slice(&self) -> &[T] {
        &self.cells
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.cells
    }

    pub fn into_vec(self) -> Vec<T> {
        self.cells
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.cells.iter()
    }

    /// Fail with `GridShape` unless this grid is `expected` × `expected`
    pub fn check_shape(&self, expected: Resolution) -> Result<()> {
        if self.resolution != expected {
            return Err(OceanError::GridShape {
                expected: expected.n(),
                found: self.resolution.n(),
            });
        }
        Ok(())
    }
}

impl RealGrid {
    pub fn mean(&self) -> f32 {
        self.cells.iter().sum::<f32>() / self.cells.len() as f32
    }

    /// (min, max) over all cells
    pub fn range(&self) -> (f32, f32) {
        self.cells
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }

    pub fn is_finite(&self) -> bool {
        self.cells.iter().all(|v| v.is_finite())
    }

    /// Raw little-endian f32 bytes (single channel texture upload)
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.cells)
    }
}

impl NormalGrid {
    pub fn is_finite(&self) -> bool {
        self.cells.iter().all(|v| v.is_finite())
    }
}
