//! Surface normals and foam derived from the spatial displacement grids.
//!
//! Both passes read a fixed 3×3 neighborhood with toroidal wraparound, so the
//! tile stays seamless at its edges.

use glam::Vec3;

use crate::dispatch::Dispatcher;
use crate::error::{OceanError, Result};
use crate::grid::{NormalGrid, RealGrid};
use crate::params::FoamParameters;

/// Central difference of `grid` along x at `(x, y)`, in cells
#[inline]
fn ddx(grid: &RealGrid, x: usize, y: usize) -> f32 {
    let (x, y) = (x as isize, y as isize);
    (grid.get_wrapped(x + 1, y) - grid.get_wrapped(x - 1, y)) * 0.5
}

/// Central difference of `grid` along y (world Z) at `(x, y)`, in cells
#[inline]
fn ddz(grid: &RealGrid, x: usize, y: usize) -> f32 {
    let (x, y) = (x as isize, y as isize);
    (grid.get_wrapped(x, y + 1) - grid.get_wrapped(x, y - 1)) * 0.5
}

/// Per-cell surface normals from horizontal (choppiness) displacement
///
/// `cell_size_m` is the world spacing between cells (patch length / N), which
/// turns the per-cell differences into dimensionless gradients.
pub fn compute_normals<D: Dispatcher>(
    dispatcher: &D,
    disp_x: &RealGrid,
    disp_z: &RealGrid,
    cell_size_m: f32,
) -> Result<NormalGrid> {
    if !cell_size_m.is_finite() || cell_size_m <= 0.0 {
        return Err(OceanError::InvalidParameter {
            name: "cell_size_m",
            value: cell_size_m,
        });
    }
    let resolution = disp_x.resolution();
    disp_z.check_shape(resolution)?;

    let inv_cell = 1.0 / cell_size_m;
    let mut normals = NormalGrid::filled(resolution, Vec3::Y);
    dispatcher.dispatch(&mut normals, |x, y| {
        let gx = ddx(disp_x, x, y) * inv_cell;
        let gz = ddz(disp_z, x, y) * inv_cell;
        let normal = Vec3::new(-gx, 1.0, -gz).normalize_or_zero();
        if normal == Vec3::ZERO {
            Vec3::Y
        } else {
            normal
        }
    });
    Ok(normals)
}

/// Foam intensity in [0, 1] from divergence of the normal field
///
/// Normals fan out over a sharp crest, so positive divergence of their
/// horizontal components marks turbulent water.
pub fn compute_foam<D: Dispatcher>(
    dispatcher: &D,
    normals: &NormalGrid,
    params: &FoamParameters,
) -> RealGrid {
    let mut foam = RealGrid::filled(normals.resolution(), 0.0);
    dispatcher.dispatch(&mut foam, |x, y| {
        let (xi, yi) = (x as isize, y as isize);
        let dnx = (normals.get_wrapped(xi + 1, yi).x - normals.get_wrapped(xi - 1, yi).x) * 0.5;
        let dnz = (normals.get_wrapped(xi, yi + 1).z - normals.get_wrapped(xi, yi - 1).z) * 0.5;
        let divergence = dnx + dnz;
        ((divergence - params.threshold) * params.intensity).clamp(0.0, 1.0)
    });
    foam
}
