//! Data-parallel kernel dispatch.
//!
//! A kernel maps a 2D index `(x, y)` to one output cell. Cells are independent
//! within a dispatch, and `dispatch` returns only after every cell has been
//! written, so consecutive dispatches are separated by a full barrier.

use crate::grid::Grid;

/// Substrate that runs a per-cell kernel over a 2D index domain
pub trait Dispatcher: Send + Sync {
    /// Fill `out` (row-major, `width` cells per row) with `kernel(x, y)`
    fn dispatch_rows<T, K>(&self, width: usize, out: &mut [T], kernel: K)
    where
        T: Send,
        K: Fn(usize, usize) -> T + Sync;

    /// Fill an N×N grid with `kernel(x, y)`
    fn dispatch<T, K>(&self, out: &mut Grid<T>, kernel: K)
    where
        T: Send,
        K: Fn(usize, usize) -> T + Sync,
    {
        let width = out.n();
        self.dispatch_rows(width, out.as_mut_slice(), kernel);
    }
}

/// Runs kernels on the calling thread, row by row
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialDispatcher;

impl Dispatcher for SerialDispatcher {
    fn dispatch_rows<T, K>(&self, width: usize, out: &mut [T], kernel: K)
    where
        T: Send,
        K: Fn(usize, usize) -> T + Sync,
    {
        for (y, row) in out.chunks_mut(width).enumerate() {
            for (x, cell) in row.iter_mut().enumerate() {
                *cell = kernel(x, y);
            }
        }
    }
}

/// Runs kernels across the rayon thread pool, one task per row
#[cfg(feature = "parallel")]
#[derive(Debug, Clone, Copy, Default)]
pub struct ParallelDispatcher;

#[cfg(feature = "parallel")]
impl Dispatcher for ParallelDispatcher {
    fn dispatch_rows<T, K>(&self, width: usize, out: &mut [T], kernel: K)
    where
        T: Send,
        K: Fn(usize, usize) -> T + Sync,
    {
        use rayon::prelude::*;

        out.par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, cell) in row.iter_mut().enumerate() {
                    *cell = kernel(x, y);
                }
            });
    }
}

/// Dispatcher used when none is chosen explicitly
#[cfg(feature = "parallel")]
pub type DefaultDispatcher = ParallelDispatcher;

#[cfg(not(feature = "parallel"))]
pub type DefaultDispatcher = SerialDispatcher;
