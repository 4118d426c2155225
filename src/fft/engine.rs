//! Separable 2D radix-2 FFT over ping-pong buffers.

use rustfft::num_complex::Complex32;

use super::butterfly::ButterflyTable;
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::grid::ComplexGrid;

/// Transform direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FftDirection {
    /// exp(−2πi·jk/N), unscaled
    Forward,
    /// exp(+2πi·jk/N), unscaled (scaling happens in inversion)
    Inverse,
}

/// Axis a 1D pass runs along
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FftAxis {
    /// Transforms each row (varies x)
    Horizontal,
    /// Transforms each column (varies y)
    Vertical,
}

/// Two fixed buffers with a flip-per-stage "current" index
///
/// The current buffer is read, the other is written, then they swap roles.
/// No allocation happens after construction.
#[derive(Debug, Clone)]
pub struct PingPong {
    buffers: [ComplexGrid; 2],
    current: usize,
    passes: usize,
}

impl PingPong {
    /// Arena whose current buffer holds `input`
    pub fn new(input: ComplexGrid) -> Self {
        let scratch = ComplexGrid::filled(input.resolution(), Complex32::new(0.0, 0.0));
        Self {
            buffers: [input, scratch],
            current: 0,
            passes: 0,
        }
    }

    pub fn current(&self) -> &ComplexGrid {
        &self.buffers[self.current]
    }

    /// Index (0 or 1) of the buffer holding the latest result
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Stage passes run since construction
    pub fn passes(&self) -> usize {
        self.passes
    }

    /// (read buffer, write buffer)
    fn split(&mut self) -> (&ComplexGrid, &mut ComplexGrid) {
        let (first, second) = self.buffers.split_at_mut(1);
        if self.current == 0 {
            (&first[0], &mut second[0])
        } else {
            (&second[0], &mut first[0])
        }
    }

    fn flip(&mut self) {
        self.current ^= 1;
        self.passes += 1;
    }

    pub fn into_current(self) -> ComplexGrid {
        let [a, b] = self.buffers;
        if self.current == 0 {
            a
        } else {
            b
        }
    }
}

/// Runs butterfly stages through a dispatcher
pub struct FftEngine<'a, D: Dispatcher> {
    dispatcher: &'a D,
}

impl<'a, D: Dispatcher> FftEngine<'a, D> {
    pub fn new(dispatcher: &'a D) -> Self {
        Self { dispatcher }
    }

    /// Unscaled 2D inverse FFT (horizontal pass, then vertical pass)
    pub fn inverse_fft_2d(
        &self,
        input: ComplexGrid,
        butterflies: &ButterflyTable,
    ) -> Result<ComplexGrid> {
        self.fft_2d(input, butterflies, FftDirection::Inverse)
    }

    /// Unscaled 2D forward FFT
    pub fn forward_fft_2d(
        &self,
        input: ComplexGrid,
        butterflies: &ButterflyTable,
    ) -> Result<ComplexGrid> {
        self.fft_2d(input, butterflies, FftDirection::Forward)
    }

    pub fn fft_2d(
        &self,
        input: ComplexGrid,
        butterflies: &ButterflyTable,
        direction: FftDirection,
    ) -> Result<ComplexGrid> {
        input.check_shape(butterflies.resolution())?;
        let mut arena = PingPong::new(input);
        self.transform(&mut arena, butterflies, direction);
        Ok(arena.into_current())
    }

    /// Run all 2·log2(N) stages on the arena's current buffer
    pub fn transform(
        &self,
        arena: &mut PingPong,
        butterflies: &ButterflyTable,
        direction: FftDirection,
    ) {
        for axis in [FftAxis::Horizontal, FftAxis::Vertical] {
            for stage in 0..butterflies.stage_count() {
                self.run_stage(arena, butterflies, stage, axis, direction);
            }
        }
    }

    /// One butterfly stage along `axis`: read current, write next, flip
    pub fn run_stage(
        &self,
        arena: &mut PingPong,
        butterflies: &ButterflyTable,
        stage: usize,
        axis: FftAxis,
        direction: FftDirection,
    ) {
        let (src, dst) = arena.split();
        self.dispatcher.dispatch(dst, |x, y| {
            let (lane, p, q) = match axis {
                FftAxis::Horizontal => {
                    let e = butterflies.entry(stage, x);
                    (e, src.get(e.source_a, y), src.get(e.source_b, y))
                }
                FftAxis::Vertical => {
                    let e = butterflies.entry(stage, y);
                    (e, src.get(x, e.source_a), src.get(x, e.source_b))
                }
            };
            let twiddle = match direction {
                FftDirection::Forward => lane.twiddle,
                FftDirection::Inverse => lane.twiddle.conj(),
            };
            *p + twiddle * *q
        });
        arena.flip();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::SerialDispatcher;
    use crate::grid::Resolution;
    use rustfft::FftPlanner;

    fn table(n: usize) -> ButterflyTable {
        ButterflyTable::build(Resolution::new(n).unwrap(), &SerialDispatcher)
    }

    fn impulse(n: usize, at: (usize, usize)) -> ComplexGrid {
        let mut grid = ComplexGrid::filled(Resolution::new(n).unwrap(), Complex32::new(0.0, 0.0));
        grid.set(at.0, at.1, Complex32::new(1.0, 0.0));
        grid
    }

    /// Row-then-column reference transform using rustfft
    fn reference_2d(input: &ComplexGrid, inverse: bool) -> Vec<Complex32> {
        let n = input.n();
        let mut planner = FftPlanner::<f32>::new();
        let fft = if inverse {
            planner.plan_fft_inverse(n)
        } else {
            planner.plan_fft_forward(n)
        };
        let mut data = input.as_slice().to_vec();
        for row in data.chunks_mut(n) {
            fft.process(row);
        }
        let mut column = vec![Complex32::new(0.0, 0.0); n];
        for x in 0..n {
            for y in 0..n {
                column[y] = data[y * n + x];
            }
            fft.process(&mut column);
            for y in 0..n {
                data[y * n + x] = column[y];
            }
        }
        data
    }

    #[test]
    fn test_inverse_of_impulse_is_constant_magnitude() {
        let n = 16;
        let out = FftEngine::new(&SerialDispatcher)
            .inverse_fft_2d(impulse(n, (3, 5)), &table(n))
            .unwrap();
        for c in out.iter() {
            assert!((c.norm() - 1.0).abs() < 1e-5, "magnitude {}", c.norm());
        }
    }

    #[test]
    fn test_forward_then_inverse_round_trip() {
        for n in [2, 4, 8, 32] {
            let butterflies = table(n);
            let engine = FftEngine::new(&SerialDispatcher);
            let input = impulse(n, (1 % n, n - 1));
            let spectrum = engine.forward_fft_2d(input.clone(), &butterflies).unwrap();
            let back = engine.inverse_fft_2d(spectrum, &butterflies).unwrap();
            let scale = 1.0 / (n * n) as f32;
            for (a, b) in back.iter().zip(input.iter()) {
                assert!((*a * scale - *b).norm() < 1e-5);
            }
        }
    }

    #[test]
    fn test_matches_rustfft_reference() {
        let n = 16;
        let res = Resolution::new(n).unwrap();
        let input = ComplexGrid::from_fn(res, |x, y| {
            Complex32::new((x as f32 * 0.7).sin() + y as f32 * 0.1, (y as f32 * 0.3).cos())
        });
        let butterflies = table(n);
        let engine = FftEngine::new(&SerialDispatcher);

        for (direction, inverse) in [(FftDirection::Forward, false), (FftDirection::Inverse, true)] {
            let ours = engine.fft_2d(input.clone(), &butterflies, direction).unwrap();
            let expected = reference_2d(&input, inverse);
            for (a, b) in ours.iter().zip(expected.iter()) {
                let err = (*a - *b).norm();
                assert!(err < 1e-3 * (1.0 + b.norm()), "{:?}: {} vs {}", direction, a, b);
            }
        }
    }

    #[test]
    fn test_pass_count_and_final_buffer() {
        let n = 8;
        let butterflies = table(n);
        let mut arena = PingPong::new(impulse(n, (0, 0)));
        FftEngine::new(&SerialDispatcher).transform(&mut arena, &butterflies, FftDirection::Inverse);
        assert_eq!(arena.passes(), 2 * 3);
        // an even number of flips lands back in buffer 0
        assert_eq!(arena.current_index(), 0);
    }

    #[test]
    fn test_rejects_shape_mismatch() {
        let result = FftEngine::new(&SerialDispatcher).inverse_fft_2d(impulse(8, (0, 0)), &table(4));
        assert!(result.is_err());
    }
}
