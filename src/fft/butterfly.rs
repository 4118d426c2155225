//! Bit-reversal permutation and the radix-2 butterfly table.

use rustfft::num_complex::Complex32;
use std::f64::consts::PI;

use crate::dispatch::Dispatcher;
use crate::grid::Resolution;

/// Reverse the low `bits` bits of `i`
#[inline]
pub fn bit_reverse(i: usize, bits: usize) -> usize {
    if bits == 0 {
        return 0;
    }
    i.reverse_bits() >> (usize::BITS as usize - bits)
}

/// `reversed[i] = bit_reverse(i, log2(N))` for every i in [0, N)
pub fn bit_reversed_indices(resolution: Resolution) -> Vec<usize> {
    let bits = resolution.log2();
    (0..resolution.n()).map(|i| bit_reverse(i, bits)).collect()
}

/// One cell of the butterfly table
///
/// Stage `stage` writes `out[index] = in[source_a] + twiddle · in[source_b]`.
/// Twiddles are stored for the forward transform; the inverse conjugates them.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ButterflyEntry {
    pub stage: usize,
    pub index: usize,
    pub twiddle: Complex32,
    pub source_a: usize,
    pub source_b: usize,
}

/// log2(N) × N table driving a decimation-in-time FFT of length N
///
/// Stage 0 reads its sources through the bit-reversal permutation, so the
/// transform consumes input in natural order.
#[derive(Debug, Clone, PartialEq)]
pub struct ButterflyTable {
    resolution: Resolution,
    entries: Vec<ButterflyEntry>,
}

impl ButterflyTable {
    pub fn build<D: Dispatcher>(resolution: Resolution, dispatcher: &D) -> Self {
        let n = resolution.n();
        let reversed = bit_reversed_indices(resolution);
        let mut entries = vec![ButterflyEntry::default(); n * resolution.log2()];

        dispatcher.dispatch_rows(n, &mut entries, |index, stage| {
            butterfly_entry(stage, index, &reversed)
        });

        log::debug!(
            "built butterfly table: {} stages x {} entries",
            resolution.log2(),
            n
        );

        Self {
            resolution,
            entries,
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn stage_count(&self) -> usize {
        self.resolution.log2()
    }

    /// All N entries of one stage
    pub fn stage(&self, stage: usize) -> &[ButterflyEntry] {
        let n = self.resolution.n();
        &self.entries[stage * n..(stage + 1) * n]
    }

    #[inline]
    pub fn entry(&self, stage: usize, index: usize) -> &ButterflyEntry {
        &self.entries[stage * self.resolution.n() + index]
    }

    pub fn entries(&self) -> &[ButterflyEntry] {
        &self.entries
    }

    /// RGBA32F texel layout: (twiddle.re, twiddle.im, source_a, source_b)
    pub fn to_texels(&self) -> Vec<[f32; 4]> {
        self.entries
            .iter()
            .map(|e| {
                [
                    e.twiddle.re,
                    e.twiddle.im,
                    e.source_a as f32,
                    e.source_b as f32,
                ]
            })
            .collect()
    }
}

fn butterfly_entry(stage: usize, index: usize, reversed: &[usize]) -> ButterflyEntry {
    let span = 1usize << stage;
    let group = span << 1;
    let k = index % group;

    let angle = -2.0 * PI * k as f64 / group as f64;
    let twiddle = Complex32::new(angle.cos() as f32, angle.sin() as f32);

    let (a, b) = if k < span {
        (index, index + span)
    } else {
        (index - span, index)
    };
    let (source_a, source_b) = if stage == 0 {
        (reversed[a], reversed[b])
    } else {
        (a, b)
    };

    ButterflyEntry {
        stage,
        index,
        twiddle,
        source_a,
        source_b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::SerialDispatcher;

    fn all_sizes() -> impl Iterator<Item = Resolution> {
        (2..=9).map(|p| Resolution::new(1 << p).unwrap())
    }

    #[test]
    fn test_bit_reverse_small() {
        assert_eq!(bit_reverse(0b001, 3), 0b100);
        assert_eq!(bit_reverse(0b110, 3), 0b011);
        assert_eq!(bit_reverse(1, 1), 1);
        assert_eq!(bit_reverse(5, 0), 0);
    }

    #[test]
    fn test_bit_reversal_is_involutive_bijection() {
        for res in all_sizes() {
            let reversed = bit_reversed_indices(res);
            let mut seen = vec![false; res.n()];
            for (i, &r) in reversed.iter().enumerate() {
                assert!(r < res.n());
                assert!(!seen[r], "duplicate index {} for N={}", r, res);
                seen[r] = true;
                assert_eq!(reversed[r], i);
            }
        }
    }

    #[test]
    fn test_table_shape_and_unit_twiddles() {
        for res in all_sizes() {
            let table = ButterflyTable::build(res, &SerialDispatcher);
            assert_eq!(table.stage_count(), res.log2());
            assert_eq!(table.entries().len(), res.log2() * res.n());
            for s in 0..table.stage_count() {
                assert_eq!(table.stage(s).len(), res.n());
                for e in table.stage(s) {
                    assert_eq!(e.stage, s);
                    assert!((e.twiddle.norm() - 1.0).abs() < 1e-6);
                    assert!(e.source_a < res.n() && e.source_b < res.n());
                }
            }
        }
    }

    #[test]
    fn test_stage_zero_uses_bit_reversal() {
        let res = Resolution::new(8).unwrap();
        let table = ButterflyTable::build(res, &SerialDispatcher);
        let reversed = bit_reversed_indices(res);
        // index 2 is a top wing (pairs 2, 3), index 3 a bottom wing
        let top = table.entry(0, 2);
        assert_eq!((top.source_a, top.source_b), (reversed[2], reversed[3]));
        let bottom = table.entry(0, 3);
        assert_eq!((bottom.source_a, bottom.source_b), (reversed[2], reversed[3]));
        assert!((bottom.twiddle.re + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_later_stage_pairs() {
        let res = Resolution::new(8).unwrap();
        let table = ButterflyTable::build(res, &SerialDispatcher);
        let e = table.entry(2, 5);
        assert_eq!((e.source_a, e.source_b), (1, 5));
        // k = 5 in a group of 8: exp(-2πi·5/8)
        let expected = -2.0 * std::f32::consts::PI * 5.0 / 8.0;
        assert!((e.twiddle.re - expected.cos()).abs() < 1e-6);
        assert!((e.twiddle.im - expected.sin()).abs() < 1e-6);
    }

    #[test]
    fn test_texel_packing() {
        let table = ButterflyTable::build(Resolution::new(4).unwrap(), &SerialDispatcher);
        let texels = table.to_texels();
        assert_eq!(texels.len(), 8);
        let e = table.entry(1, 3);
        assert_eq!(texels[4 + 3][2], e.source_a as f32);
        assert_eq!(texels[4 + 3][3], e.source_b as f32);
    }
}
