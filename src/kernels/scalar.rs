//! Portable microkernels.

use super::Microkernel;
use crate::error::{GemmError, Result};
use crate::matrix::Element;
use crate::params;

/// Scalar kernel with a compile-time register tile.
///
/// The accumulators live in a `[[T; NR]; MR]` array, so the compiler can
/// unroll both tile loops and keep small tiles entirely in registers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarKernel<const MR: usize, const NR: usize>;

/// The kernel sized by the crate's `MR` and `NR` constants.
pub type DefaultKernel = ScalarKernel<{ params::MR }, { params::NR }>;

impl<const MR: usize, const NR: usize> ScalarKernel<MR, NR> {
    pub const fn new() -> Self {
        const { assert!(MR > 0 && NR > 0, "register tile must be non-empty") };
        Self
    }
}

impl<T: Element, const MR: usize, const NR: usize> Microkernel<T> for ScalarKernel<MR, NR> {
    #[inline(always)]
    fn mr(&self) -> usize {
        MR
    }

    #[inline(always)]
    fn nr(&self) -> usize {
        NR
    }

    fn name(&self) -> &'static str {
        "scalar"
    }

    #[inline]
    fn compute(&self, kc: usize, a_panel: &[T], b_panel: &[T], tile: &mut [T]) {
        let a_panel = &a_panel[..kc * MR];
        let b_panel = &b_panel[..kc * NR];

        let mut acc = [[T::ZERO; NR]; MR];
        for (a_col, b_row) in a_panel.chunks_exact(MR).zip(b_panel.chunks_exact(NR)) {
            for (acc_row, &a_ip) in acc.iter_mut().zip(a_col) {
                for (acc_ij, &b_pj) in acc_row.iter_mut().zip(b_row) {
                    *acc_ij += a_ip * b_pj;
                }
            }
        }

        for (tile_row, acc_row) in tile[..MR * NR].chunks_exact_mut(NR).zip(&acc) {
            for (t, &v) in tile_row.iter_mut().zip(acc_row) {
                *t += v;
            }
        }
    }
}

/// Scalar kernel whose tile is chosen at runtime.
///
/// Lets any [`BlockParams`](crate::params::BlockParams) drive the loop nest
/// without a matching monomorphized kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DynKernel {
    mr: usize,
    nr: usize,
}

impl DynKernel {
    pub fn new(mr: usize, nr: usize) -> Result<Self> {
        if mr == 0 {
            return Err(GemmError::InvalidBlockParam {
                name: "mr",
                value: mr,
            });
        }
        if nr == 0 {
            return Err(GemmError::InvalidBlockParam {
                name: "nr",
                value: nr,
            });
        }
        Ok(Self { mr, nr })
    }
}

impl<T: Element> Microkernel<T> for DynKernel {
    fn mr(&self) -> usize {
        self.mr
    }

    fn nr(&self) -> usize {
        self.nr
    }

    fn name(&self) -> &'static str {
        "scalar-dyn"
    }

    fn compute(&self, kc: usize, a_panel: &[T], b_panel: &[T], tile: &mut [T]) {
        let (mr, nr) = (self.mr, self.nr);
        let a_panel = &a_panel[..kc * mr];
        let b_panel = &b_panel[..kc * nr];
        let tile = &mut tile[..mr * nr];

        for (a_col, b_row) in a_panel.chunks_exact(mr).zip(b_panel.chunks_exact(nr)) {
            for (tile_row, &a_ip) in tile.chunks_exact_mut(nr).zip(a_col) {
                for (t, &b_pj) in tile_row.iter_mut().zip(b_row) {
                    *t += a_ip * b_pj;
                }
            }
        }
    }
}
