//! Microkernels for the innermost loop of the blocked GEMM.
//!
//! A microkernel updates one `MR×NR` register tile of C from a packed
//! `MR×KC` panel of A and a packed `KC×NR` panel of B:
//!
//! ```text
//! for p in 0..kc:
//!     tile[0:MR, 0:NR] += a_panel[p*MR .. p*MR+MR] ⊗ b_panel[p*NR .. p*NR+NR]
//! ```
//!
//! The blocked loop nest zeroes the tile before every call and writes the
//! valid corner back into C afterwards, so kernels never see edge cases.
//!
//! Available kernels:
//! - `scalar`: `ScalarKernel<MR, NR>` (compile-time tile) and `DynKernel`
//! - `kernel_4x4`: 4×4 tile, AVX2 (4 registers)
//! - `kernel_12x4`: 12×4 tile, AVX2 (12 registers, better throughput)
//! - `kernel_8x8`: 8×8 tile, AVX-512 (8 registers, 64 outputs per iteration)

pub mod scalar;

#[cfg(target_arch = "x86_64")]
pub mod kernel_12x4;
#[cfg(target_arch = "x86_64")]
pub mod kernel_4x4;
#[cfg(target_arch = "x86_64")]
pub mod kernel_8x8;

use crate::matrix::Element;

pub use scalar::{DefaultKernel, DynKernel, ScalarKernel};

#[cfg(target_arch = "x86_64")]
pub use kernel_4x4::Avx2Kernel4x4;
#[cfg(target_arch = "x86_64")]
pub use kernel_8x8::Avx512Kernel8x8;
#[cfg(target_arch = "x86_64")]
pub use kernel_12x4::Avx2Kernel12x4;

/// Register-tile kernel consumed by the blocked loop nest.
///
/// Panel layout:
/// - `a_panel`: `kc * mr` elements, the `mr` values of column `p` adjacent
/// - `b_panel`: `kc * nr` elements, the `nr` values of row `p` adjacent
/// - `tile`: `mr * nr` elements, row-major with row stride `nr`
///
/// `compute` accumulates into `tile`; it never overwrites it.
pub trait Microkernel<T: Element>: Send + Sync {
    /// Rows of the register tile.
    fn mr(&self) -> usize;

    /// Columns of the register tile.
    fn nr(&self) -> usize;

    fn name(&self) -> &'static str;

    /// `tile += a_panel × b_panel` over `kc` reduction steps.
    ///
    /// # Panics
    ///
    /// Panics if a panel or the tile is shorter than the layout above.
    fn compute(&self, kc: usize, a_panel: &[T], b_panel: &[T], tile: &mut [T]);
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::Microkernel;

    /// Pack row-major `a` (mr × k) and `b` (k × nr) by hand, run the kernel
    /// on a tile pre-filled with ones and compare against a naive product.
    pub fn assert_kernel_matches_naive<K: Microkernel<f64>>(kernel: &K, k: usize) {
        let (mr, nr) = (kernel.mr(), kernel.nr());
        let a: Vec<f64> = (0..mr * k).map(|i| (i % 7) as f64).collect();
        let b: Vec<f64> = (0..k * nr).map(|i| (i % 10) as f64 - 3.0).collect();

        let mut a_pack = vec![0.0; k * mr];
        for p in 0..k {
            for i in 0..mr {
                a_pack[p * mr + i] = a[i * k + p];
            }
        }
        // Row-major b is already packed for a single panel.
        let b_pack = b.clone();

        let mut tile = vec![1.0; mr * nr];
        kernel.compute(k, &a_pack, &b_pack, &mut tile);

        let mut expected = vec![1.0; mr * nr];
        for i in 0..mr {
            for j in 0..nr {
                for p in 0..k {
                    expected[i * nr + j] += a[i * k + p] * b[p * nr + j];
                }
            }
        }

        for idx in 0..mr * nr {
            assert!(
                (tile[idx] - expected[idx]).abs() < 1e-10,
                "{}: mismatch at {}: got {}, expected {}",
                kernel.name(),
                idx,
                tile[idx],
                expected[idx]
            );
        }
    }
}
