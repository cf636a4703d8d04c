//! Cache-blocked matrix multiplication with compile-time tile sizes.
//!
//! The crate is built around five block constants: [`MC`], [`KC`], [`NC`]
//! size the macro-blocks that are packed and kept in cache, [`MR`] and
//! [`NR`] size the register tile each microkernel call updates. They all
//! default to `1`, which degenerates into an element-at-a-time multiply.
//! The result never depends on the blocking, only the speed does.
//!
//! ## Usage
//!
//! ```
//! use blocked_gemm::multiply;
//!
//! let a = vec![1.0f64; 64 * 64];
//! let b = vec![1.0f64; 64 * 64];
//! let mut c = vec![0.0f64; 64 * 64];
//!
//! multiply(&a, &b, &mut c, 64, 64, 64).unwrap();
//! assert_eq!(c[0], 64.0);
//! ```
//!
//! General `C ← α·A·B + β·C` over strided views, with runtime blocking:
//!
//! ```
//! use blocked_gemm::{BlockParams, Gemm, Layout, MatMut, MatRef};
//!
//! let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]; // 2×3
//! let b = [7.0, 8.0, 9.0, 10.0, 11.0, 12.0]; // 3×2
//! let mut c = [1.0; 4];
//!
//! Gemm::new(BlockParams::PORTABLE)
//!     .run(
//!         2.0,
//!         MatRef::from_slice(&a, 2, 3, Layout::RowMajor).unwrap(),
//!         MatRef::from_slice(&b, 3, 2, Layout::RowMajor).unwrap(),
//!         0.0,
//!         MatMut::from_slice(&mut c, 2, 2, Layout::RowMajor).unwrap(),
//!     )
//!     .unwrap();
//! assert_eq!(c, [116.0, 128.0, 278.0, 308.0]);
//! ```
//!
//! ## What's inside
//!
//! - Const-generic scalar kernel plus 4×4, 12×4 AVX2 and 8×8 AVX-512 kernels
//! - Zero-padded panel packing, so edges never need a separate code path
//! - BLIS-style five-loop block nest over strided row/column-major views
//! - Adaptive multi-threading on a rayon pool (scales down for small matrices)

pub mod blocked;
pub mod dispatch;
pub mod error;
pub mod kernels;
pub mod matrix;
pub mod params;
pub mod threaded;

use serde::{Deserialize, Serialize};

pub use dispatch::KernelKind;
pub use error::{GemmError, Result};
pub use kernels::{DefaultKernel, DynKernel, Microkernel, ScalarKernel};
pub use matrix::{Element, Layout, MatMut, MatRef, gemm_reference};
pub use params::{BlockParams, KC, MC, MR, NC, NR};

/// `C ← α·A·B + β·C` with the build-time block constants.
///
/// Runs the const-generic [`DefaultKernel`] (`MR×NR` tile) under
/// [`BlockParams::COMPILED`], so the kernel is specialized for the
/// configured tile.
pub fn gemm<T: Element>(
    alpha: T,
    a: MatRef<'_, T>,
    b: MatRef<'_, T>,
    beta: T,
    c: MatMut<'_, T>,
) -> Result<()> {
    blocked::gemm_blocked(
        &DefaultKernel::new(),
        &BlockParams::COMPILED,
        alpha,
        a,
        b,
        beta,
        c,
    )
}

/// `C ← α·A·B + β·C` with block sizes chosen at runtime.
pub fn gemm_with_params<T: Element>(
    params: &BlockParams,
    alpha: T,
    a: MatRef<'_, T>,
    b: MatRef<'_, T>,
    beta: T,
    c: MatMut<'_, T>,
) -> Result<()> {
    Gemm::new(*params).run(alpha, a, b, beta, c)
}

/// Runtime GEMM configuration: block sizes and worker count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gemm {
    pub params: BlockParams,
    /// Maximum worker threads. `1` runs on the calling thread.
    pub threads: usize,
}

impl Default for Gemm {
    fn default() -> Self {
        Self::new(BlockParams::COMPILED)
    }
}

impl Gemm {
    pub fn new(params: BlockParams) -> Self {
        Self { params, threads: 1 }
    }

    pub fn with_threads(self, threads: usize) -> Self {
        Self { threads, ..self }
    }

    /// Run `C ← α·A·B + β·C`.
    ///
    /// When the register tile equals the build-time `MR×NR`, the
    /// specialized [`DefaultKernel`] is used; any other tile runs on
    /// [`DynKernel`].
    pub fn run<T: Element>(
        &self,
        alpha: T,
        a: MatRef<'_, T>,
        b: MatRef<'_, T>,
        beta: T,
        c: MatMut<'_, T>,
    ) -> Result<()> {
        self.params.validate()?;
        if (self.params.mr, self.params.nr) == (MR, NR) {
            let kernel = DefaultKernel::new();
            threaded::gemm_parallel(&kernel, &self.params, self.threads, alpha, a, b, beta, c)
        } else {
            let kernel = DynKernel::new(self.params.mr, self.params.nr)?;
            threaded::gemm_parallel(&kernel, &self.params, self.threads, alpha, a, b, beta, c)
        }
    }
}

/// Row-major `f64` views over `m×k`, `k×n` and `m×n` buffers.
fn row_major_views<'a>(
    a: &'a [f64],
    b: &'a [f64],
    c: &'a mut [f64],
    m: usize,
    n: usize,
    k: usize,
) -> Result<(MatRef<'a, f64>, MatRef<'a, f64>, MatMut<'a, f64>)> {
    let operands = [("A", a.len(), m, k), ("B", b.len(), k, n), ("C", c.len(), m, n)];
    for (name, len, rows, cols) in operands {
        let Some(expected) = rows.checked_mul(cols) else {
            return Err(GemmError::DimensionMismatch(format!(
                "{}: {}x{} overflows usize",
                name, rows, cols
            )));
        };
        if len != expected {
            return Err(GemmError::DimensionMismatch(format!(
                "{}: expected {}x{}={} elements, got {}",
                name, rows, cols, expected, len
            )));
        }
    }
    Ok((
        MatRef::named(a, m, k, k, 1, "A")?,
        MatRef::named(b, k, n, n, 1, "B")?,
        MatMut::named(c, m, n, n, 1, "C")?,
    ))
}

/// Matrix multiply: C += A * B
///
/// Picks the fastest available kernel for your CPU (AVX-512 > AVX2 > scalar).
/// Matrices are row-major: A is m×k, B is k×n, C is m×n.
///
/// # Errors
///
/// [`GemmError::DimensionMismatch`] if the slice sizes don't match m, n, k.
pub fn multiply(a: &[f64], b: &[f64], c: &mut [f64], m: usize, n: usize, k: usize) -> Result<()> {
    multiply_parallel(a, b, c, m, n, k, 1)
}

/// Same as [`multiply`] but uses multiple threads.
///
/// Thread count adapts to matrix size - small matrices use fewer threads
/// because the overhead isn't worth it.
pub fn multiply_parallel(
    a: &[f64],
    b: &[f64],
    c: &mut [f64],
    m: usize,
    n: usize,
    k: usize,
    num_threads: usize,
) -> Result<()> {
    let (a, b, c) = row_major_views(a, b, c, m, n, k)?;
    dispatch::run_f64(KernelKind::detect(), num_threads, 1.0, a, b, 1.0, c)
}
