//! Runtime kernel selection for `f64`.
//!
//! Picks the fastest kernel the CPU supports (AVX-512 > AVX2 > scalar) and
//! pairs it with the block sizes tuned for its register tile.

use serde::{Deserialize, Serialize};
use tracing::debug;

#[cfg(target_arch = "x86_64")]
use crate::error::GemmError;
use crate::error::Result;
use crate::kernels::{Microkernel, ScalarKernel};
use crate::matrix::{MatMut, MatRef};
use crate::params::BlockParams;
use crate::threaded::gemm_parallel;

#[cfg(target_arch = "x86_64")]
use crate::kernels::{Avx2Kernel4x4, Avx2Kernel12x4, Avx512Kernel8x8};

/// The `f64` microkernels this crate ships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KernelKind {
    /// Portable 4×4 scalar kernel.
    Scalar,
    /// 4×4 AVX2 + FMA.
    Avx2Tile4x4,
    /// 12×4 AVX2 + FMA.
    Avx2Tile12x4,
    /// 8×8 AVX-512F/DQ + FMA.
    Avx512Tile8x8,
}

impl KernelKind {
    pub const ALL: [KernelKind; 4] = [
        KernelKind::Scalar,
        KernelKind::Avx2Tile4x4,
        KernelKind::Avx2Tile12x4,
        KernelKind::Avx512Tile8x8,
    ];

    pub fn name(self) -> &'static str {
        match self {
            KernelKind::Scalar => "scalar 4×4",
            KernelKind::Avx2Tile4x4 => "4×4 AVX2",
            KernelKind::Avx2Tile12x4 => "12×4 AVX2",
            KernelKind::Avx512Tile8x8 => "8×8 AVX-512",
        }
    }

    /// Block sizes tuned for this kernel's register tile.
    pub fn params(self) -> BlockParams {
        match self {
            KernelKind::Scalar => BlockParams::PORTABLE,
            KernelKind::Avx2Tile4x4 => BlockParams::AVX2_4X4,
            KernelKind::Avx2Tile12x4 => BlockParams::AVX2_12X4,
            KernelKind::Avx512Tile8x8 => BlockParams::AVX512_8X8,
        }
    }

    pub fn is_available(self) -> bool {
        match self {
            KernelKind::Scalar => true,
            #[cfg(target_arch = "x86_64")]
            KernelKind::Avx2Tile4x4 => Avx2Kernel4x4::new().is_some(),
            #[cfg(target_arch = "x86_64")]
            KernelKind::Avx2Tile12x4 => Avx2Kernel12x4::new().is_some(),
            #[cfg(target_arch = "x86_64")]
            KernelKind::Avx512Tile8x8 => Avx512Kernel8x8::new().is_some(),
            #[cfg(not(target_arch = "x86_64"))]
            _ => false,
        }
    }

    /// Kernels usable on this CPU, slowest first.
    pub fn available() -> Vec<KernelKind> {
        Self::ALL.into_iter().filter(|k| k.is_available()).collect()
    }

    /// Best kernel for this CPU.
    pub fn detect() -> KernelKind {
        let kind = [KernelKind::Avx512Tile8x8, KernelKind::Avx2Tile12x4]
            .into_iter()
            .find(|k| k.is_available())
            .unwrap_or(KernelKind::Scalar);
        debug!(kernel = kind.name(), "detected microkernel");
        kind
    }
}

/// Run `C ← α·A·B + β·C` on a specific kernel with its tuned blocking.
///
/// Returns [`GemmError::KernelUnavailable`](crate::GemmError::KernelUnavailable)
/// if the CPU lacks the kernel's instruction set.
#[allow(clippy::too_many_arguments)]
pub fn run_f64(
    kind: KernelKind,
    threads: usize,
    alpha: f64,
    a: MatRef<'_, f64>,
    b: MatRef<'_, f64>,
    beta: f64,
    c: MatMut<'_, f64>,
) -> Result<()> {
    let params = kind.params();
    match kind {
        KernelKind::Scalar => {
            let kernel = ScalarKernel::<4, 4>::new();
            drive(&kernel, &params, threads, alpha, a, b, beta, c)
        }
        #[cfg(target_arch = "x86_64")]
        KernelKind::Avx2Tile4x4 => {
            let kernel = Avx2Kernel4x4::new().ok_or(GemmError::KernelUnavailable(kind))?;
            drive(&kernel, &params, threads, alpha, a, b, beta, c)
        }
        #[cfg(target_arch = "x86_64")]
        KernelKind::Avx2Tile12x4 => {
            let kernel = Avx2Kernel12x4::new().ok_or(GemmError::KernelUnavailable(kind))?;
            drive(&kernel, &params, threads, alpha, a, b, beta, c)
        }
        #[cfg(target_arch = "x86_64")]
        KernelKind::Avx512Tile8x8 => {
            let kernel = Avx512Kernel8x8::new().ok_or(GemmError::KernelUnavailable(kind))?;
            drive(&kernel, &params, threads, alpha, a, b, beta, c)
        }
        #[cfg(not(target_arch = "x86_64"))]
        _ => Err(crate::error::GemmError::KernelUnavailable(kind)),
    }
}

#[allow(clippy::too_many_arguments)]
fn drive<K: Microkernel<f64>>(
    kernel: &K,
    params: &BlockParams,
    threads: usize,
    alpha: f64,
    a: MatRef<'_, f64>,
    b: MatRef<'_, f64>,
    beta: f64,
    c: MatMut<'_, f64>,
) -> Result<()> {
    debug_assert_eq!((kernel.mr(), kernel.nr()), (params.mr, params.nr));
    debug!(kernel = kernel.name(), threads, "dispatching f64 gemm");
    gemm_parallel(kernel, params, threads, alpha, a, b, beta, c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{Layout, gemm_reference};

    #[test]
    fn test_scalar_always_available() {
        assert!(KernelKind::Scalar.is_available());
        assert_eq!(KernelKind::available()[0], KernelKind::Scalar);
        assert!(KernelKind::detect().is_available());
    }

    #[test]
    fn test_params_match_kernel_tiles() {
        assert_eq!(KernelKind::Scalar.params().mr, 4);
        assert_eq!(KernelKind::Avx2Tile12x4.params().mr, 12);
        assert_eq!(KernelKind::Avx512Tile8x8.params().nr, 8);
        for kind in KernelKind::ALL {
            assert!(kind.params().validate().is_ok());
        }
    }

    #[test]
    fn test_every_kind_matches_reference_or_reports_unavailable() {
        let (m, n, k) = (37, 29, 41);
        let a: Vec<f64> = (0..m * k).map(|i| (i % 10) as f64).collect();
        let b: Vec<f64> = (0..k * n).map(|i| (i % 10) as f64).collect();
        let av = MatRef::from_slice(&a, m, k, Layout::RowMajor).unwrap();
        let bv = MatRef::from_slice(&b, k, n, Layout::RowMajor).unwrap();

        let mut expected = vec![0.0; m * n];
        gemm_reference(
            1.0,
            av,
            bv,
            0.0,
            MatMut::from_slice(&mut expected, m, n, Layout::RowMajor).unwrap(),
        );

        for kind in KernelKind::ALL {
            let mut c = vec![0.0; m * n];
            let result = run_f64(
                kind,
                1,
                1.0,
                av,
                bv,
                0.0,
                MatMut::from_slice(&mut c, m, n, Layout::RowMajor).unwrap(),
            );
            if kind.is_available() {
                result.unwrap();
                assert_eq!(c, expected, "{}", kind.name());
            } else {
                assert!(matches!(result, Err(crate::GemmError::KernelUnavailable(k)) if k == kind));
            }
        }
    }
}
