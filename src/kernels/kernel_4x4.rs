//! 4×4 AVX2 microkernel for matrix multiplication.

use super::Microkernel;

/// Computes a 4×4 tile: C[0:4, 0:4] += A_packed × B_packed
///
/// Keeps 4 AVX2 registers as accumulators (one per row of C), loads A
/// values via broadcast, and uses FMA for the multiply-accumulate.
///
/// # Safety
///
/// Caller must ensure:
/// - CPU supports AVX2 and FMA
/// - `a_pack` points to `k * 4` contiguous f64 values (packed A panel)
/// - `b_pack` points to `k * 4` contiguous f64 values (packed B panel)
/// - `c.add(row * ldc)` is valid for row in 0..4, each allowing read/write of 4 f64s
#[target_feature(enable = "avx2,fma")]
#[allow(clippy::identity_op)]
#[allow(clippy::erasing_op)]
#[allow(unsafe_op_in_unsafe_fn)]
pub unsafe fn kernel_4x4_avx2(
    a_pack: *const f64,
    b_pack: *const f64,
    c: *mut f64,
    k: usize,
    ldc: usize,
) {
    use std::arch::x86_64::*;

    // Accumulate into what's already in C
    let mut c0 = _mm256_loadu_pd(c.add(0 * ldc));
    let mut c1 = _mm256_loadu_pd(c.add(1 * ldc));
    let mut c2 = _mm256_loadu_pd(c.add(2 * ldc));
    let mut c3 = _mm256_loadu_pd(c.add(3 * ldc));

    // Main loop: for each k, load B once, broadcast A values, FMA into C
    for p in 0..k {
        let b_vec = _mm256_loadu_pd(b_pack.add(p * 4));

        let a0 = _mm256_broadcast_sd(&*a_pack.add(p * 4 + 0));
        let a1 = _mm256_broadcast_sd(&*a_pack.add(p * 4 + 1));
        let a2 = _mm256_broadcast_sd(&*a_pack.add(p * 4 + 2));
        let a3 = _mm256_broadcast_sd(&*a_pack.add(p * 4 + 3));

        c0 = _mm256_fmadd_pd(a0, b_vec, c0);
        c1 = _mm256_fmadd_pd(a1, b_vec, c1);
        c2 = _mm256_fmadd_pd(a2, b_vec, c2);
        c3 = _mm256_fmadd_pd(a3, b_vec, c3);
    }

    // Store results back to C
    _mm256_storeu_pd(c.add(0 * ldc), c0);
    _mm256_storeu_pd(c.add(1 * ldc), c1);
    _mm256_storeu_pd(c.add(2 * ldc), c2);
    _mm256_storeu_pd(c.add(3 * ldc), c3);
}

/// Handle to the 4×4 AVX2 kernel. Only exists on CPUs with AVX2 and FMA.
#[derive(Debug, Clone, Copy)]
pub struct Avx2Kernel4x4 {
    _detected: (),
}

impl Avx2Kernel4x4 {
    pub fn new() -> Option<Self> {
        (is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma"))
            .then_some(Self { _detected: () })
    }
}

impl Microkernel<f64> for Avx2Kernel4x4 {
    fn mr(&self) -> usize {
        4
    }

    fn nr(&self) -> usize {
        4
    }

    fn name(&self) -> &'static str {
        "avx2-4x4"
    }

    #[inline]
    fn compute(&self, kc: usize, a_panel: &[f64], b_panel: &[f64], tile: &mut [f64]) {
        assert!(a_panel.len() >= kc * 4, "A panel too short");
        assert!(b_panel.len() >= kc * 4, "B panel too short");
        assert!(tile.len() >= 16, "tile too short");
        // SAFETY: `new` checked AVX2/FMA, lengths checked above.
        unsafe { kernel_4x4_avx2(a_panel.as_ptr(), b_panel.as_ptr(), tile.as_mut_ptr(), kc, 4) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::test_util::assert_kernel_matches_naive;

    #[test]
    fn test_kernel_4x4_correctness() {
        let Some(kernel) = Avx2Kernel4x4::new() else {
            println!("Skipping - AVX2 not available");
            return;
        };

        for k in [1, 3, 16, 33] {
            assert_kernel_matches_naive(&kernel, k);
        }
    }
}
