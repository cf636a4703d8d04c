//! 12×4 AVX2 microkernel for matrix multiplication.

use super::Microkernel;

const MR: usize = 12;
const NR: usize = 4;

/// Computes a 12×4 tile: C[0:12, 0:4] += A_packed × B_packed
///
/// Twelve YMM accumulators (one per row of C) leave four of the sixteen
/// registers for the B row and the A broadcasts. The accumulator array is
/// fully unrolled by the compiler.
///
/// # Safety
///
/// Caller must ensure:
/// - CPU supports AVX2 and FMA
/// - `a_pack` points to `k * 12` contiguous f64 values (packed A panel)
/// - `b_pack` points to `k * 4` contiguous f64 values (packed B panel)
/// - `c.add(row * ldc)` is valid for row in 0..12, each allowing read/write of 4 f64s
#[target_feature(enable = "avx2,fma")]
#[allow(unsafe_op_in_unsafe_fn)]
pub unsafe fn kernel_12x4_avx2(
    a_pack: *const f64,
    b_pack: *const f64,
    c: *mut f64,
    k: usize,
    ldc: usize,
) {
    use std::arch::x86_64::*;

    // 12 accumulators, one per output row, loaded from C
    let mut acc = [_mm256_setzero_pd(); MR];
    for (row, reg) in acc.iter_mut().enumerate() {
        *reg = _mm256_loadu_pd(c.add(row * ldc));
    }

    // Main loop: for each k, load B once, broadcast A values, FMA into C
    for p in 0..k {
        let b_vec = _mm256_loadu_pd(b_pack.add(p * NR));
        let a_col = a_pack.add(p * MR);
        for (row, reg) in acc.iter_mut().enumerate() {
            *reg = _mm256_fmadd_pd(_mm256_broadcast_sd(&*a_col.add(row)), b_vec, *reg);
        }
    }

    // Store results back to C
    for (row, reg) in acc.iter().enumerate() {
        _mm256_storeu_pd(c.add(row * ldc), *reg);
    }
}

/// Handle to the 12×4 AVX2 kernel. Only exists on CPUs with AVX2 and FMA.
#[derive(Debug, Clone, Copy)]
pub struct Avx2Kernel12x4 {
    _detected: (),
}

impl Avx2Kernel12x4 {
    pub fn new() -> Option<Self> {
        (is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma"))
            .then_some(Self { _detected: () })
    }
}

impl Microkernel<f64> for Avx2Kernel12x4 {
    fn mr(&self) -> usize {
        MR
    }

    fn nr(&self) -> usize {
        NR
    }

    fn name(&self) -> &'static str {
        "avx2-12x4"
    }

    #[inline]
    fn compute(&self, kc: usize, a_panel: &[f64], b_panel: &[f64], tile: &mut [f64]) {
        assert!(a_panel.len() >= kc * MR, "A panel too short");
        assert!(b_panel.len() >= kc * NR, "B panel too short");
        assert!(tile.len() >= MR * NR, "tile too short");
        // SAFETY: `new` checked AVX2/FMA, lengths checked above.
        unsafe { kernel_12x4_avx2(a_panel.as_ptr(), b_panel.as_ptr(), tile.as_mut_ptr(), kc, NR) }
    }
}
