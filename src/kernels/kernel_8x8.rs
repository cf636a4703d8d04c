//! 8×8 AVX-512 microkernel for matrix multiplication.

use super::Microkernel;

const MR: usize = 8;
const NR: usize = 8;

/// Computes an 8×8 tile: C[0:8, 0:8] += A_packed × B_packed
///
/// Uses 8 ZMM registers (512-bit) as accumulators. AVX-512 processes 8 f64
/// values per instruction, so each reduction step updates all 64 outputs
/// with eight FMAs.
///
/// # Safety
///
/// Caller must ensure:
/// - CPU supports AVX-512F, AVX-512DQ, and FMA
/// - `a_pack` points to `k * 8` contiguous f64 values (packed A panel)
/// - `b_pack` points to `k * 8` contiguous f64 values (packed B panel)
/// - `c.add(row * ldc)` is valid for row in 0..8, each allowing read/write of 8 f64s
#[target_feature(enable = "avx512f,avx512dq,fma")]
#[allow(unsafe_op_in_unsafe_fn)]
pub unsafe fn kernel_8x8_avx512(
    a_pack: *const f64,
    b_pack: *const f64,
    c: *mut f64,
    k: usize,
    ldc: usize,
) {
    use std::arch::x86_64::*;

    // 8 accumulators, one per output row (512 bits = 8 f64 each)
    let mut acc = [_mm512_setzero_pd(); MR];
    for (row, reg) in acc.iter_mut().enumerate() {
        *reg = _mm512_loadu_pd(c.add(row * ldc));
    }

    // Main loop: for each k, load B once, broadcast A values, FMA into C
    for p in 0..k {
        let b_vec = _mm512_loadu_pd(b_pack.add(p * NR));
        for (row, reg) in acc.iter_mut().enumerate() {
            *reg = _mm512_fmadd_pd(_mm512_set1_pd(*a_pack.add(p * MR + row)), b_vec, *reg);
        }
    }

    // Store results back to C
    for (row, reg) in acc.iter().enumerate() {
        _mm512_storeu_pd(c.add(row * ldc), *reg);
    }
}

/// Handle to the 8×8 AVX-512 kernel. Only exists on CPUs with AVX-512F/DQ and FMA.
#[derive(Debug, Clone, Copy)]
pub struct Avx512Kernel8x8 {
    _detected: (),
}

impl Avx512Kernel8x8 {
    pub fn new() -> Option<Self> {
        (is_x86_feature_detected!("avx512f")
            && is_x86_feature_detected!("avx512dq")
            && is_x86_feature_detected!("fma"))
        .then_some(Self { _detected: () })
    }
}

impl Microkernel<f64> for Avx512Kernel8x8 {
    fn mr(&self) -> usize {
        MR
    }

    fn nr(&self) -> usize {
        NR
    }

    fn name(&self) -> &'static str {
        "avx512-8x8"
    }

    #[inline]
    fn compute(&self, kc: usize, a_panel: &[f64], b_panel: &[f64], tile: &mut [f64]) {
        assert!(a_panel.len() >= kc * MR, "A panel too short");
        assert!(b_panel.len() >= kc * NR, "B panel too short");
        assert!(tile.len() >= MR * NR, "tile too short");
        // SAFETY: `new` checked AVX-512/FMA, lengths checked above.
        unsafe { kernel_8x8_avx512(a_panel.as_ptr(), b_panel.as_ptr(), tile.as_mut_ptr(), kc, NR) }
    }
}
