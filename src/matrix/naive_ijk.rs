//! Textbook i-j-k multiply, the correctness baseline for every blocked path.

use super::element::Element;
use super::view::{MatMut, MatRef};

/// Naive matrix multiplication using i-j-k loop order.
///
/// This is the textbook triple-loop implementation. It's slow because
/// the innermost loop accesses B with stride `n` (column-wise), causing
/// cache misses on every iteration.
///
/// # Arguments
///
/// * `a` - Matrix A (m × k), row-major
/// * `b` - Matrix B (k × n), row-major
/// * `c` - Matrix C (m × n), row-major, accumulated into (C += A * B)
/// * `m` - Rows of A and C
/// * `n` - Columns of B and C
/// * `k` - Columns of A, rows of B
pub fn matmul_naive_ijk(a: &[f64], b: &[f64], c: &mut [f64], m: usize, n: usize, k: usize) {
    for i in 0..m {
        for j in 0..n {
            for p in 0..k {
                c[i * n + j] += a[i * k + p] * b[p * n + j];
            }
        }
    }
}

/// Reference GEMM over strided views: `C ← α·A·B + β·C`.
///
/// Each output is reduced over `p` in ascending order and then combined
/// with the scaled old value. `β = 0` overwrites C without reading it.
///
/// # Panics
///
/// Panics if the shapes don't line up.
pub fn gemm_reference<T: Element>(
    alpha: T,
    a: MatRef<'_, T>,
    b: MatRef<'_, T>,
    beta: T,
    mut c: MatMut<'_, T>,
) {
    let (m, k, n) = (a.rows(), a.cols(), b.cols());
    assert_eq!(b.rows(), k, "inner dimensions differ");
    assert_eq!((c.rows(), c.cols()), (m, n), "C has the wrong shape");

    c.scale(beta);
    for i in 0..m {
        for j in 0..n {
            let mut sum = T::ZERO;
            for p in 0..k {
                sum += a.get(i, p) * b.get(p, j);
            }
            let tile = [sum];
            c.add_scaled_tile(i, j, 1, 1, alpha, &tile, 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Layout;

    #[test]
    fn test_naive_ijk_known_product() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]; // 2x3
        let b = [7.0, 8.0, 9.0, 10.0, 11.0, 12.0]; // 3x2
        let mut c = [0.0; 4];
        matmul_naive_ijk(&a, &b, &mut c, 2, 2, 3);
        assert_eq!(c, [58.0, 64.0, 139.0, 154.0]);
    }

    #[test]
    fn test_reference_alpha_beta() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [5.0, 6.0, 7.0, 8.0];
        let mut c = [1.0, 1.0, 1.0, 1.0];

        let av = MatRef::from_slice(&a, 2, 2, Layout::RowMajor).unwrap();
        let bv = MatRef::from_slice(&b, 2, 2, Layout::RowMajor).unwrap();
        let cv = MatMut::from_slice(&mut c, 2, 2, Layout::RowMajor).unwrap();
        gemm_reference(2.0, av, bv, 3.0, cv);

        // A*B = [19 22; 43 50]
        assert_eq!(c, [41.0, 47.0, 89.0, 103.0]);
    }

    #[test]
    fn test_reference_empty_k_only_scales() {
        let mut c = [4.0f32, 8.0];
        let a = MatRef::<f32>::from_slice(&[], 2, 0, Layout::RowMajor).unwrap();
        let b = MatRef::<f32>::from_slice(&[], 0, 1, Layout::RowMajor).unwrap();
        let cv = MatMut::from_slice(&mut c, 2, 1, Layout::RowMajor).unwrap();
        gemm_reference(1.0, a, b, 0.5, cv);
        assert_eq!(c, [2.0, 4.0]);
    }
}
