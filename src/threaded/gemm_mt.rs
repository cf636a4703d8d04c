//! Multi-threaded blocked GEMM.

use rayon::prelude::*;
use tracing::debug;

use crate::blocked::{check_shapes, gemm_blocked};
use crate::error::Result;
use crate::kernels::Microkernel;
use crate::matrix::{Element, MatMut, MatRef};
use crate::params::BlockParams;

/// Multi-threaded `C ← α·A·B + β·C`.
///
/// Splits C along its outer axis (rows for row-major C, columns for
/// column-major C) into one band per thread, and runs [`gemm_blocked`] on
/// each band inside a rayon pool. Band sizes are multiples of the kernel
/// tile, so only the last band can end in a padded tile.
///
/// Every element of C belongs to exactly one band and is reduced in the
/// same order as the single-threaded path, so the result is identical.
///
/// # Arguments
///
/// * `max_threads` - Upper bound; small problems use fewer (see
///   [`choose_thread_count`]). `0` and `1` both mean single-threaded.
#[allow(clippy::too_many_arguments)]
pub fn gemm_parallel<T, K>(
    kernel: &K,
    params: &BlockParams,
    max_threads: usize,
    alpha: T,
    a: MatRef<'_, T>,
    b: MatRef<'_, T>,
    beta: T,
    c: MatMut<'_, T>,
) -> Result<()>
where
    T: Element,
    K: Microkernel<T> + ?Sized,
{
    check_shapes(&a, &b, &c)?;
    params.validate()?;

    let (m, k, n) = (a.rows(), a.cols(), b.cols());
    let rows_outer = c.rows_are_outer();
    let outer_len = c.outer_len();
    let threads = if rows_outer {
        choose_thread_count(m, n, k, max_threads.max(1))
    } else {
        choose_thread_count(n, m, k, max_threads.max(1))
    };

    if threads <= 1 {
        return gemm_blocked(kernel, params, alpha, a, b, beta, c);
    }

    let unit = if rows_outer { kernel.mr() } else { kernel.nr() }.max(1);
    let band = outer_len.div_ceil(threads).div_ceil(unit) * unit;

    let mut bands = Vec::with_capacity(threads);
    let mut rest = c;
    let mut start = 0;
    while start < outer_len {
        let len = band.min(outer_len - start);
        let (head, tail) = rest.split_outer(len);
        bands.push((start, len, head));
        rest = tail;
        start += len;
    }

    debug!(threads, bands = bands.len(), band, rows_outer, "parallel gemm");

    let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
    pool.install(|| {
        bands.into_par_iter().try_for_each(|(start, len, c_band)| {
            if rows_outer {
                let a_band = a.submatrix(start, 0, len, k);
                gemm_blocked(kernel, params, alpha, a_band, b, beta, c_band)
            } else {
                let b_band = b.submatrix(0, start, k, len);
                gemm_blocked(kernel, params, alpha, a, b_band, beta, c_band)
            }
        })
    })
}

/// Pick how many threads a problem deserves.
///
/// Thread count adapts to the amount of work:
/// - < 100M FLOPs: 1 thread
/// - < 300M FLOPs: 2 threads
/// - Otherwise: up to `max_threads`
///
/// and never exceeds one thread per 64 entries of the split axis.
///
/// # Arguments
///
/// * `split_len` - Length of the axis of C being split across threads
pub fn choose_thread_count(split_len: usize, other_len: usize, k: usize, max_threads: usize) -> usize {
    let flops = 2.0 * split_len as f64 * other_len as f64 * k as f64;

    const SINGLE_THREAD_THRESHOLD: f64 = 100_000_000.0;
    const TWO_THREAD_THRESHOLD: f64 = 300_000_000.0;

    let optimal_threads = if flops < SINGLE_THREAD_THRESHOLD {
        1
    } else if flops < TWO_THREAD_THRESHOLD {
        2
    } else {
        max_threads
    };

    let threads_by_split = (split_len / 64).max(1);

    optimal_threads.min(threads_by_split).min(max_threads).max(1)
}
