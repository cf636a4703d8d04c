//! The five-loop block nest.

use tracing::{debug, trace};

use super::pack::{pack_a, pack_b, packed_a_len, packed_b_len};
use crate::error::{GemmError, Result};
use crate::kernels::Microkernel;
use crate::matrix::{Element, MatMut, MatRef};
use crate::params::{BlockIterator, BlockParams};

/// Check that `A` is `m×k`, `B` is `k×n` and `C` is `m×n`.
pub(crate) fn check_shapes<T: Element>(
    a: &MatRef<'_, T>,
    b: &MatRef<'_, T>,
    c: &MatMut<'_, T>,
) -> Result<()> {
    if a.cols() != b.rows() {
        return Err(GemmError::DimensionMismatch(format!(
            "A is {}x{} but B is {}x{}",
            a.rows(),
            a.cols(),
            b.rows(),
            b.cols()
        )));
    }
    if c.rows() != a.rows() || c.cols() != b.cols() {
        return Err(GemmError::DimensionMismatch(format!(
            "C is {}x{} but A*B is {}x{}",
            c.rows(),
            c.cols(),
            a.rows(),
            b.cols()
        )));
    }
    Ok(())
}

/// Cache-blocked `C ← α·A·B + β·C`.
///
/// Walks the BLIS loop order:
///
/// ```text
/// for jc in 0..N step NC            B block of NC columns
///   for pc in 0..K step KC          pack B[pc.., jc..] (KC × NC)
///     for ic in 0..M step MC        pack A[ic.., pc..] (MC × KC)
///       for jr in 0..NC step NR
///         for ir in 0..MC step MR   microkernel → MR × NR tile of C
/// ```
///
/// `mc`, `kc` and `nc` come from `params`; the register tile comes from the
/// kernel. Edges that don't fill a whole tile run on zero-padded panels and
/// only the valid corner is written back.
///
/// When `m`, `n` or `k` is zero (or `α = 0`) only the `β` scaling happens
/// and the kernel is never called.
pub fn gemm_blocked<T, K>(
    kernel: &K,
    params: &BlockParams,
    alpha: T,
    a: MatRef<'_, T>,
    b: MatRef<'_, T>,
    beta: T,
    mut c: MatMut<'_, T>,
) -> Result<()>
where
    T: Element,
    K: Microkernel<T> + ?Sized,
{
    check_shapes(&a, &b, &c)?;
    params.validate()?;

    let (m, k, n) = (a.rows(), a.cols(), b.cols());
    let (mr, nr) = (kernel.mr(), kernel.nr());
    if mr == 0 || nr == 0 {
        let (name, value) = if mr == 0 { ("mr", mr) } else { ("nr", nr) };
        return Err(GemmError::InvalidBlockParam { name, value });
    }

    debug!(
        m,
        n,
        k,
        mc = params.mc,
        kc = params.kc,
        nc = params.nc,
        mr,
        nr,
        kernel = kernel.name(),
        "blocked gemm"
    );

    c.scale(beta);
    if m == 0 || n == 0 || k == 0 || alpha == T::ZERO {
        return Ok(());
    }

    let mc = params.mc.min(m);
    let kc = params.kc.min(k);
    let nc = params.nc.min(n);
    let mut a_pack = vec![T::ZERO; packed_a_len(mc, kc, mr)];
    let mut b_pack = vec![T::ZERO; packed_b_len(kc, nc, nr)];
    let mut tile = vec![T::ZERO; mr * nr];

    for (jc, nc_len) in BlockIterator::new(n, params.nc) {
        for (pc, kc_len) in BlockIterator::new(k, params.kc) {
            pack_b(b.submatrix(pc, jc, kc_len, nc_len), nr, &mut b_pack);

            for (ic, mc_len) in BlockIterator::new(m, params.mc) {
                trace!(ic, pc, jc, mc_len, kc_len, nc_len, "macro-block");
                pack_a(a.submatrix(ic, pc, mc_len, kc_len), mr, &mut a_pack);

                let block = MacroBlock {
                    ic,
                    jc,
                    mc: mc_len,
                    kc: kc_len,
                    nc: nc_len,
                };
                block.run(kernel, alpha, &a_pack, &b_pack, &mut tile, &mut c);
            }
        }
    }

    Ok(())
}

/// One packed `MC×KC` by `KC×NC` product, anchored at `(ic, jc)` in C.
struct MacroBlock {
    ic: usize,
    jc: usize,
    mc: usize,
    kc: usize,
    nc: usize,
}

impl MacroBlock {
    /// The two register-blocking loops around the microkernel.
    fn run<T, K>(
        &self,
        kernel: &K,
        alpha: T,
        a_pack: &[T],
        b_pack: &[T],
        tile: &mut [T],
        c: &mut MatMut<'_, T>,
    ) where
        T: Element,
        K: Microkernel<T> + ?Sized,
    {
        let (mr, nr) = (kernel.mr(), kernel.nr());
        let a_panel_len = mr * self.kc;
        let b_panel_len = nr * self.kc;

        for (s, (jr, nr_len)) in BlockIterator::new(self.nc, nr).enumerate() {
            let b_panel = &b_pack[s * b_panel_len..(s + 1) * b_panel_len];

            for (r, (ir, mr_len)) in BlockIterator::new(self.mc, mr).enumerate() {
                let a_panel = &a_pack[r * a_panel_len..(r + 1) * a_panel_len];

                tile.fill(T::ZERO);
                kernel.compute(self.kc, a_panel, b_panel, tile);
                c.add_scaled_tile(self.ic + ir, self.jc + jr, mr_len, nr_len, alpha, tile, nr);
            }
        }
    }
}
