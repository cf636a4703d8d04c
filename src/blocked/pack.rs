//! Panel packing for the microkernels.
//!
//! Packing copies a macro-block of A or B into a contiguous buffer laid out
//! exactly in the order the microkernel reads it, so the innermost loop
//! streams through memory with stride 1 regardless of the source strides.
//! Panels at the right/bottom edge are zero-padded to a full `MR`/`NR`,
//! which lets every kernel call compute a whole tile.

use crate::matrix::{Element, MatRef};
use crate::params::BlockIterator;

/// Buffer length for an `mc × kc` block of A packed into `mr`-row panels.
pub fn packed_a_len(mc: usize, kc: usize, mr: usize) -> usize {
    mc.div_ceil(mr) * mr * kc
}

/// Buffer length for a `kc × nc` block of B packed into `nr`-column panels.
pub fn packed_b_len(kc: usize, nc: usize, nr: usize) -> usize {
    nc.div_ceil(nr) * nr * kc
}

/// Pack an `mc × kc` block of A into consecutive `mr`-row panels.
///
/// Panel `r` covers rows `r*mr .. r*mr+mr` and is laid out column by column:
/// `[a(0,0) a(1,0) .. a(mr-1,0) | a(0,1) a(1,1) .. | ...]`.
///
/// # Panics
///
/// Panics if `packed` is shorter than [`packed_a_len`].
pub fn pack_a<T: Element>(a: MatRef<'_, T>, mr: usize, packed: &mut [T]) {
    let (mc, kc) = (a.rows(), a.cols());
    if mc == 0 || kc == 0 {
        return;
    }
    let len = packed_a_len(mc, kc, mr);
    assert!(packed.len() >= len, "A pack buffer: need {}, have {}", len, packed.len());

    let panels = packed[..len].chunks_exact_mut(mr * kc);
    for (panel, (ir, rows)) in panels.zip(BlockIterator::new(mc, mr)) {
        for (p, dst) in panel.chunks_exact_mut(mr).enumerate() {
            match a.col_segment(ir, p, rows) {
                Some(src) => dst[..rows].copy_from_slice(src),
                None => {
                    for (i, d) in dst[..rows].iter_mut().enumerate() {
                        *d = a.get(ir + i, p);
                    }
                }
            }
            dst[rows..].fill(T::ZERO);
        }
    }
}

/// Pack a `kc × nc` block of B into consecutive `nr`-column panels.
///
/// Panel `s` covers columns `s*nr .. s*nr+nr` and is laid out row by row:
/// `[b(0,0) b(0,1) .. b(0,nr-1) | b(1,0) b(1,1) .. | ...]`.
///
/// # Panics
///
/// Panics if `packed` is shorter than [`packed_b_len`].
pub fn pack_b<T: Element>(b: MatRef<'_, T>, nr: usize, packed: &mut [T]) {
    let (kc, nc) = (b.rows(), b.cols());
    if kc == 0 || nc == 0 {
        return;
    }
    let len = packed_b_len(kc, nc, nr);
    assert!(packed.len() >= len, "B pack buffer: need {}, have {}", len, packed.len());

    let panels = packed[..len].chunks_exact_mut(nr * kc);
    for (panel, (jr, cols)) in panels.zip(BlockIterator::new(nc, nr)) {
        for (p, dst) in panel.chunks_exact_mut(nr).enumerate() {
            match b.row_segment(p, jr, cols) {
                Some(src) => dst[..cols].copy_from_slice(src),
                None => {
                    for (j, d) in dst[..cols].iter_mut().enumerate() {
                        *d = b.get(p, jr + j);
                    }
                }
            }
            dst[cols..].fill(T::ZERO);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Layout;

    #[test]
    fn test_packed_lengths() {
        assert_eq!(packed_a_len(8, 3, 4), 24);
        assert_eq!(packed_a_len(9, 3, 4), 36);
        assert_eq!(packed_b_len(3, 5, 2), 18);
        assert_eq!(packed_a_len(0, 3, 4), 0);
        assert_eq!(packed_b_len(1, 1, 1), 1);
    }

    #[test]
    fn test_pack_a_pads_bottom_panel() {
        // 3×2 block, mr = 2 → two panels, the second half empty.
        let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let a = MatRef::from_slice(&data, 3, 2, Layout::RowMajor).unwrap();
        let mut packed = vec![-1.0; packed_a_len(3, 2, 2)];
        pack_a(a, 2, &mut packed);
        assert_eq!(packed, vec![1.0, 3.0, 2.0, 4.0, 5.0, 0.0, 6.0, 0.0]);
    }

    #[test]
    fn test_pack_a_col_major_matches_row_major() {
        let row: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let a_row = MatRef::from_slice(&row, 5, 4, Layout::RowMajor).unwrap();
        let col = a_row.t().to_row_major();
        let a_col = MatRef::from_slice(&col, 5, 4, Layout::ColMajor).unwrap();

        let len = packed_a_len(5, 4, 3);
        let mut from_row = vec![0.0; len];
        let mut from_col = vec![0.0; len];
        pack_a(a_row, 3, &mut from_row);
        pack_a(a_col, 3, &mut from_col);
        assert_eq!(from_row, from_col);
    }

    #[test]
    fn test_pack_b_pads_right_panel() {
        // 2×3 block, nr = 2 → panels [cols 0,1] and [col 2, pad].
        let data = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
        let b = MatRef::from_slice(&data, 2, 3, Layout::RowMajor).unwrap();
        let mut packed = vec![-1.0; packed_b_len(2, 3, 2)];
        pack_b(b, 2, &mut packed);
        assert_eq!(packed, vec![1.0, 2.0, 4.0, 5.0, 3.0, 0.0, 6.0, 0.0]);
    }

    #[test]
    fn test_pack_b_of_submatrix() {
        let data: Vec<f64> = (0..16).map(|i| i as f64).collect();
        let b = MatRef::from_slice(&data, 4, 4, Layout::RowMajor).unwrap();
        let mut packed = vec![0.0; packed_b_len(2, 2, 2)];
        pack_b(b.submatrix(1, 2, 2, 2), 2, &mut packed);
        assert_eq!(packed, vec![6.0, 7.0, 10.0, 11.0]);
    }

    #[test]
    fn test_unit_panels_are_plain_copies() {
        let data = [1.0, 2.0, 3.0, 4.0];
        let a = MatRef::from_slice(&data, 2, 2, Layout::RowMajor).unwrap();
        let mut packed = vec![0.0; 4];
        pack_a(a, 1, &mut packed);
        assert_eq!(packed, vec![1.0, 2.0, 3.0, 4.0]);
        pack_b(a, 1, &mut packed);
        assert_eq!(packed, vec![1.0, 3.0, 2.0, 4.0]);
    }
}
