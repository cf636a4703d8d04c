//! Strided matrix views over caller-owned buffers.
//!
//! Element `(i, j)` of a view lives at `data[i * row_stride + j * col_stride]`.
//! Row-major and column-major buffers are the two dense special cases, and a
//! transpose is just a stride swap.

use serde::{Deserialize, Serialize};

use super::element::Element;
use crate::error::{GemmError, Result};

/// Storage order of a dense buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Layout {
    #[default]
    RowMajor,
    ColMajor,
}

impl Layout {
    /// `(row_stride, col_stride)` of a dense `rows × cols` matrix.
    pub fn strides(self, rows: usize, cols: usize) -> (usize, usize) {
        match self {
            Layout::RowMajor => (cols, 1),
            Layout::ColMajor => (1, rows),
        }
    }
}

/// Number of elements a view has to be able to reach.
fn required_len(rows: usize, cols: usize, row_stride: usize, col_stride: usize) -> usize {
    if rows == 0 || cols == 0 {
        return 0;
    }
    (rows - 1)
        .saturating_mul(row_stride)
        .saturating_add((cols - 1).saturating_mul(col_stride))
        .saturating_add(1)
}

fn check_extent(
    operand: &'static str,
    len: usize,
    rows: usize,
    cols: usize,
    row_stride: usize,
    col_stride: usize,
) -> Result<()> {
    let required = required_len(rows, cols, row_stride, col_stride);
    if len < required {
        return Err(GemmError::BufferTooSmall {
            operand,
            required,
            actual: len,
        });
    }
    Ok(())
}

/// Immutable strided view.
#[derive(Debug, Clone, Copy)]
pub struct MatRef<'a, T> {
    data: &'a [T],
    rows: usize,
    cols: usize,
    row_stride: usize,
    col_stride: usize,
}

impl<'a, T: Element> MatRef<'a, T> {
    /// Dense view with the given storage order.
    ///
    /// # Example
    ///
    /// ```
    /// use blocked_gemm::{Layout, MatRef};
    ///
    /// let data = [1.0, 2.0, 3.0,
    ///             4.0, 5.0, 6.0];
    /// let a = MatRef::from_slice(&data, 2, 3, Layout::RowMajor).unwrap();
    /// assert_eq!(a.get(1, 0), 4.0);
    /// assert_eq!(a.t().get(0, 1), 4.0);
    /// ```
    pub fn from_slice(data: &'a [T], rows: usize, cols: usize, layout: Layout) -> Result<Self> {
        let (row_stride, col_stride) = layout.strides(rows, cols);
        Self::from_strided(data, rows, cols, row_stride, col_stride)
    }

    /// View with explicit strides. Zero strides are allowed (broadcast).
    pub fn from_strided(
        data: &'a [T],
        rows: usize,
        cols: usize,
        row_stride: usize,
        col_stride: usize,
    ) -> Result<Self> {
        Self::named(data, rows, cols, row_stride, col_stride, "matrix")
    }

    pub(crate) fn named(
        data: &'a [T],
        rows: usize,
        cols: usize,
        row_stride: usize,
        col_stride: usize,
        operand: &'static str,
    ) -> Result<Self> {
        check_extent(operand, data.len(), rows, cols, row_stride, col_stride)?;
        Ok(Self {
            data,
            rows,
            cols,
            row_stride,
            col_stride,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn row_stride(&self) -> usize {
        self.row_stride
    }

    pub fn col_stride(&self) -> usize {
        self.col_stride
    }

    /// Element `(i, j)`.
    ///
    /// # Panics
    ///
    /// Panics if `(i, j)` is outside the view.
    #[inline(always)]
    pub fn get(&self, i: usize, j: usize) -> T {
        debug_assert!(i < self.rows && j < self.cols);
        self.data[i * self.row_stride + j * self.col_stride]
    }

    /// Transposed view; no data moves.
    pub fn t(self) -> MatRef<'a, T> {
        MatRef {
            data: self.data,
            rows: self.cols,
            cols: self.rows,
            row_stride: self.col_stride,
            col_stride: self.row_stride,
        }
    }

    /// View of the `rows × cols` block starting at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if the block doesn't fit inside this view.
    pub fn submatrix(self, row: usize, col: usize, rows: usize, cols: usize) -> MatRef<'a, T> {
        assert!(
            row + rows <= self.rows && col + cols <= self.cols,
            "block {}x{} at ({}, {}) exceeds {}x{} view",
            rows,
            cols,
            row,
            col,
            self.rows,
            self.cols
        );
        let data = if rows == 0 || cols == 0 {
            &self.data[..0]
        } else {
            &self.data[row * self.row_stride + col * self.col_stride..]
        };
        MatRef {
            data,
            rows,
            cols,
            row_stride: self.row_stride,
            col_stride: self.col_stride,
        }
    }

    /// `len` elements of row `i` starting at column `j`, when they are
    /// adjacent in memory.
    #[inline]
    pub fn row_segment(&self, i: usize, j: usize, len: usize) -> Option<&'a [T]> {
        if len == 0 || (self.col_stride != 1 && len > 1) {
            return None;
        }
        debug_assert!(i < self.rows && j + len <= self.cols);
        let start = i * self.row_stride + j * self.col_stride;
        Some(&self.data[start..start + len])
    }

    /// `len` elements of column `j` starting at row `i`, when they are
    /// adjacent in memory.
    #[inline]
    pub fn col_segment(&self, i: usize, j: usize, len: usize) -> Option<&'a [T]> {
        self.t().row_segment(j, i, len)
    }

    /// Copy into a fresh row-major buffer.
    pub fn to_row_major(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.rows * self.cols);
        for i in 0..self.rows {
            for j in 0..self.cols {
                out.push(self.get(i, j));
            }
        }
        out
    }
}

/// Mutable strided view. Distinct positions always address distinct elements.
#[derive(Debug)]
pub struct MatMut<'a, T> {
    data: &'a mut [T],
    rows: usize,
    cols: usize,
    row_stride: usize,
    col_stride: usize,
}

impl<'a, T: Element> MatMut<'a, T> {
    /// Dense mutable view with the given storage order.
    pub fn from_slice(
        data: &'a mut [T],
        rows: usize,
        cols: usize,
        layout: Layout,
    ) -> Result<Self> {
        let (row_stride, col_stride) = layout.strides(rows, cols);
        Self::from_strided(data, rows, cols, row_stride, col_stride)
    }

    /// Mutable view with explicit strides.
    ///
    /// Rejects stride patterns where the inner axis spills into the next
    /// outer step, since two outputs would then share one element.
    pub fn from_strided(
        data: &'a mut [T],
        rows: usize,
        cols: usize,
        row_stride: usize,
        col_stride: usize,
    ) -> Result<Self> {
        Self::named(data, rows, cols, row_stride, col_stride, "matrix")
    }

    pub(crate) fn named(
        data: &'a mut [T],
        rows: usize,
        cols: usize,
        row_stride: usize,
        col_stride: usize,
        operand: &'static str,
    ) -> Result<Self> {
        check_extent(operand, data.len(), rows, cols, row_stride, col_stride)?;
        if !is_injective(rows, cols, row_stride, col_stride) {
            return Err(GemmError::AliasedOutput {
                rows,
                cols,
                row_stride,
                col_stride,
            });
        }
        Ok(Self {
            data,
            rows,
            cols,
            row_stride,
            col_stride,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline(always)]
    pub fn get(&self, i: usize, j: usize) -> T {
        debug_assert!(i < self.rows && j < self.cols);
        self.data[i * self.row_stride + j * self.col_stride]
    }

    #[inline(always)]
    fn at(&mut self, i: usize, j: usize) -> &mut T {
        debug_assert!(i < self.rows && j < self.cols);
        &mut self.data[i * self.row_stride + j * self.col_stride]
    }

    /// `C ← β·C`. With `β = 0` the old contents are never read.
    pub fn scale(&mut self, beta: T) {
        if beta == T::ONE {
            return;
        }
        for i in 0..self.rows {
            for j in 0..self.cols {
                let c = self.at(i, j);
                if beta == T::ZERO {
                    *c = T::ZERO;
                } else {
                    *c *= beta;
                }
            }
        }
    }

    /// `C[row + i, col + j] += α·tile[i·ldt + j]` for the `rows × cols` corner
    /// of a kernel tile.
    #[allow(clippy::too_many_arguments)]
    pub fn add_scaled_tile(
        &mut self,
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
        alpha: T,
        tile: &[T],
        ldt: usize,
    ) {
        debug_assert!(row + rows <= self.rows && col + cols <= self.cols);
        for i in 0..rows {
            let tile_row = &tile[i * ldt..i * ldt + cols];
            for (j, &t) in tile_row.iter().enumerate() {
                let c = self.at(row + i, col + j);
                if alpha == T::ONE {
                    *c += t;
                } else {
                    *c += alpha * t;
                }
            }
        }
    }

    /// True when bands of rows (rather than columns) are contiguous.
    ///
    /// A single row or column splits along its only non-trivial axis,
    /// whatever its strides.
    pub fn rows_are_outer(&self) -> bool {
        match (self.rows, self.cols) {
            (1, c) if c > 1 => false,
            (r, 1) if r > 1 => true,
            _ => self.row_stride >= self.col_stride,
        }
    }

    /// Length of the outer axis.
    pub fn outer_len(&self) -> usize {
        if self.rows_are_outer() {
            self.rows
        } else {
            self.cols
        }
    }

    /// Split along the outer axis into `[0, mid)` and `[mid, outer_len)`.
    ///
    /// # Panics
    ///
    /// Panics if `mid > outer_len()`.
    pub fn split_outer(self, mid: usize) -> (MatMut<'a, T>, MatMut<'a, T>) {
        let rows_outer = self.rows_are_outer();
        let (outer_len, outer_stride) = if rows_outer {
            (self.rows, self.row_stride)
        } else {
            (self.cols, self.col_stride)
        };
        assert!(mid <= outer_len, "split {} beyond outer length {}", mid, outer_len);

        // The tail starts at outer index `mid`; a full split keeps everything.
        let at = if mid == outer_len {
            self.data.len()
        } else {
            mid * outer_stride
        };
        let (head, tail) = self.data.split_at_mut(at);
        let (head_rows, head_cols, tail_rows, tail_cols) = if rows_outer {
            (mid, self.cols, self.rows - mid, self.cols)
        } else {
            (self.rows, mid, self.rows, self.cols - mid)
        };

        (
            MatMut {
                data: head,
                rows: head_rows,
                cols: head_cols,
                row_stride: self.row_stride,
                col_stride: self.col_stride,
            },
            MatMut {
                data: tail,
                rows: tail_rows,
                cols: tail_cols,
                row_stride: self.row_stride,
                col_stride: self.col_stride,
            },
        )
    }
}

/// Sufficient condition for distinct `(i, j)` to map to distinct offsets:
/// the whole inner axis fits within one step of the outer axis.
fn is_injective(rows: usize, cols: usize, row_stride: usize, col_stride: usize) -> bool {
    if rows == 0 || cols == 0 || (rows == 1 && cols == 1) {
        return true;
    }
    if rows <= 1 {
        return col_stride > 0;
    }
    if cols <= 1 {
        return row_stride > 0;
    }
    let (outer, inner, inner_len) = if row_stride >= col_stride {
        (row_stride, col_stride, cols)
    } else {
        (col_stride, row_stride, rows)
    };
    inner > 0 && inner * (inner_len - 1) < outer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_strides() {
        assert_eq!(Layout::RowMajor.strides(2, 3), (3, 1));
        assert_eq!(Layout::ColMajor.strides(2, 3), (1, 2));
    }

    #[test]
    fn test_row_and_col_major_agree() {
        let row_major = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let col_major = [1.0, 4.0, 2.0, 5.0, 3.0, 6.0];
        let r = MatRef::from_slice(&row_major, 2, 3, Layout::RowMajor).unwrap();
        let c = MatRef::from_slice(&col_major, 2, 3, Layout::ColMajor).unwrap();
        assert_eq!(r.to_row_major(), c.to_row_major());
    }

    #[test]
    fn test_transpose_view() {
        let data = [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0];
        let a = MatRef::from_slice(&data, 2, 3, Layout::RowMajor).unwrap();
        let at = a.t();
        assert_eq!((at.rows(), at.cols()), (3, 2));
        assert_eq!(at.to_row_major(), vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn test_submatrix() {
        let data: Vec<f64> = (0..16).map(|i| i as f64).collect();
        let a = MatRef::from_slice(&data, 4, 4, Layout::RowMajor).unwrap();
        let block = a.submatrix(1, 2, 2, 2);
        assert_eq!(block.to_row_major(), vec![6.0, 7.0, 10.0, 11.0]);

        let empty = a.submatrix(4, 0, 0, 4);
        assert_eq!(empty.rows(), 0);
        assert!(empty.to_row_major().is_empty());
    }

    #[test]
    fn test_contiguous_segments() {
        let data: Vec<f64> = (0..6).map(|i| i as f64).collect();
        let r = MatRef::from_slice(&data, 2, 3, Layout::RowMajor).unwrap();
        assert_eq!(r.row_segment(1, 1, 2), Some(&[4.0, 5.0][..]));
        assert_eq!(r.col_segment(0, 1, 2), None);

        let c = MatRef::from_slice(&data, 2, 3, Layout::ColMajor).unwrap();
        assert_eq!(c.col_segment(0, 2, 2), Some(&[4.0, 5.0][..]));
        assert_eq!(c.row_segment(0, 0, 3), None);
    }

    #[test]
    fn test_buffer_too_small() {
        let data = [0.0f32; 5];
        let err = MatRef::from_slice(&data, 2, 3, Layout::RowMajor).unwrap_err();
        assert!(matches!(
            err,
            GemmError::BufferTooSmall {
                required: 6,
                actual: 5,
                ..
            }
        ));

        // An empty view needs no storage at all.
        assert!(MatRef::<f32>::from_slice(&[], 0, 7, Layout::RowMajor).is_ok());
    }

    #[test]
    fn test_padded_stride_needs_only_reachable_elements() {
        // 2×2 matrix with leading dimension 4: last row doesn't need padding.
        let data = [1.0f64, 2.0, 9.0, 9.0, 3.0, 4.0];
        let a = MatRef::from_strided(&data, 2, 2, 4, 1).unwrap();
        assert_eq!(a.to_row_major(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_broadcast_input_allowed_output_rejected() {
        let data = [2.0f64];
        let a = MatRef::from_strided(&data, 3, 3, 0, 0).unwrap();
        assert_eq!(a.get(2, 2), 2.0);

        let mut out = [0.0f64; 3];
        let err = MatMut::from_strided(&mut out, 3, 3, 1, 0).unwrap_err();
        assert!(matches!(err, GemmError::AliasedOutput { .. }));

        let mut out = [0.0f64; 9];
        assert!(MatMut::from_strided(&mut out, 3, 3, 2, 1).is_err());
        assert!(MatMut::from_strided(&mut out, 3, 3, 3, 1).is_ok());
    }

    #[test]
    fn test_empty_output_views() {
        let mut none: [f64; 0] = [];
        // Row-major 3×0 has row stride 0; nothing is written, so it's fine.
        let c = MatMut::from_slice(&mut none, 3, 0, Layout::RowMajor).unwrap();
        assert_eq!((c.rows(), c.cols()), (3, 0));
        assert!(MatMut::from_slice(&mut none, 0, 4, Layout::ColMajor).is_ok());
    }

    #[test]
    fn test_scale_zero_ignores_nan() {
        let mut data = [f64::NAN, 1.0, 2.0, 3.0];
        let mut c = MatMut::from_slice(&mut data, 2, 2, Layout::RowMajor).unwrap();
        c.scale(0.0);
        assert_eq!(data, [0.0; 4]);

        let mut data = [1.0, 2.0, 3.0, 4.0];
        let mut c = MatMut::from_slice(&mut data, 2, 2, Layout::ColMajor).unwrap();
        c.scale(2.0);
        assert_eq!(data, [2.0, 4.0, 6.0, 8.0]);
    }

    #[test]
    fn test_add_scaled_tile_partial_corner() {
        let mut data = [0.0f64; 9];
        let mut c = MatMut::from_slice(&mut data, 3, 3, Layout::RowMajor).unwrap();
        // 2×2 tile, only the 1×2 corner lands in C.
        let tile = [1.0, 2.0, 3.0, 4.0];
        c.add_scaled_tile(2, 1, 1, 2, 10.0, &tile, 2);
        assert_eq!(data, [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 10.0, 20.0]);
    }

    #[test]
    fn test_split_outer_row_major() {
        let mut data: Vec<f64> = (0..12).map(|i| i as f64).collect();
        let c = MatMut::from_slice(&mut data, 4, 3, Layout::RowMajor).unwrap();
        assert!(c.rows_are_outer());
        let (top, bottom) = c.split_outer(1);
        assert_eq!((top.rows(), top.cols()), (1, 3));
        assert_eq!((bottom.rows(), bottom.cols()), (3, 3));
        assert_eq!(bottom.get(0, 0), 3.0);
        assert_eq!(bottom.get(2, 2), 11.0);
    }

    #[test]
    fn test_split_outer_col_major() {
        let mut data: Vec<f64> = (0..12).map(|i| i as f64).collect();
        let c = MatMut::from_slice(&mut data, 3, 4, Layout::ColMajor).unwrap();
        assert!(!c.rows_are_outer());
        assert_eq!(c.outer_len(), 4);
        let (left, right) = c.split_outer(3);
        assert_eq!((left.rows(), left.cols()), (3, 3));
        assert_eq!((right.rows(), right.cols()), (3, 1));
        assert_eq!(right.get(1, 0), 10.0);

        let (all, none) = right.split_outer(1);
        assert_eq!(all.cols(), 1);
        assert_eq!(none.cols(), 0);
    }

    #[test]
    fn test_split_outer_single_row_with_wide_row_stride() {
        // 1×5 with row stride 2 > col stride 1: the only axis to split is columns.
        let mut data: Vec<f64> = (0..5).map(|i| i as f64).collect();
        let c = MatMut::from_strided(&mut data, 1, 5, 2, 1).unwrap();
        assert!(!c.rows_are_outer());
        assert_eq!(c.outer_len(), 5);

        let (left, right) = c.split_outer(1);
        assert_eq!((left.rows(), left.cols()), (1, 1));
        assert_eq!((right.rows(), right.cols()), (1, 4));
        assert_eq!(left.get(0, 0), 0.0);
        assert_eq!(right.get(0, 3), 4.0);
    }

    #[test]
    fn test_split_outer_single_column_with_wide_col_stride() {
        // 5×1 with col stride 3 > row stride 2: the only axis to split is rows.
        let mut data: Vec<f64> = (0..9).map(|i| i as f64).collect();
        let c = MatMut::from_strided(&mut data, 5, 1, 2, 3).unwrap();
        assert!(c.rows_are_outer());
        assert_eq!(c.outer_len(), 5);

        let (top, mut bottom) = c.split_outer(1);
        assert_eq!((top.rows(), top.cols()), (1, 1));
        assert_eq!(top.get(0, 0), 0.0);
        assert_eq!((bottom.rows(), bottom.cols()), (4, 1));
        assert_eq!(bottom.get(3, 0), 8.0);

        bottom.add_scaled_tile(0, 0, 4, 1, 1.0, &[1.0, 1.0, 1.0, 1.0], 1);
        assert_eq!(bottom.get(0, 0), 3.0);
        assert_eq!(bottom.get(3, 0), 9.0);
    }

    #[test]
    fn test_split_outer_every_band_reaches_its_elements() {
        let shapes = [
            (1, 5, 2, 1),
            (5, 1, 2, 3),
            (4, 3, 3, 1),
            (3, 4, 1, 3),
            (1, 1, 0, 0),
        ];
        for (rows, cols, rs, cs) in shapes {
            let len = required_len(rows, cols, rs, cs);
            let outer = if rows == 1 && cols > 1 {
                cols
            } else if cols == 1 && rows > 1 {
                rows
            } else if rs >= cs {
                rows
            } else {
                cols
            };

            for mid in 0..=outer {
                let mut data = vec![0.0f64; len];
                let c = MatMut::from_strided(&mut data, rows, cols, rs, cs).unwrap();
                assert_eq!(c.outer_len(), outer);

                // Writing every in-bounds element panics if a band is undersized.
                let (mut head, mut tail) = c.split_outer(mid);
                for band in [&mut head, &mut tail] {
                    let (r, k) = (band.rows(), band.cols());
                    band.add_scaled_tile(0, 0, r, k, 1.0, &vec![1.0; r * k], k);
                }

                let written = data.iter().filter(|&&x| x == 1.0).count();
                assert_eq!(written, rows * cols, "{rows}x{cols} split at {mid}");
            }
        }
    }
}
