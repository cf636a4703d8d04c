//! Tile-size constants and block parameters for the blocked GEMM.
//!
//! The five constants below are the build-time configuration of the crate.
//! `MC`, `KC` and `NC` size the macro-blocks the loop nest walks over
//! (`MC×KC` for A, `KC×NC` for B), while `MR` and `NR` size the register
//! tile each microkernel call updates.
//!
//! All of them are `1` here, which makes the blocked path degenerate into an
//! element-at-a-time multiply: same result, no cache reuse. Faster settings
//! are available at runtime through [`BlockParams`].

use serde::{Deserialize, Serialize};

use crate::error::{GemmError, Result};

/// Height of the packed A block (rows of A and C per macro-block).
pub const MC: usize = 1;
/// Width of the packed A block / height of the packed B block.
pub const KC: usize = 1;
/// Width of the packed B block (columns of B and C per macro-block).
pub const NC: usize = 1;
/// Rows of C updated by one microkernel call.
pub const MR: usize = 1;
/// Columns of C updated by one microkernel call.
pub const NR: usize = 1;

const _: () = assert!(
    MC > 0 && KC > 0 && NC > 0 && MR > 0 && NR > 0,
    "block constants must be positive"
);

/// Runtime block sizes for the loop nest.
///
/// | Field | Blocks | Cache level |
/// |-------|--------|-------------|
/// | `mc`  | rows of A / C | L2 |
/// | `kc`  | shared reduction dimension | L1 |
/// | `nc`  | columns of B / C | L3 |
/// | `mr`  | microkernel rows | registers |
/// | `nr`  | microkernel columns | registers |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockParams {
    pub mc: usize,
    pub kc: usize,
    pub nc: usize,
    pub mr: usize,
    pub nr: usize,
}

impl BlockParams {
    /// The build-time constants.
    pub const COMPILED: Self = Self::new(MC, KC, NC, MR, NR);

    /// Scalar blocking that actually reuses cache.
    pub const PORTABLE: Self = Self::new(64, 256, 256, 4, 4);

    /// Blocking for the 4×4 AVX2 kernel.
    pub const AVX2_4X4: Self = Self::new(128, 256, 2048, 4, 4);

    /// Blocking for the 12×4 AVX2 kernel. `mc` is a multiple of 12.
    pub const AVX2_12X4: Self = Self::new(120, 256, 2048, 12, 4);

    /// Blocking for the 8×8 AVX-512 kernel.
    pub const AVX512_8X8: Self = Self::new(128, 256, 2048, 8, 8);

    pub const fn new(mc: usize, kc: usize, nc: usize, mr: usize, nr: usize) -> Self {
        Self { mc, kc, nc, mr, nr }
    }

    /// Check that every block size is positive.
    ///
    /// Divisibility between `mc`/`mr` and `nc`/`nr` is not required; the
    /// loop nest pads remainder tiles.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("mc", self.mc),
            ("kc", self.kc),
            ("nc", self.nc),
            ("mr", self.mr),
            ("nr", self.nr),
        ] {
            if value == 0 {
                return Err(GemmError::InvalidBlockParam { name, value });
            }
        }
        Ok(())
    }

    /// True when `mr` divides `mc` and `nr` divides `nc`, i.e. no macro-block
    /// ends in a padded tile except at the matrix edge.
    pub fn is_register_aligned(&self) -> bool {
        self.mr != 0
            && self.nr != 0
            && self.mc.is_multiple_of(self.mr)
            && self.nc.is_multiple_of(self.nr)
    }

    /// Same cache blocking, different register tile.
    pub fn with_tile(self, mr: usize, nr: usize) -> Self {
        Self { mr, nr, ..self }
    }
}

impl Default for BlockParams {
    fn default() -> Self {
        Self::COMPILED
    }
}

/// Iterator over `(start, len)` blocks of one dimension.
///
/// The last block is shorter when `block_size` doesn't divide `total`.
#[derive(Debug, Clone)]
pub struct BlockIterator {
    total: usize,
    block_size: usize,
    current: usize,
}

impl BlockIterator {
    pub fn new(total: usize, block_size: usize) -> Self {
        debug_assert!(block_size > 0, "block size must be positive");
        Self {
            total,
            block_size,
            current: 0,
        }
    }
}

impl Iterator for BlockIterator {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.total {
            return None;
        }

        let start = self.current;
        let len = (self.total - start).min(self.block_size);
        self.current += len;

        Some((start, len))
    }
}
