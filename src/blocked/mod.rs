//! Cache-blocked GEMM.
//!
//! The loop nest breaks the multiplication into macro-blocks that fit in
//! L1/L2/L3, packs each block for sequential access, then hands register
//! tiles to a microkernel.
//!
//! - `pack`: zero-padded A and B panels
//! - `gemm`: the five-loop nest driving a [`Microkernel`](crate::kernels::Microkernel)

pub mod gemm;
pub mod pack;

pub(crate) use gemm::check_shapes;
pub use gemm::gemm_blocked;
pub use pack::{pack_a, pack_b, packed_a_len, packed_b_len};
