//! Matrix element types, strided views and naive implementations.
//!
//! The naive multiplies are the correctness baselines the blocked GEMM is
//! tested and benchmarked against.

pub mod element;
pub mod naive_ijk;
pub mod naive_ikj;
pub mod view;

pub use element::Element;
pub use naive_ijk::{gemm_reference, matmul_naive_ijk};
pub use naive_ikj::matmul_naive_ikj;
pub use view::{Layout, MatMut, MatRef};
