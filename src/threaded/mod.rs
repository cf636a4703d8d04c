//! Multi-threaded GEMM.
//!
//! Wraps the blocked loop nest with parallel execution across bands of C.
//! Thread count adapts to matrix size - small matrices use fewer threads
//! to avoid overhead.

pub mod gemm_mt;

pub use gemm_mt::{choose_thread_count, gemm_parallel};
