//! Error types for GEMM setup and dispatch.

use thiserror::Error;

use crate::dispatch::KernelKind;

/// Errors reported before any arithmetic starts.
#[derive(Debug, Error)]
pub enum GemmError {
    /// A block parameter is zero.
    #[error("block parameter {name} must be positive, got {value}")]
    InvalidBlockParam { name: &'static str, value: usize },

    /// Operand shapes don't line up for C = A * B.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// A buffer is shorter than its view addresses.
    #[error("{operand}: buffer holds {actual} elements but the view needs {required}")]
    BufferTooSmall {
        operand: &'static str,
        required: usize,
        actual: usize,
    },

    /// Two output positions map onto the same element.
    #[error(
        "output view {rows}x{cols} with strides ({row_stride}, {col_stride}) aliases itself"
    )]
    AliasedOutput {
        rows: usize,
        cols: usize,
        row_stride: usize,
        col_stride: usize,
    },

    /// The CPU doesn't support the requested kernel.
    #[error("kernel {0:?} is not supported on this CPU")]
    KernelUnavailable(KernelKind),

    /// Worker pool construction failed.
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result type for GEMM operations.
pub type Result<T> = std::result::Result<T, GemmError>;
