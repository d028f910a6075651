//! Errors raised while configuring or feeding an [`FdUNet`](crate::fd_unet::FdUNet).

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FdUNetError {
    #[error("unknown activation: {name}")]
    UnknownActivation { name: String },

    #[error("unknown kernel initializer: {name}")]
    UnknownInitializer { name: String },

    #[error("unknown padding: {name}")]
    UnknownPadding { name: String },

    #[error("filters must be at least 4 so every dense block grows, got {filters}")]
    InvalidFilters { filters: usize },

    #[error("kernel size must be positive, got {kernel_size}")]
    InvalidKernelSize { kernel_size: usize },

    #[error("the skip connections need `same` padding, got `{padding}`")]
    UnsupportedPadding { padding: String },

    #[error("dropout probability must be in [0, 1), got {prob}")]
    InvalidDropout { prob: f64 },

    #[error("invalid input shape {shape:?}: {reason}")]
    InvalidInputShape { shape: [usize; 3], reason: String },

    #[error("invalid input dims {dims:?}: {reason}")]
    InvalidInput { dims: [usize; 4], reason: String },
}
