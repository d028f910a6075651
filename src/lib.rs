//! Fully Dense U-Net with spatial dropout, for image-to-image tasks
//! (denoising, reconstruction, inverse problems) whose output has the shape of the input.

pub mod conv;
pub mod error;
pub mod fd_unet;
pub mod utils;

pub mod prelude {
    pub use crate::conv::*;
    pub use crate::error::FdUNetError;
    pub use crate::fd_unet::*;
    pub use crate::utils::{
        activation::Activation,
        initializer::KernelInitializer,
        padding::Padding,
        spatial_dropout::{SpatialDropout2d, SpatialDropout2dConfig},
    };
}
