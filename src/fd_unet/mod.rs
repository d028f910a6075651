//! A U-Net whose stages are built from Fully Dense blocks, regularized with spatial dropout.
//!
//! References:
//! - https://www.tandfonline.com/doi/full/10.1080/17415977.2018.1518444
//! - https://arxiv.org/abs/1808.10848

mod block;
mod fd_block;
mod network;
mod sample;

pub use block::{BridgeBlock, BridgeBlockConfig, DownBlock, DownBlockConfig, UpBlock, UpBlockConfig};
pub use fd_block::{FdBlock, FdBlockConfig, FdLayer};
pub use network::{DEPTH, FdUNet, FdUNetConfig, MODEL_NAME, get_model};
pub use sample::{DownSample, DownSampleConfig, UpSample, UpSampleConfig};

use crate::conv::{Conv2dBatchNormConfig, ConvTranspose2dBatchNormConfig};
use crate::utils::{activation::Activation, initializer::KernelInitializer, padding::Padding};
use burn::prelude::*;

/// Hyperparameters shared by every convolution of the network.
#[derive(Config, Debug)]
pub struct LayerSettings {
    /// Side of the square kernels that are not 1×1.
    #[config(default = 3)]
    pub kernel_size: usize,

    #[config(default = "Padding::Same")]
    pub padding: Padding,

    #[config(default = "Activation::Relu")]
    pub activation: Activation,

    #[config(default = "KernelInitializer::GlorotNormal")]
    pub kernel_initializer: KernelInitializer,

    /// Spatial dropout probability.
    #[config(default = 0.05)]
    pub prob: f64,
}

impl LayerSettings {
    pub fn conv(&self, channels_in: usize, filters: usize) -> Conv2dBatchNormConfig {
        Conv2dBatchNormConfig::new(channels_in, filters)
            .with_kernel_size(self.kernel_size)
            .with_stride(1)
            .with_padding(self.padding)
            .with_activation(self.activation)
            .with_kernel_initializer(self.kernel_initializer)
            .with_prob(self.prob)
    }

    pub fn conv_1x1(&self, channels_in: usize, filters: usize) -> Conv2dBatchNormConfig {
        self.conv(channels_in, filters).with_kernel_size(1)
    }

    pub fn conv_transpose(
        &self,
        channels_in: usize,
        filters: usize,
        stride: usize,
    ) -> ConvTranspose2dBatchNormConfig {
        ConvTranspose2dBatchNormConfig::new(channels_in, filters)
            .with_kernel_size(self.kernel_size)
            .with_stride(stride)
            .with_padding(self.padding)
            .with_activation(self.activation)
            .with_kernel_initializer(self.kernel_initializer)
            .with_prob(self.prob)
    }
}
