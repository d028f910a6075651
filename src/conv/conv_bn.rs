use crate::conv::batch_norm;
use crate::utils::{
    activation::Activation,
    initializer::KernelInitializer,
    padding::Padding,
    spatial_dropout::{SpatialDropout2d, SpatialDropout2dConfig},
};
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::{BatchNorm, Initializer, PaddingConfig2d};
use burn::prelude::*;

#[derive(Config, Debug)]
pub struct Conv2dBatchNormConfig {
    pub channels_in: usize,

    /// Output channels.
    pub filters: usize,

    #[config(default = 3)]
    pub kernel_size: usize,

    #[config(default = 1)]
    pub stride: usize,

    #[config(default = "Padding::Same")]
    pub padding: Padding,

    #[config(default = "Activation::Linear")]
    pub activation: Activation,

    #[config(default = "KernelInitializer::GlorotNormal")]
    pub kernel_initializer: KernelInitializer,

    /// Spatial dropout probability.
    #[config(default = 0.0)]
    pub prob: f64,
}

impl Conv2dBatchNormConfig {
    /// Returns the initialized model.
    ///
    /// # Panics
    /// If the kernel size or the stride is zero, or if `prob` is outside of `[0, 1)`.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Conv2dBatchNorm<B> {
        if let Err(e) = self.padding.check_kernel_size(self.kernel_size) {
            panic!("{e}");
        }
        assert!(self.stride > 0, "stride must be positive");
        let k = self.kernel_size;
        let s = self.stride;

        let mut conv = Conv2dConfig::new([self.channels_in, self.filters], [k, k])
            .with_stride([s, s])
            .with_padding(PaddingConfig2d::Valid)
            .with_initializer(self.kernel_initializer.to_initializer())
            .with_bias(true)
            .init(device);
        conv.bias = Some(Initializer::Zeros.init([self.filters], device));

        log::debug!(
            "conv2d {}→{} (k={k}, s={s}, {}, {}, p={})",
            self.channels_in,
            self.filters,
            self.padding,
            self.activation,
            self.prob
        );

        Conv2dBatchNorm {
            conv,
            padding: self.padding,
            activation: self.activation,
            dropout: SpatialDropout2dConfig::new(self.prob).init(),
            norm: batch_norm(self.filters, device),
        }
    }
}

/// Conv2d → activation → spatial dropout → batch norm.
#[derive(Module, Debug)]
pub struct Conv2dBatchNorm<B: Backend> {
    /// Unpadded; the input is padded in `forward`.
    pub conv: Conv2d<B>,
    pub padding: Padding,
    pub activation: Activation,
    pub dropout: SpatialDropout2d,
    pub norm: BatchNorm<B, 2>,
}

impl<B: Backend> Conv2dBatchNorm<B> {
    /// # Shapes
    ///   - Input [batch, channels_in, height, width]
    ///   - Output [batch, filters, height_out, width_out]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self
            .padding
            .pad_input(x, self.conv.kernel_size, self.conv.stride);
        let x = self.conv.forward(x);
        let x = self.activation.forward(x);
        let x = self.dropout.forward(x);
        self.norm.forward(x)
    }

    pub fn filters(&self) -> usize {
        let [filters, _, _, _] = self.conv.weight.dims();
        filters
    }
}
