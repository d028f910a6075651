use crate::conv::batch_norm;
use crate::utils::{
    activation::Activation,
    initializer::KernelInitializer,
    padding::Padding,
    spatial_dropout::{SpatialDropout2d, SpatialDropout2dConfig},
};
use burn::nn::conv::{ConvTranspose2d, ConvTranspose2dConfig};
use burn::nn::{BatchNorm, Initializer};
use burn::prelude::*;

#[derive(Config, Debug)]
pub struct ConvTranspose2dBatchNormConfig {
    pub channels_in: usize,

    /// Output channels.
    pub filters: usize,

    #[config(default = 3)]
    pub kernel_size: usize,

    /// Upsampling factor.
    #[config(default = 2)]
    pub stride: usize,

    #[config(default = "Padding::Same")]
    pub padding: Padding,

    #[config(default = "Activation::Relu")]
    pub activation: Activation,

    #[config(default = "KernelInitializer::GlorotNormal")]
    pub kernel_initializer: KernelInitializer,

    #[config(default = 0.05)]
    pub prob: f64,
}

impl ConvTranspose2dBatchNormConfig {
    /// Returns the initialized model.
    ///
    /// # Panics
    /// If the kernel size does not suit the padding, if the stride is zero,
    /// or if `prob` is outside of `[0, 1)`.
    pub fn init<B: Backend>(&self, device: &B::Device) -> ConvTranspose2dBatchNorm<B> {
        if let Err(e) = self.padding.check_kernel_size(self.kernel_size) {
            panic!("{e}");
        }
        assert!(self.stride > 0, "stride must be positive");
        let k = self.kernel_size;
        let s = self.stride;
        let (_, p_out) = self.padding.transposed_padding(k, s);

        let mut conv = ConvTranspose2dConfig::new([self.channels_in, self.filters], [k, k])
            .with_stride([s, s])
            .with_padding([0, 0])
            .with_padding_out([p_out, p_out])
            .with_initializer(self.kernel_initializer.to_initializer())
            .with_bias(true)
            .init(device);
        conv.bias = Some(Initializer::Zeros.init([self.filters], device));

        log::debug!(
            "conv_transpose2d {}→{} (k={k}, s={s}, {}, {}, p={})",
            self.channels_in,
            self.filters,
            self.padding,
            self.activation,
            self.prob
        );

        ConvTranspose2dBatchNorm {
            conv,
            padding: self.padding,
            activation: self.activation,
            dropout: SpatialDropout2dConfig::new(self.prob).init(),
            norm: batch_norm(self.filters, device),
        }
    }
}

/// ConvTranspose2d → activation → spatial dropout → batch norm.
#[derive(Module, Debug)]
pub struct ConvTranspose2dBatchNorm<B: Backend> {
    /// Uncropped; `Same` outputs are cropped in `forward`.
    pub conv: ConvTranspose2d<B>,
    pub padding: Padding,
    pub activation: Activation,
    pub dropout: SpatialDropout2d,
    pub norm: BatchNorm<B, 2>,
}

impl<B: Backend> ConvTranspose2dBatchNorm<B> {
    /// # Shapes
    ///   - Input [batch, channels_in, height, width]
    ///   - Output [batch, filters, height * stride, width * stride] (with `Same` padding)
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let [_, _, height, width] = x.dims();
        let x = self.conv.forward(x);
        let x = self.padding.crop_transposed(
            x,
            [height, width],
            self.conv.kernel_size,
            self.conv.stride,
        );
        let x = self.activation.forward(x);
        let x = self.dropout.forward(x);
        self.norm.forward(x)
    }

    pub fn filters(&self) -> usize {
        let [_, filters, _, _] = self.conv.weight.dims();
        filters
    }
}
