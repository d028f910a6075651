use crate::conv::{Conv2dBatchNorm, ConvTranspose2dBatchNorm};
use crate::fd_unet::LayerSettings;
use burn::prelude::*;

#[derive(Config, Debug)]
pub struct DownSampleConfig {
    pub channels_in: usize,
    pub filters: usize,
    #[config(default = 2)]
    pub stride: usize,
    pub layer: LayerSettings,
}

impl DownSampleConfig {
    /// Returns the initialized model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> DownSample<B> {
        DownSample {
            bottleneck: self
                .layer
                .conv_1x1(self.channels_in, self.filters)
                .init(device),
            conv: self
                .layer
                .conv(self.filters, self.filters)
                .with_stride(self.stride)
                .init(device),
        }
    }
}

/// 1×1 convolution, then a strided convolution.
#[derive(Module, Debug)]
pub struct DownSample<B: Backend> {
    pub bottleneck: Conv2dBatchNorm<B>,
    pub conv: Conv2dBatchNorm<B>,
}

impl<B: Backend> DownSample<B> {
    /// # Shapes
    ///   - Input [batch, channels_in, height, width]
    ///   - Output [batch, filters, height / stride, width / stride]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.bottleneck.forward(x);
        self.conv.forward(x)
    }
}

#[derive(Config, Debug)]
pub struct UpSampleConfig {
    pub channels_in: usize,
    pub filters: usize,
    #[config(default = 2)]
    pub stride: usize,
    pub layer: LayerSettings,
}

impl UpSampleConfig {
    /// Returns the initialized model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> UpSample<B> {
        UpSample {
            bottleneck: self
                .layer
                .conv_1x1(self.channels_in, self.filters)
                .init(device),
            conv: self
                .layer
                .conv_transpose(self.filters, self.filters, self.stride)
                .init(device),
        }
    }
}

/// 1×1 convolution, then a strided transposed convolution.
#[derive(Module, Debug)]
pub struct UpSample<B: Backend> {
    pub bottleneck: Conv2dBatchNorm<B>,
    pub conv: ConvTranspose2dBatchNorm<B>,
}

impl<B: Backend> UpSample<B> {
    /// # Shapes
    ///   - Input [batch, channels_in, height, width]
    ///   - Output [batch, filters, height * stride, width * stride]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.bottleneck.forward(x);
        self.conv.forward(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type B = NdArray;

    #[test]
    fn down_then_up_restores_the_side() {
        let device = Default::default();
        let layer = LayerSettings::new();
        let down = DownSampleConfig::new(3, 8, layer.clone()).init::<B>(&device);
        let up = UpSampleConfig::new(8, 4, layer).init::<B>(&device);
        let x = Tensor::<B, 4>::random([2, 3, 16, 8], Distribution::Default, &device);

        let x = down.forward(x);
        assert_eq!([2, 8, 8, 4], x.dims());
        let x = up.forward(x);
        assert_eq!([2, 4, 16, 8], x.dims());
    }
}
