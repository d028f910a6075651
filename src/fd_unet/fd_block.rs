use crate::conv::Conv2dBatchNorm;
use crate::fd_unet::LayerSettings;
use burn::prelude::*;

/// A Fully Dense block.
///
/// Every layer sees the concatenation of the block input and all previous layer
/// outputs, and appends `k` new feature maps to it.
#[derive(Config, Debug)]
pub struct FdBlockConfig {
    pub channels_in: usize,

    /// Width of each 1×1 bottleneck; also where the layer count starts from.
    pub f_in: usize,

    /// Layers are added while `f_in + i * k < f_out`.
    pub f_out: usize,

    /// Growth rate: channels appended by each layer.
    pub k: usize,

    pub layer: LayerSettings,
}

impl FdBlockConfig {
    /// Number of dense layers, one per step of `f_in..f_out` by `k`.
    pub fn n_layers(&self) -> usize {
        if self.k == 0 || self.f_out <= self.f_in {
            0
        } else {
            (self.f_out - self.f_in).div_ceil(self.k)
        }
    }

    pub fn channels_out(&self) -> usize {
        self.channels_in + self.n_layers() * self.k
    }

    /// Returns the initialized model.
    ///
    /// # Panics
    /// If the growth rate `k` is zero.
    pub fn init<B: Backend>(&self, device: &B::Device) -> FdBlock<B> {
        assert!(self.k > 0, "the growth rate of a dense block must be positive");

        let n_layers = self.n_layers();
        let mut layers = Vec::with_capacity(n_layers);
        let mut channels = self.channels_in;
        for _ in 0..n_layers {
            layers.push(FdLayer {
                bottleneck: self.layer.conv_1x1(channels, self.f_in).init(device),
                conv: self.layer.conv(self.f_in, self.k).init(device),
            });
            channels += self.k;
        }
        debug_assert_eq!(channels, self.channels_out());
        log::debug!(
            "fd block {}→{} ({n_layers} layers, k={})",
            self.channels_in,
            channels,
            self.k
        );

        FdBlock { layers }
    }
}

#[derive(Module, Debug)]
pub struct FdBlock<B: Backend> {
    pub layers: Vec<FdLayer<B>>,
}

impl<B: Backend> FdBlock<B> {
    /// The identity when the block has no layers.
    ///
    /// # Shapes
    ///   - Input [batch, channels_in, height, width]
    ///   - Output [batch, channels_in + n_layers * k, height, width]
    pub fn forward(&self, mut x: Tensor<B, 4>) -> Tensor<B, 4> {
        for layer in self.layers.iter() {
            x = layer.forward(x);
        }
        x
    }
}

#[derive(Module, Debug)]
pub struct FdLayer<B: Backend> {
    pub bottleneck: Conv2dBatchNorm<B>,
    pub conv: Conv2dBatchNorm<B>,
}

impl<B: Backend> FdLayer<B> {
    /// # Shapes
    ///   - Input [batch, channels, height, width]
    ///   - Output [batch, k + channels, height, width]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let [batch, _channels, height, width] = x.dims();

        let shortcut = x.clone();
        let x = self.bottleneck.forward(x);
        let x = self.conv.forward(x);
        let k = self.conv.filters();
        debug_assert_eq!([batch, k, height, width], x.dims());

        // new features come first
        Tensor::cat(vec![x, shortcut], 1)
    }
}
