use crate::conv::Conv2dBatchNorm;
use crate::fd_unet::{
    FdBlock, FdBlockConfig, LayerSettings,
    sample::{DownSample, DownSampleConfig, UpSample, UpSampleConfig},
};
use burn::prelude::*;

/// Dense block over `filters / 2 .. filters` with growth `filters / 8`.
fn fd_block_config(channels_in: usize, filters: usize, layer: &LayerSettings) -> FdBlockConfig {
    FdBlockConfig::new(channels_in, filters / 2, filters, filters / 8, layer.clone())
}

#[derive(Config, Debug)]
pub struct DownBlockConfig {
    pub channels_in: usize,
    pub filters: usize,
    pub layer: LayerSettings,
}

impl DownBlockConfig {
    pub fn fd(&self) -> FdBlockConfig {
        fd_block_config(self.channels_in, self.filters, &self.layer)
    }

    /// Channels of the skip connection.
    pub fn shortcut_channels(&self) -> usize {
        self.fd().channels_out()
    }

    /// Returns the initialized model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> DownBlock<B> {
        let fd = self.fd();
        DownBlock {
            fd: fd.init(device),
            down: DownSampleConfig::new(fd.channels_out(), self.filters, self.layer.clone())
                .init(device),
        }
    }
}

/// Encoder stage: a dense block, whose output is kept as the skip connection, then a downsample.
#[derive(Module, Debug)]
pub struct DownBlock<B: Backend> {
    pub fd: FdBlock<B>,
    pub down: DownSample<B>,
}

impl<B: Backend> DownBlock<B> {
    /// # Shapes
    ///   - Input [batch, filters / 2, height, width]
    ///   - Output.0 [batch, filters, height / 2, width / 2]
    ///   - Output.1 [batch, filters, height, width]
    pub fn forward(&self, x: Tensor<B, 4>) -> (Tensor<B, 4>, Tensor<B, 4>) {
        let shortcut = self.fd.forward(x);
        let x = self.down.forward(shortcut.clone());
        (x, shortcut)
    }
}

#[derive(Config, Debug)]
pub struct BridgeBlockConfig {
    pub channels_in: usize,
    pub filters: usize,
    pub layer: LayerSettings,
}

impl BridgeBlockConfig {
    pub fn channels_out(&self) -> usize {
        self.filters / 2
    }

    /// Returns the initialized model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> BridgeBlock<B> {
        let fd = fd_block_config(self.channels_in, self.filters, &self.layer);
        BridgeBlock {
            fd: fd.init(device),
            up: UpSampleConfig::new(fd.channels_out(), self.channels_out(), self.layer.clone())
                .init(device),
        }
    }
}

/// Bottom of the U: a dense block, then an upsample.
#[derive(Module, Debug)]
pub struct BridgeBlock<B: Backend> {
    pub fd: FdBlock<B>,
    pub up: UpSample<B>,
}

impl<B: Backend> BridgeBlock<B> {
    /// # Shapes
    ///   - Input [batch, filters / 2, height, width]
    ///   - Output [batch, filters / 2, height * 2, width * 2]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.fd.forward(x);
        self.up.forward(x)
    }
}

#[derive(Config, Debug)]
pub struct UpBlockConfig {
    /// Channels after the skip concatenation.
    pub channels_in: usize,
    pub filters: usize,
    pub layer: LayerSettings,
}

impl UpBlockConfig {
    pub fn channels_out(&self) -> usize {
        self.filters / 2
    }

    /// Returns the initialized model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> UpBlock<B> {
        let half = self.filters / 2;
        let fd = fd_block_config(half, self.filters, &self.layer);
        UpBlock {
            bottleneck: self.layer.conv_1x1(self.channels_in, half).init(device),
            fd: fd.init(device),
            up: UpSampleConfig::new(fd.channels_out(), self.channels_out(), self.layer.clone())
                .init(device),
        }
    }
}

/// Decoder stage: a 1×1 convolution reducing the concatenated skip, a dense block, then an upsample.
#[derive(Module, Debug)]
pub struct UpBlock<B: Backend> {
    pub bottleneck: Conv2dBatchNorm<B>,
    pub fd: FdBlock<B>,
    pub up: UpSample<B>,
}

impl<B: Backend> UpBlock<B> {
    /// # Shapes
    ///   - Input [batch, channels_in, height, width]
    ///   - Output [batch, filters / 2, height * 2, width * 2]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.bottleneck.forward(x);
        let x = self.fd.forward(x);
        self.up.forward(x)
    }
}
