use crate::conv::Conv2dBatchNorm;
use crate::error::FdUNetError;
use crate::fd_unet::{
    BridgeBlock, BridgeBlockConfig, DownBlock, DownBlockConfig, FdBlock, FdBlockConfig,
    LayerSettings, UpBlock, UpBlockConfig,
};
use crate::utils::{activation::Activation, initializer::KernelInitializer, padding::Padding};
use burn::prelude::*;

pub const MODEL_NAME: &str = "fd_unet_spatial_dropout";

/// Number of downsampling stages. Input sides must be multiples of `2^DEPTH`.
pub const DEPTH: usize = 4;

#[derive(Config, Debug)]
pub struct FdUNetConfig {
    /// `[channels, height, width]` of the input images.
    pub input_shape: [usize; 3],

    /// Filters of the outermost stage, doubled at each downsampling.
    #[config(default = 32)]
    pub filters: usize,

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

impl FdUNetConfig {
    pub fn layer_settings(&self) -> LayerSettings {
        LayerSettings::new()
            .with_kernel_size(self.kernel_size)
            .with_padding(self.padding)
            .with_activation(self.activation)
            .with_kernel_initializer(self.kernel_initializer)
            .with_prob(self.prob)
    }

    /// Filters of each encoder stage, outermost first.
    pub fn down_filters(&self) -> [usize; DEPTH] {
        core::array::from_fn(|i| self.filters << (i + 1))
    }

    pub fn bridge_filters(&self) -> usize {
        self.filters << (DEPTH + 1)
    }

    pub fn validate(&self) -> Result<(), FdUNetError> {
        // the smallest growth rate is filters / 4
        if self.filters < 4 {
            return Err(FdUNetError::InvalidFilters {
                filters: self.filters,
            });
        }
        self.padding.check_kernel_size(self.kernel_size)?;
        if self.padding != Padding::Same {
            return Err(FdUNetError::UnsupportedPadding {
                padding: self.padding.to_string(),
            });
        }
        if !(0.0..1.0).contains(&self.prob) {
            return Err(FdUNetError::InvalidDropout { prob: self.prob });
        }

        let [channels, height, width] = self.input_shape;
        if channels == 0 {
            return Err(FdUNetError::InvalidInputShape {
                shape: self.input_shape,
                reason: "at least one channel is required".into(),
            });
        }
        let multiple = 1 << DEPTH;
        for (side, name) in [(height, "height"), (width, "width")] {
            if side == 0 || side % multiple != 0 {
                return Err(FdUNetError::InvalidInputShape {
                    shape: self.input_shape,
                    reason: format!("{name} must be a positive multiple of {multiple}"),
                });
            }
        }
        Ok(())
    }

    /// Returns the initialized model, or why the configuration cannot build one.
    pub fn try_init<B: Backend>(&self, device: &B::Device) -> Result<FdUNet<B>, FdUNetError> {
        self.validate()?;

        let layer = self.layer_settings();
        let f = self.filters;
        let [channels_in, _, _] = self.input_shape;

        let stem = layer.conv(channels_in, f).init(device);

        let mut channels = f;
        let mut down = Vec::with_capacity(DEPTH);
        let mut shortcuts = Vec::with_capacity(DEPTH);
        for filters in self.down_filters() {
            let config = DownBlockConfig::new(channels, filters, layer.clone());
            shortcuts.push(config.shortcut_channels());
            down.push(config.init(device));
            channels = filters;
        }

        let bridge = BridgeBlockConfig::new(channels, self.bridge_filters(), layer.clone());
        channels = bridge.channels_out();
        let bridge = bridge.init(device);

        // every stage but the outermost has a decoder block
        let mut up = Vec::with_capacity(DEPTH - 1);
        for &filters in self.down_filters()[1..].iter().rev() {
            channels += shortcuts.pop().unwrap_or_default();
            let config = UpBlockConfig::new(channels, filters, layer.clone());
            channels = config.channels_out();
            up.push(config.init(device));
        }
        channels += shortcuts.pop().unwrap_or_default();
        debug_assert!(shortcuts.is_empty());

        let neck = layer.conv(channels, f).init(device);
        let fd = FdBlockConfig::new(f, f, 2 * f, f / 4, layer.clone());
        channels = fd.channels_out();
        let fd = fd.init(device);

        // linear 1×1 projection back to the input channels, without dropout
        let head = layer
            .conv_1x1(channels, channels_in)
            .with_activation(Activation::Linear)
            .with_prob(0.0)
            .init(device);

        let model = FdUNet {
            stem,
            down,
            bridge,
            up,
            neck,
            fd,
            head,
        };
        log::info!(
            "initialized {MODEL_NAME} for {:?} inputs: {} filters, {} parameters",
            self.input_shape,
            f,
            model.num_params()
        );

        Ok(model)
    }

    /// Returns the initialized model.
    ///
    /// # Panics
    /// If the configuration is invalid, see [`Self::validate`].
    pub fn init<B: Backend>(&self, device: &B::Device) -> FdUNet<B> {
        match self.try_init(device) {
            Ok(model) => model,
            Err(e) => panic!("invalid {MODEL_NAME} configuration: {e}"),
        }
    }
}

/// Builds an [`FdUNet`] from its hyperparameters.
///
/// `input_shape` is `[channels, height, width]`.
#[allow(clippy::too_many_arguments)]
pub fn get_model<B: Backend>(
    input_shape: [usize; 3],
    filters: usize,
    kernel_size: usize,
    padding: Padding,
    activation: Activation,
    kernel_initializer: KernelInitializer,
    prob: f64,
    device: &B::Device,
) -> Result<FdUNet<B>, FdUNetError> {
    FdUNetConfig::new(input_shape)
        .with_filters(filters)
        .with_kernel_size(kernel_size)
        .with_padding(padding)
        .with_activation(activation)
        .with_kernel_initializer(kernel_initializer)
        .with_prob(prob)
        .try_init(device)
}

/// Fully Dense U-Net with spatial dropout.
///
/// The network predicts a correction that is added to its own input,
/// so the output has the shape of the input.
#[derive(Module, Debug)]
pub struct FdUNet<B: Backend> {
    pub stem: Conv2dBatchNorm<B>,
    /// # Shape
    /// [DEPTH]
    pub down: Vec<DownBlock<B>>,
    pub bridge: BridgeBlock<B>,
    /// Innermost first.
    ///
    /// # Shape
    /// [DEPTH - 1]
    pub up: Vec<UpBlock<B>>,
    pub neck: Conv2dBatchNorm<B>,
    pub fd: FdBlock<B>,
    pub head: Conv2dBatchNorm<B>,
}

impl<B: Backend> FdUNet<B> {
    /// # Shapes
    ///   - Input [batch, channels, height, width]
    ///   - Output [batch, channels, height, width]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let [batch, channels, height, width] = x.dims();
        let residual = x.clone();

        let mut x = self.stem.forward(x);

        let mut shortcuts = Vec::with_capacity(self.down.len());
        for block in self.down.iter() {
            let (x_, shortcut) = block.forward(x);
            x = x_;
            shortcuts.push(shortcut);
        }

        x = self.bridge.forward(x);

        let mut shortcuts = shortcuts.into_iter().rev();
        for block in self.up.iter() {
            if let Some(shortcut) = shortcuts.next() {
                x = Tensor::cat(vec![x, shortcut], 1);
            }
            x = block.forward(x);
        }
        // the outermost shortcut joins after the last decoder block
        for shortcut in shortcuts {
            x = Tensor::cat(vec![x, shortcut], 1);
        }

        let x = self.neck.forward(x);
        let x = self.fd.forward(x);
        let x = self.head.forward(x);
        debug_assert_eq!([batch, channels, height, width], x.dims());

        x + residual
    }

    /// Channels expected by, and produced by, the network.
    pub fn channels(&self) -> usize {
        self.head.filters()
    }

    /// Checks that `dims` can go through [`Self::forward`].
    pub fn check_input(&self, dims: [usize; 4]) -> Result<(), FdUNetError> {
        let [_batch, channels, height, width] = dims;
        if channels != self.channels() {
            return Err(FdUNetError::InvalidInput {
                dims,
                reason: format!("expected {} channels", self.channels()),
            });
        }
        let multiple = 1 << self.down.len();
        if height == 0 || width == 0 || height % multiple != 0 || width % multiple != 0 {
            return Err(FdUNetError::InvalidInput {
                dims,
                reason: format!("height and width must be positive multiples of {multiple}"),
            });
        }
        Ok(())
    }

    /// [`Self::forward`], after [`Self::check_input`].
    pub fn try_forward(&self, x: Tensor<B, 4>) -> Result<Tensor<B, 4>, FdUNetError> {
        self.check_input(x.dims())?;
        Ok(self.forward(x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use burn::module::Param;
    use burn::tensor::Distribution;

    type B = NdArray;

    fn small_config() -> FdUNetConfig {
        FdUNetConfig::new([1, 32, 32]).with_filters(4)
    }

    #[test]
    fn output_has_the_input_shape() {
        let device = Default::default();
        let model = small_config().init::<B>(&device);
        let x = Tensor::<B, 4>::random([2, 1, 32, 32], Distribution::Default, &device);

        let y = model.forward(x);
        assert_eq!([2, 1, 32, 32], y.dims());
    }

    #[test]
    fn multi_channel_rectangular_input() {
        let device = Default::default();
        let model = FdUNetConfig::new([3, 16, 48])
            .with_filters(4)
            .with_kernel_size(5)
            .with_activation(Activation::Gelu)
            .init::<B>(&device);
        assert_eq!(3, model.channels());
        let x = Tensor::<B, 4>::random([1, 3, 16, 48], Distribution::Default, &device);

        assert_eq!([1, 3, 16, 48], model.forward(x).dims());
    }

    #[test]
    fn output_has_the_input_shape_in_training() {
        let device = Default::default();
        let model = small_config()
            .with_prob(0.5)
            .init::<Autodiff<B>>(&device);
        let x = Tensor::<Autodiff<B>, 4>::random([2, 1, 16, 16], Distribution::Default, &device);

        assert_eq!([2, 1, 16, 16], model.forward(x).dims());
    }

    #[test]
    fn stage_widths_double() {
        let config = small_config();
        assert_eq!([8, 16, 32, 64], config.down_filters());
        assert_eq!(128, config.bridge_filters());

        let device = Default::default();
        let model = config.init::<B>(&device);
        assert_eq!(DEPTH, model.down.len());
        assert_eq!(DEPTH - 1, model.up.len());
        // innermost decoder block first
        assert_eq!(32, model.up[0].up.conv.filters());
        assert_eq!(8, model.up[2].up.conv.filters());
        assert_eq!(4, model.fd.layers.len());
    }

    #[test]
    fn zeroed_head_passes_the_input_through() {
        let device = Default::default();
        let mut model = small_config().init::<B>(&device);
        let [filters, channels, k1, k2] = model.head.conv.weight.dims();
        model.head.conv.weight =
            Param::from_tensor(Tensor::zeros([filters, channels, k1, k2], &device));
        model.head.conv.bias = Some(Param::from_tensor(Tensor::zeros([filters], &device)));

        let x = Tensor::<B, 4>::random([1, 1, 16, 16], Distribution::Default, &device);
        let y = model.forward(x.clone());
        y.into_data().assert_eq(&x.into_data(), true);
    }

    #[test]
    fn check_input_rejects_bad_dims() {
        let device = Default::default();
        let model = small_config().init::<B>(&device);

        assert!(model.check_input([4, 1, 64, 16]).is_ok());
        assert!(matches!(
            model.check_input([1, 3, 32, 32]),
            Err(FdUNetError::InvalidInput { .. })
        ));
        assert!(matches!(
            model.check_input([1, 1, 24, 32]),
            Err(FdUNetError::InvalidInput { .. })
        ));

        let x = Tensor::<B, 4>::zeros([1, 2, 16, 16], &device);
        assert!(model.try_forward(x).is_err());
    }

    #[test]
    fn validation_errors() {
        assert_eq!(
            small_config().with_filters(2).validate(),
            Err(FdUNetError::InvalidFilters { filters: 2 })
        );
        assert_eq!(
            small_config().with_kernel_size(0).validate(),
            Err(FdUNetError::InvalidKernelSize { kernel_size: 0 })
        );
        assert!(small_config().with_kernel_size(4).validate().is_ok());
        assert_eq!(
            small_config().with_padding(Padding::Valid).validate(),
            Err(FdUNetError::UnsupportedPadding {
                padding: "valid".into()
            })
        );
        assert_eq!(
            small_config().with_prob(1.0).validate(),
            Err(FdUNetError::InvalidDropout { prob: 1.0 })
        );
        assert!(matches!(
            small_config().with_input_shape([1, 40, 32]).validate(),
            Err(FdUNetError::InvalidInputShape { .. })
        ));
        assert!(matches!(
            small_config().with_input_shape([0, 32, 32]).validate(),
            Err(FdUNetError::InvalidInputShape { .. })
        ));
        assert!(small_config().validate().is_ok());
    }

    #[test]
    #[should_panic(expected = "invalid fd_unet_spatial_dropout configuration")]
    fn init_panics_on_invalid_config() {
        let device = Default::default();
        let _ = small_config().with_filters(0).init::<B>(&device);
    }

    #[test]
    fn config_json_round_trip() {
        let config = small_config()
            .with_activation(Activation::LeakyRelu)
            .with_kernel_initializer(KernelInitializer::HeUniform)
            .with_prob(0.1);

        let json = config.to_string();
        let loaded = FdUNetConfig::load_binary(json.as_bytes()).unwrap();
        assert_eq!(config.input_shape, loaded.input_shape);
        assert_eq!(config.filters, loaded.filters);
        assert_eq!(Activation::LeakyRelu, loaded.activation);
        assert_eq!(KernelInitializer::HeUniform, loaded.kernel_initializer);
        assert_eq!(0.1, loaded.prob);
    }
}
