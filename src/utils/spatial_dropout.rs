use burn::module::{Content, DisplaySettings, ModuleDisplay};
use burn::prelude::*;
use burn::tensor::Distribution;

/// Configuration to create a [SpatialDropout2d](SpatialDropout2d) layer.
#[derive(Config, Debug)]
pub struct SpatialDropout2dConfig {
    /// The probability of dropping a whole feature map.
    pub prob: f64,
}

impl SpatialDropout2dConfig {
    /// Initialize a new [SpatialDropout2d](SpatialDropout2d) module.
    ///
    /// # Panics
    /// If `prob` is outside of `[0, 1)`.
    pub fn init(&self) -> SpatialDropout2d {
        assert!(
            (0.0..1.0).contains(&self.prob),
            "dropout probability must be in [0, 1), got {}",
            self.prob
        );
        SpatialDropout2d { prob: self.prob }
    }
}

/// Dropout over whole channels.
///
/// Each `(batch, channel)` map is dropped with probability `prob`,
/// and the kept ones are scaled by `1 / (1 - prob)`.
///
/// Only active while the backend tracks gradients.
#[derive(Module, Clone, Debug)]
#[module(custom_display)]
pub struct SpatialDropout2d {
    pub prob: f64,
}

impl SpatialDropout2d {
    /// # Shapes
    /// - input: `[batch, channels, height, width]`
    /// - output: `[batch, channels, height, width]`
    pub fn forward<B: Backend>(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        if !B::ad_enabled() || self.prob == 0.0 {
            return input;
        }

        let [batch, channels, _height, _width] = input.dims();
        let prob_keep = 1.0 - self.prob;
        let mask = Tensor::<B, 4>::random(
            [batch, channels, 1, 1],
            Distribution::Bernoulli(prob_keep),
            &input.device(),
        );
        let mask = mask.expand(input.shape());

        input * mask / prob_keep
    }
}

impl ModuleDisplay for SpatialDropout2d {
    fn custom_settings(&self) -> Option<DisplaySettings> {
        DisplaySettings::new()
            .with_new_line_after_attribute(false)
            .optional()
    }

    fn custom_content(&self, content: Content) -> Option<Content> {
        content.add("prob", &self.prob).optional()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    #[test]
    fn identity_without_autodiff() {
        let device = Default::default();
        let dropout = SpatialDropout2dConfig::new(0.5).init();
        let x = Tensor::<NdArray, 4>::random([2, 3, 4, 4], Distribution::Default, &device);

        let y = dropout.forward(x.clone());
        y.into_data().assert_eq(&x.into_data(), true);
    }

    #[test]
    fn drops_whole_channels_in_training() {
        type B = Autodiff<NdArray>;
        let device = Default::default();
        let prob = 0.5;
        let dropout = SpatialDropout2dConfig::new(prob).init();
        let x = Tensor::<B, 4>::ones([4, 8, 3, 5], &device);

        let y = dropout.forward(x);
        let values = y.into_data().to_vec::<f32>().unwrap();
        let kept = (1.0 / (1.0 - prob)) as f32;

        // each channel map is either fully dropped or fully kept (and rescaled)
        for map in values.chunks(3 * 5) {
            let first = map[0];
            assert!(first == 0.0 || (first - kept).abs() < 1e-6, "got {first}");
            assert!(map.iter().all(|v| *v == first));
        }
    }

    #[test]
    fn zero_prob_is_identity_in_training() {
        type B = Autodiff<NdArray>;
        let device = Default::default();
        let dropout = SpatialDropout2dConfig::new(0.0).init();
        let x = Tensor::<B, 4>::random([1, 2, 3, 3], Distribution::Default, &device);

        let y = dropout.forward(x.clone());
        y.into_data().assert_eq(&x.into_data(), true);
    }

    #[test]
    #[should_panic]
    fn rejects_certain_drop() {
        let _ = SpatialDropout2dConfig::new(1.0).init();
    }
}
