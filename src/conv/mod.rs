//! Convolutions followed by an activation, spatial dropout and batch normalization.

mod conv_bn;
mod conv_transpose_bn;

pub use conv_bn::{Conv2dBatchNorm, Conv2dBatchNormConfig};
pub use conv_transpose_bn::{ConvTranspose2dBatchNorm, ConvTranspose2dBatchNormConfig};

use burn::nn::{BatchNorm, BatchNormConfig};
use burn::prelude::*;

pub const BATCH_NORM_EPSILON: f64 = 1e-3;

/// Weight of the current batch statistics in the running averages.
///
/// A running-average decay of 0.99 keeps 1% of each new batch.
pub const BATCH_NORM_MOMENTUM: f64 = 0.01;

/// Batch normalization over the channels of `[batch, channels, height, width]` inputs.
///
/// Starts with `gamma = 1`, `beta = 0`, running mean 0 and running variance 1.
pub fn batch_norm<B: Backend>(channels: usize, device: &B::Device) -> BatchNorm<B, 2> {
    BatchNormConfig::new(channels)
        .with_epsilon(BATCH_NORM_EPSILON)
        .with_momentum(BATCH_NORM_MOMENTUM)
        .init(device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    #[test]
    fn batch_norm_uses_keras_constants() {
        let device = Default::default();
        let norm = batch_norm::<NdArray>(3, &device);
        assert_eq!(1e-3, norm.epsilon);
        assert_eq!(0.01, norm.momentum);

        let block = Conv2dBatchNormConfig::new(1, 2).init::<NdArray>(&device);
        assert_eq!(BATCH_NORM_EPSILON, block.norm.epsilon);
        assert_eq!(BATCH_NORM_MOMENTUM, block.norm.momentum);
    }

    #[test]
    fn training_batch_moves_the_running_stats_by_one_percent() {
        type B = Autodiff<NdArray>;
        let device = Default::default();
        let norm = batch_norm::<B>(2, &device);
        let x = Tensor::<B, 4>::full([2, 2, 4, 4], 3.0, &device);

        let _ = norm.forward(x);
        let mean = norm.running_mean.value().into_data().to_vec::<f32>().unwrap();
        let var = norm.running_var.value().into_data().to_vec::<f32>().unwrap();
        for (mean, var) in mean.into_iter().zip(var) {
            // 0.99 * 0 + 0.01 * 3 and 0.99 * 1 + 0.01 * 0
            assert!((mean - 0.03).abs() < 1e-6, "running mean {mean}");
            assert!((var - 0.99).abs() < 1e-6, "running variance {var}");
        }
    }

    #[test]
    fn inference_leaves_the_running_stats() {
        let device = Default::default();
        let norm = batch_norm::<NdArray>(1, &device);
        let x = Tensor::<NdArray, 4>::full([1, 1, 2, 2], 5.0, &device);

        let y = norm.forward(x.clone());
        let mean = norm.running_mean.value().into_data().to_vec::<f32>().unwrap();
        assert_eq!(vec![0.0], mean);
        // (5 - 0) / sqrt(1 + 1e-3)
        let expected = 5.0 / (1.0f32 + 1e-3).sqrt();
        let y = y.into_data().to_vec::<f32>().unwrap();
        assert!(y.iter().all(|v| (v - expected).abs() < 1e-5));
    }
}
