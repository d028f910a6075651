use crate::common::backend::Element;
use burn::prelude::*;
use burn::tensor::Distribution;
use burn_fd_unet::prelude::*;

pub const NOISE_LEVEL: f64 = 0.1;

/// Smooth interference pattern in `[-1, 1]`.
///
/// # Shape
/// [batch, channels, height, width]
pub fn clean_images<B: Backend>(
    batch: usize,
    [channels, height, width]: [usize; 3],
    device: &B::Device,
) -> Tensor<B, 4> {
    let rows = Tensor::<B, 1, Int>::arange(0..height as i64, device)
        .float()
        .reshape([height, 1])
        .expand([height, width]);
    let cols = Tensor::<B, 1, Int>::arange(0..width as i64, device)
        .float()
        .reshape([1, width])
        .expand([height, width]);
    let pattern = ((rows * 0.2).sin() + (cols * 0.15).cos()) / 2.0;
    pattern
        .reshape([1, 1, height, width])
        .expand([batch, channels, height, width])
}

fn mse<B: Backend>(a: Tensor<B, 4>, b: Tensor<B, 4>) -> Element {
    (a - b).square().mean().into_scalar().elem()
}

pub fn infer<B: Backend>(
    model: &FdUNet<B>,
    model_config: &FdUNetConfig,
    batch_size: usize,
    device: &B::Device,
) -> Result<(), String> {
    let clean = clean_images::<B>(batch_size, model_config.input_shape, device);
    let noise = clean.random_like(Distribution::Normal(0.0, NOISE_LEVEL));
    let noisy = clean.clone() + noise;

    let denoised = model
        .try_forward(noisy.clone())
        .map_err(|e| e.to_string())?;

    println!("input: {:?}", noisy.dims());
    println!("output: {:?}", denoised.dims());
    println!("noisy/clean mse: {:.6?}", mse(noisy, clean.clone()));
    println!("denoised/clean mse: {:.6?}", mse(denoised, clean));
    Ok(())
}
