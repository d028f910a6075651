use burn::prelude::*;
use burn_fd_unet::prelude::*;
pub use common::{
    backend::{MainBackend, MainDevice},
    cli::AppArgs,
};

pub mod inference;

#[path = "../common/mod.rs"]
pub mod common;

/// A small single-channel configuration, quick to run on a CPU.
pub fn default_model_config() -> FdUNetConfig {
    FdUNetConfig::new([1, 64, 64])
        .with_filters(8)
        .with_kernel_size(3)
        .with_padding(Padding::Same)
        .with_activation(Activation::Relu)
        .with_kernel_initializer(KernelInitializer::GlorotNormal)
        .with_prob(0.05)
}

pub fn launch<B>(app_args: &AppArgs) -> Result<(), String>
where
    B: Backend + MainDevice,
{
    app_args
        .create_artifact_dir::<B>()
        .map_err(|e| format!("failed to create the artifacts directory: {e}"))?;

    let model_config = app_args
        .load_model_config()?
        .unwrap_or_else(default_model_config);
    model_config.validate().map_err(|e| e.to_string())?;
    app_args
        .save_model_config(&model_config)
        .map_err(|e| format!("failed to save the model config: {e}"))?;

    let device = B::main_device();
    let model: FdUNet<B> = app_args.load_or_save_model(&model_config, &device)?;
    println!("{model}");

    if app_args.inference {
        inference::infer::<B>(&model, &model_config, app_args.batch_size, &device)?;
    } else {
        println!("inference was not enabled");
        println!("{}", common::cli::HELP);
    }
    Ok(())
}

fn main() {
    let app_args = match AppArgs::parse() {
        Ok(app_args) => app_args,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(2);
        }
    };
    if let Err(e) = launch::<MainBackend>(&app_args) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
