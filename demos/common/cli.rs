use crate::common::backend::RecorderTy;
use burn::record::FileRecorder;
use burn::prelude::*;
use burn_fd_unet::prelude::{FdUNet, FdUNetConfig};
use std::path::{Path, PathBuf};

pub const HELP: &str = "\
Burn FD-UNet Demo

A command-line tool for building a Fully Dense U-Net and running it on a synthetic image.
The model configuration and weights are persisted in an artifacts directory.

USAGE:
    fd-unet [OPTIONS]

BEHAVIOR OVERVIEW
- If --model-config is given, the config is loaded from the specified file and saved to the artifacts directory (overwriting any existing file). A missing or unreadable file is an error.
- Otherwise the program attempts to load the config from the artifacts directory; if absent, a default configuration is created and saved.
- The artifacts directory (--artifacts-path) is used to read/write model weights and configuration. If not specified, a new temporary directory is created and its path is printed.
- With --remove-artifacts, any existing model weights in the artifacts directory are deleted first.
- Model weights are loaded from the artifacts directory if present; otherwise new ones are created and saved.

FLAGS:
    -h, --help                  Show this help message and exit

OPTIONS:
    -i, --inference             Denoise a synthetic image and report the errors
    -r, --remove-artifacts      Delete existing model weights from the artifacts directory
    -b, --batch-size <N>        Images in the synthetic batch (default: 1)
    -m, --model-config <PATH>   Load model configuration from this file (overrides any config in artifacts directory)
    -a, --artifacts-path <PATH>
                                Directory where the configuration and model weights are saved and loaded.
                                If the directory does not exist, it will be created.
                                Defaults to a newly created temporary directory (path will be printed).
";

#[derive(Debug)]
pub struct AppArgs {
    pub inference: bool,
    pub remove_artifacts: bool,
    pub batch_size: usize,
    pub model_config: Option<PathBuf>,
    pub artifacts_path: PathBuf,
}

impl AppArgs {
    pub fn parse() -> Result<Self, pico_args::Error> {
        let mut pargs = pico_args::Arguments::from_env();

        // Help has a higher priority and should be handled separately.
        if pargs.contains(["-h", "--help"]) {
            println!("{}", HELP);
            std::process::exit(0);
        }

        let args = AppArgs {
            batch_size: pargs
                .opt_value_from_str(["-b", "--batch-size"])?
                .unwrap_or(1),
            model_config: pargs.opt_value_from_os_str(["-m", "--model-config"], parse_path)?,
            artifacts_path: match pargs
                .opt_value_from_os_str(["-a", "--artifacts-path"], parse_path)?
            {
                Some(path) => path,
                None => new_artifacts_path()?,
            },
            // must parse flags after values
            inference: pargs.contains(["-i", "--inference"]),
            remove_artifacts: pargs.contains(["-r", "--remove-artifacts"]),
        };

        let remaining = pargs.finish();
        if !remaining.is_empty() {
            return Err(pico_args::Error::ArgumentParsingFailed {
                cause: format!("unused arguments: {remaining:?}"),
            });
        }

        Ok(args)
    }

    pub fn create_artifact_dir<B: Backend>(&self) -> std::io::Result<()> {
        create_artifact_dir::<B>(&self.artifacts_path, self.remove_artifacts)
    }

    pub fn save_model_config(&self, model_config: &FdUNetConfig) -> std::io::Result<()> {
        let path = self
            .artifacts_path
            .join(MODEL_CONFIG_NAME)
            .with_extension("json");
        save_model_config(&path, model_config)
    }

    /// Loads the config given by `--model-config`, or else the one saved in the artifacts
    /// directory. Only a missing artifacts config yields `None`.
    pub fn load_model_config(&self) -> Result<Option<FdUNetConfig>, String> {
        match &self.model_config {
            Some(path) => load_model_config(path).map(Some),
            None => {
                let path = self
                    .artifacts_path
                    .join(MODEL_CONFIG_NAME)
                    .with_extension("json");
                if !path.exists() {
                    return Ok(None);
                }
                load_model_config(&path).map(Some)
            }
        }
    }

    pub fn save_model<B: Backend>(&self, model: &FdUNet<B>) -> Result<(), String> {
        save_model(&self.artifacts_path, model)
    }

    pub fn load_model<B: Backend>(
        &self,
        model_config: &FdUNetConfig,
        device: &B::Device,
    ) -> Result<Option<FdUNet<B>>, String> {
        load_model(&self.artifacts_path, model_config, device)
    }

    pub fn load_or_save_model<B: Backend>(
        &self,
        model_config: &FdUNetConfig,
        device: &B::Device,
    ) -> Result<FdUNet<B>, String> {
        if let Some(model) = self.load_model(model_config, device)? {
            return Ok(model);
        }
        println!("Initializing new model");
        let model_init = model_config
            .try_init(device)
            .map_err(|e| e.to_string())?;
        self.save_model(&model_init)?;
        Ok(model_init)
    }
}

fn parse_path(s: &std::ffi::OsStr) -> Result<PathBuf, &'static str> {
    Ok(s.into())
}

fn new_artifacts_path() -> Result<PathBuf, pico_args::Error> {
    // e.g. /tmp/burn-fd-unet-fd-unet-abcd-0
    let name = format!(
        "{}-{}-",
        std::env!("CARGO_PKG_NAME"), // burn-fd-unet
        std::env!("CARGO_BIN_NAME")  // fd-unet
    );
    let tmp = temp_dir::TempDir::with_prefix(name)
        .map_err(|e| pico_args::Error::ArgumentParsingFailed {
            cause: format!("failed to create the temporary directory: {e}"),
        })?
        .dont_delete_on_drop();
    let path = tmp.path();
    println!("new artifacts directory: {path:?}");
    Ok(path.into())
}

/// Creates the directory holding the model and its config.
pub fn create_artifact_dir<B: Backend>(artifact_dir: &Path, delete: bool) -> std::io::Result<()> {
    if delete {
        let file_ext = <RecorderTy as FileRecorder<B>>::file_extension();
        let path = artifact_dir.join(MODEL_NAME).with_extension(file_ext);
        println!("removing {path:?}");
        match std::fs::remove_file(&path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e),
            _ => {}
        }
    }
    std::fs::create_dir_all(artifact_dir)
}

pub const MODEL_CONFIG_NAME: &str = "model_config";
pub fn save_model_config(path: &Path, model_config: &FdUNetConfig) -> std::io::Result<()> {
    println!("Saving model config into {path:?}");
    model_config.save(path)
}

pub fn load_model_config(path: &Path) -> Result<FdUNetConfig, String> {
    println!("Loading model config from {path:?}");
    FdUNetConfig::load(path).map_err(|e| format!("failed to load the model config {path:?}: {e}"))
}

pub const MODEL_NAME: &str = burn_fd_unet::fd_unet::MODEL_NAME;
pub fn save_model<B: Backend>(artifact_dir: &Path, model: &FdUNet<B>) -> Result<(), String> {
    let path = artifact_dir.join(MODEL_NAME);
    println!("Saving model to {path:?}");
    model
        .clone()
        .save_file(path, &RecorderTy::new()) // ext added automatically
        .map_err(|e| format!("failed to save the model: {e:?}"))
}

pub fn load_model<B: Backend>(
    artifact_dir: &Path,
    model_config: &FdUNetConfig,
    device: &B::Device,
) -> Result<Option<FdUNet<B>>, String> {
    let path = artifact_dir.join(MODEL_NAME);
    let file_ext = <RecorderTy as FileRecorder<B>>::file_extension();
    let path_ext = path.with_extension(file_ext);
    if !path_ext.exists() {
        return Ok(None);
    }
    println!("Loading model from {path_ext:?}");
    let model_init = model_config.try_init(device).map_err(|e| e.to_string())?;
    let model = model_init
        .load_file(path, &RecorderTy::new(), device) // ext added automatically
        .map_err(|e| format!("failed to load the model: {e:?}"))?;
    Ok(Some(model))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_args(artifacts_path: &Path, model_config: Option<PathBuf>) -> AppArgs {
        AppArgs {
            inference: false,
            remove_artifacts: false,
            batch_size: 1,
            model_config,
            artifacts_path: artifacts_path.into(),
        }
    }

    #[test]
    fn missing_artifacts_config_falls_back() {
        let dir = temp_dir::TempDir::new().unwrap();
        let args = app_args(dir.path(), None);
        assert!(matches!(args.load_model_config(), Ok(None)));
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let dir = temp_dir::TempDir::new().unwrap();
        let saved = FdUNetConfig::new([1, 16, 16]).with_filters(4);
        app_args(dir.path(), None).save_model_config(&saved).unwrap();

        let args = app_args(dir.path(), Some(dir.path().join("nope.json")));
        assert!(args.load_model_config().is_err());
        // the saved config is untouched
        let loaded = app_args(dir.path(), None).load_model_config().unwrap().unwrap();
        assert_eq!(4, loaded.filters);
    }

    #[test]
    fn unreadable_explicit_config_is_an_error() {
        let dir = temp_dir::TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let args = app_args(dir.path(), Some(path));
        assert!(args.load_model_config().is_err());
    }
}
