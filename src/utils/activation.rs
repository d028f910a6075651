use crate::error::FdUNetError;
use burn::prelude::*;
use burn::tensor::activation;
use core::fmt;
use core::str::FromStr;

/// Named elementwise activation, applied right after a convolution.
#[derive(
    Module, Default, Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
pub enum Activation {
    /// Identity.
    #[default]
    Linear,
    Relu,
    /// Negative slope of 0.2.
    LeakyRelu,
    Sigmoid,
    Tanh,
    Gelu,
    /// Also known as swish.
    Silu,
    /// `log(1 + exp(x))`, with beta of 1.
    Softplus,
}

impl Activation {
    pub const LEAKY_RELU_SLOPE: f64 = 0.2;

    /// Applies the activation.
    ///
    /// # Shapes
    ///
    /// - input: `[..., any]`
    /// - output: `[..., any]`
    pub fn forward<B: Backend, const D: usize>(&self, x: Tensor<B, D>) -> Tensor<B, D> {
        match self {
            Activation::Linear => x,
            Activation::Relu => activation::relu(x),
            Activation::LeakyRelu => activation::leaky_relu(x, Self::LEAKY_RELU_SLOPE),
            Activation::Sigmoid => activation::sigmoid(x),
            Activation::Tanh => activation::tanh(x),
            Activation::Gelu => activation::gelu(x),
            Activation::Silu => activation::silu(x),
            Activation::Softplus => activation::softplus(x, 1.0),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Activation::Linear => "linear",
            Activation::Relu => "relu",
            Activation::LeakyRelu => "leaky_relu",
            Activation::Sigmoid => "sigmoid",
            Activation::Tanh => "tanh",
            Activation::Gelu => "gelu",
            Activation::Silu => "silu",
            Activation::Softplus => "softplus",
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Activation {
    type Err = FdUNetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let activation = match s.to_ascii_lowercase().as_str() {
            "linear" | "identity" => Activation::Linear,
            "relu" => Activation::Relu,
            "leaky_relu" => Activation::LeakyRelu,
            "sigmoid" => Activation::Sigmoid,
            "tanh" => Activation::Tanh,
            "gelu" => Activation::Gelu,
            "silu" | "swish" => Activation::Silu,
            "softplus" => Activation::Softplus,
            _ => {
                return Err(FdUNetError::UnknownActivation { name: s.into() });
            }
        };
        Ok(activation)
    }
}
