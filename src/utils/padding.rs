use crate::error::FdUNetError;
use burn::prelude::*;
use core::fmt;
use core::str::FromStr;

/// Border handling of the convolutions.
///
/// With a stride `s`, a `Same` convolution maps a side of `n` into `⌈n / s⌉`,
/// and a `Same` transposed convolution maps `n` into `n * s`.
#[derive(
    Module, Default, Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
pub enum Padding {
    /// Zero padding split as TensorFlow does, with the odd pixel after the side.
    ///
    /// Strided and even-sized kernels therefore sample the same grid as a Keras layer.
    #[default]
    Same,
    /// No padding.
    Valid,
}

impl Padding {
    /// `(before, after)` zero padding of a side of `size` for a convolution.
    pub fn conv_padding(&self, size: usize, kernel_size: usize, stride: usize) -> (usize, usize) {
        match self {
            Padding::Same => {
                let out = size.div_ceil(stride.max(1));
                let total = (out.saturating_sub(1) * stride + kernel_size).saturating_sub(size);
                (total / 2, total - total / 2)
            }
            Padding::Valid => (0, 0),
        }
    }

    /// `(crop, padding_out)` for a transposed convolution.
    ///
    /// The unpadded output is extended by `padding_out` at the end, then `crop` leading
    /// entries are dropped and a `Same` output keeps `size * stride` entries.
    pub fn transposed_padding(&self, kernel_size: usize, stride: usize) -> (usize, usize) {
        match self {
            Padding::Same => (
                kernel_size.saturating_sub(stride) / 2,
                stride.saturating_sub(kernel_size),
            ),
            Padding::Valid => (0, 0),
        }
    }

    /// Output side length of a convolution, `None` if the side cannot hold the kernel.
    pub fn conv_out_size(&self, size: usize, kernel_size: usize, stride: usize) -> Option<usize> {
        if size == 0 || stride == 0 {
            return None;
        }
        let (before, after) = self.conv_padding(size, kernel_size, stride);
        let span = (size + before + after).checked_sub(kernel_size)?;
        Some(span / stride + 1)
    }

    /// Output side length of a transposed convolution, `None` for an empty side or stride.
    pub fn transposed_out_size(
        &self,
        size: usize,
        kernel_size: usize,
        stride: usize,
    ) -> Option<usize> {
        if size == 0 || stride == 0 || kernel_size == 0 {
            return None;
        }
        match self {
            Padding::Same => Some(size * stride),
            Padding::Valid => Some((size - 1) * stride + kernel_size),
        }
    }

    /// Zero pads the two spatial dims of `x` for a convolution.
    pub fn pad_input<B: Backend>(
        &self,
        x: Tensor<B, 4>,
        kernel_size: [usize; 2],
        stride: [usize; 2],
    ) -> Tensor<B, 4> {
        let [_, _, height, width] = x.dims();
        let rows = self.conv_padding(height, kernel_size[0], stride[0]);
        let cols = self.conv_padding(width, kernel_size[1], stride[1]);
        let x = pad_zeros(x, 2, rows);
        pad_zeros(x, 3, cols)
    }

    /// Crops the spatial dims of a transposed convolution output taken from an
    /// input of `[height, width]`.
    pub fn crop_transposed<B: Backend>(
        &self,
        x: Tensor<B, 4>,
        input_size: [usize; 2],
        kernel_size: [usize; 2],
        stride: [usize; 2],
    ) -> Tensor<B, 4> {
        match self {
            Padding::Same => {
                let (crop_rows, _) = self.transposed_padding(kernel_size[0], stride[0]);
                let (crop_cols, _) = self.transposed_padding(kernel_size[1], stride[1]);
                x.narrow(2, crop_rows, input_size[0] * stride[0])
                    .narrow(3, crop_cols, input_size[1] * stride[1])
            }
            Padding::Valid => x,
        }
    }

    pub fn check_kernel_size(&self, kernel_size: usize) -> Result<(), FdUNetError> {
        if kernel_size == 0 {
            return Err(FdUNetError::InvalidKernelSize { kernel_size });
        }
        Ok(())
    }

    pub fn name(&self) -> &'static str {
        match self {
            Padding::Same => "same",
            Padding::Valid => "valid",
        }
    }
}

fn pad_zeros<B: Backend>(
    x: Tensor<B, 4>,
    dim: usize,
    (before, after): (usize, usize),
) -> Tensor<B, 4> {
    if before == 0 && after == 0 {
        return x;
    }
    let device = x.device();
    let dims = x.dims();
    let zeros = |len: usize| {
        let mut shape = dims;
        shape[dim] = len;
        Tensor::<B, 4>::zeros(shape, &device)
    };
    let mut parts = Vec::with_capacity(3);
    if before > 0 {
        parts.push(zeros(before));
    }
    parts.push(x);
    if after > 0 {
        parts.push(zeros(after));
    }
    Tensor::cat(parts, dim)
}

impl fmt::Display for Padding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Padding {
    type Err = FdUNetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "same" => Ok(Padding::Same),
            "valid" => Ok(Padding::Valid),
            _ => Err(FdUNetError::UnknownPadding { name: s.into() }),
        }
    }
}
