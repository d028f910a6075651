use crate::error::FdUNetError;
use burn::nn::Initializer;
use burn::prelude::*;
use core::fmt;
use core::str::FromStr;

/// Named variance-scaling initializer for convolution kernels.
///
/// Fan-in and fan-out are computed by the convolution layers themselves.
/// The normal variants draw from an untruncated normal, where Keras truncates at two
/// standard deviations, so their weights have the same variance but a longer tail.
#[derive(
    Module, Default, Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
pub enum KernelInitializer {
    /// `N(0, 2 / (fan_in + fan_out))`.
    #[default]
    GlorotNormal,
    /// `U(±√(6 / (fan_in + fan_out)))`.
    GlorotUniform,
    /// `N(0, 2 / fan_in)`.
    HeNormal,
    /// `U(±√(6 / fan_in))`.
    HeUniform,
    /// `N(0, 1 / fan_in)`.
    LecunNormal,
    /// `U(±√(3 / fan_in))`.
    LecunUniform,
    Zeros,
    Ones,
}

impl KernelInitializer {
    pub fn to_initializer(&self) -> Initializer {
        match self {
            KernelInitializer::GlorotNormal => Initializer::XavierNormal { gain: 1.0 },
            KernelInitializer::GlorotUniform => Initializer::XavierUniform { gain: 1.0 },
            KernelInitializer::HeNormal => Initializer::KaimingNormal {
                gain: core::f64::consts::SQRT_2,
                fan_out_only: false,
            },
            KernelInitializer::HeUniform => Initializer::KaimingUniform {
                gain: core::f64::consts::SQRT_2,
                fan_out_only: false,
            },
            KernelInitializer::LecunNormal => Initializer::KaimingNormal {
                gain: 1.0,
                fan_out_only: false,
            },
            KernelInitializer::LecunUniform => Initializer::KaimingUniform {
                gain: 1.0,
                fan_out_only: false,
            },
            KernelInitializer::Zeros => Initializer::Zeros,
            KernelInitializer::Ones => Initializer::Ones,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            KernelInitializer::GlorotNormal => "glorot_normal",
            KernelInitializer::GlorotUniform => "glorot_uniform",
            KernelInitializer::HeNormal => "he_normal",
            KernelInitializer::HeUniform => "he_uniform",
            KernelInitializer::LecunNormal => "lecun_normal",
            KernelInitializer::LecunUniform => "lecun_uniform",
            KernelInitializer::Zeros => "zeros",
            KernelInitializer::Ones => "ones",
        }
    }
}

impl fmt::Display for KernelInitializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KernelInitializer {
    type Err = FdUNetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let initializer = match s.to_ascii_lowercase().as_str() {
            "glorot_normal" | "xavier_normal" => KernelInitializer::GlorotNormal,
            "glorot_uniform" | "xavier_uniform" => KernelInitializer::GlorotUniform,
            "he_normal" | "kaiming_normal" => KernelInitializer::HeNormal,
            "he_uniform" | "kaiming_uniform" => KernelInitializer::HeUniform,
            "lecun_normal" => KernelInitializer::LecunNormal,
            "lecun_uniform" => KernelInitializer::LecunUniform,
            "zeros" => KernelInitializer::Zeros,
            "ones" => KernelInitializer::Ones,
            _ => {
                return Err(FdUNetError::UnknownInitializer { name: s.into() });
            }
        };
        Ok(initializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases() {
        assert_eq!(
            "glorot_normal".parse::<KernelInitializer>().unwrap(),
            KernelInitializer::GlorotNormal
        );
        assert_eq!(
            "kaiming_uniform".parse::<KernelInitializer>().unwrap(),
            KernelInitializer::HeUniform
        );
        assert!(matches!(
            "orthogonal".parse::<KernelInitializer>(),
            Err(FdUNetError::UnknownInitializer { .. })
        ));
    }

    #[test]
    fn glorot_and_lecun_keep_a_unit_gain() {
        assert_eq!(
            Initializer::XavierNormal { gain: 1.0 },
            KernelInitializer::GlorotNormal.to_initializer()
        );
        assert_eq!(
            Initializer::XavierUniform { gain: 1.0 },
            KernelInitializer::GlorotUniform.to_initializer()
        );
        assert_eq!(
            Initializer::KaimingNormal {
                gain: 1.0,
                fan_out_only: false
            },
            KernelInitializer::LecunNormal.to_initializer()
        );
        assert_eq!(
            Initializer::KaimingUniform {
                gain: 1.0,
                fan_out_only: false
            },
            KernelInitializer::LecunUniform.to_initializer()
        );
        assert_eq!(Initializer::Zeros, KernelInitializer::Zeros.to_initializer());
    }

    #[test]
    fn he_uniform_scales_by_sqrt_two() {
        match KernelInitializer::HeUniform.to_initializer() {
            Initializer::KaimingUniform { gain, fan_out_only } => {
                assert!((gain * gain - 2.0).abs() < 1e-12);
                assert!(!fan_out_only);
            }
            other => panic!("unexpected initializer {other:?}"),
        }
    }

    #[test]
    fn he_normal_scales_by_sqrt_two() {
        match KernelInitializer::HeNormal.to_initializer() {
            Initializer::KaimingNormal { gain, fan_out_only } => {
                assert!((gain * gain - 2.0).abs() < 1e-12);
                assert!(!fan_out_only);
            }
            other => panic!("unexpected initializer {other:?}"),
        }
    }
}
