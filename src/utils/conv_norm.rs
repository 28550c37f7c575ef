use burn::nn::conv::{Conv2d, Conv2dConfig};
use crate::utils::{BatchNorm2d, BatchNorm2dConfig};
use burn::nn::{PaddingConfig2d, Relu};
use burn::prelude::*;

/// A bias-free 2d convolution followed by batch normalization and an optional ReLU.
///
/// Should be created using [ConvNormConfig](ConvNormConfig).
#[derive(Module, Debug)]
pub struct ConvNorm<B: Backend> {
    pub conv: Conv2d<B>,
    pub norm: BatchNorm2d<B>,
    pub activation: Option<Relu>,
}

/// Configuration to create a [ConvNorm](ConvNorm) layer.
#[derive(Config, Debug)]
pub struct ConvNormConfig {
    /// Input and output channels.
    pub channels: [usize; 2],

    pub kernel_size: usize,

    #[config(default = 1)]
    pub stride: usize,

    #[config(default = 0)]
    pub padding: usize,

    /// Number of convolution groups. Must divide both input and output channels.
    #[config(default = 1)]
    pub groups: usize,

    /// Whether a ReLU is applied after the normalization.
    #[config(default = true)]
    pub relu: bool,
}

impl ConvNormConfig {
    /// A depthwise `kernel_size`×`kernel_size` convolution (one group per channel), without activation.
    pub fn depthwise(channels: usize, kernel_size: usize, stride: usize, padding: usize) -> Self {
        Self::new([channels, channels], kernel_size)
            .with_stride(stride)
            .with_padding(padding)
            .with_groups(channels)
            .with_relu(false)
    }

    /// A 1×1 convolution.
    pub fn pointwise(d_input: usize, d_output: usize) -> Self {
        Self::new([d_input, d_output], 1)
    }

    /// Returns the initialized layer.
    pub fn init<B: Backend>(&self, device: &B::Device) -> ConvNorm<B> {
        let [d_input, d_output] = self.channels;
        assert!(
            self.groups > 0 && d_input % self.groups == 0 && d_output % self.groups == 0,
            "groups ({}) must divide both the input ({d_input}) and output ({d_output}) channels",
            self.groups
        );

        ConvNorm {
            conv: Conv2dConfig::new(self.channels, [self.kernel_size, self.kernel_size])
                .with_stride([self.stride, self.stride])
                .with_padding(PaddingConfig2d::Explicit(self.padding, self.padding))
                .with_groups(self.groups)
                .with_bias(false)
                .init(device),
            norm: BatchNorm2dConfig::new(d_output).init(device),
            activation: self.relu.then(Relu::new),
        }
    }
}

impl<B: Backend> ConvNorm<B> {
    /// # Shapes
    ///   - Input [batch, d_input, height, width]
    ///   - Output [batch, d_output, height', width']
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(x);
        let x = self.norm.forward(x);
        match &self.activation {
            Some(relu) => relu.forward(x),
            None => x,
        }
    }
}
