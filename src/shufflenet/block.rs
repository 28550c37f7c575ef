//! The ShuffleNet-v2 building unit.
//!
//! References:
//! - https://arxiv.org/abs/1807.11164 (Figure 3 (c) and (d))
//! - https://github.com/pytorch/vision/blob/main/torchvision/models/shufflenetv2.py

use crate::utils::{ConvNorm, ConvNormConfig, channel_shuffle};
use burn::prelude::*;

/// Number of groups the concatenated branches are shuffled across.
pub const SHUFFLE_GROUPS: usize = 2;

#[derive(Module, Debug)]
pub struct ShuffleBlock<B: Backend> {
    /// Downsampling branch, only present when `stride > 1`.
    ///
    /// Input channel: d_input.
    /// Output channel: branch_features.
    pub branch1: Option<ShuffleBranch1<B>>,

    /// Input channel: d_input if `stride > 1`, otherwise branch_features.
    /// Output channel: branch_features.
    pub branch2: ShuffleBranch2<B>,

    pub stride: usize,
}

/// Depthwise 3×3 followed by a pointwise projection.
#[derive(Module, Debug)]
pub struct ShuffleBranch1<B: Backend> {
    pub depthwise: ConvNorm<B>,
    pub pointwise: ConvNorm<B>,
}

/// Pointwise, depthwise 3×3, pointwise.
#[derive(Module, Debug)]
pub struct ShuffleBranch2<B: Backend> {
    pub pointwise_in: ConvNorm<B>,
    pub depthwise: ConvNorm<B>,
    pub pointwise_out: ConvNorm<B>,
}

#[derive(Config, Debug)]
pub struct ShuffleBlockConfig {
    /// Input channels.
    pub d_input: usize,

    /// Output channels. Must be even, as each branch produces half of them.
    pub d_output: usize,

    /// Spatial stride of the depthwise convolutions.
    ///
    /// With a stride of `1` the input is split in half instead of being fed to a
    /// downsampling branch, so `d_input` must equal `d_output`.
    #[config(default = 1)]
    pub stride: usize,
}

impl ShuffleBlockConfig {
    /// Returns the initialized block.
    ///
    /// # Panics
    /// If `d_output` is odd, if `stride` is zero, or if `stride == 1` and `d_input != d_output`.
    pub fn init<B: Backend>(&self, device: &B::Device) -> ShuffleBlock<B> {
        assert!(self.stride >= 1, "stride must be positive");
        assert_eq!(
            self.d_output % 2,
            0,
            "the output channels ({}) must be even",
            self.d_output
        );
        let branch_features = self.branch_features();
        assert!(
            self.stride != 1 || self.d_input == branch_features * 2,
            "with stride 1 the input channels ({}) must equal the output channels ({})",
            self.d_input,
            self.d_output
        );

        let downsample = self.stride > 1;

        let branch1 = downsample.then(|| ShuffleBranch1 {
            depthwise: ConvNormConfig::depthwise(self.d_input, 3, self.stride, 1).init(device),
            pointwise: ConvNormConfig::pointwise(self.d_input, branch_features).init(device),
        });

        let d_branch2 = if downsample {
            self.d_input
        } else {
            branch_features
        };
        let branch2 = ShuffleBranch2 {
            pointwise_in: ConvNormConfig::pointwise(d_branch2, branch_features).init(device),
            depthwise: ConvNormConfig::depthwise(branch_features, 3, self.stride, 1).init(device),
            pointwise_out: ConvNormConfig::pointwise(branch_features, branch_features)
                .init(device),
        };

        ShuffleBlock {
            branch1,
            branch2,
            stride: self.stride,
        }
    }

    pub fn branch_features(&self) -> usize {
        self.d_output / 2
    }
}

impl<B: Backend> ShuffleBlock<B> {
    /// # Shapes
    ///   - Input [batch, d_input, height, width]
    ///   - Output [batch, d_output, height / stride, width / stride] (rounded up)
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let [batch, _d_input, _, _] = x.dims();

        let out = match &self.branch1 {
            Some(branch1) => {
                let x1 = branch1.forward(x.clone());
                let x2 = self.branch2.forward(x);
                debug_assert_eq!(x1.dims(), x2.dims());
                Tensor::cat(vec![x1, x2], 1)
            }
            None => {
                let [x1, x2]: [Tensor<B, 4>; 2] = x
                    .chunk(2, 1)
                    .try_into()
                    .unwrap_or_else(|_| unreachable!("even channels always chunk in two"));
                let x2 = self.branch2.forward(x2);
                debug_assert_eq!(x1.dims(), x2.dims());
                Tensor::cat(vec![x1, x2], 1)
            }
        };
        debug_assert_eq!(batch, out.dims()[0]);

        channel_shuffle(out, SHUFFLE_GROUPS)
    }
}

impl<B: Backend> ShuffleBranch1<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.depthwise.forward(x);
        self.pointwise.forward(x)
    }
}

impl<B: Backend> ShuffleBranch2<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.pointwise_in.forward(x);
        let x = self.depthwise.forward(x);
        self.pointwise_out.forward(x)
    }
}
