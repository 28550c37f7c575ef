//! Stacks ShuffleBlocks into the ShuffleNet-v2 image classifier.
//!
//! References:
//! - https://arxiv.org/abs/1807.11164 (Table 5)
//! - https://github.com/pytorch/vision/blob/main/torchvision/models/shufflenetv2.py

use crate::shufflenet::{ShuffleStage, ShuffleStageConfig};
use crate::utils::{ConvNorm, ConvNormConfig};
use burn::nn::pool::{MaxPool2d, MaxPool2dConfig};
use burn::nn::{Linear, LinearConfig, PaddingConfig2d};
use burn::prelude::*;
use std::fmt;
use std::str::FromStr;

#[derive(Module, Debug)]
pub struct ShuffleNetV2<B: Backend> {
    /// Strided 3×3 stem.
    ///
    /// Input channel: img_channels.
    /// Output channel: stages_out_channels[0].
    pub conv1: ConvNorm<B>,
    pub maxpool: MaxPool2d,
    pub stage2: ShuffleStage<B>,
    pub stage3: ShuffleStage<B>,
    pub stage4: ShuffleStage<B>,

    /// Input channel: stages_out_channels[3].
    /// Output channel: stages_out_channels[4].
    pub conv5: ConvNorm<B>,

    /// Input channel: stages_out_channels[4].
    /// Output channel: num_classes.
    pub fc: Linear<B>,
}

#[derive(Config, Debug)]
pub struct ShuffleNetV2Config {
    pub num_classes: usize,

    /// Channels of the input image, e.g. `3` for RGB.
    pub img_channels: usize,

    /// Number of blocks in stage2, stage3 and stage4.
    pub stages_repeats: [usize; 3],

    /// Output channels of conv1, stage2, stage3, stage4 and conv5.
    pub stages_out_channels: [usize; 5],
}

impl ShuffleNetV2Config {
    /// ShuffleNet-v2 with 0.5× channel width.
    pub fn x0_5(num_classes: usize, img_channels: usize) -> Self {
        ShuffleNetV2Variant::X0_5.config(num_classes, img_channels)
    }

    /// ShuffleNet-v2 with 1.0× channel width.
    pub fn x1_0(num_classes: usize, img_channels: usize) -> Self {
        ShuffleNetV2Variant::X1_0.config(num_classes, img_channels)
    }

    /// ShuffleNet-v2 with 1.5× channel width.
    pub fn x1_5(num_classes: usize, img_channels: usize) -> Self {
        ShuffleNetV2Variant::X1_5.config(num_classes, img_channels)
    }

    /// ShuffleNet-v2 with 2.0× channel width.
    pub fn x2_0(num_classes: usize, img_channels: usize) -> Self {
        ShuffleNetV2Variant::X2_0.config(num_classes, img_channels)
    }

    /// Returns the initialized model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> ShuffleNetV2<B> {
        assert!(self.num_classes > 0, "num_classes must be positive");
        assert!(self.img_channels > 0, "img_channels must be positive");
        let [c_stem, c2, c3, c4, c_last] = self.stages_out_channels;
        let [r2, r3, r4] = self.stages_repeats;
        log::debug!(
            "initializing ShuffleNetV2: classes={} img_channels={} repeats={:?} out_channels={:?}",
            self.num_classes,
            self.img_channels,
            self.stages_repeats,
            self.stages_out_channels
        );

        ShuffleNetV2 {
            conv1: ConvNormConfig::new([self.img_channels, c_stem], 3)
                .with_stride(2)
                .with_padding(1)
                .init(device),
            maxpool: MaxPool2dConfig::new([3, 3])
                .with_strides([2, 2])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(),
            stage2: ShuffleStageConfig::new(c_stem, c2, r2).init(device),
            stage3: ShuffleStageConfig::new(c2, c3, r3).init(device),
            stage4: ShuffleStageConfig::new(c3, c4, r4).init(device),
            conv5: ConvNormConfig::pointwise(c4, c_last).init(device),
            fc: LinearConfig::new(c_last, self.num_classes).init(device),
        }
    }
}

impl<B: Backend> ShuffleNetV2<B> {
    /// # Shapes
    ///   - Input [batch, img_channels, height, width]
    ///   - Output [batch, num_classes]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let [batch, _, _, _] = x.dims();
        let [d_features, num_classes] = self.fc.weight.dims();

        let features = self.forward_features(x);
        debug_assert_eq!([batch, d_features], features.dims());

        let logits = self.fc.forward(features);
        debug_assert_eq!([batch, num_classes], logits.dims());

        logits
    }

    /// Everything but the classifier head: the globally average-pooled output of conv5.
    ///
    /// # Shapes
    ///   - Input [batch, img_channels, height, width]
    ///   - Output [batch, stages_out_channels[4]]
    pub fn forward_features(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.conv1.forward(x);
        let x = self.maxpool.forward(x);
        let x = self.stage2.forward(x);
        let x = self.stage3.forward(x);
        let x = self.stage4.forward(x);
        let x = self.conv5.forward(x);
        let [batch, channels, _, _] = x.dims();

        // global average pooling
        let x = x.mean_dim(3).mean_dim(2);
        debug_assert_eq!([batch, channels, 1, 1], x.dims());

        x.flatten(1, 3)
    }
}

/// The four published channel-width multipliers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShuffleNetV2Variant {
    X0_5,
    X1_0,
    X1_5,
    X2_0,
}

impl ShuffleNetV2Variant {
    pub const ALL: [Self; 4] = [Self::X0_5, Self::X1_0, Self::X1_5, Self::X2_0];

    /// Blocks in stage2, stage3 and stage4. Shared by every variant.
    pub const STAGES_REPEATS: [usize; 3] = [4, 8, 4];

    pub fn stages_out_channels(&self) -> [usize; 5] {
        match self {
            Self::X0_5 => [24, 48, 96, 192, 1024],
            Self::X1_0 => [24, 116, 232, 464, 1024],
            Self::X1_5 => [24, 176, 352, 704, 1024],
            Self::X2_0 => [24, 244, 488, 976, 2048],
        }
    }

    pub fn config(&self, num_classes: usize, img_channels: usize) -> ShuffleNetV2Config {
        ShuffleNetV2Config::new(
            num_classes,
            img_channels,
            Self::STAGES_REPEATS,
            self.stages_out_channels(),
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X0_5 => "x0_5",
            Self::X1_0 => "x1_0",
            Self::X1_5 => "x1_5",
            Self::X2_0 => "x2_0",
        }
    }
}

impl fmt::Display for ShuffleNetV2Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown [ShuffleNetV2Variant].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown ShuffleNet-v2 variant {:?} (expected one of x0_5, x1_0, x1_5, x2_0)",
            self.0
        )
    }
}

impl std::error::Error for UnknownVariant {}

impl FromStr for ShuffleNetV2Variant {
    type Err = UnknownVariant;

    /// Accepts `x0_5`, `x05`, `0.5` and the like, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let width = normalized.strip_prefix('x').unwrap_or(&normalized);
        match width {
            "0_5" | "05" | "0.5" => Ok(Self::X0_5),
            "1_0" | "10" | "1.0" | "1" => Ok(Self::X1_0),
            "1_5" | "15" | "1.5" => Ok(Self::X1_5),
            "2_0" | "20" | "2.0" | "2" => Ok(Self::X2_0),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}
