use burn::module::{Param, RunningState};
use burn::nn::Initializer;
use burn::prelude::*;

/// Configuration to create a [BatchNorm2d](BatchNorm2d) layer.
#[derive(Config, Debug)]
pub struct BatchNorm2dConfig {
    /// The number of channels.
    pub channels: usize,
    /// A value required for numerical stability. Default: 1e-5
    #[config(default = 1e-5)]
    pub epsilon: f64,
    /// Weight of the current batch when updating the running statistics. Default: 0.1
    #[config(default = 0.1)]
    pub momentum: f64,
}

impl BatchNorm2dConfig {
    /// Initialize a new [BatchNorm2d](BatchNorm2d) module.
    pub fn init<B: Backend>(&self, device: &B::Device) -> BatchNorm2d<B> {
        BatchNorm2d {
            gamma: Initializer::Ones.init([self.channels], device),
            beta: Initializer::Zeros.init([self.channels], device),
            running_mean: RunningState::new(Tensor::zeros([self.channels], device)),
            running_var: RunningState::new(Tensor::ones([self.channels], device)),
            epsilon: self.epsilon,
            momentum: self.momentum,
        }
    }
}

/// Applies Batch Normalization over the channels of a `[batch, channels, height, width]` tensor,
/// as described in the paper [Batch Normalization](https://arxiv.org/abs/1502.03167).
///
/// `Y = (X - mean) / √(var + ε) * γ + β`
///
/// With an autodiff backend the statistics come from the batch and update the running ones;
/// otherwise the running statistics are used.
///
/// Should be created using [BatchNorm2dConfig](BatchNorm2dConfig).
#[derive(Module, Debug)]
pub struct BatchNorm2d<B: Backend> {
    /// The learnable scale, per channel.
    pub gamma: Param<Tensor<B, 1>>,
    /// The learnable shift, per channel.
    pub beta: Param<Tensor<B, 1>>,
    pub running_mean: RunningState<Tensor<B, 1>>,
    /// Unbiased estimate.
    pub running_var: RunningState<Tensor<B, 1>>,
    epsilon: f64,
    momentum: f64,
}

impl<B: Backend> BatchNorm2d<B> {
    /// # Shapes
    ///   - Input [batch, channels, height, width]
    ///   - Output [batch, channels, height, width]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        if B::ad_enabled() {
            self.forward_train(x)
        } else {
            self.forward_inference(x)
        }
    }

    fn forward_inference(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let [_, channels, _, _] = x.dims();
        let mean = self.running_mean.value().reshape([1, channels, 1, 1]);
        let var = self.running_var.value().reshape([1, channels, 1, 1]);
        self.normalize(x, mean, var)
    }

    fn forward_train(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let [batch, channels, height, width] = x.dims();
        let n = batch * height * width;

        let flat = x.clone().swap_dims(0, 1).reshape([channels, n]);
        let mean = flat.clone().mean_dim(1);
        debug_assert_eq!([channels, 1], mean.dims());
        let centered = flat - mean.clone();
        let var = (centered.clone() * centered).mean_dim(1);
        debug_assert_eq!([channels, 1], var.dims());

        let running_mean = self.running_mean.value_sync();
        let running_var = self.running_var.value_sync();
        let batch_mean = mean.clone().detach().reshape([channels]);
        // running statistics track the unbiased variance
        let unbiased = if n > 1 {
            n as f64 / (n - 1) as f64
        } else {
            1.
        };
        let batch_var = var.clone().detach().reshape([channels]) * unbiased;
        self.running_mean
            .update(running_mean * (1. - self.momentum) + batch_mean * self.momentum);
        self.running_var
            .update(running_var * (1. - self.momentum) + batch_var * self.momentum);

        self.normalize(
            x,
            mean.reshape([1, channels, 1, 1]),
            var.reshape([1, channels, 1, 1]),
        )
    }

    fn normalize(&self, x: Tensor<B, 4>, mean: Tensor<B, 4>, var: Tensor<B, 4>) -> Tensor<B, 4> {
        let [_, channels, _, _] = x.dims();
        let gamma = self.gamma.val().reshape([1, channels, 1, 1]);
        let beta = self.beta.val().reshape([1, channels, 1, 1]);

        (x - mean) / (var + self.epsilon).sqrt() * gamma + beta
    }
}
