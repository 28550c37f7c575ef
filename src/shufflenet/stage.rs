use crate::shufflenet::{ShuffleBlock, ShuffleBlockConfig};
use burn::prelude::*;

/// A run of [ShuffleBlock]s where only the first one downsamples.
#[derive(Module, Debug)]
pub struct ShuffleStage<B: Backend> {
    pub blocks: Vec<ShuffleBlock<B>>,
}

#[derive(Config, Debug)]
pub struct ShuffleStageConfig {
    pub d_input: usize,
    pub d_output: usize,

    /// Number of blocks in the stage, including the downsampling one.
    pub repeats: usize,
}

impl ShuffleStageConfig {
    /// Returns the initialized stage.
    pub fn init<B: Backend>(&self, device: &B::Device) -> ShuffleStage<B> {
        assert!(self.repeats >= 1, "a stage needs at least one block");

        let mut blocks = Vec::with_capacity(self.repeats);
        blocks.push(
            ShuffleBlockConfig::new(self.d_input, self.d_output)
                .with_stride(2)
                .init(device),
        );
        for _ in 1..self.repeats {
            let block = ShuffleBlockConfig::new(self.d_output, self.d_output).init(device);
            blocks.push(block);
        }

        ShuffleStage { blocks }
    }
}

impl<B: Backend> ShuffleStage<B> {
    /// # Shapes
    ///   - Input [batch, d_input, height, width]
    ///   - Output [batch, d_output, ⌈height / 2⌉, ⌈width / 2⌉]
    pub fn forward(&self, mut x: Tensor<B, 4>) -> Tensor<B, 4> {
        for block in self.blocks.iter() {
            x = block.forward(x);
        }
        x
    }
}
