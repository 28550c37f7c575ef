use crate::stanford_cars::{CHANNELS, StanfordCarsItem};
use burn::data::dataloader::batcher::Batcher;
use burn::prelude::*;

#[derive(Clone, Default, Debug)]
pub struct StanfordCarsBatcher {}

impl StanfordCarsBatcher {
    pub fn new() -> Self {
        Self {}
    }
}

#[derive(Clone, Debug)]
pub struct StanfordCarsBatch<B: Backend> {
    /// RGB intensities in between 0.0 and 1.0.
    ///
    /// # Shape
    /// [batch_size, CHANNELS, height, width]
    pub images: Tensor<B, 4>,
    /// # Shape
    /// [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

impl<B: Backend> Batcher<B, StanfordCarsItem, StanfordCarsBatch<B>> for StanfordCarsBatcher {
    /// # Panics
    /// If `items` is empty, or if the items don't all share the same image size.
    fn batch(&self, items: Vec<StanfordCarsItem>, device: &B::Device) -> StanfordCarsBatch<B> {
        let (images, targets): (Vec<_>, Vec<_>) = items
            .into_iter()
            .map(|item| {
                let image = TensorData::new(item.image, [1, CHANNELS, item.height, item.width])
                    .convert::<B::FloatElem>();
                let image = Tensor::<B, 4>::from_data(image, device);
                let target = Tensor::<B, 1, Int>::from_data(
                    [(item.label as i64).elem::<B::IntElem>()],
                    device,
                );
                (image, target)
            })
            .unzip();

        let images = Tensor::cat(images, 0);
        let targets = Tensor::cat(targets, 0);

        StanfordCarsBatch { images, targets }
    }
}
