mod batcher;
mod dataset;
mod error;
mod labels;

pub use batcher::{StanfordCarsBatch, StanfordCarsBatcher};
pub use dataset::{
    CHANNELS, DEFAULT_HEIGHT, DEFAULT_WIDTH, IMAGE_EXTENSION, StanfordCarsConfig,
    StanfordCarsDataset, StanfordCarsItem,
};
pub use error::{MISMATCH_EXAMPLES, StanfordCarsError, StanfordCarsResult};
pub use labels::{LabelRow, LabelTable};
