mod block;
mod network;
mod stage;

pub use block::{SHUFFLE_GROUPS, ShuffleBlock, ShuffleBlockConfig, ShuffleBranch1, ShuffleBranch2};
pub use network::{ShuffleNetV2, ShuffleNetV2Config, ShuffleNetV2Variant, UnknownVariant};
pub use stage::{ShuffleStage, ShuffleStageConfig};
