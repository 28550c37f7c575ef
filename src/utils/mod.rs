pub mod batch_norm;
pub mod channel_shuffle;
pub mod conv_norm;

pub use batch_norm::{BatchNorm2d, BatchNorm2dConfig};
pub use channel_shuffle::channel_shuffle;
pub use conv_norm::{ConvNorm, ConvNormConfig};
