#[cfg(feature = "shufflenet")]
pub mod shufflenet;
#[cfg(feature = "stanford-cars")]
pub mod stanford_cars;
#[cfg(feature = "shufflenet")]
pub mod utils;

pub mod prelude {
    #[cfg(feature = "shufflenet")]
    pub use crate::shufflenet::*;

    #[cfg(feature = "stanford-cars")]
    pub use crate::stanford_cars::*;
}
