pub mod mae;
pub mod mse;
pub mod relevance;
pub mod sp;

pub use mae::{abs_mean, MaeLoss};
pub use mse::{mean_square, root_mean_square, MseLoss};
pub use relevance::relevance;
pub use sp::{sp_product, SpIndex};
