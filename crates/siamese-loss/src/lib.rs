pub mod distance;
pub mod loss;

pub use distance::*;
pub use loss::*;
