pub mod layers;
pub mod conv;
pub mod init;
pub mod weights;
pub mod extractor;
pub mod pair;

pub use layers::*;
pub use conv::*;
pub use init::*;
pub use weights::*;
pub use extractor::*;
pub use pair::*;
