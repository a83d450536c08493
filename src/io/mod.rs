pub mod articles;
pub mod chroma;
pub mod error;
pub mod storage;

pub use articles::*;
pub use chroma::*;
pub use error::ClientError;
pub use storage::*;
