pub mod article;
pub mod stats;
pub mod synthetic;
pub mod window;

pub use article::*;
pub use stats::*;
pub use synthetic::*;
pub use window::*;
