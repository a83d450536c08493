pub mod stage0_sanitize;
pub mod stage1_context;
pub mod stage2_generate;
pub mod stage3_publish;

pub use stage0_sanitize::*;
pub use stage1_context::*;
pub use stage2_generate::*;
pub use stage3_publish::*;
