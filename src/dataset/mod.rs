pub mod types;
pub mod loader;
pub mod plugin;

pub use types::*;
pub use loader::*;
pub use plugin::*;
