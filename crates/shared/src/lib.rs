pub mod config;
pub mod identity;
pub mod tracing;

pub use config::*;
pub use identity::*;
pub use tracing::*;
