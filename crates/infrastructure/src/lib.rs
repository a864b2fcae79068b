pub mod memory;
pub mod redis_repository;
pub mod redis_store;

pub use memory::*;
pub use redis_repository::*;
pub use redis_store::*;
