pub mod errors;
pub mod id;
pub mod repository;
pub mod todo;
pub mod user;

pub use errors::*;
pub use id::*;
pub use repository::*;
pub use todo::*;
pub use user::*;
