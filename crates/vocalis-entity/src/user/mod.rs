//! User domain entities.

pub mod model;
pub mod role;
pub mod status;

pub use model::{NewUser, User, UserFilter};
pub use role::UserRole;
pub use status::UserStatus;
