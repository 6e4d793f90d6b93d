//! Administrative handlers.

pub mod users;
