//! Domain models shared across the subsystem.

pub mod order;
pub mod user;

pub use order::Order;
pub use user::User;
