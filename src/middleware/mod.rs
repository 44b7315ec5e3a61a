pub mod auth;

pub use auth::{staff_auth, StaffActor};
