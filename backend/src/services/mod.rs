pub mod access;

pub use access::{AccessController, AuthError};
