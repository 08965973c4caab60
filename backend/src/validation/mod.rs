//! Form validation rules shared by registration and admin actions.

pub mod rules;

pub use validator::Validate;
