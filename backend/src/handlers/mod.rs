pub mod admin;
pub mod auth;
pub mod common;
pub mod directory;
pub mod manager;
pub mod registration;
