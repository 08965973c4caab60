pub mod admin;
pub mod company;
pub mod session;
