pub mod cookies;
pub mod csrf;
pub mod password;
pub mod session_token;
pub mod time;

pub use password::*;
pub use time::*;
