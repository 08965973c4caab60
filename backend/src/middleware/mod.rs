pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod session;

pub use auth::*;
pub use request_id::*;
pub use session::{load_session, SessionHandle};
