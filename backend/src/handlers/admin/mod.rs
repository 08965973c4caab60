pub mod companies;
pub mod dashboard;

pub use companies::*;
pub use dashboard::*;
