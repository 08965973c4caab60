pub mod admin;
pub mod common;
pub mod company;
pub mod session;

pub use admin::{AdminRepository, PgAdminRepository};
pub use company::{CompanyListCriteria, CompanyRepository, DirectoryCriteria, PgCompanyRepository};
pub use session::{PgSessionRepository, SessionRepository};
