pub mod base;
pub mod company_profile;
pub mod profile;
pub mod session;

pub use base::BaseDao;
pub use company_profile::CompanyProfileDao;
pub use profile::ProfileDao;
pub use session::SessionDao;
