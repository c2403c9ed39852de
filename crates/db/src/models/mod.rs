pub mod analysis;
pub mod company_profile;
pub mod profile;
pub mod session;

pub use analysis::*;
pub use company_profile::CompanyProfile;
pub use profile::Profile;
pub use session::{Session, SessionStatus};
