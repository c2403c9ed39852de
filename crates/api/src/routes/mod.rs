pub mod analyze;
pub mod session;
