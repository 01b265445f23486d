pub mod prelude;

pub mod blacklisted_tokens;
pub mod fraud_flags;
pub mod loan_applications;
pub mod users;
