pub mod loan;
pub mod token;
pub mod user;
