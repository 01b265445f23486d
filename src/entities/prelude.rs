pub use super::blacklisted_tokens::Entity as BlacklistedTokens;
pub use super::fraud_flags::Entity as FraudFlags;
pub use super::loan_applications::Entity as LoanApplications;
pub use super::users::Entity as Users;
