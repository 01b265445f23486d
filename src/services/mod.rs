pub mod fraud;
pub use fraud::{FraudHistory, FraudReason, FraudRule, FraudRuleEvaluator};

pub mod notification;
pub use notification::{EmailMessage, FlaggedLoanNotifier, LogMailer, Mailer};

pub mod token;
pub use token::{Claims, JwtService, TokenError, TokenPair, TokenType};

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, Credentials, Registration};
pub use auth_service_impl::SeaOrmAuthService;

pub mod loan_service;
pub mod loan_service_impl;
pub use loan_service::{
    LoanError, LoanService, LoanSubmission, Page, PageRequest, SubmissionOutcome,
};
pub use loan_service_impl::SeaOrmLoanService;
