//! Rule-based fraud screening for new loan applications.
//!
//! Rules are independent and all of them run for every application. The
//! evaluator only reads history; [`flag_loan`] is the write side.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::FraudConfig;
use crate::db::{Store, format_timestamp};
use crate::models::loan::{FraudFlag, LoanApplication};
use crate::models::user::User;

/// Read access to the history the rules depend on.
#[async_trait]
pub trait FraudHistory: Send + Sync {
    /// Applications by `user_id` dated at or after `since`.
    async fn count_recent_loans(&self, user_id: Uuid, since: &str) -> anyhow::Result<u64>;

    async fn count_users_with_email_domain(&self, domain: &str) -> anyhow::Result<u64>;
}

#[async_trait]
impl FraudHistory for Store {
    async fn count_recent_loans(&self, user_id: Uuid, since: &str) -> anyhow::Result<u64> {
        self.count_loans_applied_since(user_id, since).await
    }

    async fn count_users_with_email_domain(&self, domain: &str) -> anyhow::Result<u64> {
        Self::count_users_with_email_domain(self, domain).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FraudRule {
    Velocity,
    Amount,
    EmailDomain,
}

impl FraudRule {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Velocity => "velocity",
            Self::Amount => "amount",
            Self::EmailDomain => "email_domain",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FraudReason {
    pub rule: FraudRule,
    pub message: String,
}

pub struct FraudRuleEvaluator {
    config: FraudConfig,
}

impl FraudRuleEvaluator {
    #[must_use]
    pub const fn new(config: FraudConfig) -> Self {
        Self { config }
    }

    /// Triggered rules in declaration order, empty when the application is clean.
    pub async fn evaluate(
        &self,
        history: &dyn FraudHistory,
        user: &User,
        amount: Decimal,
    ) -> Vec<FraudReason> {
        check_fraud_conditions(history, &self.config, user, amount).await
    }
}

/// Runs every rule. A history read failure disables only the affected rule.
pub async fn check_fraud_conditions(
    history: &dyn FraudHistory,
    config: &FraudConfig,
    user: &User,
    amount: Decimal,
) -> Vec<FraudReason> {
    let mut reasons = Vec::new();

    let since = format_timestamp(Utc::now() - Duration::hours(config.velocity_window_hours));
    match history.count_recent_loans(user.id, &since).await {
        Ok(count) if count >= config.velocity_threshold => {
            warn!(user_id = %user.id, count, "Velocity rule triggered");
            reasons.push(FraudReason {
                rule: FraudRule::Velocity,
                message: format!(
                    "More than {} loans submitted in the last {} hours.",
                    config.velocity_threshold, config.velocity_window_hours
                ),
            });
        }
        Ok(_) => {}
        Err(e) => warn!(user_id = %user.id, error = %e, "Could not read loan history"),
    }

    if amount > Decimal::from(config.amount_threshold) {
        warn!(user_id = %user.id, %amount, "Amount rule triggered");
        reasons.push(FraudReason {
            rule: FraudRule::Amount,
            message: format!(
                "Requested amount exceeds {}.",
                format_currency(config.amount_threshold, &config.currency_symbol)
            ),
        });
    }

    let domain = user.email_domain().to_lowercase();
    match history.count_users_with_email_domain(&domain).await {
        Ok(count) if count > config.domain_user_threshold => {
            warn!(user_id = %user.id, %domain, count, "Email domain rule triggered");
            reasons.push(FraudReason {
                rule: FraudRule::EmailDomain,
                message: format!(
                    "Email domain '{domain}' is used by more than {} users.",
                    config.domain_user_threshold
                ),
            });
        }
        Ok(_) => {}
        Err(e) => warn!(user_id = %user.id, %domain, error = %e, "Could not count domain users"),
    }

    reasons
}

/// Marks the loan flagged and records one fraud flag per reason.
pub async fn flag_loan(
    store: &Store,
    loan: &LoanApplication,
    reasons: &[String],
) -> anyhow::Result<Vec<FraudFlag>> {
    let flags = store.flag_loan(loan.id, reasons).await?;

    for reason in reasons {
        info!(loan_id = %loan.id, %reason, "Fraud flag recorded");
    }
    info!(
        loan_id = %loan.id,
        user_id = %loan.user_id,
        flags = flags.len(),
        "Loan flagged for review"
    );

    Ok(flags)
}

/// `5000000` with `₦` becomes `₦5,000,000`.
#[must_use]
pub fn format_currency(amount: i64, symbol: &str) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0 { "-" } else { "" };
    format!("{sign}{symbol}{grouped}")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeHistory {
        recent_loans: anyhow::Result<u64>,
        domain_users: anyhow::Result<u64>,
    }

    impl FakeHistory {
        fn new(recent_loans: u64, domain_users: u64) -> Self {
            Self {
                recent_loans: Ok(recent_loans),
                domain_users: Ok(domain_users),
            }
        }
    }

    #[async_trait]
    impl FraudHistory for FakeHistory {
        async fn count_recent_loans(&self, _user_id: Uuid, _since: &str) -> anyhow::Result<u64> {
            match &self.recent_loans {
                Ok(n) => Ok(*n),
                Err(e) => Err(anyhow::anyhow!("{e}")),
            }
        }

        async fn count_users_with_email_domain(&self, _domain: &str) -> anyhow::Result<u64> {
            match &self.domain_users {
                Ok(n) => Ok(*n),
                Err(e) => Err(anyhow::anyhow!("{e}")),
            }
        }
    }

    fn applicant() -> User {
        User {
            id: Uuid::new_v4(),
            email: "ada@Example.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Obi".to_string(),
            is_active: true,
            is_verified: true,
            is_staff: false,
            is_superuser: false,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    async fn reasons_for(history: &FakeHistory, amount: Decimal) -> Vec<String> {
        check_fraud_conditions(history, &FraudConfig::default(), &applicant(), amount)
            .await
            .into_iter()
            .map(|r| r.message)
            .collect()
    }

    #[tokio::test]
    async fn test_clean_application() {
        let reasons = reasons_for(&FakeHistory::new(1, 1), Decimal::from(50_000)).await;
        assert!(reasons.is_empty());
    }

    #[tokio::test]
    async fn test_amount_threshold_is_strict() {
        let history = FakeHistory::new(1, 1);

        let at_limit = reasons_for(&history, Decimal::from(5_000_000)).await;
        assert!(at_limit.is_empty());

        let above = reasons_for(&history, Decimal::new(500_000_001, 2)).await;
        assert_eq!(above, vec!["Requested amount exceeds ₦5,000,000."]);
    }

    #[tokio::test]
    async fn test_velocity_counts_the_new_loan() {
        let below = reasons_for(&FakeHistory::new(2, 1), Decimal::from(100)).await;
        assert!(below.is_empty());

        let at = reasons_for(&FakeHistory::new(3, 1), Decimal::from(100)).await;
        assert_eq!(at, vec!["More than 3 loans submitted in the last 24 hours."]);
    }

    #[tokio::test]
    async fn test_domain_rule_and_ordering() {
        let at_limit = reasons_for(&FakeHistory::new(0, 10), Decimal::from(100)).await;
        assert!(at_limit.is_empty());

        let all = reasons_for(&FakeHistory::new(4, 11), Decimal::from(10_000_000)).await;
        assert_eq!(
            all,
            vec![
                "More than 3 loans submitted in the last 24 hours.",
                "Requested amount exceeds ₦5,000,000.",
                "Email domain 'example.com' is used by more than 10 users.",
            ]
        );
    }

    #[tokio::test]
    async fn test_history_failure_skips_only_that_rule() {
        let history = FakeHistory {
            recent_loans: Err(anyhow::anyhow!("database is locked")),
            domain_users: Ok(11),
        };
        let reasons = check_fraud_conditions(
            &history,
            &FraudConfig::default(),
            &applicant(),
            Decimal::from(10),
        )
        .await;

        assert_eq!(reasons.len(), 1);
        assert_eq!(reasons[0].rule, FraudRule::EmailDomain);
    }

    #[tokio::test]
    async fn test_thresholds_come_from_config() {
        let config = FraudConfig {
            amount_threshold: 1_000,
            currency_symbol: "$".to_string(),
            ..FraudConfig::default()
        };
        let evaluator = FraudRuleEvaluator::new(config);
        let reasons = evaluator
            .evaluate(&FakeHistory::new(0, 0), &applicant(), Decimal::from(1_001))
            .await;

        assert_eq!(reasons[0].message, "Requested amount exceeds $1,000.");
        assert_eq!(reasons[0].rule.as_str(), "amount");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(5_000_000, "₦"), "₦5,000,000");
        assert_eq!(format_currency(999, "₦"), "₦999");
        assert_eq!(format_currency(1_000, ""), "1,000");
        assert_eq!(format_currency(0, "$"), "$0");
    }
}
