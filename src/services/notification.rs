//! Alerts sent to superusers when a loan is flagged.

use async_trait::async_trait;
use std::fmt::Write as _;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::NotificationConfig;
use crate::db::Store;
use crate::models::loan::LoanApplication;
use crate::models::user::User;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> anyhow::Result<()>;
}

/// Writes outgoing mail to the log instead of delivering it.
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> anyhow::Result<()> {
        info!(
            from = %message.from,
            to = %message.to.join(", "),
            subject = %message.subject,
            body = %message.body,
            "Email sent"
        );
        Ok(())
    }
}

#[derive(Clone)]
pub struct FlaggedLoanNotifier {
    store: Store,
    mailer: Arc<dyn Mailer>,
    config: NotificationConfig,
}

impl FlaggedLoanNotifier {
    #[must_use]
    pub fn new(store: Store, mailer: Arc<dyn Mailer>, config: NotificationConfig) -> Self {
        Self {
            store,
            mailer,
            config,
        }
    }

    /// Sends the alert on a background task. Failures are logged only.
    pub fn notify(
        &self,
        loan: LoanApplication,
        applicant: User,
        reasons: Vec<String>,
    ) -> JoinHandle<()> {
        let notifier = self.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.dispatch(&loan, &applicant, &reasons).await {
                error!(loan_id = %loan.id, error = %e, "Failed to send flagged loan notification");
            }
        })
    }

    /// Returns how many recipients the alert went to.
    pub async fn dispatch(
        &self,
        loan: &LoanApplication,
        applicant: &User,
        reasons: &[String],
    ) -> anyhow::Result<usize> {
        if !self.config.enabled {
            debug!(loan_id = %loan.id, "Notifications disabled, skipping");
            return Ok(0);
        }

        let recipients = self.store.superuser_emails().await?;
        if recipients.is_empty() {
            debug!(loan_id = %loan.id, "No superusers to notify");
            return Ok(0);
        }

        let message = build_message(&self.config.from_address, recipients, loan, applicant, reasons);
        let count = message.to.len();
        self.mailer.send(&message).await?;

        info!(loan_id = %loan.id, recipients = count, "Flagged loan notification sent");
        Ok(count)
    }
}

#[must_use]
pub fn build_message(
    from: &str,
    to: Vec<String>,
    loan: &LoanApplication,
    applicant: &User,
    reasons: &[String],
) -> EmailMessage {
    let mut body = String::from("A loan application has been flagged for review.\n\n");
    let _ = writeln!(body, "Applicant: {} <{}>", applicant.full_name(), applicant.email);
    let _ = writeln!(body, "Loan: #{}", loan.id);
    let _ = writeln!(body, "Amount requested: {}", loan.amount_requested);
    let _ = writeln!(body, "Purpose: {}", loan.purpose);
    body.push_str("\nReasons:\n");
    for reason in reasons {
        let _ = writeln!(body, "- {reason}");
    }

    EmailMessage {
        from: from.to_string(),
        to,
        subject: format!("Loan #{} flagged for fraud", loan.id),
        body,
    }
}
