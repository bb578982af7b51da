//! # Subscription Rules
//!
//! Access to the application is gated by the tenant's subscription.
//!
//! ```text
//!   signup ──► trial ──(end passes)──► expired
//!                │                        │
//!                └──── renew(days) ──► active ──(end passes)──► expired
//!                                         │
//!                                      cancel ──► cancelled
//! ```
//!
//! A trial or active subscription whose end date has passed is treated as
//! expired immediately, whether or not the stored status caught up yet.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{Subscription, SubscriptionStatus};

/// Length of the signup trial.
pub const DEFAULT_TRIAL_DAYS: i64 = 14;

const SECONDS_PER_DAY: i64 = 86_400;

impl Subscription {
    /// Status after applying the end date at `now`.
    pub fn effective_status(&self, now: DateTime<Utc>) -> SubscriptionStatus {
        match self.status {
            SubscriptionStatus::Trial | SubscriptionStatus::Active if self.end_date <= now => {
                SubscriptionStatus::Expired
            }
            status => status,
        }
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        matches!(
            self.effective_status(now),
            SubscriptionStatus::Trial | SubscriptionStatus::Active
        )
    }

    /// Whole days left, rounded up, never negative.
    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        let seconds = (self.end_date - now).num_seconds();
        if seconds <= 0 {
            0
        } else {
            (seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY
        }
    }

    /// Gate for every operation behind the paywall.
    pub fn require_active(&self, now: DateTime<Utc>) -> CoreResult<()> {
        if self.is_active_at(now) {
            Ok(())
        } else {
            Err(CoreError::SubscriptionInactive {
                status: self.effective_status(now).as_str().to_string(),
            })
        }
    }

    /// A new trial starting at `now`.
    pub fn trial(tenant_id: &str, now: DateTime<Utc>, days: i64) -> CoreResult<Self> {
        validate_days(days)?;
        Ok(Subscription {
            id: uuid::Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            plan_id: None,
            status: SubscriptionStatus::Trial,
            is_trial: true,
            start_date: now,
            end_date: now + Duration::days(days),
            created_at: now,
            updated_at: now,
        })
    }

    /// Renews for `days` from `now`, onto `plan_id` when given.
    pub fn renew(&mut self, plan_id: Option<String>, now: DateTime<Utc>, days: i64) -> CoreResult<()> {
        validate_days(days)?;
        if plan_id.is_some() {
            self.plan_id = plan_id;
        }
        self.status = SubscriptionStatus::Active;
        self.is_trial = false;
        self.start_date = now;
        self.end_date = now + Duration::days(days);
        self.updated_at = now;
        Ok(())
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) {
        self.status = SubscriptionStatus::Cancelled;
        self.updated_at = now;
    }
}

fn validate_days(days: i64) -> CoreResult<()> {
    if days <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "days".to_string(),
        }
        .into());
    }
    Ok(())
}

/// Subscription state shown in the account banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SubscriptionSummary {
    pub status: SubscriptionStatus,
    pub is_trial: bool,
    pub days_remaining: i64,
    #[ts(as = "String")]
    pub end_date: DateTime<Utc>,
}

impl SubscriptionSummary {
    pub fn of(subscription: &Subscription, now: DateTime<Utc>) -> Self {
        SubscriptionSummary {
            status: subscription.effective_status(now),
            is_trial: subscription.is_trial,
            days_remaining: subscription.days_remaining(now),
            end_date: subscription.end_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trial_is_active() {
        let now = Utc::now();
        let sub = Subscription::trial("t1", now, DEFAULT_TRIAL_DAYS).unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Trial);
        assert!(sub.is_trial);
        assert!(sub.require_active(now).is_ok());
        assert_eq!(sub.days_remaining(now), 14);
    }

    #[test]
    fn test_days_remaining_rounds_up() {
        let now = Utc::now();
        let mut sub = Subscription::trial("t1", now, 1).unwrap();
        sub.end_date = now + Duration::hours(25);
        assert_eq!(sub.days_remaining(now), 2);

        sub.end_date = now + Duration::seconds(1);
        assert_eq!(sub.days_remaining(now), 1);

        sub.end_date = now - Duration::days(3);
        assert_eq!(sub.days_remaining(now), 0);
    }

    #[test]
    fn test_past_end_date_is_expired() {
        let now = Utc::now();
        let sub = Subscription::trial("t1", now - Duration::days(20), 14).unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Trial);
        assert_eq!(sub.effective_status(now), SubscriptionStatus::Expired);
        assert!(matches!(
            sub.require_active(now),
            Err(CoreError::SubscriptionInactive { ref status }) if status == "expired"
        ));
    }

    #[test]
    fn test_renew() {
        let now = Utc::now();
        let mut sub = Subscription::trial("t1", now - Duration::days(20), 14).unwrap();
        sub.renew(Some("plan-monthly".to_string()), now, 30).unwrap();

        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert!(!sub.is_trial);
        assert_eq!(sub.plan_id.as_deref(), Some("plan-monthly"));
        assert_eq!(sub.days_remaining(now), 30);
        assert!(sub.renew(None, now, 0).is_err());
    }

    #[test]
    fn test_cancelled_never_active() {
        let now = Utc::now();
        let mut sub = Subscription::trial("t1", now, 14).unwrap();
        sub.cancel(now);
        assert_eq!(sub.effective_status(now), SubscriptionStatus::Cancelled);
        assert!(sub.require_active(now).is_err());

        let summary = SubscriptionSummary::of(&sub, now);
        assert_eq!(summary.status, SubscriptionStatus::Cancelled);
    }
}
