//! # Subscription Repositories
//!
//! The tenant's access subscription and the catalog of plans.
//!
//! ```text
//! start_trial()  ──► trial (DEFAULT_TRIAL_DAYS)
//! renew(plan)    ──► active for plan.duration_days (or an explicit count)
//! cancel()       ──► cancelled
//! refresh()      ──► stores `expired` once the end date has passed
//! ```
//!
//! Lifecycle rules live on `boutik_core::Subscription`; this module only
//! loads and stores. Plans are global, not per tenant.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use boutik_core::subscription::{SubscriptionSummary, DEFAULT_TRIAL_DAYS};
use boutik_core::validation::{validate_non_negative, validate_optional_text, validate_required_text};
use boutik_core::{CoreError, Money, Subscription, SubscriptionPlan, ValidationError};

const SUBSCRIPTION_COLUMNS: &str = r#"
    id, tenant_id, plan_id, status, is_trial, start_date, end_date, created_at, updated_at
"#;

// =============================================================================
// Subscriptions
// =============================================================================

#[derive(Debug, Clone)]
pub struct SubscriptionRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl SubscriptionRepository {
    pub fn new(pool: SqlitePool, tenant_id: &str) -> Self {
        SubscriptionRepository {
            pool,
            tenant_id: tenant_id.to_string(),
        }
    }

    /// The stored row, as last written.
    pub async fn get(&self) -> DbResult<Option<Subscription>> {
        let sql = format!(
            "SELECT {} FROM subscriptions WHERE tenant_id = ?",
            SUBSCRIPTION_COLUMNS
        );
        let subscription = sqlx::query_as::<_, Subscription>(&sql)
            .bind(&self.tenant_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(subscription)
    }

    /// Starts the signup trial. A tenant gets one subscription row, so a
    /// second call fails with `UniqueViolation`.
    pub async fn start_trial(&self, days: Option<i64>) -> DbResult<Subscription> {
        let days = days.unwrap_or(DEFAULT_TRIAL_DAYS);
        let subscription = Subscription::trial(&self.tenant_id, Utc::now(), days)?;

        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                id, tenant_id, plan_id, status, is_trial,
                start_date, end_date, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&subscription.id)
        .bind(&subscription.tenant_id)
        .bind(&subscription.plan_id)
        .bind(subscription.status)
        .bind(subscription.is_trial)
        .bind(subscription.start_date)
        .bind(subscription.end_date)
        .bind(subscription.created_at)
        .bind(subscription.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("subscription", &self.tenant_id),
            other => other,
        })?;

        info!(tenant = %self.tenant_id, days, "Trial started");
        Ok(subscription)
    }

    /// Loads the subscription and stores `expired` if its end date passed.
    pub async fn refresh(&self) -> DbResult<Option<Subscription>> {
        let Some(mut subscription) = self.get().await? else {
            return Ok(None);
        };

        let now = Utc::now();
        let effective = subscription.effective_status(now);
        if effective != subscription.status {
            debug!(
                tenant = %self.tenant_id,
                from = subscription.status.as_str(),
                to = effective.as_str(),
                "Subscription lapsed"
            );
            subscription.status = effective;
            subscription.updated_at = now;
            self.store(&subscription).await?;
        }

        Ok(Some(subscription))
    }

    /// Renews onto `plan_id` (or the current plan) for `days`, defaulting
    /// to the plan's duration. Creates the row when the tenant has none.
    pub async fn renew(&self, plan_id: Option<&str>, days: Option<i64>) -> DbResult<Subscription> {
        let now = Utc::now();
        let existing = self.get().await?;

        let plan_id = plan_id
            .map(str::to_string)
            .or_else(|| existing.as_ref().and_then(|s| s.plan_id.clone()));
        let plan = match &plan_id {
            Some(id) => Some(
                PlanRepository::new(self.pool.clone())
                    .get(id)
                    .await?
                    .ok_or_else(|| DbError::not_found("SubscriptionPlan", id))?,
            ),
            None => None,
        };

        let days = days
            .or_else(|| plan.as_ref().map(|p| p.duration_days))
            .ok_or_else(|| ValidationError::Required {
                field: "days".to_string(),
            })?;

        let mut subscription = match existing {
            Some(subscription) => subscription,
            None => Subscription::trial(&self.tenant_id, now, days)?,
        };
        subscription.renew(plan_id, now, days)?;
        self.store(&subscription).await?;

        info!(
            tenant = %self.tenant_id,
            plan = ?subscription.plan_id,
            days,
            "Subscription renewed"
        );
        Ok(subscription)
    }

    pub async fn cancel(&self) -> DbResult<Subscription> {
        let mut subscription = self
            .get()
            .await?
            .ok_or_else(|| DbError::not_found("Subscription", &self.tenant_id))?;

        subscription.cancel(Utc::now());
        self.store(&subscription).await?;

        info!(tenant = %self.tenant_id, "Subscription cancelled");
        Ok(subscription)
    }

    /// Gate for paid features: fails unless the tenant has a live trial or
    /// active subscription.
    pub async fn require_active(&self) -> DbResult<()> {
        let result = match self.get().await? {
            Some(subscription) => subscription.require_active(Utc::now()).map_err(DbError::from),
            None => Err(DbError::Core(CoreError::SubscriptionInactive {
                status: "none".to_string(),
            })),
        };
        if let Err(err) = &result {
            crate::repository::log_rejection("require_active", err);
        }
        result
    }

    pub async fn summary(&self) -> DbResult<Option<SubscriptionSummary>> {
        let now = Utc::now();
        Ok(self
            .get()
            .await?
            .map(|subscription| SubscriptionSummary::of(&subscription, now)))
    }

    async fn store(&self, subscription: &Subscription) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                id, tenant_id, plan_id, status, is_trial,
                start_date, end_date, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (tenant_id) DO UPDATE SET
                plan_id = excluded.plan_id,
                status = excluded.status,
                is_trial = excluded.is_trial,
                start_date = excluded.start_date,
                end_date = excluded.end_date,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&subscription.id)
        .bind(&self.tenant_id)
        .bind(&subscription.plan_id)
        .bind(subscription.status)
        .bind(subscription.is_trial)
        .bind(subscription.start_date)
        .bind(subscription.end_date)
        .bind(subscription.created_at)
        .bind(subscription.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Plans
// =============================================================================

/// Row shape of `subscription_plans`; `features` is a JSON array.
#[derive(sqlx::FromRow)]
struct PlanRow {
    id: String,
    name: String,
    description: Option<String>,
    price: Money,
    duration_days: i64,
    features: String,
    is_active: bool,
}

impl TryFrom<PlanRow> for SubscriptionPlan {
    type Error = DbError;

    fn try_from(row: PlanRow) -> Result<Self, Self::Error> {
        let features: Vec<String> =
            serde_json::from_str(&row.features).map_err(|e| DbError::Decode {
                column: "features".to_string(),
                message: e.to_string(),
            })?;

        Ok(SubscriptionPlan {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            duration_days: row.duration_days,
            features,
            is_active: row.is_active,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PlanRepository {
    pool: SqlitePool,
}

impl PlanRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PlanRepository { pool }
    }

    /// Creates or replaces a plan by id.
    pub async fn upsert(&self, plan: &SubscriptionPlan) -> DbResult<()> {
        validate_required_text("name", &plan.name, 100)?;
        validate_optional_text("description", plan.description.as_deref(), 500)?;
        validate_non_negative("price", plan.price)?;
        if plan.duration_days <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "duration_days".to_string(),
            }
            .into());
        }

        let features = serde_json::to_string(&plan.features)
            .map_err(|e| DbError::Internal(e.to_string()))?;
        debug!(id = %plan.id, name = %plan.name, "Saving plan");

        sqlx::query(
            r#"
            INSERT INTO subscription_plans (
                id, name, description, price, duration_days, features, is_active
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                price = excluded.price,
                duration_days = excluded.duration_days,
                features = excluded.features,
                is_active = excluded.is_active
            "#,
        )
        .bind(&plan.id)
        .bind(plan.name.trim())
        .bind(&plan.description)
        .bind(plan.price)
        .bind(plan.duration_days)
        .bind(features)
        .bind(plan.is_active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<SubscriptionPlan>> {
        let row = sqlx::query_as::<_, PlanRow>(
            r#"
            SELECT id, name, description, price, duration_days, features, is_active
            FROM subscription_plans
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(SubscriptionPlan::try_from).transpose()
    }

    /// Plans by price, cheapest first.
    pub async fn list(&self, active_only: bool) -> DbResult<Vec<SubscriptionPlan>> {
        let rows = sqlx::query_as::<_, PlanRow>(
            r#"
            SELECT id, name, description, price, duration_days, features, is_active
            FROM subscription_plans
            WHERE ? = 0 OR is_active = 1
            ORDER BY price, name
            "#,
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SubscriptionPlan::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::*;
    use boutik_core::SubscriptionStatus;
    use chrono::Duration;

    fn plan(id: &str, price: i64, days: i64, active: bool) -> SubscriptionPlan {
        SubscriptionPlan {
            id: id.to_string(),
            name: format!("Plan {}", id),
            description: None,
            price: Money::from_minor(price),
            duration_days: days,
            features: vec!["pos".to_string(), "reports".to_string()],
            is_active: active,
        }
    }

    #[tokio::test]
    async fn test_trial_then_renew_on_plan() {
        let db = test_db().await;
        db.plans().upsert(&plan("monthly", 5000, 30, true)).await.unwrap();
        let repo = db.subscriptions(TENANT);

        let trial = repo.start_trial(None).await.unwrap();
        assert_eq!(trial.status, SubscriptionStatus::Trial);
        assert!(repo.require_active().await.is_ok());

        let summary = repo.summary().await.unwrap().unwrap();
        assert!(summary.is_trial);
        assert_eq!(summary.days_remaining, DEFAULT_TRIAL_DAYS);

        let renewed = repo.renew(Some("monthly"), None).await.unwrap();
        assert_eq!(renewed.status, SubscriptionStatus::Active);
        assert!(!renewed.is_trial);
        assert_eq!(renewed.plan_id.as_deref(), Some("monthly"));
        assert_eq!(renewed.days_remaining(Utc::now()), 30);

        // Same row, renewed in place
        let stored = repo.get().await.unwrap().unwrap();
        assert_eq!(stored.id, trial.id);
    }

    #[tokio::test]
    async fn test_second_trial_rejected() {
        let db = test_db().await;
        let repo = db.subscriptions(TENANT);
        repo.start_trial(None).await.unwrap();
        assert!(matches!(
            repo.start_trial(None).await,
            Err(DbError::UniqueViolation { .. })
        ));
    }

    #[tokio::test]
    async fn test_no_subscription_is_inactive() {
        let db = test_db().await;
        let result = db.subscriptions(TENANT).require_active().await;
        assert!(matches!(
            result,
            Err(DbError::Core(CoreError::SubscriptionInactive { .. }))
        ));
    }

    #[tokio::test]
    async fn test_refresh_stores_expiry() {
        let db = test_db().await;
        let repo = db.subscriptions(TENANT);
        repo.start_trial(Some(1)).await.unwrap();

        sqlx::query("UPDATE subscriptions SET end_date = ? WHERE tenant_id = ?")
            .bind(Utc::now() - Duration::hours(1))
            .bind(TENANT)
            .execute(db.pool())
            .await
            .unwrap();

        let refreshed = repo.refresh().await.unwrap().unwrap();
        assert_eq!(refreshed.status, SubscriptionStatus::Expired);
        assert_eq!(
            repo.get().await.unwrap().unwrap().status,
            SubscriptionStatus::Expired
        );
        assert!(repo.require_active().await.is_err());

        // Renewal with an explicit length revives it
        let renewed = repo.renew(None, Some(7)).await.unwrap();
        assert_eq!(renewed.status, SubscriptionStatus::Active);
    }

    #[tokio::test]
    async fn test_renew_needs_a_length() {
        let db = test_db().await;
        let result = db.subscriptions(TENANT).renew(None, None).await;
        assert!(matches!(result, Err(DbError::Core(CoreError::Validation(_)))));

        let unknown = db.subscriptions(TENANT).renew(Some("gold"), None).await;
        assert!(matches!(unknown, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_cancel() {
        let db = test_db().await;
        let repo = db.subscriptions(TENANT);
        assert!(matches!(repo.cancel().await, Err(DbError::NotFound { .. })));

        repo.start_trial(None).await.unwrap();
        let cancelled = repo.cancel().await.unwrap();
        assert_eq!(cancelled.status, SubscriptionStatus::Cancelled);
        assert!(repo.require_active().await.is_err());
        assert!(db.subscriptions(OTHER_TENANT).get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_plan_catalog() {
        let db = test_db().await;
        let plans = db.plans();
        plans.upsert(&plan("yearly", 50_000, 365, true)).await.unwrap();
        plans.upsert(&plan("monthly", 5_000, 30, true)).await.unwrap();
        plans.upsert(&plan("legacy", 3_000, 30, false)).await.unwrap();

        let active = plans.list(true).await.unwrap();
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].id, "monthly");
        assert_eq!(active[0].features, vec!["pos", "reports"]);
        assert_eq!(plans.list(false).await.unwrap().len(), 3);

        let mut cheaper = plan("monthly", 4_500, 30, true);
        cheaper.features.clear();
        plans.upsert(&cheaper).await.unwrap();
        let stored = plans.get("monthly").await.unwrap().unwrap();
        assert_eq!(stored.price, Money::from_minor(4_500));
        assert!(stored.features.is_empty());

        assert!(plans.upsert(&plan("broken", 100, 0, true)).await.is_err());
    }
}
