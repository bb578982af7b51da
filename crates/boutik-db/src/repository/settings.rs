//! # Settings Repository
//!
//! One `store_settings` row per tenant. Until the shop saves its own, reads
//! return `StoreSettings::default_for(tenant)`.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;
use boutik_core::validation::validate_store_settings;
use boutik_core::StoreSettings;

#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool, tenant_id: &str) -> Self {
        SettingsRepository {
            pool,
            tenant_id: tenant_id.to_string(),
        }
    }

    pub async fn get(&self) -> DbResult<StoreSettings> {
        let settings = sqlx::query_as::<_, StoreSettings>(
            r#"
            SELECT tenant_id, store_name, address, phone, email,
                   currency, tax_rate_bps, receipt_footer
            FROM store_settings
            WHERE tenant_id = ?
            "#,
        )
        .bind(&self.tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(settings.unwrap_or_else(|| StoreSettings::default_for(&self.tenant_id)))
    }

    /// Creates or replaces the tenant's settings.
    ///
    /// The `tenant_id` carried by `settings` is ignored; the row always
    /// belongs to this repository's tenant.
    pub async fn save(&self, settings: &StoreSettings) -> DbResult<StoreSettings> {
        validate_store_settings(settings)?;
        debug!(tenant = %self.tenant_id, currency = ?settings.currency, "Saving store settings");

        sqlx::query(
            r#"
            INSERT INTO store_settings (
                tenant_id, store_name, address, phone, email,
                currency, tax_rate_bps, receipt_footer, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (tenant_id) DO UPDATE SET
                store_name = excluded.store_name,
                address = excluded.address,
                phone = excluded.phone,
                email = excluded.email,
                currency = excluded.currency,
                tax_rate_bps = excluded.tax_rate_bps,
                receipt_footer = excluded.receipt_footer,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&self.tenant_id)
        .bind(settings.store_name.trim())
        .bind(&settings.address)
        .bind(&settings.phone)
        .bind(&settings.email)
        .bind(settings.currency)
        .bind(settings.tax_rate_bps)
        .bind(&settings.receipt_footer)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        info!(tenant = %self.tenant_id, "Store settings saved");
        self.get().await
    }
}
