//! # Report Repository
//!
//! Read-only queries feeding the report folds in `boutik_core::report`.
//!
//! ## Financial Summary
//! ```text
//! sales          (created_at in range) ──► Σ total           = total_sales
//! sale_items ⋈ products (cost_price)  ──► Σ qty × cost       = total_purchase_cost
//! expenses       (date in range)       ──► Σ amount          = total_expenses
//!
//! profit = total_sales − total_purchase_cost − total_expenses
//! ```
//!
//! Costs use the product's current `cost_price`; deleted products and
//! products without a cost count as zero.

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use crate::repository::customer::CustomerRepository;
use crate::repository::product::ProductRepository;
use crate::repository::sale::SaleRepository;
use crate::repository::settings::SettingsRepository;
use boutik_core::export::{financial_summary_csv, sales_csv};
use boutik_core::report::{CashReport, CostLine, DashboardStats, DateRange, FinancialSummary};
use boutik_core::settlement::CheckoutPolicy;
use boutik_core::{Money, PaymentMethod};

#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool, tenant_id: &str) -> Self {
        ReportRepository {
            pool,
            tenant_id: tenant_id.to_string(),
        }
    }

    pub async fn financial_summary(&self, range: &DateRange) -> DbResult<FinancialSummary> {
        debug!(start = %range.start, end = %range.end, "Computing financial summary");

        let sale_totals: Vec<Money> = sqlx::query_scalar(
            r#"
            SELECT total FROM sales
            WHERE tenant_id = ? AND created_at >= ? AND created_at < ?
            "#,
        )
        .bind(&self.tenant_id)
        .bind(range.start_at())
        .bind(range.end_before())
        .fetch_all(&self.pool)
        .await?;

        let cost_lines = sqlx::query_as::<_, CostLine>(
            r#"
            SELECT si.quantity AS quantity, p.cost_price AS cost_price
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            LEFT JOIN products p ON p.id = si.product_id
            WHERE s.tenant_id = ? AND s.created_at >= ? AND s.created_at < ?
            "#,
        )
        .bind(&self.tenant_id)
        .bind(range.start_at())
        .bind(range.end_before())
        .fetch_all(&self.pool)
        .await?;

        let expenses = self.expense_amounts(range).await?;

        Ok(FinancialSummary::compute(
            *range,
            &sale_totals,
            &cost_lines,
            &expenses,
        ))
    }

    /// End-of-day till summary for one UTC day.
    pub async fn cash_report(&self, date: NaiveDate) -> DbResult<CashReport> {
        let range = DateRange::single_day(date);
        debug!(date = %date, "Computing cash report");

        let sales: Vec<(PaymentMethod, Money)> = sqlx::query_as(
            r#"
            SELECT payment_method, total FROM sales
            WHERE tenant_id = ? AND created_at >= ? AND created_at < ?
            "#,
        )
        .bind(&self.tenant_id)
        .bind(range.start_at())
        .bind(range.end_before())
        .fetch_all(&self.pool)
        .await?;

        let expenses = self.expense_amounts(&range).await?;

        Ok(CashReport::compute(date, &sales, &expenses))
    }

    async fn expense_amounts(&self, range: &DateRange) -> DbResult<Vec<Money>> {
        let amounts: Vec<Money> = sqlx::query_scalar(
            "SELECT amount FROM expenses WHERE tenant_id = ? AND date >= ? AND date <= ?",
        )
        .bind(&self.tenant_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(amounts)
    }

    /// Headline numbers for the home screen.
    pub async fn dashboard(&self) -> DbResult<DashboardStats> {
        let today = DateRange::single_day(Utc::now().date_naive());

        let (today_sales, today_sales_count): (Money, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(total), 0), COUNT(*) FROM sales
            WHERE tenant_id = ? AND created_at >= ? AND created_at < ?
            "#,
        )
        .bind(&self.tenant_id)
        .bind(today.start_at())
        .bind(today.end_before())
        .fetch_one(&self.pool)
        .await?;

        let products = ProductRepository::new(self.pool.clone(), &self.tenant_id);
        let customers = CustomerRepository::new(self.pool.clone(), &self.tenant_id);

        Ok(DashboardStats {
            today_sales,
            today_sales_count,
            product_count: products.count().await?,
            customer_count: customers.count().await?,
            low_stock_count: products.low_stock().await?.len() as i64,
        })
    }

    // =========================================================================
    // Exports
    // =========================================================================

    /// Sales of `range` as CSV, amounts in the store's currency.
    pub async fn sales_csv(&self, range: &DateRange) -> DbResult<String> {
        let settings = SettingsRepository::new(self.pool.clone(), &self.tenant_id)
            .get()
            .await?;
        // Listing only; the checkout policy plays no part.
        let sales = SaleRepository::new(self.pool.clone(), &self.tenant_id, CheckoutPolicy::default())
            .list_in_range(range)
            .await?;

        Ok(sales_csv(&sales, settings.currency)?)
    }

    pub async fn financial_summary_csv(&self, range: &DateRange) -> DbResult<String> {
        let settings = SettingsRepository::new(self.pool.clone(), &self.tenant_id)
            .get()
            .await?;
        let summary = self.financial_summary(range).await?;

        Ok(financial_summary_csv(&summary, settings.currency)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::*;
    use boutik_core::settlement::{CheckoutLine, CheckoutRequest};
    use boutik_core::{NewExpense, NewProduct, Product};

    async fn product_with_cost(db: &crate::Database, price: i64, cost: Option<i64>) -> Product {
        db.products(TENANT)
            .insert(&NewProduct {
                name: "Tissu bazin".to_string(),
                price: Money::from_minor(price),
                cost_price: cost.map(Money::from_minor),
                stock_quantity: 20,
                min_stock_level: Some(2),
                ..NewProduct::default()
            })
            .await
            .unwrap()
    }

    async fn sell(db: &crate::Database, product: &Product, quantity: i64, method: PaymentMethod) {
        let request = CheckoutRequest::new(
            vec![CheckoutLine {
                product_id: product.id.clone(),
                unit_price: product.price,
                quantity,
            }],
            method,
        );
        db.sales(TENANT).record_sale(&request).await.unwrap();
    }

    async fn spend(db: &crate::Database, amount: i64) {
        db.expenses(TENANT)
            .insert(&NewExpense {
                date: Utc::now().date_naive(),
                description: "Transport".to_string(),
                amount: Money::from_minor(amount),
                category: None,
                receipt_url: None,
            })
            .await
            .unwrap();
    }

    fn today() -> DateRange {
        DateRange::single_day(Utc::now().date_naive())
    }

    #[tokio::test]
    async fn test_financial_summary_profit() {
        let db = test_db().await;
        let fabric = product_with_cost(&db, 2500, Some(500)).await;
        sell(&db, &fabric, 2, PaymentMethod::Cash).await;
        spend(&db, 1000).await;

        let summary = db.reports(TENANT).financial_summary(&today()).await.unwrap();
        assert_eq!(summary.total_sales, Money::from_minor(5000));
        assert_eq!(summary.total_purchase_cost, Money::from_minor(1000));
        assert_eq!(summary.total_expenses, Money::from_minor(1000));
        assert_eq!(summary.profit, Money::from_minor(3000));
        assert_eq!(summary.sales_count, 1);
        assert_eq!(summary.expenses_count, 1);
    }

    #[tokio::test]
    async fn test_missing_cost_counts_as_zero() {
        let db = test_db().await;
        let fabric = product_with_cost(&db, 2500, None).await;
        sell(&db, &fabric, 1, PaymentMethod::Cash).await;

        let summary = db.reports(TENANT).financial_summary(&today()).await.unwrap();
        assert_eq!(summary.total_purchase_cost, Money::zero());
        assert_eq!(summary.profit, Money::from_minor(2500));
    }

    #[tokio::test]
    async fn test_summary_excludes_other_days_and_tenants() {
        let db = test_db().await;
        let fabric = product_with_cost(&db, 2500, Some(500)).await;
        sell(&db, &fabric, 1, PaymentMethod::Cash).await;

        let yesterday = Utc::now().date_naive().pred_opt().unwrap();
        let summary = db
            .reports(TENANT)
            .financial_summary(&DateRange::single_day(yesterday))
            .await
            .unwrap();
        assert_eq!(summary.total_sales, Money::zero());

        let theirs = db.reports(OTHER_TENANT).financial_summary(&today()).await.unwrap();
        assert_eq!(theirs.sales_count, 0);
    }

    #[tokio::test]
    async fn test_cash_report_by_method() {
        let db = test_db().await;
        let fabric = product_with_cost(&db, 2000, None).await;
        sell(&db, &fabric, 1, PaymentMethod::Cash).await;
        sell(&db, &fabric, 2, PaymentMethod::MtnMoney).await;
        sell(&db, &fabric, 1, PaymentMethod::Cash).await;
        spend(&db, 1500).await;

        let report = db
            .reports(TENANT)
            .cash_report(Utc::now().date_naive())
            .await
            .unwrap();
        assert_eq!(report.transaction_count, 3);
        assert_eq!(report.total_sales, Money::from_minor(8000));
        assert_eq!(report.total_for(PaymentMethod::Cash), Money::from_minor(4000));
        assert_eq!(report.total_for(PaymentMethod::MtnMoney), Money::from_minor(4000));
        assert_eq!(report.net_cash, Money::from_minor(6500));
    }

    #[tokio::test]
    async fn test_dashboard() {
        let db = test_db().await;
        let fabric = product_with_cost(&db, 1000, None).await;
        seed_product(&db, "Allumettes", 50, 1).await;
        seed_customer(&db, "Awa", 0).await;
        sell(&db, &fabric, 3, PaymentMethod::Cash).await;

        let stats = db.reports(TENANT).dashboard().await.unwrap();
        assert_eq!(stats.today_sales, Money::from_minor(3000));
        assert_eq!(stats.today_sales_count, 1);
        assert_eq!(stats.product_count, 2);
        assert_eq!(stats.customer_count, 1);
        assert_eq!(stats.low_stock_count, 1);
    }

    #[tokio::test]
    async fn test_csv_exports() {
        let db = test_db().await;
        let fabric = product_with_cost(&db, 2500, Some(500)).await;
        sell(&db, &fabric, 2, PaymentMethod::Cash).await;

        let reports = db.reports(TENANT);
        let sales = reports.sales_csv(&today()).await.unwrap();
        assert_eq!(sales.lines().count(), 2);
        assert!(sales.contains("SALE-"));

        let summary = reports.financial_summary_csv(&today()).await.unwrap();
        assert!(summary.contains("5000"));
    }
}
