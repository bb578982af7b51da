//! # Reports
//!
//! Period aggregations over sales and expenses. The repository selects the
//! rows; these folds turn them into totals.
//!
//! ## Financial Summary
//! ```text
//! sales in range ───────► total_sales          = Σ sale.total
//! their sale_items ─────► total_purchase_cost  = Σ quantity × cost_price
//!                                                (missing cost or deleted
//!                                                 product counts as 0)
//! expenses in range ────► total_expenses       = Σ expense.amount
//!
//! profit = total_sales − total_purchase_cost − total_expenses
//! ```
//!
//! ## Date Ranges
//! Ranges are inclusive calendar days in UTC. Timestamps are compared as
//! `[start 00:00:00, day after end 00:00:00)`.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::PaymentMethod;

// =============================================================================
// Date Range
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DateRange {
    #[ts(as = "String")]
    pub start: NaiveDate,
    #[ts(as = "String")]
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> CoreResult<Self> {
        if start > end {
            return Err(CoreError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(DateRange { start, end })
    }

    pub fn single_day(date: NaiveDate) -> Self {
        DateRange {
            start: date,
            end: date,
        }
    }

    /// First instant of the range.
    pub fn start_at(&self) -> DateTime<Utc> {
        self.start.and_time(chrono::NaiveTime::MIN).and_utc()
    }

    /// First instant after the range.
    pub fn end_before(&self) -> DateTime<Utc> {
        self.end
            .checked_add_days(Days::new(1))
            .unwrap_or(NaiveDate::MAX)
            .and_time(chrono::NaiveTime::MIN)
            .and_utc()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

// =============================================================================
// Financial Summary
// =============================================================================

/// Quantity sold of one sale item and the current cost of its product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CostLine {
    pub quantity: i64,
    pub cost_price: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FinancialSummary {
    pub range: DateRange,
    pub total_sales: Money,
    pub total_purchase_cost: Money,
    pub total_expenses: Money,
    pub profit: Money,
    pub sales_count: i64,
    pub expenses_count: i64,
}

impl FinancialSummary {
    pub fn compute(
        range: DateRange,
        sale_totals: &[Money],
        cost_lines: &[CostLine],
        expenses: &[Money],
    ) -> Self {
        let total_sales: Money = sale_totals.iter().sum();
        let total_purchase_cost: Money = cost_lines
            .iter()
            .map(|l| l.cost_price.unwrap_or_default() * l.quantity)
            .sum();
        let total_expenses: Money = expenses.iter().sum();

        FinancialSummary {
            range,
            total_sales,
            total_purchase_cost,
            total_expenses,
            profit: total_sales - total_purchase_cost - total_expenses,
            sales_count: sale_totals.len() as i64,
            expenses_count: expenses.len() as i64,
        }
    }
}

// =============================================================================
// Daily Cash Report
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MethodTotal {
    pub method: PaymentMethod,
    pub total: Money,
    pub count: i64,
}

/// End-of-day till summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CashReport {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub total_sales: Money,
    /// One entry per method used that day, in `PaymentMethod` order.
    pub by_method: Vec<MethodTotal>,
    pub total_expenses: Money,
    pub net_cash: Money,
    pub transaction_count: i64,
}

impl CashReport {
    /// `sales` holds `(method, total)` for every sale of the day.
    pub fn compute(date: NaiveDate, sales: &[(PaymentMethod, Money)], expenses: &[Money]) -> Self {
        let mut by_method: Vec<MethodTotal> = Vec::new();
        for (method, total) in sales {
            match by_method.iter_mut().find(|m| m.method == *method) {
                Some(entry) => {
                    entry.total += *total;
                    entry.count += 1;
                }
                None => by_method.push(MethodTotal {
                    method: *method,
                    total: *total,
                    count: 1,
                }),
            }
        }
        by_method.sort_by_key(|m| m.method);

        let total_sales: Money = sales.iter().map(|(_, t)| *t).sum();
        let total_expenses: Money = expenses.iter().sum();

        CashReport {
            date,
            total_sales,
            by_method,
            total_expenses,
            net_cash: total_sales - total_expenses,
            transaction_count: sales.len() as i64,
        }
    }

    pub fn total_for(&self, method: PaymentMethod) -> Money {
        self.by_method
            .iter()
            .find(|m| m.method == method)
            .map(|m| m.total)
            .unwrap_or_default()
    }
}

// =============================================================================
// Dashboard
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardStats {
    pub today_sales: Money,
    pub today_sales_count: i64,
    pub product_count: i64,
    pub customer_count: i64,
    pub low_stock_count: i64,
}
