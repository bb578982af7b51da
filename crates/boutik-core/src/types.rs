//! # Domain Types
//!
//! Core domain types used throughout Boutik POS.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    Payment      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  price          │◄──│  SaleItem       │   │  sale_id (FK)   │       │
//! │  │  cost_price     │   │  (snapshot)     │──►│  amount         │       │
//! │  │  stock_quantity │   │  amount_paid    │   │  method         │       │
//! │  └────────┬────────┘   │  amount_remaining│  └─────────────────┘       │
//! │           │            └────────┬────────┘                              │
//! │           ▼                     ▼                                       │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ StockMovement   │   │    Customer     │   │    Expense      │       │
//! │  │  in / out / sale│   │  current_credit │   │  date, amount   │       │
//! │  │  signed qty     │   │  credit_limit   │   │  category       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Tenancy
//! Every tenant-owned entity carries `tenant_id`. Repositories are built for
//! one tenant and never read or write another tenant's rows.
//!
//! ## Concurrency Versions
//! `Product`, `Customer` and `Sale` carry `sync_version`. Every write bumps
//! it and every read-modify-write compares it, so a stale write fails with
//! `CoreError::ConcurrentModification` instead of silently overwriting.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::{Currency, DEFAULT_MIN_STOCK_LEVEL};

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 1800 bps = 18% (UEMOA VAT).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer settles (part of) a sale.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash; the only method that can yield change.
    Cash,
    MtnMoney,
    MoovMoney,
    OrangeMoney,
    /// Nothing (or a deposit) paid now; the balance goes on the customer's
    /// account.
    Credit,
    /// Card payment on an external terminal.
    Card,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 6] = [
        PaymentMethod::Cash,
        PaymentMethod::MtnMoney,
        PaymentMethod::MoovMoney,
        PaymentMethod::OrangeMoney,
        PaymentMethod::Credit,
        PaymentMethod::Card,
    ];

    /// Stored/serialized form.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::MtnMoney => "mtn_money",
            PaymentMethod::MoovMoney => "moov_money",
            PaymentMethod::OrangeMoney => "orange_money",
            PaymentMethod::Credit => "credit",
            PaymentMethod::Card => "card",
        }
    }

    /// Label printed on invoices and reports.
    pub const fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Espèces",
            PaymentMethod::MtnMoney => "MTN Mobile Money",
            PaymentMethod::MoovMoney => "Moov Money",
            PaymentMethod::OrangeMoney => "Orange Money",
            PaymentMethod::Credit => "Crédit",
            PaymentMethod::Card => "Carte bancaire",
        }
    }

    #[inline]
    pub const fn is_mobile_money(&self) -> bool {
        matches!(
            self,
            PaymentMethod::MtnMoney | PaymentMethod::MoovMoney | PaymentMethod::OrangeMoney
        )
    }
}

// =============================================================================
// Payment Status
// =============================================================================

/// Settlement state of a sale, derived from its balance.
///
/// ```text
///   checkout ──► completed                 (remaining = 0)
///       │
///       ├──────► partial ──┐               (remaining > 0, paid now)
///       │                  ├─ payment ──► completed (remaining = 0)
///       └──────► credit ───┘     │
///                                └──────► partial   (remaining > 0)
/// ```
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Completed,
    /// Accepted by the schema; never produced by checkout or payments.
    Pending,
    Partial,
    Credit,
}

impl PaymentStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Completed => "completed",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Credit => "credit",
        }
    }

    /// Whether a sale in this status contributes to customer credit.
    #[inline]
    pub const fn is_outstanding(&self) -> bool {
        matches!(self, PaymentStatus::Partial | PaymentStatus::Credit)
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Whether a category groups goods or services.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CategoryType {
    #[default]
    Product,
    Service,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    /// `#RRGGBB`.
    pub color: Option<String>,
    pub category_type: CategoryType,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Category form payload (create and update).
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub category_type: CategoryType,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Supplier {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Supplier form payload (create and update).
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSupplier {
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub tenant_id: String,
    pub category_id: Option<String>,
    pub supplier_id: Option<String>,

    /// Display name shown to the cashier and on the invoice.
    pub name: String,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub barcode: Option<String>,

    /// Selling price in minor units.
    pub price: Money,

    /// Purchase cost, used for the cost of goods sold in reports.
    pub cost_price: Option<Money>,

    /// Tax rate in basis points.
    pub tax_rate_bps: u32,

    /// On-hand quantity, never negative.
    pub stock_quantity: i64,

    /// Low-stock threshold; `DEFAULT_MIN_STOCK_LEVEL` when unset.
    pub min_stock_level: Option<i64>,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    pub sync_version: i64,
}

impl Product {
    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }

    /// Effective low-stock threshold.
    #[inline]
    pub fn low_stock_threshold(&self) -> i64 {
        self.min_stock_level.unwrap_or(DEFAULT_MIN_STOCK_LEVEL)
    }

    /// Read-time predicate: `stock_quantity <= threshold`.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.low_stock_threshold()
    }

    /// Whether `quantity` units can leave the shelf.
    #[inline]
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.is_active && quantity > 0 && self.stock_quantity >= quantity
    }
}

/// Product creation payload.
///
/// `stock_quantity` is the opening stock; later changes go through stock
/// movements or checkout.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub category_id: Option<String>,
    pub supplier_id: Option<String>,
    pub price: Money,
    pub cost_price: Option<Money>,
    pub tax_rate_bps: u32,
    pub stock_quantity: i64,
    pub min_stock_level: Option<i64>,
}

/// Product edit payload. Stock is not editable here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductUpdate {
    pub name: String,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub category_id: Option<String>,
    pub supplier_id: Option<String>,
    pub price: Money,
    pub cost_price: Option<Money>,
    pub tax_rate_bps: u32,
    pub min_stock_level: Option<i64>,
}

// =============================================================================
// Customer
// =============================================================================

/// A customer who may buy on credit.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,

    /// Maximum outstanding credit; zero means no limit.
    pub credit_limit: Money,

    /// Σ `amount_remaining` over this customer's partial and credit sales.
    pub current_credit: Money,

    /// Lifetime Σ `total` of this customer's sales.
    pub total_purchases: Money,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    pub sync_version: i64,
}

impl Customer {
    #[inline]
    pub fn has_credit_limit(&self) -> bool {
        self.credit_limit.is_positive()
    }

    /// Headroom under the credit limit, `None` when unlimited.
    pub fn available_credit(&self) -> Option<Money> {
        self.has_credit_limit()
            .then(|| self.credit_limit.saturating_sub_floor(self.current_credit))
    }
}

/// Customer form payload (create and update).
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCustomer {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub credit_limit: Money,
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale.
///
/// Invariant: `amount_paid + amount_remaining == total` and
/// `amount_remaining >= 0`. Only payment application mutates the balance
/// fields after checkout.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub tenant_id: String,
    /// Human-readable number, `SALE-YYYYMMDD-NNNN`, unique per tenant.
    pub sale_number: String,
    pub customer_id: Option<String>,
    pub cashier_id: Option<String>,
    pub subtotal: Money,
    pub tax: Money,
    pub discount: Money,
    pub total: Money,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub amount_paid: Money,
    pub amount_remaining: Money,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    pub sync_version: i64,
}

impl Sale {
    #[inline]
    pub fn is_outstanding(&self) -> bool {
        self.amount_remaining.is_positive()
    }

    /// `amount_paid + amount_remaining == total` and nothing negative.
    pub fn balance_is_consistent(&self) -> bool {
        !self.amount_paid.is_negative()
            && !self.amount_remaining.is_negative()
            && self.amount_paid + self.amount_remaining == self.total
    }
}

/// A line of a sale. Snapshot of the product at checkout time.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    /// Null once the product is deleted.
    pub product_id: Option<String>,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: i64,
    /// `quantity × unit_price`.
    pub subtotal: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A payment applied against an outstanding sale. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Payment {
    pub id: String,
    pub sale_id: String,
    pub amount: Money,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub recorded_by: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Expense
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Expense {
    pub id: String,
    pub tenant_id: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub description: String,
    pub amount: Money,
    pub category: Option<String>,
    /// Reference to an uploaded receipt held by file storage.
    pub receipt_url: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewExpense {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub description: String,
    pub amount: Money,
    pub category: Option<String>,
    pub receipt_url: Option<String>,
}

// =============================================================================
// Stock Movement
// =============================================================================

/// Kind of stock movement.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    /// Restock (positive delta).
    In,
    /// Loss, breakage, return to supplier (negative delta).
    Out,
    /// Checkout decrement (negative delta, references the sale).
    Sale,
}

/// Audit row for a change of on-hand quantity. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockMovement {
    pub id: String,
    pub tenant_id: String,
    pub product_id: Option<String>,
    pub movement_type: MovementType,
    /// Signed delta applied to `stock_quantity`.
    pub quantity: i64,
    /// Sale id for `sale` movements.
    pub reference_id: Option<String>,
    pub notes: Option<String>,
    pub user_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Store Settings
// =============================================================================

/// Per-tenant store identity printed on invoices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StoreSettings {
    pub tenant_id: String,
    pub store_name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub currency: Currency,
    pub tax_rate_bps: u32,
    pub receipt_footer: Option<String>,
}

impl StoreSettings {
    /// Settings used until the tenant saves its own.
    pub fn default_for(tenant_id: &str) -> Self {
        StoreSettings {
            tenant_id: tenant_id.to_string(),
            store_name: "Ma Boutique".to_string(),
            address: None,
            phone: None,
            email: None,
            currency: Currency::default(),
            tax_rate_bps: 0,
            receipt_footer: Some("Merci de votre visite !".to_string()),
        }
    }
}

// =============================================================================
// Subscriptions
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Trial,
    Active,
    Expired,
    Cancelled,
}

impl SubscriptionStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Trial => "trial",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Expired => "expired",
            SubscriptionStatus::Cancelled => "cancelled",
        }
    }
}

/// A tenant's access subscription. One per tenant.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Subscription {
    pub id: String,
    pub tenant_id: String,
    pub plan_id: Option<String>,
    pub status: SubscriptionStatus,
    pub is_trial: bool,
    #[ts(as = "String")]
    pub start_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub end_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A purchasable plan.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SubscriptionPlan {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub duration_days: i64,
    pub features: Vec<String>,
    pub is_active: bool,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: i64, min: Option<i64>) -> Product {
        Product {
            id: "p1".to_string(),
            tenant_id: "t1".to_string(),
            category_id: None,
            supplier_id: None,
            name: "Savon".to_string(),
            description: None,
            sku: None,
            barcode: None,
            price: Money::from_minor(500),
            cost_price: None,
            tax_rate_bps: 0,
            stock_quantity: stock,
            min_stock_level: min,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            sync_version: 0,
        }
    }

    #[test]
    fn test_low_stock_default_threshold() {
        assert!(product(10, None).is_low_stock());
        assert!(!product(11, None).is_low_stock());
        assert!(product(3, Some(3)).is_low_stock());
        assert!(!product(4, Some(3)).is_low_stock());
    }

    #[test]
    fn test_can_sell() {
        let p = product(3, None);
        assert!(p.can_sell(3));
        assert!(!p.can_sell(4));
        assert!(!p.can_sell(0));
        assert!(!product(0, None).can_sell(1));
    }

    #[test]
    fn test_payment_status_outstanding() {
        assert!(PaymentStatus::Credit.is_outstanding());
        assert!(PaymentStatus::Partial.is_outstanding());
        assert!(!PaymentStatus::Completed.is_outstanding());
        assert!(!PaymentStatus::Pending.is_outstanding());
    }

    #[test]
    fn test_payment_method_serialization() {
        let json = serde_json::to_string(&PaymentMethod::MtnMoney).unwrap();
        assert_eq!(json, "\"mtn_money\"");
        for method in PaymentMethod::ALL {
            let json = serde_json::to_string(&method).unwrap();
            assert_eq!(json, format!("\"{}\"", method.as_str()));
        }
        assert!(PaymentMethod::OrangeMoney.is_mobile_money());
        assert!(!PaymentMethod::Card.is_mobile_money());
    }

    #[test]
    fn test_available_credit() {
        let mut customer = Customer {
            id: "c1".to_string(),
            tenant_id: "t1".to_string(),
            name: "Awa".to_string(),
            phone: None,
            email: None,
            address: None,
            credit_limit: Money::zero(),
            current_credit: Money::from_minor(4000),
            total_purchases: Money::zero(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            sync_version: 0,
        };
        assert_eq!(customer.available_credit(), None);

        customer.credit_limit = Money::from_minor(10000);
        assert_eq!(customer.available_credit(), Some(Money::from_minor(6000)));

        customer.current_credit = Money::from_minor(12000);
        assert_eq!(customer.available_credit(), Some(Money::zero()));
    }
}
