//! # Settlement
//!
//! The money rules of checkout and of paying down a balance. Everything here
//! is pure; `boutik-db` runs these computations inside its transactions and
//! writes their results.
//!
//! ## Checkout
//! ```text
//! CheckoutRequest ──validate()──► merged lines
//!        │
//!        ▼
//! SaleTotals::compute()      subtotal = Σ unit_price × quantity
//!        │                   total    = subtotal − discount + tax
//!        ▼
//! Settlement::settle()       amount_paid, amount_remaining, change_due,
//!        │                   payment_status
//!        ▼
//! check_credit_limit()       (only with CheckoutPolicy::enforce_credit_limit)
//! ```
//!
//! ## Tender Rules
//! ```text
//! ┌──────────────┬───────────────────┬──────────────────────────────────────┐
//! │ Method       │ Default tendered  │ Tendered above total                 │
//! ├──────────────┼───────────────────┼──────────────────────────────────────┤
//! │ cash         │ total             │ change_due = tendered − total        │
//! │ mobile money │ total             │ rejected                             │
//! │ card         │ total             │ rejected                             │
//! │ credit       │ 0                 │ rejected                             │
//! └──────────────┴───────────────────┴──────────────────────────────────────┘
//! ```
//!
//! `amount_paid = min(tendered, total)` so `amount_remaining` is never
//! negative, and `amount_paid + amount_remaining == total` by construction.
//!
//! ## Status
//! - remaining = 0 → `completed`
//! - remaining > 0, method credit → `credit`
//! - remaining > 0, other method → `partial`
//!
//! Any remaining balance needs a customer to carry it.
//!
//! ## Payment Application
//! `0 < amount <= amount_remaining`; reaching zero completes the sale,
//! anything short of it leaves the sale `partial`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Customer, PaymentMethod, PaymentStatus, Sale, TaxRate};
use crate::validation::{
    validate_non_negative, validate_optional_text, validate_quantity, validate_tax_rate_bps,
    validate_uuid,
};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Requests
// =============================================================================

/// One line of a checkout: which product, at which frozen price, how many.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutLine {
    pub product_id: String,
    pub unit_price: Money,
    pub quantity: i64,
}

/// Everything needed to record a sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutRequest {
    pub lines: Vec<CheckoutLine>,
    pub payment_method: PaymentMethod,
    /// Amount handed over now; defaults per method when absent.
    pub amount_tendered: Option<Money>,
    pub customer_id: Option<String>,
    /// Flat discount on the subtotal.
    #[serde(default)]
    pub discount: Money,
    /// Tax applied to `subtotal − discount`.
    #[serde(default)]
    pub tax_rate_bps: u32,
    pub notes: Option<String>,
    pub cashier_id: Option<String>,
}

impl CheckoutRequest {
    /// A request with no discount, no tax and default tender.
    pub fn new(lines: Vec<CheckoutLine>, payment_method: PaymentMethod) -> Self {
        CheckoutRequest {
            lines,
            payment_method,
            amount_tendered: None,
            customer_id: None,
            discount: Money::zero(),
            tax_rate_bps: 0,
            notes: None,
            cashier_id: None,
        }
    }

    pub fn with_customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn with_tendered(mut self, amount: Money) -> Self {
        self.amount_tendered = Some(amount);
        self
    }

    /// Validates the request and returns its lines, merging lines that
    /// share both product and unit price. The same product at two prices
    /// stays on two lines.
    ///
    /// Nothing here touches stock; the repository checks availability under
    /// its transaction.
    pub fn validated_lines(&self) -> CoreResult<Vec<CheckoutLine>> {
        if self.lines.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        let mut merged: Vec<CheckoutLine> = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            validate_uuid("product_id", &line.product_id)?;
            validate_non_negative("unit_price", line.unit_price)?;
            if line.quantity <= 0 {
                return Err(ValidationError::MustBePositive {
                    field: "quantity".to_string(),
                }
                .into());
            }

            match merged
                .iter_mut()
                .find(|l| l.product_id == line.product_id && l.unit_price == line.unit_price)
            {
                Some(existing) => {
                    existing.quantity = existing
                        .quantity
                        .checked_add(line.quantity)
                        .ok_or(CoreError::QuantityTooLarge {
                            requested: i64::MAX,
                            max: MAX_ITEM_QUANTITY,
                        })?;
                }
                None => merged.push(line.clone()),
            }
        }

        if merged.len() > MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }
        for (_, quantity) in quantities_by_product(&merged)? {
            validate_quantity(quantity)?;
        }

        if let Some(tendered) = self.amount_tendered {
            validate_non_negative("amount_tendered", tendered)?;
        }
        if let Some(customer_id) = &self.customer_id {
            validate_uuid("customer_id", customer_id)?;
        }
        validate_non_negative("discount", self.discount)?;
        validate_tax_rate_bps(self.tax_rate_bps)?;
        validate_optional_text("notes", self.notes.as_deref(), 500)?;

        Ok(merged)
    }
}

/// Total quantity asked for each product across `lines`, in first-seen
/// order. Stock checks run on these totals, not on single lines.
pub fn quantities_by_product(lines: &[CheckoutLine]) -> CoreResult<Vec<(&str, i64)>> {
    let mut totals: Vec<(&str, i64)> = Vec::with_capacity(lines.len());
    for line in lines {
        match totals.iter_mut().find(|(id, _)| *id == line.product_id) {
            Some((_, quantity)) => {
                *quantity = quantity.checked_add(line.quantity).ok_or(
                    CoreError::QuantityTooLarge {
                        requested: i64::MAX,
                        max: MAX_ITEM_QUANTITY,
                    },
                )?;
            }
            None => totals.push((line.product_id.as_str(), line.quantity)),
        }
    }
    Ok(totals)
}

/// A payment against an outstanding sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentRequest {
    pub sale_id: String,
    pub amount: Money,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub recorded_by: Option<String>,
}

impl PaymentRequest {
    pub fn new(sale_id: impl Into<String>, amount: Money, payment_method: PaymentMethod) -> Self {
        PaymentRequest {
            sale_id: sale_id.into(),
            amount,
            payment_method,
            notes: None,
            recorded_by: None,
        }
    }
}

/// Checkout behaviour toggles configured per deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutPolicy {
    /// Reject sales pushing a customer above a positive credit limit.
    pub enforce_credit_limit: bool,
}

// =============================================================================
// Totals
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub tax: Money,
    pub total: Money,
}

impl SaleTotals {
    /// Computes sale totals. With no discount and a zero rate,
    /// `total == subtotal`.
    pub fn compute(lines: &[CheckoutLine], discount: Money, tax_rate: TaxRate) -> CoreResult<Self> {
        let mut subtotal = Money::zero();
        for line in lines {
            subtotal = subtotal.checked_add(line.unit_price.checked_mul_quantity(line.quantity)?)?;
        }

        if discount > subtotal {
            return Err(ValidationError::OutOfRange {
                field: "discount".to_string(),
                min: 0,
                max: subtotal.minor(),
            }
            .into());
        }

        let taxable = subtotal - discount;
        let tax = taxable.calculate_tax(tax_rate);
        let total = taxable.checked_add(tax)?;

        Ok(SaleTotals {
            subtotal,
            discount,
            tax,
            total,
        })
    }
}

// =============================================================================
// Settlement
// =============================================================================

/// How the tender at checkout settles the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Settlement {
    pub amount_paid: Money,
    pub amount_remaining: Money,
    /// Cash handed back; zero for every other method.
    pub change_due: Money,
    pub payment_status: PaymentStatus,
}

impl Settlement {
    pub fn settle(
        total: Money,
        method: PaymentMethod,
        tendered: Option<Money>,
    ) -> CoreResult<Self> {
        let tendered = match (tendered, method) {
            (Some(t), _) => t,
            (None, PaymentMethod::Credit) => Money::zero(),
            (None, _) => total,
        };

        if tendered.is_negative() {
            return Err(CoreError::InvalidPaymentAmount {
                reason: "tendered amount cannot be negative".to_string(),
            });
        }
        if tendered > total && method != PaymentMethod::Cash {
            return Err(CoreError::InvalidPaymentAmount {
                reason: format!(
                    "{} payment cannot exceed the total",
                    method.as_str()
                ),
            });
        }

        let amount_paid = tendered.min(total);
        let amount_remaining = total - amount_paid;
        let change_due = tendered.saturating_sub_floor(total);

        let payment_status = if method == PaymentMethod::Credit {
            PaymentStatus::Credit
        } else if amount_remaining.is_positive() {
            PaymentStatus::Partial
        } else {
            PaymentStatus::Completed
        };

        Ok(Settlement {
            amount_paid,
            amount_remaining,
            change_due,
            payment_status,
        })
    }

    #[inline]
    pub fn requires_customer(&self) -> bool {
        self.amount_remaining.is_positive()
    }
}

/// Checks that `customer` may take on `additional` credit.
///
/// A zero limit means unlimited. Only called when the checkout policy
/// enforces limits.
pub fn check_credit_limit(customer: &Customer, additional: Money) -> CoreResult<()> {
    if !customer.has_credit_limit() || additional.is_zero() {
        return Ok(());
    }

    let would_owe = customer.current_credit.checked_add(additional)?;
    if would_owe > customer.credit_limit {
        return Err(CoreError::CreditLimitExceeded {
            customer: customer.name.clone(),
            limit: customer.credit_limit.minor(),
            requested: would_owe.minor(),
        });
    }
    Ok(())
}

// =============================================================================
// Payment Application
// =============================================================================

/// New balance of a sale after a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentApplication {
    pub amount: Money,
    pub amount_paid: Money,
    pub amount_remaining: Money,
    pub payment_status: PaymentStatus,
}

impl PaymentApplication {
    /// Applies `amount` paid with `method` to `sale`.
    ///
    /// ## Errors
    /// - `Validation` when `method` is credit
    /// - `InvalidPaymentAmount` for `amount <= 0` or `amount > remaining`
    /// - `SaleAlreadySettled` when nothing is owed
    pub fn apply(sale: &Sale, amount: Money, method: PaymentMethod) -> CoreResult<Self> {
        if method == PaymentMethod::Credit {
            return Err(ValidationError::NotAllowed {
                field: "payment_method".to_string(),
                allowed: PaymentMethod::ALL
                    .iter()
                    .filter(|m| **m != PaymentMethod::Credit)
                    .map(|m| m.as_str().to_string())
                    .collect(),
            }
            .into());
        }
        if !amount.is_positive() {
            return Err(CoreError::InvalidPaymentAmount {
                reason: "amount must be positive".to_string(),
            });
        }
        if !sale.amount_remaining.is_positive() {
            return Err(CoreError::SaleAlreadySettled(sale.sale_number.clone()));
        }
        if amount > sale.amount_remaining {
            return Err(CoreError::InvalidPaymentAmount {
                reason: format!(
                    "amount {} exceeds remaining balance {}",
                    amount.minor(),
                    sale.amount_remaining.minor()
                ),
            });
        }

        let amount_paid = sale.amount_paid.checked_add(amount)?;
        let amount_remaining = sale.amount_remaining - amount;
        let payment_status = if amount_remaining.is_zero() {
            PaymentStatus::Completed
        } else {
            PaymentStatus::Partial
        };

        Ok(PaymentApplication {
            amount,
            amount_paid,
            amount_remaining,
            payment_status,
        })
    }
}

/// Σ `amount_remaining` over the outstanding (partial or credit) sales.
///
/// This is the value `Customer::current_credit` must equal.
pub fn outstanding_credit<'a>(sales: impl IntoIterator<Item = &'a Sale>) -> Money {
    sales
        .into_iter()
        .filter(|s| s.payment_status.is_outstanding())
        .map(|s| s.amount_remaining)
        .sum()
}

// =============================================================================
// Sale Numbers
// =============================================================================

/// Formats the human-readable sale number, `SALE-YYYYMMDD-NNNN`.
///
/// `sequence` is the 1-based position of the sale within the tenant's day.
pub fn format_sale_number(date: NaiveDate, sequence: u32) -> String {
    format!("SALE-{}-{:04}", date.format("%Y%m%d"), sequence)
}

/// Prefix shared by all sale numbers of `date`.
pub fn sale_number_prefix(date: NaiveDate) -> String {
    format!("SALE-{}-", date.format("%Y%m%d"))
}

// =============================================================================
// Results
// =============================================================================

/// What the cashier needs to print a receipt after checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleReceipt {
    pub sale_id: String,
    pub sale_number: String,
    pub total: Money,
    pub amount_paid: Money,
    pub amount_remaining: Money,
    pub change_due: Money,
    pub payment_status: PaymentStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const P1: &str = "550e8400-e29b-41d4-a716-446655440001";
    const P2: &str = "550e8400-e29b-41d4-a716-446655440002";

    fn line(id: &str, price: i64, qty: i64) -> CheckoutLine {
        CheckoutLine {
            product_id: id.to_string(),
            unit_price: Money::from_minor(price),
            quantity: qty,
        }
    }

    fn sale(total: i64, paid: i64, status: PaymentStatus) -> Sale {
        Sale {
            id: "s1".to_string(),
            tenant_id: "t1".to_string(),
            sale_number: "SALE-20260101-0001".to_string(),
            customer_id: Some("c1".to_string()),
            cashier_id: None,
            subtotal: Money::from_minor(total),
            tax: Money::zero(),
            discount: Money::zero(),
            total: Money::from_minor(total),
            payment_method: PaymentMethod::Credit,
            payment_status: status,
            amount_paid: Money::from_minor(paid),
            amount_remaining: Money::from_minor(total - paid),
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            sync_version: 0,
        }
    }

    #[test]
    fn test_totals_without_tax_or_discount() {
        let totals =
            SaleTotals::compute(&[line(P1, 1000, 3)], Money::zero(), TaxRate::zero()).unwrap();
        assert_eq!(totals.subtotal, Money::from_minor(3000));
        assert_eq!(totals.total, Money::from_minor(3000));
        assert_eq!(totals.tax, Money::zero());
    }

    #[test]
    fn test_totals_with_discount_and_tax() {
        let totals = SaleTotals::compute(
            &[line(P1, 1000, 10)],
            Money::from_minor(1000),
            TaxRate::from_bps(1800),
        )
        .unwrap();
        assert_eq!(totals.subtotal, Money::from_minor(10000));
        assert_eq!(totals.tax, Money::from_minor(1620));
        assert_eq!(totals.total, Money::from_minor(10620));

        assert!(SaleTotals::compute(
            &[line(P1, 1000, 1)],
            Money::from_minor(1001),
            TaxRate::zero()
        )
        .is_err());
    }

    #[test]
    fn test_validated_lines_merges_duplicates() {
        let req = CheckoutRequest::new(
            vec![line(P1, 500, 2), line(P2, 100, 1), line(P1, 500, 3)],
            PaymentMethod::Cash,
        );
        let lines = req.validated_lines().unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].quantity, 5);
    }

    #[test]
    fn test_same_product_at_two_prices_keeps_both_lines() {
        let req = CheckoutRequest::new(
            vec![line(P1, 1000, 1), line(P1, 500, 1)],
            PaymentMethod::Cash,
        );
        let lines = req.validated_lines().unwrap();
        assert_eq!(lines.len(), 2);

        let totals = SaleTotals::compute(&lines, Money::zero(), TaxRate::zero()).unwrap();
        assert_eq!(totals.subtotal, Money::from_minor(1500));

        assert_eq!(quantities_by_product(&lines).unwrap(), vec![(P1, 2)]);
    }

    #[test]
    fn test_quantity_cap_applies_per_product() {
        let req = CheckoutRequest::new(
            vec![line(P1, 1000, 600), line(P1, 900, 600)],
            PaymentMethod::Cash,
        );
        assert!(matches!(req.validated_lines(), Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_validated_lines_rejections() {
        let empty = CheckoutRequest::new(vec![], PaymentMethod::Cash);
        assert!(matches!(empty.validated_lines(), Err(CoreError::EmptyCart)));

        let zero = CheckoutRequest::new(vec![line(P1, 500, 0)], PaymentMethod::Cash);
        assert!(zero.validated_lines().is_err());

        let negative_price = CheckoutRequest::new(vec![line(P1, -1, 1)], PaymentMethod::Cash);
        assert!(negative_price.validated_lines().is_err());

        let merged_too_many =
            CheckoutRequest::new(vec![line(P1, 1, 600), line(P1, 1, 600)], PaymentMethod::Cash);
        assert!(merged_too_many.validated_lines().is_err());

        let bad_id = CheckoutRequest::new(vec![line("nope", 1, 1)], PaymentMethod::Cash);
        assert!(bad_id.validated_lines().is_err());
    }

    #[test]
    fn test_settle_cash_defaults_to_total() {
        let s = Settlement::settle(Money::from_minor(3000), PaymentMethod::Cash, None).unwrap();
        assert_eq!(s.amount_paid, Money::from_minor(3000));
        assert_eq!(s.amount_remaining, Money::zero());
        assert_eq!(s.payment_status, PaymentStatus::Completed);
        assert!(!s.requires_customer());
    }

    #[test]
    fn test_settle_cash_with_change() {
        let s = Settlement::settle(
            Money::from_minor(3000),
            PaymentMethod::Cash,
            Some(Money::from_minor(5000)),
        )
        .unwrap();
        assert_eq!(s.amount_paid, Money::from_minor(3000));
        assert_eq!(s.change_due, Money::from_minor(2000));
        assert_eq!(s.amount_remaining, Money::zero());
    }

    #[test]
    fn test_settle_partial() {
        let s = Settlement::settle(
            Money::from_minor(3000),
            PaymentMethod::OrangeMoney,
            Some(Money::from_minor(1000)),
        )
        .unwrap();
        assert_eq!(s.amount_remaining, Money::from_minor(2000));
        assert_eq!(s.payment_status, PaymentStatus::Partial);
        assert!(s.requires_customer());
    }

    #[test]
    fn test_settle_credit() {
        let s = Settlement::settle(Money::from_minor(3000), PaymentMethod::Credit, None).unwrap();
        assert_eq!(s.amount_paid, Money::zero());
        assert_eq!(s.amount_remaining, Money::from_minor(3000));
        assert_eq!(s.payment_status, PaymentStatus::Credit);

        // A deposit still leaves the sale on credit
        let s = Settlement::settle(
            Money::from_minor(3000),
            PaymentMethod::Credit,
            Some(Money::from_minor(1000)),
        )
        .unwrap();
        assert_eq!(s.payment_status, PaymentStatus::Credit);
        assert_eq!(s.amount_remaining, Money::from_minor(2000));

        // A credit sale stays on credit even when covered up front
        let s = Settlement::settle(
            Money::from_minor(3000),
            PaymentMethod::Credit,
            Some(Money::from_minor(3000)),
        )
        .unwrap();
        assert_eq!(s.payment_status, PaymentStatus::Credit);
        assert_eq!(s.amount_remaining, Money::zero());
        assert!(!s.requires_customer());
    }

    #[test]
    fn test_settle_rejects_overpay_without_cash() {
        for method in [PaymentMethod::Card, PaymentMethod::MtnMoney, PaymentMethod::Credit] {
            assert!(Settlement::settle(
                Money::from_minor(3000),
                method,
                Some(Money::from_minor(3001))
            )
            .is_err());
        }
        assert!(Settlement::settle(
            Money::from_minor(3000),
            PaymentMethod::Cash,
            Some(Money::from_minor(-1))
        )
        .is_err());
    }

    #[test]
    fn test_balance_invariant_holds_for_every_tender() {
        let total = Money::from_minor(2500);
        for method in PaymentMethod::ALL {
            for tendered in [None, Some(0), Some(1), Some(2499), Some(2500)] {
                let s = Settlement::settle(total, method, tendered.map(Money::from_minor)).unwrap();
                assert_eq!(s.amount_paid + s.amount_remaining, total);
                assert!(!s.amount_remaining.is_negative());
            }
        }
    }

    #[test]
    fn test_check_credit_limit() {
        let mut customer = Customer {
            id: "c1".to_string(),
            tenant_id: "t1".to_string(),
            name: "Awa".to_string(),
            phone: None,
            email: None,
            address: None,
            credit_limit: Money::from_minor(10000),
            current_credit: Money::from_minor(7000),
            total_purchases: Money::zero(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            sync_version: 0,
        };
        assert!(check_credit_limit(&customer, Money::from_minor(3000)).is_ok());
        assert!(matches!(
            check_credit_limit(&customer, Money::from_minor(3001)),
            Err(CoreError::CreditLimitExceeded { .. })
        ));

        customer.credit_limit = Money::zero();
        assert!(check_credit_limit(&customer, Money::from_minor(1_000_000)).is_ok());
    }

    #[test]
    fn test_apply_partial_then_full() {
        let mut s = sale(3000, 0, PaymentStatus::Credit);

        let first = PaymentApplication::apply(&s, Money::from_minor(1000), PaymentMethod::Cash)
            .unwrap();
        assert_eq!(first.amount_remaining, Money::from_minor(2000));
        assert_eq!(first.payment_status, PaymentStatus::Partial);

        s.amount_paid = first.amount_paid;
        s.amount_remaining = first.amount_remaining;
        s.payment_status = first.payment_status;

        let second = PaymentApplication::apply(&s, Money::from_minor(2000), PaymentMethod::MtnMoney)
            .unwrap();
        assert_eq!(second.amount_remaining, Money::zero());
        assert_eq!(second.amount_paid, Money::from_minor(3000));
        assert_eq!(second.payment_status, PaymentStatus::Completed);
    }

    #[test]
    fn test_apply_rejections() {
        let s = sale(3000, 1000, PaymentStatus::Partial);
        assert!(matches!(
            PaymentApplication::apply(&s, Money::from_minor(2001), PaymentMethod::Cash),
            Err(CoreError::InvalidPaymentAmount { .. })
        ));
        assert!(PaymentApplication::apply(&s, Money::zero(), PaymentMethod::Cash).is_err());
        assert!(PaymentApplication::apply(&s, Money::from_minor(100), PaymentMethod::Credit).is_err());

        let settled = sale(3000, 3000, PaymentStatus::Completed);
        assert!(matches!(
            PaymentApplication::apply(&settled, Money::from_minor(1), PaymentMethod::Cash),
            Err(CoreError::SaleAlreadySettled(_))
        ));
    }

    #[test]
    fn test_outstanding_credit() {
        let sales = vec![
            sale(3000, 0, PaymentStatus::Credit),
            sale(5000, 4000, PaymentStatus::Partial),
            sale(2000, 2000, PaymentStatus::Completed),
        ];
        assert_eq!(outstanding_credit(&sales), Money::from_minor(4000));
    }

    #[test]
    fn test_sale_number_format() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        assert_eq!(format_sale_number(date, 7), "SALE-20261016-0007");
        assert_eq!(sale_number_prefix(date), "SALE-20261016-");
    }
}
