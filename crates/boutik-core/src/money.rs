//! # Money Module
//!
//! Provides the `Money` type: an amount in the minor unit of the store's
//! currency.
//!
//! ## Minor Units
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ONE INTEGER, MANY CURRENCIES                                           │
//! │                                                                         │
//! │  XOF / XAF (0 decimals)   5000 FCFA    → Money(5000)                    │
//! │  NGN       (2 decimals)   ₦1234.56     → Money(123456)                  │
//! │  GHS / MAD (2 decimals)   ₵10.00       → Money(1000)                    │
//! │                                                                         │
//! │  Money never knows its currency. The store's settings carry the         │
//! │  currency and only `Currency::format` / `Currency::parse` look at it.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use boutik_core::money::Money;
//!
//! let price = Money::from_minor(1500);
//! let line = price.checked_mul_quantity(2).unwrap();
//! assert_eq!(line, Money::from_minor(3000));
//! ```

use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest unit of the store's currency.
///
/// ## Design Decisions
/// - **i64 (signed)**: ledger deltas (credit decrements) are negative
/// - **Single field tuple struct**: stored as a plain INTEGER column
/// - **No currency inside**: every amount of a tenant shares one currency
///
/// ## Where Money Flows
/// ```text
/// Product.price ──► SaleItem.unit_price ──► SaleItem.subtotal
///                                                 │
///                                                 ▼
/// Sale.total = Sale.amount_paid + Sale.amount_remaining
///                                                 │
///                                                 ▼
///                     Customer.current_credit (Σ remaining)
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(transparent))]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ## Example
    /// ```rust
    /// use boutik_core::money::Money;
    ///
    /// let price = Money::from_minor(1099);
    /// assert_eq!(price.minor(), 1099);
    /// ```
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Returns `self - other`, floored at zero.
    ///
    /// Used for change due: tendering less than the total yields no change.
    #[inline]
    pub fn saturating_sub_floor(self, other: Money) -> Money {
        if self.0 > other.0 {
            Money(self.0 - other.0)
        } else {
            Money::zero()
        }
    }

    /// Multiplies a unit price by a quantity, failing instead of wrapping.
    ///
    /// ## Example
    /// ```rust
    /// use boutik_core::money::Money;
    ///
    /// let unit_price = Money::from_minor(1000);
    /// assert_eq!(unit_price.checked_mul_quantity(2).unwrap().minor(), 2000);
    /// assert!(Money::from_minor(i64::MAX).checked_mul_quantity(2).is_err());
    /// ```
    pub fn checked_mul_quantity(&self, qty: i64) -> CoreResult<Money> {
        self.0
            .checked_mul(qty)
            .map(Money)
            .ok_or(CoreError::AmountOverflow)
    }

    /// Adds two amounts, failing instead of wrapping.
    pub fn checked_add(&self, other: Money) -> CoreResult<Money> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or(CoreError::AmountOverflow)
    }

    /// Calculates tax on this amount, rounding half up.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000` in i128.
    ///
    /// ## Example
    /// ```rust
    /// use boutik_core::money::Money;
    /// use boutik_core::types::TaxRate;
    ///
    /// let base = Money::from_minor(10000);
    /// let tax = base.calculate_tax(TaxRate::from_bps(1800)); // 18% VAT
    /// assert_eq!(tax.minor(), 1800);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        let tax = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money(tax as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

/// Multiplication by quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
