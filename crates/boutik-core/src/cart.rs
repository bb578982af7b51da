//! # Cart
//!
//! The interactive cart the cashier builds before checkout.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cashier Action          Cart Method               Effect               │
//! │  ──────────────          ───────────               ──────               │
//! │  Tap product ──────────► add_item() ─────────────► push or qty += n    │
//! │  Edit quantity ────────► update_quantity() ──────► qty = n (0 removes) │
//! │  Remove line ──────────► remove_item() ──────────► line dropped        │
//! │  Cancel sale ──────────► clear() ────────────────► empty               │
//! │  Pay ──────────────────► checkout_lines() ───────► CheckoutRequest     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by `product_id`
//! - Every quantity is in `1..=min(MAX_ITEM_QUANTITY, available_stock)`
//! - At most `MAX_CART_ITEMS` lines
//!
//! The stock seen here is a snapshot taken when the product was added; the
//! checkout transaction re-checks it against the database.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::settlement::CheckoutLine;
use crate::types::Product;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// A line of the cart. Name and price are frozen when the product is added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartItem {
    pub product_id: String,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
    /// On-hand quantity when the product was added.
    pub available_stock: i64,
}

impl CartItem {
    /// Line subtotal (`unit_price × quantity`).
    pub fn line_total(&self) -> CoreResult<Money> {
        self.unit_price.checked_mul_quantity(self.quantity)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    pub items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Cart::default()
    }

    /// Adds a product, or increases the quantity of its existing line.
    ///
    /// ## Errors
    /// - `InsufficientStock` when the combined quantity exceeds stock
    ///   (including any add of an out-of-stock product)
    /// - `QuantityTooLarge` above `MAX_ITEM_QUANTITY`
    /// - `CartTooLarge` when a new line would exceed `MAX_CART_ITEMS`
    pub fn add_item(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            return Err(crate::ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }
        if !product.is_active {
            return Err(CoreError::ProductNotFound(product.id.clone()));
        }

        let existing = self.items.iter().position(|i| i.product_id == product.id);
        let current = existing.map(|idx| self.items[idx].quantity).unwrap_or(0);
        let new_qty = current
            .checked_add(quantity)
            .ok_or(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            })?;

        check_quantity(&product.name, new_qty, product.stock_quantity)?;

        match existing {
            Some(idx) => {
                let item = &mut self.items[idx];
                item.quantity = new_qty;
                item.available_stock = product.stock_quantity;
            }
            None => {
                if self.items.len() >= MAX_CART_ITEMS {
                    return Err(CoreError::CartTooLarge {
                        max: MAX_CART_ITEMS,
                    });
                }
                self.items.push(CartItem {
                    product_id: product.id.clone(),
                    name: product.name.clone(),
                    unit_price: product.price,
                    quantity,
                    available_stock: product.stock_quantity,
                });
            }
        }
        Ok(())
    }

    /// Sets a line's quantity. Zero removes the line.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove_item(product_id);
        }
        if quantity < 0 {
            return Err(crate::ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }

        let item = self
            .items
            .iter_mut()
            .find(|i| i.product_id == product_id)
            .ok_or_else(|| CoreError::ProductNotInCart(product_id.to_string()))?;

        check_quantity(&item.name, quantity, item.available_stock)?;
        item.quantity = quantity;
        Ok(())
    }

    pub fn remove_item(&mut self, product_id: &str) -> CoreResult<()> {
        let initial_len = self.items.len();
        self.items.retain(|i| i.product_id != product_id);

        if self.items.len() == initial_len {
            Err(CoreError::ProductNotInCart(product_id.to_string()))
        } else {
            Ok(())
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Σ line totals.
    pub fn subtotal(&self) -> CoreResult<Money> {
        self.items
            .iter()
            .try_fold(Money::zero(), |acc, item| acc.checked_add(item.line_total()?))
    }

    /// Lines for a checkout request.
    pub fn checkout_lines(&self) -> Vec<CheckoutLine> {
        self.items
            .iter()
            .map(|i| CheckoutLine {
                product_id: i.product_id.clone(),
                unit_price: i.unit_price,
                quantity: i.quantity,
            })
            .collect()
    }
}

fn check_quantity(name: &str, quantity: i64, available: i64) -> CoreResult<()> {
    if quantity > MAX_ITEM_QUANTITY {
        return Err(CoreError::QuantityTooLarge {
            requested: quantity,
            max: MAX_ITEM_QUANTITY,
        });
    }
    if quantity > available {
        return Err(CoreError::InsufficientStock {
            product: name.to_string(),
            available,
            requested: quantity,
        });
    }
    Ok(())
}
