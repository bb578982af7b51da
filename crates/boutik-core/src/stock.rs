//! # Stock Rules
//!
//! Rules for changing a product's on-hand quantity.
//!
//! ```text
//!   manual "in"  (+n) ──┐
//!   manual "out" (−n) ──┼──► plan_movement() ──► StockChange { delta, new_quantity }
//!   checkout     (−n) ──┘          │
//!                                  └── new_quantity < 0 → InsufficientStock
//! ```
//!
//! The database applies the delta with a conditional update
//! (`stock_quantity + delta >= 0`), so two concurrent movements cannot both
//! pass a check that only one of them should.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{MovementType, Product};
use crate::validation::{validate_optional_text, validate_uuid};

/// A manual stock movement entered from the inventory screen.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockMovementRequest {
    pub product_id: String,
    pub movement_type: MovementType,
    /// Magnitude; the sign comes from `movement_type`.
    pub quantity: i64,
    pub notes: Option<String>,
    pub user_id: Option<String>,
}

impl StockMovementRequest {
    pub fn new(product_id: impl Into<String>, movement_type: MovementType, quantity: i64) -> Self {
        StockMovementRequest {
            product_id: product_id.into(),
            movement_type,
            quantity,
            notes: None,
            user_id: None,
        }
    }

    /// Checks the request shape and returns the signed delta.
    ///
    /// `sale` movements are written by checkout only and are refused here.
    pub fn validate(&self) -> CoreResult<i64> {
        validate_uuid("product_id", &self.product_id)?;
        validate_optional_text("notes", self.notes.as_deref(), 500)?;

        if self.movement_type == MovementType::Sale {
            return Err(ValidationError::NotAllowed {
                field: "movement_type".to_string(),
                allowed: vec!["in".to_string(), "out".to_string()],
            }
            .into());
        }
        if self.quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }

        Ok(signed_delta(self.movement_type, self.quantity))
    }
}

/// Signed delta for a movement of `quantity` units.
pub fn signed_delta(movement_type: MovementType, quantity: i64) -> i64 {
    match movement_type {
        MovementType::In => quantity,
        MovementType::Out | MovementType::Sale => -quantity,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockChange {
    pub delta: i64,
    pub new_quantity: i64,
}

/// Plans applying `delta` to `product`, refusing a negative result.
pub fn plan_movement(product: &Product, delta: i64) -> CoreResult<StockChange> {
    let new_quantity = product
        .stock_quantity
        .checked_add(delta)
        .ok_or(CoreError::AmountOverflow)?;

    if new_quantity < 0 {
        return Err(CoreError::InsufficientStock {
            product: product.name.clone(),
            available: product.stock_quantity,
            requested: -delta,
        });
    }

    Ok(StockChange {
        delta,
        new_quantity,
    })
}

/// Products at or below their threshold, lowest stock first.
pub fn low_stock<'a>(products: impl IntoIterator<Item = &'a Product>) -> Vec<&'a Product> {
    let mut low: Vec<&Product> = products
        .into_iter()
        .filter(|p| p.is_active && p.is_low_stock())
        .collect();
    low.sort_by_key(|p| p.stock_quantity);
    low
}
