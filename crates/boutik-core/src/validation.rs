//! # Validation Module
//!
//! Input validation for every form payload that reaches the repositories.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend forms                                               │
//! │  ├── Same limits, immediate feedback                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Run by repositories before any write                              │
//! │  └── Rejects with ValidationError (no state touched)                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                       │
//! │  ├── CHECK (stock_quantity >= 0, amount_remaining >= 0, ...)           │
//! │  ├── UNIQUE (tenant_id, sale_number)                                   │
//! │  └── Foreign keys                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lengths are counted in characters, not bytes: product and customer names
//! are routinely accented ("Café Touba", "Boubacar Diallo-Koné").
//!
//! ## Usage
//! ```rust
//! use boutik_core::validation::{validate_phone, validate_quantity};
//!
//! validate_phone(Some("+229 97 00 00 00")).unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{
    NewCategory, NewCustomer, NewExpense, NewProduct, NewSupplier, ProductUpdate, StoreSettings,
};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

pub use crate::error::ValidationResult;

/// Upper bound for a customer's credit limit, in minor units.
pub const MAX_CREDIT_LIMIT: i64 = 999_999_999;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required text field: non-blank, at most `max` characters.
pub fn validate_required_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    validate_length(field, value, max)
}

/// Validates an optional text field: at most `max` characters when present.
pub fn validate_optional_text(field: &str, value: Option<&str>, max: usize) -> ValidationResult<()> {
    match value {
        Some(v) => validate_length(field, v.trim(), max),
        None => Ok(()),
    }
}

fn validate_length(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

/// Validates a product name (1 to 200 characters).
///
/// ## Example
/// ```rust
/// use boutik_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Riz parfumé 5kg").is_ok());
/// assert!(validate_product_name("").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_required_text("name", name, 200)
}

/// Validates an optional SKU.
///
/// ## Rules
/// - Blank is treated as absent
/// - At most 50 characters
/// - Only letters, numbers, hyphens and underscores
pub fn validate_sku(sku: Option<&str>) -> ValidationResult<()> {
    let Some(sku) = sku.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(());
    };

    validate_length("sku", sku, 50)?;

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a search query and returns it trimmed.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();
    validate_length("query", query, 100)?;
    Ok(query.to_string())
}

/// Validates a phone number: `^[+]?[\d\s\-()]*$`, at most 20 characters.
pub fn validate_phone(phone: Option<&str>) -> ValidationResult<()> {
    let Some(phone) = phone.map(str::trim) else {
        return Ok(());
    };

    validate_length("phone", phone, 20)?;

    let body = phone.strip_prefix('+').unwrap_or(phone);
    if !body
        .chars()
        .all(|c| c.is_ascii_digit() || c.is_whitespace() || matches!(c, '-' | '(' | ')'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "may contain only digits, spaces, '-', '(' and ')' after an optional '+'"
                .to_string(),
        });
    }

    Ok(())
}

/// Validates an optional e-mail address (at most 255 characters).
///
/// Blank is treated as absent. The check is structural: one `@`, a
/// non-empty local part and a dotted domain.
pub fn validate_email(email: Option<&str>) -> ValidationResult<()> {
    let Some(email) = email.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(());
    };

    validate_length("email", email, 255)?;

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must be a valid e-mail address".to_string(),
        });
    }

    Ok(())
}

/// Validates an optional `#RRGGBB` colour.
pub fn validate_color(color: Option<&str>) -> ValidationResult<()> {
    let Some(color) = color else {
        return Ok(());
    };

    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "color".to_string(),
            reason: "must be #RRGGBB".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a non-negative amount (price, cost). Zero is allowed.
pub fn validate_non_negative(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Validates a payment or expense amount: strictly positive.
pub fn validate_positive_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a stock count (opening stock, threshold): `>= 0`.
pub fn validate_stock_level(field: &str, qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Validates a tax rate in basis points (0% to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 10000,
        });
    }
    Ok(())
}

/// Validates a customer credit limit: `0..=MAX_CREDIT_LIMIT`.
pub fn validate_credit_limit(limit: Money) -> ValidationResult<()> {
    if limit.is_negative() || limit.minor() > MAX_CREDIT_LIMIT {
        return Err(ValidationError::OutOfRange {
            field: "credit_limit".to_string(),
            min: 0,
            max: MAX_CREDIT_LIMIT,
        });
    }
    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates cart size before adding a new line.
pub fn validate_cart_size(current_items: usize) -> ValidationResult<()> {
    if current_items >= MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "cart items".to_string(),
            min: 0,
            max: MAX_CART_ITEMS as i64,
        });
    }
    Ok(())
}

/// Validates a UUID string.
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Form Validators
// =============================================================================

pub fn validate_new_product(p: &NewProduct) -> ValidationResult<()> {
    validate_product_name(&p.name)?;
    validate_optional_text("description", p.description.as_deref(), 1000)?;
    validate_sku(p.sku.as_deref())?;
    validate_optional_text("barcode", p.barcode.as_deref(), 50)?;
    validate_non_negative("price", p.price)?;
    if let Some(cost) = p.cost_price {
        validate_non_negative("cost_price", cost)?;
    }
    validate_tax_rate_bps(p.tax_rate_bps)?;
    validate_stock_level("stock_quantity", p.stock_quantity)?;
    if let Some(min) = p.min_stock_level {
        validate_stock_level("min_stock_level", min)?;
    }
    Ok(())
}

pub fn validate_product_update(p: &ProductUpdate) -> ValidationResult<()> {
    validate_product_name(&p.name)?;
    validate_optional_text("description", p.description.as_deref(), 1000)?;
    validate_sku(p.sku.as_deref())?;
    validate_optional_text("barcode", p.barcode.as_deref(), 50)?;
    validate_non_negative("price", p.price)?;
    if let Some(cost) = p.cost_price {
        validate_non_negative("cost_price", cost)?;
    }
    validate_tax_rate_bps(p.tax_rate_bps)?;
    if let Some(min) = p.min_stock_level {
        validate_stock_level("min_stock_level", min)?;
    }
    Ok(())
}

pub fn validate_new_customer(c: &NewCustomer) -> ValidationResult<()> {
    validate_required_text("name", &c.name, 200)?;
    validate_phone(c.phone.as_deref())?;
    validate_email(c.email.as_deref())?;
    validate_optional_text("address", c.address.as_deref(), 500)?;
    validate_credit_limit(c.credit_limit)
}

pub fn validate_new_category(c: &NewCategory) -> ValidationResult<()> {
    validate_required_text("name", &c.name, 100)?;
    validate_optional_text("description", c.description.as_deref(), 500)?;
    validate_optional_text("icon", c.icon.as_deref(), 50)?;
    validate_color(c.color.as_deref())
}

pub fn validate_new_supplier(s: &NewSupplier) -> ValidationResult<()> {
    validate_required_text("name", &s.name, 200)?;
    validate_optional_text("contact_person", s.contact_person.as_deref(), 200)?;
    validate_phone(s.phone.as_deref())?;
    validate_email(s.email.as_deref())?;
    validate_optional_text("address", s.address.as_deref(), 500)?;
    validate_optional_text("notes", s.notes.as_deref(), 1000)
}

pub fn validate_new_expense(e: &NewExpense) -> ValidationResult<()> {
    validate_required_text("description", &e.description, 500)?;
    validate_positive_amount("amount", e.amount)?;
    validate_optional_text("category", e.category.as_deref(), 100)?;
    validate_optional_text("receipt_url", e.receipt_url.as_deref(), 1000)
}

pub fn validate_store_settings(s: &StoreSettings) -> ValidationResult<()> {
    validate_required_text("store_name", &s.store_name, 200)?;
    validate_optional_text("address", s.address.as_deref(), 500)?;
    validate_phone(s.phone.as_deref())?;
    validate_email(s.email.as_deref())?;
    validate_tax_rate_bps(s.tax_rate_bps)?;
    validate_optional_text("receipt_footer", s.receipt_footer.as_deref(), 200)
}

// =============================================================================
// Unit Tests
// =============================================================================
