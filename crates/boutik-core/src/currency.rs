//! # Currency Module
//!
//! The currencies a store can be configured with, and the display/parse
//! rules for amounts in each of them.
//!
//! ## Currency Table
//! ```text
//! ┌──────┬────────┬──────────┬──────────────────────────────┐
//! │ Code │ Symbol │ Decimals │ Rendered                     │
//! ├──────┼────────┼──────────┼──────────────────────────────┤
//! │ XOF  │ FCFA   │ 0        │ "5000 FCFA"                  │
//! │ XAF  │ FCFA   │ 0        │ "5000 FCFA"                  │
//! │ NGN  │ ₦      │ 2        │ "₦1234.56"                   │
//! │ GHS  │ ₵      │ 2        │ "₵10.00"                     │
//! │ MAD  │ DH     │ 2        │ "DH99.90"                    │
//! └──────┴────────┴──────────┴──────────────────────────────┘
//! ```
//!
//! `format` and `parse` round-trip: `parse(format(m)) == m` for every
//! currency.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{ValidationError, ValidationResult};
use crate::money::Money;

/// Currency configured in a store's settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum Currency {
    /// West African CFA franc.
    #[default]
    Xof,
    /// Central African CFA franc.
    Xaf,
    /// Nigerian naira.
    Ngn,
    /// Ghanaian cedi.
    Ghs,
    /// Moroccan dirham.
    Mad,
}

impl Currency {
    pub const ALL: [Currency; 5] = [
        Currency::Xof,
        Currency::Xaf,
        Currency::Ngn,
        Currency::Ghs,
        Currency::Mad,
    ];

    /// ISO 4217 code.
    pub const fn code(&self) -> &'static str {
        match self {
            Currency::Xof => "XOF",
            Currency::Xaf => "XAF",
            Currency::Ngn => "NGN",
            Currency::Ghs => "GHS",
            Currency::Mad => "MAD",
        }
    }

    pub const fn symbol(&self) -> &'static str {
        match self {
            Currency::Xof | Currency::Xaf => "FCFA",
            Currency::Ngn => "₦",
            Currency::Ghs => "₵",
            Currency::Mad => "DH",
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Currency::Xof => "Franc CFA (BCEAO)",
            Currency::Xaf => "Franc CFA (BEAC)",
            Currency::Ngn => "Naira nigérian",
            Currency::Ghs => "Cedi ghanéen",
            Currency::Mad => "Dirham marocain",
        }
    }

    /// Number of fractional digits of the minor unit.
    pub const fn decimals(&self) -> u32 {
        match self {
            Currency::Xof | Currency::Xaf => 0,
            Currency::Ngn | Currency::Ghs | Currency::Mad => 2,
        }
    }

    /// Whether the symbol trails the amount ("5000 FCFA").
    const fn symbol_trails(&self) -> bool {
        matches!(self, Currency::Xof | Currency::Xaf)
    }

    const fn minor_per_major(&self) -> i64 {
        10_i64.pow(self.decimals())
    }

    /// Renders an amount for display.
    ///
    /// ## Example
    /// ```rust
    /// use boutik_core::{Currency, Money};
    ///
    /// assert_eq!(Currency::Xof.format(Money::from_minor(5000)), "5000 FCFA");
    /// assert_eq!(Currency::Ngn.format(Money::from_minor(123456)), "₦1234.56");
    /// assert_eq!(Currency::Ghs.format(Money::from_minor(-250)), "-₵2.50");
    /// ```
    pub fn format(&self, amount: Money) -> String {
        let sign = if amount.is_negative() { "-" } else { "" };
        let number = self.format_number(amount);
        let digits = number.trim_start_matches('-');

        if self.symbol_trails() {
            format!("{}{} {}", sign, digits, self.symbol())
        } else {
            format!("{}{}{}", sign, self.symbol(), digits)
        }
    }

    /// Renders the bare number in major units ("1234.56", "-5000"), as
    /// written to spreadsheet exports.
    pub fn format_number(&self, amount: Money) -> String {
        let sign = if amount.is_negative() { "-" } else { "" };
        let minor = amount.minor().unsigned_abs();
        let per_major = self.minor_per_major() as u64;

        if self.decimals() == 0 {
            format!("{}{}", sign, minor)
        } else {
            format!(
                "{}{}.{:0width$}",
                sign,
                minor / per_major,
                minor % per_major,
                width = self.decimals() as usize
            )
        }
    }

    /// Parses a user-entered or formatted amount back to minor units.
    ///
    /// Everything except digits, `.` and a `-` before the first digit is
    /// ignored, so symbols, spaces and codes may surround the number. Input
    /// with no digits parses to zero.
    ///
    /// ## Errors
    /// - more than one decimal point
    /// - more fractional digits than the currency has
    /// - a value that does not fit in i64 minor units
    pub fn parse(&self, text: &str) -> ValidationResult<Money> {
        let mut negative = false;
        let mut seen_digit = false;
        let mut cleaned = String::with_capacity(text.len());

        for c in text.chars() {
            match c {
                '-' if !seen_digit && cleaned.is_empty() => negative = true,
                '0'..='9' => {
                    seen_digit = true;
                    cleaned.push(c);
                }
                '.' => cleaned.push(c),
                _ => {}
            }
        }

        if !seen_digit {
            return Ok(Money::zero());
        }

        let (whole, fraction) = match cleaned.split_once('.') {
            Some((w, f)) => (w, f),
            None => (cleaned.as_str(), ""),
        };

        if fraction.contains('.') {
            return Err(invalid("more than one decimal point"));
        }
        if fraction.len() > self.decimals() as usize {
            return Err(ValidationError::InvalidFormat {
                field: "amount".to_string(),
                reason: format!(
                    "{} allows at most {} decimal places",
                    self.code(),
                    self.decimals()
                ),
            });
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("amount too large"))?
        };
        let padded = format!("{:0<width$}", fraction, width = self.decimals() as usize);
        let fraction: i64 = if padded.is_empty() {
            0
        } else {
            padded.parse().map_err(|_| invalid("invalid fraction"))?
        };

        let minor = whole
            .checked_mul(self.minor_per_major())
            .and_then(|m| m.checked_add(fraction))
            .ok_or_else(|| invalid("amount too large"))?;

        Ok(Money::from_minor(if negative { -minor } else { minor }))
    }
}

fn invalid(reason: &str) -> ValidationError {
    ValidationError::InvalidFormat {
        field: "amount".to_string(),
        reason: reason.to_string(),
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        Currency::ALL
            .into_iter()
            .find(|c| c.code() == code)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "currency".to_string(),
                allowed: Currency::ALL.iter().map(|c| c.code().to_string()).collect(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table() {
        assert_eq!(Currency::Xaf.symbol(), "FCFA");
        assert_eq!(Currency::Mad.symbol(), "DH");
        assert_eq!(Currency::Xof.decimals(), 0);
        assert_eq!(Currency::Ngn.decimals(), 2);
        assert_eq!(Currency::default(), Currency::Xof);
    }

    #[test]
    fn test_format() {
        assert_eq!(Currency::Xof.format(Money::from_minor(5000)), "5000 FCFA");
        assert_eq!(Currency::Xaf.format(Money::zero()), "0 FCFA");
        assert_eq!(Currency::Xof.format(Money::from_minor(-1500)), "-1500 FCFA");
        assert_eq!(Currency::Ngn.format(Money::from_minor(123456)), "₦1234.56");
        assert_eq!(Currency::Ghs.format(Money::from_minor(1000)), "₵10.00");
        assert_eq!(Currency::Mad.format(Money::from_minor(5)), "DH0.05");
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            Currency::Xof.parse("5000 FCFA").unwrap(),
            Money::from_minor(5000)
        );
        assert_eq!(
            Currency::Ngn.parse("₦1,234.5").unwrap(),
            Money::from_minor(123450)
        );
        assert_eq!(Currency::Ghs.parse("-₵2.50").unwrap(), Money::from_minor(-250));
        assert_eq!(Currency::Mad.parse("").unwrap(), Money::zero());
        assert_eq!(Currency::Mad.parse("abc").unwrap(), Money::zero());
    }

    #[test]
    fn test_parse_rejects_extra_precision() {
        assert!(Currency::Xof.parse("10.5").is_err());
        assert!(Currency::Ngn.parse("1.234").is_err());
        assert!(Currency::Ngn.parse("1.2.3").is_err());
        assert!(Currency::Xof.parse("99999999999999999999").is_err());
    }

    #[test]
    fn test_round_trip_all_currencies() {
        for currency in Currency::ALL {
            for minor in [0, 1, 99, 100, 3000, 123456, -250, 999_999_999] {
                let amount = Money::from_minor(minor);
                let text = currency.format(amount);
                assert_eq!(currency.parse(&text).unwrap(), amount, "{}", text);
            }
        }
    }

    #[test]
    fn test_from_str() {
        assert_eq!("xof".parse::<Currency>().unwrap(), Currency::Xof);
        assert_eq!(" GHS ".parse::<Currency>().unwrap(), Currency::Ghs);
        assert!("USD".parse::<Currency>().is_err());
    }
}
