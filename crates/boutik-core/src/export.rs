//! # Export
//!
//! Renders already-computed data into documents: a plain-text invoice for a
//! sale and CSV sheets for the sales history and the financial summary.
//! Everything is rendered to memory; writing files or producing PDF bytes is
//! the caller's business.

use chrono::{DateTime, Utc};

use crate::currency::Currency;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::report::FinancialSummary;
use crate::types::{Payment, Sale, SaleItem, StoreSettings};

/// Character width of the printed invoice (58mm thermal paper).
pub const INVOICE_WIDTH: usize = 40;

// =============================================================================
// Invoice
// =============================================================================

/// Everything printed on an invoice.
#[derive(Debug, Clone, Copy)]
pub struct Invoice<'a> {
    pub settings: &'a StoreSettings,
    pub sale: &'a Sale,
    pub items: &'a [SaleItem],
    pub payments: &'a [Payment],
    pub customer_name: Option<&'a str>,
}

impl Invoice<'_> {
    pub fn render(&self) -> String {
        let currency = self.settings.currency;
        let money = |m: Money| currency.format(m);
        let rule = "-".repeat(INVOICE_WIDTH);
        let mut out = String::new();

        push_centered(&mut out, &self.settings.store_name.to_uppercase());
        for extra in [&self.settings.address, &self.settings.phone, &self.settings.email]
            .into_iter()
            .flatten()
        {
            push_centered(&mut out, extra);
        }
        out.push_str(&rule);
        out.push('\n');

        push_row(&mut out, "Facture", &self.sale.sale_number);
        push_row(&mut out, "Date", &format_timestamp(self.sale.created_at));
        if let Some(name) = self.customer_name {
            push_row(&mut out, "Client", name);
        }
        out.push_str(&rule);
        out.push('\n');

        for item in self.items {
            out.push_str(&item.product_name);
            out.push('\n');
            push_row(
                &mut out,
                &format!("  {} x {}", item.quantity, money(item.unit_price)),
                &money(item.subtotal),
            );
        }
        out.push_str(&rule);
        out.push('\n');

        push_row(&mut out, "Sous-total", &money(self.sale.subtotal));
        if self.sale.discount.is_positive() {
            push_row(&mut out, "Remise", &format!("-{}", money(self.sale.discount)));
        }
        if self.sale.tax.is_positive() {
            push_row(&mut out, "TVA", &money(self.sale.tax));
        }
        push_row(&mut out, "TOTAL", &money(self.sale.total));
        push_row(
            &mut out,
            &format!("Payé ({})", self.sale.payment_method.label()),
            &money(self.sale.amount_paid),
        );
        if self.sale.amount_remaining.is_positive() {
            push_row(&mut out, "Reste à payer", &money(self.sale.amount_remaining));
        }

        if !self.payments.is_empty() {
            out.push_str(&rule);
            out.push('\n');
            out.push_str("Versements\n");
            for payment in self.payments {
                push_row(
                    &mut out,
                    &format!(
                        "  {} {}",
                        payment.created_at.format("%d/%m/%Y"),
                        payment.payment_method.label()
                    ),
                    &money(payment.amount),
                );
            }
        }

        if let Some(footer) = &self.settings.receipt_footer {
            out.push_str(&rule);
            out.push('\n');
            push_centered(&mut out, footer);
        }

        out
    }
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%d/%m/%Y %H:%M").to_string()
}

fn push_centered(out: &mut String, text: &str) {
    let len = text.chars().count();
    let pad = INVOICE_WIDTH.saturating_sub(len) / 2;
    out.push_str(&" ".repeat(pad));
    out.push_str(text);
    out.push('\n');
}

fn push_row(out: &mut String, left: &str, right: &str) {
    let used = left.chars().count() + right.chars().count();
    let gap = INVOICE_WIDTH.saturating_sub(used).max(1);
    out.push_str(left);
    out.push_str(&" ".repeat(gap));
    out.push_str(right);
    out.push('\n');
}

// =============================================================================
// CSV
// =============================================================================

fn csv_error(e: impl std::fmt::Display) -> CoreError {
    CoreError::Export(e.to_string())
}

fn finish(writer: csv::Writer<Vec<u8>>) -> CoreResult<String> {
    let bytes = writer.into_inner().map_err(csv_error)?;
    String::from_utf8(bytes).map_err(csv_error)
}

/// Sales history sheet, one row per sale.
pub fn sales_csv(sales: &[Sale], currency: Currency) -> CoreResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "sale_number",
            "date",
            "payment_method",
            "payment_status",
            "subtotal",
            "discount",
            "tax",
            "total",
            "amount_paid",
            "amount_remaining",
        ])
        .map_err(csv_error)?;

    for sale in sales {
        writer
            .write_record([
                sale.sale_number.clone(),
                sale.created_at.to_rfc3339(),
                sale.payment_method.as_str().to_string(),
                sale.payment_status.as_str().to_string(),
                currency.format_number(sale.subtotal),
                currency.format_number(sale.discount),
                currency.format_number(sale.tax),
                currency.format_number(sale.total),
                currency.format_number(sale.amount_paid),
                currency.format_number(sale.amount_remaining),
            ])
            .map_err(csv_error)?;
    }

    finish(writer)
}

/// Financial summary sheet, one `metric,value` row per figure.
pub fn financial_summary_csv(summary: &FinancialSummary, currency: Currency) -> CoreResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let rows = [
        ("period_start", summary.range.start.to_string()),
        ("period_end", summary.range.end.to_string()),
        ("currency", currency.code().to_string()),
        ("total_sales", currency.format_number(summary.total_sales)),
        (
            "total_purchase_cost",
            currency.format_number(summary.total_purchase_cost),
        ),
        ("total_expenses", currency.format_number(summary.total_expenses)),
        ("profit", currency.format_number(summary.profit)),
        ("sales_count", summary.sales_count.to_string()),
        ("expenses_count", summary.expenses_count.to_string()),
    ];

    writer.write_record(["metric", "value"]).map_err(csv_error)?;
    for (metric, value) in rows {
        writer
            .write_record([metric, value.as_str()])
            .map_err(csv_error)?;
    }

    finish(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{CostLine, DateRange};
    use crate::types::{PaymentMethod, PaymentStatus};
    use chrono::{NaiveDate, TimeZone};

    fn settings() -> StoreSettings {
        StoreSettings {
            store_name: "Boutique Awa".to_string(),
            phone: Some("+229 97 00 00 00".to_string()),
            ..StoreSettings::default_for("t1")
        }
    }

    fn sale() -> Sale {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 14, 5, 0).unwrap();
        Sale {
            id: "s1".to_string(),
            tenant_id: "t1".to_string(),
            sale_number: "SALE-20260301-0001".to_string(),
            customer_id: Some("c1".to_string()),
            cashier_id: None,
            subtotal: Money::from_minor(3000),
            tax: Money::zero(),
            discount: Money::zero(),
            total: Money::from_minor(3000),
            payment_method: PaymentMethod::Credit,
            payment_status: PaymentStatus::Partial,
            amount_paid: Money::from_minor(1000),
            amount_remaining: Money::from_minor(2000),
            notes: None,
            created_at: at,
            updated_at: at,
            sync_version: 1,
        }
    }

    fn item() -> SaleItem {
        SaleItem {
            id: "i1".to_string(),
            sale_id: "s1".to_string(),
            product_id: None,
            product_name: "Riz 5kg".to_string(),
            unit_price: Money::from_minor(1000),
            quantity: 3,
            subtotal: Money::from_minor(3000),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_invoice_contents() {
        let settings = settings();
        let sale = sale();
        let items = [item()];
        let text = Invoice {
            settings: &settings,
            sale: &sale,
            items: &items,
            payments: &[],
            customer_name: Some("Awa Koné"),
        }
        .render();

        assert!(text.contains("BOUTIQUE AWA"));
        assert!(text.contains("SALE-20260301-0001"));
        assert!(text.contains("01/03/2026 14:05"));
        assert!(text.contains("Awa Koné"));
        assert!(text.contains("  3 x 1000 FCFA"));
        assert!(text.contains("Reste à payer"));
        assert!(text.contains("2000 FCFA"));
        assert!(text.contains("Merci de votre visite !"));
        assert!(!text.contains("Remise"));
    }

    #[test]
    fn test_invoice_rows_fit_width() {
        let settings = settings();
        let sale = sale();
        let items = [item()];
        let text = Invoice {
            settings: &settings,
            sale: &sale,
            items: &items,
            payments: &[],
            customer_name: None,
        }
        .render();

        for line in text.lines().filter(|l| l.contains("FCFA")) {
            assert_eq!(line.chars().count(), INVOICE_WIDTH, "{:?}", line);
        }
    }

    #[test]
    fn test_sales_csv() {
        let csv = sales_csv(&[sale()], Currency::Ngn).unwrap();
        let mut lines = csv.lines();
        assert!(lines.next().unwrap().starts_with("sale_number,date,payment_method"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("SALE-20260301-0001,"));
        assert!(row.contains(",credit,partial,30.00,0.00,0.00,30.00,10.00,20.00"));
    }

    #[test]
    fn test_financial_summary_csv() {
        let d = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let summary = FinancialSummary::compute(
            DateRange::single_day(d),
            &[Money::from_minor(5000)],
            &[CostLine {
                quantity: 2,
                cost_price: Some(Money::from_minor(500)),
            }],
            &[Money::from_minor(1000)],
        );
        let csv = financial_summary_csv(&summary, Currency::Xof).unwrap();
        assert!(csv.contains("total_sales,5000"));
        assert!(csv.contains("profit,3000"));
        assert!(csv.contains("currency,XOF"));
    }
}
