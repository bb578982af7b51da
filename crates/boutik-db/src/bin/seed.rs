//! # Demo Store Seeder
//!
//! Populates a database with a small West African grocery for development
//! and demos.
//!
//! ## Usage
//! ```bash
//! # Seed the database from BOUTIK_DB_PATH (default ./boutik.db)
//! cargo run -p boutik-db --bin seed
//!
//! # Specify database path
//! cargo run -p boutik-db --bin seed -- --db ./data/demo.db
//! ```
//!
//! ## What Gets Created
//! - Store settings (currency from `BOUTIK_CURRENCY`)
//! - Three categories and one supplier
//! - A dozen products with cost prices and opening stock
//! - Two customers, one carrying a credit balance
//! - A handful of sales (cash, mobile money, credit) and one repayment
//! - Two expenses, the plan catalog and a trial subscription
//!
//! Nothing is written when the tenant already has products.

use std::env;

use boutik_core::settlement::{CheckoutLine, CheckoutRequest, PaymentRequest};
use boutik_core::{
    CategoryType, Money, NewCategory, NewCustomer, NewExpense, NewProduct, NewSupplier,
    PaymentMethod, Product, StoreSettings, SubscriptionPlan,
};
use boutik_db::{init_tracing, Database, StoreConfig};
use chrono::Utc;
use tracing::{info, warn};

/// (category index, name, sku, price, cost, opening stock)
const PRODUCTS: &[(usize, &str, &str, i64, i64, i64)] = &[
    (0, "Riz parfumé 5kg", "EPI-RIZ-5", 4500, 3800, 40),
    (0, "Huile d'arachide 1L", "EPI-HUI-1", 1500, 1200, 25),
    (0, "Sucre en poudre 1kg", "EPI-SUC-1", 800, 650, 30),
    (0, "Lait concentré", "EPI-LAI-C", 600, 450, 48),
    (0, "Cube Maggi (boîte)", "EPI-MAG-B", 1250, 1000, 12),
    (0, "Sel iodé 500g", "EPI-SEL-5", 200, 120, 8),
    (1, "Eau minérale 1.5L", "BOI-EAU-15", 400, 300, 60),
    (1, "Bissap 50cl", "BOI-BIS-50", 300, 150, 24),
    (1, "Jus de gingembre 50cl", "BOI-GIN-50", 350, 180, 6),
    (2, "Savon de Marseille", "HYG-SAV-M", 250, 180, 50),
    (2, "Pâte dentifrice", "HYG-DEN-1", 700, 520, 15),
    (2, "Lessive 1kg", "HYG-LES-1", 1100, 900, 20),
];

const PLANS: &[(&str, &str, i64, i64)] = &[
    ("monthly", "Mensuel", 5_000, 30),
    ("quarterly", "Trimestriel", 13_500, 90),
    ("yearly", "Annuel", 50_000, 365),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let mut config = StoreConfig::load()?;

    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.database_path = args[i + 1].clone().into();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Boutik POS demo store seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: $BOUTIK_DB_PATH or ./boutik.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => warn!(arg = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    info!(path = %config.database_path.display(), tenant = %config.tenant_id, "Seeding database");

    let db = Database::new(config.to_db_config())
        .await?
        .with_checkout_policy(config.checkout_policy());
    let tenant = config.tenant_id.as_str();

    let existing = db.products(tenant).count().await?;
    if existing > 0 {
        warn!(existing, "Tenant already has products, skipping seed");
        return Ok(());
    }

    // Store
    let settings = StoreSettings {
        store_name: "Boutique Chez Awa".to_string(),
        address: Some("Marché Dantokpa, Cotonou".to_string()),
        phone: Some("+229 97 12 34 56".to_string()),
        currency: config.currency,
        receipt_footer: Some("Merci et à bientôt !".to_string()),
        ..StoreSettings::default_for(tenant)
    };
    db.settings(tenant).save(&settings).await?;

    // Catalog
    let mut categories = Vec::new();
    for (name, color) in [("Épicerie", "#E67E22"), ("Boissons", "#3498DB"), ("Hygiène", "#2ECC71")] {
        let category = db
            .categories(tenant)
            .insert(&NewCategory {
                name: name.to_string(),
                color: Some(color.to_string()),
                category_type: CategoryType::Product,
                ..NewCategory::default()
            })
            .await?;
        categories.push(category);
    }

    let supplier = db
        .suppliers(tenant)
        .insert(&NewSupplier {
            name: "Grossiste Dantokpa".to_string(),
            contact_person: Some("Mme Adjovi".to_string()),
            phone: Some("+229 96 00 11 22".to_string()),
            ..NewSupplier::default()
        })
        .await?;

    let mut products: Vec<Product> = Vec::with_capacity(PRODUCTS.len());
    for (category, name, sku, price, cost, stock) in PRODUCTS {
        let product = db
            .products(tenant)
            .insert(&NewProduct {
                name: name.to_string(),
                sku: Some(sku.to_string()),
                category_id: Some(categories[*category].id.clone()),
                supplier_id: Some(supplier.id.clone()),
                price: Money::from_minor(*price),
                cost_price: Some(Money::from_minor(*cost)),
                stock_quantity: *stock,
                ..NewProduct::default()
            })
            .await?;
        products.push(product);
    }
    info!(count = products.len(), "Catalog created");

    // Customers
    let awa = db
        .customers(tenant)
        .insert(&NewCustomer {
            name: "Awa Koné".to_string(),
            phone: Some("+229 97 55 44 33".to_string()),
            credit_limit: Money::from_minor(50_000),
            ..NewCustomer::default()
        })
        .await?;
    db.customers(tenant)
        .insert(&NewCustomer {
            name: "Moussa Traoré".to_string(),
            phone: Some("+229 66 77 88 99".to_string()),
            ..NewCustomer::default()
        })
        .await?;

    // Sales
    let line = |index: usize, quantity: i64| CheckoutLine {
        product_id: products[index].id.clone(),
        unit_price: products[index].price,
        quantity,
    };

    let sales = db.sales(tenant);
    sales
        .record_sale(
            &CheckoutRequest::new(vec![line(0, 1), line(1, 2)], PaymentMethod::Cash)
                .with_tendered(Money::from_minor(10_000)),
        )
        .await?;
    sales
        .record_sale(&CheckoutRequest::new(
            vec![line(6, 6), line(9, 4)],
            PaymentMethod::MtnMoney,
        ))
        .await?;
    let credit = sales
        .record_sale(
            &CheckoutRequest::new(vec![line(0, 2), line(2, 3), line(11, 1)], PaymentMethod::Credit)
                .with_customer(awa.id.clone()),
        )
        .await?;

    let mut repayment = PaymentRequest::new(
        &credit.sale_id,
        Money::from_minor(5_000),
        PaymentMethod::OrangeMoney,
    );
    repayment.notes = Some("Premier versement".to_string());
    db.payments(tenant).apply_payment(&repayment).await?;

    // Expenses
    let today = Utc::now().date_naive();
    for (description, amount, category) in [("Transport marchandises", 2_500, "Transport"), ("Électricité", 7_000, "Charges")] {
        db.expenses(tenant)
            .insert(&NewExpense {
                date: today,
                description: description.to_string(),
                amount: Money::from_minor(amount),
                category: Some(category.to_string()),
                receipt_url: None,
            })
            .await?;
    }

    // Subscription
    for (id, name, price, days) in PLANS {
        db.plans()
            .upsert(&SubscriptionPlan {
                id: id.to_string(),
                name: name.to_string(),
                description: None,
                price: Money::from_minor(*price),
                duration_days: *days,
                features: vec!["pos".to_string(), "reports".to_string(), "credit".to_string()],
                is_active: true,
            })
            .await?;
    }
    if db.subscriptions(tenant).get().await?.is_none() {
        db.subscriptions(tenant).start_trial(None).await?;
    }

    let dashboard = db.reports(tenant).dashboard().await?;
    let awa = db.customers(tenant).reconcile_credit(&awa.id).await?;
    info!(
        sales = dashboard.today_sales_count,
        revenue = %config.currency.format(dashboard.today_sales),
        low_stock = dashboard.low_stock_count,
        awa_owes = %config.currency.format(awa.current_credit),
        "Seed complete"
    );

    db.close().await;
    Ok(())
}
