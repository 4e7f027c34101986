//! # Demo Data
//!
//! A small grocery catalog and three loyalty customers, used by the `seed`
//! binary and by the terminal when `MARKET_SEED_DEMO` is set.

use market_core::{CoreResult, Customer, Money, Product, Store};

/// Demo catalog: (category, [(name, price in cents)])
pub const CATEGORIES: &[(&str, &[(&str, i64)])] = &[
    (
        "Beverages",
        &[
            ("Orange Juice 1L", 289),
            ("Sparkling Water 1.5L", 99),
            ("Cola 330ml", 129),
            ("Iced Tea 500ml", 149),
            ("Ground Coffee 500g", 1000),
        ],
    ),
    (
        "Dairy",
        &[
            ("Whole Milk 1L", 120),
            ("Greek Yogurt", 189),
            ("Cheddar Cheese 200g", 349),
            ("Butter 250g", 279),
            ("Eggs Dozen", 399),
        ],
    ),
    (
        "Bakery",
        &[
            ("White Bread", 199),
            ("Croissant", 109),
            ("Rye Bread", 259),
            ("Bagels 4-pack", 299),
        ],
    ),
    (
        "Grocery",
        &[
            ("Pasta Spaghetti 500g", 139),
            ("Basmati Rice 1kg", 329),
            ("Olive Oil 750ml", 799),
            ("Canned Tomatoes", 99),
            ("Peanut Butter", 359),
        ],
    ),
];

/// Demo loyalty customers: (name, surname, phone, email, points)
pub const CUSTOMERS: &[(&str, &str, &str, &str, i64)] = &[
    ("Ana", "Silva", "5551234", "ana.silva@example.com", 250),
    ("Bo", "Lee", "5550000", "bo.lee@example.com", 0),
    ("Chidi", "Okafor", "5559876", "chidi@example.com", 1200),
];

/// Builds the demo store in memory with `stock` units of every product.
///
/// Codes run `P001`, `P002`, ... in catalog order; every fifth product is on
/// the weekly offer.
pub fn demo_store(stock: i64) -> CoreResult<Store> {
    let mut store = Store::new();
    let mut seq = 0;

    for (category, products) in CATEGORIES {
        for (name, cents) in products.iter() {
            seq += 1;
            let code = format!("P{:03}", seq);
            let on_offer = seq % 5 == 0;
            store.add_product(
                Product::new(&code, name, category, Money::from_cents(*cents), on_offer)?,
                stock,
            )?;
        }
    }

    for (name, surname, phone, email, points) in CUSTOMERS {
        store.register_customer(Customer::restore(name, surname, phone, email, *points, Vec::new())?)?;
    }

    Ok(store)
}
