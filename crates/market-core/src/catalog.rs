//! # Catalog & Customer Directory
//!
//! Lookup seams the checkout flow depends on, with in-memory
//! implementations.
//!
//! ## Repository Objects
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CartSession                                                           │
//! │     │ lookup(code)                 │ lookup(phone) / lookup_mut(phone) │
//! │     ▼                              ▼                                   │
//! │  trait ProductCatalog          trait CustomerDirectory                 │
//! │     ▲                              ▲                                   │
//! │     │ impl                         │ impl                              │
//! │  Catalog (BTreeMap)            CustomerBook (BTreeMap)                 │
//! │     ▲                              ▲                                   │
//! │     └──── loaded by market-db at startup, saved at shutdown ───┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use tracing::info;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Customer, Product};

// =============================================================================
// Traits
// =============================================================================

/// Product lookup by code.
pub trait ProductCatalog {
    fn lookup(&self, code: &str) -> Option<&Product>;
}

/// Customer lookup by phone number.
///
/// `lookup_mut` exists for the checkout flow, which redeems and accrues
/// points and appends history records.
pub trait CustomerDirectory {
    fn lookup(&self, phone: &str) -> Option<&Customer>;

    fn lookup_mut(&mut self, phone: &str) -> Option<&mut Customer>;
}

// =============================================================================
// Catalog
// =============================================================================

/// In-memory product catalog ordered by code.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: BTreeMap<String, Product>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog::default()
    }

    /// Adds a product. Codes are unique.
    pub fn insert(&mut self, product: Product) -> CoreResult<()> {
        if self.products.contains_key(product.code()) {
            return Err(ValidationError::Duplicate {
                field: "code".to_string(),
                value: product.code().to_string(),
            }
            .into());
        }

        info!(code = %product.code(), name = %product.name(), "Product added to catalog");
        self.products.insert(product.code().to_string(), product);
        Ok(())
    }

    /// Changes a product's base price. Lines already in carts keep the price
    /// they were added at.
    pub fn set_base_price(&mut self, code: &str, price: Money) -> CoreResult<()> {
        let product = self.get_mut(code)?;
        product.set_base_price(price)?;
        info!(code = %code, price = %price, "Base price changed");
        Ok(())
    }

    /// Turns the weekly offer on or off for a product.
    pub fn set_weekly_offer(&mut self, code: &str, on_offer: bool) -> CoreResult<()> {
        self.get_mut(code)?.set_weekly_offer(on_offer);
        info!(code = %code, on_offer, "Weekly offer changed");
        Ok(())
    }

    /// Removes a product, returning it.
    pub fn remove(&mut self, code: &str) -> CoreResult<Product> {
        self.products
            .remove(code)
            .ok_or_else(|| CoreError::ProductNotFound(code.to_string()))
    }

    /// Products in a category (case-insensitive), ordered by code.
    pub fn by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Product> {
        self.products
            .values()
            .filter(move |p| p.category().eq_ignore_ascii_case(category))
    }

    /// All products ordered by code.
    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    fn get_mut(&mut self, code: &str) -> CoreResult<&mut Product> {
        self.products
            .get_mut(code)
            .ok_or_else(|| CoreError::ProductNotFound(code.to_string()))
    }
}

impl ProductCatalog for Catalog {
    fn lookup(&self, code: &str) -> Option<&Product> {
        self.products.get(code.trim())
    }
}

// =============================================================================
// Customer Book
// =============================================================================

/// In-memory customer directory keyed by phone.
#[derive(Debug, Clone, Default)]
pub struct CustomerBook {
    customers: BTreeMap<String, Customer>,
}

impl CustomerBook {
    pub fn new() -> Self {
        CustomerBook::default()
    }

    /// Registers a customer. Phone numbers are unique.
    pub fn register(&mut self, customer: Customer) -> CoreResult<()> {
        if self.customers.contains_key(customer.phone()) {
            return Err(ValidationError::Duplicate {
                field: "phone".to_string(),
                value: customer.phone().to_string(),
            }
            .into());
        }

        info!(phone = %customer.phone(), "Customer registered");
        self.customers.insert(customer.phone().to_string(), customer);
        Ok(())
    }

    /// All customers ordered by phone.
    pub fn iter(&self) -> impl Iterator<Item = &Customer> {
        self.customers.values()
    }

    pub fn len(&self) -> usize {
        self.customers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }
}

impl CustomerDirectory for CustomerBook {
    fn lookup(&self, phone: &str) -> Option<&Customer> {
        self.customers.get(phone.trim())
    }

    fn lookup_mut(&mut self, phone: &str) -> Option<&mut Customer> {
        self.customers.get_mut(phone.trim())
    }
}
