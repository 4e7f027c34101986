//! # Pricing Engine
//!
//! Stateless price math for cart lines.
//!
//! ## Weekly Offer
//! ```text
//! base 10.00, offer on
//!      │
//!      ▼
//! unit_price = base - 10%  = 9.00
//!      │
//!      ▼  qty 3
//! line_total     = 27.00
//! base_total     = 30.00
//! offer_discount =  3.00
//! ```

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::Product;

/// Weekly offer discount in basis points (1000 = 10%).
pub const WEEKLY_OFFER_DISCOUNT_BPS: u32 = 1000;

/// Price breakdown for `quantity` units of one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinePrice {
    pub unit_price: Money,
    pub base_total: Money,
    pub line_total: Money,
    pub offer_discount: Money,
}

/// Computes unit and line prices from a product's offer status.
#[derive(Debug, Clone, Copy, Default)]
pub struct PricingEngine;

impl PricingEngine {
    /// Current unit price: base price, less the weekly offer when active.
    pub fn unit_price(product: &Product) -> Money {
        Self::offer_price(product.base_price(), product.is_on_weekly_offer())
    }

    /// Unit price for a given base price and offer flag.
    pub fn offer_price(base_price: Money, on_offer: bool) -> Money {
        if on_offer {
            base_price.apply_percentage_discount(WEEKLY_OFFER_DISCOUNT_BPS)
        } else {
            base_price
        }
    }

    /// Prices `quantity` units at the product's current price.
    pub fn price_line(product: &Product, quantity: i64) -> LinePrice {
        let unit_price = Self::unit_price(product);
        let base_total = product.base_price() * quantity;
        let line_total = unit_price * quantity;

        LinePrice {
            unit_price,
            base_total,
            line_total,
            offer_discount: base_total - line_total,
        }
    }
}
