//! # Receipt
//!
//! Printable summary of a completed cart session.
//!
//! ## Layout
//! ```text
//! ┌───────────────────────────────────────────┐
//! │ Receipt 1f0c…                             │
//! │ Cashier: C1                               │
//! │ Customer: Ana Silva (5551234)             │
//! │-------------------------------------------│
//! │ Coffee            3 x 9.00   = 27.00      │  one line per (code, unit price),
//! │ Milk              2 x 2.50   =  5.00      │  in order of first appearance
//! │-------------------------------------------│
//! │ Subtotal:          35.00                  │
//! │ Offer discount:    -3.00                  │
//! │ Loyalty discount:  -2.00                  │
//! │ TOTAL:             30.00                  │
//! │ Points earned: 30   Balance: 80           │
//! └───────────────────────────────────────────┘
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;
use crate::session::CartSession;
use crate::types::CashierId;

/// One product on the receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    pub code: String,
    pub name: String,
    pub quantity: i64,
    /// Price locked in when the cart lines were added.
    pub unit_price: Money,
    /// Sum of the cart lines' totals for this code at this price.
    pub line_total: Money,
}

/// Customer section of the receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptCustomer {
    pub phone: String,
    pub name: String,
    pub points_redeemed: i64,
    pub points_earned: i64,
    /// Balance after this transaction settled.
    pub points_balance: Option<i64>,
}

/// A completed transaction, ready to print or serialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub session_id: Uuid,
    pub cashier: Option<CashierId>,
    pub customer: Option<ReceiptCustomer>,
    pub lines: Vec<ReceiptLine>,
    pub subtotal: Money,
    pub offer_discount: Money,
    pub loyalty_discount: Money,
    pub total_discount: Money,
    pub final_total: Money,
    pub issued_at: DateTime<Utc>,
}

/// Renders a session into a [`Receipt`]. Pure: the same session and
/// settlement figures always give the same receipt.
#[derive(Debug, Clone)]
pub struct ReceiptBuilder<'a> {
    session: &'a CartSession,
    points_earned: i64,
    points_balance: Option<i64>,
}

impl<'a> ReceiptBuilder<'a> {
    pub fn new(session: &'a CartSession) -> Self {
        ReceiptBuilder {
            session,
            points_earned: 0,
            points_balance: None,
        }
    }

    /// Points accrued at settlement and the resulting balance.
    pub fn loyalty(mut self, points_earned: i64, points_balance: Option<i64>) -> Self {
        self.points_earned = points_earned;
        self.points_balance = points_balance;
        self
    }

    pub fn build(self) -> Receipt {
        let session = self.session;

        let mut lines: Vec<ReceiptLine> = Vec::new();
        for cart_line in session.lines() {
            match lines
                .iter_mut()
                .find(|l| l.code == cart_line.code && l.unit_price == cart_line.unit_price)
            {
                Some(line) => {
                    line.quantity += cart_line.quantity;
                    line.line_total += cart_line.line_total();
                }
                None => lines.push(ReceiptLine {
                    code: cart_line.code.clone(),
                    name: cart_line.name.clone(),
                    quantity: cart_line.quantity,
                    unit_price: cart_line.unit_price,
                    line_total: cart_line.line_total(),
                }),
            }
        }

        let customer = session.customer().map(|bound| ReceiptCustomer {
            phone: bound.phone.clone(),
            name: bound.name.clone(),
            points_redeemed: session.points_redeemed(),
            points_earned: self.points_earned,
            points_balance: self.points_balance,
        });

        let totals = session.totals();
        Receipt {
            session_id: session.id(),
            cashier: session.cashier().cloned(),
            customer,
            lines,
            subtotal: totals.subtotal,
            offer_discount: totals.offer_discount,
            loyalty_discount: totals.loyalty_discount,
            total_discount: totals.discount,
            final_total: totals.final_amount,
            issued_at: session
                .closed_at()
                .or_else(|| session.opened_at())
                .unwrap_or_default(),
        }
    }
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const RULE: &str = "-------------------------------------------";

        writeln!(f, "Receipt {}", self.session_id)?;
        writeln!(f, "Date: {}", self.issued_at.format("%Y-%m-%d %H:%M"))?;
        if let Some(cashier) = &self.cashier {
            writeln!(f, "Cashier: {}", cashier)?;
        }
        if let Some(customer) = &self.customer {
            writeln!(f, "Customer: {} ({})", customer.name, customer.phone)?;
        }
        writeln!(f, "{}", RULE)?;

        for line in &self.lines {
            writeln!(
                f,
                "{:<20} {:>3} x {:>8} = {:>9}",
                line.name,
                line.quantity,
                line.unit_price.to_string(),
                line.line_total.to_string()
            )?;
        }

        writeln!(f, "{}", RULE)?;
        writeln!(f, "Subtotal:         {:>10}", self.subtotal.to_string())?;
        if !self.offer_discount.is_zero() {
            writeln!(f, "Offer discount:   {:>10}", format!("-{}", self.offer_discount))?;
        }
        if !self.loyalty_discount.is_zero() {
            writeln!(f, "Loyalty discount: {:>10}", format!("-{}", self.loyalty_discount))?;
        }
        write!(f, "TOTAL:            {:>10}", self.final_total.to_string())?;

        if let Some(customer) = &self.customer {
            writeln!(f)?;
            if customer.points_redeemed > 0 {
                writeln!(f, "Points redeemed: {}", customer.points_redeemed)?;
            }
            write!(f, "Points earned: {}", customer.points_earned)?;
            if let Some(balance) = customer.points_balance {
                write!(f, "   Balance: {}", balance)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, CustomerBook};
    use crate::inventory::InventoryLedger;
    use crate::types::{Customer, Product};

    fn session_with_lines() -> CartSession {
        let mut catalog = Catalog::new();
        catalog
            .insert(Product::new("P001", "Coffee", "Grocery", Money::from_cents(1000), true).unwrap())
            .unwrap();
        catalog
            .insert(Product::new("P002", "Milk", "Dairy", Money::from_cents(250), false).unwrap())
            .unwrap();
        let mut ledger =
            InventoryLedger::from_entries([("P001".to_string(), 10), ("P002".to_string(), 10)])
                .unwrap();
        let mut customers = CustomerBook::new();
        customers
            .register(Customer::new("Ana", "Silva", "5551234", "ana@example.com").unwrap())
            .unwrap();

        let mut session = CartSession::new();
        session.start(CashierId::new("C1")).unwrap();
        session.add_item(&catalog, &mut ledger, "P002", 1).unwrap();
        session.add_item(&catalog, &mut ledger, "P001", 2).unwrap();
        session.add_item(&catalog, &mut ledger, "P002", 1).unwrap();
        session.add_item(&catalog, &mut ledger, "P001", 1).unwrap();
        session.set_customer(&customers, "5551234").unwrap();
        session
    }

    #[test]
    fn test_lines_grouped_by_code_in_first_appearance_order() {
        let receipt = ReceiptBuilder::new(&session_with_lines()).build();

        assert_eq!(receipt.lines.len(), 2);
        assert_eq!(receipt.lines[0].code, "P002");
        assert_eq!(receipt.lines[0].quantity, 2);
        assert_eq!(receipt.lines[0].line_total.cents(), 500);
        assert_eq!(receipt.lines[1].code, "P001");
        assert_eq!(receipt.lines[1].quantity, 3);
        assert_eq!(receipt.lines[1].unit_price.cents(), 900);
        assert_eq!(receipt.lines[1].line_total.cents(), 2700);
    }

    #[test]
    fn test_price_change_mid_session_splits_line() {
        let mut catalog = Catalog::new();
        catalog
            .insert(Product::new("P002", "Milk", "Dairy", Money::from_cents(250), false).unwrap())
            .unwrap();
        let mut ledger = InventoryLedger::from_entries([("P002".to_string(), 10)]).unwrap();

        let mut session = CartSession::new();
        session.start(CashierId::new("C1")).unwrap();
        session.add_item(&catalog, &mut ledger, "P002", 1).unwrap();
        catalog.set_weekly_offer("P002", true).unwrap();
        session.add_item(&catalog, &mut ledger, "P002", 1).unwrap();
        session.add_item(&catalog, &mut ledger, "P002", 2).unwrap();

        let receipt = ReceiptBuilder::new(&session).build();

        assert_eq!(receipt.lines.len(), 2);
        assert_eq!(receipt.lines[0].unit_price.cents(), 250);
        assert_eq!(receipt.lines[0].quantity, 1);
        assert_eq!(receipt.lines[1].unit_price.cents(), 225);
        assert_eq!(receipt.lines[1].quantity, 3);
        for line in &receipt.lines {
            assert_eq!(line.unit_price * line.quantity, line.line_total);
        }
        let lines_total: Money = receipt.lines.iter().map(|l| l.line_total).sum();
        assert_eq!(lines_total, receipt.final_total);
    }

    #[test]
    fn test_totals_and_customer() {
        let receipt = ReceiptBuilder::new(&session_with_lines())
            .loyalty(32, Some(32))
            .build();

        assert_eq!(receipt.subtotal.cents(), 3500);
        assert_eq!(receipt.total_discount.cents(), 300);
        assert_eq!(receipt.final_total.cents(), 3200);

        let customer = receipt.customer.as_ref().unwrap();
        assert_eq!(customer.name, "Ana Silva");
        assert_eq!(customer.points_earned, 32);
        assert_eq!(customer.points_balance, Some(32));
    }

    #[test]
    fn test_build_is_deterministic() {
        let session = session_with_lines();
        assert_eq!(
            ReceiptBuilder::new(&session).build(),
            ReceiptBuilder::new(&session).build()
        );
    }

    #[test]
    fn test_display_and_json() {
        let receipt = ReceiptBuilder::new(&session_with_lines()).build();

        let text = receipt.to_string();
        assert!(text.contains("Cashier: C1"));
        assert!(text.contains("Customer: Ana Silva (5551234)"));
        assert!(text.contains("Coffee"));
        assert!(text.contains("Offer discount:"));
        assert!(text.contains("32.00"));

        let json = serde_json::to_value(&receipt).unwrap();
        assert_eq!(json["lines"][1]["code"], "P001");
        assert!(json.get("finalTotal").is_some());
    }
}
