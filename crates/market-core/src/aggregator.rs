//! # Sales Aggregator
//!
//! Running totals over completed transactions for the current process.
//!
//! ```text
//! complete() ──► record(CompletedSale) ──┬── cashier_sales[cashier] += final
//!                                        ├── customers[phone].spent  += final
//!                                        │   customers[phone].earned += earned
//!                                        │   customers[phone].redeemed += used
//!                                        └── transaction_count += 1
//! ```
//!
//! Nothing here is persisted; a fresh aggregator starts empty on every run.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::money::Money;
use crate::types::CashierId;

/// Settlement figures of one completed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedSale {
    pub cashier: CashierId,
    pub customer_phone: Option<String>,
    pub final_amount: Money,
    pub points_earned: i64,
    pub points_redeemed: i64,
}

/// Cumulative activity of one customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerActivity {
    pub spent: Money,
    pub points_earned: i64,
    pub points_redeemed: i64,
    pub transactions: u64,
}

/// Accumulates completed sales. Updated once per completed session.
#[derive(Debug, Clone, Default)]
pub struct SalesAggregator {
    cashier_sales: BTreeMap<CashierId, Money>,
    customers: BTreeMap<String, CustomerActivity>,
    transaction_count: u64,
}

impl SalesAggregator {
    pub fn new() -> Self {
        SalesAggregator::default()
    }

    /// Adds one completed sale.
    pub fn record(&mut self, sale: CompletedSale) {
        *self
            .cashier_sales
            .entry(sale.cashier.clone())
            .or_insert_with(Money::zero) += sale.final_amount;

        if let Some(phone) = &sale.customer_phone {
            let activity = self.customers.entry(phone.clone()).or_default();
            activity.spent += sale.final_amount;
            activity.points_earned += sale.points_earned;
            activity.points_redeemed += sale.points_redeemed;
            activity.transactions += 1;
        }

        self.transaction_count += 1;
        debug!(
            cashier = %sale.cashier,
            amount = %sale.final_amount,
            transactions = self.transaction_count,
            "Sale recorded"
        );
    }

    /// Sales per cashier, ordered by cashier id.
    pub fn cashier_sales(&self) -> &BTreeMap<CashierId, Money> {
        &self.cashier_sales
    }

    /// Activity per customer phone.
    pub fn customer_activity(&self) -> &BTreeMap<String, CustomerActivity> {
        &self.customers
    }

    pub fn transaction_count(&self) -> u64 {
        self.transaction_count
    }

    /// Sum of all cashier sales.
    pub fn total_sales(&self) -> Money {
        self.cashier_sales.values().sum()
    }

    /// Point-in-time copy for display. Customer names are left empty; the
    /// store fills them in from its customer book.
    pub fn report(&self) -> SalesReport {
        SalesReport {
            cashiers: self
                .cashier_sales
                .iter()
                .map(|(cashier, total)| CashierSales {
                    cashier: cashier.clone(),
                    total: *total,
                })
                .collect(),
            customers: self
                .customers
                .iter()
                .map(|(phone, activity)| CustomerSummary {
                    phone: phone.clone(),
                    name: None,
                    activity: *activity,
                })
                .collect(),
            total_sales: self.total_sales(),
            transaction_count: self.transaction_count,
        }
    }
}

// =============================================================================
// Report
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashierSales {
    pub cashier: CashierId,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub phone: String,
    pub name: Option<String>,
    pub activity: CustomerActivity,
}

/// Snapshot of the aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub cashiers: Vec<CashierSales>,
    pub customers: Vec<CustomerSummary>,
    pub total_sales: Money,
    pub transaction_count: u64,
}

impl fmt::Display for SalesReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SALES BY CASHIER:")?;
        if self.cashiers.is_empty() {
            writeln!(f, "  No sales recorded")?;
        }
        for row in &self.cashiers {
            writeln!(f, "  {}: {}", row.cashier, row.total)?;
        }

        writeln!(f)?;
        writeln!(f, "CUSTOMER SPENDING AND POINTS:")?;
        if self.customers.is_empty() {
            writeln!(f, "  No customer activity")?;
        }
        for row in &self.customers {
            match &row.name {
                Some(name) => writeln!(f, "  {} (Phone: {})", name, row.phone)?,
                None => writeln!(f, "  Phone: {}", row.phone)?,
            }
            writeln!(f, "    Total spent: {}", row.activity.spent)?;
            writeln!(f, "    Points earned: {}", row.activity.points_earned)?;
            writeln!(f, "    Points redeemed: {}", row.activity.points_redeemed)?;
        }

        writeln!(f)?;
        writeln!(f, "SUMMARY STATISTICS:")?;
        writeln!(f, "  Total Sales: {}", self.total_sales)?;
        write!(f, "  Total Transactions: {}", self.transaction_count)
    }
}
