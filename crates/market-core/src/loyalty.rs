//! # Loyalty Account
//!
//! Integer point balance for a customer.
//!
//! ## Exchange Rates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  REDEEM:  100 points  → 1.00 discount                                  │
//! │           max_discount = floor(balance / 100) whole units              │
//! │           discount     = min(cart_amount, max_discount)                │
//! │           consumed     = discount in cents (= discount x 100 points)   │
//! │                                                                         │
//! │  ACCRUE:  1.00 spent  → 1 point      points = floor(amount)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Redemption deducts immediately, not at completion. Since the discount is
//! capped by `balance / 100`, the balance can never go negative.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;

/// Points redeemed for one currency unit of discount.
pub const POINTS_PER_UNIT: i64 = 100;

/// Outcome of a redemption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Redemption {
    /// Discount granted against the cart.
    pub discount: Money,
    /// Points taken from the balance.
    pub points_consumed: i64,
}

impl Redemption {
    /// A redemption that granted nothing.
    pub const fn none() -> Self {
        Redemption {
            discount: Money::zero(),
            points_consumed: 0,
        }
    }
}

/// A customer's loyalty point balance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyAccount {
    balance: i64,
}

impl LoyaltyAccount {
    /// Opens an account with a zero balance.
    pub fn new() -> Self {
        LoyaltyAccount::default()
    }

    /// Opens an account with an existing balance (loaded from storage).
    pub fn with_balance(balance: i64) -> CoreResult<Self> {
        if balance < 0 {
            return Err(ValidationError::OutOfRange {
                field: "points".to_string(),
                min: 0,
                max: i64::MAX,
            }
            .into());
        }
        Ok(LoyaltyAccount { balance })
    }

    pub fn balance(&self) -> i64 {
        self.balance
    }

    /// Largest discount the balance can pay for: `floor(balance / 100)`
    /// whole units.
    pub fn max_discount(&self) -> Money {
        Money::from_whole_units(self.balance / POINTS_PER_UNIT)
    }

    /// Redeems as many points as possible against `cart_amount`.
    ///
    /// The discount is `min(cart_amount, max_discount)` and the points are
    /// deducted right away. A non-positive cart amount redeems nothing.
    ///
    /// ## Example
    /// ```rust
    /// use market_core::loyalty::LoyaltyAccount;
    /// use market_core::money::Money;
    ///
    /// let mut account = LoyaltyAccount::with_balance(250).unwrap();
    /// let redemption = account.redeem(Money::from_cents(5000));
    ///
    /// assert_eq!(redemption.discount.cents(), 200);
    /// assert_eq!(redemption.points_consumed, 200);
    /// assert_eq!(account.balance(), 50);
    /// ```
    pub fn redeem(&mut self, cart_amount: Money) -> Redemption {
        if !cart_amount.is_positive() {
            return Redemption::none();
        }

        let discount = cart_amount.min(self.max_discount());
        // One point per cent of discount
        let points_consumed = discount.cents();
        self.balance -= points_consumed;

        debug!(
            discount = %discount,
            points_consumed,
            balance = self.balance,
            "Loyalty points redeemed"
        );

        Redemption {
            discount,
            points_consumed,
        }
    }

    /// Adds `floor(amount)` points and returns how many were added.
    ///
    /// Negative amounts earn nothing.
    pub fn accrue(&mut self, amount: Money) -> i64 {
        let earned = amount.whole_units().max(0);
        self.balance += earned;
        debug!(earned, balance = self.balance, "Loyalty points accrued");
        earned
    }

    /// Returns points taken by a redemption that was rolled back.
    pub(crate) fn refund(&mut self, points: i64) {
        self.balance += points.max(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_discount_truncates() {
        assert_eq!(LoyaltyAccount::with_balance(250).unwrap().max_discount().cents(), 200);
        assert_eq!(LoyaltyAccount::with_balance(99).unwrap().max_discount().cents(), 0);
        assert_eq!(LoyaltyAccount::new().max_discount().cents(), 0);
    }

    #[test]
    fn test_redeem_capped_by_balance() {
        let mut account = LoyaltyAccount::with_balance(250).unwrap();
        let redemption = account.redeem(Money::from_cents(5000));

        assert_eq!(redemption.discount.cents(), 200);
        assert_eq!(redemption.points_consumed, 200);
        assert_eq!(account.balance(), 50);
    }

    #[test]
    fn test_redeem_capped_by_cart_amount() {
        let mut account = LoyaltyAccount::with_balance(1000).unwrap();
        let redemption = account.redeem(Money::from_cents(150));

        assert_eq!(redemption.discount.cents(), 150);
        assert_eq!(redemption.points_consumed, 150);
        assert_eq!(account.balance(), 850);
    }

    #[test]
    fn test_redeem_with_insufficient_points() {
        let mut account = LoyaltyAccount::with_balance(99).unwrap();
        assert_eq!(account.redeem(Money::from_cents(5000)), Redemption::none());
        assert_eq!(account.balance(), 99);
    }

    #[test]
    fn test_redeem_empty_cart() {
        let mut account = LoyaltyAccount::with_balance(500).unwrap();
        assert_eq!(account.redeem(Money::zero()), Redemption::none());
        assert_eq!(account.balance(), 500);
    }

    #[test]
    fn test_accrue_floors_amount() {
        let mut account = LoyaltyAccount::with_balance(50).unwrap();
        assert_eq!(account.accrue(Money::from_cents(4899)), 48);
        assert_eq!(account.balance(), 98);

        assert_eq!(account.accrue(Money::from_cents(-500)), 0);
        assert_eq!(account.balance(), 98);
    }

    #[test]
    fn test_refund_restores_balance() {
        let mut account = LoyaltyAccount::with_balance(250).unwrap();
        let redemption = account.redeem(Money::from_cents(5000));
        account.refund(redemption.points_consumed);
        assert_eq!(account.balance(), 250);
    }

    #[test]
    fn test_negative_balance_rejected() {
        assert!(LoyaltyAccount::with_balance(-1).is_err());
    }
}
