//! End-to-end settlement scenarios through the checkout lane API.

use market_core::{
    CartSession, Catalog, CashierId, CheckoutLane, CoreError, Customer, CustomerBook,
    CustomerDirectory, InventoryLedger, Money, Product, SessionState, SharedStore,
    Store,
};

fn store_with(products: &[(&str, i64, bool, i64)], customers: &[(&str, i64)]) -> SharedStore {
    let mut store = Store::new();
    for (code, cents, offer, stock) in products {
        store
            .add_product(
                Product::new(code, &format!("Item {}", code), "General", Money::from_cents(*cents), *offer)
                    .unwrap(),
                *stock,
            )
            .unwrap();
    }
    for (phone, points) in customers {
        store
            .register_customer(
                Customer::restore("Test", "Customer", phone, "test@example.com", *points, Vec::new())
                    .unwrap(),
            )
            .unwrap();
    }
    SharedStore::new(store)
}

#[test]
fn scenario_a_weekly_offer_line() {
    let store = store_with(&[("P001", 1000, true, 10)], &[]);
    let mut lane = CheckoutLane::new(store);
    lane.start_transaction(CashierId::new("C1")).unwrap();

    let line = lane.add_item("P001", 3).unwrap();
    assert_eq!(line.unit_price.cents(), 900);
    assert_eq!(line.line_total().cents(), 2700);

    let totals = lane.current_totals();
    assert_eq!(totals.offer_discount.cents(), 300);
    assert_eq!(totals.subtotal.cents(), 3000);
    assert_eq!(totals.amount.cents(), 2700);
}

#[test]
fn scenario_b_redeem_then_accrue() {
    let store = store_with(&[("P001", 1000, false, 10)], &[("5551234", 250)]);
    let mut lane = CheckoutLane::new(store.clone());
    lane.start_transaction(CashierId::new("C1")).unwrap();
    lane.add_item("P001", 5).unwrap();
    lane.set_customer("5551234").unwrap();

    let redemption = lane.apply_loyalty_redemption(true).unwrap();
    assert_eq!(redemption.discount.cents(), 200);
    assert_eq!(redemption.points_consumed, 200);
    assert_eq!(
        store.with_store(|s| s.customers().lookup("5551234").unwrap().points()),
        50
    );

    let receipt = lane.complete_transaction().unwrap();
    assert_eq!(receipt.final_total.cents(), 4800);

    store.with_store(|s| {
        let customer = s.customers().lookup("5551234").unwrap();
        assert_eq!(customer.points(), 98);
        assert_eq!(customer.history().len(), 1);
        assert_eq!(customer.history()[0].amount().cents(), 4800);

        let activity = s.aggregator().customer_activity()["5551234"];
        assert_eq!(activity.spent.cents(), 4800);
        assert_eq!(activity.points_earned, 48);
        assert_eq!(activity.points_redeemed, 200);
    });
}

#[test]
fn scenario_c_unknown_product() {
    let store = store_with(&[("P001", 1000, false, 10)], &[]);
    let mut lane = CheckoutLane::new(store);
    lane.start_transaction(CashierId::new("C1")).unwrap();
    lane.add_item("P001", 1).unwrap();
    let before = lane.current_totals();

    assert!(matches!(lane.add_item("ZZZ", 1), Err(CoreError::ProductNotFound(code)) if code == "ZZZ"));
    assert_eq!(lane.current_session().state(), SessionState::Open);
    assert_eq!(lane.current_totals(), before);
}

#[test]
fn scenario_d_cancel_restores_stock() {
    let store = store_with(&[("P001", 1000, false, 2)], &[]);
    let mut lane = CheckoutLane::new(store.clone());
    lane.start_transaction(CashierId::new("C1")).unwrap();
    lane.add_item("P001", 2).unwrap();
    assert_eq!(store.with_store(|s| s.ledger().quantity_of("P001")), 0);

    lane.cancel_transaction().unwrap();

    assert_eq!(store.with_store(|s| s.ledger().quantity_of("P001")), 2);
    assert_eq!(store.with_store(|s| s.aggregator().transaction_count()), 0);
}

#[test]
fn add_then_cancel_restores_every_code() {
    let mut catalog = Catalog::new();
    let mut initial = Vec::new();
    for (i, stock) in [7_i64, 3, 12, 1].iter().enumerate() {
        let code = format!("C{:03}", i);
        catalog
            .insert(Product::new(&code, "Item", "General", Money::from_cents(199 + i as i64), i % 2 == 0).unwrap())
            .unwrap();
        initial.push((code, *stock));
    }
    let mut ledger = InventoryLedger::from_entries(initial.clone()).unwrap();
    let mut customers = CustomerBook::new();

    let mut session = CartSession::new();
    session.start(CashierId::new("C1")).unwrap();
    let adds = [("C000", 2), ("C001", 3), ("C000", 5), ("C002", 4), ("C003", 2), ("C002", 8)];
    for (code, qty) in adds {
        // Some of these exceed stock; failures must leave the ledger alone
        let _ = session.add_item(&catalog, &mut ledger, code, qty);
    }
    session.cancel(&mut ledger, &mut customers).unwrap();

    for (code, stock) in initial {
        assert_eq!(ledger.quantity_of(&code), stock, "stock for {}", code);
    }
}

#[test]
fn insufficient_stock_leaves_ledger_unchanged() {
    let store = store_with(&[("P001", 500, false, 4)], &[]);
    let mut lane = CheckoutLane::new(store.clone());
    lane.start_transaction(CashierId::new("C1")).unwrap();
    lane.add_item("P001", 3).unwrap();

    let err = lane.add_item("P001", 2).unwrap_err();
    assert!(matches!(
        err,
        CoreError::InsufficientStock { available: 1, requested: 2, .. }
    ));
    assert_eq!(store.with_store(|s| s.ledger().quantity_of("P001")), 1);
    assert_eq!(lane.current_session().lines().len(), 1);
}

#[test]
fn loyalty_discount_never_exceeds_amount_or_balance() {
    let cases = [(250, 5000), (10_000, 150), (99, 2000), (1_234, 799)];
    for (points, price) in cases {
        let store = store_with(&[("P001", price, false, 1)], &[("5551234", points)]);
        let mut lane = CheckoutLane::new(store.clone());
        lane.start_transaction(CashierId::new("C1")).unwrap();
        lane.add_item("P001", 1).unwrap();
        lane.set_customer("5551234").unwrap();

        let redemption = lane.apply_loyalty_redemption(true).unwrap();
        assert!(redemption.discount.cents() <= (points / 100) * 100);
        assert!(redemption.discount.cents() <= price);

        let receipt = lane.complete_transaction().unwrap();
        assert!(!receipt.final_total.is_negative());
        assert_eq!(
            receipt.final_total.cents(),
            price - redemption.discount.cents()
        );
    }
}

#[test]
fn aggregator_counts_only_completed_sessions() {
    let store = store_with(&[("P001", 1000, false, 10)], &[]);
    let mut lane = CheckoutLane::new(store.clone());

    for complete in [true, false, true] {
        lane.start_transaction(CashierId::new("C1")).unwrap();
        lane.add_item("P001", 1).unwrap();
        if complete {
            lane.complete_transaction().unwrap();
        } else {
            lane.cancel_transaction().unwrap();
        }
    }

    let report = store.with_store(|s| s.sales_report());
    assert_eq!(report.transaction_count, 2);
    assert_eq!(report.total_sales.cents(), 2000);
    assert_eq!(store.with_store(|s| s.ledger().quantity_of("P001")), 8);
}
