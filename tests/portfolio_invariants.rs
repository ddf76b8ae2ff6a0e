//! Portfolio invariants: cash/coupon conservation across trades, locked-cash
//! bounds, and serde round-trips.

use claimbook::{Coupon, CouponSide, Order, Positions, Side, Price, TradingEngine};

fn engine_with(accounts: &[&str]) -> TradingEngine {
    let mut e = TradingEngine::new();
    for a in accounts {
        e.positions.register((*a).to_string()).unwrap();
    }
    e
}

#[test]
fn portfolio_round_trips_cash_and_coupons() {
    let mut positions = Positions::new();
    positions.register("u1".into()).unwrap();
    positions.get_mut("u1").unwrap().add_coupon(Coupon::new("c1".into(), 4, CouponSide::Yes), 3000);

    let json = serde_json::to_string(&positions).unwrap();
    let restored: Positions = serde_json::from_str(&json).unwrap();

    let original = positions.get("u1").unwrap();
    let loaded = restored.get("u1").unwrap();
    assert_eq!(original.cash_balance, loaded.cash_balance);
    assert_eq!(original.coupons["c1"].shares, loaded.coupons["c1"].shares);
    assert_eq!(original.coupons["c1"].side, loaded.coupons["c1"].side);
}

/// A trade pays exactly `PAYOUT` per share in total between the resting and
/// incoming cost, so each party's pre-payout cost always adds up to the full
/// per-share payout no matter where the resting price falls.
#[test]
fn resting_and_incoming_costs_sum_to_full_payout() {
    let mut e = engine_with(&["u1", "u2"]);
    e.place(Order::new("u1".into(), Side::Bid, "c1".into(), Price(4700), 10, 0).unwrap()).unwrap();
    let result = e.place(Order::new("u2".into(), Side::Ask, "c1".into(), Price(4000), 10, 1).unwrap()).unwrap();

    assert_eq!(result.trades.len(), 1);
    let u1_cost_per_share = result.trades[0].price.0;
    let u2_cost_per_share = Price::MAX_UNIT - u1_cost_per_share;
    assert_eq!(u1_cost_per_share + u2_cost_per_share, Price::MAX_UNIT);
}

/// After a settled trade, both sides' coupons are created on the same
/// instrument with opposite sides and equal share counts.
#[test]
fn settled_trade_creates_opposite_coupons_of_equal_size() {
    let mut e = engine_with(&["u1", "u2"]);
    e.place(Order::new("u1".into(), Side::Bid, "c1".into(), Price(6000), 5, 0).unwrap()).unwrap();
    e.place(Order::new("u2".into(), Side::Ask, "c1".into(), Price(5500), 5, 1).unwrap()).unwrap();

    let u1 = e.positions.get("u1").unwrap();
    let u2 = e.positions.get("u2").unwrap();
    assert_eq!(u1.coupons["c1"].side, CouponSide::Yes);
    assert_eq!(u2.coupons["c1"].side, CouponSide::No);
    assert_eq!(u1.coupons["c1"].shares, u2.coupons["c1"].shares);
}

/// `locked_cash` never counts a coupon hedge on one instrument against risk
/// on another: each instrument's contribution is clamped at zero before
/// summing.
#[test]
fn locked_cash_never_goes_negative_per_instrument() {
    let mut positions = Positions::new();
    positions.register("u1".into()).unwrap();
    let portfolio = positions.get_mut("u1").unwrap();
    // A coupon worth far more than any resting risk on this instrument.
    portfolio.add_coupon(Coupon::new("c1".into(), 1000, CouponSide::Yes), 1);

    let mut risk = claimbook::Risk::default();
    risk.insert("c1".into(), claimbook::RiskEntry { bid: 0, ask: 0 });
    assert_eq!(portfolio.locked_cash(&risk), 0);
}

#[test]
fn afford_is_nonpositive_when_cash_is_exhausted() {
    let mut positions = Positions::new();
    positions.register("u1".into()).unwrap();
    positions.get_mut("u1").unwrap().cash_balance = 0;
    let order = Order::new("u1".into(), Side::Bid, "c1".into(), Price(3000), 1, 0).unwrap();
    let risk = claimbook::Risk::default();
    assert!(positions.get("u1").unwrap().afford(&risk, &order) <= 0);
}
